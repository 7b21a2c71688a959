use std::path::PathBuf;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for document generation
#[derive(Debug)]
pub enum Error {
    IoError(std::io::Error),
    ParseError { file: PathBuf, message: String },
    /// A URI template could not be compiled into the route tree
    InvalidRoute { template: String, message: String },
    /// A path converter carries a format argument the schema mapping cannot express
    UnsupportedFormat { converter: String, format: String },
    /// The route source does not expose a tree this generator can walk
    UnsupportedRouter(String),
    SerializationError(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::IoError(e) => write!(f, "IO error: {}", e),
            Error::ParseError { file, message } => {
                write!(f, "parse error in {}: {}", file.display(), message)
            }
            Error::InvalidRoute { template, message } => {
                write!(f, "invalid route '{}': {}", template, message)
            }
            Error::UnsupportedFormat { converter, format } => write!(
                f,
                "unsupported format '{}' for path converter '{}'",
                format, converter
            ),
            Error::UnsupportedRouter(name) => {
                write!(f, "unsupported router: {} does not expose a route tree", name)
            }
            Error::SerializationError(msg) => write!(f, "serialization error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(format!("JSON: {}", err))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::SerializationError(format!("YAML: {}", err))
    }
}

impl From<syn::Error> for Error {
    fn from(err: syn::Error) -> Self {
        Error::ParseError {
            file: PathBuf::from("<unknown>"),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_format_message() {
        let err = Error::UnsupportedFormat {
            converter: "dt".to_string(),
            format: "%Y-%m-%d".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "unsupported format '%Y-%m-%d' for path converter 'dt'"
        );
    }

    #[test]
    fn test_io_error_has_source() {
        use std::error::Error as _;

        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(err.source().is_some());
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_syn_error_becomes_parse_error() {
        let syn_err = syn::parse_str::<syn::Type>("Vec<").unwrap_err();
        let err: Error = syn_err.into();
        assert!(matches!(err, Error::ParseError { .. }));
    }
}
