//! Path variable converters and their parameter schemas.
//!
//! A route variable may declare a converter, as in `{id:int}` or `{day:dt("%Y-%m-%d")}`.
//! The converter decides how the variable is coerced when routing, and here it decides the
//! `schema` of the generated path parameter.

use crate::error::{Error, Result};
use log::debug;
use serde_json::{json, Value};

/// One argument passed to a converter, e.g. `3` or `min=1` in `int(3, min=1)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConverterArg {
    Positional(String),
    Named { name: String, value: String },
}

/// A converter binding on a route variable
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Converter {
    pub name: String,
    pub args: Vec<ConverterArg>,
}

/// A path variable collected while walking the route tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathVariable {
    pub name: String,
    pub converter: Option<Converter>,
}

impl PathVariable {
    pub fn new(name: impl Into<String>, converter: Option<Converter>) -> Self {
        Self {
            name: name.into(),
            converter,
        }
    }
}

impl Converter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(name: impl Into<String>, args: Vec<ConverterArg>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Parse a converter spec such as `int`, `uuid` or `dt("%Y-%m-%d")`.
    ///
    /// Returns a message describing the problem if the spec is malformed.
    pub fn parse(spec: &str) -> std::result::Result<Self, String> {
        let spec = spec.trim();
        let (name, raw_args) = match spec.find('(') {
            None => (spec, None),
            Some(open) => {
                if !spec.ends_with(')') {
                    return Err(format!("unterminated arguments in converter '{}'", spec));
                }
                (&spec[..open], Some(&spec[open + 1..spec.len() - 1]))
            }
        };

        let name = name.trim();
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(format!("invalid converter name '{}'", name));
        }

        let args = match raw_args {
            Some(raw) => split_args(raw)?
                .into_iter()
                .map(|arg| parse_arg(&arg))
                .collect(),
            None => Vec::new(),
        };

        Ok(Self::with_args(name, args))
    }

    /// Value of a named argument
    pub fn named(&self, key: &str) -> Option<&str> {
        self.args.iter().find_map(|arg| match arg {
            ConverterArg::Named { name, value } if name == key => Some(value.as_str()),
            _ => None,
        })
    }

    /// Positional arguments in declaration order
    pub fn positional(&self) -> impl Iterator<Item = &str> {
        self.args.iter().filter_map(|arg| match arg {
            ConverterArg::Positional(value) => Some(value.as_str()),
            ConverterArg::Named { .. } => None,
        })
    }

    fn is_datetime(&self) -> bool {
        matches!(self.name.as_str(), "datetime" | "dt")
    }

    /// The custom format argument of a datetime converter, if any
    fn datetime_format(&self) -> Option<&str> {
        self.named("format_string")
            .or_else(|| self.named("format"))
            .or_else(|| self.positional().next())
    }
}

fn split_args(raw: &str) -> std::result::Result<Vec<String>, String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in raw.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => {
                quote = None;
                current.push(c);
            }
            (Some(_), c) => current.push(c),
            (None, '"') | (None, '\'') => {
                quote = Some(c);
                current.push(c);
            }
            (None, ',') => args.push(std::mem::take(&mut current)),
            (None, c) => current.push(c),
        }
    }

    if quote.is_some() {
        return Err(format!("unterminated string in converter arguments '{}'", raw));
    }
    args.push(current);

    Ok(args
        .into_iter()
        .map(|arg| arg.trim().to_string())
        .filter(|arg| !arg.is_empty())
        .collect())
}

fn parse_arg(arg: &str) -> ConverterArg {
    if !arg.starts_with('"') && !arg.starts_with('\'') {
        if let Some((key, value)) = arg.split_once('=') {
            let key = key.trim();
            if !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return ConverterArg::Named {
                    name: key.to_string(),
                    value: unquote(value.trim()).to_string(),
                };
            }
        }
    }
    ConverterArg::Positional(unquote(arg).to_string())
}

fn unquote(value: &str) -> &str {
    for q in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(q) && value.ends_with(q) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Map a route variable's converter to a parameter schema.
///
/// Converter arguments other than a datetime format are not reflected in the schema.
pub fn converter_to_schema(converter: Option<&Converter>) -> Result<Value> {
    let Some(converter) = converter else {
        return Ok(json!({ "type": "string" }));
    };

    debug!("Mapping converter '{}' to a schema", converter.name);

    if converter.is_datetime() {
        if let Some(format) = converter.datetime_format() {
            return Err(Error::UnsupportedFormat {
                converter: converter.name.clone(),
                format: format.to_string(),
            });
        }
        return Ok(json!({ "type": "string", "format": "date-time" }));
    }

    let schema = match converter.name.as_str() {
        "int" => json!({ "type": "integer" }),
        "uuid" => json!({ "type": "string", "format": "uuid" }),
        _ => json!({ "type": "string" }),
    };
    Ok(schema)
}
