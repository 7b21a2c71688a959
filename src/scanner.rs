use anyhow::{bail, Result};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Collects the Rust source files that payload types are resolved from.
///
/// Build output (`target`) and hidden directories are never entered.
///
/// ```no_run
/// use openapi_from_routes::scanner::FileScanner;
///
/// let result = FileScanner::new("./my-service/src").scan().unwrap();
/// println!("Found {} Rust files", result.rust_files.len());
/// ```
pub struct FileScanner {
    root_path: PathBuf,
}

/// Files found by a scan, plus the entries that could not be read
#[derive(Debug, Default)]
pub struct ScanResult {
    /// `.rs` files in path order
    pub rust_files: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

impl FileScanner {
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root_path.into(),
        }
    }

    /// Walk the root directory and collect `.rs` files.
    ///
    /// Unreadable entries are recorded as warnings and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the root is not a directory.
    pub fn scan(&self) -> Result<ScanResult> {
        if !self.root_path.is_dir() {
            bail!("Source directory not found: {}", self.root_path.display());
        }

        debug!("Scanning {} for Rust sources", self.root_path.display());
        let mut result = ScanResult::default();

        let walker = WalkDir::new(&self.root_path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_skipped(entry));

        for entry in walker {
            match entry {
                Ok(entry) if is_rust_file(entry.path()) => {
                    result.rust_files.push(entry.into_path());
                }
                Ok(_) => {}
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    result.warnings.push(warning);
                }
            }
        }

        debug!("Found {} Rust files", result.rust_files.len());
        Ok(result)
    }
}

fn is_skipped(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || (entry.file_type().is_dir() && name == "target")
}

fn is_rust_file(path: &Path) -> bool {
    path.is_file() && path.extension().is_some_and(|ext| ext == "rs")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn names(result: &ScanResult, root: &Path) -> Vec<String> {
        result
            .rust_files
            .iter()
            .map(|path| {
                path.strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn test_scan_collects_nested_sources_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("models")).unwrap();
        fs::write(root.join("lib.rs"), "pub mod models;").unwrap();
        fs::write(root.join("models/user.rs"), "pub struct User;").unwrap();
        fs::write(root.join("models/order.rs"), "pub struct Order;").unwrap();

        let result = FileScanner::new(root).scan().unwrap();

        assert_eq!(
            names(&result, root),
            vec!["lib.rs", "models/order.rs", "models/user.rs"]
        );
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_scan_skips_target_and_hidden_directories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("target/debug")).unwrap();
        fs::create_dir_all(root.join(".cache")).unwrap();
        fs::write(root.join("target/debug/build.rs"), "fn main() {}").unwrap();
        fs::write(root.join(".cache/types.rs"), "pub struct Hidden;").unwrap();
        fs::write(root.join("types.rs"), "pub struct Visible;").unwrap();

        let result = FileScanner::new(root).scan().unwrap();

        assert_eq!(names(&result, root), vec!["types.rs"]);
    }

    #[test]
    fn test_scan_ignores_other_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("routes.yaml"), "routes: []").unwrap();
        fs::write(root.join("README.md"), "# docs").unwrap();
        fs::write(root.join("api.rs"), "").unwrap();

        let result = FileScanner::new(root).scan().unwrap();

        assert_eq!(names(&result, root), vec!["api.rs"]);
    }

    #[test]
    fn test_scan_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let result = FileScanner::new(temp_dir.path()).scan().unwrap();
        assert!(result.rust_files.is_empty());
    }

    #[test]
    fn test_scan_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        let result = FileScanner::new(temp_dir.path().join("missing")).scan();
        assert!(result.is_err());
    }
}
