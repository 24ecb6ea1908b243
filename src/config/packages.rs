//! Requirements file loading.
//!
//! One package per line. Lines are trimmed and order is preserved; lines that
//! are empty after trimming are dropped. Everything else, including lines that
//! look like comments, is passed through untouched.

use std::path::Path;
use tracing::{debug, info};

use crate::error::{ConfigError, DsEc2Error, Result};

/// Loader for the static package list.
#[derive(Debug, Default)]
pub struct PackageListLoader;

impl PackageListLoader {
    /// Creates a new loader.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Reads the package list from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or cannot be read.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Vec<String>> {
        let path = path.as_ref();
        info!("Loading requirements from: {}", path.display());

        if !path.exists() {
            return Err(DsEc2Error::Config(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path)?;
        let packages = Self::parse(&content);

        debug!("Loaded {} packages", packages.len());
        Ok(packages)
    }

    /// Parses package names from the contents of a requirements file.
    #[must_use]
    pub fn parse(content: &str) -> Vec<String> {
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_trims_and_keeps_order() {
        let packages = PackageListLoader::parse("  pandas \nnumpy\r\n\tscikit-learn==1.3\n");
        assert_eq!(packages, vec!["pandas", "numpy", "scikit-learn==1.3"]);
    }

    #[test]
    fn test_parse_drops_blank_lines() {
        let packages = PackageListLoader::parse("pandas\n\n   \nnumpy\n\n");
        assert_eq!(packages, vec!["pandas", "numpy"]);
    }

    #[test]
    fn test_parse_keeps_comment_lines() {
        let packages = PackageListLoader::parse("# data\npandas");
        assert_eq!(packages, vec!["# data", "pandas"]);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        writeln!(file, "matplotlib").expect("write failed");
        writeln!(file, "seaborn").expect("write failed");

        let packages = PackageListLoader::new()
            .load(file.path())
            .expect("Failed to load packages");
        assert_eq!(packages, vec!["matplotlib", "seaborn"]);
    }

    #[test]
    fn test_load_missing_file() {
        let result = PackageListLoader::new().load("/nonexistent/requirements.txt");
        assert!(matches!(
            result,
            Err(DsEc2Error::Config(ConfigError::FileNotFound { .. }))
        ));
    }
}
