//! Container identifiers.

use std::fmt;
use std::path::PathBuf;

use super::container::{ContainerError, Result};

/// Identifies one physical container within a repository.
///
/// An identifier is a relative, `/`-separated path such as
/// `meta/chunks/<run-hash>`. It maps directly to the container's location
/// below the repository root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(String);

impl ContainerId {
    /// Parse and validate an identifier.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(ContainerError::InvalidId("empty identifier".to_string()));
        }
        if id.starts_with('/') || id.contains('\\') {
            return Err(ContainerError::InvalidId(format!(
                "'{}' must be a relative '/'-separated path",
                id
            )));
        }
        for component in id.split('/') {
            match component {
                "" => {
                    return Err(ContainerError::InvalidId(format!(
                        "'{}' contains an empty path component",
                        id
                    )));
                }
                "." | ".." => {
                    return Err(ContainerError::InvalidId(format!(
                        "'{}' contains a relative path component",
                        id
                    )));
                }
                _ => {}
            }
        }
        Ok(Self(id))
    }

    /// The metadata container of a run.
    pub fn meta(run_hash: &str) -> Result<Self> {
        Self::new(format!("meta/chunks/{}", run_hash))
    }

    /// The sequence (metrics, series) container of a run.
    pub fn seqs(run_hash: &str) -> Result<Self> {
        Self::new(format!("seqs/chunks/{}", run_hash))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The container's location relative to the repository root.
    pub fn relative_path(&self) -> PathBuf {
        self.0.split('/').collect()
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ContainerId {
    type Err = ContainerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_valid_ids() {
        let id = ContainerId::new("meta/chunks/abc123").unwrap();
        assert_eq!(id.as_str(), "meta/chunks/abc123");
        assert_eq!(id.relative_path(), Path::new("meta").join("chunks").join("abc123"));

        assert_eq!(ContainerId::meta("r1").unwrap().as_str(), "meta/chunks/r1");
        assert_eq!(ContainerId::seqs("r1").unwrap().as_str(), "seqs/chunks/r1");
        assert_eq!("run-1".parse::<ContainerId>().unwrap().to_string(), "run-1");
    }

    #[test]
    fn test_invalid_ids() {
        assert!(ContainerId::new("").is_err());
        assert!(ContainerId::new("/abs/path").is_err());
        assert!(ContainerId::new("a//b").is_err());
        assert!(ContainerId::new("a/../b").is_err());
        assert!(ContainerId::new("./a").is_err());
        assert!(ContainerId::new("a/").is_err());
        assert!(ContainerId::new("a\\b").is_err());
        assert!(matches!(
            ContainerId::meta("../x"),
            Err(ContainerError::InvalidId(_))
        ));
    }
}
