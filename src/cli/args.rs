//! Command-line argument definitions and helpers.

use std::path::PathBuf;

use clap::Args;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

use crate::config::ConfigSource;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during argument processing.
#[derive(Debug, Error)]
pub enum ArgsError {
    /// I/O error reading or writing.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid argument combination.
    #[error("{0}")]
    InvalidArgs(String),
}

/// Result type for argument operations.
pub type Result<T> = std::result::Result<T, ArgsError>;

// =============================================================================
// Global Arguments
// =============================================================================

/// Global arguments that apply to all commands.
#[derive(Args, Debug, Default)]
pub struct GlobalArgs {
    /// Path to the main configuration file.
    #[arg(long = "config-file", global = true)]
    pub config_file: Option<PathBuf>,

    /// Path to the configuration overrides file.
    #[arg(long = "config-file-overrides", global = true)]
    pub config_file_overrides: Option<PathBuf>,

    /// Configuration overrides in the form name=value.
    #[arg(long = "config", value_parser = parse_config_override, global = true)]
    pub config_overrides: Vec<(String, String)>,

    /// Project root containing the repository. Shorthand for
    /// `--config repository.root=PATH`.
    #[arg(long = "repo", global = true)]
    pub repo: Option<PathBuf>,
}

impl GlobalArgs {
    /// Convert to a ConfigSource for reading configuration.
    pub fn to_config_source(&self) -> ConfigSource {
        let mut overrides = self.config_overrides.clone();
        if let Some(repo) = &self.repo {
            overrides.push(("repository.root".to_string(), repo.display().to_string()));
        }
        ConfigSource {
            config_file: self.config_file.clone(),
            override_file: self.config_file_overrides.clone(),
            overrides,
        }
    }
}

/// Parse a config override from "name=value" format.
fn parse_config_override(s: &str) -> std::result::Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid config override '{}': expected name=value", s))?;
    Ok((name.to_string(), value.to_string()))
}

// =============================================================================
// Input/Output Helpers
// =============================================================================

/// Helper for commands that read input from an argument or a file.
#[derive(Args, Debug, Default)]
pub struct InputSource {
    /// Read input from this file instead of an argument.
    #[arg(id = "input_file", short = 'f', long = "input-file")]
    pub file: Option<PathBuf>,
}

impl InputSource {
    /// Read the input value, requiring either an argument or file.
    pub async fn read_required(&self, arg_value: Option<&str>) -> Result<Vec<u8>> {
        match (arg_value, &self.file) {
            (Some(_), Some(_)) => Err(ArgsError::InvalidArgs(
                "cannot specify both a value argument and --input-file".to_string(),
            )),
            (Some(value), None) => Ok(value.as_bytes().to_vec()),
            (None, Some(path)) => Ok(tokio::fs::read(path).await?),
            (None, None) => Err(ArgsError::InvalidArgs(
                "must specify either a value argument or --input-file".to_string(),
            )),
        }
    }
}

/// Helper for commands that write output to a file or stdout.
#[derive(Args, Debug, Default)]
pub struct OutputSink {
    /// Write output to this file instead of stdout.
    #[arg(id = "output_file", short = 'o', long = "output-file")]
    pub file: Option<PathBuf>,
}

impl OutputSink {
    /// Write a string value to the output.
    pub async fn write_str(&self, value: &str) -> Result<()> {
        match &self.file {
            Some(path) => {
                tokio::fs::write(path, value).await?;
            }
            None => {
                let mut stdout = tokio::io::stdout();
                stdout.write_all(value.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
        }
        Ok(())
    }

    /// Write raw bytes to the output.
    pub async fn write_bytes(&self, data: &[u8]) -> Result<()> {
        match &self.file {
            Some(path) => {
                tokio::fs::write(path, data).await?;
            }
            None => {
                let mut stdout = tokio::io::stdout();
                stdout.write_all(data).await?;
                stdout.flush().await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_override() {
        assert_eq!(
            parse_config_override("pool.view_idle_timeout=30s").unwrap(),
            ("pool.view_idle_timeout".to_string(), "30s".to_string())
        );
        assert_eq!(
            parse_config_override("repository.description=a=b").unwrap(),
            ("repository.description".to_string(), "a=b".to_string())
        );
        assert!(parse_config_override("novalue").is_err());
    }

    #[test]
    fn test_repo_flag_becomes_last_override() {
        let global = GlobalArgs {
            config_overrides: vec![("repository.root".to_string(), "/a".to_string())],
            repo: Some(PathBuf::from("/b")),
            ..Default::default()
        };
        let source = global.to_config_source();
        assert_eq!(
            source.overrides.last(),
            Some(&("repository.root".to_string(), "/b".to_string()))
        );
    }

    #[tokio::test]
    async fn test_input_source() {
        let input = InputSource::default();
        assert_eq!(input.read_required(Some("v")).await.unwrap(), b"v".to_vec());
        assert!(input.read_required(None).await.is_err());

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("value.bin");
        std::fs::write(&path, [0u8, 1, 2]).unwrap();
        let input = InputSource { file: Some(path) };
        assert_eq!(input.read_required(None).await.unwrap(), vec![0u8, 1, 2]);
        assert!(input.read_required(Some("v")).await.is_err());
    }
}
