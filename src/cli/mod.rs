//! Command-line interface for runpool.

pub mod args;
mod commands;

use clap::{Parser, Subcommand};
use thiserror::Error;
use tracing::warn;

use crate::config::{ConfigError, ConfigResult, read_config};
use crate::container::ContainerError;
use crate::pool::PoolError;
use crate::repo::{Project, RepositoryError};

pub use args::{GlobalArgs, InputSource, OutputSink};

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during CLI execution.
#[derive(Debug, Error)]
pub enum CliError {
    /// Argument processing error.
    #[error("{0}")]
    Args(#[from] args::ArgsError),

    /// Configuration error.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// Repository error.
    #[error("{0}")]
    Repository(#[from] RepositoryError),

    /// Pool error.
    #[error("{0}")]
    Pool(#[from] PoolError),

    /// Container error.
    #[error("{0}")]
    Container(#[from] ContainerError),

    /// The requested key is not in the container.
    #[error("key not found: {0}")]
    KeyNotFound(String),
}

/// Result type for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

// =============================================================================
// CLI Definition
// =============================================================================

/// runpool - Read and write repository containers through the handle pools.
#[derive(Parser, Debug)]
#[command(name = "runpool", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a key through the writable-container pool.
    Put(commands::container::PutArgs),

    /// Read a key through the read-only view pool.
    Get(commands::container::GetArgs),

    /// Show the project, its repository and pool state.
    Info(commands::info::InfoArgs),
}

// =============================================================================
// CLI Execution
// =============================================================================

impl Cli {
    /// Parse command-line arguments and return the CLI instance.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Run the CLI command.
    pub async fn run(self) -> Result<()> {
        let ConfigResult { config, warnings } = read_config(&self.global.to_config_source())?;
        for warning in warnings {
            warn!("{}", warning);
        }

        let mut project = Project::from_config(&config)?;

        let result = match self.command {
            Command::Put(args) => args.run(&project).await,
            Command::Get(args) => args.run(&project).await,
            Command::Info(args) => args.run(&project).await,
        };

        // Close every handle before exiting so LMDB writes are synced
        project.repo_mut().shutdown();
        project.repo().drain().await;

        result
    }
}

/// Main entry point for the CLI.
pub async fn main() -> Result<()> {
    let cli = Cli::parse_args();
    cli.run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cli(root: &std::path::Path, args: &[&str]) -> Cli {
        let dir = root.display().to_string();
        let mut argv = vec!["runpool", "--repo", dir.as_str(), "--config", "lmdb.map_size=16MB"];
        argv.extend_from_slice(args);
        // An explicit empty config file keeps the environment out of the test
        let config = root.join("runpool.ini");
        std::fs::write(&config, "").unwrap();
        let config = config.display().to_string();
        argv.extend_from_slice(&["--config-file", config.as_str()]);
        Cli::try_parse_from(argv).unwrap()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_put_then_get() {
        let root = TempDir::new().unwrap();
        let out = root.path().join("out.txt");

        cli(root.path(), &["put", "meta/chunks/run-1", "lr", "0.01"])
            .run()
            .await
            .unwrap();

        let out_arg = out.display().to_string();
        cli(root.path(), &["get", "meta/chunks/run-1", "lr", "-o", out_arg.as_str()])
            .run()
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "0.01");
        assert!(root.path().join(".aim/meta/chunks/run-1").is_dir());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_get_errors() {
        let root = TempDir::new().unwrap();

        let err = cli(root.path(), &["get", "meta/chunks/missing", "lr"])
            .run()
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CliError::Pool(PoolError::ContainerOpenFailed { .. })
        ));

        cli(root.path(), &["put", "meta/chunks/run-1", "lr", "0.01"])
            .run()
            .await
            .unwrap();
        let err = cli(root.path(), &["get", "meta/chunks/run-1", "epochs"])
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::KeyNotFound(_)));

        let err = cli(root.path(), &["put", "../escape", "k", "v"])
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::Container(ContainerError::InvalidId(_))));
    }

    #[tokio::test]
    async fn test_info() {
        let root = TempDir::new().unwrap();
        let out = root.path().join("info.txt");
        let out_arg = out.display().to_string();

        cli(root.path(), &["info", "-o", out_arg.as_str()])
            .run()
            .await
            .unwrap();

        let info = std::fs::read_to_string(&out).unwrap();
        assert!(info.contains("name: My awesome project"));
        assert!(info.contains("exists: false"));
        assert!(info.contains("container_view_pool: size=0"));
    }
}
