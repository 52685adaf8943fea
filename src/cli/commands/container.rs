//! Container read/write subcommands.

use clap::Args;
use tracing::debug;

use crate::cli::{CliError, InputSource, OutputSink, Result};
use crate::container::ContainerId;
use crate::repo::Project;

// =============================================================================
// Put
// =============================================================================

/// Arguments for the put command.
#[derive(Args, Debug)]
pub struct PutArgs {
    /// Container identifier, e.g. meta/chunks/<run-hash>.
    pub container: String,

    /// Key to write.
    pub key: String,

    /// Value to write. Use --input-file for binary values.
    pub value: Option<String>,

    #[command(flatten)]
    pub input: InputSource,
}

impl PutArgs {
    pub async fn run(self, project: &Project) -> Result<()> {
        let id = ContainerId::new(self.container)?;
        let value = self.input.read_required(self.value.as_deref()).await?;

        let lease = project.repo().container_pool().acquire(&id).await?;
        let mut writes = lease.write().await?;
        writes.set(self.key.into_bytes(), value);
        writes.flush().await?;
        debug!(container = %id, serial = lease.serial(), "wrote key");
        lease.release()?;

        Ok(())
    }
}

// =============================================================================
// Get
// =============================================================================

/// Arguments for the get command.
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Container identifier, e.g. meta/chunks/<run-hash>.
    pub container: String,

    /// Key to read.
    pub key: String,

    #[command(flatten)]
    pub output: OutputSink,
}

impl GetArgs {
    pub async fn run(self, project: &Project) -> Result<()> {
        let id = ContainerId::new(self.container)?;

        let view = project.repo().container_view_pool().acquire(&id).await?;
        let value = view
            .get(self.key.as_bytes())
            .await?
            .ok_or_else(|| CliError::KeyNotFound(self.key.clone()))?;
        view.release()?;

        match String::from_utf8(value) {
            Ok(text) => self.output.write_str(&text).await?,
            Err(e) => self.output.write_bytes(e.as_bytes()).await?,
        }
        Ok(())
    }
}
