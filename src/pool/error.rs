//! Error types for pool operations.

use std::sync::Arc;

use crate::container::ContainerError;

/// Error type for pool operations.
///
/// `Clone` so that one failed open can be reported to every caller that was
/// waiting on it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PoolError {
    /// The pool was shut down; no further acquisitions are possible.
    #[error("{pool} is shut down")]
    PoolClosed { pool: &'static str },

    /// The factory could not open the container.
    #[error("{pool}: failed to open container {id}: {source}")]
    ContainerOpenFailed {
        pool: &'static str,
        id: String,
        #[source]
        source: Arc<ContainerError>,
    },

    /// A release without a matching acquisition.
    #[error("{pool}: release of {id} without an outstanding lease")]
    NegativeReference { pool: &'static str, id: String },
}

/// Result type for pool operations.
pub type Result<T> = std::result::Result<T, PoolError>;
