//! Container trait and types.
//!
//! A container is one on-disk key/value store holding a single run's (or
//! series') worth of data. This module defines the handle interface the pools
//! hand out, and the factory interface the pools open containers through.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while opening or using a container.
#[derive(Debug)]
pub enum ContainerError {
    /// An I/O error occurred.
    Io(std::io::Error),
    /// Storage engine error (e.g., from LMDB).
    Database(String),
    /// The container does not exist and the open mode does not create it.
    NotFound(String),
    /// A write was attempted through a read-only view.
    ReadOnly,
    /// The handle was used after the pool closed it.
    Closed,
    /// The container identifier is malformed.
    InvalidId(String),
}

impl fmt::Display for ContainerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerError::Io(e) => write!(f, "I/O error: {}", e),
            ContainerError::Database(msg) => write!(f, "database error: {}", msg),
            ContainerError::NotFound(id) => write!(f, "container not found: {}", id),
            ContainerError::ReadOnly => write!(f, "container is opened read-only"),
            ContainerError::Closed => write!(f, "container handle is closed"),
            ContainerError::InvalidId(msg) => write!(f, "invalid container id: {}", msg),
        }
    }
}

impl std::error::Error for ContainerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ContainerError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ContainerError {
    fn from(e: std::io::Error) -> Self {
        ContainerError::Io(e)
    }
}

/// Result type for container operations.
pub type Result<T> = std::result::Result<T, ContainerError>;

// =============================================================================
// Open Mode
// =============================================================================

/// How a factory should open a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpenMode {
    /// Open for reading and writing, creating the container if needed.
    ReadWrite,
    /// Open a read-only view. The container must already exist.
    ReadOnly,
}

impl OpenMode {
    pub fn is_read_only(self) -> bool {
        matches!(self, OpenMode::ReadOnly)
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpenMode::ReadWrite => write!(f, "read-write"),
            OpenMode::ReadOnly => write!(f, "read-only"),
        }
    }
}

// =============================================================================
// Container Trait
// =============================================================================

/// A live handle to an opened container.
///
/// Handles are shared through the pools as `Arc<dyn Container>`. The pool
/// calls [`close`](Container::close) exactly once, when it evicts the handle;
/// any use after that fails with [`ContainerError::Closed`].
#[async_trait]
pub trait Container: Send + Sync {
    /// Check if a key exists in the container.
    async fn exists(&self, key: &[u8]) -> Result<bool>;

    /// Get the value for a key, returning `None` if not found.
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Get a write handle for buffered writes.
    ///
    /// Writes are applied atomically when the handle is flushed. Read-only
    /// views return [`ContainerError::ReadOnly`].
    async fn write(&self) -> Result<Box<dyn ContainerWrites + Send>>;

    /// Whether this handle was opened as a read-only view.
    fn is_read_only(&self) -> bool;

    /// Release the underlying resources.
    ///
    /// Must not block on outstanding async work; it is called from lease
    /// drops.
    fn close(&self) -> Result<()>;
}

// =============================================================================
// ContainerWrites Trait
// =============================================================================

/// A write handle for buffered writes to a container.
#[async_trait]
pub trait ContainerWrites: Send {
    /// Set a key-value pair (buffered).
    fn set(&mut self, key: Vec<u8>, val: Vec<u8>);

    /// Delete a key (buffered).
    fn del(&mut self, key: Vec<u8>);

    /// Flush all buffered writes to the container.
    async fn flush(self: Box<Self>) -> Result<()>;
}

// =============================================================================
// Write Operation Enum
// =============================================================================

/// A pending write operation.
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Set a key to a value.
    Set { key: Vec<u8>, value: Vec<u8> },
    /// Delete a key.
    Del { key: Vec<u8> },
}

// =============================================================================
// ContainerFactory Trait
// =============================================================================

/// Opens containers by identifier.
///
/// The pools call this outside their locks, so an implementation may take as
/// long as it needs; only the caller that missed waits for it.
#[async_trait]
pub trait ContainerFactory<K>: Send + Sync {
    /// Open the container identified by `id`.
    async fn open(&self, id: &K, mode: OpenMode) -> Result<Arc<dyn Container>>;
}
