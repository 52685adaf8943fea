//! runpool-rs - Reference-counted pools of key/value container handles.

pub mod cli;
pub mod config;
pub mod container;
pub mod pool;
pub mod repo;

pub use container::{Container, ContainerError, ContainerFactory, ContainerId, OpenMode};
pub use pool::{HandlePool, HandleState, Lease, PoolConfig, PoolError, PoolKind, PoolStats};
pub use repo::{Project, Repository, RepositoryError};
