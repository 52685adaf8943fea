//! Containers and the factories that open them.
//!
//! ## Architecture
//!
//! 1. **Container** - a live handle to one key/value store
//!    - [`LmdbContainer`] - LMDB-backed implementation
//!    - [`MemoryContainer`] - in-memory implementation for tests
//!
//! 2. **ContainerFactory** - opens a container by identifier and [`OpenMode`]
//!    - [`LmdbContainerFactory`] - one LMDB environment per container below a root
//!    - [`MemoryContainerFactory`] - in-memory stores with failure injection
//!
//! The pools in [`crate::pool`] only ever see `Arc<dyn Container>` and
//! `Arc<dyn ContainerFactory<K>>`.

#[allow(clippy::module_inception)]
mod container;
mod container_id;
mod lmdb_container;
mod memory_container;

pub use container::{
    Container, ContainerError, ContainerFactory, ContainerWrites, OpenMode, Result, WriteOp,
};
pub use container_id::ContainerId;
pub use lmdb_container::{LmdbContainer, LmdbContainerFactory, LmdbOptions};
pub use memory_container::{MemoryContainer, MemoryContainerFactory};
