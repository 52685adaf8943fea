//! Reference-counted pools of container handles.
//!
//! A repository owns three pools, all instances of [`HandlePool`] configured
//! by [`PoolConfig`]:
//!
//! | Pool                  | Open mode  | Idle eviction       |
//! |-----------------------|------------|---------------------|
//! | `container_pool`      | read-write | never               |
//! | `container_view_pool` | read-only  | optional, after TTL |
//! | `persistent_pool`     | read-write | never               |
//!
//! Callers get a [`Lease`] from [`HandlePool::acquire`] and release it by
//! dropping it. [`HandlePool::clear`] retires every handle without waiting
//! for leases; retired handles close when their last lease goes away.

mod error;
mod handle_pool;
mod variants;

pub use error::{PoolError, Result};
pub use handle_pool::{HandlePool, HandleState, Lease, PoolKey, PoolStats};
pub use variants::{EvictionPolicy, PoolConfig, PoolKind};
