//! The three pool variants a repository owns.
//!
//! All variants share [`HandlePool`](super::HandlePool); they differ only in
//! how containers are opened and whether idle handles are ever reclaimed.

use std::fmt;
use std::time::Duration;

use crate::container::OpenMode;

/// Which of the repository's pools this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolKind {
    /// Writable containers. At most one live handle per identifier.
    Container,
    /// Read-only views of containers.
    ContainerView,
    /// Containers that stay addressable for the repository's lifetime.
    Persistent,
}

impl PoolKind {
    /// Name used in logs and errors.
    pub fn name(self) -> &'static str {
        match self {
            PoolKind::Container => "container_pool",
            PoolKind::ContainerView => "container_view_pool",
            PoolKind::Persistent => "persistent_pool",
        }
    }
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// When a handle with no outstanding leases may be closed without a clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionPolicy {
    /// Only `clear()` or `shutdown()` evict.
    Never,
    /// Handles idle for at least this long are reclaimed. A zero duration
    /// closes a handle as soon as its last lease is released.
    Idle(Duration),
}

/// Configuration of one pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    pub kind: PoolKind,
    pub mode: OpenMode,
    pub eviction: EvictionPolicy,
}

impl PoolConfig {
    /// The writable-container pool.
    ///
    /// Writers may hold buffered data, so handles are never evicted implicitly.
    pub fn writable() -> Self {
        Self {
            kind: PoolKind::Container,
            mode: OpenMode::ReadWrite,
            eviction: EvictionPolicy::Never,
        }
    }

    /// The read-only view pool. `idle_timeout` enables idle eviction.
    pub fn view(idle_timeout: Option<Duration>) -> Self {
        Self {
            kind: PoolKind::ContainerView,
            mode: OpenMode::ReadOnly,
            eviction: idle_timeout.map_or(EvictionPolicy::Never, EvictionPolicy::Idle),
        }
    }

    /// The persistent-container pool.
    pub fn persistent() -> Self {
        Self {
            kind: PoolKind::Persistent,
            mode: OpenMode::ReadWrite,
            eviction: EvictionPolicy::Never,
        }
    }

    /// The idle timeout, if this pool reclaims idle handles.
    pub fn idle_timeout(&self) -> Option<Duration> {
        match self.eviction {
            EvictionPolicy::Never => None,
            EvictionPolicy::Idle(ttl) => Some(ttl),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_configs() {
        let writable = PoolConfig::writable();
        assert_eq!(writable.mode, OpenMode::ReadWrite);
        assert_eq!(writable.eviction, EvictionPolicy::Never);

        let persistent = PoolConfig::persistent();
        assert_eq!(persistent.kind.name(), "persistent_pool");
        assert_eq!(persistent.idle_timeout(), None);

        let views = PoolConfig::view(Some(Duration::from_secs(30)));
        assert_eq!(views.mode, OpenMode::ReadOnly);
        assert_eq!(views.idle_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(PoolConfig::view(None).eviction, EvictionPolicy::Never);
    }
}
