//! The repository facade that owns the three container pools.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::{PoolSettings, RepositoryConfig};
use crate::container::{ContainerError, ContainerFactory, ContainerId, LmdbContainerFactory};
use crate::pool::{HandlePool, PoolConfig, PoolError};

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while binding or using a repository.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The repository path exists but is not a directory.
    #[error("repository path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Container(#[from] ContainerError),
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;

// =============================================================================
// RepositoryPools
// =============================================================================

/// The three pools a repository owns.
pub struct RepositoryPools {
    pub container_pool: HandlePool<ContainerId>,
    pub container_view_pool: HandlePool<ContainerId>,
    pub persistent_pool: HandlePool<ContainerId>,
}

impl RepositoryPools {
    /// Build the three pools over one shared factory.
    pub fn new(
        factory: Arc<dyn ContainerFactory<ContainerId>>,
        settings: &PoolSettings,
    ) -> Self {
        Self {
            container_pool: HandlePool::new(PoolConfig::writable(), Arc::clone(&factory)),
            container_view_pool: HandlePool::new(
                PoolConfig::view(settings.view_idle_timeout),
                Arc::clone(&factory),
            ),
            persistent_pool: HandlePool::new(PoolConfig::persistent(), factory),
        }
    }

    fn all(&self) -> [&HandlePool<ContainerId>; 3] {
        [
            &self.container_pool,
            &self.container_view_pool,
            &self.persistent_pool,
        ]
    }
}

// =============================================================================
// Repository
// =============================================================================

/// A repository bound to a path, with its writable, view and persistent
/// container pools.
///
/// Binding a repository always clears its pools, so no handle opened for a
/// previously bound path is ever served.
pub struct Repository {
    path: PathBuf,
    pools: RepositoryPools,
    reaper: Option<JoinHandle<()>>,
}

impl Repository {
    /// Bind the LMDB-backed repository at `path`.
    ///
    /// The directory does not have to exist yet; containers are created below
    /// it on first write.
    pub fn open(path: impl Into<PathBuf>, config: &RepositoryConfig) -> Result<Self> {
        let path = path.into();
        if path.exists() && !path.is_dir() {
            return Err(RepositoryError::NotADirectory(path));
        }
        let factory = Arc::new(LmdbContainerFactory::new(&path, config.lmdb.clone()));
        Ok(Self::with_factory(path, factory, &config.pool))
    }

    /// Bind a repository whose containers come from `factory`.
    pub fn with_factory(
        path: impl Into<PathBuf>,
        factory: Arc<dyn ContainerFactory<ContainerId>>,
        settings: &PoolSettings,
    ) -> Self {
        let mut repo = Self::from_pools(path, RepositoryPools::new(factory, settings));
        repo.start_reaper(settings);
        repo
    }

    /// Rebind an existing set of pools to `path`.
    ///
    /// The pools are cleared. No reaper is started; whoever built the pools
    /// owns that decision.
    pub fn from_pools(path: impl Into<PathBuf>, pools: RepositoryPools) -> Self {
        let path = path.into();
        for pool in pools.all() {
            pool.clear();
        }
        info!(path = %path.display(), "bound repository");
        Self {
            path,
            pools,
            reaper: None,
        }
    }

    fn start_reaper(&mut self, settings: &PoolSettings) {
        if tokio::runtime::Handle::try_current().is_err() {
            debug!("no tokio runtime, view pool reaper not started");
            return;
        }
        self.reaper = self
            .pools
            .container_view_pool
            .spawn_reaper(settings.reaper_period);
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Pool of writable containers.
    pub fn container_pool(&self) -> &HandlePool<ContainerId> {
        &self.pools.container_pool
    }

    /// Pool of read-only container views.
    pub fn container_view_pool(&self) -> &HandlePool<ContainerId> {
        &self.pools.container_view_pool
    }

    /// Pool of containers kept for the repository's lifetime.
    pub fn persistent_pool(&self) -> &HandlePool<ContainerId> {
        &self.pools.persistent_pool
    }

    /// Clear all three pools.
    pub fn reset(&self) {
        for pool in self.pools.all() {
            pool.clear();
        }
    }

    /// Shut all three pools down. Outstanding leases stay usable until
    /// released.
    pub fn shutdown(&mut self) {
        if let Some(reaper) = self.reaper.take() {
            reaper.abort();
        }
        for pool in self.pools.all() {
            pool.shutdown();
        }
    }

    /// Unbind the repository, handing its pools back.
    pub fn into_pools(mut self) -> RepositoryPools {
        if let Some(reaper) = self.reaper.take() {
            reaper.abort();
        }
        self.pools
    }

    /// Wait until every handle retired by a reset or shutdown has closed.
    pub async fn drain(&self) {
        for pool in self.pools.all() {
            pool.drain().await;
        }
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("path", &self.path)
            .field("container_pool", &self.pools.container_pool)
            .field("container_view_pool", &self.pools.container_view_pool)
            .field("persistent_pool", &self.pools.persistent_pool)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::container::{LmdbOptions, MemoryContainerFactory};
    use crate::pool::{HandleState, PoolKind};
    use tempfile::TempDir;

    fn run_id() -> ContainerId {
        ContainerId::meta("run-1").unwrap()
    }

    fn small_config() -> RepositoryConfig {
        RepositoryConfig {
            pool: PoolSettings::default(),
            lmdb: LmdbOptions {
                map_size: 16 * 1024 * 1024,
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn test_pools_have_their_variants() {
        let factory = Arc::new(MemoryContainerFactory::<ContainerId>::new());
        let repo = Repository::with_factory("/repo", factory, &PoolSettings::default());

        assert_eq!(repo.container_pool().kind(), PoolKind::Container);
        assert_eq!(repo.container_view_pool().kind(), PoolKind::ContainerView);
        assert_eq!(repo.persistent_pool().kind(), PoolKind::Persistent);
        assert_eq!(
            repo.container_view_pool().config().idle_timeout(),
            Some(Duration::from_secs(60))
        );
        assert_eq!(repo.path(), Path::new("/repo"));
    }

    #[tokio::test]
    async fn test_rebinding_clears_pools() {
        let factory = Arc::new(MemoryContainerFactory::<ContainerId>::new());
        let repo = Repository::with_factory("/a", factory, &PoolSettings::default());

        let held = repo.container_pool().acquire(&run_id()).await.unwrap();
        drop(repo.persistent_pool().acquire(&run_id()).await.unwrap());
        assert_eq!(repo.persistent_pool().size(), 1);

        let repo = Repository::from_pools("/b", repo.into_pools());

        assert_eq!(repo.path(), Path::new("/b"));
        assert_eq!(repo.persistent_pool().size(), 0);
        // Held lease outlives the rebind but is never served again
        assert_eq!(held.state(), HandleState::Closing);
        let fresh = repo.container_pool().acquire(&run_id()).await.unwrap();
        assert_ne!(fresh.serial(), held.serial());
    }

    #[tokio::test]
    async fn test_reset_and_shutdown() {
        let factory = Arc::new(MemoryContainerFactory::<ContainerId>::new());
        let mut repo = Repository::with_factory("/repo", factory.clone(), &PoolSettings::default());

        drop(repo.container_pool().acquire(&run_id()).await.unwrap());
        drop(repo.container_view_pool().acquire(&run_id()).await.unwrap());
        repo.reset();
        assert_eq!(repo.container_pool().size(), 0);
        assert_eq!(repo.container_view_pool().size(), 0);
        assert_eq!(factory.live_handles(&run_id()), 0);

        let lease = repo.persistent_pool().acquire(&run_id()).await.unwrap();
        repo.shutdown();
        assert!(repo.container_pool().is_shut_down());
        assert!(matches!(
            repo.persistent_pool().acquire(&run_id()).await,
            Err(PoolError::PoolClosed { .. })
        ));
        drop(lease);
        repo.drain().await;
        assert_eq!(repo.persistent_pool().size(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_lmdb_write_then_view() {
        let dir = TempDir::new().unwrap();
        let repo = Repository::open(dir.path().join(".aim"), &small_config()).unwrap();

        {
            let writer = repo.container_pool().acquire(&run_id()).await.unwrap();
            let mut writes = writer.write().await.unwrap();
            writes.set(b"step".to_vec(), b"42".to_vec());
            writes.flush().await.unwrap();
        }

        let view = repo.container_view_pool().acquire(&run_id()).await.unwrap();
        assert_eq!(view.get(b"step").await.unwrap(), Some(b"42".to_vec()));
        assert!(view.is_read_only());
        assert!(dir.path().join(".aim").join("meta/chunks/run-1").is_dir());
    }

    #[tokio::test]
    async fn test_open_rejects_file_path() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("not-a-dir");
        std::fs::write(&file, b"x").unwrap();

        assert!(matches!(
            Repository::open(&file, &small_config()),
            Err(RepositoryError::NotADirectory(_))
        ));
    }

    #[test]
    fn test_construction_without_runtime() {
        let factory = Arc::new(MemoryContainerFactory::<ContainerId>::new());
        let repo = Repository::with_factory("/repo", factory, &PoolSettings::default());
        assert!(repo.reaper.is_none());
    }
}
