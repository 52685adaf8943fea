//! LMDB-based container implementation.
//!
//! Uses the heed crate. Each container is its own LMDB environment directory
//! below the repository root.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use async_trait::async_trait;
use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};
use tracing::debug;

use super::container::{
    Container, ContainerError, ContainerFactory, ContainerWrites, OpenMode, Result, WriteOp,
};
use super::container_id::ContainerId;

/// Name of the data file LMDB creates inside an environment directory.
const LMDB_DATA_FILE: &str = "data.mdb";

fn db_err(e: impl std::fmt::Display) -> ContainerError {
    ContainerError::Database(e.to_string())
}

// =============================================================================
// Options
// =============================================================================

/// Tuning for opened LMDB environments.
#[derive(Debug, Clone)]
pub struct LmdbOptions {
    /// Maximum size of one container's memory map (bytes).
    pub map_size: usize,
    /// Maximum number of concurrent read transactions per container.
    pub max_readers: u32,
}

impl Default for LmdbOptions {
    fn default() -> Self {
        Self {
            map_size: 1024 * 1024 * 1024, // 1GB
            max_readers: 126,
        }
    }
}

// =============================================================================
// LmdbContainerFactory
// =============================================================================

/// Opens [`LmdbContainer`]s below a repository root.
///
/// LMDB allows an environment to be opened only once per process, so the
/// factory remembers which environments are live and hands the same one to
/// every handle of a container, whichever pool asked for it. An environment
/// closes once the last handle referencing it is dropped.
pub struct LmdbContainerFactory {
    root: PathBuf,
    options: LmdbOptions,
    envs: Arc<Mutex<HashMap<PathBuf, Weak<Env>>>>,
}

impl LmdbContainerFactory {
    /// Create a factory for containers stored below `root`.
    pub fn new(root: impl Into<PathBuf>, options: LmdbOptions) -> Self {
        Self {
            root: root.into(),
            options,
            envs: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Number of LMDB environments currently open through this factory.
    pub fn open_env_count(&self) -> usize {
        let envs = self.envs.lock().unwrap_or_else(PoisonError::into_inner);
        envs.values().filter(|env| env.strong_count() > 0).count()
    }
}

/// Open (or reuse) the environment at `path`. Runs on a blocking thread.
fn open_env(
    envs: &Mutex<HashMap<PathBuf, Weak<Env>>>,
    path: &Path,
    mode: OpenMode,
    options: &LmdbOptions,
) -> Result<(Arc<Env>, Database<Bytes, Bytes>)> {
    // Held across the open so two pools can't race to open the same path.
    let mut envs = envs.lock().unwrap_or_else(PoisonError::into_inner);
    envs.retain(|_, env| env.strong_count() > 0);

    let env = match envs.get(path).and_then(Weak::upgrade) {
        Some(env) => env,
        None => {
            if mode.is_read_only() {
                if !path.join(LMDB_DATA_FILE).exists() {
                    return Err(ContainerError::NotFound(path.display().to_string()));
                }
            } else {
                std::fs::create_dir_all(path)?;
            }

            let env = unsafe {
                EnvOpenOptions::new()
                    .map_size(options.map_size)
                    .max_readers(options.max_readers)
                    .max_dbs(1)
                    .open(path)
                    .map_err(db_err)?
            };
            let env = Arc::new(env);
            envs.insert(path.to_path_buf(), Arc::downgrade(&env));
            env
        }
    };

    // The unnamed main database always exists, so this never writes data.
    let mut wtxn = env.write_txn().map_err(db_err)?;
    let db: Database<Bytes, Bytes> = env.create_database(&mut wtxn, None).map_err(db_err)?;
    wtxn.commit().map_err(db_err)?;

    Ok((env, db))
}

#[async_trait]
impl ContainerFactory<ContainerId> for LmdbContainerFactory {
    async fn open(&self, id: &ContainerId, mode: OpenMode) -> Result<Arc<dyn Container>> {
        let path = self.root.join(id.relative_path());
        let envs = Arc::clone(&self.envs);
        let options = self.options.clone();

        let (env, db) = {
            let path = path.clone();
            tokio::task::spawn_blocking(move || open_env(&envs, &path, mode, &options))
                .await
                .map_err(db_err)??
        };

        debug!(id = %id, path = %path.display(), %mode, "opened lmdb container");

        Ok(Arc::new(LmdbContainer {
            inner: Arc::new(LmdbInner {
                env,
                db,
                read_only: mode.is_read_only(),
                closed: AtomicBool::new(false),
            }),
        }))
    }
}

// =============================================================================
// LmdbContainer
// =============================================================================

/// A container handle backed by an LMDB environment.
pub struct LmdbContainer {
    inner: Arc<LmdbInner>,
}

struct LmdbInner {
    env: Arc<Env>,
    db: Database<Bytes, Bytes>,
    read_only: bool,
    closed: AtomicBool,
}

impl LmdbInner {
    fn check_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            Err(ContainerError::Closed)
        } else {
            Ok(())
        }
    }
}

impl LmdbContainer {
    async fn read(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.inner.check_open()?;
        let inner = Arc::clone(&self.inner);
        let key = key.to_vec();

        tokio::task::spawn_blocking(move || -> Result<Option<Vec<u8>>> {
            let rtxn = inner.env.read_txn().map_err(db_err)?;
            let value = inner.db.get(&rtxn, &key).map_err(db_err)?.map(|v| v.to_vec());
            Ok(value)
        })
        .await
        .map_err(db_err)?
    }
}

#[async_trait]
impl Container for LmdbContainer {
    async fn exists(&self, key: &[u8]) -> Result<bool> {
        Ok(self.read(key).await?.is_some())
    }

    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.read(key).await
    }

    async fn write(&self) -> Result<Box<dyn ContainerWrites + Send>> {
        self.inner.check_open()?;
        if self.inner.read_only {
            return Err(ContainerError::ReadOnly);
        }
        Ok(Box::new(LmdbWrites {
            inner: Arc::clone(&self.inner),
            pending: Vec::new(),
        }))
    }

    fn is_read_only(&self) -> bool {
        self.inner.read_only
    }

    fn close(&self) -> Result<()> {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        if !self.inner.read_only {
            self.inner.env.force_sync().map_err(db_err)?;
        }
        Ok(())
    }
}

// =============================================================================
// LmdbWrites
// =============================================================================

struct LmdbWrites {
    inner: Arc<LmdbInner>,
    pending: Vec<WriteOp>,
}

#[async_trait]
impl ContainerWrites for LmdbWrites {
    fn set(&mut self, key: Vec<u8>, val: Vec<u8>) {
        self.pending.push(WriteOp::Set { key, value: val });
    }

    fn del(&mut self, key: Vec<u8>) {
        self.pending.push(WriteOp::Del { key });
    }

    async fn flush(self: Box<Self>) -> Result<()> {
        self.inner.check_open()?;
        if self.pending.is_empty() {
            return Ok(());
        }

        let inner = self.inner;
        let pending = self.pending;

        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut wtxn = inner.env.write_txn().map_err(db_err)?;
            for op in pending {
                match op {
                    WriteOp::Set { key, value } => {
                        inner.db.put(&mut wtxn, &key, &value).map_err(db_err)?;
                    }
                    WriteOp::Del { key } => {
                        inner.db.delete(&mut wtxn, &key).map_err(db_err)?;
                    }
                }
            }
            wtxn.commit().map_err(db_err)?;
            Ok(())
        })
        .await
        .map_err(db_err)?
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn id(s: &str) -> ContainerId {
        ContainerId::new(s).unwrap()
    }

    #[tokio::test]
    async fn test_basic_operations() {
        let temp_dir = TempDir::new().unwrap();
        let factory = LmdbContainerFactory::new(temp_dir.path(), LmdbOptions::default());
        let container = factory.open(&id("meta/chunks/r1"), OpenMode::ReadWrite).await.unwrap();

        // Initially empty
        assert!(!container.exists(b"key1").await.unwrap());
        assert!(container.get(b"key1").await.unwrap().is_none());

        let mut writes = container.write().await.unwrap();
        writes.set(b"key1".to_vec(), b"value1".to_vec());
        writes.flush().await.unwrap();

        assert!(container.exists(b"key1").await.unwrap());
        assert_eq!(container.get(b"key1").await.unwrap(), Some(b"value1".to_vec()));
        assert!(temp_dir.path().join("meta/chunks/r1").join(LMDB_DATA_FILE).exists());
    }

    #[tokio::test]
    async fn test_delete() {
        let temp_dir = TempDir::new().unwrap();
        let factory = LmdbContainerFactory::new(temp_dir.path(), LmdbOptions::default());
        let container = factory.open(&id("run-1"), OpenMode::ReadWrite).await.unwrap();

        let mut writes = container.write().await.unwrap();
        writes.set(b"key1".to_vec(), b"value1".to_vec());
        writes.flush().await.unwrap();
        assert!(container.exists(b"key1").await.unwrap());

        let mut writes = container.write().await.unwrap();
        writes.del(b"key1".to_vec());
        writes.flush().await.unwrap();
        assert!(!container.exists(b"key1").await.unwrap());
    }

    #[tokio::test]
    async fn test_read_only_missing_container() {
        let temp_dir = TempDir::new().unwrap();
        let factory = LmdbContainerFactory::new(temp_dir.path(), LmdbOptions::default());

        let result = factory.open(&id("missing"), OpenMode::ReadOnly).await;
        assert!(matches!(result, Err(ContainerError::NotFound(_))));
        // A failed view open must not create anything on disk
        assert!(!temp_dir.path().join("missing").exists());
    }

    #[tokio::test]
    async fn test_view_shares_environment_with_writer() {
        let temp_dir = TempDir::new().unwrap();
        let factory = LmdbContainerFactory::new(temp_dir.path(), LmdbOptions::default());

        let writer = factory.open(&id("run-1"), OpenMode::ReadWrite).await.unwrap();
        let mut writes = writer.write().await.unwrap();
        writes.set(b"k".to_vec(), b"v".to_vec());
        writes.flush().await.unwrap();

        let view = factory.open(&id("run-1"), OpenMode::ReadOnly).await.unwrap();
        assert!(view.is_read_only());
        assert_eq!(view.get(b"k").await.unwrap(), Some(b"v".to_vec()));
        assert!(matches!(view.write().await, Err(ContainerError::ReadOnly)));
        assert_eq!(factory.open_env_count(), 1);
    }

    #[tokio::test]
    async fn test_closed_handle_rejects_use_and_reopen_sees_data() {
        let temp_dir = TempDir::new().unwrap();
        let factory = LmdbContainerFactory::new(temp_dir.path(), LmdbOptions::default());

        let container = factory.open(&id("run-1"), OpenMode::ReadWrite).await.unwrap();
        let mut writes = container.write().await.unwrap();
        writes.set(b"k".to_vec(), b"v".to_vec());
        writes.flush().await.unwrap();

        container.close().unwrap();
        // Closing twice is harmless
        container.close().unwrap();
        assert!(matches!(container.get(b"k").await, Err(ContainerError::Closed)));
        assert!(matches!(container.write().await, Err(ContainerError::Closed)));

        drop(container);
        assert_eq!(factory.open_env_count(), 0);

        let reopened = factory.open(&id("run-1"), OpenMode::ReadOnly).await.unwrap();
        assert_eq!(reopened.get(b"k").await.unwrap(), Some(b"v".to_vec()));
    }
}
