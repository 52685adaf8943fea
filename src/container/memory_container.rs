//! In-memory container implementation, intended primarily for testing.
//!
//! The factory keeps every container's data for its own lifetime, so a
//! container closed by a pool and opened again sees what was written before.
//! It also counts opens and closes and can be told to fail or slow down
//! opens, which the pool tests rely on.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;

use super::container::{
    Container, ContainerError, ContainerFactory, ContainerWrites, OpenMode, Result, WriteOp,
};

/// Data and bookkeeping for one in-memory container.
#[derive(Default)]
struct MemoryStore {
    data: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
    /// Handles opened and not yet closed.
    live_handles: AtomicUsize,
}

// =============================================================================
// MemoryContainerFactory
// =============================================================================

/// An in-memory implementation of [`ContainerFactory`].
pub struct MemoryContainerFactory<K> {
    stores: Mutex<HashMap<K, Arc<MemoryStore>>>,
    failing: Mutex<HashSet<K>>,
    open_delay: Mutex<Option<Duration>>,
    opens: AtomicUsize,
    closes: Arc<AtomicUsize>,
}

impl<K> MemoryContainerFactory<K>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
{
    /// Create a factory with no containers.
    pub fn new() -> Self {
        Self {
            stores: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            open_delay: Mutex::new(None),
            opens: AtomicUsize::new(0),
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Make every future open of `id` fail.
    pub fn fail_opens(&self, id: K) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id);
    }

    /// Undo [`fail_opens`](Self::fail_opens).
    pub fn allow_opens(&self, id: &K) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
    }

    /// Delay every open by `delay`, to widen race windows in tests.
    pub fn set_open_delay(&self, delay: Option<Duration>) {
        *self.open_delay.lock().unwrap_or_else(PoisonError::into_inner) = delay;
    }

    /// Number of successful opens so far.
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Number of handles closed so far.
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Number of handles for `id` that are open and not yet closed.
    pub fn live_handles(&self, id: &K) -> usize {
        self.stores
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .map_or(0, |store| store.live_handles.load(Ordering::SeqCst))
    }
}

impl<K> Default for MemoryContainerFactory<K>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<K> ContainerFactory<K> for MemoryContainerFactory<K>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
{
    async fn open(&self, id: &K, mode: OpenMode) -> Result<Arc<dyn Container>> {
        let delay = *self.open_delay.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self
            .failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(id)
        {
            return Err(ContainerError::Database(format!(
                "injected open failure for {:?}",
                id
            )));
        }

        let store = {
            let mut stores = self.stores.lock().unwrap_or_else(PoisonError::into_inner);
            match stores.get(id) {
                Some(store) => Arc::clone(store),
                None if mode.is_read_only() => {
                    return Err(ContainerError::NotFound(format!("{:?}", id)));
                }
                None => {
                    let store = Arc::new(MemoryStore::default());
                    stores.insert(id.clone(), Arc::clone(&store));
                    store
                }
            }
        };

        store.live_handles.fetch_add(1, Ordering::SeqCst);
        self.opens.fetch_add(1, Ordering::SeqCst);

        Ok(Arc::new(MemoryContainer {
            store,
            read_only: mode.is_read_only(),
            closed: Arc::new(AtomicBool::new(false)),
            closes: Arc::clone(&self.closes),
        }))
    }
}

// =============================================================================
// MemoryContainer
// =============================================================================

/// A container handle over an in-memory store.
pub struct MemoryContainer {
    store: Arc<MemoryStore>,
    read_only: bool,
    closed: Arc<AtomicBool>,
    closes: Arc<AtomicUsize>,
}

impl MemoryContainer {
    fn check_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            Err(ContainerError::Closed)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Container for MemoryContainer {
    async fn exists(&self, key: &[u8]) -> Result<bool> {
        self.check_open()?;
        let data = self.store.data.read().unwrap_or_else(PoisonError::into_inner);
        Ok(data.contains_key(key))
    }

    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.check_open()?;
        let data = self.store.data.read().unwrap_or_else(PoisonError::into_inner);
        Ok(data.get(key).cloned())
    }

    async fn write(&self) -> Result<Box<dyn ContainerWrites + Send>> {
        self.check_open()?;
        if self.read_only {
            return Err(ContainerError::ReadOnly);
        }
        Ok(Box::new(MemoryWrites {
            store: Arc::clone(&self.store),
            closed: Arc::clone(&self.closed),
            pending: Vec::new(),
        }))
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn close(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.store.live_handles.fetch_sub(1, Ordering::SeqCst);
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

struct MemoryWrites {
    store: Arc<MemoryStore>,
    closed: Arc<AtomicBool>,
    pending: Vec<WriteOp>,
}

#[async_trait]
impl ContainerWrites for MemoryWrites {
    fn set(&mut self, key: Vec<u8>, val: Vec<u8>) {
        self.pending.push(WriteOp::Set { key, value: val });
    }

    fn del(&mut self, key: Vec<u8>) {
        self.pending.push(WriteOp::Del { key });
    }

    async fn flush(self: Box<Self>) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ContainerError::Closed);
        }
        let mut data = self.store.data.write().unwrap_or_else(PoisonError::into_inner);
        for op in self.pending {
            match op {
                WriteOp::Set { key, value } => {
                    data.insert(key, value);
                }
                WriteOp::Del { key } => {
                    data.remove(&key);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_data_survives_reopen() {
        let factory: MemoryContainerFactory<String> = MemoryContainerFactory::new();
        let id = "run-1".to_string();

        let container = factory.open(&id, OpenMode::ReadWrite).await.unwrap();
        let mut writes = container.write().await.unwrap();
        writes.set(b"k".to_vec(), b"v".to_vec());
        writes.flush().await.unwrap();
        container.close().unwrap();
        assert!(matches!(container.get(b"k").await, Err(ContainerError::Closed)));

        let view = factory.open(&id, OpenMode::ReadOnly).await.unwrap();
        assert_eq!(view.get(b"k").await.unwrap(), Some(b"v".to_vec()));
        assert!(matches!(view.write().await, Err(ContainerError::ReadOnly)));

        assert_eq!(factory.open_count(), 2);
        assert_eq!(factory.close_count(), 1);
        assert_eq!(factory.live_handles(&id), 1);
    }

    #[tokio::test]
    async fn test_read_only_open_of_missing_container_fails() {
        let factory: MemoryContainerFactory<String> = MemoryContainerFactory::new();
        let result = factory.open(&"nope".to_string(), OpenMode::ReadOnly).await;
        assert!(matches!(result, Err(ContainerError::NotFound(_))));
        assert_eq!(factory.open_count(), 0);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let factory: MemoryContainerFactory<String> = MemoryContainerFactory::new();
        let id = "run-x".to_string();

        factory.fail_opens(id.clone());
        assert!(factory.open(&id, OpenMode::ReadWrite).await.is_err());

        factory.allow_opens(&id);
        assert!(factory.open(&id, OpenMode::ReadWrite).await.is_ok());
    }
}
