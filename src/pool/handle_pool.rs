//! Reference-counted pool of container handles.
//!
//! A [`HandlePool`] caches one live container handle per identifier and
//! hands out [`Lease`]s on it. Handles are opened lazily on the first
//! acquisition and closed when the pool is cleared (once their last lease is
//! released), when the pool is shut down, or when the idle-eviction policy
//! reclaims them.
//!
//! # Concurrent misses
//!
//! The pool lock is never held while the factory runs. The first caller that
//! misses on an identifier inserts a reservation and opens the container;
//! callers that miss on the same identifier while it is in flight wait on the
//! reservation and then look the identifier up again, so only one handle is
//! ever opened for it. If the opening caller is cancelled, the reservation is
//! withdrawn and the waiters retry.
//!
//! # Clearing
//!
//! [`clear`](HandlePool::clear) never waits for leases. Entries without
//! leases are closed right away; the others are retired (`Closing`) and close
//! when their last lease is released. Acquisitions after the clear always get
//! a freshly opened handle.

use std::collections::HashMap;
use std::fmt;
use std::fmt::Debug;
use std::hash::Hash;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tokio::sync::{Notify, OnceCell};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::container::{Container, ContainerFactory};

use super::error::{PoolError, Result};
use super::variants::{EvictionPolicy, PoolConfig, PoolKind};

/// Bounds every pool key satisfies.
pub trait PoolKey: Eq + Hash + Clone + Debug + Send + Sync + 'static {}

impl<T> PoolKey for T where T: Eq + Hash + Clone + Debug + Send + Sync + 'static {}

// =============================================================================
// Public Types
// =============================================================================

/// Lifecycle state of a pooled handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    /// Usable and issuable to new callers.
    Open,
    /// Retired by a clear; waiting for its last lease to be released.
    Closing,
    /// Closed and removed from the pool.
    Closed,
}

/// A snapshot of a pool's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Acquisitions served by an already open handle.
    pub hits: u64,
    /// Handles opened through the factory.
    pub opens: u64,
    /// Factory calls that failed.
    pub open_failures: u64,
    /// Handles closed by the pool.
    pub closes: u64,
    /// Entries currently `Open`.
    pub open: usize,
    /// Entries currently `Closing`.
    pub closing: usize,
}

// =============================================================================
// Internal State
// =============================================================================

/// A handle registered in the pool.
struct Entry<K> {
    id: K,
    serial: u64,
    container: Arc<dyn Container>,
    refs: usize,
    /// Leases among `refs` that were detached and are owed a raw release.
    detached: usize,
    created_at: Instant,
    /// When `refs` last dropped to zero.
    idle_since: Option<Instant>,
}

/// What the opening caller tells the callers waiting on its reservation.
#[derive(Clone)]
enum Outcome {
    /// The handle is registered; look it up again.
    Ready,
    /// Nothing usable was registered; start over.
    Retry,
    /// The factory failed.
    Failed(PoolError),
}

/// An in-flight open of one identifier.
struct Reservation {
    outcome: OnceCell<Outcome>,
    notify: Notify,
}

impl Reservation {
    fn new() -> Self {
        Self {
            outcome: OnceCell::new(),
            notify: Notify::new(),
        }
    }

    fn complete(&self, outcome: Outcome) {
        // Only the opening caller completes a reservation, and only once.
        let _ = self.outcome.set(outcome);
        self.notify.notify_waiters();
    }

    async fn wait(&self) -> Outcome {
        loop {
            // Register for notification before checking the outcome
            let notified = self.notify.notified();
            if let Some(outcome) = self.outcome.get() {
                return outcome.clone();
            }
            notified.await;
        }
    }
}

enum Slot<K> {
    Opening(Arc<Reservation>),
    Ready(Entry<K>),
}

struct PoolState<K> {
    slots: HashMap<K, Slot<K>>,
    /// Entries retired by a clear, keyed by serial.
    retired: HashMap<u64, Entry<K>>,
    shut_down: bool,
}

impl<K: PoolKey> PoolState<K> {
    fn is_current(&self, id: &K, reservation: &Arc<Reservation>) -> bool {
        matches!(self.slots.get(id), Some(Slot::Opening(r)) if Arc::ptr_eq(r, reservation))
    }

    /// The registered entry `serial`, open or retired.
    fn entry_mut(&mut self, id: &K, serial: u64) -> Option<&mut Entry<K>> {
        if self.retired.contains_key(&serial) {
            return self.retired.get_mut(&serial);
        }
        match self.slots.get_mut(id) {
            Some(Slot::Ready(entry)) if entry.serial == serial => Some(entry),
            _ => None,
        }
    }

    fn open_count(&self) -> usize {
        self.slots
            .values()
            .filter(|slot| matches!(slot, Slot::Ready(_)))
            .count()
    }
}

struct Inner<K> {
    config: PoolConfig,
    factory: Arc<dyn ContainerFactory<K>>,
    state: Mutex<PoolState<K>>,
    /// Signalled whenever the pool closes handles.
    drained: Notify,
    next_serial: AtomicU64,
    hits: AtomicU64,
    opens: AtomicU64,
    open_failures: AtomicU64,
    closes: AtomicU64,
}

impl<K: PoolKey> Inner<K> {
    fn name(&self) -> &'static str {
        self.config.kind.name()
    }

    fn lock(&self) -> MutexGuard<'_, PoolState<K>> {
        // Every critical section leaves the state consistent before any call
        // that could panic, so a poisoned lock is still usable.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn negative_reference(&self, id: &K) -> PoolError {
        PoolError::NegativeReference {
            pool: self.name(),
            id: format!("{:?}", id),
        }
    }

    /// Drop one lease of the entry `serial`. Returns the entry if it must now
    /// be closed.
    fn release_locked(
        &self,
        state: &mut PoolState<K>,
        id: &K,
        serial: u64,
    ) -> Result<Option<Entry<K>>> {
        if let Some(entry) = state.retired.get_mut(&serial) {
            entry.refs = entry
                .refs
                .checked_sub(1)
                .ok_or_else(|| self.negative_reference(id))?;
            if entry.refs > 0 {
                return Ok(None);
            }
            return Ok(state.retired.remove(&serial));
        }

        let remaining = match state.slots.get_mut(id) {
            Some(Slot::Ready(entry)) if entry.serial == serial && entry.refs > 0 => {
                entry.refs -= 1;
                if entry.refs == 0 {
                    entry.idle_since = Some(Instant::now());
                }
                entry.refs
            }
            _ => return Err(self.negative_reference(id)),
        };

        if remaining == 0 && self.config.eviction == EvictionPolicy::Idle(Duration::ZERO) {
            if let Some(Slot::Ready(entry)) = state.slots.remove(id) {
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }

    /// Release the lease on entry `serial` and close the entry if that was
    /// its last lease and it is due for eviction.
    fn release_serial(&self, id: &K, serial: u64) -> Result<()> {
        let released = {
            let mut state = self.lock();
            self.release_locked(&mut state, id, serial)
        };
        self.finish_release(id, released)
    }

    /// Release one detached lease on `id`, draining retired entries first.
    fn release_any(&self, id: &K) -> Result<()> {
        let released = {
            let mut state = self.lock();
            let retired = state
                .retired
                .values()
                .filter(|entry| entry.id == *id && entry.detached > 0)
                .map(|entry| entry.serial)
                .min();
            let serial = retired.or_else(|| match state.slots.get(id) {
                Some(Slot::Ready(entry)) if entry.detached > 0 => Some(entry.serial),
                _ => None,
            });
            match serial {
                Some(serial) => {
                    if let Some(entry) = state.entry_mut(id, serial) {
                        entry.detached -= 1;
                    }
                    self.release_locked(&mut state, id, serial)
                }
                None => Err(self.negative_reference(id)),
            }
        };
        self.finish_release(id, released)
    }

    /// Hand the release obligation of lease `serial` to a raw release.
    fn detach_serial(&self, id: &K, serial: u64) {
        if let Some(entry) = self.lock().entry_mut(id, serial) {
            entry.detached += 1;
        }
    }

    fn finish_release(&self, id: &K, released: Result<Option<Entry<K>>>) -> Result<()> {
        match released {
            Ok(Some(entry)) => {
                self.close_entries(vec![entry]);
                Ok(())
            }
            Ok(None) => {
                trace!(pool = self.name(), id = ?id, "released lease");
                Ok(())
            }
            Err(e) => {
                warn!(pool = self.name(), id = ?id, "release without an outstanding lease");
                Err(e)
            }
        }
    }

    /// Close entries that are no longer in the pool. Called without the lock.
    fn close_entries(&self, entries: Vec<Entry<K>>) {
        if entries.is_empty() {
            return;
        }
        for entry in entries {
            match entry.container.close() {
                Ok(()) => debug!(
                    pool = self.name(),
                    id = ?entry.id,
                    serial = entry.serial,
                    "closed container"
                ),
                Err(e) => warn!(
                    pool = self.name(),
                    id = ?entry.id,
                    serial = entry.serial,
                    error = %e,
                    "failed to close container"
                ),
            }
            self.closes.fetch_add(1, Ordering::Relaxed);
        }
        self.drained.notify_waiters();
    }

    fn clear(&self) {
        let (to_close, retiring, in_flight) = {
            let mut state = self.lock();
            let slots = std::mem::take(&mut state.slots);
            let mut to_close = Vec::new();
            let mut retiring = 0;
            let mut in_flight = 0;
            for (_, slot) in slots {
                match slot {
                    Slot::Ready(entry) if entry.refs == 0 => to_close.push(entry),
                    Slot::Ready(entry) => {
                        retiring += 1;
                        state.retired.insert(entry.serial, entry);
                    }
                    // The opening caller notices the reservation is gone.
                    Slot::Opening(_) => in_flight += 1,
                }
            }
            (to_close, retiring, in_flight)
        };

        info!(
            pool = self.name(),
            closed = to_close.len(),
            retiring,
            in_flight,
            "cleared pool"
        );
        self.close_entries(to_close);
    }

    fn evict_idle(&self) -> usize {
        let ttl = match self.config.eviction {
            EvictionPolicy::Never => return 0,
            EvictionPolicy::Idle(ttl) => ttl,
        };
        let now = Instant::now();

        let evicted: Vec<Entry<K>> = {
            let mut state = self.lock();
            let idle: Vec<K> = state
                .slots
                .iter()
                .filter_map(|(id, slot)| match slot {
                    Slot::Ready(entry)
                        if entry.refs == 0
                            && entry
                                .idle_since
                                .is_some_and(|since| now.duration_since(since) >= ttl) =>
                    {
                        Some(id.clone())
                    }
                    _ => None,
                })
                .collect();
            idle.into_iter()
                .filter_map(|id| match state.slots.remove(&id) {
                    Some(Slot::Ready(entry)) => Some(entry),
                    _ => None,
                })
                .collect()
        };

        let count = evicted.len();
        if count > 0 {
            debug!(pool = self.name(), count, "evicted idle containers");
        }
        self.close_entries(evicted);
        count
    }
}

impl<K> Drop for Inner<K> {
    fn drop(&mut self) {
        // Leases keep the pool alive, so nothing here is leased any more.
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        let ready = state.slots.drain().filter_map(|(_, slot)| match slot {
            Slot::Ready(entry) => Some(entry),
            Slot::Opening(_) => None,
        });
        for entry in ready.chain(state.retired.drain().map(|(_, entry)| entry)) {
            if let Err(e) = entry.container.close() {
                warn!(pool = self.config.kind.name(), error = %e, "failed to close container");
            }
        }
    }
}

/// Withdraws a reservation if the opening caller is cancelled mid-open.
struct ReservationGuard<'a, K: PoolKey> {
    inner: &'a Inner<K>,
    id: &'a K,
    reservation: &'a Arc<Reservation>,
    armed: bool,
}

impl<K: PoolKey> Drop for ReservationGuard<'_, K> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        {
            let mut state = self.inner.lock();
            if state.is_current(self.id, self.reservation) {
                state.slots.remove(self.id);
            }
        }
        debug!(pool = self.inner.name(), id = ?self.id, "abandoned container open");
        self.reservation.complete(Outcome::Retry);
    }
}

/// Result of the locked part of an acquisition.
enum Lookup<K: PoolKey> {
    Hit(Lease<K>),
    Wait(Arc<Reservation>),
    Reserved(Arc<Reservation>),
}

/// Where a freshly opened handle ended up.
enum Placement<K> {
    Registered,
    Retired,
    Rejected(Entry<K>),
}

// =============================================================================
// HandlePool
// =============================================================================

/// A keyed pool of reference-counted container handles.
///
/// Cloning a `HandlePool` yields another reference to the same pool.
pub struct HandlePool<K: PoolKey> {
    inner: Arc<Inner<K>>,
}

impl<K: PoolKey> Clone for HandlePool<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: PoolKey> HandlePool<K> {
    /// Create an empty pool that opens containers through `factory`.
    pub fn new(config: PoolConfig, factory: Arc<dyn ContainerFactory<K>>) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                factory,
                state: Mutex::new(PoolState {
                    slots: HashMap::new(),
                    retired: HashMap::new(),
                    shut_down: false,
                }),
                drained: Notify::new(),
                next_serial: AtomicU64::new(1),
                hits: AtomicU64::new(0),
                opens: AtomicU64::new(0),
                open_failures: AtomicU64::new(0),
                closes: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }

    pub fn kind(&self) -> PoolKind {
        self.inner.config.kind
    }

    /// Acquire a lease on the handle for `id`, opening it if necessary.
    ///
    /// The lease is released when dropped.
    ///
    /// # Errors
    ///
    /// - [`PoolError::PoolClosed`] if the pool has been shut down.
    /// - [`PoolError::ContainerOpenFailed`] if the factory failed. Nothing is
    ///   registered in that case, and callers that were waiting on the same
    ///   open receive the same error.
    pub async fn acquire(&self, id: &K) -> Result<Lease<K>> {
        loop {
            let lookup = {
                let mut state = self.inner.lock();
                if state.shut_down {
                    return Err(PoolError::PoolClosed {
                        pool: self.inner.name(),
                    });
                }
                match state.slots.get_mut(id) {
                    Some(Slot::Ready(entry)) => {
                        entry.refs += 1;
                        entry.idle_since = None;
                        trace!(
                            pool = self.inner.name(),
                            id = ?id,
                            serial = entry.serial,
                            refs = entry.refs,
                            "acquired pooled container"
                        );
                        Lookup::Hit(Lease::new(
                            Arc::clone(&self.inner),
                            id.clone(),
                            entry.serial,
                            entry.created_at,
                            Arc::clone(&entry.container),
                        ))
                    }
                    Some(Slot::Opening(reservation)) => Lookup::Wait(Arc::clone(reservation)),
                    None => {
                        let reservation = Arc::new(Reservation::new());
                        state
                            .slots
                            .insert(id.clone(), Slot::Opening(Arc::clone(&reservation)));
                        Lookup::Reserved(reservation)
                    }
                }
            };

            match lookup {
                Lookup::Hit(lease) => {
                    self.inner.hits.fetch_add(1, Ordering::Relaxed);
                    return Ok(lease);
                }
                Lookup::Reserved(reservation) => return self.open_reserved(id, reservation).await,
                Lookup::Wait(reservation) => match reservation.wait().await {
                    Outcome::Failed(e) => return Err(e),
                    Outcome::Ready | Outcome::Retry => continue,
                },
            }
        }
    }

    /// Open `id` for a reservation this caller holds, then register it.
    async fn open_reserved(&self, id: &K, reservation: Arc<Reservation>) -> Result<Lease<K>> {
        let inner = &self.inner;
        let mut guard = ReservationGuard {
            inner,
            id,
            reservation: &reservation,
            armed: true,
        };
        let opened = inner.factory.open(id, inner.config.mode).await;
        guard.armed = false;

        let container = match opened {
            Ok(container) => container,
            Err(source) => {
                {
                    let mut state = inner.lock();
                    if state.is_current(id, &reservation) {
                        state.slots.remove(id);
                    }
                }
                inner.open_failures.fetch_add(1, Ordering::Relaxed);
                warn!(pool = inner.name(), id = ?id, error = %source, "failed to open container");
                let err = PoolError::ContainerOpenFailed {
                    pool: inner.name(),
                    id: format!("{:?}", id),
                    source: Arc::new(source),
                };
                reservation.complete(Outcome::Failed(err.clone()));
                return Err(err);
            }
        };

        inner.opens.fetch_add(1, Ordering::Relaxed);
        let serial = inner.next_serial.fetch_add(1, Ordering::Relaxed);
        let created_at = Instant::now();
        let entry = Entry {
            id: id.clone(),
            serial,
            container: Arc::clone(&container),
            refs: 1,
            detached: 0,
            created_at,
            idle_since: None,
        };

        let placement = {
            let mut state = inner.lock();
            let current = state.is_current(id, &reservation);
            if state.shut_down {
                if current {
                    state.slots.remove(id);
                }
                Placement::Rejected(entry)
            } else if current {
                state.slots.insert(id.clone(), Slot::Ready(entry));
                Placement::Registered
            } else {
                // Cleared while opening: the handle predates the clear.
                state.retired.insert(serial, entry);
                Placement::Retired
            }
        };

        match placement {
            Placement::Registered => {
                debug!(pool = inner.name(), id = ?id, serial, "opened container");
                reservation.complete(Outcome::Ready);
            }
            Placement::Retired => {
                debug!(pool = inner.name(), id = ?id, serial, "opened container retired by clear");
                reservation.complete(Outcome::Retry);
            }
            Placement::Rejected(entry) => {
                inner.close_entries(vec![entry]);
                reservation.complete(Outcome::Retry);
                return Err(PoolError::PoolClosed { pool: inner.name() });
            }
        }

        Ok(Lease::new(
            Arc::clone(inner),
            id.clone(),
            serial,
            created_at,
            container,
        ))
    }

    /// Release one detached lease on `id`.
    ///
    /// This is the counterpart of [`Lease::detach`]. Only detached leases are
    /// released this way; leases still held by their owners are untouched.
    /// Detached leases on handles retired by a clear go first, oldest first.
    ///
    /// # Errors
    ///
    /// [`PoolError::NegativeReference`] if `id` has no detached lease.
    pub fn release(&self, id: &K) -> Result<()> {
        self.inner.release_any(id)
    }

    /// Retire every handle in the pool.
    ///
    /// Does not wait for outstanding leases; see [`drain`](Self::drain).
    pub fn clear(&self) {
        self.inner.clear();
    }

    /// Number of handles that are `Open` or `Closing`.
    pub fn size(&self) -> usize {
        let state = self.inner.lock();
        state.open_count() + state.retired.len()
    }

    /// Outstanding leases on the open handle for `id`.
    pub fn ref_count(&self, id: &K) -> Option<usize> {
        match self.inner.lock().slots.get(id) {
            Some(Slot::Ready(entry)) => Some(entry.refs),
            _ => None,
        }
    }

    /// State of the handle currently registered for `id`, if any.
    pub fn state_of(&self, id: &K) -> Option<HandleState> {
        match self.inner.lock().slots.get(id) {
            Some(Slot::Ready(_)) => Some(HandleState::Open),
            _ => None,
        }
    }

    pub fn stats(&self) -> PoolStats {
        let (open, closing) = {
            let state = self.inner.lock();
            (state.open_count(), state.retired.len())
        };
        PoolStats {
            hits: self.inner.hits.load(Ordering::Relaxed),
            opens: self.inner.opens.load(Ordering::Relaxed),
            open_failures: self.inner.open_failures.load(Ordering::Relaxed),
            closes: self.inner.closes.load(Ordering::Relaxed),
            open,
            closing,
        }
    }

    /// Wait until every `Closing` handle has been closed.
    pub async fn drain(&self) {
        loop {
            let notified = self.inner.drained.notified();
            if self.inner.lock().retired.is_empty() {
                return;
            }
            notified.await;
        }
    }

    /// Permanently shut the pool down.
    ///
    /// Clears the pool; later acquisitions fail with
    /// [`PoolError::PoolClosed`]. Outstanding leases stay usable until
    /// released.
    pub fn shutdown(&self) {
        {
            let mut state = self.inner.lock();
            if state.shut_down {
                return;
            }
            state.shut_down = true;
        }
        info!(pool = self.inner.name(), "shutting down pool");
        self.inner.clear();
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.lock().shut_down
    }

    /// Close handles that have been idle for at least the pool's idle
    /// timeout. Returns how many were closed.
    pub fn evict_idle(&self) -> usize {
        self.inner.evict_idle()
    }

    /// Spawn a task that runs [`evict_idle`](Self::evict_idle) every
    /// `period`.
    ///
    /// Returns `None` for pools without an idle policy. The task stops once
    /// the pool and all its leases are dropped.
    pub fn spawn_reaper(&self, period: Duration) -> Option<JoinHandle<()>> {
        self.inner.config.idle_timeout()?;
        let period = period.max(Duration::from_millis(1));
        let weak = Arc::downgrade(&self.inner);

        Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                inner.evict_idle();
            }
        }))
    }
}

impl<K: PoolKey> fmt::Debug for HandlePool<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlePool")
            .field("kind", &self.inner.config.kind)
            .field("size", &self.size())
            .finish()
    }
}

// =============================================================================
// Lease
// =============================================================================

/// A lease on a pooled container handle.
///
/// Dereferences to the container. The lease is released when dropped, or
/// explicitly with [`release`](Self::release).
pub struct Lease<K: PoolKey> {
    inner: Arc<Inner<K>>,
    id: K,
    serial: u64,
    created_at: Instant,
    container: Arc<dyn Container>,
    released: bool,
}

impl<K: PoolKey> Lease<K> {
    fn new(
        inner: Arc<Inner<K>>,
        id: K,
        serial: u64,
        created_at: Instant,
        container: Arc<dyn Container>,
    ) -> Self {
        Self {
            inner,
            id,
            serial,
            created_at,
            container,
            released: false,
        }
    }

    pub fn id(&self) -> &K {
        &self.id
    }

    /// Identity of the underlying handle. Each open gets a new serial.
    pub fn serial(&self) -> u64 {
        self.serial
    }

    /// When the underlying handle was opened.
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn container(&self) -> &Arc<dyn Container> {
        &self.container
    }

    /// Current state of the leased handle.
    pub fn state(&self) -> HandleState {
        let state = self.inner.lock();
        if state.retired.contains_key(&self.serial) {
            return HandleState::Closing;
        }
        match state.slots.get(&self.id) {
            Some(Slot::Ready(entry)) if entry.serial == self.serial => HandleState::Open,
            _ => HandleState::Closed,
        }
    }

    /// Release the lease now, reporting any error.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.inner.release_serial(&self.id, self.serial)
    }

    /// Give up the scoped release.
    ///
    /// The caller becomes responsible for calling [`HandlePool::release`]
    /// with this lease's identifier.
    pub fn detach(mut self) -> Arc<dyn Container> {
        self.released = true;
        self.inner.detach_serial(&self.id, self.serial);
        Arc::clone(&self.container)
    }
}

impl<K: PoolKey> Deref for Lease<K> {
    type Target = dyn Container;

    fn deref(&self) -> &Self::Target {
        &*self.container
    }
}

impl<K: PoolKey> Drop for Lease<K> {
    fn drop(&mut self) {
        if !self.released {
            // Errors are logged by the pool.
            let _ = self.inner.release_serial(&self.id, self.serial);
        }
    }
}

impl<K: PoolKey> fmt::Debug for Lease<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lease")
            .field("pool", &self.inner.config.kind)
            .field("id", &self.id)
            .field("serial", &self.serial)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
