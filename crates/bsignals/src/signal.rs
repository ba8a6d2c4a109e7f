//! Signal: typed slot registry plus emission
//!
//! A `Signal<A>` owns its slots. `emit(args)` wraps the arguments in one
//! `Arc`, snapshots a route per slot under the guard's read side, releases
//! it, then hands each slot its invocation according to the slot's
//! `ExecutorScheme`. Slots are visited in ascending id order.
//!
//! # Thread-safety modes
//!
//! | type            | connect/disconnect | emit     | lock          |
//! |-----------------|--------------------|----------|---------------|
//! | `Signal<A>`     | `&mut self`        | `&self`  | none          |
//! | `SafeSignal<A>` | `&self`            | `&self`  | reader-writer |
//!
//! Removing a slot releases it immediately: a strand slot's queue is
//! stopped and its thread joined before `disconnect` returns, unless the
//! call comes from that strand's own thread.
//!
//! Two strand callbacks must not disconnect each other's slots at the
//! same time. Each `disconnect` joins the other strand while that strand
//! is blocked joining the first, and neither call returns. Route such
//! removals through one thread, or have a callback disconnect only its
//! own slot.

use crate::dispatch::{dispatch, Route};
use crate::guard::{NoGuard, RegistryGuard, RwGuard};
use crate::scheme::ExecutorScheme;
use crate::slot::{Callback, Registry, Slot};

use bsignals_core::{kdebug, ktrace, kwarn, SignalError, SignalResult, SlotId};
use bsignals_runtime::{pool, AsyncExecutor, SignalConfig};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Signal whose registry is guarded by a reader-writer lock
pub type SafeSignal<A> = Signal<A, RwGuard<A>>;

/// Emission counters of one signal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignalStats {
    /// Calls to `emit`
    pub emitted: u64,
    /// Invocations run inline or accepted by an executor
    pub dispatched: u64,
    /// Invocations dropped: async cap, stopped queue, spawn failure
    pub rejected: u64,
}

#[derive(Default)]
struct Counters {
    emitted: AtomicU64,
    dispatched: AtomicU64,
    rejected: AtomicU64,
}

/// Typed signal carrying argument type `A`
///
/// Multiple arguments travel as a tuple: `Signal<(i32, String)>`.
pub struct Signal<A, G = NoGuard<A>> {
    guard: G,
    next_id: AtomicU64,
    config: SignalConfig,
    async_exec: AsyncExecutor,
    counters: Counters,
    _args: std::marker::PhantomData<fn(&A)>,
}

// ============================================================================
// Construction
// ============================================================================

impl<A> Signal<A, NoGuard<A>>
where
    A: Send + Sync + 'static,
{
    /// Unguarded signal configured from the environment
    pub fn new() -> Self {
        Self::with_config(SignalConfig::default())
    }

    pub fn with_config(config: SignalConfig) -> Self {
        Signal::build(config)
    }

    /// Reader-writer locked signal configured from the environment
    pub fn with_safety() -> SafeSignal<A> {
        Self::with_safety_config(SignalConfig::default())
    }

    pub fn with_safety_config(config: SignalConfig) -> SafeSignal<A> {
        Signal::build(config)
    }
}

impl<A> Default for Signal<A, NoGuard<A>>
where
    A: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Common operations
// ============================================================================

impl<A, G> Signal<A, G>
where
    A: Send + Sync + 'static,
    G: RegistryGuard<A>,
{
    fn build(config: SignalConfig) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(e) => {
                kwarn!("{}; async threads left unbounded", e);
                config.max_async_threads(None)
            }
        };
        Self {
            guard: G::new(Registry::new()),
            next_id: AtomicU64::new(SlotId::FIRST.as_u64()),
            async_exec: AsyncExecutor::new(&config),
            config,
            counters: Counters::default(),
            _args: std::marker::PhantomData,
        }
    }

    /// Invoke every connected slot with `args`
    ///
    /// Synchronous slots have run when this returns, and a panic in one of
    /// them propagates here, skipping the slots after it. Other schemes are
    /// only queued. Under `AsyncOverflow::Block` this waits while the
    /// async cap is reached.
    pub fn emit(&self, args: A) {
        self.counters.emitted.fetch_add(1, Ordering::Relaxed);

        let routes: Vec<Route<A>> = self.guard.read(|registry| registry.values().map(Slot::route).collect());
        if routes.is_empty() {
            return;
        }
        ktrace!("emit to {} slot(s)", routes.len());

        let args = Arc::new(args);
        for route in routes {
            let id = route.id;
            match dispatch(route, &args, &self.async_exec) {
                Ok(()) => {
                    self.counters.dispatched.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    self.counters.rejected.fetch_add(1, Ordering::Relaxed);
                    match &e {
                        SignalError::AsyncLimit(_) | SignalError::QueueStopped => {
                            kdebug!("{} skipped: {}", id, e);
                        }
                        _ => {
                            kwarn!("{} skipped: {}", id, e);
                        }
                    }
                }
            }
        }
    }

    /// Number of connected slots
    pub fn len(&self) -> usize {
        self.guard.read(|registry| registry.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: SlotId) -> bool {
        self.guard.read(|registry| registry.contains_key(&id))
    }

    /// Ids of connected slots, ascending
    pub fn slot_ids(&self) -> Vec<SlotId> {
        self.guard.read(|registry| registry.keys().copied().collect())
    }

    pub fn stats(&self) -> SignalStats {
        SignalStats {
            emitted: self.counters.emitted.load(Ordering::Relaxed),
            dispatched: self.counters.dispatched.load(Ordering::Relaxed),
            rejected: self.counters.rejected.load(Ordering::Relaxed),
        }
    }

    #[inline]
    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    /// Allocate an id and build the slot, outside any lock
    ///
    /// The first thread-pooled slot in the process starts the shared pool.
    fn make_slot(&self, scheme: ExecutorScheme, callback: Callback<A>) -> SignalResult<Slot<A>> {
        if scheme == ExecutorScheme::ThreadPooled {
            pool::startup()?;
        }
        let id = SlotId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        Slot::new(id, scheme, callback)
    }
}

fn member<T, A, F>(instance: Arc<T>, method: F) -> impl Fn(&A) + Send + Sync + 'static
where
    T: Send + Sync + 'static,
    A: 'static,
    F: Fn(&T, &A) + Send + Sync + 'static,
{
    move |args: &A| method(&*instance, args)
}

// ============================================================================
// Unguarded mutation
// ============================================================================

impl<A> Signal<A, NoGuard<A>>
where
    A: Send + Sync + 'static,
{
    /// Register `callback` to run under `scheme` on every emission
    ///
    /// Fails with `Spawn` if a strand thread (or the shared pool) cannot
    /// be started; nothing is registered then.
    pub fn connect<F>(&mut self, scheme: ExecutorScheme, callback: F) -> SignalResult<SlotId>
    where
        F: Fn(&A) + Send + Sync + 'static,
    {
        let slot = self.make_slot(scheme, Arc::new(callback))?;
        let id = slot.id();
        self.guard.get_mut().insert(id, slot);
        Ok(id)
    }

    /// Register a method of a shared instance
    pub fn connect_member<T, F>(&mut self, scheme: ExecutorScheme, instance: Arc<T>, method: F) -> SignalResult<SlotId>
    where
        T: Send + Sync + 'static,
        F: Fn(&T, &A) + Send + Sync + 'static,
    {
        self.connect(scheme, member::<T, A, F>(instance, method))
    }

    /// Remove a slot; unknown ids are ignored and return `false`
    pub fn disconnect(&mut self, id: SlotId) -> bool {
        let removed = self.guard.get_mut().remove(&id);
        release(id, removed)
    }

    /// Remove every slot
    pub fn disconnect_all(&mut self) {
        let slots = std::mem::take(self.guard.get_mut());
        release_all(slots);
    }
}

// ============================================================================
// Locked mutation
// ============================================================================

impl<A> Signal<A, RwGuard<A>>
where
    A: Send + Sync + 'static,
{
    /// Register `callback` to run under `scheme` on every emission
    ///
    /// Fails with `Spawn` if a strand thread (or the shared pool) cannot
    /// be started; nothing is registered then.
    pub fn connect<F>(&self, scheme: ExecutorScheme, callback: F) -> SignalResult<SlotId>
    where
        F: Fn(&A) + Send + Sync + 'static,
    {
        let slot = self.make_slot(scheme, Arc::new(callback))?;
        let id = slot.id();
        self.guard.write(|registry| registry.insert(id, slot));
        Ok(id)
    }

    /// Register a method of a shared instance
    pub fn connect_member<T, F>(&self, scheme: ExecutorScheme, instance: Arc<T>, method: F) -> SignalResult<SlotId>
    where
        T: Send + Sync + 'static,
        F: Fn(&T, &A) + Send + Sync + 'static,
    {
        self.connect(scheme, member::<T, A, F>(instance, method))
    }

    /// Remove a slot; unknown ids are ignored and return `false`
    ///
    /// The strand of a removed slot is joined after the lock is released.
    pub fn disconnect(&self, id: SlotId) -> bool {
        let removed = self.guard.write(|registry| registry.remove(&id));
        release(id, removed)
    }

    /// Remove every slot
    pub fn disconnect_all(&self) {
        let slots = self.guard.write(std::mem::take);
        release_all(slots);
    }
}

fn release<A>(id: SlotId, removed: Option<Slot<A>>) -> bool {
    match removed {
        Some(slot) => {
            drop(slot);
            kdebug!("{} disconnected", id);
            true
        }
        None => {
            ktrace!("{} not connected, ignored", id);
            false
        }
    }
}

fn release_all<A>(slots: Registry<A>) {
    let count = slots.len();
    drop(slots);
    if count > 0 {
        kdebug!("disconnected {} slot(s)", count);
    }
}

impl<A, G> fmt::Debug for Signal<A, G>
where
    A: Send + Sync + 'static,
    G: RegistryGuard<A>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("mode", &G::MODE)
            .field("slots", &self.len())
            .field("stats", &self.stats())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    #[test]
    fn test_ids_start_at_one_and_increase() {
        let mut signal = Signal::<u32>::with_config(SignalConfig::new());
        let a = signal.connect(ExecutorScheme::Synchronous, |_| {}).unwrap();
        let b = signal.connect(ExecutorScheme::Synchronous, |_| {}).unwrap();
        assert_eq!(a, SlotId::FIRST);
        assert_eq!(b.as_u64(), 2);

        assert!(signal.disconnect(a));
        let c = signal.connect(ExecutorScheme::Synchronous, |_| {}).unwrap();
        assert_eq!(c.as_u64(), 3);
    }

    #[test]
    fn test_sync_order_follows_ids() {
        let mut signal = Signal::<u32>::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        for tag in 0..5u32 {
            let log = Arc::clone(&log);
            signal
                .connect(ExecutorScheme::Synchronous, move |v| log.lock().unwrap().push(tag * 10 + v))
                .unwrap();
        }

        signal.emit(1);
        assert_eq!(*log.lock().unwrap(), vec![1, 11, 21, 31, 41]);
    }

    #[test]
    fn test_disconnect_unknown_is_ignored() {
        let mut signal = Signal::<()>::new();
        assert!(!signal.disconnect(SlotId::new(99)));
        assert!(!signal.disconnect(SlotId::NONE));

        let id = signal.connect(ExecutorScheme::Strand, |_| {}).unwrap();
        assert!(signal.disconnect(id));
        assert!(!signal.disconnect(id));
        assert!(signal.is_empty());
    }

    #[test]
    fn test_stats() {
        let mut signal = Signal::<u8>::new();
        signal.emit(0);
        assert_eq!(signal.stats(), SignalStats { emitted: 1, dispatched: 0, rejected: 0 });

        let hits = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let hits = Arc::clone(&hits);
            signal
                .connect(ExecutorScheme::Synchronous, move |_| {
                    hits.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
        }
        signal.emit(1);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
        assert_eq!(signal.stats(), SignalStats { emitted: 2, dispatched: 3, rejected: 0 });
    }

    #[test]
    fn test_safe_signal_shares_mutation() {
        let signal = Arc::new(Signal::<u64>::with_safety());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let signal = Arc::clone(&signal);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        signal.connect(ExecutorScheme::Synchronous, |_| {}).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(signal.len(), 200);
        let ids = signal.slot_ids();
        assert_eq!(ids.first().map(|id| id.as_u64()), Some(1));
        assert_eq!(ids.last().map(|id| id.as_u64()), Some(200));

        signal.disconnect_all();
        assert!(signal.is_empty());
    }

    #[test]
    fn test_invalid_config_falls_back() {
        let signal = Signal::<()>::with_config(SignalConfig::new().max_async_threads(Some(0)));
        assert_eq!(signal.config().max_async_threads, None);
    }

    #[test]
    fn test_debug_names_mode() {
        let plain = format!("{:?}", Signal::<()>::new());
        let safe = format!("{:?}", Signal::<()>::with_safety());
        assert!(plain.contains("unguarded"));
        assert!(safe.contains("rw-lock"));
    }
}
