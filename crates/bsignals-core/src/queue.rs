//! Blocking MPMC queue used for every ordered hand-off
//!
//! Design:
//! - Items live in a lock-free `SegQueue`; producers never take a lock
//!   unless a consumer is parked
//! - Consumers park on a `Mutex<()>` + `Condvar` pair and re-check the
//!   predicate after every wake, so they never return spuriously
//! - `stop()` is terminal: blocking dequeues return the stopped marker
//!   from then on, even if items remain
//!
//! Enqueue after `stop()` is rejected and the item is handed back in
//! `EnqueueError`.

use crate::error::{DequeueError, EnqueueError};

use crossbeam_queue::SegQueue;
use std::sync::atomic::{fence, AtomicBool, AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Thread-safe FIFO with blocking, timed and non-blocking dequeue
pub struct ConcurrentQueue<T> {
    /// Pending items in arrival order
    items: SegQueue<T>,

    /// Terminal flag, never cleared once set
    stopped: AtomicBool,

    /// Consumers currently parked (or about to park) on `cond`
    waiters: AtomicUsize,

    /// Parking lock; guards no data, only the wait/notify handshake
    lock: Mutex<()>,

    cond: Condvar,
}

impl<T> ConcurrentQueue<T> {
    pub fn new() -> Self {
        Self {
            items: SegQueue::new(),
            stopped: AtomicBool::new(false),
            waiters: AtomicUsize::new(0),
            lock: Mutex::new(()),
            cond: Condvar::new(),
        }
    }

    /// Append an item and wake parked consumers
    ///
    /// Returns the item back if the queue has been stopped.
    pub fn enqueue(&self, item: T) -> Result<(), EnqueueError<T>> {
        if self.is_stopped() {
            return Err(EnqueueError(item));
        }
        self.items.push(item);

        // Pairs with the fence in `park`: either the consumer sees the
        // item on its re-check, or we see it counted in `waiters`.
        // `wait`/`wait_for` park here too without taking the item, so every
        // parked thread is woken.
        fence(Ordering::SeqCst);
        if self.waiters.load(Ordering::SeqCst) > 0 {
            let _guard = self.park_lock();
            self.cond.notify_all();
        }
        Ok(())
    }

    /// Block until an item is available or the queue is stopped
    ///
    /// Returns `None` once stopped; that is the normal exit signal for
    /// worker loops.
    pub fn dequeue(&self) -> Option<T> {
        loop {
            if self.is_stopped() {
                return None;
            }
            if let Some(item) = self.items.pop() {
                return Some(item);
            }
            self.park(None);
        }
    }

    /// Block up to `timeout` for an item
    pub fn try_dequeue_for(&self, timeout: Duration) -> Result<T, DequeueError> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.is_stopped() {
                return Err(DequeueError::Stopped);
            }
            if let Some(item) = self.items.pop() {
                return Ok(item);
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(DequeueError::Timeout);
            }
            self.park(Some(deadline - now));
        }
    }

    /// Take the front item without blocking
    ///
    /// Unlike the blocking variants this still drains items left behind
    /// after `stop()`.
    pub fn try_dequeue(&self) -> Result<T, DequeueError> {
        match self.items.pop() {
            Some(item) => Ok(item),
            None if self.is_stopped() => Err(DequeueError::Stopped),
            None => Err(DequeueError::Empty),
        }
    }

    /// Block until the queue is non-empty or stopped
    pub fn wait(&self) {
        while !self.is_stopped() && self.items.is_empty() {
            self.park(None);
        }
    }

    /// Block up to `timeout` until the queue is non-empty
    ///
    /// Returns `true` if an item is available.
    pub fn wait_for(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if !self.items.is_empty() {
                return true;
            }
            if self.is_stopped() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            self.park(Some(deadline - now));
        }
    }

    /// Drop every pending item
    pub fn clear(&self) {
        while self.items.pop().is_some() {}
    }

    /// Wake every parked consumer without changing state
    ///
    /// Waiters re-check their predicate and go back to sleep if nothing
    /// changed.
    pub fn wake(&self) {
        let _guard = self.park_lock();
        self.cond.notify_all();
    }

    /// Stop the queue and wake every waiter (idempotent, irreversible)
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.wake();
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Number of pending items
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of consumers currently parked
    #[inline]
    pub fn waiters(&self) -> usize {
        self.waiters.load(Ordering::Relaxed)
    }

    fn park_lock(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sleep until notified or `timeout` elapses
    ///
    /// The caller loops and re-checks its own predicate afterwards.
    fn park(&self, timeout: Option<Duration>) {
        let guard = self.park_lock();
        self.waiters.fetch_add(1, Ordering::SeqCst);
        fence(Ordering::SeqCst);

        if self.is_stopped() || !self.items.is_empty() {
            self.waiters.fetch_sub(1, Ordering::SeqCst);
            return;
        }

        let guard = match timeout {
            Some(t) => {
                self.cond
                    .wait_timeout(guard, t)
                    .unwrap_or_else(PoisonError::into_inner)
                    .0
            }
            None => self.cond.wait(guard).unwrap_or_else(PoisonError::into_inner),
        };
        self.waiters.fetch_sub(1, Ordering::SeqCst);
        drop(guard);
    }
}

impl<T> Default for ConcurrentQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for ConcurrentQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcurrentQueue")
            .field("len", &self.len())
            .field("stopped", &self.is_stopped())
            .field("waiters", &self.waiters())
            .finish()
    }
}
