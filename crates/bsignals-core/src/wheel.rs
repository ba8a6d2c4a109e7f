//! Round-robin selector over a fixed set of queues
//!
//! A `Wheel` owns N queues ("spokes") and hands out the next spoke on
//! every call to `next()`, wrapping around. Producers only ever enqueue
//! through `next()`; each consumer binds to one spoke index for its
//! lifetime via `spoke()`, so the consume side has no cross-worker
//! contention.

use crate::queue::ConcurrentQueue;

use std::sync::atomic::{AtomicUsize, Ordering};

/// Fixed array of `N` queues with a rotating cursor
pub struct Wheel<T, const N: usize> {
    spokes: [ConcurrentQueue<T>; N],
    cursor: AtomicUsize,
}

impl<T, const N: usize> Wheel<T, N> {
    const NON_EMPTY: () = assert!(N > 0, "a wheel needs at least one spoke");

    pub fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::NON_EMPTY;
        Self {
            spokes: std::array::from_fn(|_| ConcurrentQueue::new()),
            cursor: AtomicUsize::new(0),
        }
    }

    /// Return the spoke under the cursor and advance it by one (mod N)
    #[inline]
    #[allow(clippy::should_implement_trait)]
    pub fn next(&self) -> &ConcurrentQueue<T> {
        &self.spokes[self.next_index()]
    }

    /// Advance the cursor and return the index it pointed at
    pub fn next_index(&self) -> usize {
        match self
            .cursor
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| Some((c + 1) % N))
        {
            Ok(prev) | Err(prev) => prev,
        }
    }

    /// Spoke bound to a consumer
    ///
    /// # Panics
    ///
    /// Panics if `index >= N`, like slice indexing.
    #[inline]
    pub fn spoke(&self, index: usize) -> &ConcurrentQueue<T> {
        &self.spokes[index]
    }

    /// Number of spokes
    #[inline]
    pub const fn spokes(&self) -> usize {
        N
    }

    /// Items pending across every spoke
    pub fn pending(&self) -> usize {
        self.spokes.iter().map(ConcurrentQueue::len).sum()
    }

    /// Consumers currently parked across every spoke
    pub fn parked(&self) -> usize {
        self.spokes.iter().map(ConcurrentQueue::waiters).sum()
    }

    /// Stop every spoke, releasing all bound consumers
    pub fn stop_all(&self) {
        for spoke in &self.spokes {
            spoke.stop();
        }
    }
}

impl<T, const N: usize> Default for Wheel<T, N> {
    fn default() -> Self {
        Self::new()
    }
}
