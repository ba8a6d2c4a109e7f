//! Fire-and-forget executor: one detached thread per task
//!
//! With `max_async_threads` set, live threads are counted and the
//! configured `AsyncOverflow` policy applies once the cap is reached.
//! Under `Block`, a callback that emits asynchronously on a signal whose
//! cap it is itself holding waits forever; give such signals headroom.

use crate::config::{defaults, AsyncOverflow, SignalConfig};
use crate::invoke::run_task;

use bsignals_core::{ktrace, SignalError, SignalResult, Task};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;

/// Live-thread accounting shared with every spawned thread
struct Live {
    count: Mutex<usize>,
    freed: Condvar,
}

impl Live {
    fn lock(&self) -> MutexGuard<'_, usize> {
        self.count.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Held by a running async thread; releases its place on drop
struct Permit(Arc<Live>);

impl Drop for Permit {
    fn drop(&mut self) {
        let mut count = self.0.lock();
        *count = count.saturating_sub(1);
        drop(count);
        self.0.freed.notify_one();
    }
}

pub struct AsyncExecutor {
    limit: Option<usize>,
    overflow: AsyncOverflow,
    live: Arc<Live>,
}

impl AsyncExecutor {
    pub fn new(config: &SignalConfig) -> Self {
        Self {
            limit: config.max_async_threads,
            overflow: config.async_overflow,
            live: Arc::new(Live {
                count: Mutex::new(0),
                freed: Condvar::new(),
            }),
        }
    }

    /// Run `task` once on a new detached thread
    ///
    /// Fails with `AsyncLimit` under the `Reject` policy when the cap is
    /// reached, or `Spawn` if the OS refuses the thread. The task is
    /// dropped in both cases.
    pub fn submit(&self, task: Task) -> SignalResult<()> {
        let permit = self.acquire()?;
        thread::Builder::new()
            .name(defaults::ASYNC_THREAD_NAME.to_owned())
            .spawn(move || {
                let _permit = permit;
                run_task(task);
            })
            .map(|_| ())
            .map_err(SignalError::from)
    }

    /// Async threads currently running
    pub fn live(&self) -> usize {
        *self.live.lock()
    }

    #[inline]
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    fn acquire(&self) -> SignalResult<Permit> {
        let mut count = self.live.lock();
        if let Some(max) = self.limit {
            while *count >= max {
                match self.overflow {
                    AsyncOverflow::Reject => return Err(SignalError::AsyncLimit(max)),
                    AsyncOverflow::Block => {
                        ktrace!("async cap {} reached, waiting", max);
                        count = self
                            .live
                            .freed
                            .wait(count)
                            .unwrap_or_else(PoisonError::into_inner);
                    }
                }
            }
        }
        *count += 1;
        Ok(Permit(Arc::clone(&self.live)))
    }
}

impl std::fmt::Debug for AsyncExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncExecutor")
            .field("limit", &self.limit)
            .field("overflow", &self.overflow)
            .field("live", &self.live())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::time::{Duration, Instant};

    fn wait_until(timeout: Duration, mut done: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if done() {
                return true;
            }
            thread::sleep(Duration::from_millis(1));
        }
        done()
    }

    fn capped(max: usize, overflow: AsyncOverflow) -> AsyncExecutor {
        AsyncExecutor::new(
            &SignalConfig::new()
                .max_async_threads(Some(max))
                .async_overflow(overflow),
        )
    }

    #[test]
    fn test_unbounded_runs_everything() {
        let exec = AsyncExecutor::new(&SignalConfig::new());
        assert_eq!(exec.limit(), None);

        let count = Arc::new(AtomicUsize::new(0));
        for _ in 0..64 {
            let c = Arc::clone(&count);
            exec.submit(Box::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();
        }

        assert!(wait_until(Duration::from_secs(10), || count.load(Ordering::SeqCst) == 64));
        assert!(wait_until(Duration::from_secs(5), || exec.live() == 0));
    }

    #[test]
    fn test_thread_name() {
        let exec = AsyncExecutor::new(&SignalConfig::new());
        let (tx, rx) = mpsc::channel();
        exec.submit(Box::new(move || {
            let _ = tx.send(thread::current().name().map(str::to_owned));
        }))
        .unwrap();

        let name = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(name.as_deref(), Some(defaults::ASYNC_THREAD_NAME));
    }

    #[test]
    fn test_reject_at_cap() {
        let exec = capped(1, AsyncOverflow::Reject);
        let (release, gate) = mpsc::channel::<()>();

        exec.submit(Box::new(move || {
            let _ = gate.recv();
        }))
        .unwrap();
        assert_eq!(exec.live(), 1);

        assert_eq!(exec.submit(Box::new(|| {})), Err(SignalError::AsyncLimit(1)));

        release.send(()).unwrap();
        assert!(wait_until(Duration::from_secs(5), || exec.live() == 0));
        assert!(exec.submit(Box::new(|| {})).is_ok());
    }

    #[test]
    fn test_block_at_cap() {
        let exec = Arc::new(capped(1, AsyncOverflow::Block));
        let (release, gate) = mpsc::channel::<()>();
        let second_ran = Arc::new(AtomicBool::new(false));

        exec.submit(Box::new(move || {
            let _ = gate.recv();
        }))
        .unwrap();

        let submitter = {
            let exec = Arc::clone(&exec);
            let flag = Arc::clone(&second_ran);
            thread::spawn(move || {
                exec.submit(Box::new(move || flag.store(true, Ordering::SeqCst)))
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!submitter.is_finished());
        assert!(!second_ran.load(Ordering::SeqCst));

        release.send(()).unwrap();
        assert!(submitter.join().unwrap().is_ok());
        assert!(wait_until(Duration::from_secs(5), || second_ran.load(Ordering::SeqCst)));
    }

    #[test]
    fn test_panic_releases_permit() {
        let exec = capped(1, AsyncOverflow::Reject);
        exec.submit(Box::new(|| panic!("async failure"))).unwrap();
        assert!(wait_until(Duration::from_secs(5), || exec.live() == 0));
        assert!(exec.submit(Box::new(|| {})).is_ok());
    }
}
