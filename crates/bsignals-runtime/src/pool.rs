//! Wheeled worker pool
//!
//! N long-lived workers, worker *i* bound to spoke *i* of a `Wheel`.
//! `submit` places each task on the next spoke in rotation, so placement
//! is O(1) and even under uniform load, and workers never contend with
//! each other on the consume side. FIFO holds only among tasks that land
//! on the same spoke.
//!
//! # Process-wide pool
//!
//! Signals share one `WorkerPool<POOL_WORKERS>`. It moves through
//! `uninitialized -> running -> torn down` exactly once:
//!
//! - `startup()` does double-checked initialization under `INIT_LOCK`, so
//!   exactly one thread spawns the workers even under concurrent first use
//! - `shutdown_pool()` stops every spoke and joins every worker; on unix
//!   it is also registered with `atexit` at startup
//!
//! Standalone pools (`WorkerPool::<N>::start`) follow the same rules but
//! shut down on drop.

use crate::config::{defaults, PoolConfig};
use crate::invoke::run_task;

use bsignals_core::{kdebug, kinfo, ktrace, kwarn, DequeueError, SignalError, SignalResult, Task, Wheel};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Worker count of the process-wide pool
pub const POOL_WORKERS: usize = defaults::POOL_WORKERS;

/// Fixed-size pool of workers fed through a wheel
pub struct WorkerPool<const N: usize> {
    wheel: Arc<Wheel<Task, N>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    shut_down: AtomicBool,
    name: String,
}

impl<const N: usize> WorkerPool<N> {
    /// Build the wheel and spawn N workers named `{name}-{index}`
    ///
    /// If any worker fails to spawn, the ones already running are stopped
    /// and joined before the error is returned.
    pub fn start(name: &str, config: &PoolConfig) -> SignalResult<Self> {
        let pool = Self {
            wheel: Arc::new(Wheel::new()),
            workers: Mutex::new(Vec::with_capacity(N)),
            shut_down: AtomicBool::new(false),
            name: name.to_owned(),
        };

        for index in 0..N {
            let wheel = Arc::clone(&pool.wheel);
            let poll = config.poll_interval;
            let spawned = thread::Builder::new()
                .name(format!("{}-{}", name, index))
                .spawn(move || worker_loop::<N>(&wheel, index, poll));

            match spawned {
                Ok(handle) => pool.lock_workers().push(handle),
                Err(e) => {
                    pool.shutdown();
                    return Err(SignalError::Spawn(format!("{}-{}: {}", name, index, e)));
                }
            }
        }

        kdebug!("pool {} started with {} worker(s)", name, N);
        Ok(pool)
    }

    /// Place a task on the next spoke
    pub fn submit(&self, task: Task) -> SignalResult<()> {
        if self.is_shut_down() {
            return Err(SignalError::PoolShutdown);
        }
        self.wheel.next().enqueue(task).map_err(SignalError::from)
    }

    #[inline]
    pub const fn workers(&self) -> usize {
        N
    }

    /// Tasks queued across all spokes
    pub fn pending(&self) -> usize {
        self.wheel.pending()
    }

    /// Workers currently parked on an empty spoke
    pub fn idle_workers(&self) -> usize {
        self.wheel.parked()
    }

    #[inline]
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stop every spoke and join every worker (idempotent)
    ///
    /// A worker calling this (from inside a task) is not joined; it exits
    /// once its current task returns.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }
        let idle = self.idle_workers();
        self.wheel.stop_all();

        let handles: Vec<_> = self.lock_workers().drain(..).collect();
        let me = thread::current().id();
        for handle in handles {
            if handle.thread().id() == me {
                continue;
            }
            if handle.join().is_err() {
                kwarn!("pool {} worker exited abnormally", self.name);
            }
        }
        kdebug!("pool {} shut down, {} worker(s) were idle", self.name, idle);
    }

    fn lock_workers(&self) -> std::sync::MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.workers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<const N: usize> Drop for WorkerPool<N> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<const N: usize> std::fmt::Debug for WorkerPool<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("name", &self.name)
            .field("workers", &N)
            .field("pending", &self.pending())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

/// Worker main loop: consume only from the bound spoke
///
/// The bounded wait lets an idle worker wake periodically without any
/// extra cancellation path; `Stopped` is the only way out.
fn worker_loop<const N: usize>(wheel: &Wheel<Task, N>, index: usize, poll: Duration) {
    let spoke = wheel.spoke(index);
    loop {
        match spoke.try_dequeue_for(poll) {
            Ok(task) => {
                run_task(task);
            }
            Err(DequeueError::Timeout) | Err(DequeueError::Empty) => {
                ktrace!("idle, {} task(s) pending pool-wide", wheel.pending());
            }
            Err(DequeueError::Stopped) => break,
        }
    }
}

// ============================================================================
// Process-wide pool
// ============================================================================

static GLOBAL_POOL: OnceLock<WorkerPool<POOL_WORKERS>> = OnceLock::new();
static INIT_LOCK: Mutex<()> = Mutex::new(());

/// Start the shared pool if nobody has yet, and return it
///
/// Safe to call from any thread, any number of times. Fails with
/// `PoolShutdown` once the pool has been torn down; it is never rebuilt.
pub fn startup() -> SignalResult<&'static WorkerPool<POOL_WORKERS>> {
    if let Some(pool) = GLOBAL_POOL.get() {
        return running(pool);
    }

    let _guard = INIT_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(pool) = GLOBAL_POOL.get() {
        return running(pool);
    }

    let mut config = PoolConfig::from_env();
    if let Err(e) = config.validate() {
        kwarn!("{}; using default poll interval", e);
        config = config.poll_interval(Duration::from_millis(defaults::POOL_POLL_MS));
    }

    let pool = WorkerPool::start(defaults::POOL_THREAD_PREFIX, &config)?;
    let pool = GLOBAL_POOL.get_or_init(|| pool);
    register_exit_hook();
    kinfo!("shared worker pool started ({} workers)", POOL_WORKERS);
    Ok(pool)
}

fn running(pool: &'static WorkerPool<POOL_WORKERS>) -> SignalResult<&'static WorkerPool<POOL_WORKERS>> {
    if pool.is_shut_down() {
        Err(SignalError::PoolShutdown)
    } else {
        Ok(pool)
    }
}

/// Submit to the shared pool; it must have been started
pub fn submit(task: Task) -> SignalResult<()> {
    match GLOBAL_POOL.get() {
        Some(pool) => pool.submit(task),
        None => Err(SignalError::PoolNotStarted),
    }
}

/// Whether the shared pool has been started (and not torn down)
pub fn pool_started() -> bool {
    GLOBAL_POOL.get().is_some_and(|pool| !pool.is_shut_down())
}

/// Tear down the shared pool (idempotent, irreversible)
///
/// Queued tasks that have not started are discarded.
pub fn shutdown_pool() {
    if let Some(pool) = GLOBAL_POOL.get() {
        pool.shutdown();
    }
}

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        extern "C" fn teardown_at_exit() {
            shutdown_pool();
        }

        fn register_exit_hook() {
            // Safety: registers a plain extern "C" fn that captures nothing.
            let rc = unsafe { libc::atexit(teardown_at_exit) };
            if rc != 0 {
                kwarn!("atexit registration failed; call shutdown_pool() before exit");
            }
        }
    } else {
        fn register_exit_hook() {
            kdebug!("no exit hook on this platform; call shutdown_pool() before exit");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;
    use std::time::Instant;

    fn fast_config() -> PoolConfig {
        PoolConfig::from_env().poll_interval(Duration::from_millis(10))
    }

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

    fn count_submits<const N: usize>(total: u64) {
        let pool = WorkerPool::<N>::start("test-pool", &fast_config()).unwrap();
        let counter = Arc::new(AtomicU64::new(0));

        for _ in 0..total {
            let counter = Arc::clone(&counter);
            pool.submit(Box::new(move || {
                counter.fetch_add(1, Ordering::Relaxed);
            }))
            .unwrap();
        }

        assert!(wait_until(Duration::from_secs(20), || {
            counter.load(Ordering::Relaxed) == total
        }));
        // No double delivery
        thread::sleep(Duration::from_millis(20));
        assert_eq!(counter.load(Ordering::Relaxed), total);
    }

    #[test]
    fn test_no_loss_single_worker() {
        count_submits::<1>(10_000);
    }

    #[test]
    fn test_no_loss_three_workers() {
        count_submits::<3>(10_000);
    }

    #[test]
    fn test_no_loss_eight_workers() {
        count_submits::<8>(10_000);
    }

    #[test]
    fn test_tasks_spread_over_workers() {
        let pool = WorkerPool::<4>::start("test-spread", &fast_config()).unwrap();
        let names = Arc::new(Mutex::new(std::collections::HashSet::new()));

        for _ in 0..4 {
            let names = Arc::clone(&names);
            pool.submit(Box::new(move || {
                let name = thread::current().name().map(str::to_owned);
                names.lock().unwrap().insert(name);
            }))
            .unwrap();
        }

        assert!(wait_until(Duration::from_secs(5), || names.lock().unwrap().len() == 4));
    }

    #[test]
    fn test_same_spoke_is_fifo() {
        let pool = WorkerPool::<1>::start("test-fifo", &fast_config()).unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        for i in 0..200 {
            let log = Arc::clone(&log);
            pool.submit(Box::new(move || log.lock().unwrap().push(i))).unwrap();
        }
        assert!(wait_until(Duration::from_secs(5), || log.lock().unwrap().len() == 200));
        assert_eq!(*log.lock().unwrap(), (0..200).collect::<Vec<i32>>());
    }

    #[test]
    fn test_worker_survives_panic() {
        let pool = WorkerPool::<1>::start("test-panic", &fast_config()).unwrap();
        let counter = Arc::new(AtomicU64::new(0));

        pool.submit(Box::new(|| panic!("pool task failure"))).unwrap();
        let c = Arc::clone(&counter);
        pool.submit(Box::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        }))
        .unwrap();

        assert!(wait_until(Duration::from_secs(5), || counter.load(Ordering::SeqCst) == 1));
    }

    #[test]
    fn test_idle_workers_park_on_their_spokes() {
        let pool = WorkerPool::<3>::start("test-idle", &PoolConfig::from_env().poll_interval(Duration::from_secs(5)))
            .unwrap();
        assert!(wait_until(Duration::from_secs(5), || pool.idle_workers() == 3));
        pool.shutdown();
        assert_eq!(pool.idle_workers(), 0);
    }

    #[test]
    fn test_shutdown_rejects_and_joins() {
        let pool = WorkerPool::<2>::start("test-shutdown", &fast_config()).unwrap();
        pool.shutdown();
        pool.shutdown(); // idempotent

        assert!(pool.is_shut_down());
        assert!(pool.lock_workers().is_empty());
        assert_eq!(pool.submit(Box::new(|| {})), Err(SignalError::PoolShutdown));
    }

    #[test]
    fn test_shutdown_from_worker_does_not_deadlock() {
        let pool = Arc::new(WorkerPool::<2>::start("test-self-stop", &fast_config()).unwrap());
        let p = Arc::clone(&pool);
        pool.submit(Box::new(move || p.shutdown())).unwrap();

        assert!(wait_until(Duration::from_secs(5), || pool.is_shut_down()));
    }

    #[test]
    fn test_global_startup_is_shared() {
        let handles: Vec<_> = (0..8)
            .map(|_| thread::spawn(|| startup().map(|p| p as *const WorkerPool<POOL_WORKERS> as usize)))
            .collect();
        let addrs: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap().unwrap()).collect();

        assert!(addrs.windows(2).all(|w| w[0] == w[1]));
        assert!(pool_started());
        assert_eq!(startup().unwrap().workers(), POOL_WORKERS);
    }
}
