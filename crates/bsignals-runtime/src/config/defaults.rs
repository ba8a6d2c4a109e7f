//! Library defaults, overridable through `BSIG_*` environment variables.

use super::AsyncOverflow;

/// Workers in the process-wide pool.
///
/// Fixed at compile time: the pool's wheel is a const-sized array.
pub const POOL_WORKERS: usize = 4;

/// How long an idle pool worker waits before re-checking liveness.
pub const POOL_POLL_MS: u64 = 100;

/// Live async thread cap; `None` means unbounded.
pub const MAX_ASYNC_THREADS: Option<usize> = None;

/// Upper bound accepted by `SignalConfig::validate`.
pub const MAX_ASYNC_THREADS_LIMIT: usize = 4096;

pub const ASYNC_OVERFLOW: AsyncOverflow = AsyncOverflow::Block;

/// Thread name prefixes
pub const STRAND_THREAD_PREFIX: &str = "bsig-strand";
pub const POOL_THREAD_PREFIX: &str = "bsig-pool";
pub const ASYNC_THREAD_NAME: &str = "bsig-async";
