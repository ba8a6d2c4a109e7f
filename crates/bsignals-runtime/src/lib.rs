//! # bsignals-runtime
//!
//! Executors behind the bsignals dispatch layer.
//!
//! This crate provides:
//! - Configuration with environment overrides
//! - A panic-containing invocation wrapper for worker threads
//! - Strands (one thread, one FIFO queue, one owner)
//! - The wheeled worker pool and its process-wide instance
//! - Detached per-task threads with an optional live cap

pub mod config;
pub mod invoke;
pub mod strand;
pub mod pool;
pub mod async_exec;

// Re-exports
pub use config::{AsyncOverflow, ConfigError, PoolConfig, SignalConfig};
pub use invoke::{panicked_tasks, run_task};
pub use strand::{Strand, StrandHandle};
pub use pool::{pool_started, shutdown_pool, startup, WorkerPool, POOL_WORKERS};
pub use async_exec::AsyncExecutor;
