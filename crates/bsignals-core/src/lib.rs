//! # bsignals-core
//!
//! Core primitives for the bsignals dispatch runtime.
//!
//! This crate has no knowledge of threads it does not block on: it holds
//! the hand-off structures that the executors in `bsignals-runtime` are
//! built from.
//!
//! ## Modules
//!
//! - `queue` - Blocking MPMC queue with a terminal stopped state
//! - `wheel` - Round-robin selector over a fixed set of queues
//! - `id` - Slot identifier type
//! - `error` - Error types
//! - `kprint` - Kernel-style debug printing macros
//! - `env` - Environment variable utilities

pub mod id;
pub mod queue;
pub mod wheel;
pub mod error;
pub mod kprint;
pub mod env;

// Re-exports for convenience
pub use id::SlotId;
pub use queue::ConcurrentQueue;
pub use wheel::Wheel;
pub use error::{DequeueError, EnqueueError, SignalError, SignalResult};
pub use env::{env_get, env_get_bool, env_get_opt};

/// Type-erased unit of work handed to every executor.
///
/// Arguments of an emission are captured inside the closure, so all four
/// execution strategies consume the same shape.
pub type Task = Box<dyn FnOnce() + Send + 'static>;
