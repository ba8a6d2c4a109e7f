//! # bsignals - typed signals and slots
//!
//! In-process publish/dispatch: observers ("slots") connect callbacks to
//! a typed `Signal<A>`, and each slot chooses how its callback is
//! scheduled when the signal emits.
//!
//! ## Execution schemes
//!
//! - **Synchronous**: on the emitting thread, in connection order
//! - **Asynchronous**: a detached thread per invocation, optionally capped
//! - **Strand**: the slot's own thread, strictly in emission order
//! - **ThreadPooled**: the shared wheeled pool, started on first use
//!
//! ## Quick Start
//!
//! ```ignore
//! use bsignals::{ExecutorScheme, Signal};
//!
//! let mut signal: Signal<(u32, String)> = Signal::new();
//!
//! let id = signal.connect(ExecutorScheme::Synchronous, |(n, s)| {
//!     println!("{} {}", n, s);
//! })?;
//! signal.connect(ExecutorScheme::Strand, |(n, _)| {
//!     println!("ordered {}", n);
//! })?;
//!
//! signal.emit((1, "hello".to_string()));
//! signal.disconnect(id);
//! ```
//!
//! Connect and disconnect need `&mut` on a plain `Signal`. To mutate the
//! registry from several threads while others emit, use
//! `Signal::with_safety()`, which returns a `SafeSignal` guarded by a
//! reader-writer lock.
//!
//! ## Architecture
//!
//! ```text
//!            emit(args)
//!                │  snapshot routes (read side)
//!                ▼
//!   ┌──────────────────────────┐
//!   │        dispatch          │──── Synchronous ──▶ callback
//!   └──────────────────────────┘
//!        │         │        │
//!        ▼         ▼        ▼
//!   ┌────────┐ ┌────────┐ ┌─────────────────────────────┐
//!   │ async  │ │ strand │ │ wheel ─▶ spoke 0..N ─▶ pool │
//!   │ thread │ │ queue  │ │          workers            │
//!   └────────┘ └────────┘ └─────────────────────────────┘
//! ```

pub mod scheme;
pub mod guard;
pub mod slot;
pub mod signal;

mod dispatch;

pub use scheme::ExecutorScheme;
pub use guard::{NoGuard, RegistryGuard, RwGuard};
pub use signal::{SafeSignal, Signal, SignalStats};

// Re-export core types
pub use bsignals_core::{
    SlotId,
    SignalError,
    SignalResult,
    DequeueError,
    EnqueueError,
    ConcurrentQueue,
    Wheel,
};

// Re-export kprint macros for debug logging
pub use bsignals_core::{kprintln, kerror, kwarn, kinfo, kdebug, ktrace};
pub use bsignals_core::kprint::{LogLevel, init as init_logging, set_log_level, set_flush_enabled};

// Re-export env utilities
pub use bsignals_core::{env_get, env_get_bool, env_get_opt};

// Re-export runtime types
pub use bsignals_runtime::{
    AsyncOverflow,
    ConfigError,
    PoolConfig,
    SignalConfig,
    panicked_tasks,
    pool_started,
    shutdown_pool,
};
