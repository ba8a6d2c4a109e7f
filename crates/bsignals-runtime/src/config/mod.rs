//! Signal and pool configuration
//!
//! Compile-time defaults with runtime environment overrides.
//!
//! # Configuration Priority (highest wins)
//!
//! 1. Builder calls
//! 2. Environment variables (runtime)
//! 3. Library defaults (`defaults`)
//!
//! # Example
//!
//! ```rust,ignore
//! use bsignals_runtime::config::{AsyncOverflow, SignalConfig};
//!
//! let config = SignalConfig::from_env()
//!     .max_async_threads(Some(16))
//!     .async_overflow(AsyncOverflow::Reject);
//! ```

pub mod defaults;

use bsignals_core::env::{env_get, env_get_opt};
use std::str::FromStr;
use std::time::Duration;

/// What the asynchronous executor does when `max_async_threads` threads
/// are already live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsyncOverflow {
    /// The emitting call waits until a live thread finishes
    Block,
    /// The invocation is dropped and counted as rejected
    Reject,
}

impl FromStr for AsyncOverflow {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "block" | "wait" => Ok(AsyncOverflow::Block),
            "reject" | "drop" => Ok(AsyncOverflow::Reject),
            _ => Err(ConfigError::InvalidValue("async_overflow must be block or reject")),
        }
    }
}

impl std::fmt::Display for AsyncOverflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AsyncOverflow::Block => write!(f, "block"),
            AsyncOverflow::Reject => write!(f, "reject"),
        }
    }
}

/// Per-signal configuration with builder pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalConfig {
    /// Cap on concurrently live asynchronous threads (None = unbounded)
    pub max_async_threads: Option<usize>,
    /// Policy once the cap is reached
    pub async_overflow: AsyncOverflow,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl SignalConfig {
    /// Create config from defaults with environment overrides.
    ///
    /// Environment variables (all optional):
    /// - `BSIG_MAX_ASYNC_THREADS` - Live async thread cap (0 = unbounded)
    /// - `BSIG_ASYNC_OVERFLOW` - `block` or `reject`
    pub fn from_env() -> Self {
        let max_async_threads = match env_get_opt::<usize>("BSIG_MAX_ASYNC_THREADS") {
            Some(0) => None,
            Some(n) => Some(n),
            None => defaults::MAX_ASYNC_THREADS,
        };
        Self {
            max_async_threads,
            async_overflow: env_get("BSIG_ASYNC_OVERFLOW", defaults::ASYNC_OVERFLOW),
        }
    }

    /// Create config with explicit defaults (no env override).
    pub fn new() -> Self {
        Self {
            max_async_threads: defaults::MAX_ASYNC_THREADS,
            async_overflow: defaults::ASYNC_OVERFLOW,
        }
    }

    // Builder methods

    pub fn max_async_threads(mut self, max: Option<usize>) -> Self {
        self.max_async_threads = max;
        self
    }

    pub fn async_overflow(mut self, policy: AsyncOverflow) -> Self {
        self.async_overflow = policy;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.max_async_threads {
            Some(0) => Err(ConfigError::InvalidValue("max_async_threads must be > 0")),
            Some(n) if n > defaults::MAX_ASYNC_THREADS_LIMIT => Err(ConfigError::InvalidValue(
                "max_async_threads must be <= 4096",
            )),
            _ => Ok(()),
        }
    }

    /// Print configuration (for debugging)
    pub fn print(&self) {
        eprintln!("Signal Configuration:");
        match self.max_async_threads {
            Some(n) => eprintln!("  max_async_threads:  {}", n),
            None => eprintln!("  max_async_threads:  unbounded"),
        }
        eprintln!("  async_overflow:     {}", self.async_overflow);
    }
}

/// Configuration of the process-wide worker pool.
///
/// Read once, when the pool starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Idle wait before a worker re-checks liveness
    pub poll_interval: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl PoolConfig {
    /// Environment variables (all optional):
    /// - `BSIG_POOL_POLL_MS` - Worker idle poll interval in milliseconds
    pub fn from_env() -> Self {
        Self {
            poll_interval: Duration::from_millis(env_get(
                "BSIG_POOL_POLL_MS",
                defaults::POOL_POLL_MS,
            )),
        }
    }

    pub fn poll_interval(mut self, d: Duration) -> Self {
        self.poll_interval = d;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval.is_zero() {
            return Err(ConfigError::InvalidValue("poll_interval must be > 0"));
        }
        Ok(())
    }
}

/// Configuration error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue(&'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
