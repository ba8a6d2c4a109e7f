//! Error types for signal dispatch

use core::fmt;

/// Result type for signal operations
pub type SignalResult<T> = Result<T, SignalError>;

/// Errors that can occur while connecting slots or dispatching emissions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalError {
    /// Failed to spawn a strand, pool worker or async thread
    Spawn(String),

    /// Live async thread limit reached under the reject policy
    AsyncLimit(usize),

    /// Target queue was stopped before the task could be placed
    QueueStopped,

    /// Worker pool has not been started
    PoolNotStarted,

    /// Worker pool has already been torn down
    PoolShutdown,
}

impl fmt::Display for SignalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalError::Spawn(reason) => write!(f, "failed to spawn thread: {}", reason),
            SignalError::AsyncLimit(max) => write!(f, "async thread limit reached ({} live)", max),
            SignalError::QueueStopped => write!(f, "queue stopped"),
            SignalError::PoolNotStarted => write!(f, "worker pool not started"),
            SignalError::PoolShutdown => write!(f, "worker pool shut down"),
        }
    }
}

impl std::error::Error for SignalError {}

impl From<std::io::Error> for SignalError {
    fn from(e: std::io::Error) -> Self {
        SignalError::Spawn(e.to_string())
    }
}

/// Reason a dequeue attempt produced no item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DequeueError {
    /// Queue is empty (non-blocking dequeue)
    Empty,

    /// Timed out before an item arrived
    Timeout,

    /// Queue was stopped
    Stopped,
}

impl fmt::Display for DequeueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DequeueError::Empty => write!(f, "queue empty"),
            DequeueError::Timeout => write!(f, "dequeue timed out"),
            DequeueError::Stopped => write!(f, "queue stopped"),
        }
    }
}

impl std::error::Error for DequeueError {}

/// Error returned when enqueueing on a stopped queue
///
/// Carries the rejected item back to the caller.
#[derive(Clone, PartialEq, Eq)]
pub struct EnqueueError<T>(pub T);

impl<T> EnqueueError<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for EnqueueError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EnqueueError(..)")
    }
}

impl<T> fmt::Display for EnqueueError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "queue stopped")
    }
}

impl<T> From<EnqueueError<T>> for SignalError {
    fn from(_: EnqueueError<T>) -> Self {
        SignalError::QueueStopped
    }
}
