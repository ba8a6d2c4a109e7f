//! Execution schemes selectable per slot

use std::fmt;
use std::str::FromStr;

/// How a slot's callback is scheduled when its signal emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExecutorScheme {
    /// On the emitting thread, before `emit` returns
    #[default]
    Synchronous,
    /// On a fresh detached thread per emission; no ordering
    Asynchronous,
    /// On the slot's own thread, strictly in emission order
    Strand,
    /// On the shared worker pool; FIFO only within one rotation slot
    ThreadPooled,
}

impl ExecutorScheme {
    pub const ALL: [ExecutorScheme; 4] = [
        ExecutorScheme::Synchronous,
        ExecutorScheme::Asynchronous,
        ExecutorScheme::Strand,
        ExecutorScheme::ThreadPooled,
    ];
}

impl fmt::Display for ExecutorScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExecutorScheme::Synchronous => "synchronous",
            ExecutorScheme::Asynchronous => "asynchronous",
            ExecutorScheme::Strand => "strand",
            ExecutorScheme::ThreadPooled => "thread-pooled",
        };
        f.write_str(name)
    }
}

impl FromStr for ExecutorScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sync" | "synchronous" => Ok(ExecutorScheme::Synchronous),
            "async" | "asynchronous" => Ok(ExecutorScheme::Asynchronous),
            "strand" => Ok(ExecutorScheme::Strand),
            "pool" | "pooled" | "thread-pooled" => Ok(ExecutorScheme::ThreadPooled),
            other => Err(format!("unknown executor scheme: {}", other)),
        }
    }
}
