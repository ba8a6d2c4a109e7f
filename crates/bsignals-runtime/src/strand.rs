//! Strand: one dedicated thread plus one FIFO queue
//!
//! A strand belongs to exactly one slot. Tasks run strictly in arrival
//! order on the strand thread, decoupled from the emitting thread.
//! Dropping the strand stops its queue and joins the thread; tasks still
//! queued at that point are discarded.

use crate::invoke::run_task;

use bsignals_core::{kdebug, kwarn, ConcurrentQueue, SignalError, SignalResult, Task};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Ordered executor owned by a single slot
pub struct Strand {
    queue: Arc<ConcurrentQueue<Task>>,
    worker: Option<JoinHandle<()>>,
    name: String,
}

impl Strand {
    /// Spawn the strand thread
    pub fn spawn(name: impl Into<String>) -> SignalResult<Self> {
        let name = name.into();
        let queue = Arc::new(ConcurrentQueue::<Task>::new());

        let worker = {
            let queue = Arc::clone(&queue);
            thread::Builder::new()
                .name(name.clone())
                .spawn(move || strand_loop(&queue))
                .map_err(|e| SignalError::Spawn(format!("{}: {}", name, e)))?
        };
        kdebug!("strand {} spawned", name);

        Ok(Self {
            queue,
            worker: Some(worker),
            name,
        })
    }

    /// Queue a task behind everything already submitted
    pub fn submit(&self, task: Task) -> SignalResult<()> {
        self.queue.enqueue(task).map_err(SignalError::from)
    }

    /// Cheap submit-only handle, usable after the registry lock is released
    pub fn handle(&self) -> StrandHandle {
        StrandHandle {
            queue: Arc::clone(&self.queue),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tasks waiting to run
    #[inline]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Whether the strand thread is still alive
    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the queue and join the thread (idempotent)
    ///
    /// Called from the strand's own thread (a callback disconnecting its
    /// own slot) the join is skipped; the thread exits once the current
    /// task returns.
    pub fn shutdown(&mut self) {
        self.queue.stop();
        let Some(worker) = self.worker.take() else {
            return;
        };
        if worker.thread().id() == thread::current().id() {
            kdebug!("strand {} released from its own thread", self.name);
            return;
        }
        if worker.join().is_err() {
            kwarn!("strand {} exited abnormally", self.name);
        } else {
            kdebug!("strand {} joined", self.name);
        }
    }
}

impl Drop for Strand {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Strand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Strand")
            .field("name", &self.name)
            .field("pending", &self.pending())
            .field("running", &self.is_running())
            .finish()
    }
}

/// Submit side of a strand
///
/// Holding a handle does not keep the strand thread alive: once the
/// owning `Strand` is dropped, `submit` fails with `QueueStopped`.
#[derive(Clone)]
pub struct StrandHandle {
    queue: Arc<ConcurrentQueue<Task>>,
}

impl StrandHandle {
    pub fn submit(&self, task: Task) -> SignalResult<()> {
        self.queue.enqueue(task).map_err(SignalError::from)
    }

    pub fn is_stopped(&self) -> bool {
        self.queue.is_stopped()
    }
}

impl std::fmt::Debug for StrandHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrandHandle")
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

fn strand_loop(queue: &ConcurrentQueue<Task>) {
    while let Some(task) = queue.dequeue() {
        run_task(task);
    }
    kdebug!("strand queue stopped, {} task(s) discarded", queue.len());
}
