//! Invocation wrapper shared by every worker thread
//!
//! A panicking slot callback must not take its worker down with it: a
//! dead pool worker would silently swallow every task later routed to
//! its spoke. Worker loops therefore run tasks through `run_task`, which
//! catches the unwind, reports it and keeps the thread alive.

use bsignals_core::{kerror, Task};

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};

/// Tasks that panicked on a worker thread since process start
static PANICKED_TASKS: AtomicU64 = AtomicU64::new(0);

/// Run a task, containing any panic
///
/// Returns `false` if the task panicked.
pub fn run_task(task: Task) -> bool {
    match panic::catch_unwind(AssertUnwindSafe(task)) {
        Ok(()) => true,
        Err(payload) => {
            PANICKED_TASKS.fetch_add(1, Ordering::Relaxed);
            kerror!("slot callback panicked: {}", panic_message(payload.as_ref()));
            false
        }
    }
}

/// Number of callbacks that panicked on strand, pool or async threads
pub fn panicked_tasks() -> u64 {
    PANICKED_TASKS.load(Ordering::Relaxed)
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic payload>"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    #[test]
    fn test_run_task_ok() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        assert!(run_task(Box::new(move || flag.store(true, Ordering::SeqCst))));
        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn test_run_task_contains_panic() {
        let before = panicked_tasks();
        assert!(!run_task(Box::new(|| panic!("boom"))));
        assert!(panicked_tasks() > before);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new(String::from("formatted 7"));
        assert_eq!(panic_message(payload.as_ref()), "formatted 7");

        let payload: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(payload.as_ref()), "static");

        let payload: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(payload.as_ref()), "<non-string panic payload>");
    }
}
