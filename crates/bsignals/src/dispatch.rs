//! Routing one bound invocation to its executor
//!
//! `emit` snapshots a `Route` per slot while the registry is held, then
//! calls `dispatch` for each after releasing it. Every strategy other
//! than synchronous receives the same shape of work: the callback and the
//! shared argument `Arc` bound into a zero-argument `Task`.

use bsignals_core::{SignalResult, SlotId, Task};
use bsignals_runtime::{pool, AsyncExecutor, StrandHandle};
use std::sync::Arc;

use crate::slot::Callback;

/// Where a slot's invocations go
pub(crate) enum Target {
    Synchronous,
    Asynchronous,
    Strand(StrandHandle),
    ThreadPooled,
}

/// A slot as seen by one emission
pub(crate) struct Route<A> {
    pub(crate) id: SlotId,
    pub(crate) callback: Callback<A>,
    pub(crate) target: Target,
}

/// Bind shared arguments into a zero-argument task
pub(crate) fn bind<A>(callback: Callback<A>, args: Arc<A>) -> Task
where
    A: Send + Sync + 'static,
{
    Box::new(move || callback(&*args))
}

/// Hand one invocation to its executor
///
/// Synchronous slots run here, on the caller's thread; a panic in the
/// callback propagates to the caller unchanged.
pub(crate) fn dispatch<A>(route: Route<A>, args: &Arc<A>, async_exec: &AsyncExecutor) -> SignalResult<()>
where
    A: Send + Sync + 'static,
{
    match route.target {
        Target::Synchronous => {
            (route.callback)(&**args);
            Ok(())
        }
        Target::Asynchronous => async_exec.submit(bind(route.callback, Arc::clone(args))),
        Target::Strand(handle) => handle.submit(bind(route.callback, Arc::clone(args))),
        Target::ThreadPooled => pool::submit(bind(route.callback, Arc::clone(args))),
    }
}
