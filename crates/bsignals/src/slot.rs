//! Slots and the registry that owns them

use crate::dispatch::{Route, Target};
use crate::scheme::ExecutorScheme;

use bsignals_core::{kdebug, SignalResult, SlotId};
use bsignals_runtime::config::defaults::STRAND_THREAD_PREFIX;
use bsignals_runtime::Strand;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Shared, type-erased slot callback
pub type Callback<A> = Arc<dyn Fn(&A) + Send + Sync + 'static>;

/// Slots keyed by id; iteration runs in connection order
pub type Registry<A> = BTreeMap<SlotId, Slot<A>>;

/// Executor state owned by a slot
enum Executor {
    Synchronous,
    Asynchronous,
    Strand(Strand),
    ThreadPooled,
}

/// A connected observer
///
/// Dropping a `Strand` slot stops its queue and joins its thread.
pub struct Slot<A> {
    id: SlotId,
    callback: Callback<A>,
    executor: Executor,
}

impl<A> Slot<A> {
    /// Build a slot, spawning its strand thread when the scheme asks for one
    pub(crate) fn new(id: SlotId, scheme: ExecutorScheme, callback: Callback<A>) -> SignalResult<Self> {
        let executor = match scheme {
            ExecutorScheme::Synchronous => Executor::Synchronous,
            ExecutorScheme::Asynchronous => Executor::Asynchronous,
            ExecutorScheme::Strand => {
                Executor::Strand(Strand::spawn(format!("{}-{}", STRAND_THREAD_PREFIX, id.as_u64()))?)
            }
            ExecutorScheme::ThreadPooled => Executor::ThreadPooled,
        };
        kdebug!("{} connected ({})", id, scheme);
        Ok(Self { id, callback, executor })
    }

    #[inline]
    pub fn id(&self) -> SlotId {
        self.id
    }

    pub fn scheme(&self) -> ExecutorScheme {
        match self.executor {
            Executor::Synchronous => ExecutorScheme::Synchronous,
            Executor::Asynchronous => ExecutorScheme::Asynchronous,
            Executor::Strand(_) => ExecutorScheme::Strand,
            Executor::ThreadPooled => ExecutorScheme::ThreadPooled,
        }
    }

    /// Everything `emit` needs once the registry is released
    pub(crate) fn route(&self) -> Route<A> {
        let target = match &self.executor {
            Executor::Synchronous => Target::Synchronous,
            Executor::Asynchronous => Target::Asynchronous,
            Executor::Strand(strand) => Target::Strand(strand.handle()),
            Executor::ThreadPooled => Target::ThreadPooled,
        };
        Route {
            id: self.id,
            callback: Arc::clone(&self.callback),
            target,
        }
    }
}

impl<A> fmt::Debug for Slot<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("Slot");
        d.field("id", &self.id).field("scheme", &self.scheme());
        if let Executor::Strand(strand) = &self.executor {
            d.field("strand", strand);
        }
        d.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Callback<u32> {
        Arc::new(|_: &u32| {})
    }

    #[test]
    fn test_only_strand_slots_own_a_thread() {
        for scheme in ExecutorScheme::ALL {
            let slot = Slot::new(SlotId::new(7), scheme, noop()).unwrap();
            assert_eq!(matches!(slot.executor, Executor::Strand(_)), scheme == ExecutorScheme::Strand);
            assert_eq!(slot.id(), SlotId::new(7));
            assert_eq!(slot.scheme(), scheme);
        }
    }

    #[test]
    fn test_route_targets() {
        for (n, scheme) in ExecutorScheme::ALL.into_iter().enumerate() {
            let slot = Slot::new(SlotId::new(n as u64 + 10), scheme, noop()).unwrap();
            let matched = match (scheme, slot.route().target) {
                (ExecutorScheme::Synchronous, Target::Synchronous) => true,
                (ExecutorScheme::Asynchronous, Target::Asynchronous) => true,
                (ExecutorScheme::Strand, Target::Strand(_)) => true,
                (ExecutorScheme::ThreadPooled, Target::ThreadPooled) => true,
                _ => false,
            };
            assert!(matched, "{} slot routed elsewhere", scheme);
        }

        let slot = Slot::new(SlotId::new(2), ExecutorScheme::ThreadPooled, noop()).unwrap();
        let route = slot.route();
        assert_eq!(route.id, SlotId::new(2));
        assert!(matches!(route.target, Target::ThreadPooled));
    }

    #[test]
    fn test_registry_iterates_in_id_order() {
        let mut registry: Registry<u32> = Registry::new();
        for id in [5u64, 1, 3] {
            let slot = Slot::new(SlotId::new(id), ExecutorScheme::Synchronous, noop()).unwrap();
            registry.insert(slot.id(), slot);
        }
        let ids: Vec<u64> = registry.keys().map(|id| id.as_u64()).collect();
        assert_eq!(ids, vec![1, 3, 5]);
    }
}
