//! Registry guards: the thread-safety mode of a signal
//!
//! The mode is part of the signal's type. `NoGuard` adds no locking and
//! mutation goes through `&mut self`, so the compiler keeps connect and
//! disconnect from racing an emit. `RwGuard` wraps the registry in a
//! reader-writer lock: emits share the read side, mutations take the
//! write side, and every operation works through `&self`.

use crate::slot::Registry;

use std::sync::{PoisonError, RwLock};

/// Access policy around a signal's registry
pub trait RegistryGuard<A> {
    /// Short name of the mode, for diagnostics
    const MODE: &'static str;

    fn new(registry: Registry<A>) -> Self;

    /// Run `f` with shared access to the registry
    fn read<R>(&self, f: impl FnOnce(&Registry<A>) -> R) -> R;

    /// Exclusive access, proven by `&mut self`
    fn get_mut(&mut self) -> &mut Registry<A>;
}

/// No locking
pub struct NoGuard<A> {
    registry: Registry<A>,
}

impl<A> RegistryGuard<A> for NoGuard<A> {
    const MODE: &'static str = "unguarded";

    fn new(registry: Registry<A>) -> Self {
        Self { registry }
    }

    #[inline]
    fn read<R>(&self, f: impl FnOnce(&Registry<A>) -> R) -> R {
        f(&self.registry)
    }

    #[inline]
    fn get_mut(&mut self) -> &mut Registry<A> {
        &mut self.registry
    }
}

/// Reader-writer lock around the registry
///
/// Callbacks never run under the lock, so a poisoned lock still holds a
/// consistent registry and is taken over.
pub struct RwGuard<A> {
    registry: RwLock<Registry<A>>,
}

impl<A> RwGuard<A> {
    /// Run `f` with exclusive access to the registry
    pub fn write<R>(&self, f: impl FnOnce(&mut Registry<A>) -> R) -> R {
        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut registry)
    }
}

impl<A> RegistryGuard<A> for RwGuard<A> {
    const MODE: &'static str = "rw-lock";

    fn new(registry: Registry<A>) -> Self {
        Self {
            registry: RwLock::new(registry),
        }
    }

    fn read<R>(&self, f: impl FnOnce(&Registry<A>) -> R) -> R {
        let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
        f(&registry)
    }

    fn get_mut(&mut self) -> &mut Registry<A> {
        self.registry.get_mut().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheme::ExecutorScheme;
    use crate::slot::Slot;
    use bsignals_core::SlotId;
    use std::sync::Arc;

    fn slot(id: u64) -> Slot<()> {
        Slot::new(SlotId::new(id), ExecutorScheme::Synchronous, Arc::new(|_: &()| {})).unwrap()
    }

    fn exercise<G: RegistryGuard<()>>() {
        let mut guard = G::new(Registry::new());
        assert_eq!(guard.read(|r| r.len()), 0);

        guard.get_mut().insert(SlotId::new(1), slot(1));
        guard.get_mut().insert(SlotId::new(2), slot(2));
        assert_eq!(guard.read(|r| r.len()), 2);
        assert!(guard.read(|r| r.contains_key(&SlotId::new(2))));
    }

    #[test]
    fn test_no_guard() {
        exercise::<NoGuard<()>>();
        assert_eq!(<NoGuard<()> as RegistryGuard<()>>::MODE, "unguarded");
    }

    #[test]
    fn test_rw_guard() {
        exercise::<RwGuard<()>>();

        let guard = RwGuard::new(Registry::new());
        let removed = guard.write(|r| {
            r.insert(SlotId::new(4), slot(4));
            r.remove(&SlotId::new(4))
        });
        assert!(removed.is_some());
        assert_eq!(guard.read(|r| r.len()), 0);
    }

    #[test]
    fn test_rw_guard_concurrent_readers() {
        let guard = Arc::new(RwGuard::<()>::new(Registry::new()));
        guard.write(|r| {
            r.insert(SlotId::new(1), slot(1));
        });

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let guard = Arc::clone(&guard);
                std::thread::spawn(move || (0..1000).map(|_| guard.read(|r| r.len())).sum::<usize>())
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), 1000);
        }
    }
}
