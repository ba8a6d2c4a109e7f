//! Slot identifier type

use core::fmt;

/// Identifier of a connected slot
///
/// Ids are handed out by a per-signal monotonic counter starting at 1 and
/// are never reused while that signal lives. Zero is reserved as the
/// "no slot" sentinel.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct SlotId(u64);

impl SlotId {
    /// Sentinel value indicating no slot
    pub const NONE: SlotId = SlotId(0);

    /// First id a fresh signal hands out
    pub const FIRST: SlotId = SlotId(1);

    #[inline]
    pub const fn new(id: u64) -> Self {
        SlotId(id)
    }

    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Check if this is the NONE sentinel
    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl From<u64> for SlotId {
    #[inline]
    fn from(id: u64) -> Self {
        SlotId(id)
    }
}

impl From<SlotId> for u64 {
    #[inline]
    fn from(id: SlotId) -> Self {
        id.0
    }
}

impl fmt::Debug for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "SlotId(NONE)")
        } else {
            write!(f, "SlotId({})", self.0)
        }
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_id_basic() {
        let id = SlotId::new(42);
        assert_eq!(id.as_u64(), 42);
        assert!(!id.is_none());
        assert!(SlotId::NONE.is_none());
    }

    #[test]
    fn test_slot_id_ordering() {
        assert!(SlotId::FIRST < SlotId::new(2));
        assert_eq!(u64::from(SlotId::from(7)), 7);
    }

    #[test]
    fn test_slot_id_format() {
        assert_eq!(format!("{}", SlotId::new(3)), "slot#3");
        assert_eq!(format!("{:?}", SlotId::new(3)), "SlotId(3)");
        assert_eq!(format!("{:?}", SlotId::NONE), "SlotId(NONE)");
    }
}
