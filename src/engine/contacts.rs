//! Contact Tracking
//!
//! Per-slot finger presence. The surface can report any number of contacts;
//! gesture classification only distinguishes one finger from two, so
//! [`ContactTracker::finger_count`] clamps at two while
//! [`ContactTracker::contacts`] keeps the real number.

use std::collections::BTreeSet;

/// Fingers beyond this count are tracked but treated as this many
pub const MAX_GESTURE_FINGERS: usize = 2;

/// Slot-indexed contact presence
#[derive(Debug, Clone, Default)]
pub struct ContactTracker {
    active: BTreeSet<i32>,
}

impl ContactTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a contact on `slot`, returning the new number of contacts
    ///
    /// A slot that is already active is not counted twice.
    pub fn contact_down(&mut self, slot: i32) -> usize {
        self.active.insert(slot);
        self.active.len()
    }

    /// Record that `slot` lost its contact, returning whether it was active
    ///
    /// Releasing an unknown slot leaves the count unchanged, so it can never
    /// go below zero.
    pub fn contact_up(&mut self, slot: i32) -> bool {
        self.active.remove(&slot)
    }

    /// Number of concurrent contacts
    pub fn contacts(&self) -> usize {
        self.active.len()
    }

    /// Contact count as seen by gesture classification (0..=2)
    pub fn finger_count(&self) -> usize {
        self.active.len().min(MAX_GESTURE_FINGERS)
    }

    /// Whether `slot` currently holds a contact
    pub fn is_active(&self, slot: i32) -> bool {
        self.active.contains(&slot)
    }

    /// Lowest active slot, or slot 0 when the surface is empty
    pub fn primary_slot(&self) -> i32 {
        self.active.first().copied().unwrap_or(0)
    }

    /// Whether positions reported on `slot` drive the pointer
    pub fn is_primary(&self, slot: i32) -> bool {
        slot == self.primary_slot()
    }

    /// Forget every contact
    pub fn reset(&mut self) {
        self.active.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counting() {
        let mut tracker = ContactTracker::new();
        assert_eq!(tracker.contact_down(0), 1);
        assert_eq!(tracker.contact_down(1), 2);
        assert_eq!(tracker.finger_count(), 2);

        assert!(tracker.contact_up(0));
        assert_eq!(tracker.contacts(), 1);
    }

    #[test]
    fn test_duplicate_down_not_double_counted() {
        let mut tracker = ContactTracker::new();
        tracker.contact_down(3);
        assert_eq!(tracker.contact_down(3), 1);
    }

    #[test]
    fn test_release_never_goes_negative() {
        let mut tracker = ContactTracker::new();
        assert!(!tracker.contact_up(0));
        assert!(!tracker.contact_up(5));
        assert_eq!(tracker.contacts(), 0);
        assert_eq!(tracker.finger_count(), 0);
    }

    #[test]
    fn test_finger_count_clamps() {
        let mut tracker = ContactTracker::new();
        for slot in 0..4 {
            tracker.contact_down(slot);
        }
        assert_eq!(tracker.contacts(), 4);
        assert_eq!(tracker.finger_count(), 2);
    }

    #[test]
    fn test_primary_slot_is_lowest_active() {
        let mut tracker = ContactTracker::new();
        assert_eq!(tracker.primary_slot(), 0);

        tracker.contact_down(2);
        tracker.contact_down(1);
        assert_eq!(tracker.primary_slot(), 1);
        assert!(tracker.is_primary(1));
        assert!(!tracker.is_primary(2));

        tracker.contact_up(1);
        assert!(tracker.is_primary(2));

        tracker.reset();
        assert_eq!(tracker.contacts(), 0);
        assert!(tracker.is_primary(0));
    }
}
