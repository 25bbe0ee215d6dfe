//! Lock-free single-slot message handoff.
//!
//! Resolves SPEC_FULL.md §9 Open Question 1: the source's `protocol_message`
//! busy-waits on a spinlock for the *entire* display call (including
//! `hal.show_message`, which may be slow I/O). Here the compare-exchange
//! only ever guards the instant it takes to swap an `Option<String>` slot —
//! display happens after `take()` has already released the guard, so a
//! caller can never be blocked by a slow display, only by another swap in
//! flight. `post` overwrites a message that hasn't been displayed yet,
//! which is acceptable since messages are advisory.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug)]
pub struct PendingMessage {
    occupied: AtomicBool,
    slot: UnsafeCell<Option<String>>,
}

// SAFETY: access to `slot` is gated by `occupied`'s compare-exchange, which
// admits at most one writer and one reader at a time.
unsafe impl Sync for PendingMessage {}

impl PendingMessage {
    pub const fn new() -> Self {
        Self {
            occupied: AtomicBool::new(false),
            slot: UnsafeCell::new(None),
        }
    }

    /// Install a new pending message, overwriting any not yet displayed.
    pub fn post(&self, message: String) {
        // Spin only against a concurrent post/take, never against a blocked
        // holder: both sides release the flag immediately after touching
        // the slot.
        while self
            .occupied
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            core::hint::spin_loop();
        }
        // SAFETY: exclusive access granted by the compare-exchange above.
        unsafe {
            *self.slot.get() = Some(message);
        }
        self.occupied.store(false, Ordering::Release);
    }

    /// Take and clear the pending message, if any.
    pub fn take(&self) -> Option<String> {
        while self
            .occupied
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            core::hint::spin_loop();
        }
        // SAFETY: exclusive access granted by the compare-exchange above.
        let msg = unsafe { (*self.slot.get()).take() };
        self.occupied.store(false, Ordering::Release);
        msg
    }
}

impl Default for PendingMessage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_then_take_roundtrips() {
        let slot = PendingMessage::new();
        assert!(slot.take().is_none());
        slot.post("hello world".to_string());
        assert_eq!(slot.take().as_deref(), Some("hello world"));
        assert!(slot.take().is_none());
    }

    #[test]
    fn post_overwrites_undisplayed_message() {
        let slot = PendingMessage::new();
        slot.post("first".to_string());
        slot.post("second".to_string());
        assert_eq!(slot.take().as_deref(), Some("second"));
    }
}
