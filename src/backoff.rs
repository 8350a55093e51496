//! Exponential backoff for retrying contended lock sets.
use std::cell::Cell;
use std::hint;
use std::thread;

const SPIN_LIMIT: u32 = 6;
const YIELD_LIMIT: u32 = 10;

/// Performs exponential backoff between failed attempts to acquire a
/// set of node locks.
///
/// Each step of the back off procedure takes roughly twice as long as
/// the previous step. Once spinning stops paying off, the current thread
/// yields to the OS scheduler instead.
pub(crate) struct Backoff {
    step: Cell<u32>,
}

impl Backoff {
    pub(crate) const fn new() -> Self {
        Backoff { step: Cell::new(0) }
    }

    /// Backs off after another thread made progress on a lock we wanted.
    #[inline]
    pub(crate) fn spin(&self) {
        for _ in 0..1 << self.step.get().min(SPIN_LIMIT) {
            hint::spin_loop();
        }

        if self.step.get() <= SPIN_LIMIT {
            self.step.set(self.step.get() + 1);
        }
    }

    /// Backs off while waiting for another thread to release a lock.
    ///
    /// Spins for the first few steps, then yields the thread.
    pub(crate) fn snooze(&self) {
        if self.step.get() <= SPIN_LIMIT {
            for _ in 0..1 << self.step.get() {
                hint::spin_loop();
            }
        } else {
            thread::yield_now();
        }

        if self.step.get() <= YIELD_LIMIT {
            self.step.set(self.step.get() + 1);
        }
    }

    /// Returns `true` once backing off has stopped getting longer, which is
    /// a hint that the caller should block instead of retrying eagerly.
    pub(crate) fn is_completed(&self) -> bool {
        self.step.get() > YIELD_LIMIT
    }
}

#[test]
fn backoff_saturates() {
    let backoff = Backoff::new();
    for _ in 0..SPIN_LIMIT {
        backoff.spin();
    }
    assert!(!backoff.is_completed());
    for _ in 0..=YIELD_LIMIT {
        backoff.snooze();
    }
    assert!(backoff.is_completed());
}
