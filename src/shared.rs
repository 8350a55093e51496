use std::time::Duration;

use rand::RngCore;

use crate::{CoarseList, Entry, List};

/// The contract the workers rely on, shared by the per-node locked `List`
/// and the single-lock `CoarseList`.
///
/// An empty list is an expected outcome, not a failure: every operation
/// reports it through its return value, including when the list empties
/// between a caller's `is_empty` check and the operation itself.
pub trait ConcurrentList: Send + Sync {
    /// Insert a pair in front of the head.
    fn push_front(&self, word: String, number: i64);

    /// Returns `true` if the list holds no nodes.
    fn is_empty(&self) -> bool;

    /// The number of nodes.
    fn len(&self) -> usize;

    /// Reverse the order of the list. Returns `false` if it was empty.
    fn reverse(&self) -> bool;

    /// The sum of all numbers, or `None` if the list is empty.
    fn sum(&self) -> Option<i64>;

    /// The list rendered front to back, or `None` if it is empty.
    fn render(&self) -> Option<String>;

    /// Every pair, front to back.
    fn entries(&self) -> Vec<Entry>;

    /// Remove the pair at `index`, or return `None` if there isn't one.
    fn remove_at(&self, index: usize) -> Option<Entry>;

    /// Remove a uniformly chosen pair, or return `None` if the list is
    /// empty.
    fn remove_random(&self, rng: &mut dyn RngCore) -> Option<Entry>;

    /// Block until the list is empty or `timeout` passes, returning
    /// whether it is empty.
    fn wait_until_empty(&self, timeout: Duration) -> bool;
}

macro_rules! delegate {
    ($t:ty) => {
        impl ConcurrentList for $t {
            fn push_front(&self, word: String, number: i64) {
                <$t>::push_front(self, word, number)
            }

            fn is_empty(&self) -> bool {
                <$t>::is_empty(self)
            }

            fn len(&self) -> usize {
                <$t>::len(self)
            }

            fn reverse(&self) -> bool {
                <$t>::reverse(self)
            }

            fn sum(&self) -> Option<i64> {
                <$t>::sum(self)
            }

            fn render(&self) -> Option<String> {
                <$t>::render(self)
            }

            fn entries(&self) -> Vec<Entry> {
                <$t>::entries(self)
            }

            fn remove_at(&self, index: usize) -> Option<Entry> {
                <$t>::remove_at(self, index)
            }

            fn remove_random(&self, rng: &mut dyn RngCore) -> Option<Entry> {
                <$t>::remove_random(self, rng)
            }

            fn wait_until_empty(&self, timeout: Duration) -> bool {
                <$t>::wait_until_empty(self, timeout)
            }
        }
    };
}

delegate!(List);
delegate!(CoarseList);
