//! The contiguous alternative to `List`: every pair lives in one
//! `VecDeque` behind one lock. Same contract, no concurrency between
//! operations.
use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use rand::Rng;

use crate::Entry;

/// A list guarded by a single lock over contiguous storage.
///
/// # Examples
///
/// ```
/// let list = lockstep::CoarseList::default();
/// list.push_front("aaa", 1);
/// list.push_front("bbb", 2);
///
/// assert!(list.reverse());
/// assert_eq!(list.render().unwrap(), "aaa1 -> bbb2");
/// ```
#[derive(Default)]
pub struct CoarseList {
    items: Mutex<VecDeque<Entry>>,
    emptied: Condvar,
}

impl fmt::Debug for CoarseList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.lock().iter()).finish()
    }
}

impl CoarseList {
    pub fn push_front<W: Into<String>>(&self, word: W, number: i64) {
        self.items.lock().push_front(Entry::new(word, number));
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Reverse in place under the lock. Returns `false` if empty.
    pub fn reverse(&self) -> bool {
        let mut items = self.items.lock();
        if items.is_empty() {
            return false;
        }
        items.make_contiguous().reverse();
        true
    }

    pub fn sum(&self) -> Option<i64> {
        let items = self.items.lock();
        if items.is_empty() {
            return None;
        }
        Some(items.iter().fold(0_i64, |acc, e| acc.wrapping_add(e.number)))
    }

    pub fn render(&self) -> Option<String> {
        let items = self.items.lock();
        if items.is_empty() {
            return None;
        }
        let rendered: Vec<String> = items.iter().map(Entry::to_string).collect();
        Some(rendered.join(" -> "))
    }

    pub fn entries(&self) -> Vec<Entry> {
        self.items.lock().iter().cloned().collect()
    }

    pub fn remove_at(&self, index: usize) -> Option<Entry> {
        let mut items = self.items.lock();
        let removed = items.remove(index);
        if removed.is_some() && items.is_empty() {
            self.emptied.notify_all();
        }
        removed
    }

    /// Remove a uniformly chosen pair. The length check and the removal
    /// happen under one lock acquisition.
    pub fn remove_random<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Entry> {
        let mut items = self.items.lock();
        if items.is_empty() {
            return None;
        }
        let index = rng.random_range(0..items.len());
        let removed = items.remove(index);
        if items.is_empty() {
            self.emptied.notify_all();
        }
        removed
    }

    pub fn wait_until_empty(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut items = self.items.lock();

        while !items.is_empty() {
            if self.emptied.wait_until(&mut items, deadline).timed_out() {
                return items.is_empty();
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn matches_the_linked_scenario() {
        let list = CoarseList::default();
        list.push_front("aaa", 1);
        list.push_front("bbb", 2);
        list.push_front("ccc", 3);

        assert_eq!(list.render().unwrap(), "ccc3 -> bbb2 -> aaa1");
        assert_eq!(list.sum(), Some(6));
        assert!(list.reverse());
        assert_eq!(list.render().unwrap(), "aaa1 -> bbb2 -> ccc3");
        assert_eq!(list.sum(), Some(6));
    }

    #[test]
    fn drains_to_empty() {
        let list = CoarseList::default();
        for i in 0..10 {
            list.push_front(format!("w{}", i), i);
        }
        let mut rng = StdRng::seed_from_u64(11);
        for remaining in (0..10).rev() {
            assert!(list.remove_random(&mut rng).is_some());
            assert_eq!(list.len(), remaining);
        }
        assert!(list.is_empty());
        assert!(list.wait_until_empty(Duration::from_millis(0)));
        assert_eq!(list.remove_random(&mut rng), None);
        assert_eq!(list.render(), None);
        assert!(!list.reverse());
    }
}
