//! A doubly linked list whose nodes each carry their own lock.
//!
//! Readers and writers walk the chain holding the locks of two adjacent
//! nodes at a time, so work on disjoint stretches of the list proceeds in
//! parallel. Removal takes the (prev, node, next) triple. Reversal never
//! rewires nodes in place: it copies the chain into a fresh one in
//! reverse order and swaps the head over.
//!
//! Lock order is gate, then the head slot, then node locks in chain order.
//! Multiple node locks are only ever taken through `lock_all`.
use std::fmt;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicU64, Ordering::SeqCst};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, RwLock};
use rand::Rng;

use crate::backoff::Backoff;
use crate::debug_delay::debug_delay;
use crate::lock_set::lock_all;
use crate::node::{Entry, Node, NodeState};

/// A concurrently mutable doubly linked list with per-node locking.
///
/// The only state besides the nodes themselves is the head slot. There is
/// no cached length or tail: `len` counts by walking.
///
/// # Examples
///
/// ```
/// let list = lockstep::List::default();
/// list.push_front("aaa", 1);
/// list.push_front("bbb", 2);
/// list.push_front("ccc", 3);
///
/// assert_eq!(list.render().unwrap(), "ccc3 -> bbb2 -> aaa1");
/// assert!(list.reverse());
/// assert_eq!(list.render().unwrap(), "aaa1 -> bbb2 -> ccc3");
/// assert_eq!(list.sum(), Some(6));
/// ```
pub struct List {
    head: Mutex<Option<Arc<Node>>>,
    // signalled when the head slot becomes empty
    emptied: Condvar,
    // removals and pushes hold this shared for their whole duration, a
    // reversal holds it exclusively while it retires the old chain
    gate: RwLock<()>,
    // structural edits applied to the live chain
    edits: AtomicU64,
}

impl Default for List {
    fn default() -> List {
        List {
            head: Mutex::new(None),
            emptied: Condvar::new(),
            gate: RwLock::new(()),
            edits: AtomicU64::new(0),
        }
    }
}

impl fmt::Debug for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries()).finish()
    }
}

/// Walk from `cursor` to the end of its chain, handing each node to
/// `visit` while holding the locks of that node and its successor.
fn walk_from<R>(
    mut cursor: Arc<Node>,
    mut visit: impl FnMut(&Arc<Node>, &NodeState) -> ControlFlow<R>,
) -> ControlFlow<R> {
    loop {
        debug_delay();

        let next = cursor.lock().next.clone();

        let Some(next) = next else {
            let here = cursor.lock();
            if here.next.is_some() {
                continue;
            }
            return visit(&cursor, &*here);
        };

        let [here, there] = lock_all([&cursor, &next]);
        if !here.next_is(&next) {
            log::trace!("successor changed under a traversal, retrying step");
            continue;
        }

        visit(&cursor, &*here)?;

        drop(here);
        drop(there);
        cursor = next;
    }
}

/// Link a new node holding (word, number) in front of `head`. The chain
/// is private to the caller, so this needs no coordination.
fn prepend(head: Option<Arc<Node>>, word: String, number: i64) -> Arc<Node> {
    let node = Node::new(word, number);
    if let Some(old) = &head {
        old.lock().prev = Arc::downgrade(&node);
    }
    node.lock().next = head;
    node
}

fn is_head(slot: &Option<Arc<Node>>, node: &Arc<Node>) -> bool {
    slot.as_ref().is_some_and(|head| Arc::ptr_eq(head, node))
}

impl List {
    /// Link a new node in front of the current head.
    ///
    /// The node is fully linked before it becomes reachable through the
    /// head slot.
    pub fn push_front<W: Into<String>>(&self, word: W, number: i64) {
        let node = Node::new(word.into(), number);

        let _gate = self.gate.read();
        let mut head = self.head.lock();

        if let Some(old) = head.as_ref() {
            old.lock().prev = Arc::downgrade(&node);
        }
        node.lock().next = head.take();
        *head = Some(node);

        self.edits.fetch_add(1, SeqCst);
    }

    /// Returns `true` if the head slot is empty.
    pub fn is_empty(&self) -> bool {
        self.head.lock().is_none()
    }

    fn head_snapshot(&self) -> Option<Arc<Node>> {
        self.head.lock().clone()
    }

    /// Fold over every (word, number) pair from head to tail, locking each
    /// node together with its successor while it is visited.
    ///
    /// Returns `None` if the list is empty.
    pub fn fold<B>(
        &self,
        init: B,
        mut f: impl FnMut(B, &str, i64) -> B,
    ) -> Option<B> {
        let head = self.head_snapshot()?;
        let mut acc = Some(init);

        let _ = walk_from(head, |_, state| {
            acc = acc.take().map(|acc| f(acc, &state.word, state.number));
            ControlFlow::<()>::Continue(())
        });

        acc
    }

    /// The sum of every node's number, or `None` if the list is empty.
    pub fn sum(&self) -> Option<i64> {
        self.fold(0_i64, |acc, _, number| acc.wrapping_add(number))
    }

    /// Render the list front to back as `word number` pairs joined by
    /// ` -> `, or `None` if the list is empty.
    pub fn render(&self) -> Option<String> {
        self.fold(String::new(), |mut out, word, number| {
            if !out.is_empty() {
                out.push_str(" -> ");
            }
            out.push_str(word);
            out.push_str(&number.to_string());
            out
        })
    }

    /// The number of nodes, counted by walking the chain.
    pub fn len(&self) -> usize {
        self.fold(0, |count, _, _| count + 1).unwrap_or(0)
    }

    /// Copy every pair out of the list, front to back.
    pub fn entries(&self) -> Vec<Entry> {
        self.fold(vec![], |mut entries, word, number| {
            entries.push(Entry::new(word, number));
            entries
        })
        .unwrap_or_default()
    }

    /// Reverse the list by re-seeding it: the chain is copied, in reverse
    /// order, into freshly allocated nodes that then replace the old chain
    /// wholesale. Node identities change across a reversal.
    ///
    /// A pass that overlaps with a removal is thrown away and retried, so
    /// a reversal never brings back a removed node, and never brings back
    /// a list that became empty. Returns `false` if the list is empty.
    pub fn reverse(&self) -> bool {
        let backoff = Backoff::new();

        loop {
            let seen_edits = self.edits.load(SeqCst);
            let Some(original) = self.head_snapshot() else {
                return false;
            };

            let mut fresh: Option<Arc<Node>> = None;
            let _ = walk_from(original.clone(), |_, state| {
                fresh = Some(prepend(
                    fresh.take(),
                    state.word.clone(),
                    state.number,
                ));
                ControlFlow::<()>::Continue(())
            });

            let gate = self.gate.write();
            let mut head = self.head.lock();

            if !is_head(&head, &original) {
                if head.is_none() {
                    return false;
                }
            } else {
                let _original = original.lock();
                if self.edits.load(SeqCst) == seen_edits {
                    *head = fresh;
                    return true;
                }
            }

            drop(head);
            drop(gate);

            if backoff.is_completed() {
                log::debug!("reversal keeps overlapping removals, still retrying");
            } else {
                log::trace!("reversal pass overlapped an edit, retrying");
            }
            backoff.snooze();
        }
    }

    /// Remove the node at `index`, counting from the head.
    ///
    /// Returns `None` if the list is empty or has no node at `index`.
    pub fn remove_at(&self, index: usize) -> Option<Entry> {
        let _gate = self.gate.read();
        self.remove_at_inner(index)
    }

    /// Remove a node chosen uniformly at random.
    ///
    /// The length is measured by a locked walk first, then a node at a
    /// random index below it is removed. Returns `None` once the list is
    /// empty, which is how the deleter learns it is done.
    pub fn remove_random<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Entry> {
        let _gate = self.gate.read();

        loop {
            let len = self.len();
            if len == 0 {
                return None;
            }

            let index = rng.random_range(0..len);
            if let Some(entry) = self.remove_at_inner(index) {
                return Some(entry);
            }

            log::trace!("list shrank below index {} before removal", index);
        }
    }

    fn remove_at_inner(&self, index: usize) -> Option<Entry> {
        let backoff = Backoff::new();

        loop {
            let target = self.node_at(index)?;

            if let Some(entry) = self.unlink(&target) {
                self.edits.fetch_add(1, SeqCst);
                return Some(entry);
            }

            log::trace!("links around index {} moved, retrying removal", index);
            backoff.snooze();
        }
    }

    fn node_at(&self, index: usize) -> Option<Arc<Node>> {
        let head = self.head_snapshot()?;
        let mut position = 0;

        let found = walk_from(head, |node, _| {
            if position == index {
                ControlFlow::Break(node.clone())
            } else {
                position += 1;
                ControlFlow::Continue(())
            }
        });

        match found {
            ControlFlow::Break(node) => Some(node),
            ControlFlow::Continue(()) => None,
        }
    }

    /// Unlink `target` according to its position. Every link the decision
    /// was based on is checked again once the locks are held; `None` means
    /// a concurrent edit got there first and the caller should retry.
    fn unlink(&self, target: &Arc<Node>) -> Option<Entry> {
        let (prev, next) = {
            let state = target.lock();
            if !state.linked {
                return None;
            }
            (state.prev.upgrade(), state.next.clone())
        };

        match (prev, next) {
            (None, None) => {
                let mut head = self.head.lock();
                let mut t = target.lock();

                if !is_head(&head, target)
                    || !t.linked
                    || t.next.is_some()
                    || t.prev.upgrade().is_some()
                {
                    return None;
                }

                *head = None;
                t.linked = false;
                let entry = t.entry();

                drop(t);
                drop(head);
                self.emptied.notify_all();

                log::debug!("removed the last node {}", entry);
                Some(entry)
            }
            (Some(prev), None) => {
                let [mut p, mut t] = lock_all([&prev, target]);

                if !t.linked
                    || !p.next_is(target)
                    || !t.prev_is(&prev)
                    || t.next.is_some()
                {
                    return None;
                }

                p.next = None;
                t.prev = Weak::new();
                t.linked = false;

                Some(t.entry())
            }
            (None, Some(next)) => {
                let mut head = self.head.lock();
                let [mut t, mut n] = lock_all([target, &next]);

                if !is_head(&head, target)
                    || !t.linked
                    || t.prev.upgrade().is_some()
                    || !t.next_is(&next)
                    || !n.prev_is(target)
                {
                    return None;
                }

                n.prev = Weak::new();
                *head = Some(next.clone());
                t.linked = false;

                Some(t.entry())
            }
            (Some(prev), Some(next)) => {
                let [mut p, mut t, mut n] = lock_all([&prev, target, &next]);

                if !t.linked
                    || !p.next_is(target)
                    || !t.prev_is(&prev)
                    || !t.next_is(&next)
                    || !n.prev_is(target)
                {
                    return None;
                }

                p.next = Some(next.clone());
                n.prev = Arc::downgrade(&prev);
                t.prev = Weak::new();
                t.linked = false;

                Some(t.entry())
            }
        }
    }

    /// Block until the list is empty or `timeout` passes. Returns whether
    /// the list is empty.
    pub fn wait_until_empty(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut head = self.head.lock();

        while head.is_some() {
            if self.emptied.wait_until(&mut head, deadline).timed_out() {
                return head.is_none();
            }
        }

        true
    }

    /// Check that every back-link mirrors the forward link before it, and
    /// that the ends are open. Only meaningful while nothing else is
    /// mutating the list.
    #[cfg(test)]
    pub(crate) fn links_are_symmetric(&self) -> bool {
        let Some(head) = self.head_snapshot() else {
            return true;
        };

        let mut nodes = vec![];
        let _ = walk_from(head, |node, _| {
            nodes.push(node.clone());
            ControlFlow::<()>::Continue(())
        });

        let ends_open = nodes[0].lock().prev.upgrade().is_none()
            && nodes[nodes.len() - 1].lock().next.is_none();

        ends_open
            && nodes.iter().all(|node| node.lock().linked)
            && nodes.windows(2).all(|pair| {
                pair[0].lock().next_is(&pair[1])
                    && pair[1].lock().prev_is(&pair[0])
            })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Barrier;
    use std::thread;

    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn scenario() -> List {
        let list = List::default();
        list.push_front("aaa", 1);
        list.push_front("bbb", 2);
        list.push_front("ccc", 3);
        list
    }

    fn words(list: &List) -> Vec<String> {
        list.entries().into_iter().map(|e| e.word).collect()
    }

    #[test]
    fn push_front_builds_front_to_back_in_reverse_insertion_order() {
        let list = scenario();
        assert_eq!(words(&list), ["ccc", "bbb", "aaa"]);
        assert_eq!(list.len(), 3);
        assert!(list.links_are_symmetric());
    }

    #[test]
    fn reverse_flips_order_and_keeps_sum() {
        let list = scenario();
        assert_eq!(list.sum(), Some(6));
        assert!(list.reverse());
        assert_eq!(words(&list), ["aaa", "bbb", "ccc"]);
        assert_eq!(list.sum(), Some(6));
        assert!(list.links_are_symmetric());
    }

    #[test]
    fn reverse_of_empty_is_a_no_op() {
        let list = List::default();
        assert!(!list.reverse());
        assert!(list.is_empty());
    }

    #[test]
    fn singleton_reverses_to_itself() {
        let list = List::default();
        list.push_front("solo", 9);
        assert!(list.reverse());
        assert_eq!(list.entries(), vec![Entry::new("solo", 9)]);
    }

    #[test]
    fn empty_traversals_report_empty() {
        let list = List::default();
        assert_eq!(list.sum(), None);
        assert_eq!(list.render(), None);
        assert_eq!(list.len(), 0);
        assert!(list.entries().is_empty());
        assert_eq!(list.remove_at(0), None);
    }

    #[test]
    fn remove_each_position() {
        // head
        let list = scenario();
        assert_eq!(list.remove_at(0), Some(Entry::new("ccc", 3)));
        assert_eq!(words(&list), ["bbb", "aaa"]);
        assert!(list.links_are_symmetric());

        // tail
        let list = scenario();
        assert_eq!(list.remove_at(2), Some(Entry::new("aaa", 1)));
        assert_eq!(words(&list), ["ccc", "bbb"]);
        assert!(list.links_are_symmetric());

        // interior
        let list = scenario();
        assert_eq!(list.remove_at(1), Some(Entry::new("bbb", 2)));
        assert_eq!(words(&list), ["ccc", "aaa"]);
        assert!(list.links_are_symmetric());

        // past the end
        let list = scenario();
        assert_eq!(list.remove_at(3), None);
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn removing_the_sole_node_empties_the_list() {
        let list = List::default();
        list.push_front("only", 4);
        assert_eq!(list.remove_at(0), Some(Entry::new("only", 4)));
        assert!(list.is_empty());
        assert!(list.wait_until_empty(Duration::from_millis(0)));
        assert_eq!(list.render(), None);
        assert_eq!(list.sum(), None);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(list.remove_random(&mut rng), None);
    }

    #[test]
    fn remove_random_drains_one_at_a_time() {
        let list = List::default();
        for i in 0..50 {
            list.push_front(format!("w{}", i), i);
        }
        let mut rng = StdRng::seed_from_u64(7);
        for remaining in (0..50).rev() {
            assert!(list.remove_random(&mut rng).is_some());
            assert_eq!(list.len(), remaining);
            assert!(list.links_are_symmetric());
        }
        assert_eq!(list.remove_random(&mut rng), None);
    }

    #[test]
    fn reverse_after_removals_sees_them() {
        let list = scenario();
        list.remove_at(1);
        assert!(list.reverse());
        assert_eq!(words(&list), ["aaa", "ccc"]);
    }

    #[test]
    fn wait_until_empty_times_out_on_a_full_list() {
        let list = scenario();
        assert!(!list.wait_until_empty(Duration::from_millis(5)));
    }

    #[test]
    fn wait_until_empty_wakes_when_drained() {
        let list = Arc::new(scenario());
        let waiter = {
            let list = list.clone();
            thread::spawn(move || list.wait_until_empty(Duration::from_secs(30)))
        };
        for _ in 0..3 {
            list.remove_at(0);
        }
        assert!(waiter.join().unwrap());
    }

    // A reversal racing removals must never resurrect a removed entry: at
    // the end, the survivors are exactly the pushed entries minus the
    // removed ones.
    #[test]
    fn reversals_never_resurrect_removed_nodes() {
        let list = Arc::new(List::default());
        for i in 0..300 {
            list.push_front(format!("w{}", i), i);
        }
        let barrier = Arc::new(Barrier::new(2));

        let reverser = {
            let list = list.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..200 {
                    list.reverse();
                }
            })
        };

        barrier.wait();
        let mut rng = StdRng::seed_from_u64(3);
        let mut removed = vec![];
        for _ in 0..150 {
            removed.push(list.remove_random(&mut rng).unwrap());
        }
        reverser.join().unwrap();

        let mut survivors: Vec<i64> =
            list.entries().into_iter().map(|e| e.number).collect();
        survivors.sort_unstable();
        let mut expected: Vec<i64> = (0..300)
            .filter(|n| !removed.iter().any(|e| e.number == *n))
            .collect();
        expected.sort_unstable();

        assert_eq!(survivors, expected);
        assert!(list.links_are_symmetric());
    }
}
