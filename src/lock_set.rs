//! Acquiring the locks of adjacent nodes as one set.
//!
//! A traversal holds (node, next), a removal holds up to
//! (prev, node, next). Blocking on one lock while holding another is how
//! a forward walk and a removal standing on the same nodes would deadlock,
//! so `lock_all` only ever blocks while holding nothing: it takes one lock,
//! try-locks the rest, and on contention drops everything it has before
//! waiting on the lock that was busy.
use std::sync::Arc;

use crate::backoff::Backoff;
use crate::debug_delay::debug_delay;
use crate::node::{Node, NodeGuard};

/// Lock every node in `nodes`, all or nothing.
///
/// Nodes must be passed in chain order and must be distinct. The returned
/// guards are in the same order as `nodes`.
pub(crate) fn lock_all<'a, const N: usize>(
    nodes: [&'a Arc<Node>; N],
) -> [NodeGuard<'a>; N] {
    debug_assert!(N > 0);
    debug_assert!(
        (0..N).all(|i| (i + 1..N).all(|j| !Arc::ptr_eq(nodes[i], nodes[j]))),
        "lock_all was handed the same node twice"
    );

    let backoff = Backoff::new();
    let mut first = 0;

    loop {
        debug_delay();

        let mut held: [Option<NodeGuard<'a>>; N] =
            std::array::from_fn(|_| None);
        held[first] = Some(nodes[first].lock());

        let mut contended = None;
        for offset in 1..N {
            let i = (first + offset) % N;
            match nodes[i].try_lock() {
                Some(guard) => held[i] = Some(guard),
                None => {
                    contended = Some(i);
                    break;
                }
            }
        }

        match contended {
            None => {
                return held.map(|guard| {
                    guard.expect("every slot is filled when nothing contended")
                });
            }
            Some(busy) => {
                drop(held);
                log::trace!("lock set contended on slot {} of {}", busy, N);
                // the next attempt blocks on `busy` anyway
                backoff.spin();
                first = busy;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Barrier;
    use std::thread;

    use super::*;

    fn nodes(n: usize) -> Vec<Arc<Node>> {
        (0..n).map(|i| Node::new(format!("n{}", i), i as i64)).collect()
    }

    #[test]
    fn guards_come_back_in_argument_order() {
        let ns = nodes(3);
        let [a, b, c] = lock_all([&ns[0], &ns[1], &ns[2]]);
        assert_eq!((a.number, b.number, c.number), (0, 1, 2));
    }

    #[test]
    fn released_guards_can_be_relocked() {
        let ns = nodes(2);
        drop(lock_all([&ns[0], &ns[1]]));
        let [b] = lock_all([&ns[1]]);
        assert_eq!(b.number, 1);
        assert!(ns[0].try_lock().is_some());
    }

    // Two threads grab overlapping sets in opposite orders. Acquiring in
    // blocking order would deadlock; lock_all must not.
    #[test]
    fn opposite_orders_do_not_deadlock() {
        let ns = Arc::new(nodes(3));
        let barrier = Arc::new(Barrier::new(2));

        let threads: Vec<_> = (0..2)
            .map(|t| {
                let ns = ns.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    for _ in 0..10_000 {
                        if t == 0 {
                            let [a, b, c] = lock_all([&ns[0], &ns[1], &ns[2]]);
                            drop((a, b, c));
                        } else {
                            let [c, a] = lock_all([&ns[2], &ns[0]]);
                            drop((c, a));
                        }
                    }
                })
            })
            .collect();

        for t in threads {
            t.join().unwrap();
        }
    }
}
