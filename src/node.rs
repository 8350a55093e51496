use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, MutexGuard};

pub(crate) type NodeGuard<'a> = MutexGuard<'a, NodeState>;

/// A detached (word, number) pair, as stored in a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Entry {
    /// The node's word.
    pub word: String,
    /// The node's number.
    pub number: i64,
}

impl Entry {
    pub fn new<W: Into<String>>(word: W, number: i64) -> Entry {
        Entry { word: word.into(), number }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.word, self.number)
    }
}

/// One element of a `List`. Every field lives behind the node's own lock.
pub(crate) struct Node {
    state: Mutex<NodeState>,
}

#[derive(Debug)]
pub(crate) struct NodeState {
    pub(crate) word: String,
    pub(crate) number: i64,
    pub(crate) prev: Weak<Node>,
    pub(crate) next: Option<Arc<Node>>,
    /// Cleared when a removal unlinks this node. An unlinked node keeps
    /// its `next` link so a traversal standing on it can still move on.
    pub(crate) linked: bool,
}

impl NodeState {
    pub(crate) fn entry(&self) -> Entry {
        Entry { word: self.word.clone(), number: self.number }
    }

    pub(crate) fn next_is(&self, node: &Arc<Node>) -> bool {
        self.next.as_ref().is_some_and(|next| Arc::ptr_eq(next, node))
    }

    pub(crate) fn prev_is(&self, node: &Arc<Node>) -> bool {
        self.prev.upgrade().is_some_and(|prev| Arc::ptr_eq(&prev, node))
    }
}

impl Node {
    pub(crate) fn new(word: String, number: i64) -> Arc<Node> {
        Arc::new(Node {
            state: Mutex::new(NodeState {
                word,
                number,
                prev: Weak::new(),
                next: None,
                linked: true,
            }),
        })
    }

    #[inline]
    pub(crate) fn lock(&self) -> NodeGuard<'_> {
        self.state.lock()
    }

    #[inline]
    pub(crate) fn try_lock(&self) -> Option<NodeGuard<'_>> {
        self.state.try_lock()
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.state.try_lock() {
            Some(state) => f
                .debug_struct("Node")
                .field("word", &state.word)
                .field("number", &state.number)
                .field("linked", &state.linked)
                .finish(),
            None => f.write_str("Node { <locked> }"),
        }
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        // unwind the successor run iteratively so that dropping a long
        // chain can't overflow the stack
        let mut cursor = self.state.get_mut().next.take();
        while let Some(node) = cursor {
            match Arc::try_unwrap(node) {
                Ok(mut node) => cursor = node.state.get_mut().next.take(),
                // someone else still owns the rest of the run
                Err(_) => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_nodes_are_unlinked_in_both_directions() {
        let node = Node::new("abc".into(), 7);
        let state = node.lock();
        assert!(state.next.is_none());
        assert!(state.prev.upgrade().is_none());
        assert_eq!(state.entry(), Entry::new("abc", 7));
    }

    #[test]
    fn entries_render_word_then_number() {
        assert_eq!(Entry::new("zq", 42).to_string(), "zq42");
    }

    #[test]
    fn dropping_a_long_chain_does_not_recurse() {
        let head = Node::new("n".into(), 0);
        let mut tail = head.clone();
        for i in 1..200_000 {
            let node = Node::new("n".into(), i);
            node.lock().prev = Arc::downgrade(&tail);
            tail.lock().next = Some(node.clone());
            tail = node;
        }
        drop(tail);
        drop(head);
    }
}
