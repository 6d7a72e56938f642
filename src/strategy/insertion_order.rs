use super::linked_keys::{LinkedKeys, NodeHandle};
use super::IterationStrategy;
use crate::normalizer::InternalKey;

/// Presents keys oldest first. Overwriting a key doesn't move it.
///
/// If the key under a paused cursor is removed, the cursor moves on to the
/// key after it. Keys added mid-traversal go to the back, so the current
/// pass still reaches them unless the cursor has already run off the end.
pub type InsertionOrder = LinkedOrder<false>;

/// Presents keys newest first.
///
/// If the key under a paused cursor is removed, the cursor moves on to the
/// key before it (the next one in this order). Keys added mid-traversal land
/// behind the cursor and aren't seen until the next rewind.
pub type ReverseInsertionOrder = LinkedOrder<true>;

/// Keys linked in the order they were first added, walked front to back or,
/// when `REVERSED`, back to front. Use it through [`InsertionOrder`] or
/// [`ReverseInsertionOrder`].
pub struct LinkedOrder<const REVERSED: bool> {
    keys: LinkedKeys,
    cursor: Option<NodeHandle>,
}

impl<const REVERSED: bool> LinkedOrder<REVERSED> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            keys: LinkedKeys::with_capacity(capacity),
            cursor: None,
        }
    }

    fn first(&self) -> Option<NodeHandle> {
        if REVERSED {
            self.keys.tail()
        } else {
            self.keys.head()
        }
    }

    /// The node after `node` in presentation order.
    fn after(&self, node: NodeHandle) -> Option<NodeHandle> {
        if REVERSED {
            self.keys.prev_of(node)
        } else {
            self.keys.next_of(node)
        }
    }
}

impl<const REVERSED: bool> Default for LinkedOrder<REVERSED> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const REVERSED: bool> IterationStrategy for LinkedOrder<REVERSED> {
    fn add_if_absent(&mut self, key: &InternalKey) -> bool {
        self.keys.handle_of(key).is_none() && self.keys.push_back(key.clone())
    }

    fn remove(&mut self, key: &InternalKey) {
        if let Some(node) = self.keys.handle_of(key) {
            if self.cursor == Some(node) {
                self.cursor = self.after(node);
            }
            self.keys.remove(key);
        }
    }

    fn rewind(&mut self) {
        self.cursor = self.first();
    }

    fn next(&mut self) {
        self.cursor = self.cursor.and_then(|node| self.after(node));
    }

    fn valid(&self) -> bool {
        self.cursor.is_some()
    }

    fn key(&self) -> Option<&InternalKey> {
        self.cursor.and_then(|node| self.keys.get(node))
    }

    fn len(&self) -> usize {
        self.keys.len()
    }

    fn clear(&mut self) {
        self.keys.clear();
        self.cursor = None;
    }

    fn order(&self) -> Box<dyn Iterator<Item = &InternalKey> + '_> {
        if REVERSED {
            Box::new(self.keys.iter_rev())
        } else {
            Box::new(self.keys.iter())
        }
    }
}
