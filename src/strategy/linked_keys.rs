//! A circular doubly linked list of internal keys that flattens all its nodes
//! onto a Vec, with an index from key to node so any key can be unlinked
//! in O(1).

use std::collections::HashMap;

use crate::normalizer::InternalKey;

/// Alias for the index of a node in the list's storage vec.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct NodeHandle(usize);

/// A node that lives in the list.
struct Node {
    /// The key being tracked. Reset to `InternalKey::Null` once the node is
    /// freelisted so the digest string doesn't linger.
    key: InternalKey,

    /// The index of the node previous to this one.
    prev: NodeHandle,

    /// The index of the next node in the list.
    next: NodeHandle,
}

/// Nodes are addressed by their position in a single contiguous Vec, and
/// freed positions are reused on the next push. The list is circular: the
/// tail is always `head.prev`.
pub(crate) struct LinkedKeys {
    /// The nodes in the list.
    store: Vec<Node>,

    /// Entries in the list which aren't in use anymore. These will be reused.
    free: Vec<NodeHandle>,

    /// The first node in the list.
    head: Option<NodeHandle>,

    /// Where each tracked key lives in `store`.
    index: HashMap<InternalKey, NodeHandle>,
}

impl LinkedKeys {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            store: Vec::with_capacity(capacity),
            free: Vec::new(),
            head: None,
            index: HashMap::with_capacity(capacity),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.index.len()
    }

    pub(crate) fn handle_of(&self, key: &InternalKey) -> Option<NodeHandle> {
        self.index.get(key).copied()
    }

    pub(crate) fn get(&self, node: NodeHandle) -> Option<&InternalKey> {
        self.store.get(node.0).map(|n| &n.key)
    }

    pub(crate) fn head(&self) -> Option<NodeHandle> {
        self.head
    }

    pub(crate) fn tail(&self) -> Option<NodeHandle> {
        self.head.map(|head| self.store[head.0].prev)
    }

    /// The node after `node`, or None when `node` is the tail.
    pub(crate) fn next_of(&self, node: NodeHandle) -> Option<NodeHandle> {
        let next = self.store[node.0].next;
        if Some(next) == self.head {
            None
        } else {
            Some(next)
        }
    }

    /// The node before `node`, or None when `node` is the head.
    pub(crate) fn prev_of(&self, node: NodeHandle) -> Option<NodeHandle> {
        if Some(node) == self.head {
            None
        } else {
            Some(self.store[node.0].prev)
        }
    }

    /// Links `key` in at the tail. Returns false, leaving the list alone, if
    /// the key is already in it.
    pub(crate) fn push_back(&mut self, key: InternalKey) -> bool {
        if self.index.contains_key(&key) {
            return false;
        }

        // use the first available location in the storage vec, or infer what
        // the next location will be on push.
        let idx = self
            .free
            .pop()
            .unwrap_or_else(|| NodeHandle(self.store.len()));

        let mut n = Node {
            key: key.clone(),
            prev: idx,
            next: idx,
        };

        if let Some(head) = self.head {
            // slot in between the current tail and the head
            n.prev = self.store[head.0].prev;
            n.next = head;

            self.store[n.prev.0].next = idx;
            self.store[head.0].prev = idx;
        } else {
            self.head = Some(idx);
        }

        if self.store.len() <= idx.0 {
            self.store.push(n);
        } else {
            self.store[idx.0] = n;
        }

        self.index.insert(key, idx);
        true
    }

    /// Unlinks `key`. Returns false if it wasn't in the list.
    pub(crate) fn remove(&mut self, key: &InternalKey) -> bool {
        let node = match self.index.remove(key) {
            Some(node) => node,
            None => return false,
        };

        if self.index.is_empty() {
            // just reset head and freelist the node
            self.head = None;
        } else {
            let prev = self.store[node.0].prev;
            let next = self.store[node.0].next;

            if Some(node) == self.head {
                self.head = Some(next);
            }

            self.store[prev.0].next = next;
            self.store[next.0].prev = prev;
        }

        self.store[node.0].key = InternalKey::Null;
        self.free.push(node);
        true
    }

    /// Clears the list. Does not free the underlying buffers.
    pub(crate) fn clear(&mut self) {
        self.store.clear();
        self.free.clear();
        self.index.clear();
        self.head = None;
    }

    /// Walks head to tail.
    pub(crate) fn iter(&self) -> Walk<'_> {
        Walk {
            list: self,
            idx: self.head(),
            forward: true,
        }
    }

    /// Walks tail to head.
    pub(crate) fn iter_rev(&self) -> Walk<'_> {
        Walk {
            list: self,
            idx: self.tail(),
            forward: false,
        }
    }

    #[cfg(test)]
    pub(crate) fn continuity_test(&self) {
        let mut count = 0;

        // iterate through the list and make sure it matches the number
        // of elements in the index
        for key in self.iter() {
            count += 1;
            assert!(count <= self.len());
            assert!(self.index.contains_key(key));
        }

        assert_eq!(self.len(), count);
        count = 0;

        for _key in self.iter_rev() {
            count += 1;
            assert!(count <= self.len());
        }

        assert_eq!(self.len(), count);
        assert_eq!(self.store.len(), self.len() + self.free.len());

        for (key, node) in &self.index {
            assert_eq!(key, &self.store[node.0].key);
        }
    }
}

pub(crate) struct Walk<'a> {
    list: &'a LinkedKeys,
    idx: Option<NodeHandle>,
    forward: bool,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a InternalKey;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.idx?;
        self.idx = if self.forward {
            self.list.next_of(node)
        } else {
            self.list.prev_of(node)
        };
        self.list.get(node)
    }
}
