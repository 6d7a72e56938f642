use parking_lot::RwLock;
use std::sync::Arc;

use crate::error::KeyError;
use crate::key::Key;
use crate::ordered_map::OrderedMap;
use crate::strategy::{InsertionOrder, IterationStrategy};

/// Wrapper for an OrderedMap which is shareable across thread boundaries.
/// Every call takes the one lock guarding the whole map, so each operation
/// is atomic with respect to the others.
pub struct SharedMap<V, S = InsertionOrder>(Arc<RwLock<OrderedMap<V, S>>>)
where
    S: IterationStrategy,
    V: Clone;

impl<V, S> SharedMap<V, S>
where
    S: IterationStrategy,
    V: Clone,
{
    /// Wraps a map into a shared map accessor, making it safe to move
    /// across thread boundaries. Enforces an additional constraint of Clone
    /// on values.
    pub fn with_map(map: OrderedMap<V, S>) -> Self {
        Self(Arc::new(RwLock::new(map)))
    }

    pub fn set<K>(&self, key: K, value: V) -> Result<(), KeyError>
    where
        K: Into<Key>,
    {
        self.0.write().set(key, value).map(|_| ())
    }

    /// Appends at the next free integer key, returning that key. Hands
    /// `value` back if the map has run out of integer keys.
    pub fn append(&self, value: V) -> Result<i64, V> {
        self.0.write().append(value)
    }

    /// Get a value from the map. This clones it to minimize the lock time of
    /// the map.
    pub fn get<K>(&self, key: K) -> Option<V>
    where
        K: Into<Key>,
    {
        self.0.read().get(key).cloned()
    }

    pub fn has<K>(&self, key: K) -> bool
    where
        K: Into<Key>,
    {
        self.0.read().has(key)
    }

    /// Remove a value from the map, returning it if it existed.
    pub fn remove<K>(&self, key: K) -> Option<V>
    where
        K: Into<Key>,
    {
        self.0.write().remove(key)
    }

    /// Checks and sets under the same lock, so two threads racing on one
    /// key can't both see it absent.
    pub fn put_if_absent<K>(
        &self,
        key: K,
        value: V,
    ) -> Result<Option<V>, KeyError>
    where
        K: Into<Key>,
    {
        self.0
            .write()
            .put_if_absent(key, value)
            .map(|existing| existing.cloned())
    }

    /// A snapshot of the keys in iteration order.
    pub fn keys(&self) -> Vec<Key> {
        self.0.read().keys().into_iter().cloned().collect()
    }

    /// A snapshot of the values in iteration order.
    pub fn values(&self) -> Vec<V> {
        self.0.read().values().into_iter().cloned().collect()
    }

    /// A snapshot of every entry in iteration order.
    pub fn entries(&self) -> Vec<(Key, V)> {
        self.0
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn key_last(&self) -> Option<Key> {
        self.0.read().key_last().cloned()
    }

    /// Clears the map.
    pub fn clear(&self) {
        self.0.write().clear()
    }

    /// The number of entries in the map at present.
    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }
}

impl<V, S> Clone for SharedMap<V, S>
where
    S: IterationStrategy,
    V: Clone,
{
    fn clone(&self) -> Self {
        SharedMap(self.0.clone())
    }
}
