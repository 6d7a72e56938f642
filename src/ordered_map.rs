use log::{debug, trace};
use std::{
    collections::{hash_map::Entry, HashMap},
    fmt,
};

use crate::error::KeyError;
use crate::key::Key;
use crate::normalizer::{self, DigestAlgorithm, InternalKey};
use crate::strategy::{InsertionOrder, IterationStrategy};

/// A map which takes keys of nearly any shape and presents its entries in
/// an order chosen by its [`IterationStrategy`], insertion order unless told
/// otherwise.
///
/// Values are stored by internal key; the key each entry was set with is
/// kept alongside so `keys()` and iteration hand back real keys rather than
/// digests. Two keys whose canonical forms digest identically are the same
/// entry.
///
/// Iterating with [`iter`](OrderedMap::iter) borrows the map, so it can't
/// change underneath. The stateful cursor ([`rewind`](OrderedMap::rewind),
/// [`advance`](OrderedMap::advance) and friends) can be interleaved with
/// mutation; how that plays out is described on each strategy.
pub struct OrderedMap<V, S = InsertionOrder>
where
    S: IterationStrategy,
{
    storage: HashMap<InternalKey, V>,
    original_keys: HashMap<InternalKey, Key>,
    strategy: S,
    algorithm: DigestAlgorithm,
    last_added: Option<Key>,
    // the highest integer key ever inserted, removed or not. append hands
    // out the slot after it.
    highest_int: Option<i64>,
}

impl<V> OrderedMap<V, InsertionOrder> {
    /// An empty map in insertion order, digesting keys with SHA-256.
    pub fn new() -> Self {
        Self::with_strategy(InsertionOrder::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_parts(
            capacity,
            InsertionOrder::with_capacity(capacity),
            DigestAlgorithm::default(),
        )
    }

    /// Builds a map by setting each entry in turn, so later duplicates
    /// overwrite earlier ones without moving them.
    pub fn from_entries<I, K>(entries: I) -> Result<Self, KeyError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Key>,
    {
        Self::from_entries_with_strategy(entries, InsertionOrder::new())
    }
}

impl<V, S> OrderedMap<V, S>
where
    S: IterationStrategy,
{
    pub fn with_strategy(strategy: S) -> Self {
        Self::with_strategy_and_algorithm(strategy, DigestAlgorithm::default())
    }

    pub fn with_strategy_and_algorithm(
        strategy: S,
        algorithm: DigestAlgorithm,
    ) -> Self {
        Self::with_parts(0, strategy, algorithm)
    }

    fn with_parts(
        capacity: usize,
        strategy: S,
        algorithm: DigestAlgorithm,
    ) -> Self {
        Self {
            storage: HashMap::with_capacity(capacity),
            original_keys: HashMap::with_capacity(capacity),
            strategy,
            algorithm,
            last_added: None,
            highest_int: None,
        }
    }

    pub fn from_entries_with_strategy<I, K>(
        entries: I,
        strategy: S,
    ) -> Result<Self, KeyError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Key>,
    {
        let mut map = Self::with_strategy(strategy);
        for (k, v) in entries {
            map.set(k, v)?;
        }
        Ok(map)
    }

    /// Stores `value` at `key`, returning a reference to it where it now
    /// lives. A key that's already present keeps its place in iteration
    /// order and doesn't count as the last added key.
    ///
    /// Fails without touching the map if the key can't be normalized.
    pub fn set<K>(&mut self, key: K, value: V) -> Result<&mut V, KeyError>
    where
        K: Into<Key>,
    {
        let key = key.into();
        let internal = match normalizer::internal_key(&key, self.algorithm) {
            Ok(internal) => internal,
            Err(e) => {
                debug!("rejecting key {:?}: {}", key, e);
                return Err(e);
            }
        };

        Ok(self.insert_normalized(internal, key, value))
    }

    /// Stores `value` at the next free integer key and returns that key. The
    /// next free key is one past the highest integer key this map has ever
    /// held, so keys freed by removal are never handed out again.
    ///
    /// Once `i64::MAX` has been used as a key there is no next slot; the map
    /// is left alone and `value` is handed back as the error.
    pub fn append(&mut self, value: V) -> Result<i64, V> {
        let slot = match self.highest_int {
            None => 0,
            Some(highest) => match highest.checked_add(1) {
                Some(slot) => slot,
                None => {
                    debug!("no integer key left to append at");
                    return Err(value);
                }
            },
        };

        let internal = InternalKey::Direct(slot);
        self.insert_normalized(internal, Key::Int(slot), value);
        Ok(slot)
    }

    fn insert_normalized(
        &mut self,
        internal: InternalKey,
        key: Key,
        value: V,
    ) -> &mut V {
        if let InternalKey::Direct(i) = internal {
            self.highest_int = Some(self.highest_int.map_or(i, |h| h.max(i)));
        }

        // decided here rather than by the strategy, so a misbehaving
        // strategy can't make an overwrite look like a fresh insert
        let fresh = !self.storage.contains_key(&internal);
        if fresh {
            let tracked = self.strategy.add_if_absent(&internal);
            debug_assert!(tracked, "strategy already tracked a fresh key");
            trace!("inserting {:?}", key);
            self.last_added = Some(key.clone());
        } else {
            trace!("overwriting {:?}", key);
        }

        self.original_keys.insert(internal.clone(), key);
        match self.storage.entry(internal) {
            Entry::Occupied(mut e) => {
                e.insert(value);
                e.into_mut()
            }
            Entry::Vacant(e) => e.insert(value),
        }
    }

    // lookups treat keys that can't be normalized as simply absent
    fn lookup_key<K>(&self, key: K) -> Option<InternalKey>
    where
        K: Into<Key>,
    {
        let key = key.into();
        match normalizer::internal_key(&key, self.algorithm) {
            Ok(internal) => Some(internal),
            Err(e) => {
                debug!("looking up unusable key {:?}: {}", key, e);
                None
            }
        }
    }

    pub fn get<K>(&self, key: K) -> Option<&V>
    where
        K: Into<Key>,
    {
        let internal = self.lookup_key(key)?;
        self.storage.get(&internal)
    }

    /// Like [`get`](OrderedMap::get), falling back to `default` when the key
    /// isn't present.
    pub fn get_or<'a, K>(&'a self, key: K, default: &'a V) -> &'a V
    where
        K: Into<Key>,
    {
        self.get(key).unwrap_or(default)
    }

    pub fn get_mut<K>(&mut self, key: K) -> Option<&mut V>
    where
        K: Into<Key>,
    {
        let internal = self.lookup_key(key)?;
        self.storage.get_mut(&internal)
    }

    pub fn has<K>(&self, key: K) -> bool
    where
        K: Into<Key>,
    {
        self.lookup_key(key)
            .map_or(false, |internal| self.storage.contains_key(&internal))
    }

    /// Removes the entry at `key`, returning its value. Absent keys are a
    /// no-op. The last added key is left as it was, even if it's this one.
    pub fn remove<K>(&mut self, key: K) -> Option<V>
    where
        K: Into<Key>,
    {
        let internal = self.lookup_key(key)?;
        let value = self.storage.remove(&internal)?;
        let original = self.original_keys.remove(&internal);
        self.strategy.remove(&internal);
        trace!("removed {:?}", original);

        #[cfg(test)]
        self.check_invariants();

        Some(value)
    }

    /// Sets `key` only if it isn't present yet. Returns None when it stored
    /// `value`, otherwise the value already there (and drops `value`).
    pub fn put_if_absent<K>(
        &mut self,
        key: K,
        value: V,
    ) -> Result<Option<&V>, KeyError>
    where
        K: Into<Key>,
    {
        let key = key.into();
        let internal = normalizer::internal_key(&key, self.algorithm)?;

        if self.storage.contains_key(&internal) {
            return Ok(self.storage.get(&internal));
        }

        self.insert_normalized(internal, key, value);
        Ok(None)
    }

    /// Keys as they were set, in iteration order.
    pub fn keys(&self) -> Vec<&Key> {
        self.iter().map(|(k, _)| k).collect()
    }

    /// Values in iteration order, parallel to [`keys`](OrderedMap::keys).
    pub fn values(&self) -> Vec<&V> {
        self.iter().map(|(_, v)| v).collect()
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    pub fn non_empty(&self) -> bool {
        !self.is_empty()
    }

    /// The most recent key that was newly inserted, by `set` or `append`.
    /// Overwrites don't change it and neither does removal.
    pub fn key_last(&self) -> Option<&Key> {
        self.last_added.as_ref()
    }

    /// Empties the map. Integer keys handed out by `append` before the
    /// clear still won't be reused.
    pub fn clear(&mut self) {
        self.storage.clear();
        self.original_keys.clear();
        self.strategy.clear();
        self.last_added = None;

        #[cfg(test)]
        self.check_invariants();
    }

    pub fn digest_algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Walks the entries in strategy order. Each call starts over from the
    /// strategy's current state.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            order: self.strategy.order(),
            storage: &self.storage,
            original_keys: &self.original_keys,
        }
    }

    /// Puts the cursor on the first entry.
    pub fn rewind(&mut self) {
        self.strategy.rewind();
    }

    /// Moves the cursor to the next entry.
    pub fn advance(&mut self) {
        self.strategy.next();
    }

    /// Whether the cursor is on an entry.
    pub fn valid(&self) -> bool {
        self.strategy.valid()
    }

    /// The key of the entry under the cursor.
    pub fn key(&self) -> Option<&Key> {
        self.strategy
            .key()
            .and_then(|internal| self.original_keys.get(internal))
    }

    /// The value of the entry under the cursor.
    pub fn current(&self) -> Option<&V> {
        self.strategy
            .key()
            .and_then(|internal| self.storage.get(internal))
    }

    pub fn current_tuple(&self) -> Option<(&Key, &V)> {
        Some((self.key()?, self.current()?))
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        use std::collections::HashSet;

        assert_eq!(self.storage.len(), self.original_keys.len());
        for internal in self.storage.keys() {
            assert!(self.original_keys.contains_key(internal));
        }

        assert_eq!(self.storage.len(), self.strategy.len());
        let mut seen = HashSet::new();
        for internal in self.strategy.order() {
            assert!(self.storage.contains_key(internal));
            assert!(seen.insert(internal.clone()), "tracked twice");
        }
        assert_eq!(self.storage.len(), seen.len());

        for (internal, key) in &self.original_keys {
            match internal {
                InternalKey::Direct(i) => assert_eq!(&Key::Int(*i), key),
                InternalKey::Null => assert_eq!(&Key::Null, key),
                InternalKey::Digest(_) => assert_eq!(
                    Ok(internal.clone()),
                    normalizer::digest(key, self.algorithm)
                ),
            }
        }
    }
}

impl<V, S> Default for OrderedMap<V, S>
where
    S: IterationStrategy + Default,
{
    fn default() -> Self {
        Self::with_strategy(S::default())
    }
}

impl<V, S> fmt::Debug for OrderedMap<V, S>
where
    V: fmt::Debug,
    S: IterationStrategy,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Borrowing iterator over `(key, value)` pairs in strategy order.
pub struct Iter<'a, V> {
    order: Box<dyn Iterator<Item = &'a InternalKey> + 'a>,
    storage: &'a HashMap<InternalKey, V>,
    original_keys: &'a HashMap<InternalKey, Key>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a Key, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        for internal in &mut self.order {
            if let (Some(key), Some(value)) = (
                self.original_keys.get(internal),
                self.storage.get(internal),
            ) {
                return Some((key, value));
            }
        }

        None
    }
}

impl<'a, V, S> IntoIterator for &'a OrderedMap<V, S>
where
    S: IterationStrategy,
{
    type Item = (&'a Key, &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Iter<'a, V> {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::OrderedMap;
    use crate::error::KeyError;
    use crate::key::Key;
    use crate::normalizer::DigestAlgorithm;
    use crate::strategy::ReverseInsertionOrder;
    use serde::Serialize;

    fn s(v: &str) -> Key {
        Key::Str(v.to_owned())
    }

    #[derive(Serialize)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[test]
    fn test_round_trip_over_key_kinds() {
        let mut map = OrderedMap::new();
        let keys = vec![
            Key::Int(-4),
            Key::Null,
            Key::Bool(false),
            Key::Float(2.5),
            s("pera"),
            Key::Seq(vec![Key::Int(1), s("x")]),
            Key::Map(vec![(s("a"), Key::Int(1))]),
            Key::serialize(&Point { x: 1, y: 2 }).unwrap(),
        ];

        for (i, key) in keys.iter().enumerate() {
            assert_eq!(&i, map.set(key, i).unwrap());
            map.check_invariants();
        }

        for (i, key) in keys.iter().enumerate() {
            assert!(map.has(key));
            assert_eq!(Some(&i), map.get(key));
        }

        assert_eq!(keys.iter().collect::<Vec<_>>(), map.keys());
        assert_eq!(keys.len(), map.len());
    }

    #[test]
    fn test_structurally_equal_keys_share_an_entry() {
        let mut map = OrderedMap::new();
        map.set(
            Key::Map(vec![(s("a"), Key::Int(1)), (s("b"), Key::Int(2))]),
            "first",
        )
        .unwrap();
        map.set(
            Key::Map(vec![(s("b"), Key::Int(2)), (s("a"), Key::Int(1))]),
            "second",
        )
        .unwrap();
        assert_eq!(1, map.len());
        assert_eq!(
            Some(&"second"),
            map.get(Key::Map(vec![
                (s("a"), Key::Int(1)),
                (s("b"), Key::Int(2)),
            ]))
        );

        map.set(Key::from(vec![1, 2]), "forward").unwrap();
        map.set(Key::from(vec![2, 1]), "backward").unwrap();
        assert_eq!(3, map.len());
        map.check_invariants();
    }

    #[test]
    fn test_key_equality_is_not_entry_identity() {
        let mut map = OrderedMap::new();

        assert_eq!(Key::Float(-0.0), Key::Float(0.0));
        map.set(Key::Float(-0.0), "negative zero").unwrap();
        map.set(Key::Float(0.0), "zero").unwrap();
        assert_eq!(2, map.len());

        let by_int = Key::Map(vec![(Key::Int(1), s("x"))]);
        let by_str = Key::Map(vec![(s("1"), s("x"))]);
        assert_ne!(by_int, by_str);
        map.set(&by_int, "int").unwrap();
        map.set(&by_str, "str").unwrap();
        assert_eq!(3, map.len());
        assert_eq!(Some(&"str"), map.get(by_int));
        map.check_invariants();
    }

    #[test]
    fn test_overwrite_preserves_order() {
        let mut map = OrderedMap::new();
        map.set("A", 1).unwrap();
        map.set("B", 2).unwrap();
        map.set("C", 3).unwrap();

        assert_eq!(&20, map.set("B", 20).unwrap());
        map.check_invariants();

        assert_eq!(vec![&s("A"), &s("B"), &s("C")], map.keys());
        assert_eq!(vec![&1, &20, &3], map.values());
        assert_eq!(Some(&s("C")), map.key_last());
    }

    #[test]
    fn test_key_last() {
        let mut map: OrderedMap<i32> = OrderedMap::new();
        assert_eq!(None, map.key_last());

        map.set("a", 1).unwrap();
        assert_eq!(Some(&s("a")), map.key_last());

        let slot = map.append(2).unwrap();
        assert_eq!(Some(&Key::Int(slot)), map.key_last());

        map.set("a", 3).unwrap();
        assert_eq!(Some(&Key::Int(slot)), map.key_last());

        map.remove(slot);
        assert_eq!(Some(&Key::Int(slot)), map.key_last());
    }

    #[test]
    fn test_append_never_reuses_keys() {
        let mut map = OrderedMap::new();
        let a = map.append("a").unwrap();
        let b = map.append("b").unwrap();
        assert_eq!(Some("b"), map.remove(b));
        let c = map.append("c").unwrap();

        assert_eq!((0, 1, 2), (a, b, c));
        assert!(a < b && b < c);
        assert_eq!(vec![&Key::Int(0), &Key::Int(2)], map.keys());
        map.check_invariants();
    }

    #[test]
    fn test_append_follows_keyed_integers() {
        let mut map = OrderedMap::new();
        map.set(10, "ten").unwrap();
        map.set("x", "not an integer").unwrap();
        assert_eq!(Ok(11), map.append("eleven"));

        map.remove(11);
        map.remove(10);
        assert_eq!(Ok(12), map.append("twelve"));

        map.clear();
        assert_eq!(Ok(13), map.append("thirteen"));
    }

    #[test]
    fn test_append_after_negative_keys() {
        let mut map = OrderedMap::new();
        map.set(-5, ()).unwrap();
        assert_eq!(Ok(-4), map.append(()));
    }

    #[test]
    fn test_append_exhausted_hands_value_back() {
        let mut map = OrderedMap::new();
        map.set(i64::MAX, "max").unwrap();
        assert_eq!(Err("spare"), map.append("spare"));

        assert_eq!(1, map.len());
        assert_eq!(Some(&Key::Int(i64::MAX)), map.key_last());
        map.check_invariants();

        // removing the top key doesn't free the slot after it
        map.remove(i64::MAX);
        assert_eq!(Err("spare"), map.append("spare"));
        assert!(map.is_empty());
    }

    #[test]
    fn test_put_if_absent() {
        let mut map = OrderedMap::new();
        assert_eq!(Ok(None), map.put_if_absent("k", 1));
        assert_eq!(Ok(Some(&1)), map.put_if_absent("k", 2));
        assert_eq!(Some(&1), map.get("k"));
        assert_eq!(1, map.len());
        map.check_invariants();
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut map = OrderedMap::new();
        map.set("k", 1).unwrap();

        assert_eq!(None, map.remove("nope"));
        assert_eq!(None, map.remove(Key::Float(f64::NAN)));
        assert_eq!(1, map.len());

        assert_eq!(Some(1), map.remove("k"));
        assert_eq!(None, map.remove("k"));
        assert!(map.is_empty());
    }

    #[test]
    fn test_unsupported_key_leaves_map_alone() {
        let mut map = OrderedMap::new();
        map.set("k", 1).unwrap();

        let bad = Key::Seq(vec![Key::Float(f64::INFINITY)]);
        assert!(matches!(
            map.set(bad.clone(), 2),
            Err(KeyError::UnsupportedKeyType(_))
        ));
        assert!(matches!(
            map.put_if_absent(bad.clone(), 2),
            Err(KeyError::UnsupportedKeyType(_))
        ));

        assert_eq!(1, map.len());
        assert_eq!(Some(&s("k")), map.key_last());
        assert!(!map.has(bad.clone()));
        assert_eq!(None, map.get(bad));
        map.check_invariants();
    }

    #[test]
    fn test_from_entries_fails_on_bad_key() {
        let entries = vec![(Key::Int(1), 1), (Key::Float(f64::NAN), 2)];
        assert!(OrderedMap::from_entries(entries).is_err());
    }

    #[test]
    fn test_get_or() {
        let mut map = OrderedMap::new();
        map.set("k", 1).unwrap();
        assert_eq!(&1, map.get_or("k", &0));
        assert_eq!(&0, map.get_or("missing", &0));
    }

    #[test]
    fn test_get_mut() {
        let mut map = OrderedMap::new();
        map.set("k", 1).unwrap();
        *map.get_mut("k").unwrap() += 1;
        assert_eq!(Some(&2), map.get("k"));
        assert_eq!(None, map.get_mut("missing"));
    }

    #[test]
    fn test_empty_map() {
        let map: OrderedMap<u8> = OrderedMap::default();
        assert!(map.is_empty());
        assert!(!map.non_empty());
        assert_eq!(0, map.len());
        assert_eq!(None, map.key_last());
        assert_eq!(0, map.iter().count());
        assert!(map.keys().is_empty());
        assert_eq!("{}", format!("{:?}", map));
    }

    #[test]
    fn test_cursor() {
        let mut map =
            OrderedMap::from_entries(vec![("a", 1), ("b", 2)]).unwrap();

        map.rewind();
        assert!(map.valid());
        assert_eq!(Some((&s("a"), &1)), map.current_tuple());
        map.advance();
        assert_eq!(Some(&s("b")), map.key());
        assert_eq!(Some(&2), map.current());
        map.advance();
        assert!(!map.valid());
        assert_eq!(None, map.current_tuple());

        // a rewind sees what changed since the last pass
        map.remove("a");
        map.set("c", 3).unwrap();
        map.rewind();
        let mut seen = Vec::new();
        while let Some((k, v)) = map.current_tuple() {
            seen.push((k.clone(), *v));
            map.advance();
        }
        assert_eq!(vec![(s("b"), 2), (s("c"), 3)], seen);
    }

    #[test]
    fn test_iter_restarts() {
        let mut map =
            OrderedMap::from_entries(vec![(1, 'a'), (2, 'b')]).unwrap();
        assert_eq!(2, map.iter().count());
        assert_eq!(2, map.iter().count());

        map.remove(1);
        let pairs: Vec<_> = (&map).into_iter().collect();
        assert_eq!(vec![(&Key::Int(2), &'b')], pairs);
    }

    #[test]
    fn test_reverse_strategy() {
        let mut map = OrderedMap::from_entries_with_strategy(
            vec![("a", 1), ("b", 2), ("c", 3)],
            ReverseInsertionOrder::new(),
        )
        .unwrap();
        assert_eq!(vec![&s("c"), &s("b"), &s("a")], map.keys());

        map.set("b", 20).unwrap();
        assert_eq!(vec![&3, &20, &1], map.values());
        assert_eq!(Some(&s("c")), map.key_last());
        map.check_invariants();
    }

    #[test]
    fn test_algorithm_is_configurable() {
        let mut map = OrderedMap::with_strategy_and_algorithm(
            ReverseInsertionOrder::default(),
            DigestAlgorithm::Sha512,
        );
        map.set("k", 1).unwrap();
        assert_eq!(Some(&1), map.get("k"));
        assert_eq!(DigestAlgorithm::Sha512, map.digest_algorithm());
        map.check_invariants();
    }

    #[test]
    fn test_null_key() {
        let mut map = OrderedMap::new();
        map.set(Key::Null, "nothing").unwrap();
        map.set(s(""), "empty string").unwrap();
        assert_eq!(2, map.len());
        assert_eq!(Some(&"nothing"), map.get(()));
        assert_eq!(Some("nothing"), map.remove(None::<i32>));
        map.check_invariants();
    }

    #[test]
    fn test_debug() {
        let map = OrderedMap::from_entries(vec![("a", 1)]).unwrap();
        assert_eq!(r#"{Str("a"): 1}"#, format!("{:?}", map));
    }
}
