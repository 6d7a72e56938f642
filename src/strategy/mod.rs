//! Iteration strategies decide the order a map presents its keys in,
//! independently of how the map stores them.

mod insertion_order;
mod linked_keys;

pub use insertion_order::{InsertionOrder, LinkedOrder, ReverseInsertionOrder};

use crate::normalizer::InternalKey;

/// Tracks which internal keys exist and the order they're presented in.
///
/// Besides the bookkeeping calls, a strategy owns a single cursor
/// (`rewind`/`next`/`valid`/`key`) which a map drives for stateful
/// traversal, and offers [`order`](IterationStrategy::order) for walks that
/// must not disturb that cursor.
///
/// What happens to a paused cursor when keys are added or removed is up to
/// the strategy.
pub trait IterationStrategy {
    /// Starts tracking `key`. Returns true if it was newly added, false
    /// (changing nothing) if it was already tracked.
    fn add_if_absent(&mut self, key: &InternalKey) -> bool;

    /// Stops tracking `key`. Unknown keys are ignored.
    fn remove(&mut self, key: &InternalKey);

    /// Puts the cursor on the first key.
    fn rewind(&mut self);

    /// Moves the cursor on by one.
    fn next(&mut self);

    /// Whether the cursor is on a key.
    fn valid(&self) -> bool;

    /// The key under the cursor.
    fn key(&self) -> Option<&InternalKey>;

    /// The number of keys tracked.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forgets every key.
    fn clear(&mut self);

    /// Every tracked key, in presentation order.
    fn order(&self) -> Box<dyn Iterator<Item = &InternalKey> + '_>;
}
