//! An ordered map for keys of nearly any shape.
//!
//! Integer keys index storage directly. Anything else (strings, floats,
//! sequences, maps, serde-serializable records) is written out canonically
//! and digested, so structurally equal keys always find the same entry. The
//! order entries come back in is up to a pluggable iteration strategy,
//! insertion order by default.
//!
//! ```
//! use cardinal_map::{Key, OrderedMap};
//!
//! let mut map = OrderedMap::new();
//! map.set("pera", 1).unwrap();
//! map.set(vec![1, 2], 2).unwrap();
//! assert_eq!(Ok(0), map.append(3));
//!
//! assert_eq!(Some(&2), map.get(vec![1, 2]));
//! assert_eq!(None, map.get(vec![2, 1]));
//! assert_eq!(Some(&Key::Int(0)), map.key_last());
//! ```

mod error;
pub mod key;
mod key_serializer;
pub mod normalizer;
pub mod ordered_map;
#[cfg(feature = "shared_map")]
pub mod shared_map;
pub mod strategy;

pub use error::{KeyError, ParseAlgorithmError};
pub use key::Key;
pub use normalizer::{DigestAlgorithm, InternalKey};
pub use ordered_map::{Iter, OrderedMap};
#[cfg(feature = "shared_map")]
pub use shared_map::SharedMap;
pub use strategy::{
    InsertionOrder, IterationStrategy, LinkedOrder, ReverseInsertionOrder,
};
