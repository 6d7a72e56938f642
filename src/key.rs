//! The caller-facing key type. Anything a map is keyed by is first turned
//! into a [`Key`], which is what the map hands back from `keys()` and
//! iteration.

use serde::Serialize;

use crate::error::KeyError;
use crate::key_serializer::KeySerializer;

/// A key as the caller supplied it.
///
/// Integers are used by the map as they are. Everything else is reduced
/// to a digest of its canonical form, see [`crate::normalizer`].
///
/// `==` compares the trees as written, which is not the same thing as
/// naming the same map entry. `Float(-0.0) == Float(0.0)` holds, yet they
/// are two entries. A `Map` keyed by `Int(1)` and one keyed by `Str("1")`
/// compare unequal, yet they are one entry. Compare normalized keys
/// ([`crate::normalizer::internal_key`]) to ask the map's question.
#[derive(Debug, Clone, PartialEq)]
pub enum Key {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),

    /// A plain sequence. Order matters: `[1, 2]` and `[2, 1]` are
    /// different keys.
    Seq(Vec<Key>),

    /// An associative structure. Entry order doesn't matter, two maps
    /// holding the same entries are the same key.
    Map(Vec<(Key, Key)>),

    /// A typed record. `name` takes part in normalization, so two record
    /// types with identical fields are still different keys.
    Record {
        name: String,
        fields: Vec<(String, Key)>,
    },
}

impl Key {
    /// Converts any serializable value into a key. Structs keep their type
    /// name as the record name; enum variants are named `Enum::Variant`.
    ///
    /// Fails with [`KeyError::UnsupportedKeyType`] for values with no key
    /// representation, such as 128-bit integers, unsigned integers above
    /// `i64::MAX`, or anything whose `Serialize` impl errors out.
    pub fn serialize<T>(value: &T) -> Result<Key, KeyError>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(KeySerializer)
    }

    /// A short name for the kind of key, for messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Key::Null => "null",
            Key::Bool(_) => "bool",
            Key::Int(_) => "integer",
            Key::Float(_) => "float",
            Key::Str(_) => "string",
            Key::Seq(_) => "sequence",
            Key::Map(_) => "map",
            Key::Record { .. } => "record",
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Key::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Key::Str(s) => Some(s),
            _ => None,
        }
    }
}

macro_rules! int_key {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Key {
                fn from(i: $t) -> Self {
                    Key::Int(i64::from(i))
                }
            }
        )*
    };
}

int_key!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Key {
    fn from(f: f32) -> Self {
        Key::Float(f64::from(f))
    }
}

impl From<f64> for Key {
    fn from(f: f64) -> Self {
        Key::Float(f)
    }
}

impl From<bool> for Key {
    fn from(b: bool) -> Self {
        Key::Bool(b)
    }
}

impl From<char> for Key {
    fn from(c: char) -> Self {
        Key::Str(c.to_string())
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Str(s.to_owned())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Str(s)
    }
}

impl From<&String> for Key {
    fn from(s: &String) -> Self {
        Key::Str(s.clone())
    }
}

impl From<()> for Key {
    fn from(_: ()) -> Self {
        Key::Null
    }
}

impl From<&Key> for Key {
    fn from(k: &Key) -> Self {
        k.clone()
    }
}

impl<T> From<Option<T>> for Key
where
    T: Into<Key>,
{
    fn from(o: Option<T>) -> Self {
        o.map_or(Key::Null, Into::into)
    }
}

impl<T> From<Vec<T>> for Key
where
    T: Into<Key>,
{
    fn from(v: Vec<T>) -> Self {
        Key::Seq(v.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::Key;
    use crate::error::KeyError;
    use serde::Serialize;
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    struct Person {
        name: &'static str,
        age: u8,
    }

    #[derive(Serialize)]
    struct Meters(u32);

    #[derive(Serialize)]
    enum Shape {
        Point,
        Circle(u32),
        Rect { w: u32, h: u32 },
    }

    #[test]
    fn test_scalar_conversions() {
        assert_eq!(Key::Int(7), Key::from(7u8));
        assert_eq!(Key::Int(-7), Key::from(-7i32));
        assert_eq!(Key::Str("x".to_owned()), Key::from('x'));
        assert_eq!(Key::Null, Key::from(None::<i32>));
        assert_eq!(Key::Int(3), Key::from(Some(3)));
        assert_eq!(
            Key::Seq(vec![Key::Int(1), Key::Str("a".to_owned())]),
            Key::from(vec![Key::from(1), Key::from("a")])
        );
    }

    #[test]
    fn test_serialize_struct_keeps_its_name() {
        let key = Key::serialize(&Person {
            name: "Pera",
            age: 40,
        })
        .unwrap();

        assert_eq!(
            Key::Record {
                name: "Person".to_owned(),
                fields: vec![
                    ("name".to_owned(), Key::Str("Pera".to_owned())),
                    ("age".to_owned(), Key::Int(40)),
                ],
            },
            key
        );
    }

    #[test]
    fn test_serialize_newtype_and_variants() {
        assert_eq!(
            Key::Record {
                name: "Meters".to_owned(),
                fields: vec![("0".to_owned(), Key::Int(5))],
            },
            Key::serialize(&Meters(5)).unwrap()
        );

        assert_eq!(
            Key::Record {
                name: "Shape::Point".to_owned(),
                fields: vec![],
            },
            Key::serialize(&Shape::Point).unwrap()
        );

        assert_eq!(
            Key::Record {
                name: "Shape::Circle".to_owned(),
                fields: vec![("0".to_owned(), Key::Int(2))],
            },
            Key::serialize(&Shape::Circle(2)).unwrap()
        );

        assert_eq!(
            Key::Record {
                name: "Shape::Rect".to_owned(),
                fields: vec![
                    ("w".to_owned(), Key::Int(3)),
                    ("h".to_owned(), Key::Int(4)),
                ],
            },
            Key::serialize(&Shape::Rect { w: 3, h: 4 }).unwrap()
        );
    }

    #[test]
    fn test_serialize_collections() {
        let mut m = BTreeMap::new();
        m.insert("b", vec![1, 2]);
        m.insert("a", vec![]);

        assert_eq!(
            Key::Map(vec![
                (Key::Str("a".to_owned()), Key::Seq(vec![])),
                (
                    Key::Str("b".to_owned()),
                    Key::Seq(vec![Key::Int(1), Key::Int(2)])
                ),
            ]),
            Key::serialize(&m).unwrap()
        );

        assert_eq!(
            Key::Seq(vec![Key::Int(1), Key::Bool(true), Key::Null]),
            Key::serialize(&(1, true, ())).unwrap()
        );
    }

    #[test]
    fn test_serialize_rejects_wide_integers() {
        assert!(matches!(
            Key::serialize(&u64::MAX),
            Err(KeyError::UnsupportedKeyType(_))
        ));
        assert!(matches!(
            Key::serialize(&1i128),
            Err(KeyError::UnsupportedKeyType(_))
        ));
        assert_eq!(Key::Int(42), Key::serialize(&42u64).unwrap());
    }
}
