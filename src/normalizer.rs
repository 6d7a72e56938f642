//! Turns caller keys into internal keys. Integers pass through untouched;
//! everything else is written out in a canonical textual form and hashed,
//! so structurally equal keys always land on the same internal key.

use serde_json::{Map, Number, Value};
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512, Sha512_256};
use std::{collections::BTreeMap, fmt, str::FromStr};

use crate::error::{KeyError, ParseAlgorithmError};
use crate::key::Key;

/// What a map actually indexes its storage by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InternalKey {
    /// Stands in for [`Key::Null`], which is never hashed.
    Null,
    Direct(i64),
    /// Lowercase hex digest of the key's canonical form.
    Digest(String),
}

/// The hash used to digest non-integer keys. Switching algorithms changes
/// internal keys, never what a map does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    Sha224,
    Sha256,
    Sha384,
    Sha512,
    Sha512_256,
}

impl DigestAlgorithm {
    /// The conventional name, as accepted by `FromStr`.
    pub fn name(self) -> &'static str {
        match self {
            DigestAlgorithm::Sha224 => "sha224",
            DigestAlgorithm::Sha256 => "sha256",
            DigestAlgorithm::Sha384 => "sha384",
            DigestAlgorithm::Sha512 => "sha512",
            DigestAlgorithm::Sha512_256 => "sha512/256",
        }
    }

    pub fn hex_digest(self, input: &[u8]) -> String {
        match self {
            DigestAlgorithm::Sha224 => format!("{:x}", Sha224::digest(input)),
            DigestAlgorithm::Sha256 => format!("{:x}", Sha256::digest(input)),
            DigestAlgorithm::Sha384 => format!("{:x}", Sha384::digest(input)),
            DigestAlgorithm::Sha512 => format!("{:x}", Sha512::digest(input)),
            DigestAlgorithm::Sha512_256 => {
                format!("{:x}", Sha512_256::digest(input))
            }
        }
    }
}

impl Default for DigestAlgorithm {
    fn default() -> Self {
        DigestAlgorithm::Sha256
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = ParseAlgorithmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let algorithm = match s.to_ascii_lowercase().as_str() {
            "sha224" => DigestAlgorithm::Sha224,
            "sha256" => DigestAlgorithm::Sha256,
            "sha384" => DigestAlgorithm::Sha384,
            "sha512" => DigestAlgorithm::Sha512,
            "sha512/256" | "sha512_256" => DigestAlgorithm::Sha512_256,
            _ => return Err(ParseAlgorithmError::new(s)),
        };

        Ok(algorithm)
    }
}

/// True if the key can index storage as-is, without being digested.
pub fn is_direct_key(key: &Key) -> bool {
    matches!(key, Key::Int(_))
}

/// The internal key for `key`: integers directly, everything else through
/// [`digest`].
pub fn internal_key(
    key: &Key,
    algorithm: DigestAlgorithm,
) -> Result<InternalKey, KeyError> {
    match key {
        Key::Int(i) => Ok(InternalKey::Direct(*i)),
        _ => digest(key, algorithm),
    }
}

/// Digests the canonical form of `key`. Null short-circuits to the
/// [`InternalKey::Null`] sentinel.
pub fn digest(
    key: &Key,
    algorithm: DigestAlgorithm,
) -> Result<InternalKey, KeyError> {
    if let Key::Null = key {
        return Ok(InternalKey::Null);
    }

    let canonical = canonical_form(key)?;
    Ok(InternalKey::Digest(algorithm.hex_digest(canonical.as_bytes())))
}

/// Writes `key` out as deterministic JSON text. Map entries and record
/// fields are sorted by key at every depth, sequences keep their order. A
/// top-level record is prefixed with its name (`Name: {...}`); a nested one
/// becomes `{"$fields":{...},"$type":"Name"}`.
pub fn canonical_form(key: &Key) -> Result<String, KeyError> {
    match key {
        Key::Record { name, fields } => {
            Ok(format!("{}: {}", name, record_fields(fields)?))
        }
        _ => Ok(canonical_value(key)?.to_string()),
    }
}

fn canonical_value(key: &Key) -> Result<Value, KeyError> {
    let value = match key {
        Key::Null => Value::Null,
        Key::Bool(b) => Value::Bool(*b),
        Key::Int(i) => Value::from(*i),
        Key::Float(f) => match Number::from_f64(*f) {
            Some(n) => Value::Number(n),
            None => {
                return Err(KeyError::unsupported(format_args!(
                    "non-finite float {}",
                    f
                )))
            }
        },
        Key::Str(s) => Value::String(s.clone()),
        Key::Seq(items) => Value::Array(
            items
                .iter()
                .map(canonical_value)
                .collect::<Result<_, _>>()?,
        ),
        Key::Map(entries) => {
            let mut sorted = BTreeMap::new();
            for (k, v) in entries {
                // later duplicates win, same as inserting into a map
                sorted.insert(map_key_text(k)?, canonical_value(v)?);
            }
            sorted_object(sorted)
        }
        Key::Record { name, fields } => {
            let mut record = BTreeMap::new();
            record.insert("$type".to_owned(), Value::String(name.clone()));
            record.insert("$fields".to_owned(), record_fields(fields)?);
            sorted_object(record)
        }
    };

    Ok(value)
}

fn record_fields(fields: &[(String, Key)]) -> Result<Value, KeyError> {
    let mut sorted = BTreeMap::new();
    for (name, value) in fields {
        sorted.insert(name.clone(), canonical_value(value)?);
    }
    Ok(sorted_object(sorted))
}

// serde_json may be built with preserve_order somewhere in the dependency
// graph, so the entries go in already sorted.
fn sorted_object(sorted: BTreeMap<String, Value>) -> Value {
    let mut object = Map::new();
    for (k, v) in sorted {
        object.insert(k, v);
    }
    Value::Object(object)
}

fn map_key_text(key: &Key) -> Result<String, KeyError> {
    match key {
        Key::Str(s) => Ok(s.clone()),
        Key::Int(i) => Ok(i.to_string()),
        other => Err(KeyError::unsupported(format_args!(
            "a {} cannot be used as a map entry key",
            other.kind()
        ))),
    }
}
