use std::fmt;

/// The one way a key can fail: it has no canonical form, so it can't be
/// turned into an internal key. The map is left untouched when this comes
/// back from a mutating call.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyError {
    UnsupportedKeyType(String),
}

impl KeyError {
    pub(crate) fn unsupported<T: fmt::Display>(reason: T) -> Self {
        KeyError::UnsupportedKeyType(reason.to_string())
    }
}

impl fmt::Display for KeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyError::UnsupportedKeyType(reason) => {
                write!(f, "unsupported key type: {}", reason)
            }
        }
    }
}

impl std::error::Error for KeyError {}

// lets the key serializer report failures from foreign Serialize impls
// straight through as KeyErrors
impl serde::ser::Error for KeyError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        KeyError::unsupported(msg)
    }
}

/// Returned when a digest algorithm name isn't one we know.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseAlgorithmError {
    name: String,
}

impl ParseAlgorithmError {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
        }
    }
}

impl fmt::Display for ParseAlgorithmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown digest algorithm `{}`", self.name)
    }
}

impl std::error::Error for ParseAlgorithmError {}

#[cfg(test)]
mod tests {
    use super::KeyError;
    use serde::ser::Error;

    #[test]
    fn test_display() {
        let e = KeyError::custom("file handles can't be keys");
        assert_eq!(
            "unsupported key type: file handles can't be keys",
            e.to_string()
        );
    }
}
