//! Core value types for the motif interpreter.
//!
//! Every resource in a program is identified by a [`Uri`]; every constant
//! is a [`Literal`]. A triple's object may be either, which is what
//! [`Value`] captures.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Opaque, immutable resource identifier.
///
/// Equality is plain string equality. The only way to derive a new identifier
/// from an existing one is [`Uri::extend`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uri(String);

impl Uri {
    /// Wrap a string as a resource identifier.
    pub fn new(raw: impl Into<String>) -> Self {
        Uri(raw.into())
    }

    /// The empty identifier, used as the namespace when no default prefix is active.
    pub fn empty() -> Self {
        Uri(String::new())
    }

    /// Append `segment` after `delimiter`, producing a new identifier.
    pub fn extend(&self, delimiter: &str, segment: &str) -> Self {
        let mut raw = String::with_capacity(self.0.len() + delimiter.len() + segment.len());
        raw.push_str(&self.0);
        raw.push_str(delimiter);
        raw.push_str(segment);
        Uri(raw)
    }

    /// Borrow the underlying string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the empty identifier.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

impl From<&str> for Uri {
    fn from(raw: &str) -> Self {
        Uri::new(raw)
    }
}

/// A constant value.
///
/// Two literals are equal only when they carry the same tag and the same
/// underlying value. Floats compare by bit pattern so that `Literal` can be
/// `Eq` and `Hash`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Literal {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
}

impl Literal {
    /// Name of the tag, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Literal::Integer(_) => "integer",
            Literal::Float(_) => "float",
            Literal::String(_) => "string",
            Literal::Boolean(_) => "boolean",
        }
    }

    /// The integer payload, if this is an integer literal.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Literal::Integer(n) => Some(*n),
            _ => None,
        }
    }
}

impl PartialEq for Literal {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Literal::Integer(a), Literal::Integer(b)) => a == b,
            (Literal::Float(a), Literal::Float(b)) => a.to_bits() == b.to_bits(),
            (Literal::String(a), Literal::String(b)) => a == b,
            (Literal::Boolean(a), Literal::Boolean(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Literal {}

impl Hash for Literal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Literal::Integer(n) => n.hash(state),
            Literal::Float(x) => x.to_bits().hash(state),
            Literal::String(s) => s.hash(state),
            Literal::Boolean(b) => b.hash(state),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Integer(n) => write!(f, "{n}"),
            Literal::Float(x) => write!(f, "{x:?}"),
            Literal::String(s) => write!(f, "{s:?}"),
            Literal::Boolean(b) => write!(f, "{b}"),
        }
    }
}

/// Anything that can sit in the object position of a triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Uri(Uri),
    Literal(Literal),
}

impl Value {
    /// The identifier, if this value is one.
    pub fn as_uri(&self) -> Option<&Uri> {
        match self {
            Value::Uri(uri) => Some(uri),
            Value::Literal(_) => None,
        }
    }

    /// Short description of the value's shape, used in type-mismatch diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Uri(_) => "resource",
            Value::Literal(lit) => lit.kind(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Uri(uri) => uri.fmt(f),
            Value::Literal(lit) => lit.fmt(f),
        }
    }
}

impl From<Uri> for Value {
    fn from(uri: Uri) -> Self {
        Value::Uri(uri)
    }
}

impl From<Literal> for Value {
    fn from(lit: Literal) -> Self {
        Value::Literal(lit)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Literal(Literal::Integer(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Literal(Literal::Boolean(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_extend_concatenates() {
        let ns = Uri::new("http://example.org/");
        assert_eq!(ns.extend("", "thing").as_str(), "http://example.org/thing");
        assert_eq!(ns.extend("#", "frag").as_str(), "http://example.org/#frag");
        // The original is untouched.
        assert_eq!(ns.as_str(), "http://example.org/");
    }

    #[test]
    fn literal_equality_requires_same_tag() {
        assert_eq!(Literal::Integer(1), Literal::Integer(1));
        assert_ne!(Literal::Integer(1), Literal::Float(1.0));
        assert_ne!(
            Literal::String("true".into()),
            Literal::Boolean(true)
        );
        assert_eq!(Literal::Float(0.5), Literal::Float(0.5));
    }

    #[test]
    fn literal_hash_is_consistent_with_eq() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(Literal::Float(2.5));
        set.insert(Literal::Float(2.5));
        set.insert(Literal::Integer(2));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn value_display() {
        assert_eq!(Value::from(Uri::new("a")).to_string(), "<a>");
        assert_eq!(Value::from(7i64).to_string(), "7");
        assert_eq!(
            Value::Literal(Literal::String("hi".into())).to_string(),
            "\"hi\""
        );
    }

    #[test]
    fn value_kind_names_shape() {
        assert_eq!(Value::from(Uri::new("a")).kind(), "resource");
        assert_eq!(Value::from(true).kind(), "boolean");
    }
}
