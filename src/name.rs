//! Dotted symbolic names.
//!
//! A [`Name`] is a non-empty sequence of [`Segment`]s. It stays symbolic until
//! the resolver reduces it to a [`Value`](crate::value::Value).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::Uri;

/// One component of a dotted name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    /// A bare symbol such as `foo` or a prefixed symbol such as `ex:foo`.
    Symbol(String),
    /// An already-concrete identifier.
    Uri(Uri),
    /// The identity of the expansion currently being evaluated.
    SelfRef,
}

impl Segment {
    /// Textual form used when segments are joined into keys or identifiers.
    ///
    /// `SelfRef` has no textual form; callers substitute it first.
    pub fn text(&self) -> Option<&str> {
        match self {
            Segment::Symbol(s) => Some(s),
            Segment::Uri(u) => Some(u.as_str()),
            Segment::SelfRef => None,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Symbol(s) => f.write_str(s),
            Segment::Uri(u) => u.fmt(f),
            Segment::SelfRef => f.write_str("self"),
        }
    }
}

/// Ordered, non-empty sequence of segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Segment>", into = "Vec<Segment>")]
pub struct Name(Vec<Segment>);

/// Returned when building a [`Name`] from zero segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("a name needs at least one segment")]
pub struct EmptyName;

impl Name {
    /// Build a name from segments. Returns `None` for an empty list.
    pub fn new(segments: Vec<Segment>) -> Option<Self> {
        if segments.is_empty() {
            None
        } else {
            Some(Name(segments))
        }
    }

    /// Single bare-symbol name.
    pub fn symbol(symbol: impl Into<String>) -> Self {
        Name(vec![Segment::Symbol(symbol.into())])
    }

    /// Single concrete-identifier name.
    pub fn uri(uri: Uri) -> Self {
        Name(vec![Segment::Uri(uri)])
    }

    /// The bare `self` name.
    pub fn self_ref() -> Self {
        Name(vec![Segment::SelfRef])
    }

    /// Split a dotted string into segments; `self` becomes [`Segment::SelfRef`].
    ///
    /// Empty components are dropped, so `"a..b"` is `a.b`. Returns `None` if
    /// nothing remains.
    pub fn dotted(text: &str) -> Option<Self> {
        let segments = text
            .split('.')
            .filter(|s| !s.is_empty())
            .map(|s| {
                if s == "self" {
                    Segment::SelfRef
                } else {
                    Segment::Symbol(s.to_string())
                }
            })
            .collect();
        Name::new(segments)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn first(&self) -> &Segment {
        &self.0[0]
    }

    /// Whether any segment refers to the current self.
    pub fn contains_self(&self) -> bool {
        self.0.iter().any(|s| matches!(s, Segment::SelfRef))
    }

    /// If this name is a single bare symbol, return it.
    pub fn as_symbol(&self) -> Option<&str> {
        match self.0.as_slice() {
            [Segment::Symbol(s)] => Some(s),
            _ => None,
        }
    }

    /// Replace every `SelfRef` segment with a concrete identifier.
    pub fn bind_self(&self, identity: &Uri) -> Self {
        Name(
            self.0
                .iter()
                .map(|seg| match seg {
                    Segment::SelfRef => Segment::Uri(identity.clone()),
                    other => other.clone(),
                })
                .collect(),
        )
    }
}

impl TryFrom<Vec<Segment>> for Name {
    type Error = EmptyName;

    fn try_from(segments: Vec<Segment>) -> Result<Self, Self::Error> {
        Name::new(segments).ok_or(EmptyName)
    }
}

impl From<Name> for Vec<Segment> {
    fn from(name: Name) -> Self {
        name.0
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            seg.fmt(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_name_is_rejected() {
        assert!(Name::new(vec![]).is_none());
        assert!(Name::dotted("...").is_none());
    }

    #[test]
    fn dotted_recognizes_self() {
        let name = Name::dotted("self.e").unwrap();
        assert_eq!(
            name.segments(),
            &[Segment::SelfRef, Segment::Symbol("e".into())]
        );
        assert!(name.contains_self());
        assert_eq!(name.to_string(), "self.e");
    }

    #[test]
    fn empty_segment_list_is_an_error() {
        let err = Name::try_from(Vec::new()).unwrap_err();
        assert_eq!(err, EmptyName);
        let boxed: Box<dyn std::error::Error> = Box::new(err);
        assert_eq!(boxed.to_string(), "a name needs at least one segment");
    }

    #[test]
    fn bind_self_replaces_every_occurrence() {
        let name = Name::dotted("self.a").unwrap();
        let bound = name.bind_self(&Uri::new("ex:f"));
        assert!(!bound.contains_self());
        assert_eq!(bound.first(), &Segment::Uri(Uri::new("ex:f")));
    }

    #[test]
    fn json_rejects_empty_segment_list() {
        let err = serde_json::from_str::<Name>("[]");
        assert!(err.is_err());
        let ok: Name = serde_json::from_str(r#"[{"symbol":"a"},"self_ref"]"#).unwrap();
        assert_eq!(ok, Name::dotted("a.self").unwrap());
    }
}
