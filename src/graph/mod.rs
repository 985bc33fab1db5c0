//! Relation store: the multiset of triples every other component reads and writes.
//!
//! - [`RelationStore`] holds committed triples with subject and predicate indexes.
//! - [`Context`] is a key/value view over a store rooted at one identifier.
//!
//! Both share the same [`Triple`] data model and wildcard [`Pattern`].

pub mod context;
pub mod store;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::{Uri, Value};

pub use context::Context;
pub use store::RelationStore;

/// A (subject, predicate, object) fact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triple {
    /// The resource the fact is about.
    pub subject: Uri,
    /// The relation.
    pub predicate: Uri,
    /// A resource or a literal.
    pub object: Value,
}

impl Triple {
    pub fn new(subject: Uri, predicate: Uri, object: impl Into<Value>) -> Self {
        Self {
            subject,
            predicate,
            object: object.into(),
        }
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.subject, self.predicate, self.object)
    }
}

/// A triple pattern where `None` matches anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pattern {
    pub subject: Option<Uri>,
    pub predicate: Option<Uri>,
    pub object: Option<Value>,
}

impl Pattern {
    /// The all-wildcard pattern.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn with_subject(mut self, subject: Uri) -> Self {
        self.subject = Some(subject);
        self
    }

    pub fn with_predicate(mut self, predicate: Uri) -> Self {
        self.predicate = Some(predicate);
        self
    }

    pub fn with_object(mut self, object: impl Into<Value>) -> Self {
        self.object = Some(object.into());
        self
    }

    /// Whether `triple` satisfies every bound position.
    pub fn matches(&self, triple: &Triple) -> bool {
        self.subject.as_ref().is_none_or(|s| *s == triple.subject)
            && self.predicate.as_ref().is_none_or(|p| *p == triple.predicate)
            && self.object.as_ref().is_none_or(|o| *o == triple.object)
    }
}
