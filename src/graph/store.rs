//! In-memory relation store with subject and predicate indexes.
//!
//! Triples live in a slot vector; removal leaves a hole so that the indexes
//! (which hold slot numbers) stay valid. Insertion order is preserved by
//! every read.

use std::collections::HashMap;

use crate::value::Uri;

use super::{Pattern, Triple};

/// Append-mostly multiset of triples.
///
/// Duplicates are kept: inserting the same triple twice stores it twice.
#[derive(Clone, Default)]
pub struct RelationStore {
    slots: Vec<Option<Triple>>,
    /// Subject → slots holding a triple with that subject.
    by_subject: HashMap<Uri, Vec<usize>>,
    /// Predicate → slots holding a triple with that predicate.
    by_predicate: HashMap<Uri, Vec<usize>>,
    len: usize,
}

impl RelationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one triple.
    pub fn insert(&mut self, triple: Triple) {
        let slot = self.slots.len();
        self.by_subject
            .entry(triple.subject.clone())
            .or_default()
            .push(slot);
        self.by_predicate
            .entry(triple.predicate.clone())
            .or_default()
            .push(slot);
        self.slots.push(Some(triple));
        self.len += 1;
    }

    /// Insert many triples. Returns how many were inserted.
    pub fn extend(&mut self, triples: impl IntoIterator<Item = Triple>) -> usize {
        let mut count = 0;
        for triple in triples {
            self.insert(triple);
            count += 1;
        }
        count
    }

    /// All triples matching `pattern`, in insertion order.
    pub fn find(&self, pattern: &Pattern) -> Vec<Triple> {
        self.matching_slots(pattern)
            .into_iter()
            .filter_map(|slot| self.slots[slot].clone())
            .collect()
    }

    /// Whether at least one triple matches `pattern`.
    pub fn contains(&self, pattern: &Pattern) -> bool {
        !self.matching_slots(pattern).is_empty()
    }

    /// Remove every triple matching `pattern`. Returns how many were removed.
    pub fn remove_matching(&mut self, pattern: &Pattern) -> usize {
        let slots = self.matching_slots(pattern);
        for &slot in &slots {
            if let Some(triple) = self.slots[slot].take() {
                unindex(&mut self.by_subject, &triple.subject, slot);
                unindex(&mut self.by_predicate, &triple.predicate, slot);
                self.len -= 1;
            }
        }
        slots.len()
    }

    /// Iterate over all live triples in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.slots.iter().filter_map(Option::as_ref)
    }

    /// Number of triples.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the store holds no triples.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Distinct subjects, in first-seen order.
    pub fn subjects(&self) -> Vec<Uri> {
        let mut seen = Vec::new();
        for triple in self.iter() {
            if !seen.contains(&triple.subject) {
                seen.push(triple.subject.clone());
            }
        }
        seen
    }

    /// Candidate slots narrowed by the most selective bound index, then
    /// filtered by the full pattern.
    fn matching_slots(&self, pattern: &Pattern) -> Vec<usize> {
        let candidates: Vec<usize> = match (&pattern.subject, &pattern.predicate) {
            (Some(s), Some(p)) => {
                let by_s = self.by_subject.get(s).map(Vec::as_slice).unwrap_or(&[]);
                let by_p = self.by_predicate.get(p).map(Vec::as_slice).unwrap_or(&[]);
                if by_s.len() <= by_p.len() {
                    by_s.to_vec()
                } else {
                    by_p.to_vec()
                }
            }
            (Some(s), None) => self.by_subject.get(s).cloned().unwrap_or_default(),
            (None, Some(p)) => self.by_predicate.get(p).cloned().unwrap_or_default(),
            (None, None) => (0..self.slots.len()).collect(),
        };

        candidates
            .into_iter()
            .filter(|&slot| {
                self.slots[slot]
                    .as_ref()
                    .is_some_and(|t| pattern.matches(t))
            })
            .collect()
    }
}

fn unindex(index: &mut HashMap<Uri, Vec<usize>>, key: &Uri, slot: usize) {
    if let Some(slots) = index.get_mut(key) {
        slots.retain(|&s| s != slot);
        if slots.is_empty() {
            index.remove(key);
        }
    }
}

impl std::fmt::Debug for RelationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelationStore")
            .field("triples", &self.len)
            .field("subjects", &self.by_subject.len())
            .field("predicates", &self.by_predicate.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn uri(s: &str) -> Uri {
        Uri::new(s)
    }

    #[test]
    fn insert_and_find() {
        let mut store = RelationStore::new();
        store.insert(Triple::new(uri("sun"), uri("is-a"), uri("star")));
        store.insert(Triple::new(uri("moon"), uri("orbits"), uri("earth")));

        assert_eq!(store.len(), 2);
        let found = store.find(&Pattern::any().with_subject(uri("sun")));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].object, Value::Uri(uri("star")));
    }

    #[test]
    fn duplicates_are_kept() {
        let mut store = RelationStore::new();
        let t = Triple::new(uri("a"), uri("x"), 1i64);
        store.insert(t.clone());
        store.insert(t.clone());
        assert_eq!(store.len(), 2);
        assert_eq!(store.find(&Pattern::any()).len(), 2);
    }

    #[test]
    fn predicate_index() {
        let mut store = RelationStore::new();
        store.insert(Triple::new(uri("a"), uri("rel"), uri("b")));
        store.insert(Triple::new(uri("a"), uri("rel"), uri("c")));
        store.insert(Triple::new(uri("a"), uri("other"), uri("c")));

        let pairs = store.find(&Pattern::any().with_predicate(uri("rel")));
        assert_eq!(pairs.len(), 2);
    }

    #[test]
    fn object_only_pattern_scans() {
        let mut store = RelationStore::new();
        store.insert(Triple::new(uri("a"), uri("r1"), uri("c")));
        store.insert(Triple::new(uri("b"), uri("r2"), uri("c")));
        store.insert(Triple::new(uri("b"), uri("r2"), 5i64));

        let to_c = store.find(&Pattern::any().with_object(uri("c")));
        assert_eq!(to_c.len(), 2);
        assert!(to_c.iter().all(|t| t.object == Value::Uri(uri("c"))));
    }

    #[test]
    fn remove_matching_keeps_order_and_indexes() {
        let mut store = RelationStore::new();
        store.insert(Triple::new(uri("a"), uri("x"), 1i64));
        store.insert(Triple::new(uri("a"), uri("y"), 2i64));
        store.insert(Triple::new(uri("b"), uri("x"), 3i64));

        let removed = store.remove_matching(&Pattern::any().with_predicate(uri("x")));
        assert_eq!(removed, 2);
        assert_eq!(store.len(), 1);
        assert!(!store.contains(&Pattern::any().with_predicate(uri("x"))));
        assert!(store.contains(&Pattern::any().with_subject(uri("a"))));

        store.insert(Triple::new(uri("c"), uri("x"), 4i64));
        let all: Vec<_> = store.iter().map(|t| t.subject.clone()).collect();
        assert_eq!(all, vec![uri("a"), uri("c")]);
    }

    #[test]
    fn subjects_in_first_seen_order() {
        let mut store = RelationStore::new();
        store.insert(Triple::new(uri("b"), uri("x"), 1i64));
        store.insert(Triple::new(uri("a"), uri("x"), 1i64));
        store.insert(Triple::new(uri("b"), uri("y"), 1i64));
        assert_eq!(store.subjects(), vec![uri("b"), uri("a")]);
    }

    #[test]
    fn empty_queries() {
        let store = RelationStore::new();
        assert!(store.is_empty());
        assert!(store.find(&Pattern::any().with_subject(uri("a"))).is_empty());
        assert!(!store.contains(&Pattern::any()));
    }
}
