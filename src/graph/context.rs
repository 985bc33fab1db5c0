//! Key/value views over a relation store.
//!
//! A [`Context`] rooted at `r` stores the binding `key → value` as the triple
//! `(r, key, value)`. Putting a key again replaces the earlier value; distinct
//! keys accumulate. Hierarchical bindings either use a child context (its own
//! root derived from the parent) or a dotted path key.

use crate::value::{Uri, Value};

use super::{Pattern, RelationStore, Triple};

/// Delimiter between a context root and a child key.
pub const CHILD_DELIMITER: &str = "/";

/// Delimiter joining path segments into a single key.
pub const PATH_DELIMITER: &str = ".";

/// A namespace scope addressable as a subject in a relation store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Context {
    root: Uri,
}

impl Context {
    pub fn new(root: Uri) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Uri {
        &self.root
    }

    /// The sub-context for `key`, rooted at `root/key`.
    pub fn child(&self, key: &str) -> Context {
        Context::new(self.root.extend(CHILD_DELIMITER, key))
    }

    /// Look up a single key.
    pub fn get(&self, store: &RelationStore, key: &str) -> Option<Value> {
        store
            .find(&self.pattern(key))
            .into_iter()
            .next_back()
            .map(|t| t.object)
    }

    /// Whether `key` is bound.
    pub fn contains(&self, store: &RelationStore, key: &str) -> bool {
        store.contains(&self.pattern(key))
    }

    /// Bind `key` to `value`, replacing any earlier binding.
    pub fn put(&self, store: &mut RelationStore, key: &str, value: impl Into<Value>) {
        store.remove_matching(&self.pattern(key));
        store.insert(Triple::new(self.root.clone(), Uri::new(key), value));
    }

    /// Remove a binding. Returns whether anything was bound.
    pub fn remove(&self, store: &mut RelationStore, key: &str) -> bool {
        store.remove_matching(&self.pattern(key)) > 0
    }

    /// Look up a hierarchical key given as segments.
    pub fn get_path(&self, store: &RelationStore, path: &[&str]) -> Option<Value> {
        self.get(store, &path.join(PATH_DELIMITER))
    }

    /// Bind a hierarchical key given as segments.
    pub fn put_path(&self, store: &mut RelationStore, path: &[&str], value: impl Into<Value>) {
        self.put(store, &path.join(PATH_DELIMITER), value);
    }

    /// Every binding in this context, in insertion order.
    pub fn entries(&self, store: &RelationStore) -> Vec<(String, Value)> {
        store
            .find(&Pattern::any().with_subject(self.root.clone()))
            .into_iter()
            .map(|t| (t.predicate.as_str().to_string(), t.object))
            .collect()
    }

    fn pattern(&self, key: &str) -> Pattern {
        Pattern::any()
            .with_subject(self.root.clone())
            .with_predicate(Uri::new(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> Context {
        Context::new(Uri::new("motif:symbols"))
    }

    #[test]
    fn put_and_get() {
        let mut store = RelationStore::new();
        let c = ctx();
        c.put(&mut store, "x", 5i64);
        assert_eq!(c.get(&store, "x"), Some(Value::from(5i64)));
        assert!(c.get(&store, "y").is_none());
    }

    #[test]
    fn last_write_wins() {
        let mut store = RelationStore::new();
        let c = ctx();
        c.put(&mut store, "x", 1i64);
        c.put(&mut store, "x", 2i64);
        assert_eq!(c.get(&store, "x"), Some(Value::from(2i64)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn distinct_keys_accumulate() {
        let mut store = RelationStore::new();
        let c = ctx();
        c.put(&mut store, "x", 1i64);
        c.put(&mut store, "y", 2i64);
        let entries = c.entries(&store);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, "x");
        assert_eq!(entries[1].0, "y");
    }

    #[test]
    fn child_contexts_are_isolated() {
        let mut store = RelationStore::new();
        let parent = ctx();
        let child = parent.child("t");
        assert_eq!(child.root().as_str(), "motif:symbols/t");

        parent.put(&mut store, "x", 1i64);
        child.put(&mut store, "x", 2i64);
        assert_eq!(parent.get(&store, "x"), Some(Value::from(1i64)));
        assert_eq!(child.get(&store, "x"), Some(Value::from(2i64)));
    }

    #[test]
    fn path_keys() {
        let mut store = RelationStore::new();
        let c = ctx();
        c.put_path(&mut store, &["a", "b", "c"], Uri::new("ex:abc"));
        assert_eq!(c.get(&store, "a.b.c"), Some(Value::Uri(Uri::new("ex:abc"))));
        assert_eq!(
            c.get_path(&store, &["a", "b", "c"]),
            Some(Value::Uri(Uri::new("ex:abc")))
        );
        assert!(c.get_path(&store, &["a", "b"]).is_none());
    }

    #[test]
    fn remove_binding() {
        let mut store = RelationStore::new();
        let c = ctx();
        c.put(&mut store, "x", 1i64);
        assert!(c.remove(&mut store, "x"));
        assert!(!c.contains(&store, "x"));
        assert!(!c.remove(&mut store, "x"));
    }
}
