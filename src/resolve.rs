//! Name resolution: dotted names to identifiers or literals.
//!
//! Resolution order is fixed:
//!
//! 1. `self` segments are bound to the current self (or the whole name is
//!    [`Resolution::Unresolved`] outside any expansion).
//! 2. The longest run of leading symbols bound in the symbol context wins;
//!    unmatched trailing segments are concatenated onto the bound identifier.
//! 3. A leading identifier segment is used as-is as the namespace.
//! 4. A `pfx:local` first segment is expanded through the prefix table.
//! 5. Otherwise the default prefix's namespace (or the empty string) is the
//!    namespace and every segment is concatenated onto it.
//!
//! Concatenation never inserts a delimiter.

use crate::error::ResolveError;
use crate::graph::{Context, RelationStore};
use crate::name::{Name, Segment};
use crate::value::{Uri, Value};

/// Result type for resolution.
pub type ResolveResult<T> = std::result::Result<T, ResolveError>;

/// Outcome of resolving a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Value(Value),
    /// Mentions `self` where no expansion is being evaluated.
    Unresolved,
}

/// Read-only view of everything resolution needs.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    pub bindings: &'a RelationStore,
    pub symbols: &'a Context,
    pub prefixes: &'a Context,
    pub default_namespace: Option<&'a Uri>,
    /// Identity of the expansion being evaluated.
    pub current_self: Option<&'a Uri>,
}

impl<'a> Resolver<'a> {
    /// Resolve `name` to a value, or report that its `self` is unbound.
    pub fn resolve(&self, name: &Name) -> ResolveResult<Resolution> {
        let bound;
        let name = if name.contains_self() {
            match self.current_self {
                Some(me) => {
                    bound = name.bind_self(me);
                    &bound
                }
                None => return Ok(Resolution::Unresolved),
            }
        } else {
            name
        };

        let segments = name.segments();
        if let [Segment::Uri(uri)] = segments {
            return Ok(Resolution::Value(Value::Uri(uri.clone())));
        }

        if let Some(value) = self.longest_bound_prefix(segments)? {
            return Ok(Resolution::Value(value));
        }

        let namespace = match name.first() {
            Segment::Uri(uri) => {
                return Ok(Resolution::Value(Value::Uri(concat(uri, &segments[1..]))));
            }
            Segment::Symbol(symbol) => match symbol.split_once(':') {
                Some((prefix, local)) => {
                    let ns = self.expand_prefix(prefix)?.extend("", local);
                    return Ok(Resolution::Value(Value::Uri(concat(&ns, &segments[1..]))));
                }
                None => self.default_namespace.cloned().unwrap_or_else(Uri::empty),
            },
            // Bound above.
            Segment::SelfRef => return Ok(Resolution::Unresolved),
        };
        Ok(Resolution::Value(Value::Uri(concat(&namespace, segments))))
    }

    /// Resolve a name that must denote a resource.
    ///
    /// `Ok(None)` means the name mentions an unbound `self`.
    pub fn resolve_uri(&self, name: &Name, context: &str) -> ResolveResult<Option<Uri>> {
        match self.resolve(name)? {
            Resolution::Value(Value::Uri(uri)) => Ok(Some(uri)),
            Resolution::Value(other) => Err(ResolveError::TypeMismatch {
                context: context.to_string(),
                expected: "resource",
                found: other.kind().to_string(),
            }),
            Resolution::Unresolved => Ok(None),
        }
    }

    /// The namespace bound to `prefix`.
    pub fn expand_prefix(&self, prefix: &str) -> ResolveResult<Uri> {
        match self.prefixes.get(self.bindings, prefix) {
            Some(Value::Uri(ns)) => Ok(ns),
            Some(other) => Err(ResolveError::TypeMismatch {
                context: format!("prefix \"{prefix}\""),
                expected: "resource",
                found: other.kind().to_string(),
            }),
            None => Err(ResolveError::UnboundPrefix {
                prefix: prefix.to_string(),
            }),
        }
    }

    /// Try the leading run of bare symbols as lookup keys, longest first.
    fn longest_bound_prefix(&self, segments: &[Segment]) -> ResolveResult<Option<Value>> {
        let symbols: Vec<&str> = segments
            .iter()
            .map_while(|s| match s {
                Segment::Symbol(sym) => Some(sym.as_str()),
                _ => None,
            })
            .collect();

        for k in (1..=symbols.len()).rev() {
            let key = symbols[..k].join(crate::graph::context::PATH_DELIMITER);
            let Some(value) = self.symbols.get(self.bindings, &key) else {
                continue;
            };
            if k == segments.len() {
                return Ok(Some(value));
            }
            return match value {
                Value::Uri(ns) => Ok(Some(Value::Uri(concat(&ns, &segments[k..])))),
                other => Err(ResolveError::TypeMismatch {
                    context: format!("namespace binding \"{key}\""),
                    expected: "resource",
                    found: other.kind().to_string(),
                }),
            };
        }
        Ok(None)
    }
}

/// Concatenate segment texts onto `base` with no delimiter.
fn concat(base: &Uri, rest: &[Segment]) -> Uri {
    rest.iter()
        .filter_map(Segment::text)
        .fold(base.clone(), |acc, seg| acc.extend("", seg))
}
