//! Extensions: validators that gate the commit of an expansion's triples.
//!
//! A validator receives a [`TriplePack`] and either passes it through
//! (possibly filtered or transformed) or fails with a diagnosable reason.
//! Validators are built by name from the [`ExtensionRegistry`], which is
//! pluggable: hosts register their own factories next to the bundled ones.
//!
//! ## Bundled validators
//!
//! - **AtLeastOne** / **AtMostOne** / **ExactlyOne** / **ExactlyN**: cardinality checks
//! - **Exclude**: drops every triple with a given predicate
//! - **And** (alias `All`) / **Or** (alias `Any`): combinators

pub mod cardinality;
pub mod combinators;

use std::collections::HashMap;
use std::fmt;

use crate::error::ExtensionError;
use crate::graph::{Context, RelationStore, Triple};
use crate::template::TemplateTable;
use crate::value::{Uri, Value};

/// Result type for extension operations.
pub type ExtensionResult<T> = std::result::Result<T, ExtensionError>;

// ---------------------------------------------------------------------------
// Triple packs
// ---------------------------------------------------------------------------

/// Read-only access to the environment's symbol and template tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymbolView<'e> {
    symbols: Option<(&'e RelationStore, &'e Context)>,
    templates: Option<&'e TemplateTable>,
}

impl<'e> SymbolView<'e> {
    pub fn new(
        bindings: &'e RelationStore,
        symbols: &'e Context,
        templates: &'e TemplateTable,
    ) -> Self {
        Self {
            symbols: Some((bindings, symbols)),
            templates: Some(templates),
        }
    }

    /// A view with no tables behind it.
    pub fn detached() -> Self {
        Self::default()
    }

    /// Value bound to a symbol key such as `a` or `a.b`.
    pub fn lookup_symbol(&self, key: &str) -> Option<Value> {
        let (store, ctx) = self.symbols?;
        ctx.get(store, key)
    }

    pub fn has_template(&self, id: &Uri) -> bool {
        self.templates.is_some_and(|t| t.contains(id))
    }
}

/// The triples one expansion produced, plus read-only environment access.
///
/// Exists only while extensions run; never persisted.
#[derive(Debug, Clone)]
pub struct TriplePack<'e> {
    focus: Uri,
    triples: Vec<Triple>,
    view: SymbolView<'e>,
}

impl<'e> TriplePack<'e> {
    pub fn new(focus: Uri, triples: Vec<Triple>, view: SymbolView<'e>) -> Self {
        Self {
            focus,
            triples,
            view,
        }
    }

    /// A pack with no environment behind it.
    pub fn detached(focus: Uri, triples: Vec<Triple>) -> Self {
        Self::new(focus, triples, SymbolView::detached())
    }

    /// Identity of the expansion that produced the pack.
    pub fn focus(&self) -> &Uri {
        &self.focus
    }

    pub fn triples(&self) -> &[Triple] {
        &self.triples
    }

    pub fn into_triples(self) -> Vec<Triple> {
        self.triples
    }

    pub fn symbols(&self) -> &SymbolView<'e> {
        &self.view
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// The focus followed by every other subject, in first-seen order.
    pub fn subjects(&self) -> Vec<&Uri> {
        let mut seen = vec![&self.focus];
        for t in &self.triples {
            if !seen.contains(&&t.subject) {
                seen.push(&t.subject);
            }
        }
        seen
    }

    /// Triples matching `(_, predicate, _)`.
    pub fn with_predicate<'a>(&'a self, predicate: &'a Uri) -> impl Iterator<Item = &'a Triple> {
        self.triples.iter().filter(move |t| t.predicate == *predicate)
    }

    /// Number of triples matching `(subject, predicate, _)`.
    pub fn count_for(&self, subject: &Uri, predicate: &Uri) -> usize {
        self.with_predicate(predicate)
            .filter(|t| t.subject == *subject)
            .count()
    }

    /// Keep only triples satisfying `keep`.
    pub fn retain(mut self, keep: impl FnMut(&Triple) -> bool) -> Self {
        self.triples.retain(keep);
        self
    }
}

// ---------------------------------------------------------------------------
// Core trait
// ---------------------------------------------------------------------------

/// A post-condition over an expansion's triples.
pub trait Validator: fmt::Debug {
    /// Name used in failure diagnostics.
    fn name(&self) -> &str;

    /// Pass the pack through (possibly transformed) or reject it.
    fn validate<'e>(&self, pack: TriplePack<'e>) -> ExtensionResult<TriplePack<'e>>;
}

/// An already-resolved argument handed to a validator factory.
#[derive(Debug)]
pub enum ValidatorArg {
    Value(Value),
    Validator(Box<dyn Validator>),
}

impl ValidatorArg {
    /// The argument as a resource identifier.
    pub fn into_uri(self, validator: &str) -> ExtensionResult<Uri> {
        match self {
            ValidatorArg::Value(Value::Uri(uri)) => Ok(uri),
            other => Err(invalid(
                validator,
                format!("expected a resource, got {}", other.describe()),
            )),
        }
    }

    /// The argument as a non-negative count.
    pub fn into_count(self, validator: &str) -> ExtensionResult<usize> {
        match self {
            ValidatorArg::Value(Value::Literal(lit)) => lit
                .as_integer()
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| {
                    invalid(validator, format!("expected a non-negative integer, got {lit}"))
                }),
            other => Err(invalid(
                validator,
                format!("expected an integer, got {}", other.describe()),
            )),
        }
    }

    /// The argument as a nested validator.
    pub fn into_validator(self, validator: &str) -> ExtensionResult<Box<dyn Validator>> {
        match self {
            ValidatorArg::Validator(v) => Ok(v),
            other => Err(invalid(
                validator,
                format!("expected a validator, got {}", other.describe()),
            )),
        }
    }

    fn describe(&self) -> String {
        match self {
            ValidatorArg::Value(v) => v.to_string(),
            ValidatorArg::Validator(v) => format!("validator {}", v.name()),
        }
    }
}

pub(crate) fn invalid(validator: &str, message: String) -> ExtensionError {
    ExtensionError::InvalidArguments {
        validator: validator.to_string(),
        message,
    }
}

/// Exactly `N` arguments or an `InvalidArguments` error.
pub(crate) fn exact_args<const N: usize>(
    validator: &str,
    args: Vec<ValidatorArg>,
) -> ExtensionResult<[ValidatorArg; N]> {
    let got = args.len();
    args.try_into()
        .map_err(|_| invalid(validator, format!("expected {N} argument(s), got {got}")))
}

/// A fully resolved `@extension` declaration, ready to instantiate.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatorInvocation {
    pub name: String,
    pub arguments: Vec<InvocationArg>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InvocationArg {
    Value(Value),
    Invocation(ValidatorInvocation),
}

/// Run `validators` in order, each on the previous one's output.
pub fn validate<'e>(
    pack: TriplePack<'e>,
    validators: &[Box<dyn Validator>],
) -> ExtensionResult<TriplePack<'e>> {
    validators
        .iter()
        .try_fold(pack, |pack, v| v.validate(pack))
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Builds a validator from its arguments.
pub type ValidatorFactory = fn(Vec<ValidatorArg>) -> ExtensionResult<Box<dyn Validator>>;

/// Validator factories by name and alias.
#[derive(Debug, Default, Clone)]
pub struct ExtensionRegistry {
    factories: Vec<(String, ValidatorFactory)>,
    /// Index: name or alias → position in `factories`.
    name_index: HashMap<String, usize>,
}

impl ExtensionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the bundled validators.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        let builtins: [(&str, ValidatorFactory); 7] = [
            ("AtLeastOne", cardinality::at_least_one),
            ("AtMostOne", cardinality::at_most_one),
            ("ExactlyOne", cardinality::exactly_one),
            ("ExactlyN", cardinality::exactly_n),
            ("Exclude", cardinality::exclude),
            ("And", combinators::and),
            ("Or", combinators::or),
        ];
        for (name, factory) in builtins {
            let registered = registry.register(name, factory);
            debug_assert!(registered.is_ok(), "builtin validator {name} registered twice");
        }
        for (alias, target) in [("All", "And"), ("Any", "Or")] {
            let aliased = registry.register_alias(alias, target);
            debug_assert!(aliased.is_ok(), "builtin alias {alias} rejected");
        }
        registry
    }

    /// Register a factory. Errors if the name is taken by a name or alias.
    pub fn register(&mut self, name: &str, factory: ValidatorFactory) -> ExtensionResult<()> {
        if self.name_index.contains_key(name) {
            return Err(ExtensionError::Duplicate {
                name: name.to_string(),
            });
        }
        let idx = self.factories.len();
        self.name_index.insert(name.to_string(), idx);
        self.factories.push((name.to_string(), factory));
        Ok(())
    }

    /// Make `alias` refer to the factory registered as `target`.
    pub fn register_alias(&mut self, alias: &str, target: &str) -> ExtensionResult<()> {
        if self.name_index.contains_key(alias) {
            return Err(ExtensionError::Duplicate {
                name: alias.to_string(),
            });
        }
        let idx = *self
            .name_index
            .get(target)
            .ok_or_else(|| ExtensionError::UnknownValidator {
                name: target.to_string(),
            })?;
        self.name_index.insert(alias.to_string(), idx);
        Ok(())
    }

    /// Look up a factory by name or alias.
    pub fn get(&self, name: &str) -> Option<ValidatorFactory> {
        self.name_index.get(name).map(|&idx| self.factories[idx].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.name_index.contains_key(name)
    }

    /// Canonical names (aliases excluded), in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.factories.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Build a validator, instantiating nested invocations first.
    pub fn instantiate(
        &self,
        invocation: &ValidatorInvocation,
    ) -> ExtensionResult<Box<dyn Validator>> {
        let factory = self
            .get(&invocation.name)
            .ok_or_else(|| ExtensionError::UnknownValidator {
                name: invocation.name.clone(),
            })?;
        let args = invocation
            .arguments
            .iter()
            .map(|arg| match arg {
                InvocationArg::Value(v) => Ok(ValidatorArg::Value(v.clone())),
                InvocationArg::Invocation(inner) => {
                    self.instantiate(inner).map(ValidatorArg::Validator)
                }
            })
            .collect::<ExtensionResult<Vec<_>>>()?;
        factory(args)
    }
}
