//! The interpreter environment: all state a program reads and writes.
//!
//! An [`Environment`] owns the committed relation store, the symbol and
//! prefix tables (both [`Context`] views over a separate bindings store), the
//! template table, the extension registry and the current-self stack. It is
//! passed explicitly by `&mut`; nothing is global.
//!
//! [`Environment::interpret`] runs forms one at a time. A failing form is
//! logged and recorded, and the remaining forms still run. Each expansion is
//! committed all-or-nothing after its validators pass.

use std::ops::{Deref, DerefMut};
use std::path::Path;
use std::rc::Rc;

use crate::ast::{Expr, Form, Location, Template, TripleLiteral};
use crate::config::EnvironmentConfig;
use crate::error::{EnvironmentError, MotifError, MotifResult, ResolveError, TemplateError};
use crate::export::{self, SerializeFormat};
use crate::extension::{ExtensionRegistry, SymbolView, ValidatorFactory};
use crate::graph::{Context, Pattern, RelationStore, Triple};
use crate::name::{Name, Segment};
use crate::resolve::{Resolution, Resolver};
use crate::template::TemplateTable;
use crate::template::expand::{self, Expanded};
use crate::value::{Uri, Value};

/// Root of the symbol table context.
pub const SYMBOLS_ROOT: &str = "motif:symbols";

/// Root of the prefix table context.
pub const PREFIXES_ROOT: &str = "motif:prefixes";

/// Supplies the forms of an imported program.
///
/// The interpreter does not read files itself; hosts decide what a path means.
pub trait ImportResolver {
    fn forms(&self, path: &str) -> Result<Vec<Form>, String>;
}

/// A form that failed during [`Environment::interpret`].
#[derive(Debug)]
pub struct FormFailure {
    /// Position of the form in the interpreted slice.
    pub index: usize,
    /// Import path the form came from; `None` for forms passed in directly.
    pub import: Option<String>,
    pub location: Location,
    pub error: MotifError,
}

/// One entry of the current-self stack.
#[derive(Debug)]
struct SelfFrame {
    identity: Uri,
    /// Anonymous children created so far.
    anonymous: usize,
}

/// Keeps an expansion's identity on the current-self stack.
///
/// Dropping the guard pops the frame, so early returns and `?` restore the
/// previous self.
pub(crate) struct SelfGuard<'e> {
    env: &'e mut Environment,
}

impl Deref for SelfGuard<'_> {
    type Target = Environment;

    fn deref(&self) -> &Environment {
        self.env
    }
}

impl DerefMut for SelfGuard<'_> {
    fn deref_mut(&mut self) -> &mut Environment {
        self.env
    }
}

impl Drop for SelfGuard<'_> {
    fn drop(&mut self) {
        self.env.self_stack.pop();
    }
}

/// Interpreter state.
pub struct Environment {
    config: EnvironmentConfig,
    /// Committed triples.
    graph: RelationStore,
    /// Backing store of the symbol and prefix contexts.
    bindings: RelationStore,
    symbols: Context,
    prefixes: Context,
    default_prefix: Option<String>,
    default_namespace: Option<Uri>,
    templates: TemplateTable,
    extensions: ExtensionRegistry,
    self_stack: Vec<SelfFrame>,
    /// Top-level anonymous expansions created so far.
    anonymous: usize,
    importer: Option<Box<dyn ImportResolver>>,
    /// Paths currently being imported, innermost last.
    importing: Vec<String>,
    failures: Vec<FormFailure>,
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("triples", &self.graph.len())
            .field("bindings", &self.bindings.len())
            .field("templates", &self.templates.len())
            .field("extensions", &self.extensions.len())
            .field("default_prefix", &self.default_prefix)
            .field("self_depth", &self.self_stack.len())
            .finish()
    }
}

impl Environment {
    /// Create an environment, binding the configured prefixes.
    pub fn new(config: EnvironmentConfig) -> MotifResult<Self> {
        config.validate()?;

        let extensions = if config.builtin_extensions {
            ExtensionRegistry::with_builtins()
        } else {
            ExtensionRegistry::new()
        };

        let mut env = Self {
            graph: RelationStore::new(),
            bindings: RelationStore::new(),
            symbols: Context::new(Uri::new(SYMBOLS_ROOT)),
            prefixes: Context::new(Uri::new(PREFIXES_ROOT)),
            default_prefix: None,
            default_namespace: None,
            templates: TemplateTable::new(),
            extensions,
            self_stack: Vec::new(),
            anonymous: 0,
            importer: None,
            importing: Vec::new(),
            failures: Vec::new(),
            config,
        };

        let prefixes: Vec<(String, Uri)> = env
            .config
            .prefixes
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for (symbol, namespace) in prefixes {
            env.bind_prefix(&symbol, namespace)?;
        }
        if let Some(symbol) = env.config.default_prefix.clone() {
            env.set_default_prefix(&symbol)?;
        }

        tracing::info!(
            prefixes = env.config.prefixes.len(),
            extensions = env.extensions.len(),
            "environment created"
        );
        Ok(env)
    }

    // -----------------------------------------------------------------------
    // Evaluation
    // -----------------------------------------------------------------------

    /// Evaluate every form in order and return the last value produced.
    ///
    /// A failing form does not stop the run: its error is logged and kept
    /// for [`take_failures`](Self::take_failures).
    pub fn interpret(&mut self, forms: &[Form]) -> Option<Value> {
        let mut last = None;
        for (index, form) in forms.iter().enumerate() {
            match self.evaluate(form) {
                Ok(Some(value)) => last = Some(value),
                Ok(None) => {}
                Err(error) => {
                    let import = self.importing.last().cloned();
                    tracing::warn!(
                        index,
                        import = import.as_deref(),
                        location = %form.location(),
                        error = %error,
                        "form failed, continuing with the next one"
                    );
                    self.failures.push(FormFailure {
                        index,
                        import,
                        location: form.location().clone(),
                        error,
                    });
                }
            }
        }
        last
    }

    /// Evaluate a single form.
    pub fn evaluate(&mut self, form: &Form) -> MotifResult<Option<Value>> {
        match form {
            Form::Assignment { name, value, .. } => self.assign(name, value).map(Some),
            Form::Template(template) => self.define(template).map(|id| Some(Value::Uri(id))),
            Form::Expansion(expansion) => {
                let Expanded { identity, triples } = expand::evaluate(self, expansion)?;
                self.commit(&identity, triples);
                Ok(Some(Value::Uri(identity)))
            }
            Form::Triple(literal) => self.triple_literal(literal).map(Some),
            Form::Prefix {
                symbol, namespace, ..
            } => {
                self.bind_prefix(symbol, namespace.clone())?;
                Ok(Some(Value::Uri(namespace.clone())))
            }
            Form::DefaultPrefix { symbol, .. } => {
                self.set_default_prefix(symbol)?;
                Ok(None)
            }
            Form::Import { path, .. } => self.import(path),
        }
    }

    fn assign(&mut self, name: &Name, value: &Expr) -> MotifResult<Value> {
        let key = symbol_key(name)?;
        let mut staged = Vec::new();
        let value = match value {
            // `f = t()` names the expansion `f`.
            Expr::Expansion(expansion) if expansion.name.is_none() => {
                let mut named = (**expansion).clone();
                named.name = Some(name.clone());
                self.top_level_expansion(&Expr::expansion(named), &mut staged)?
            }
            other => self.top_level_value(other, &mut staged)?,
        };

        if let Some(existing) = self.symbols.get(&self.bindings, &key) {
            if existing != value {
                return Err(EnvironmentError::DuplicateBinding {
                    kind: "symbol",
                    name: key,
                    existing: existing.to_string(),
                    attempted: value.to_string(),
                }
                .into());
            }
        }

        for (identity, triples) in staged {
            self.commit(&identity, triples);
        }
        self.symbols.put(&mut self.bindings, &key, value.clone());
        tracing::debug!(name = %key, value = %value, "bound symbol");
        Ok(value)
    }

    /// Parameterise and register a template under its resolved name.
    fn define(&mut self, template: &Template) -> MotifResult<Uri> {
        let id = self
            .resolver()
            .resolve_uri(&template.name, "template name")?
            .ok_or_else(|| ResolveError::UnboundSelf {
                name: template.name.to_string(),
            })?;
        let mut template = template.clone();
        template.parameterise();
        let parameters = template.parameters.len();
        let has_base = template.base.is_some();
        self.templates.register(id.clone(), template)?;
        tracing::info!(template = %id, parameters, has_base, "registered template");
        Ok(id)
    }

    fn triple_literal(&mut self, literal: &TripleLiteral) -> MotifResult<Value> {
        let mut staged = Vec::new();
        let subject = expect_uri(self.top_level_value(&literal.subject, &mut staged)?, "subject")?;
        let predicate =
            expect_uri(self.top_level_value(&literal.predicate, &mut staged)?, "predicate")?;
        let object = self.top_level_value(&literal.object, &mut staged)?;

        for (identity, triples) in staged {
            self.commit(&identity, triples);
        }
        self.graph
            .insert(Triple::new(subject.clone(), predicate, object));
        Ok(Value::Uri(subject))
    }

    /// Evaluate an expression outside any expansion.
    ///
    /// Nested expansions are evaluated but not committed; their output is
    /// pushed to `staged` so the caller can commit once everything succeeded.
    fn top_level_value(
        &mut self,
        expr: &Expr,
        staged: &mut Vec<(Uri, Vec<Triple>)>,
    ) -> MotifResult<Value> {
        match expr {
            Expr::Literal(lit) => Ok(Value::Literal(lit.clone())),
            Expr::Name(name) => match self.resolver().resolve(name)? {
                Resolution::Value(v) => Ok(v),
                Resolution::Unresolved => Err(ResolveError::UnboundSelf {
                    name: name.to_string(),
                }
                .into()),
            },
            Expr::Param(p) => Err(TemplateError::UnboundParameter {
                name: p.name.clone(),
                position: p.position,
            }
            .into()),
            Expr::Expansion(_) => self.top_level_expansion(expr, staged),
        }
    }

    fn top_level_expansion(
        &mut self,
        expr: &Expr,
        staged: &mut Vec<(Uri, Vec<Triple>)>,
    ) -> MotifResult<Value> {
        let Expr::Expansion(expansion) = expr else {
            return self.top_level_value(expr, staged);
        };
        let Expanded { identity, triples } = expand::evaluate(self, expansion)?;
        staged.push((identity.clone(), triples));
        Ok(Value::Uri(identity))
    }

    fn commit(&mut self, identity: &Uri, triples: Vec<Triple>) {
        let count = self.graph.extend(triples);
        tracing::debug!(
            identity = %identity,
            count,
            total = self.graph.len(),
            "committed expansion"
        );
    }

    fn import(&mut self, path: &str) -> MotifResult<Option<Value>> {
        let Some(importer) = &self.importer else {
            tracing::warn!(path, "no import resolver installed, skipping import");
            return Ok(None);
        };
        if self.importing.iter().any(|p| p == path) {
            return Err(EnvironmentError::Import {
                path: path.to_string(),
                message: format!("import cycle: {} -> {path}", self.importing.join(" -> ")),
            }
            .into());
        }
        let forms = importer
            .forms(path)
            .map_err(|message| EnvironmentError::Import {
                path: path.to_string(),
                message,
            })?;
        tracing::debug!(path, forms = forms.len(), "importing");
        self.importing.push(path.to_string());
        let last = self.interpret(&forms);
        self.importing.pop();
        Ok(last)
    }

    // -----------------------------------------------------------------------
    // Prefixes
    // -----------------------------------------------------------------------

    /// Bind `symbol` to `namespace` in the prefix table.
    ///
    /// Rebinding to the same namespace is a no-op; to a different one, an error.
    pub fn bind_prefix(&mut self, symbol: &str, namespace: Uri) -> MotifResult<()> {
        if let Some(existing) = self.prefixes.get(&self.bindings, symbol) {
            if existing == Value::Uri(namespace.clone()) {
                return Ok(());
            }
            return Err(EnvironmentError::DuplicateBinding {
                kind: "prefix",
                name: symbol.to_string(),
                existing: existing.to_string(),
                attempted: namespace.to_string(),
            }
            .into());
        }
        self.prefixes.put(&mut self.bindings, symbol, namespace);
        Ok(())
    }

    /// Resolve unbound names under `symbol`'s namespace from now on.
    pub fn set_default_prefix(&mut self, symbol: &str) -> MotifResult<()> {
        let namespace = self.resolver().expand_prefix(symbol)?;
        tracing::debug!(prefix = symbol, namespace = %namespace, "default prefix set");
        self.default_prefix = Some(symbol.to_string());
        self.default_namespace = Some(namespace);
        Ok(())
    }

    pub fn prefix(&self, symbol: &str) -> Option<Uri> {
        match self.prefixes.get(&self.bindings, symbol) {
            Some(Value::Uri(ns)) => Some(ns),
            _ => None,
        }
    }

    pub fn default_prefix(&self) -> Option<&str> {
        self.default_prefix.as_deref()
    }

    pub fn default_namespace(&self) -> Option<&Uri> {
        self.default_namespace.as_ref()
    }

    // -----------------------------------------------------------------------
    // Store access
    // -----------------------------------------------------------------------

    /// Insert triples directly, bypassing templates and validation.
    pub fn add_triples(&mut self, triples: impl IntoIterator<Item = Triple>) -> usize {
        self.graph.extend(triples)
    }

    /// Committed triples in insertion order.
    pub fn triples(&self) -> impl Iterator<Item = &Triple> {
        self.graph.iter()
    }

    pub fn triple_count(&self) -> usize {
        self.graph.len()
    }

    pub fn find(&self, pattern: &Pattern) -> Vec<Triple> {
        self.graph.find(pattern)
    }

    /// Render the committed triples.
    pub fn serialize(&self, format: SerializeFormat) -> MotifResult<String> {
        Ok(export::serialize(self.graph.iter(), format)?)
    }

    /// Render the committed triples into a file.
    pub fn export_to(&self, path: &Path, format: SerializeFormat) -> MotifResult<()> {
        Ok(export::write_to(path, self.graph.iter(), format)?)
    }

    // -----------------------------------------------------------------------
    // Extensions and imports
    // -----------------------------------------------------------------------

    pub fn register_extension(&mut self, name: &str, factory: ValidatorFactory) -> MotifResult<()> {
        self.extensions.register(name, factory)?;
        tracing::info!(extension = name, "registered extension");
        Ok(())
    }

    pub fn register_extension_alias(&mut self, alias: &str, target: &str) -> MotifResult<()> {
        Ok(self.extensions.register_alias(alias, target)?)
    }

    pub fn extensions(&self) -> &ExtensionRegistry {
        &self.extensions
    }

    pub fn set_import_resolver(&mut self, resolver: impl ImportResolver + 'static) {
        self.importer = Some(Box::new(resolver));
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    /// Value bound to a symbol key such as `a` or `a.b`.
    pub fn lookup_symbol(&self, key: &str) -> Option<Value> {
        self.symbols.get(&self.bindings, key)
    }

    /// Resolve a name in the current scope.
    pub fn resolve(&self, name: &Name) -> MotifResult<Resolution> {
        Ok(self.resolver().resolve(name)?)
    }

    /// The registered template a dotted name refers to.
    pub fn template(&self, name: &str) -> Option<Rc<Template>> {
        let name = Name::dotted(name)?;
        let id = self.resolver().resolve_uri(&name, "template name").ok()??;
        self.templates.get(&id)
    }

    /// Identifiers of every registered template, in registration order.
    pub fn template_names(&self) -> &[Uri] {
        self.templates.ids()
    }

    /// Identity of the expansion being evaluated, if any.
    pub fn current_self(&self) -> Option<&Uri> {
        self.self_stack.last().map(|f| &f.identity)
    }

    pub fn config(&self) -> &EnvironmentConfig {
        &self.config
    }

    /// Failures recorded by [`interpret`](Self::interpret) since the last call.
    pub fn take_failures(&mut self) -> Vec<FormFailure> {
        std::mem::take(&mut self.failures)
    }

    // -----------------------------------------------------------------------
    // Engine hooks
    // -----------------------------------------------------------------------

    pub(crate) fn resolver(&self) -> Resolver<'_> {
        Resolver {
            bindings: &self.bindings,
            symbols: &self.symbols,
            prefixes: &self.prefixes,
            default_namespace: self.default_namespace.as_ref(),
            current_self: self.current_self(),
        }
    }

    pub(crate) fn template_table(&self) -> &TemplateTable {
        &self.templates
    }

    pub(crate) fn symbol_view(&self) -> SymbolView<'_> {
        SymbolView::new(&self.bindings, &self.symbols, &self.templates)
    }

    /// Push `identity` as the current self until the guard drops.
    pub(crate) fn enter_self(
        &mut self,
        identity: Uri,
    ) -> crate::template::TemplateResult<SelfGuard<'_>> {
        let max_depth = self.config.max_expansion_depth;
        if self.self_stack.len() >= max_depth {
            return Err(TemplateError::DepthExceeded { max_depth });
        }
        self.self_stack.push(SelfFrame {
            identity,
            anonymous: 0,
        });
        Ok(SelfGuard { env: self })
    }

    /// A fresh identity for an anonymous expansion in the current scope.
    ///
    /// Inside an expansion it extends the current self with the configured
    /// delimiter; at top level it is minted in the default namespace.
    pub(crate) fn anonymous_identity(&mut self) -> Uri {
        let stem = &self.config.anonymous_stem;
        match self.self_stack.last_mut() {
            Some(frame) => {
                let local = format!("{stem}{}", frame.anonymous);
                frame.anonymous += 1;
                frame.identity.extend(&self.config.anonymous_delimiter, &local)
            }
            None => {
                let local = format!("{stem}{}", self.anonymous);
                self.anonymous += 1;
                let namespace = self.default_namespace.clone().unwrap_or_else(Uri::empty);
                namespace.extend("", &local)
            }
        }
    }
}

/// The symbol-table key of an assignment target.
fn symbol_key(name: &Name) -> MotifResult<String> {
    let parts = name
        .segments()
        .iter()
        .map(|s| match s {
            Segment::Symbol(sym) => Some(sym.as_str()),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| ResolveError::TypeMismatch {
            context: format!("assignment target \"{name}\""),
            expected: "symbol",
            found: "resource or self".into(),
        })?;
    Ok(parts.join(crate::graph::context::PATH_DELIMITER))
}

fn expect_uri(value: Value, context: &str) -> MotifResult<Uri> {
    match value {
        Value::Uri(uri) => Ok(uri),
        other => Err(ResolveError::TypeMismatch {
            context: context.to_string(),
            expected: "resource",
            found: other.kind().to_string(),
        }
        .into()),
    }
}
