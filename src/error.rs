//! Rich diagnostic error types for the motif interpreter.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text so a failing form can be reported
//! precisely while the remaining forms keep running.

use miette::Diagnostic;
use thiserror::Error;

use crate::config::ConfigError;
use crate::export::ExportError;

/// Top-level error type for the motif interpreter.
#[derive(Debug, Error, Diagnostic)]
pub enum MotifError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Extension(#[from] ExtensionError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Environment(#[from] EnvironmentError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Export(#[from] ExportError),
}

// ---------------------------------------------------------------------------
// Resolution errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ResolveError {
    #[error("prefix \"{prefix}\" has no bound namespace")]
    #[diagnostic(
        code(motif::resolve::unbound_prefix),
        help(
            "Declare the namespace before using it, e.g. `@prefix {prefix} = <http://example.org/>`. \
             Prefixes are looked up in the environment's prefix table."
        )
    )]
    UnboundPrefix { prefix: String },

    #[error("type mismatch in {context}: expected {expected}, found {found}")]
    #[diagnostic(
        code(motif::resolve::type_mismatch),
        help(
            "Subjects, predicates, template references and namespace bindings must be \
             resource identifiers. A literal cannot be used in those positions."
        )
    )]
    TypeMismatch {
        context: String,
        expected: &'static str,
        found: String,
    },

    #[error("`self` in \"{name}\" has no enclosing expansion")]
    #[diagnostic(
        code(motif::resolve::unbound_self),
        help(
            "`self` only means something inside a template or expansion body. \
             At the top level, use an explicit name instead."
        )
    )]
    UnboundSelf { name: String },
}

// ---------------------------------------------------------------------------
// Template errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum TemplateError {
    #[error("template not found: {name}")]
    #[diagnostic(
        code(motif::template::not_found),
        help(
            "No template with this name is registered at the time of expansion. \
             Define the template before the expansion that uses it."
        )
    )]
    NotFound { name: String },

    #[error("template {template} expects {expected} argument(s), got {actual}")]
    #[diagnostic(
        code(motif::template::wrong_arity),
        help("Pass exactly one argument for every declared parameter, in declaration order.")
    )]
    WrongArity {
        template: String,
        expected: usize,
        actual: usize,
    },

    #[error("template already defined: {name}")]
    #[diagnostic(
        code(motif::template::duplicate),
        help("Templates are immutable once registered. Pick a different name for the new definition.")
    )]
    Duplicate { name: String },

    #[error("parameter \"{name}\" (position {position}) was never given an argument")]
    #[diagnostic(
        code(motif::template::unbound_parameter),
        help(
            "A parameter reference survived substitution. This happens when a parameter is \
             used outside the template that declares it."
        )
    )]
    UnboundParameter { name: String, position: usize },

    #[error("inheritance cycle through template {name}")]
    #[diagnostic(
        code(motif::template::inheritance_cycle),
        help("A template's base chain leads back to itself. Break the cycle by removing one `from` clause.")
    )]
    InheritanceCycle { name: String },

    #[error("expansion depth exceeded maximum of {max_depth}")]
    #[diagnostic(
        code(motif::template::depth_exceeded),
        help(
            "Nested expansions went deeper than `max_expansion_depth`. \
             Check for templates that expand themselves, or raise the limit in the config."
        )
    )]
    DepthExceeded { max_depth: usize },
}

// ---------------------------------------------------------------------------
// Extension errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ExtensionError {
    #[error("cardinality of {predicate} on {subject}: expected {expected}, found {actual}")]
    #[diagnostic(
        code(motif::extension::cardinality),
        help("The expansion produced the wrong number of triples for this predicate. No triples were committed.")
    )]
    Cardinality {
        predicate: String,
        subject: String,
        expected: String,
        actual: usize,
    },

    #[error("validator {validator} rejected the expansion: {reason}")]
    #[diagnostic(
        code(motif::extension::validation_failed),
        help("The expansion's triples did not satisfy an attached extension. No triples were committed.")
    )]
    ValidationFailed { validator: String, reason: String },

    #[error("unknown validator: {name}")]
    #[diagnostic(
        code(motif::extension::unknown),
        help("No validator is registered under this name or alias. Register one with `register_extension`.")
    )]
    UnknownValidator { name: String },

    #[error("duplicate extension registration: {name}")]
    #[diagnostic(
        code(motif::extension::duplicate),
        help("A validator with this name or alias is already registered. Use a different name.")
    )]
    Duplicate { name: String },

    #[error("invalid arguments to {validator}: {message}")]
    #[diagnostic(
        code(motif::extension::invalid_arguments),
        help("Check the number and kind of arguments the validator expects.")
    )]
    InvalidArguments { validator: String, message: String },
}

// ---------------------------------------------------------------------------
// Environment errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum EnvironmentError {
    #[error("{kind} \"{name}\" is already bound to {existing}, cannot rebind to {attempted}")]
    #[diagnostic(
        code(motif::environment::duplicate_binding),
        help("Names are single-assignment. Use a new name, or remove the earlier binding.")
    )]
    DuplicateBinding {
        kind: &'static str,
        name: String,
        existing: String,
        attempted: String,
    },

    #[error("import of \"{path}\" failed: {message}")]
    #[diagnostic(
        code(motif::environment::import),
        help("The import resolver could not provide forms for this path.")
    )]
    Import { path: String, message: String },
}

/// Convenience alias for functions returning motif results.
pub type MotifResult<T> = std::result::Result<T, MotifError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_error_converts_to_motif_error() {
        let err = TemplateError::WrongArity {
            template: "t".into(),
            expected: 2,
            actual: 1,
        };
        let motif: MotifError = err.into();
        assert!(matches!(
            motif,
            MotifError::Template(TemplateError::WrongArity { .. })
        ));
    }

    #[test]
    fn extension_error_converts_to_motif_error() {
        let err = ExtensionError::Duplicate { name: "And".into() };
        let motif: MotifError = err.into();
        assert!(matches!(
            motif,
            MotifError::Extension(ExtensionError::Duplicate { .. })
        ));
    }

    #[test]
    fn error_display_messages_are_descriptive() {
        let err = ExtensionError::Cardinality {
            predicate: "<ex:a>".into(),
            subject: "<ex:e>".into(),
            expected: "at least 1".into(),
            actual: 0,
        };
        let msg = format!("{err}");
        assert!(msg.contains("<ex:a>"));
        assert!(msg.contains("at least 1"));
        assert!(msg.contains('0'));
    }

    #[test]
    fn diagnostic_codes_are_namespaced() {
        let err = ResolveError::UnboundPrefix { prefix: "ex".into() };
        let code = err.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("motif::resolve::unbound_prefix"));
    }
}
