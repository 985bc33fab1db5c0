//! Expansion evaluation.
//!
//! One expansion is evaluated in three phases:
//!
//! 1. **Base merge**: the template's base chain is walked (cycle-checked) and
//!    every layer's body is substituted with the arguments forwarded to it.
//!    Base bodies come first, then the template's own body, then the
//!    expansion-local body. Nothing is overwritten: a predicate repeated
//!    across layers yields one triple per layer.
//! 2. **Body evaluation**: with the expansion's identity pushed as the
//!    current self, properties become triples and nested expansions are
//!    evaluated recursively, each under its own identity.
//! 3. **Validation**: the attached validators run over every triple the
//!    expansion produced, nested ones included, with the identity as focus.
//!
//! An expansion's identity is resolved before its body runs, so `self` is
//! always concrete inside a body. The current self is pushed through a scoped
//! guard and popped on every exit path.

use std::collections::HashSet;
use std::rc::Rc;

use crate::ast::{Argument, BodyItem, Expansion, Expr, ExtArg, ExtensionDecl, Property, Template};
use crate::environment::Environment;
use crate::error::{MotifError, MotifResult, ResolveError, TemplateError};
use crate::extension::{InvocationArg, TriplePack, ValidatorInvocation, validate};
use crate::graph::Triple;
use crate::name::Name;
use crate::resolve::Resolution;
use crate::value::{Uri, Value};

use super::substitute::Substitute;

/// Output of one expansion, handed to its parent (or committed at top level).
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Expanded {
    pub identity: Uri,
    pub triples: Vec<Triple>,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Evaluate one expansion against the environment.
///
/// Does not commit anything: the caller decides what to do with the result.
pub(crate) fn evaluate(env: &mut Environment, expansion: &Expansion) -> MotifResult<Expanded> {
    let (template_id, template) = template_ref(env, &expansion.template)?;
    check_arity(&template_id, &template, &expansion.arguments)?;

    // Phase 1.
    let mut body = merged_body(env, &template_id, &template, &expansion.arguments)?;
    body.extend(expansion.body.iter().cloned());

    let identity = identity_of(env, expansion)?;
    tracing::debug!(
        template = %template_id,
        identity = %identity,
        items = body.len(),
        "expanding"
    );

    // Phase 2.
    let mut guard = env.enter_self(identity.clone())?;
    let mut frame = Frame::default();
    for item in &body {
        frame.item(&mut guard, &identity, item)?;
    }

    // Phase 3.
    frame.finish(&guard, identity)
}

/// Resolve the template reference of an expansion.
fn template_ref(env: &Environment, expr: &Expr) -> MotifResult<(Uri, Rc<Template>)> {
    let name = match expr {
        Expr::Name(name) => name,
        Expr::Param(p) => return Err(unbound_parameter(p.name.clone(), p.position)),
        Expr::Literal(lit) => {
            return Err(type_mismatch("template reference", lit.kind()));
        }
        Expr::Expansion(_) => return Err(type_mismatch("template reference", "expansion")),
    };
    let id = env
        .resolver()
        .resolve_uri(name, "template reference")?
        .ok_or_else(|| unbound_self(name))?;
    let template = env
        .template_table()
        .get(&id)
        .ok_or_else(|| TemplateError::NotFound {
            name: name.to_string(),
        })?;
    Ok((id, template))
}

fn check_arity(id: &Uri, template: &Template, arguments: &[Argument]) -> MotifResult<()> {
    if template.parameters.len() != arguments.len() {
        return Err(TemplateError::WrongArity {
            template: id.to_string(),
            expected: template.parameters.len(),
            actual: arguments.len(),
        }
        .into());
    }
    Ok(())
}

/// Bodies of the whole base chain, root first, each substituted with the
/// arguments that reach it.
fn merged_body(
    env: &Environment,
    id: &Uri,
    template: &Rc<Template>,
    arguments: &[Argument],
) -> MotifResult<Vec<BodyItem>> {
    let mut visited = HashSet::from([id.clone()]);
    let mut layers = vec![(Rc::clone(template), arguments.to_vec())];

    while let Some((current, current_args)) = layers.last() {
        let Some(base) = &current.base else { break };
        let base_id = env
            .resolver()
            .resolve_uri(&base.template, "base template")?
            .ok_or_else(|| unbound_self(&base.template))?;
        if !visited.insert(base_id.clone()) {
            return Err(TemplateError::InheritanceCycle {
                name: base_id.to_string(),
            }
            .into());
        }
        let base_template = env
            .template_table()
            .get(&base_id)
            .ok_or_else(|| TemplateError::NotFound {
                name: base.template.to_string(),
            })?;
        let forwarded: Vec<Argument> = base
            .arguments
            .iter()
            .map(|a| a.substitute(current_args))
            .collect();
        check_arity(&base_id, &base_template, &forwarded)?;
        tracing::trace!(base = %base_id, "merging base template");
        layers.push((base_template, forwarded));
    }

    Ok(layers
        .iter()
        .rev()
        .flat_map(|(t, args)| t.body.iter().map(move |item| item.substitute(args)))
        .collect())
}

/// The identity an expansion evaluates under.
///
/// Named expansions resolve their name in the enclosing scope, so `self.e`
/// extends the parent's identity. Unnamed ones get a fresh anonymous identity.
fn identity_of(env: &mut Environment, expansion: &Expansion) -> MotifResult<Uri> {
    let Some(name) = &expansion.name else {
        return Ok(env.anonymous_identity());
    };
    env.resolver()
        .resolve_uri(name, "expansion name")?
        .ok_or_else(|| unbound_self(name))
}

// ---------------------------------------------------------------------------
// Phase 2: body evaluation
// ---------------------------------------------------------------------------

/// Everything one expansion has produced so far.
#[derive(Debug, Default)]
struct Frame {
    triples: Vec<Triple>,
    extensions: Vec<ValidatorInvocation>,
}

impl Frame {
    fn item(&mut self, env: &mut Environment, me: &Uri, item: &BodyItem) -> MotifResult<()> {
        match item {
            BodyItem::Property(p) => self.property(env, me, p),
            BodyItem::Expansion(nested) => {
                self.nested(env, nested)?;
                Ok(())
            }
            BodyItem::Extension(decl) => {
                let invocation = self.invocation(env, decl)?;
                self.extensions.push(invocation);
                Ok(())
            }
        }
    }

    fn property(&mut self, env: &mut Environment, me: &Uri, p: &Property) -> MotifResult<()> {
        let predicate = match self.value(env, &p.name)? {
            Value::Uri(uri) => uri,
            other => return Err(type_mismatch("predicate", other.kind())),
        };
        let object = self.value(env, &p.value)?;
        self.triples.push(Triple::new(me.clone(), predicate, object));
        Ok(())
    }

    fn value(&mut self, env: &mut Environment, expr: &Expr) -> MotifResult<Value> {
        match expr {
            Expr::Literal(lit) => Ok(Value::Literal(lit.clone())),
            Expr::Name(name) => match env.resolver().resolve(name)? {
                Resolution::Value(v) => Ok(v),
                Resolution::Unresolved => Err(unbound_self(name)),
            },
            Expr::Param(p) => Err(unbound_parameter(p.name.clone(), p.position)),
            Expr::Expansion(nested) => self.nested(env, nested).map(Value::Uri),
        }
    }

    /// Evaluate a nested expansion and take its triples; returns its identity.
    fn nested(&mut self, env: &mut Environment, expansion: &Expansion) -> MotifResult<Uri> {
        let out = evaluate(env, expansion)?;
        self.triples.extend(out.triples);
        Ok(out.identity)
    }

    fn invocation(
        &mut self,
        env: &mut Environment,
        decl: &ExtensionDecl,
    ) -> MotifResult<ValidatorInvocation> {
        let mut arguments = Vec::with_capacity(decl.arguments.len());
        for arg in &decl.arguments {
            arguments.push(match arg {
                ExtArg::Expr(expr) => InvocationArg::Value(self.value(env, expr)?),
                ExtArg::Extension(inner) => InvocationArg::Invocation(self.invocation(env, inner)?),
            });
        }
        Ok(ValidatorInvocation {
            name: decl.validator.clone(),
            arguments,
        })
    }

    // -----------------------------------------------------------------------
    // Phase 3: validation
    // -----------------------------------------------------------------------

    fn finish(self, env: &Environment, me: Uri) -> MotifResult<Expanded> {
        let mut triples = self.triples;
        if !self.extensions.is_empty() {
            let validators = self
                .extensions
                .iter()
                .map(|invocation| env.extensions().instantiate(invocation))
                .collect::<Result<Vec<_>, _>>()?;
            let pack = TriplePack::new(me.clone(), triples, env.symbol_view());
            triples = validate(pack, &validators)?.into_triples();
            tracing::debug!(identity = %me, validators = validators.len(), "validated expansion");
        }
        Ok(Expanded {
            identity: me,
            triples,
        })
    }
}

fn unbound_self(name: &Name) -> MotifError {
    ResolveError::UnboundSelf {
        name: name.to_string(),
    }
    .into()
}

fn type_mismatch(context: &str, found: &str) -> MotifError {
    ResolveError::TypeMismatch {
        context: context.to_string(),
        expected: "resource",
        found: found.to_string(),
    }
    .into()
}

fn unbound_parameter(name: String, position: usize) -> MotifError {
    TemplateError::UnboundParameter { name, position }.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ExtensionDecl, Form};
    use crate::config::EnvironmentConfig;
    use crate::error::ExtensionError;

    fn uri(s: &str) -> Uri {
        Uri::new(s)
    }

    fn env() -> Environment {
        Environment::new(EnvironmentConfig::default()).unwrap()
    }

    fn define(env: &mut Environment, template: Template) {
        env.evaluate(&Form::Template(template)).unwrap();
    }

    #[test]
    fn base_triples_come_first_and_are_not_overwritten() {
        let mut env = env();
        define(&mut env, Template::new("a", &[]).property(Expr::name("x"), Expr::int(1)));
        define(
            &mut env,
            Template::new("b", &[])
                .from_base("a", vec![])
                .property(Expr::name("x"), Expr::int(2)),
        );
        let out = evaluate(&mut env, &Expansion::new("b").named("id")).unwrap();
        assert_eq!(out.identity, uri("id"));
        assert_eq!(
            out.triples,
            vec![
                Triple::new(uri("id"), uri("x"), 1i64),
                Triple::new(uri("id"), uri("x"), 2i64),
            ]
        );
    }

    #[test]
    fn base_arguments_are_forwarded() {
        let mut env = env();
        define(&mut env, Template::new("a", &["v"]).property(Expr::name("x"), Expr::name("v")));
        define(
            &mut env,
            Template::new("b", &["w"]).from_base("a", vec![Expr::name("w")]),
        );
        let out = evaluate(&mut env, &Expansion::new("b").named("id").args(vec![Expr::int(9)]))
            .unwrap();
        assert_eq!(out.triples, vec![Triple::new(uri("id"), uri("x"), 9i64)]);
    }

    #[test]
    fn base_arity_is_checked() {
        let mut env = env();
        define(&mut env, Template::new("a", &["v"]));
        define(&mut env, Template::new("b", &[]).from_base("a", vec![]));
        let err = evaluate(&mut env, &Expansion::new("b").named("id")).unwrap_err();
        assert!(matches!(
            err,
            MotifError::Template(TemplateError::WrongArity { expected: 1, actual: 0, .. })
        ));
    }

    #[test]
    fn inheritance_cycle_is_detected() {
        let mut env = env();
        define(&mut env, Template::new("a", &[]).from_base("b", vec![]));
        define(&mut env, Template::new("b", &[]).from_base("a", vec![]));
        let err = evaluate(&mut env, &Expansion::new("a").named("id")).unwrap_err();
        assert!(matches!(
            err,
            MotifError::Template(TemplateError::InheritanceCycle { .. })
        ));
    }

    #[test]
    fn self_recursive_template_hits_depth_limit() {
        let mut env = Environment::new(EnvironmentConfig {
            max_expansion_depth: 8,
            ..EnvironmentConfig::default()
        })
        .unwrap();
        define(&mut env, Template::new("r", &[]).expansion(Expansion::new("r")));
        let err = evaluate(&mut env, &Expansion::new("r").named("id")).unwrap_err();
        assert!(matches!(
            err,
            MotifError::Template(TemplateError::DepthExceeded { max_depth: 8 })
        ));
        assert!(env.current_self().is_none());
    }

    #[test]
    fn anonymous_children_extend_their_parent() {
        let mut env = env();
        define(&mut env, Template::new("s", &[]).property(Expr::name("z"), Expr::self_ref()));
        define(
            &mut env,
            Template::new("t", &[])
                .property(Expr::name("x"), Expr::expansion(Expansion::new("s")))
                .property(Expr::name("y"), Expr::expansion(Expansion::new("s"))),
        );
        let out = evaluate(&mut env, &Expansion::new("t").named("f")).unwrap();
        assert_eq!(
            out.triples,
            vec![
                Triple::new(uri("f/_0"), uri("z"), uri("f/_0")),
                Triple::new(uri("f"), uri("x"), uri("f/_0")),
                Triple::new(uri("f/_1"), uri("z"), uri("f/_1")),
                Triple::new(uri("f"), uri("y"), uri("f/_1")),
            ]
        );
    }

    #[test]
    fn named_children_chain_through_each_enclosing_self() {
        let mut env = env();
        define(&mut env, Template::new("leaf", &[]).property(Expr::name("z"), Expr::self_ref()));
        define(&mut env, Template::new("mid", &[]));
        define(
            &mut env,
            Template::new("top", &[]).expansion(
                Expansion::new("mid")
                    .named("self.b")
                    .expansion(Expansion::new("leaf").named("self.c")),
            ),
        );
        let out = evaluate(&mut env, &Expansion::new("top").named("f")).unwrap();
        assert_eq!(out.triples, vec![Triple::new(uri("fbc"), uri("z"), uri("fbc"))]);
    }

    #[test]
    fn literal_predicate_is_a_type_mismatch() {
        let mut env = env();
        define(&mut env, Template::new("t", &[]).property(Expr::int(1), Expr::int(2)));
        let err = evaluate(&mut env, &Expansion::new("t").named("id")).unwrap_err();
        assert!(matches!(
            err,
            MotifError::Resolve(ResolveError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn validators_see_nested_triples() {
        let mut env = env();
        define(&mut env, Template::new("s", &[]).property(Expr::name("e"), Expr::int(1)));
        define(
            &mut env,
            Template::new("t", &[])
                .expansion(Expansion::new("s"))
                .extension(ExtensionDecl::new("ExactlyN").arg(Expr::name("e")).arg(Expr::int(1))),
        );
        assert!(evaluate(&mut env, &Expansion::new("t").named("id")).is_ok());

        define(
            &mut env,
            Template::new("u", &[])
                .extension(ExtensionDecl::new("ExactlyOne").arg(Expr::name("e"))),
        );
        let err = evaluate(&mut env, &Expansion::new("u").named("id2")).unwrap_err();
        assert!(matches!(
            err,
            MotifError::Extension(ExtensionError::Cardinality { .. })
        ));
    }

    #[test]
    fn extension_arguments_resolve_against_current_self() {
        let mut env = env();
        define(
            &mut env,
            Template::new("s", &[])
                .property(Expr::name("self.drop"), Expr::int(0))
                .property(Expr::name("z"), Expr::int(1))
                .extension(ExtensionDecl::new("Exclude").arg(Expr::name("self.drop"))),
        );
        let out = evaluate(&mut env, &Expansion::new("s").named("f")).unwrap();
        assert_eq!(out.triples, vec![Triple::new(uri("f"), uri("z"), 1i64)]);
    }

    #[test]
    fn nested_validation_filters_before_the_parent_sees_it() {
        let mut env = env();
        define(
            &mut env,
            Template::new("child", &[])
                .property(Expr::name("tmp"), Expr::int(0))
                .property(Expr::name("keep"), Expr::int(1))
                .extension(ExtensionDecl::new("Exclude").arg(Expr::name("tmp"))),
        );
        define(
            &mut env,
            Template::new("parent", &[])
                .expansion(Expansion::new("child").named("self.c"))
                .extension(ExtensionDecl::new("AtMostOne").arg(Expr::name("tmp"))),
        );
        let out = evaluate(&mut env, &Expansion::new("parent").named("p")).unwrap();
        assert_eq!(out.triples, vec![Triple::new(uri("pc"), uri("keep"), 1i64)]);
    }
}
