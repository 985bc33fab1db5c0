//! Templates: registration and macro expansion.
//!
//! A [`Template`] is parameterised once when it is registered, then stored
//! immutably in the [`TemplateTable`] under its resolved identifier. The
//! [`expand`] module turns an [`Expansion`](crate::ast::Expansion) of a
//! registered template into triples.

pub mod expand;
pub mod substitute;

use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::Template;
use crate::error::TemplateError;
use crate::value::Uri;

use substitute::Parameterise;

/// Result type for template operations.
pub type TemplateResult<T> = std::result::Result<T, TemplateError>;

impl Template {
    /// Rewrite body names that match a parameter into parameter references.
    ///
    /// Covers properties, nested expansions (template reference, arguments
    /// and body), extension arguments and the base's forwarded arguments.
    /// Idempotent.
    pub fn parameterise(&mut self) {
        let parameters = self.parameters.clone();
        if let Some(base) = &mut self.base {
            base.parameterise(&parameters);
        }
        for item in &mut self.body {
            item.parameterise(&parameters);
        }
    }
}

/// Registered templates keyed by resolved identifier.
#[derive(Debug, Default, Clone)]
pub struct TemplateTable {
    templates: HashMap<Uri, Rc<Template>>,
    /// Registration order, for listing.
    order: Vec<Uri>,
}

impl TemplateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template. Errors if the identifier is taken.
    pub fn register(&mut self, id: Uri, template: Template) -> TemplateResult<()> {
        if self.templates.contains_key(&id) {
            return Err(TemplateError::Duplicate {
                name: id.to_string(),
            });
        }
        self.order.push(id.clone());
        self.templates.insert(id, Rc::new(template));
        Ok(())
    }

    pub fn get(&self, id: &Uri) -> Option<Rc<Template>> {
        self.templates.get(id).cloned()
    }

    pub fn contains(&self, id: &Uri) -> bool {
        self.templates.contains_key(id)
    }

    /// Identifiers in registration order.
    pub fn ids(&self) -> &[Uri] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Expansion, ExtensionDecl, Expr, Parameter};

    fn sample() -> Template {
        Template::new("t", &["a", "b"])
            .from_base("base", vec![Expr::name("b")])
            .property(Expr::name("x"), Expr::name("a"))
            .property(Expr::name("a"), Expr::name("b.c"))
            .expansion(Expansion::new("s").args(vec![Expr::name("a")]))
            .extension(ExtensionDecl::new("AtLeastOne").arg(Expr::name("b")))
    }

    #[test]
    fn parameterise_rewrites_every_position() {
        let mut t = sample();
        t.parameterise();

        let a = Expr::Param(Parameter {
            name: "a".into(),
            position: 0,
        });
        let b = Expr::Param(Parameter {
            name: "b".into(),
            position: 1,
        });
        let base = t.base.as_ref().unwrap();
        assert_eq!(base.arguments[0].value, b);

        let crate::ast::BodyItem::Property(first) = &t.body[0] else {
            panic!("expected property");
        };
        assert_eq!(first.name, Expr::name("x"));
        assert_eq!(first.value, a);

        let crate::ast::BodyItem::Property(second) = &t.body[1] else {
            panic!("expected property");
        };
        assert_eq!(second.name, a);
        // Dotted names are not parameters.
        assert_eq!(second.value, Expr::name("b.c"));
    }

    #[test]
    fn parameterise_is_idempotent() {
        let mut once = sample();
        once.parameterise();
        let mut twice = once.clone();
        twice.parameterise();
        assert_eq!(once, twice);
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut table = TemplateTable::new();
        table.register(Uri::new("ex:t"), sample()).unwrap();
        let err = table.register(Uri::new("ex:t"), sample()).unwrap_err();
        assert!(matches!(err, TemplateError::Duplicate { .. }));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn ids_in_registration_order() {
        let mut table = TemplateTable::new();
        table.register(Uri::new("ex:b"), sample()).unwrap();
        table.register(Uri::new("ex:a"), sample()).unwrap();
        assert_eq!(table.ids(), &[Uri::new("ex:b"), Uri::new("ex:a")]);
        assert!(table.contains(&Uri::new("ex:a")));
        assert!(table.get(&Uri::new("ex:zzz")).is_none());
    }
}
