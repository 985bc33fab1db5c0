//! Capability traits for nodes that carry substitutable sub-expressions.
//!
//! Only node kinds that can contain an [`Expr`] implement these traits, so
//! traversal never has to inspect a node to find out whether it can recurse.

use crate::ast::{
    Argument, BaseRef, BodyItem, ExtArg, ExtensionDecl, Expansion, Expr, Parameter, Property,
};

/// Replace parameter references with the arguments at their positions.
///
/// The arguments are inserted as-is: an argument that is itself unresolved (a
/// name, a forwarded parameter, a nested expansion) stays unresolved and is
/// never substituted a second time by the same pass.
pub trait Substitute {
    fn substitute(&self, arguments: &[Argument]) -> Self;
}

/// Rewrite bare-symbol names that match a parameter into parameter references.
///
/// Running it twice has the same effect as running it once: a
/// [`Expr::Param`] is never rewritten again.
pub trait Parameterise {
    fn parameterise(&mut self, parameters: &[Parameter]);
}

impl Substitute for Expr {
    fn substitute(&self, arguments: &[Argument]) -> Self {
        match self {
            Expr::Param(param) => arguments
                .iter()
                .find(|a| a.position == param.position)
                .map(|a| a.value.clone())
                .unwrap_or_else(|| self.clone()),
            Expr::Expansion(expansion) => {
                Expr::Expansion(Box::new(expansion.substitute(arguments)))
            }
            Expr::Literal(_) | Expr::Name(_) => self.clone(),
        }
    }
}

impl Parameterise for Expr {
    fn parameterise(&mut self, parameters: &[Parameter]) {
        match self {
            Expr::Name(name) => {
                let matched = name
                    .as_symbol()
                    .and_then(|symbol| parameters.iter().find(|p| p.name == symbol));
                if let Some(param) = matched {
                    *self = Expr::Param(param.clone());
                }
            }
            Expr::Expansion(expansion) => expansion.parameterise(parameters),
            Expr::Literal(_) | Expr::Param(_) => {}
        }
    }
}

impl Substitute for Argument {
    fn substitute(&self, arguments: &[Argument]) -> Self {
        Argument {
            value: self.value.substitute(arguments),
            position: self.position,
        }
    }
}

impl Parameterise for Argument {
    fn parameterise(&mut self, parameters: &[Parameter]) {
        self.value.parameterise(parameters);
    }
}

impl Substitute for Property {
    fn substitute(&self, arguments: &[Argument]) -> Self {
        Property {
            name: self.name.substitute(arguments),
            value: self.value.substitute(arguments),
            location: self.location.clone(),
        }
    }
}

impl Parameterise for Property {
    fn parameterise(&mut self, parameters: &[Parameter]) {
        self.name.parameterise(parameters);
        self.value.parameterise(parameters);
    }
}

impl Substitute for ExtArg {
    fn substitute(&self, arguments: &[Argument]) -> Self {
        match self {
            ExtArg::Expr(expr) => ExtArg::Expr(expr.substitute(arguments)),
            ExtArg::Extension(decl) => ExtArg::Extension(decl.substitute(arguments)),
        }
    }
}

impl Parameterise for ExtArg {
    fn parameterise(&mut self, parameters: &[Parameter]) {
        match self {
            ExtArg::Expr(expr) => expr.parameterise(parameters),
            ExtArg::Extension(decl) => decl.parameterise(parameters),
        }
    }
}

impl Substitute for ExtensionDecl {
    fn substitute(&self, arguments: &[Argument]) -> Self {
        ExtensionDecl {
            validator: self.validator.clone(),
            arguments: self.arguments.iter().map(|a| a.substitute(arguments)).collect(),
            location: self.location.clone(),
        }
    }
}

impl Parameterise for ExtensionDecl {
    fn parameterise(&mut self, parameters: &[Parameter]) {
        for arg in &mut self.arguments {
            arg.parameterise(parameters);
        }
    }
}

impl Substitute for BodyItem {
    fn substitute(&self, arguments: &[Argument]) -> Self {
        match self {
            BodyItem::Property(p) => BodyItem::Property(p.substitute(arguments)),
            BodyItem::Expansion(e) => BodyItem::Expansion(e.substitute(arguments)),
            BodyItem::Extension(d) => BodyItem::Extension(d.substitute(arguments)),
        }
    }
}

impl Parameterise for BodyItem {
    fn parameterise(&mut self, parameters: &[Parameter]) {
        match self {
            BodyItem::Property(p) => p.parameterise(parameters),
            BodyItem::Expansion(e) => e.parameterise(parameters),
            BodyItem::Extension(d) => d.parameterise(parameters),
        }
    }
}

impl Substitute for Expansion {
    fn substitute(&self, arguments: &[Argument]) -> Self {
        Expansion {
            name: self.name.clone(),
            template: self.template.substitute(arguments),
            arguments: self.arguments.iter().map(|a| a.substitute(arguments)).collect(),
            body: self.body.iter().map(|b| b.substitute(arguments)).collect(),
            location: self.location.clone(),
        }
    }
}

impl Parameterise for Expansion {
    fn parameterise(&mut self, parameters: &[Parameter]) {
        self.template.parameterise(parameters);
        for arg in &mut self.arguments {
            arg.parameterise(parameters);
        }
        for item in &mut self.body {
            item.parameterise(parameters);
        }
    }
}

impl Substitute for BaseRef {
    fn substitute(&self, arguments: &[Argument]) -> Self {
        BaseRef {
            template: self.template.clone(),
            arguments: self.arguments.iter().map(|a| a.substitute(arguments)).collect(),
        }
    }
}

impl Parameterise for BaseRef {
    fn parameterise(&mut self, parameters: &[Parameter]) {
        for arg in &mut self.arguments {
            arg.parameterise(parameters);
        }
    }
}
