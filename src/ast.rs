//! Parse-tree forms consumed by the interpreter.
//!
//! The lexer and parser live outside this crate. They hand over fully nested
//! [`Form`]s whose leaves are literals, [`Name`]s or, after parameterisation,
//! [`Parameter`] references. All node types derive serde so a front end in
//! another process can pass programs as JSON.
//!
//! The builder methods (`Template::new(..).property(..)` and friends) exist for
//! hosts that construct programs directly.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::name::Name;
use crate::value::{Literal, Uri};

/// Where a node came from, for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub column: u32,
}

impl Location {
    pub fn new(source: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            source: Some(source.into()),
            line,
            column,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.source, self.line) {
            (_, 0) => f.write_str("<unknown>"),
            (Some(src), line) => write!(f, "{src}:{line}:{}", self.column),
            (None, line) => write!(f, "{line}:{}", self.column),
        }
    }
}

/// Placeholder for the argument at `position`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub position: usize,
}

/// A value-producing expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    Literal(Literal),
    Name(Name),
    Param(Parameter),
    Expansion(Box<Expansion>),
}

impl Expr {
    /// A dotted name; `self` components become self references.
    pub fn name(dotted: &str) -> Self {
        Expr::Name(Name::dotted(dotted).unwrap_or_else(|| Name::symbol(dotted)))
    }

    pub fn uri(uri: impl Into<String>) -> Self {
        Expr::Name(Name::uri(Uri::new(uri)))
    }

    pub fn self_ref() -> Self {
        Expr::Name(Name::self_ref())
    }

    pub fn int(n: i64) -> Self {
        Expr::Literal(Literal::Integer(n))
    }

    pub fn float(x: f64) -> Self {
        Expr::Literal(Literal::Float(x))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Expr::Literal(Literal::String(s.into()))
    }

    pub fn boolean(b: bool) -> Self {
        Expr::Literal(Literal::Boolean(b))
    }

    pub fn expansion(expansion: Expansion) -> Self {
        Expr::Expansion(Box::new(expansion))
    }
}

/// An expression supplied for the parameter at `position`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    pub value: Expr,
    pub position: usize,
}

/// `name = value` inside a body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub name: Expr,
    pub value: Expr,
    #[serde(default)]
    pub location: Location,
}

/// An argument to a validator: a value, or another validator for combinators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtArg {
    Expr(Expr),
    Extension(ExtensionDecl),
}

/// `@extension Validator(args..)` attached to a template or expansion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionDecl {
    pub validator: String,
    #[serde(default)]
    pub arguments: Vec<ExtArg>,
    #[serde(default)]
    pub location: Location,
}

impl ExtensionDecl {
    pub fn new(validator: impl Into<String>) -> Self {
        Self {
            validator: validator.into(),
            arguments: Vec::new(),
            location: Location::default(),
        }
    }

    pub fn arg(mut self, value: Expr) -> Self {
        self.arguments.push(ExtArg::Expr(value));
        self
    }

    pub fn nested(mut self, decl: ExtensionDecl) -> Self {
        self.arguments.push(ExtArg::Extension(decl));
        self
    }
}

/// One entry of a template or expansion body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyItem {
    Property(Property),
    Expansion(Expansion),
    Extension(ExtensionDecl),
}

/// The template a template specializes, with forwarded arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseRef {
    pub template: Name,
    #[serde(default)]
    pub arguments: Vec<Argument>,
}

/// A named, parameterized, inheritable graph fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub name: Name,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub base: Option<BaseRef>,
    #[serde(default)]
    pub body: Vec<BodyItem>,
    #[serde(default)]
    pub location: Location,
}

impl Template {
    /// Template `name` with parameters in declaration order.
    pub fn new(name: &str, parameters: &[&str]) -> Self {
        Self {
            name: Name::dotted(name).unwrap_or_else(|| Name::symbol(name)),
            parameters: parameters
                .iter()
                .enumerate()
                .map(|(position, p)| Parameter {
                    name: (*p).to_string(),
                    position,
                })
                .collect(),
            base: None,
            body: Vec::new(),
            location: Location::default(),
        }
    }

    /// Specialize `base`, forwarding `arguments` to it.
    pub fn from_base(mut self, base: &str, arguments: Vec<Expr>) -> Self {
        self.base = Some(BaseRef {
            template: Name::dotted(base).unwrap_or_else(|| Name::symbol(base)),
            arguments: positional(arguments),
        });
        self
    }

    pub fn property(mut self, name: Expr, value: Expr) -> Self {
        self.body.push(BodyItem::Property(Property {
            name,
            value,
            location: Location::default(),
        }));
        self
    }

    pub fn expansion(mut self, expansion: Expansion) -> Self {
        self.body.push(BodyItem::Expansion(expansion));
        self
    }

    pub fn extension(mut self, decl: ExtensionDecl) -> Self {
        self.body.push(BodyItem::Extension(decl));
        self
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = location;
        self
    }
}

/// One instantiation of a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expansion {
    /// Anonymous when absent.
    #[serde(default)]
    pub name: Option<Name>,
    pub template: Expr,
    #[serde(default)]
    pub arguments: Vec<Argument>,
    #[serde(default)]
    pub body: Vec<BodyItem>,
    #[serde(default)]
    pub location: Location,
}

impl Expansion {
    /// Anonymous expansion of `template` with no arguments.
    pub fn new(template: &str) -> Self {
        Self {
            name: None,
            template: Expr::name(template),
            arguments: Vec::new(),
            body: Vec::new(),
            location: Location::default(),
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Name::dotted(name);
        self
    }

    pub fn args(mut self, arguments: Vec<Expr>) -> Self {
        self.arguments = positional(arguments);
        self
    }

    pub fn property(mut self, name: Expr, value: Expr) -> Self {
        self.body.push(BodyItem::Property(Property {
            name,
            value,
            location: Location::default(),
        }));
        self
    }

    pub fn expansion(mut self, expansion: Expansion) -> Self {
        self.body.push(BodyItem::Expansion(expansion));
        self
    }

    pub fn extension(mut self, decl: ExtensionDecl) -> Self {
        self.body.push(BodyItem::Extension(decl));
        self
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = location;
        self
    }
}

/// A `(subject, predicate, object)` written directly in a program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripleLiteral {
    pub subject: Expr,
    pub predicate: Expr,
    pub object: Expr,
    #[serde(default)]
    pub location: Location,
}

/// A top-level statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "form", rename_all = "snake_case")]
pub enum Form {
    /// `name = value`.
    Assignment {
        name: Name,
        value: Expr,
        #[serde(default)]
        location: Location,
    },
    Template(Template),
    Expansion(Expansion),
    Triple(TripleLiteral),
    /// `@prefix symbol = <namespace>`.
    Prefix {
        symbol: String,
        namespace: Uri,
        #[serde(default)]
        location: Location,
    },
    /// `@default symbol`: unbound names resolve under this prefix.
    DefaultPrefix {
        symbol: String,
        #[serde(default)]
        location: Location,
    },
    /// `@import path`.
    Import {
        path: String,
        #[serde(default)]
        location: Location,
    },
}

impl Form {
    pub fn assign(name: &str, value: Expr) -> Self {
        Form::Assignment {
            name: Name::dotted(name).unwrap_or_else(|| Name::symbol(name)),
            value,
            location: Location::default(),
        }
    }

    pub fn prefix(symbol: &str, namespace: &str) -> Self {
        Form::Prefix {
            symbol: symbol.to_string(),
            namespace: Uri::new(namespace),
            location: Location::default(),
        }
    }

    pub fn default_prefix(symbol: &str) -> Self {
        Form::DefaultPrefix {
            symbol: symbol.to_string(),
            location: Location::default(),
        }
    }

    pub fn triple(subject: Expr, predicate: Expr, object: Expr) -> Self {
        Form::Triple(TripleLiteral {
            subject,
            predicate,
            object,
            location: Location::default(),
        })
    }

    pub fn location(&self) -> &Location {
        match self {
            Form::Assignment { location, .. }
            | Form::Prefix { location, .. }
            | Form::DefaultPrefix { location, .. }
            | Form::Import { location, .. } => location,
            Form::Template(t) => &t.location,
            Form::Expansion(e) => &e.location,
            Form::Triple(t) => &t.location,
        }
    }
}

fn positional(values: Vec<Expr>) -> Vec<Argument> {
    values
        .into_iter()
        .enumerate()
        .map(|(position, value)| Argument { value, position })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_assign_positions() {
        let t = Template::new("t", &["a", "b"]);
        assert_eq!(t.parameters[1].name, "b");
        assert_eq!(t.parameters[1].position, 1);

        let e = Expansion::new("t").args(vec![Expr::int(1), Expr::int(2)]);
        assert_eq!(e.arguments[0].position, 0);
        assert_eq!(e.arguments[1].value, Expr::int(2));
    }

    #[test]
    fn location_display() {
        assert_eq!(Location::default().to_string(), "<unknown>");
        assert_eq!(Location::new("main.mtf", 3, 7).to_string(), "main.mtf:3:7");
    }

    #[test]
    fn forms_round_trip_through_json() {
        let form = Form::Template(
            Template::new("t", &["a"]).property(Expr::name("x"), Expr::name("a")),
        );
        let json = serde_json::to_string(&form).unwrap();
        assert!(json.contains("\"form\":\"template\""));
        let back: Form = serde_json::from_str(&json).unwrap();
        assert_eq!(back, form);
    }

    #[test]
    fn form_location_reaches_nested_nodes() {
        let loc = Location::new("f", 2, 1);
        let form = Form::Expansion(Expansion::new("t").at(loc.clone()));
        assert_eq!(form.location(), &loc);
    }
}
