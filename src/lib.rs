// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # motif
//!
//! An interpreter for a small declarative language that produces
//! subject-predicate-object triples from templates.
//!
//! ## Architecture
//!
//! - **Names** (`name`, `resolve`): dotted names resolved through nested
//!   namespace contexts (longest bound prefix, then default prefix, then raw
//!   concatenation)
//! - **Relation store** (`graph`): an indexed multiset of triples, plus
//!   key/value `Context` views over it
//! - **Templates** (`template`): parameter substitution, inheritance through
//!   a base chain, contextual `self`, nested and anonymous expansions
//! - **Extensions** (`extension`): validators and combinators that gate the
//!   commit of an expansion's triples
//! - **Environment** (`environment`): the state a program runs against, with
//!   per-form failure isolation
//!
//! The parser is not part of this crate; programs arrive as [`ast::Form`]s,
//! either built directly or deserialized from JSON.
//!
//! ## Library usage
//!
//! ```no_run
//! use motif::ast::{Expansion, Expr, Form, Template};
//! use motif::config::EnvironmentConfig;
//! use motif::environment::Environment;
//! use motif::export::SerializeFormat;
//!
//! let config = EnvironmentConfig::default()
//!     .with_prefix("ex", "http://example.org/")
//!     .with_default_prefix("ex");
//! let mut env = Environment::new(config).unwrap();
//! env.interpret(&[
//!     Form::Template(
//!         Template::new("person", &["name"]).property(Expr::name("label"), Expr::name("name")),
//!     ),
//!     Form::assign(
//!         "alice",
//!         Expr::expansion(Expansion::new("person").args(vec![Expr::string("Alice")])),
//!     ),
//! ]);
//! println!("{}", env.serialize(SerializeFormat::NTriples).unwrap());
//! ```

pub mod ast;
pub mod config;
pub mod environment;
pub mod error;
pub mod export;
pub mod extension;
pub mod graph;
pub mod name;
pub mod resolve;
pub mod template;
pub mod value;
