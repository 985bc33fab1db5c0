//! Benchmarks for name resolution and template expansion.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use motif::ast::{Expansion, ExtensionDecl, Expr, Form, Template};
use motif::config::EnvironmentConfig;
use motif::environment::Environment;
use motif::name::Name;

fn program() -> Vec<Form> {
    vec![
        Form::Template(
            Template::new("node", &["v"])
                .property(Expr::name("value"), Expr::name("v"))
                .extension(ExtensionDecl::new("AtMostOne").arg(Expr::name("value"))),
        ),
        Form::Template(
            Template::new("pair", &["a", "b"])
                .from_base("node", vec![Expr::name("a")])
                .property(
                    Expr::name("left"),
                    Expr::expansion(Expansion::new("node").args(vec![Expr::name("a")])),
                )
                .property(
                    Expr::name("right"),
                    Expr::expansion(Expansion::new("node").args(vec![Expr::name("b")])),
                ),
        ),
    ]
}

fn fresh_env() -> Environment {
    let mut env = Environment::new(
        EnvironmentConfig::default()
            .with_prefix("ex", "http://example.org/")
            .with_default_prefix("ex"),
    )
    .unwrap();
    env.interpret(&program());
    env
}

fn bench_resolve(c: &mut Criterion) {
    let mut env = fresh_env();
    env.interpret(&[
        Form::assign("a", Expr::uri("http://a/")),
        Form::assign("a.b", Expr::uri("http://ab/")),
    ]);
    let name = Name::dotted("a.b.c.d").unwrap();

    c.bench_function("resolve_4_segments", |bench| {
        bench.iter(|| black_box(env.resolve(&name).unwrap()))
    });
}

fn bench_expand(c: &mut Criterion) {
    c.bench_function("expand_100_pairs", |bench| {
        bench.iter(|| {
            let mut env = fresh_env();
            for i in 0..100 {
                env.evaluate(&Form::Expansion(
                    Expansion::new("pair")
                        .named(&format!("p{i}"))
                        .args(vec![Expr::int(i), Expr::int(i + 1)]),
                ))
                .unwrap();
            }
            black_box(env.triple_count())
        })
    });
}

criterion_group!(benches, bench_resolve, bench_expand);
criterion_main!(benches);
