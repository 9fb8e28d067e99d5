use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;

use d2latex::{escape_backslashes, extract_dimensions, LatexConfig, LatexRenderer, ScriptBundle};

const STUB: &str = include_str!("../tests/fixtures/stub_mathjax.js");

const SVG: &str = r#"<svg style="vertical-align: -0.566ex;" xmlns="http://www.w3.org/2000/svg" width="10.5ex" height="2.262ex" role="img" focusable="false"><g data-mml-node="math"></g></svg>"#;

fn bench_pure(c: &mut Criterion) {
    c.bench_function("escape_backslashes", |b| {
        let latex = r"\sum_{i=1}^{n} \frac{\alpha_i}{\beta_i} \\ \int_0^1 x\,dx";
        b.iter(|| escape_backslashes(black_box(latex)))
    });
    c.bench_function("extract_dimensions", |b| {
        b.iter(|| extract_dimensions(black_box(SVG), 8).unwrap())
    });
}

// Each measure bootstraps a fresh sandbox; the pooled variant reuses them.
fn bench_measure(c: &mut Criterion) {
    if !cfg!(feature = "boa") {
        return;
    }
    let bundle = Arc::new(ScriptBundle::with_typesetter(STUB));
    let renderer = LatexRenderer::new(LatexConfig::default(), bundle);

    c.bench_function("measure_fresh_sandbox", |b| {
        b.iter(|| renderer.measure(black_box(r"e^{i\pi}+1=0")).unwrap())
    });

    let pool = renderer.pool();
    c.bench_function("measure_pooled", |b| {
        b.iter(|| renderer.measure_pooled(&pool, black_box(r"e^{i\pi}+1=0")).unwrap())
    });
}

criterion_group!(benches, bench_pure, bench_measure);
criterion_main!(benches);
