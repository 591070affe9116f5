//! Compile benchmarks — template → rule construction and path matching.
//!
//! Measures the one-time cost of parsing and compiling route templates, and
//! the per-request cost of parameter extraction.

use sendero::{CompiledRule, RouteExpression};

fn main() {
    divan::main();
}

// ═══════════════════════════════════════════════════════════════════════════════
// Template parsing and rule compilation
// ═══════════════════════════════════════════════════════════════════════════════

#[divan::bench]
fn parse_static(bencher: divan::Bencher) {
    bencher.bench_local(|| RouteExpression::parse("about/contact/team"));
}

#[divan::bench]
fn parse_typed(bencher: divan::Bencher) {
    bencher.bench_local(|| RouteExpression::parse("user/{number(1-11):id}/profile"));
}

#[divan::bench]
fn compile_typed(bencher: divan::Bencher) {
    let expr = RouteExpression::parse("user/{number(1-11):id}/profile").unwrap();
    bencher.bench_local(|| CompiledRule::compile(&expr));
}

#[divan::bench]
fn compile_mixed_kinds(bencher: divan::Bencher) {
    let expr =
        RouteExpression::parse("{string:section}/{number:id}/{string:tab}/{slug}").unwrap();
    bencher.bench_local(|| CompiledRule::compile(&expr));
}

// ═══════════════════════════════════════════════════════════════════════════════
// Extraction
// ═══════════════════════════════════════════════════════════════════════════════

#[divan::bench]
fn extract_hit(bencher: divan::Bencher) {
    let expr = RouteExpression::parse("user/{number(1-11):id}/profile").unwrap();
    let rule = CompiledRule::compile(&expr).unwrap();
    bencher.bench_local(|| rule.extract("user/42/profile"));
}

#[divan::bench]
fn extract_miss(bencher: divan::Bencher) {
    let expr = RouteExpression::parse("user/{number(1-11):id}/profile").unwrap();
    let rule = CompiledRule::compile(&expr).unwrap();
    bencher.bench_local(|| rule.extract("user/42/settings"));
}

// ═══════════════════════════════════════════════════════════════════════════════
// Route tables at scale
// ═══════════════════════════════════════════════════════════════════════════════

#[divan::bench(args = [1, 10, 50, 100, 200])]
fn compile_n_routes(bencher: divan::Bencher, n: usize) {
    let exprs: Vec<RouteExpression> = (0..n)
        .map(|i| RouteExpression::parse(&format!("section{i}/{{number:id}}")).unwrap())
        .collect();

    bencher.bench_local(|| {
        exprs
            .iter()
            .map(CompiledRule::compile)
            .collect::<Result<Vec<_>, _>>()
    });
}
