//! Lexer throughput benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use velac_lex::Lexer;
use velac_util::Handler;

fn bench_expression(c: &mut Criterion) {
    let source = "(a + b * c - d / e % f) == g and h or not i < j <= k";
    c.bench_function("lex_expression", |b| {
        b.iter(|| {
            let handler = Handler::new();
            black_box(Lexer::new(black_box(source), &handler).tokenize())
        })
    });
}

fn bench_string_literals(c: &mut Criterion) {
    let source = r#""plain" b"bytes" r"raw\d" f"a{x!r:>{w}}b" re"[a-z]+"ims '''triple'''"#;
    c.bench_function("lex_string_literals", |b| {
        b.iter(|| {
            let handler = Handler::new();
            black_box(Lexer::new(black_box(source), &handler).tokenize())
        })
    });
}

criterion_group!(benches, bench_expression, bench_string_literals);
criterion_main!(benches);
