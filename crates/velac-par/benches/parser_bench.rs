//! String-literal parsing benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use velac_par::parse_string_source;
use velac_util::{Arena, Handler};

fn bench_plain_literal(c: &mut Criterion) {
    let source = "\"a plain literal with some escapes: \\n \\t \\x41 \\N{BULLET}\"";
    c.bench_function("parse_plain_literal", |b| {
        b.iter(|| {
            let arena = Arena::new();
            let handler = Handler::new();
            black_box(parse_string_source(
                black_box(source),
                &arena,
                &handler,
                8,
            ))
            .is_some()
        })
    });
}

fn bench_fstring(c: &mut Criterion) {
    let source = "f\"widget {name!r} has {count} units at {price:>{width}.2f} each\"";
    c.bench_function("parse_fstring", |b| {
        b.iter(|| {
            let arena = Arena::new();
            let handler = Handler::new();
            black_box(parse_string_source(
                black_box(source),
                &arena,
                &handler,
                8,
            ))
            .is_some()
        })
    });
}

criterion_group!(benches, bench_plain_literal, bench_fstring);
criterion_main!(benches);
