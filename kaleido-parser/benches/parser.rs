use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use kaleido_parser::{Parser, PrecedenceTable, TokenSource};

fn expr(source: &str, table: &PrecedenceTable) {
    let mut tokens = TokenSource::lex(source);
    let _ast = Parser::new(&mut tokens, table).parse_expr().unwrap();
    assert!(tokens.is_at_end());
}

fn long_expr(c: &mut Criterion) {
    let mut group = c.benchmark_group("long-expr");
    let table = PrecedenceTable::new();

    let mut source = "1".to_string();
    for _i in 0..1000 {
        source.push_str(" + 1");
    }
    group.throughput(Throughput::Bytes(source.len() as u64));
    group.bench_function("long-expr", |b| b.iter(|| expr(&source, &table)));
}

fn stress_precedence(c: &mut Criterion) {
    let mut group = c.benchmark_group("stress-precedence");
    let mut table = PrecedenceTable::new();
    table.define('|', 5).unwrap();

    let mut source = "1".to_string();
    for _i in 0..200 {
        source.push_str(" | 2 < 3 + 5 * 5");
    }
    group.throughput(Throughput::Bytes(source.len() as u64));
    group.bench_function("stress-precedence", |b| b.iter(|| expr(&source, &table)));
}

fn unary_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("unary-chain");
    let table = PrecedenceTable::new();

    let mut source = "-".repeat(500);
    source.push('x');
    group.throughput(Throughput::Bytes(source.len() as u64));
    group.bench_function("unary-chain", |b| b.iter(|| expr(&source, &table)));
}

criterion_group!(benches, long_expr, stress_precedence, unary_chain);
criterion_main!(benches);
