use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use glps_core::{lexer::Lexer, parse, print_config};

// ============================================================================
// Test Data: Varying Complexity and Size
// ============================================================================

const TINY_LAT: &str = "x: drift; l: LINE = (x);";

const SMALL_LAT: &str = r#"
energy = 931.49432;
x1: drift, L=4;
q1: quad, L=0.25, K=2.1;
foo: LINE = (x1, q1, x1);
"#;

const MEDIUM_LAT: &str = r#"
# FODO cell with diagnostics
energy = 931.49432;
scale = 1.5;

S: source;
qf: quad, L=0.25, K=2.1*scale;
qd: quad, L=0.25, K=-2.1*scale;
d1: drift, L=1;
bpm: monitor, taps = [1, 3, 5], gain = 0.5;
b1: sbend, phi=7.5, L=0.61;

cell: LINE = (qf, d1, bpm, qd, d1);
arc: LINE = (b1, cell, b1);
ring: LINE = (S, 4*cell, 2*arc);
"#;

fn large_lat() -> String {
    let mut src = String::from("energy = 931.49432;\n");
    for i in 0..200 {
        src.push_str(&format!("d{i}: drift, L={};\n", (i % 7) + 1));
    }
    src.push_str("big: LINE = (");
    for i in 0..200 {
        if i > 0 {
            src.push_str(", ");
        }
        src.push_str(&format!("{}*d{i}", (i % 3) + 1));
    }
    src.push_str(");\n");
    src
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_lexer(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer");
    for (name, source) in [
        ("tiny", TINY_LAT.to_string()),
        ("small", SMALL_LAT.to_string()),
        ("medium", MEDIUM_LAT.to_string()),
        ("large", large_lat()),
    ] {
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), &source, |b, src| {
            b.iter(|| {
                let mut lexer = Lexer::new(black_box(src.as_bytes()), "bench.lat");
                lexer.lex().unwrap()
            });
        });
    }
    group.finish();
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for (name, source) in [
        ("tiny", TINY_LAT.to_string()),
        ("small", SMALL_LAT.to_string()),
        ("medium", MEDIUM_LAT.to_string()),
        ("large", large_lat()),
    ] {
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), &source, |b, src| {
            b.iter(|| parse(black_box(src)).unwrap());
        });
    }
    group.finish();
}

fn bench_print(c: &mut Criterion) {
    let config = parse(&large_lat()).unwrap();
    c.bench_function("print/large", |b| {
        b.iter(|| print_config(black_box(&config)).unwrap());
    });
}

fn bench_round_trip(c: &mut Criterion) {
    c.bench_function("round_trip/medium", |b| {
        b.iter(|| {
            let config = parse(black_box(MEDIUM_LAT)).unwrap();
            let printed = print_config(&config).unwrap();
            parse(&printed).unwrap()
        });
    });
}

criterion_group!(benches, bench_lexer, bench_parse, bench_print, bench_round_trip);
criterion_main!(benches);
