//! # PRN Core Benchmarks
//!
//! Performance checks for the numeric hot paths:
//!
//! | Component | Claim | Target |
//! |-----------|-------|--------|
//! | mod_exp vs Montgomery | Montgomery wins past small exponents | measured |
//! | Deterministic Miller-Rabin | 64-bit primality | < 10us |
//! | Keytriplet generation | 256-prime identity | < 10ms |
//! | VM dispatch | per-instruction overhead | < 1us |

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use prn_keys::Keytriplet;
use prn_numerics::{generate_primes, is_prime, mod_exp, mod_exp_opt, sha256};
use prn_vm::{Engine, Program, DEFAULT_MAX_STEPS};

fn bench_modular_exponentiation(c: &mut Criterion) {
    let mut group = c.benchmark_group("mod-exp");
    let (base, exp, m) = (
        123_456_789u64,
        987_654_321u64,
        2_305_843_009_213_693_951u64,
    );
    group.bench_function("binary", |b| {
        b.iter(|| black_box(mod_exp(base, exp, m)))
    });
    group.bench_function("montgomery", |b| {
        b.iter(|| black_box(mod_exp_opt(base, exp, m)))
    });
    group.finish();
}

fn bench_primality(c: &mut Criterion) {
    let mut group = c.benchmark_group("primality");
    group.bench_function("miller-rabin-64bit", |b| {
        b.iter(|| black_box(is_prime(black_box(18_446_744_073_709_551_557))))
    });
    group.bench_function("sieve-first-1024", |b| {
        b.iter(|| black_box(generate_primes(1024)))
    });
    group.finish();
}

fn bench_hashing(c: &mut Criterion) {
    let payload = vec![0xA5u8; 4096];
    c.bench_function("sha256-4k", |b| b.iter(|| black_box(sha256(&payload))));
}

fn bench_keytriplet(c: &mut Criterion) {
    c.bench_function("keytriplet-generate", |b| {
        b.iter(|| black_box(Keytriplet::generate("bench-seed", "alice").unwrap()))
    });
}

fn bench_vm_dispatch(c: &mut Criterion) {
    let source = "LOOP 1000\nADD 2 0.0001\nSCALE 2 0.999\nENDLOOP\nHALT\n";
    c.bench_function("vm-3k-instructions", |b| {
        b.iter(|| {
            let mut engine = Engine::new();
            engine
                .load_program(Program::parse(source).unwrap())
                .unwrap();
            black_box(engine.run(DEFAULT_MAX_STEPS))
        })
    });
}

criterion_group!(
    benches,
    bench_modular_exponentiation,
    bench_primality,
    bench_hashing,
    bench_keytriplet,
    bench_vm_dispatch
);
criterion_main!(benches);
