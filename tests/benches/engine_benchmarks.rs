//! # Covenant Engine Benchmarks
//!
//! | Path | Measures |
//! |------|----------|
//! | create + sign | Two-phase commit with deposit receipts |
//! | evaluate breach | Sweep, penalty routing and settlement |
//! | queries | Read path under a populated ledger |

use covenant_engine::{CallContext, CovenantApi};
use covenant_tests::fixtures::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn bench_activation(c: &mut Criterion) {
    let mut group = c.benchmark_group("covenant-activation");

    for parties in [2usize, 8, 32] {
        let wallets: Vec<_> = (0..parties)
            .map(|i| {
                let mut wallet = [0x10; 20];
                wallet[19] = i as u8;
                wallet
            })
            .collect();
        let deposits = vec![UNIT; parties];

        group.throughput(Throughput::Elements(parties as u64));
        group.bench_with_input(
            BenchmarkId::new("create_and_sign", parties),
            &parties,
            |b, _| {
                let h = Harness::new();
                b.iter(|| black_box(h.activate(false, &wallets, &deposits)))
            },
        );
    }
    group.finish();
}

fn bench_breach(c: &mut Criterion) {
    let mut group = c.benchmark_group("covenant-breach");

    for terms in [1usize, 16, 64] {
        group.bench_with_input(BenchmarkId::new("enforce", terms), &terms, |b, &terms| {
            let h = Harness::new();
            b.iter(|| {
                let id = h.activate(false, &[ALICE, BOB, CAROL], &[UNIT, UNIT, UNIT]);
                for _ in 0..terms {
                    h.term(id, BOB, 0, START, to_counterparties(UNIT / 100))
                        .unwrap_or_default();
                }
                h.clock.advance(1);
                black_box(h.service.enforce_breach(CallContext::new(KEEPER), id))
            })
        });
    }
    group.finish();
}

fn bench_queries(c: &mut Criterion) {
    let h = Harness::new();
    for _ in 0..1_000 {
        h.activate(false, &[ALICE, BOB], &[UNIT, UNIT]);
    }

    let mut group = c.benchmark_group("covenant-queries");
    group.bench_function("get_agreement", |b| {
        b.iter(|| black_box(h.service.get_agreement(black_box(500))))
    });
    group.bench_function("get_user_agreements", |b| {
        b.iter(|| black_box(h.service.get_user_agreements(&ALICE).len()))
    });
    group.finish();
}

criterion_group!(benches, bench_activation, bench_breach, bench_queries);
criterion_main!(benches);
