use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use stockcert_core::{Aggregate, ShareClassCode};
use stockcert_inventory::{GrantShares, Inventory, Snapshot};

fn seeded_inventory(classes: usize) -> (Inventory, ShareClassCode) {
    let mut inv = Inventory::new();
    for i in 0..classes {
        let code = ShareClassCode::new(format!("C{i}")).unwrap();
        inv.register(code, u64::MAX / 2);
    }
    (inv, ShareClassCode::new("C0").unwrap())
}

/// Decide + apply one grant (the in-memory part of the ledger's critical section).
fn bench_grant(c: &mut Criterion) {
    let mut group = c.benchmark_group("grant");
    group.throughput(Throughput::Elements(1));

    for classes in [1usize, 2, 16] {
        group.bench_with_input(BenchmarkId::from_parameter(classes), &classes, |b, &n| {
            let (mut inv, code) = seeded_inventory(n);
            let cmd = GrantShares { share_class: code, amount: 10 };
            b.iter(|| {
                let record = inv.handle(black_box(&cmd)).unwrap();
                inv.apply(&record);
            });
        });
    }
    group.finish();
}

/// Encoding and parsing one log line (append and recovery paths).
fn bench_snapshot_codec(c: &mut Criterion) {
    let (inv, _) = seeded_inventory(2);
    let line = inv.snapshot().to_line();

    c.bench_function("snapshot_encode", |b| b.iter(|| black_box(inv.snapshot().to_line())));
    c.bench_function("snapshot_parse", |b| {
        b.iter(|| Snapshot::parse_line(black_box(&line)).unwrap())
    });
}

criterion_group!(benches, bench_grant, bench_snapshot_codec);
criterion_main!(benches);
