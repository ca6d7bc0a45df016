use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hoard::Hoard;
use rand::{rngs::StdRng, Rng, SeedableRng};

fn bench_push(c: &mut Criterion) {
    const COUNT: usize = 1 << 16;

    c.bench_with_input(BenchmarkId::new("hoard", COUNT), &COUNT, |b, &count| {
        b.iter_batched_ref(
            Hoard::new,
            |h| {
                for i in 0..count {
                    h.push(black_box(i as u64));
                }
            },
            criterion::BatchSize::LargeInput,
        );
    });

    c.bench_with_input(BenchmarkId::new("std_vec", COUNT), &COUNT, |b, &count| {
        b.iter_batched_ref(
            Vec::new,
            |v| {
                for i in 0..count {
                    v.push(black_box(i as u64));
                }
            },
            criterion::BatchSize::LargeInput,
        );
    });
}

fn bench_mixed(c: &mut Criterion) {
    const OPS: usize = 1 << 14;

    c.bench_function("hoard_mixed", |b| {
        b.iter_batched_ref(
            || (Hoard::new(), StdRng::seed_from_u64(0x0a7d)),
            |(h, rng)| {
                for _ in 0..OPS {
                    match rng.gen_range(0..4u8) {
                        0 | 1 => {
                            h.push(rng.gen::<u32>());
                        }
                        2 => {
                            h.pop();
                        }
                        _ => {
                            if !h.is_empty() {
                                let i = rng.gen_range(0..h.len());
                                h.insert(i, rng.gen());
                            }
                        }
                    }
                }
                black_box(h.len());
            },
            criterion::BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, bench_push, bench_mixed);
criterion_main!(benches);
