use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use pvqmc::pvq::{BandParams, quantize_band};
use pvqmc::{Accel, CodecConfig, InterPredictor, MotionVector, PlaneRef};

const SIDE: usize = 128;

fn test_plane() -> Vec<u8> {
    (0..SIDE * SIDE)
        .map(|i| ((i % SIDE) * 3 + (i / SIDE) * 5 + (i * 7919) % 31) as u8)
        .collect()
}

fn bench_luma(c: &mut Criterion) {
    let plane = test_plane();
    let mut group = c.benchmark_group("luma_interpolation");
    for accel in [Accel::Scalar, Accel::Lanes] {
        let predictor = InterPredictor::new(&CodecConfig {
            accel,
            ..Default::default()
        })
        .unwrap();
        let mut scratch = predictor.scratch();
        for size in [8usize, 16, 64] {
            let mut dst = vec![0u8; size * size];
            group.throughput(Throughput::Elements((size * size) as u64));
            group.bench_with_input(
                BenchmarkId::new(predictor.kernels_name(), size),
                &size,
                |b, &size| {
                    let src = PlaneRef::new(&plane, SIDE, 32, 32);
                    b.iter(|| {
                        // Cycles through center, edge and inner phases.
                        for mv in [(2, 2), (1, 0), (3, 1), (1, 3)] {
                            predictor.predict_luma(
                                &mut dst,
                                size,
                                src,
                                size,
                                size,
                                black_box(MotionVector::new(mv.0, mv.1)),
                                &mut scratch,
                            );
                        }
                    })
                },
            );
        }
    }
    group.finish();
}

fn bench_chroma(c: &mut Criterion) {
    let plane = test_plane();
    let mut group = c.benchmark_group("chroma_interpolation");
    for accel in [Accel::Scalar, Accel::Lanes] {
        let predictor = InterPredictor::new(&CodecConfig {
            accel,
            ..Default::default()
        })
        .unwrap();
        let mut scratch = predictor.scratch();
        for size in [4usize, 16, 32] {
            let mut dst = vec![0u8; size * size];
            group.throughput(Throughput::Elements((size * size) as u64));
            group.bench_with_input(
                BenchmarkId::new(predictor.kernels_name(), size),
                &size,
                |b, &size| {
                    let src = PlaneRef::new(&plane, SIDE, 32, 32);
                    b.iter(|| {
                        predictor.predict_chroma(
                            &mut dst,
                            size,
                            src,
                            size,
                            size,
                            black_box(MotionVector::new(3, 5)),
                            &mut scratch,
                        )
                    })
                },
            );
        }
    }
    group.finish();
}

fn bench_quantize_band(c: &mut Criterion) {
    let mut group = c.benchmark_group("pvq_band");
    for n in [15usize, 64, 128] {
        let x: Vec<i32> = (0..n).map(|i| ((i * 37) % 23) as i32 * 9 - 100).collect();
        let pred: Vec<f64> = x.iter().map(|&v| v as f64 * 0.9 + 3.0).collect();
        let params = BandParams {
            q0: 12,
            beta: 1.0,
            intra: false,
            plane: 0,
            nodesync: false,
        };
        let mut out = vec![0i32; n];
        group.bench_with_input(BenchmarkId::new("with_predictor", n), &n, |b, _| {
            b.iter(|| quantize_band(black_box(&x), Some(&pred), &mut out, &params))
        });
        group.bench_with_input(BenchmarkId::new("noref", n), &n, |b, _| {
            b.iter(|| quantize_band(black_box(&x), None, &mut out, &params))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_luma, bench_chroma, bench_quantize_band);
criterion_main!(benches);
