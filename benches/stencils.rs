//! Benchmarks for lattice stencils and interpolation.

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use field_manifold::{
    compute::{BoundaryPolicy, InterpolationScheme, Manifold, ScalarField},
    schema::{InitializerKind, StandardInitializerFactory},
};

fn gaussian_prism(n: usize) -> ScalarField {
    let step = 1.0 / (n - 1) as f64;
    let manifold = Manifold::interpolated_rectangular_prism(
        [n, n, n],
        step,
        BoundaryPolicy::ZeroFlux,
        InterpolationScheme::Trilinear,
    )
    .unwrap();
    let mut field = ScalarField::new(Arc::new(manifold));
    field
        .initialize(
            &StandardInitializerFactory,
            InitializerKind::Gaussian,
            &[1.0, 0.5, 0.5, 0.5, 0.15, 0.15, 0.15],
        )
        .unwrap();
    field
}

fn bench_laplacian(c: &mut Criterion) {
    let mut group = c.benchmark_group("laplacian");

    for n in [16, 32, 64, 96] {
        let field = gaussian_prism(n);

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}^3", n)),
            &n,
            |b, _| {
                b.iter(|| black_box(field.laplacian().unwrap()));
            },
        );
    }

    group.finish();
}

fn bench_interpolation(c: &mut Criterion) {
    let mut group = c.benchmark_group("interpolation");
    let field = gaussian_prism(32);
    let points: Vec<[f64; 3]> = (0..256)
        .map(|i| {
            let t = i as f64 / 255.0;
            [t, (t * 7.0).fract(), (t * 13.0).fract()]
        })
        .collect();

    group.bench_function("value", |b| {
        b.iter(|| {
            points
                .iter()
                .map(|p| field.value(black_box(p)).unwrap())
                .sum::<f64>()
        });
    });

    group.bench_function("gradient", |b| {
        b.iter(|| {
            points
                .iter()
                .map(|p| field.gradient(black_box(p)).unwrap()[0])
                .sum::<f64>()
        });
    });

    group.finish();
}

criterion_group!(benches, bench_laplacian, bench_interpolation);
criterion_main!(benches);
