use criterion::{black_box, criterion_group, criterion_main, Criterion};
use curve::{Affine, Group, ScalarField};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn bench_affine_double(c: &mut Criterion) {
    let g = Affine::generator();
    c.bench_function("affine_double", |bencher| {
        bencher.iter(|| black_box(black_box(g).double()))
    });
}

fn bench_affine_add(c: &mut Criterion) {
    let g = Affine::generator();
    let h = g.mul_u64(17);
    c.bench_function("affine_add", |bencher| {
        bencher.iter(|| black_box(black_box(g) + black_box(h)))
    });
}

fn bench_scalar_mul(c: &mut Criterion) {
    let g = Affine::generator();
    let mut rng = StdRng::seed_from_u64(42);
    let scalar = ScalarField::random(&mut rng);

    c.bench_function("affine_scalar_mul", |bencher| {
        bencher.iter(|| black_box(black_box(g).scalar_mul(black_box(&scalar))))
    });
    c.bench_function("affine_mul_generator", |bencher| {
        bencher.iter(|| black_box(<Affine as Group>::mul_generator(black_box(&scalar))))
    });
}

fn bench_double_scalar_mul(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);
    let g = Affine::generator();
    let p = <Affine as Group>::mul_generator(&ScalarField::random(&mut rng));
    let a = ScalarField::random(&mut rng);
    let b = ScalarField::random(&mut rng);

    c.bench_function("affine_double_scalar_mul", |bencher| {
        bencher.iter(|| black_box(g.double_scalar_mul(black_box(&a), &p, black_box(&b))))
    });
}

fn bench_scalar_field_mul(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(3);
    let a = ScalarField::random(&mut rng);
    let b = ScalarField::random(&mut rng);
    c.bench_function("scalar_field_mul", |bencher| {
        bencher.iter(|| black_box(black_box(a) * black_box(b)))
    });
}

criterion_group!(
    benches,
    bench_affine_double,
    bench_affine_add,
    bench_scalar_mul,
    bench_double_scalar_mul,
    bench_scalar_field_mul
);
criterion_main!(benches);
