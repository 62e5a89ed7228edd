use criterion::{black_box, criterion_group, criterion_main, Criterion};
use identity_zk::{
    compile, prove_with_rng, setup, verify, AttributeSchema, AttributeTuple, CircuitDeclaration,
    CommitmentHasher, Felt, ProofParameters, WitnessBuilder,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn sample_tuple(schema: &AttributeSchema) -> AttributeTuple {
    let values = [7u64, 1, 203, 1, 300400, 100000, 1000, 100, 1739983740]
        .map(Felt::from_u64)
        .to_vec();
    AttributeTuple::new(schema, values).expect("nine values")
}

fn bench_commitment(c: &mut Criterion) {
    let schema = AttributeSchema::identity();
    let attributes = sample_tuple(&schema);
    let hasher = CommitmentHasher::new();

    c.bench_function("commitment_hash", |bencher| {
        bencher.iter(|| black_box(hasher.hash_attributes(black_box(&attributes)).expect("hash")))
    });
}

fn bench_prove_verify(c: &mut Criterion) {
    let schema = AttributeSchema::identity();
    let cs = compile(
        &CircuitDeclaration::attribute_commitment(schema.clone())
            .with_parameters(ProofParameters::testing()),
    )
    .expect("compile");
    let mut rng = StdRng::seed_from_u64(42);
    let (pk, vk) = setup(&cs, &mut rng).expect("setup");
    let attributes = sample_tuple(&schema);
    let commitment = CommitmentHasher::new()
        .hash_attributes(&attributes)
        .expect("hash");
    let builder = WitnessBuilder::new(&cs);

    let mut group = c.benchmark_group("attribute_commitment");
    group.sample_size(10);
    group.bench_function("witness", |bencher| {
        bencher.iter(|| black_box(builder.build(&attributes, &commitment).expect("witness")))
    });
    group.bench_function("prove", |bencher| {
        bencher.iter(|| {
            let witness = builder.build(&attributes, &commitment).expect("witness");
            black_box(prove_with_rng(&cs, &pk, witness, &mut rng).expect("prove"))
        })
    });

    let witness = builder.build(&attributes, &commitment).expect("witness");
    let public = witness.public_inputs().clone();
    let proof = prove_with_rng(&cs, &pk, witness, &mut rng).expect("prove");
    group.bench_function("verify", |bencher| {
        bencher.iter(|| black_box(verify(&proof, &vk, &public).expect("verify")))
    });
    group.finish();
}

criterion_group!(benches, bench_commitment, bench_prove_verify);
criterion_main!(benches);
