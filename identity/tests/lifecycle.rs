use identity_zk::{
    compile, prove, prove_with_rng, setup, verify, Artifact, AttributeSchema, AttributeTuple,
    CircuitDeclaration, Commitment, CommitmentHasher, ConstraintSystem, Felt, IdentityError,
    IdentityRecord, Proof, ProofParameters, ProvingKey, PublicInputs, SigningKey, VerifyingKey,
    WitnessBuilder,
};
use p3_baby_bear::BabyBear;
use p3_field::PrimeCharacteristicRing;
use rand::rngs::StdRng;
use rand::SeedableRng;

const OWNER: &str = "0x52908400098527886e0f7030069857d2e4169ee7";

fn record() -> IdentityRecord {
    IdentityRecord {
        owner: OWNER.into(),
        is_github: true,
        github_stars: 203,
        is_twitter: true,
        twitter_followers: 300400,
        total_staked: 100000,
        balance: 1000,
        txn_frequency: 100,
        last_updated: 1739983740,
    }
}

struct Fixture {
    schema: AttributeSchema,
    cs: ConstraintSystem,
    pk: ProvingKey,
    vk: VerifyingKey,
}

fn fixture() -> Fixture {
    let schema = AttributeSchema::identity();
    let declaration =
        CircuitDeclaration::attribute_commitment(schema.clone()).with_parameters(ProofParameters::testing());
    let cs = compile(&declaration).unwrap();
    let (pk, vk) = setup(&cs, &mut StdRng::seed_from_u64(42)).unwrap();
    Fixture { schema, cs, pk, vk }
}

fn commit(attributes: &AttributeTuple) -> Commitment {
    CommitmentHasher::new().hash_attributes(attributes).unwrap()
}

#[test]
fn honest_prover_convinces_the_verifier() {
    let f = fixture();
    let attributes = record().to_attributes(&f.schema).unwrap();
    let commitment = commit(&attributes);

    let witness = WitnessBuilder::new(&f.cs).build(&attributes, &commitment).unwrap();
    let proof = prove(&f.cs, &f.pk, witness).unwrap();

    let public = PublicInputs::commitment(&commitment);
    assert!(verify(&proof, &f.vk, &public).unwrap());
}

#[test]
fn raising_the_star_count_breaks_the_opening() {
    let f = fixture();
    let attributes = record().to_attributes(&f.schema).unwrap();
    let commitment = commit(&attributes);

    let inflated = IdentityRecord {
        github_stars: 204,
        ..record()
    }
    .to_attributes(&f.schema)
    .unwrap();
    let err = WitnessBuilder::new(&f.cs).build(&inflated, &commitment).unwrap_err();
    assert_eq!(err, IdentityError::CommitmentMismatch);
}

#[test]
fn every_single_slot_change_is_caught() {
    let f = fixture();
    let attributes = record().to_attributes(&f.schema).unwrap();
    let commitment = commit(&attributes);
    let builder = WitnessBuilder::new(&f.cs);

    for slot in f.schema.slots() {
        let original = attributes.get(&f.schema, slot).unwrap();
        let bumped = Felt::from_biguint(&(original.to_biguint() + 1u32)).unwrap();
        let changed = attributes.with_value(&f.schema, slot, bumped).unwrap();
        assert_eq!(
            builder.build(&changed, &commitment).unwrap_err(),
            IdentityError::CommitmentMismatch,
            "slot {slot}"
        );
    }
}

#[test]
fn proof_does_not_verify_against_another_commitment() {
    let f = fixture();
    let attributes = record().to_attributes(&f.schema).unwrap();
    let commitment = commit(&attributes);
    let witness = WitnessBuilder::new(&f.cs).build(&attributes, &commitment).unwrap();
    let proof = prove(&f.cs, &f.pk, witness).unwrap();

    let other = commit(
        &IdentityRecord {
            balance: 1001,
            ..record()
        }
        .to_attributes(&f.schema)
        .unwrap(),
    );
    assert!(!verify(&proof, &f.vk, &PublicInputs::commitment(&other)).unwrap());
}

#[test]
fn proof_is_rejected_by_a_key_from_another_setup() {
    let f = fixture();
    let (_, foreign_vk) = setup(&f.cs, &mut StdRng::seed_from_u64(7)).unwrap();
    assert_ne!(foreign_vk.key_id(), f.vk.key_id());

    let attributes = record().to_attributes(&f.schema).unwrap();
    let commitment = commit(&attributes);
    let witness = WitnessBuilder::new(&f.cs).build(&attributes, &commitment).unwrap();
    let proof = prove(&f.cs, &f.pk, witness).unwrap();

    let public = PublicInputs::commitment(&commitment);
    assert!(!verify(&proof, &foreign_vk, &public).unwrap());
    assert!(verify(&proof, &f.vk, &public).unwrap());
}

#[test]
fn proving_key_from_another_circuit_is_refused() {
    let f = fixture();
    let tighter = compile(
        &CircuitDeclaration::attribute_commitment(f.schema.clone())
            .with_parameters(ProofParameters {
                num_queries: 9,
                ..ProofParameters::testing()
            }),
    )
    .unwrap();
    assert_ne!(tighter.id(), f.cs.id());
    let (other_pk, _) = setup(&tighter, &mut StdRng::seed_from_u64(1)).unwrap();

    let attributes = record().to_attributes(&f.schema).unwrap();
    let commitment = commit(&attributes);
    let witness = WitnessBuilder::new(&f.cs).build(&attributes, &commitment).unwrap();
    assert!(matches!(
        prove(&f.cs, &other_pk, witness),
        Err(IdentityError::KeyCircuitMismatch(_))
    ));
}

#[test]
fn proofs_are_randomized() {
    let f = fixture();
    let attributes = record().to_attributes(&f.schema).unwrap();
    let commitment = commit(&attributes);
    let builder = WitnessBuilder::new(&f.cs);

    let first = prove_with_rng(
        &f.cs,
        &f.pk,
        builder.build(&attributes, &commitment).unwrap(),
        &mut StdRng::seed_from_u64(1),
    )
    .unwrap();
    let second = prove_with_rng(
        &f.cs,
        &f.pk,
        builder.build(&attributes, &commitment).unwrap(),
        &mut StdRng::seed_from_u64(2),
    )
    .unwrap();

    assert_ne!(first.to_bytes().unwrap(), second.to_bytes().unwrap());
    let public = PublicInputs::commitment(&commitment);
    assert!(verify(&first, &f.vk, &public).unwrap());
    assert!(verify(&second, &f.vk, &public).unwrap());
}

#[test]
fn artifacts_survive_the_wire() {
    let f = fixture();
    let attributes = record().to_attributes(&f.schema).unwrap();
    let commitment = commit(&attributes);
    let witness = WitnessBuilder::new(&f.cs).build(&attributes, &commitment).unwrap();
    let proof = prove(&f.cs, &f.pk, witness).unwrap();

    let proof = Proof::from_bytes(&proof.to_bytes().unwrap()).unwrap();
    let vk = VerifyingKey::from_bytes(&f.vk.to_bytes().unwrap()).unwrap();
    let public = PublicInputs::commitment(&commitment);
    let public = PublicInputs::from_bytes(&public.to_bytes().unwrap()).unwrap();
    let cs = ConstraintSystem::from_bytes(&f.cs.to_bytes().unwrap()).unwrap();

    assert_eq!(cs.id(), f.cs.id());
    assert!(verify(&proof, &vk, &public).unwrap());
}

#[test]
fn malformed_proof_bytes_are_a_decode_error() {
    let f = fixture();
    let attributes = record().to_attributes(&f.schema).unwrap();
    let commitment = commit(&attributes);
    let witness = WitnessBuilder::new(&f.cs).build(&attributes, &commitment).unwrap();
    let bytes = prove(&f.cs, &f.pk, witness).unwrap().to_bytes().unwrap();

    let mut flipped = bytes.clone();
    let middle = flipped.len() / 2;
    flipped[middle] ^= 0x01;

    for bad in [&bytes[..bytes.len() / 3], &flipped[..], &[0u8; 16][..]] {
        assert!(matches!(
            Proof::from_bytes(bad),
            Err(IdentityError::ProofDecode(_))
        ));
    }
}

#[test]
fn signature_inputs_are_refused_by_a_commitment_key() {
    let f = fixture();
    let mut rng = rand::rng();
    let sk = SigningKey::random(&mut rng);
    let message = [BabyBear::from_u32(5)];
    let signature = sk.sign(&mut rng, &message).unwrap();
    let signature_inputs = PublicInputs::signature(&sk.verifying_key(), &message, &signature).unwrap();

    let attributes = record().to_attributes(&f.schema).unwrap();
    let commitment = commit(&attributes);
    let witness = WitnessBuilder::new(&f.cs).build(&attributes, &commitment).unwrap();
    let proof = prove(&f.cs, &f.pk, witness).unwrap();

    assert!(matches!(
        verify(&proof, &f.vk, &signature_inputs),
        Err(IdentityError::KeyCircuitMismatch(_))
    ));
}

#[test]
fn tuples_of_the_wrong_arity_never_reach_the_builder() {
    let f = fixture();
    let short: Vec<Felt> = (0..8).map(Felt::from_u64).collect();
    assert_eq!(
        AttributeTuple::new(&f.schema, short).unwrap_err(),
        IdentityError::InvalidArity {
            expected: 9,
            actual: 8
        }
    );
}

#[test]
fn independent_provers_run_concurrently() {
    let f = fixture();
    let records: Vec<IdentityRecord> = (0..3)
        .map(|i| IdentityRecord {
            txn_frequency: 100 + i,
            ..record()
        })
        .collect();

    std::thread::scope(|scope| {
        let handles: Vec<_> = records
            .iter()
            .map(|record| {
                let f = &f;
                scope.spawn(move || {
                    let attributes = record.to_attributes(&f.schema).unwrap();
                    let commitment = commit(&attributes);
                    let witness = WitnessBuilder::new(&f.cs).build(&attributes, &commitment).unwrap();
                    let proof = prove(&f.cs, &f.pk, witness).unwrap();
                    verify(&proof, &f.vk, &PublicInputs::commitment(&commitment)).unwrap()
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
    });
}
