use identity_zk::{
    compile, prove, setup, verify, Artifact, CircuitDeclaration, ConstraintSystem, IdentityError,
    ProofParameters, ProvingKey, PublicInputs, SignatureMaterial, SigningKey, VerifyingKey,
    WitnessBuilder,
};
use p3_baby_bear::BabyBear;
use p3_field::PrimeCharacteristicRing;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn keys() -> (ConstraintSystem, ProvingKey, VerifyingKey) {
    let declaration =
        CircuitDeclaration::signature_possession().with_parameters(ProofParameters::testing());
    let cs = compile(&declaration).unwrap();
    let (pk, vk) = setup(&cs, &mut StdRng::seed_from_u64(3)).unwrap();
    (cs, pk, vk)
}

fn message(values: &[u32]) -> Vec<BabyBear> {
    values.iter().copied().map(BabyBear::from_u32).collect()
}

#[test]
fn signature_holder_convinces_the_verifier() {
    let (cs, pk, vk) = keys();
    let mut rng = StdRng::seed_from_u64(99);
    let signer = SigningKey::random(&mut rng);
    let msg = message(&[1, 203, 1739983740]);
    let signature = signer.sign(&mut rng, &msg).unwrap();
    let material = SignatureMaterial::new(signer.verifying_key(), msg, signature);

    let witness = WitnessBuilder::new(&cs).build_signature(&material).unwrap();
    let public = witness.public_inputs().clone();
    let proof = prove(&cs, &pk, witness).unwrap();

    assert!(verify(&proof, &vk, &public).unwrap());
    assert_eq!(public, material.public_inputs().unwrap());
}

#[test]
fn proof_is_bound_to_the_signed_message() {
    let (cs, pk, vk) = keys();
    let mut rng = StdRng::seed_from_u64(5);
    let signer = SigningKey::random(&mut rng);
    let msg = message(&[10, 20]);
    let signature = signer.sign(&mut rng, &msg).unwrap();
    let material = SignatureMaterial::new(signer.verifying_key(), msg, signature);

    let witness = WitnessBuilder::new(&cs).build_signature(&material).unwrap();
    let proof = prove(&cs, &pk, witness).unwrap();

    let other = PublicInputs::signature(&signer.verifying_key(), &message(&[10, 21]), &signature)
        .unwrap();
    assert!(!verify(&proof, &vk, &other).unwrap());
}

#[test]
fn forged_signature_yields_no_witness() {
    let (cs, _, _) = keys();
    let mut rng = StdRng::seed_from_u64(8);
    let signer = SigningKey::random(&mut rng);
    let impostor = SigningKey::random(&mut rng);
    let msg = message(&[4, 2]);
    let signature = impostor.sign(&mut rng, &msg).unwrap();
    let material = SignatureMaterial::new(signer.verifying_key(), msg, signature);

    assert!(matches!(
        WitnessBuilder::new(&cs).build_signature(&material),
        Err(IdentityError::ConstraintUnsatisfied(_))
    ));
}

#[test]
fn signature_statement_survives_the_wire() {
    let (cs, pk, vk) = keys();
    let mut rng = StdRng::seed_from_u64(17);
    let signer = SigningKey::random(&mut rng);
    let msg = message(&[3, 1, 4]);
    let signature = signer.sign(&mut rng, &msg).unwrap();
    let material = SignatureMaterial::new(signer.verifying_key(), msg.clone(), signature);

    let witness = WitnessBuilder::new(&cs).build_signature(&material).unwrap();
    let proof = prove(&cs, &pk, witness).unwrap();

    let public = material.public_inputs().unwrap();
    let public = PublicInputs::from_bytes(&public.to_bytes().unwrap()).unwrap();
    assert_eq!(public.message(), Some(msg));
    assert_eq!(public.public_key(), Some(signer.verifying_key()));
    assert!(verify(&proof, &vk, &public).unwrap());
}
