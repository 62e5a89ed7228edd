//! Proves possession of a Schnorr signature without revealing it.

use std::time::Instant;

use identity_zk::{
    compile, prove, setup, verify, CircuitDeclaration, ProofParameters, SignatureMaterial,
    SigningKey, WitnessBuilder,
};
use p3_baby_bear::BabyBear;
use p3_field::PrimeCharacteristicRing;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut rng = rand::rng();
    let signer = SigningKey::random(&mut rng);
    let message: Vec<BabyBear> = [1u32, 203, 300400].map(BabyBear::from_u32).to_vec();
    let signature = signer.sign(&mut rng, &message)?;
    let material = SignatureMaterial::new(signer.verifying_key(), message, signature);

    let cs = compile(
        &CircuitDeclaration::signature_possession().with_parameters(ProofParameters::default()),
    )?;
    let (pk, vk) = setup(&cs, &mut rng)?;

    let witness = WitnessBuilder::new(&cs).build_signature(&material)?;
    let public = witness.public_inputs().clone();

    let prove_start = Instant::now();
    let proof = prove(&cs, &pk, witness)?;
    let prove_time = prove_start.elapsed();

    let verify_start = Instant::now();
    let valid = verify(&proof, &vk, &public)?;
    let verify_time = verify_start.elapsed();

    println!("Proving time: {prove_time:?}");
    println!("Proof size (bytes): {}", proof.size());
    println!("Verification time: {verify_time:?}");
    println!("Valid: {valid}");
    Ok(())
}
