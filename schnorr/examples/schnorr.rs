use p3_baby_bear::BabyBear;
use p3_field::PrimeCharacteristicRing;
use rand::SeedableRng;
use rand::rngs::StdRng;
use schnorr::{Signature, SigningKey, VerifyingKey};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = StdRng::seed_from_u64(42);
    let sk = SigningKey::random(&mut rng);
    let vk = VerifyingKey::from(&sk);

    let msg: Vec<BabyBear> = b"hello schnorr"
        .iter()
        .map(|b| BabyBear::from_u32(u32::from(*b)))
        .collect();

    let sig = sk.sign(&mut rng, &msg)?;
    let vk_bytes = vk.to_bytes()?;
    let sig_bytes = sig.to_bytes()?;
    println!("verifying key: {} bytes, signature: {} bytes", vk_bytes.len(), sig_bytes.len());

    let vk = VerifyingKey::from_bytes(&vk_bytes)?;
    let sig = Signature::from_bytes(&sig_bytes)?;
    assert!(vk.verify(&msg, &sig)?);
    println!("signature verified");
    Ok(())
}
