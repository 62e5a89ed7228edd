use super::*;
use curve::{Affine, Group, ScalarField};
use p3_baby_bear::BabyBear;
use p3_field::PrimeCharacteristicRing;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn message(values: &[u32]) -> Vec<BabyBear> {
    values.iter().copied().map(BabyBear::from_u32).collect()
}

#[test]
fn test_sign_verify() {
    let mut rng = StdRng::seed_from_u64(42);
    let sk = SigningKey::random(&mut rng);
    let pk = sk.verifying_key();
    let msg = message(&[1, 2, 3]);

    let sig = sk.sign(&mut rng, &msg).expect("sign");
    assert!(pk.verify(&msg, &sig).expect("verify"));
}

#[test]
fn test_verify_rejects_wrong_message() {
    let mut rng = StdRng::seed_from_u64(42);
    let sk = SigningKey::random(&mut rng);
    let pk = sk.verifying_key();
    let sig = sk.sign(&mut rng, &message(&[10, 11, 12])).expect("sign");

    assert!(!pk.verify(&message(&[10, 11, 13]), &sig).expect("verify"));
}

#[test]
fn test_verify_rejects_wrong_key() {
    let mut rng = StdRng::seed_from_u64(42);
    let sk = SigningKey::random(&mut rng);
    let msg = message(&[21, 22, 23]);
    let sig = sk.sign(&mut rng, &msg).expect("sign");

    let wrong_pk = SigningKey::random(&mut rng).verifying_key();
    assert!(!wrong_pk.verify(&msg, &sig).expect("verify"));
}

#[test]
fn test_verify_rejects_tampered_response() {
    let mut rng = StdRng::seed_from_u64(5);
    let sk = SigningKey::random(&mut rng);
    let msg = message(&[7]);
    let mut sig = sk.sign(&mut rng, &msg).expect("sign");
    sig.s += ScalarField::ONE;

    assert!(!sk.verifying_key().verify(&msg, &sig).expect("verify"));
}

#[test]
fn test_signature_satisfies_group_equation() {
    let mut rng = StdRng::seed_from_u64(9);
    let sk = SigningKey::random(&mut rng);
    let pk = sk.verifying_key();
    let msg = message(&[4, 5]);
    let sig = sk.sign(&mut rng, &msg).expect("sign");

    let e = hash_challenge(&sig.r, &pk.as_affine(), &msg).expect("challenge");
    let lhs = <Affine as Group>::mul_generator(&sig.s);
    assert_eq!(lhs, sig.r + pk.as_affine() * e);
}

#[test]
fn test_infinity_key_is_rejected() {
    assert_eq!(
        VerifyingKey::from_affine(Affine::INFINITY),
        Err(SchnorrError::InvalidPoint)
    );
}

#[test]
fn test_byte_round_trips() {
    let mut rng = StdRng::seed_from_u64(1);
    let sk = SigningKey::random(&mut rng);
    let pk = sk.verifying_key();
    let sig = sk.sign(&mut rng, &message(&[8, 9])).expect("sign");

    let pk_bytes = pk.to_bytes().expect("encode key");
    assert_eq!(VerifyingKey::from_bytes(&pk_bytes), Ok(pk));

    let sig_bytes = sig.to_bytes().expect("encode signature");
    assert_eq!(Signature::from_bytes(&sig_bytes), Ok(sig));
    assert!(matches!(
        Signature::from_bytes(&sig_bytes[..sig_bytes.len() - 3]),
        Err(SchnorrError::Encoding { .. })
    ));
}

#[test]
fn test_off_curve_key_is_rejected() {
    let mut point = Affine::generator();
    point.y = point.x;
    assert_eq!(
        VerifyingKey::from_affine(point),
        Err(SchnorrError::NotOnCurve)
    );
}
