//! Protocol field elements and their limb encoding.
//!
//! Attribute values live in the scalar field of the embedded curve (248 bits).
//! Circuits run over 31-bit STARK fields, so a [`Felt`] enters a trace as
//! [`FELT_LIMBS`] little-endian limbs of [`LIMB_BITS`] bits each.

use core::fmt;

use curve::ScalarField;
use num_bigint::BigUint;
use p3_field::PrimeCharacteristicRing;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::error::{IdentityError, IdentityResult};

pub const FELT_LIMBS: usize = 9;
pub const LIMB_BITS: usize = 28;

const LIMB_MASK: u32 = (1 << LIMB_BITS) - 1;

/// STARK field a circuit's wires live in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldId {
    BabyBear,
    KoalaBear,
}

impl FieldId {
    pub fn modulus(self) -> u32 {
        match self {
            Self::BabyBear => 0x7800_0001,
            Self::KoalaBear => 0x7f00_0001,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::BabyBear => "BabyBear",
            Self::KoalaBear => "KoalaBear",
        }
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An element of the 248-bit protocol field.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Zeroize)]
pub struct Felt(ScalarField);

impl Felt {
    pub const ZERO: Self = Self(ScalarField::ZERO);
    pub const ONE: Self = Self(ScalarField::ONE);

    pub fn from_u64(value: u64) -> Self {
        Self(ScalarField::from_u64(value))
    }

    pub fn from_bool(value: bool) -> Self {
        if value {
            Self::ONE
        } else {
            Self::ZERO
        }
    }

    /// Rejects values at or above the field modulus instead of reducing them.
    pub fn from_biguint(value: &BigUint) -> IdentityResult<Self> {
        ScalarField::from_biguint(value).map(Self).ok_or_else(|| {
            IdentityError::FieldMismatch(format!(
                "value of {} bits is not below the field modulus",
                value.bits()
            ))
        })
    }

    /// Parses a hexadecimal integer with an optional `0x` prefix.
    pub fn from_hex(input: &str) -> IdentityResult<Self> {
        let digits = input
            .strip_prefix("0x")
            .or_else(|| input.strip_prefix("0X"))
            .unwrap_or(input);
        if digits.is_empty() {
            return Err(IdentityError::InvalidAttribute(
                "empty hexadecimal value".into(),
            ));
        }
        let padded = if digits.len() % 2 == 1 {
            format!("0{digits}")
        } else {
            digits.to_owned()
        };
        let bytes = hex::decode(&padded).map_err(|err| {
            IdentityError::InvalidAttribute(format!("`{input}` is not hexadecimal: {err}"))
        })?;
        Self::from_biguint(&BigUint::from_bytes_be(&bytes))
    }

    pub fn to_biguint(&self) -> BigUint {
        self.0.to_biguint()
    }

    pub fn as_scalar(&self) -> &ScalarField {
        &self.0
    }

    /// Little-endian 28-bit limbs; every limb is below `2^28`.
    pub fn to_limb_values(&self) -> [u32; FELT_LIMBS] {
        core::array::from_fn(|limb| {
            (0..LIMB_BITS).fold(0u32, |acc, bit| {
                acc | (u32::from(self.0.bit(limb * LIMB_BITS + bit)) << bit)
            })
        })
    }

    /// Limbs lifted into a STARK field. Both 31-bit fields hold every limb exactly.
    pub fn to_limbs<F: PrimeCharacteristicRing>(&self) -> [F; FELT_LIMBS] {
        self.to_limb_values().map(F::from_u32)
    }

    /// Inverse of [`Felt::to_limb_values`]; `None` for oversized limbs or a
    /// non-canonical value.
    pub fn from_limb_values(limbs: &[u32; FELT_LIMBS]) -> Option<Self> {
        let mut words = [0u64; 4];
        for (index, &limb) in limbs.iter().enumerate() {
            if limb & !LIMB_MASK != 0 {
                return None;
            }
            for bit in 0..LIMB_BITS {
                if (limb >> bit) & 1 == 1 {
                    let position = index * LIMB_BITS + bit;
                    words[position / 64] |= 1 << (position % 64);
                }
            }
        }
        ScalarField::from_canonical_limbs(words).map(Self)
    }
}

impl From<u64> for Felt {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl From<bool> for Felt {
    fn from(value: bool) -> Self {
        Self::from_bool(value)
    }
}

impl From<ScalarField> for Felt {
    fn from(value: ScalarField) -> Self {
        Self(value)
    }
}

impl fmt::Debug for Felt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Felt({})", self.0)
    }
}

impl fmt::Display for Felt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use p3_baby_bear::BabyBear;
    use p3_field::PrimeField32;

    #[test]
    fn small_values_fill_the_first_limb() {
        let limbs = Felt::from_u64(1739983740).to_limb_values();
        assert_eq!(limbs[0], 1739983740 & LIMB_MASK);
        assert_eq!(limbs[1], 1739983740 >> LIMB_BITS);
        assert!(limbs[2..].iter().all(|&l| l == 0));
    }

    #[test]
    fn limbs_round_trip() {
        let value = -Felt::ONE.0;
        let felt = Felt::from(value);
        let limbs = felt.to_limb_values();
        assert!(limbs.iter().all(|&l| l <= LIMB_MASK));
        assert_eq!(Felt::from_limb_values(&limbs), Some(felt));
    }

    #[test]
    fn limbs_reject_oversized_entries() {
        let mut limbs = [0u32; FELT_LIMBS];
        limbs[0] = 1 << LIMB_BITS;
        assert_eq!(Felt::from_limb_values(&limbs), None);
    }

    #[test]
    fn limbs_reject_values_above_the_modulus() {
        assert_eq!(Felt::from_limb_values(&[LIMB_MASK; FELT_LIMBS]), None);
    }

    #[test]
    fn field_limbs_match_raw_limbs() {
        let felt = Felt::from_u64(u64::MAX);
        let lifted: [BabyBear; FELT_LIMBS] = felt.to_limbs();
        let raw = felt.to_limb_values();
        for (a, b) in lifted.iter().zip(raw) {
            assert_eq!(a.as_canonical_u32(), b);
        }
    }

    #[test]
    fn hex_parsing() {
        assert_eq!(Felt::from_hex("0xff").unwrap(), Felt::from_u64(255));
        assert_eq!(Felt::from_hex("abc").unwrap(), Felt::from_u64(0xabc));
        assert!(matches!(
            Felt::from_hex("0x"),
            Err(IdentityError::InvalidAttribute(_))
        ));
        assert!(matches!(
            Felt::from_hex("0xzz"),
            Err(IdentityError::InvalidAttribute(_))
        ));
    }

    #[test]
    fn hex_above_modulus_is_a_field_mismatch() {
        let too_big = "f".repeat(62);
        assert!(matches!(
            Felt::from_hex(&too_big),
            Err(IdentityError::FieldMismatch(_))
        ));
    }

    #[test]
    fn biguint_boundary() {
        let q = ScalarField::modulus();
        assert!(Felt::from_biguint(&(&q - 1u32)).is_ok());
        assert!(matches!(
            Felt::from_biguint(&q),
            Err(IdentityError::FieldMismatch(_))
        ));
    }
}
