//! Scalar field of the curve, q = 0xf06e44682c2aa440f5f26a5ae1748ff85ccc2efc3068faf2154ff8a2e94d81.
//!
//! Elements are stored as canonical little-endian `[u64; 4]` limbs. Products
//! go through Montgomery reduction internally and are mapped straight back, so
//! equality, hashing and serialization all see the canonical value.

use core::fmt::{self, Debug, Display, Formatter};
use core::iter::{Product, Sum};
use core::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};
use num_bigint::BigUint;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::group::ScalarBits;

/// Bit length of the field modulus.
pub const SCALAR_BITS: usize = 248;

const MODULUS: [u64; 4] = [
    0xf2154ff8a2e94d81,
    0xf85ccc2efc3068fa,
    0x40f5f26a5ae1748f,
    0x00f06e44682c2aa4,
];

// 2^512 mod q
const R2: [u64; 4] = [
    0x23eabb3eaf3c12e3,
    0xefbc3b2088f7b0f7,
    0x0943bc9a31f37148,
    0x004497b874228e49,
];

// -q^{-1} mod 2^64
const MU: u64 = 0x921d21f874d30d7f;

/// Element of the curve's scalar field.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Zeroize)]
#[serde(try_from = "[u64; 4]", into = "[u64; 4]")]
pub struct ScalarField {
    limbs: [u64; 4],
}

impl ScalarField {
    pub const ZERO: Self = Self { limbs: [0; 4] };
    pub const ONE: Self = Self {
        limbs: [1, 0, 0, 0],
    };

    #[inline]
    pub fn from_u64(value: u64) -> Self {
        Self {
            limbs: [value, 0, 0, 0],
        }
    }

    /// Accepts canonical limbs only; `None` when the value is not below q.
    pub fn from_canonical_limbs(limbs: [u64; 4]) -> Option<Self> {
        is_canonical(limbs).then_some(Self { limbs })
    }

    #[inline]
    pub fn to_canonical_limbs(&self) -> [u64; 4] {
        self.limbs
    }

    pub fn from_biguint(value: &BigUint) -> Option<Self> {
        if value >= &Self::modulus() {
            return None;
        }
        Some(Self {
            limbs: biguint_to_limbs(value),
        })
    }

    pub fn from_biguint_reduced(value: &BigUint) -> Self {
        let reduced = value % Self::modulus();
        Self {
            limbs: biguint_to_limbs(&reduced),
        }
    }

    pub fn to_biguint(&self) -> BigUint {
        limbs_to_biguint(self.limbs)
    }

    pub fn from_le_bytes(bytes: &[u8; 32]) -> Option<Self> {
        let limbs = core::array::from_fn(|i| {
            let mut word = [0u8; 8];
            word.copy_from_slice(&bytes[i * 8..(i + 1) * 8]);
            u64::from_le_bytes(word)
        });
        Self::from_canonical_limbs(limbs)
    }

    pub fn to_le_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        for (chunk, limb) in out.chunks_exact_mut(8).zip(self.limbs.iter()) {
            chunk.copy_from_slice(&limb.to_le_bytes());
        }
        out
    }

    pub fn modulus() -> BigUint {
        limbs_to_biguint(MODULUS)
    }

    /// Uniform sample by rejection on 248-bit candidates.
    pub fn random<R: RngCore + ?Sized>(rng: &mut R) -> Self {
        let mut bytes = [0u8; 32];
        loop {
            rng.fill_bytes(&mut bytes);
            bytes[31] = 0;
            if let Some(value) = Self::from_le_bytes(&bytes) {
                bytes.zeroize();
                return value;
            }
        }
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.limbs == [0; 4]
    }

    /// Multiplicative inverse via Fermat; `None` for zero.
    pub fn try_inverse(&self) -> Option<Self> {
        if self.is_zero() {
            return None;
        }
        let q = Self::modulus();
        let exp = &q - BigUint::from(2u32);
        Self::from_biguint(&self.to_biguint().modpow(&exp, &q))
    }

    /// Bit `i` of the canonical value, least significant first.
    #[inline]
    pub fn bit(&self, i: usize) -> bool {
        i < 256 && (self.limbs[i / 64] >> (i % 64)) & 1 == 1
    }
}

impl TryFrom<[u64; 4]> for ScalarField {
    type Error = &'static str;

    fn try_from(limbs: [u64; 4]) -> Result<Self, Self::Error> {
        Self::from_canonical_limbs(limbs).ok_or("scalar is not canonical")
    }
}

impl From<ScalarField> for [u64; 4] {
    fn from(value: ScalarField) -> Self {
        value.limbs
    }
}

impl ScalarBits for ScalarField {
    #[inline]
    fn to_u64_limbs(&self) -> [u64; 4] {
        self.limbs
    }
}

fn limbs_to_biguint(limbs: [u64; 4]) -> BigUint {
    let digits: Vec<u32> = limbs
        .iter()
        .flat_map(|limb| [*limb as u32, (*limb >> 32) as u32])
        .collect();
    BigUint::new(digits)
}

fn biguint_to_limbs(value: &BigUint) -> [u64; 4] {
    let mut limbs = [0u64; 4];
    for (slot, digit) in limbs.iter_mut().zip(value.iter_u64_digits()) {
        *slot = digit;
    }
    limbs
}

#[inline]
const fn carrying_add(a: u64, b: u64, carry: bool) -> (u64, bool) {
    let (sum, o1) = a.overflowing_add(b);
    let (sum, o2) = sum.overflowing_add(carry as u64);
    (sum, o1 || o2)
}

#[inline]
const fn borrowing_sub(a: u64, b: u64, borrow: bool) -> (u64, bool) {
    let (diff, o1) = a.overflowing_sub(b);
    let (diff, o2) = diff.overflowing_sub(borrow as u64);
    (diff, o1 || o2)
}

/// `a - b` over 256 bits, with the final borrow.
#[inline]
fn sub_with_borrow(a: [u64; 4], b: [u64; 4]) -> ([u64; 4], bool) {
    let mut out = [0u64; 4];
    let mut borrow = false;
    for i in 0..4 {
        (out[i], borrow) = borrowing_sub(a[i], b[i], borrow);
    }
    (out, borrow)
}

#[inline]
fn is_canonical(limbs: [u64; 4]) -> bool {
    sub_with_borrow(limbs, MODULUS).1
}

fn add_mod(a: [u64; 4], b: [u64; 4]) -> [u64; 4] {
    let mut sum = [0u64; 4];
    let mut carry = false;
    for i in 0..4 {
        (sum[i], carry) = carrying_add(a[i], b[i], carry);
    }
    // q < 2^248, so the sum never overflows 256 bits.
    let (reduced, borrow) = sub_with_borrow(sum, MODULUS);
    if borrow {
        sum
    } else {
        reduced
    }
}

fn sub_mod(a: [u64; 4], b: [u64; 4]) -> [u64; 4] {
    let (diff, borrow) = sub_with_borrow(a, b);
    if !borrow {
        return diff;
    }
    let mut out = [0u64; 4];
    let mut carry = false;
    for i in 0..4 {
        (out[i], carry) = carrying_add(diff[i], MODULUS[i], carry);
    }
    out
}

/// Montgomery product `a * b * 2^-256 mod q`.
fn montgomery_mul(a: [u64; 4], b: [u64; 4]) -> [u64; 4] {
    let mut t = [0u64; 8];
    for i in 0..4 {
        let mut carry = 0u128;
        for j in 0..4 {
            let product = (a[i] as u128) * (b[j] as u128) + (t[i + j] as u128) + carry;
            t[i + j] = product as u64;
            carry = product >> 64;
        }
        t[i + 4] = carry as u64;
    }

    for i in 0..4 {
        let k = t[i].wrapping_mul(MU);
        let mut carry = 0u128;
        for j in 0..4 {
            let product = (k as u128) * (MODULUS[j] as u128) + (t[i + j] as u128) + carry;
            t[i + j] = product as u64;
            carry = product >> 64;
        }
        for slot in t.iter_mut().skip(i + 4) {
            let sum = (*slot as u128) + carry;
            *slot = sum as u64;
            carry = sum >> 64;
        }
    }

    let high = [t[4], t[5], t[6], t[7]];
    let (reduced, borrow) = sub_with_borrow(high, MODULUS);
    if borrow {
        high
    } else {
        reduced
    }
}

impl Add for ScalarField {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self {
            limbs: add_mod(self.limbs, rhs.limbs),
        }
    }
}

impl AddAssign for ScalarField {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for ScalarField {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self {
            limbs: sub_mod(self.limbs, rhs.limbs),
        }
    }
}

impl SubAssign for ScalarField {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Neg for ScalarField {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::ZERO - self
    }
}

impl Mul for ScalarField {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        // (a*b/R) * R^2 / R = a*b
        let reduced = montgomery_mul(self.limbs, rhs.limbs);
        Self {
            limbs: montgomery_mul(reduced, R2),
        }
    }
}

impl MulAssign for ScalarField {
    #[inline]
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl Sum for ScalarField {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, x| acc + x)
    }
}

impl Product for ScalarField {
    fn product<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ONE, |acc, x| acc * x)
    }
}

impl Display for ScalarField {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "0x{:016x}{:016x}{:016x}{:016x}",
            self.limbs[3], self.limbs[2], self.limbs[1], self.limbs[0]
        )
    }
}

impl Debug for ScalarField {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "ScalarField({})", self)
    }
}
