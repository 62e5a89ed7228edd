use core::ops::{Add, AddAssign, Neg, Sub, SubAssign};

pub trait ScalarBits {
    fn to_u64_limbs(&self) -> [u64; 4];
}

pub trait Group:
    Sized + Copy + Add<Output = Self> + AddAssign + Sub<Output = Self> + SubAssign + Neg<Output = Self>
{
    type Scalar: ScalarBits;

    fn identity() -> Self;
    fn is_identity(&self) -> bool;
    fn generator() -> Self;
    fn double(&self) -> Self;

    /// `scalar * G`; implementors may use a fixed-base table.
    fn mul_generator(scalar: &Self::Scalar) -> Self {
        Self::generator().scalar_mul(scalar)
    }

    /// Right-to-left double-and-add.
    fn scalar_mul(&self, scalar: &Self::Scalar) -> Self {
        let mut result = Self::identity();
        let mut temp = *self;

        for limb in scalar.to_u64_limbs() {
            let mut bits = limb;
            for _ in 0..64 {
                if bits & 1 == 1 {
                    result += temp;
                }
                temp = temp.double();
                bits >>= 1;
            }
        }

        result
    }

    fn mul_u64(&self, n: u64) -> Self {
        let mut result = Self::identity();
        let mut temp = *self;
        let mut bits = n;

        while bits > 0 {
            if bits & 1 == 1 {
                result += temp;
            }
            temp = temp.double();
            bits >>= 1;
        }

        result
    }

    /// `a * self + b * other` with one shared doubling chain (Shamir's trick).
    fn double_scalar_mul(&self, a: &Self::Scalar, other: &Self, b: &Self::Scalar) -> Self {
        let a_limbs = a.to_u64_limbs();
        let b_limbs = b.to_u64_limbs();
        let both = *self + *other;
        let mut result = Self::identity();

        for limb_idx in (0..4).rev() {
            for shift in (0..64).rev() {
                result = result.double();
                let a_bit = (a_limbs[limb_idx] >> shift) & 1 == 1;
                let b_bit = (b_limbs[limb_idx] >> shift) & 1 == 1;
                match (a_bit, b_bit) {
                    (true, true) => result += both,
                    (true, false) => result += *self,
                    (false, true) => result += *other,
                    (false, false) => {}
                }
            }
        }

        result
    }
}
