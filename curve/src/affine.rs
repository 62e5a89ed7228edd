// E(GF((2130706433)^8)) : y^2 = x^3 + 3u*x + 42639
// E generator point (from SSWU on 'ZKM2'): (1195559694*u^7 + 1368232771*u^6 + 438909494*u^5 + 1825476283*u^4 + 1299273209*u^3 + 2115217807*u^2 + 1763905369*u + 1813646457 : 2077084094*u^7 + 434578416*u^6 + 125328769*u^5 + 1286889583*u^4 + 655051022*u^3 + 1365273355*u^2 + 840779000*u + 376996212 : 1)
// Curve prime order (hex): 0xf06e44682c2aa440f5f26a5ae1748ff85ccc2efc3068faf2154ff8a2e94d81
// Curve cofactor: 1

use core::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use std::sync::OnceLock;

use p3_field::{Field, PrimeCharacteristicRing};
use p3_koala_bear::KoalaBear;
use serde::{Deserialize, Serialize};

use crate::basefield::{from_coeffs, to_coeffs, BaseField, COORD_LIMBS};
use crate::{Group, ScalarField};

const GENERATOR_X: [u32; COORD_LIMBS] = [
    1813646457, 1763905369, 2115217807, 1299273209, 1825476283, 438909494, 1368232771, 1195559694,
];
const GENERATOR_Y: [u32; COORD_LIMBS] = [
    376996212, 840779000, 1365273355, 655051022, 1286889583, 125328769, 434578416, 2077084094,
];

/// Number of entries in the fixed-base table, one per scalar bit.
pub(crate) const GENERATOR_TABLE_LEN: usize = 256;

/// Affine point on the curve, or the point at infinity.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Affine {
    pub x: BaseField,
    pub y: BaseField,
    pub is_infinity: bool,
}

/// `a = 3u`
#[inline]
pub(crate) fn curve_a() -> BaseField {
    let mut coeffs = [KoalaBear::ZERO; COORD_LIMBS];
    coeffs[1] = KoalaBear::from_u32(3);
    from_coeffs(coeffs)
}

/// `b = 42639`
#[inline]
pub(crate) fn curve_b() -> BaseField {
    BaseField::from(KoalaBear::from_u32(42639))
}

impl Affine {
    pub const INFINITY: Self = Affine {
        x: BaseField::ZERO,
        y: BaseField::ZERO,
        is_infinity: true,
    };

    pub fn new(x: BaseField, y: BaseField) -> Self {
        Affine {
            x,
            y,
            is_infinity: false,
        }
    }

    /// Builds a finite point from raw coordinate coefficients.
    pub fn from_coeffs(x: [KoalaBear; COORD_LIMBS], y: [KoalaBear; COORD_LIMBS]) -> Self {
        Self::new(from_coeffs(x), from_coeffs(y))
    }

    pub fn x_coeffs(&self) -> [KoalaBear; COORD_LIMBS] {
        to_coeffs(&self.x)
    }

    pub fn y_coeffs(&self) -> [KoalaBear; COORD_LIMBS] {
        to_coeffs(&self.y)
    }

    #[inline]
    pub fn is_infinity(&self) -> bool {
        self.is_infinity
    }

    pub fn is_on_curve(&self) -> bool {
        if self.is_infinity {
            return true;
        }
        let rhs = self.x.cube() + curve_a() * self.x + curve_b();
        self.y.square() == rhs
    }

    pub fn generator() -> Self {
        Self::from_coeffs(
            GENERATOR_X.map(KoalaBear::from_u32),
            GENERATOR_Y.map(KoalaBear::from_u32),
        )
    }

    /// `[G, 2G, 4G, ..., 2^255 G]`, built once per process.
    pub fn generator_powers() -> &'static [Affine] {
        static TABLE: OnceLock<Vec<Affine>> = OnceLock::new();
        TABLE.get_or_init(|| {
            let mut table = Vec::with_capacity(GENERATOR_TABLE_LEN);
            let mut current = Affine::generator();
            for _ in 0..GENERATOR_TABLE_LEN {
                table.push(current);
                current = current.double();
            }
            table
        })
    }

    /// Slope form of the chord/tangent law: `x3 = l^2 - x1 - x2`, `y3 = l(x1 - x3) - y1`.
    #[inline]
    fn from_slope(&self, other_x: BaseField, slope: BaseField) -> Self {
        let x3 = slope.square() - self.x - other_x;
        let y3 = slope * (self.x - x3) - self.y;
        Affine::new(x3, y3)
    }

    pub fn double(&self) -> Self {
        if self.is_infinity || self.y.is_zero() {
            return Self::INFINITY;
        }
        let numerator = self.x.square() * BaseField::from(KoalaBear::from_u32(3)) + curve_a();
        let slope = numerator / self.y.double();
        self.from_slope(self.x, slope)
    }

    pub fn negate(&self) -> Self {
        if self.is_infinity {
            return *self;
        }
        Affine::new(self.x, -self.y)
    }
}

impl Group for Affine {
    type Scalar = ScalarField;

    #[inline]
    fn identity() -> Self {
        Self::INFINITY
    }

    #[inline]
    fn is_identity(&self) -> bool {
        self.is_infinity
    }

    #[inline]
    fn generator() -> Self {
        Affine::generator()
    }

    fn mul_generator(scalar: &ScalarField) -> Self {
        Affine::generator_powers()
            .iter()
            .enumerate()
            .filter(|(i, _)| scalar.bit(*i))
            .fold(Self::INFINITY, |acc, (_, point)| acc + *point)
    }

    #[inline]
    fn double(&self) -> Self {
        Affine::double(self)
    }
}

impl Add for Affine {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        if self.is_infinity {
            return other;
        }
        if other.is_infinity {
            return self;
        }
        if self.x == other.x {
            return if self.y == other.y {
                self.double()
            } else {
                Self::INFINITY
            };
        }
        let slope = (other.y - self.y) / (other.x - self.x);
        self.from_slope(other.x, slope)
    }
}

impl AddAssign for Affine {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

#[allow(clippy::suspicious_arithmetic_impl)]
impl Sub for Affine {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        self + other.negate()
    }
}

impl SubAssign for Affine {
    fn sub_assign(&mut self, other: Self) {
        *self = *self - other;
    }
}

impl Neg for Affine {
    type Output = Self;

    fn neg(self) -> Self {
        self.negate()
    }
}

impl Mul<ScalarField> for Affine {
    type Output = Self;

    fn mul(self, scalar: ScalarField) -> Self {
        self.scalar_mul(&scalar)
    }
}

impl Mul<&ScalarField> for Affine {
    type Output = Self;

    fn mul(self, scalar: &ScalarField) -> Self {
        self.scalar_mul(scalar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_infinity() {
        let inf = Affine::INFINITY;
        assert!(inf.is_infinity());
        assert!(inf.is_on_curve());
        assert_eq!(inf.double(), inf);
    }

    #[test]
    fn test_generator_on_curve() {
        let g = Affine::generator();
        assert!(g.is_on_curve());
        assert!(!g.is_infinity());
    }

    #[test]
    fn test_addition_with_infinity() {
        let g = Affine::generator();
        assert_eq!(g + Affine::INFINITY, g);
        assert_eq!(Affine::INFINITY + g, g);
    }

    #[test]
    fn test_doubling_matches_addition() {
        let g = Affine::generator();
        let g2 = g.double();
        assert!(g2.is_on_curve());
        assert_eq!(g + g, g2);
    }

    #[test]
    fn test_negation() {
        let g = Affine::generator();
        assert!((-g).is_on_curve());
        assert_eq!(g - g, Affine::INFINITY);
    }

    #[test]
    fn test_small_scalar_mul() {
        let g = Affine::generator();
        let five = g.scalar_mul(&ScalarField::from_u64(5));
        assert_eq!(five, g + g + g + g + g);
        assert_eq!(five, g.mul_u64(5));
        assert!(five.is_on_curve());
    }

    #[test]
    fn test_scalar_mul_edges() {
        let g = Affine::generator();
        assert_eq!(g * ScalarField::ZERO, Affine::INFINITY);
        assert_eq!(g * ScalarField::ONE, g);
    }

    #[test]
    fn test_order_annihilates_generator() {
        let g = Affine::generator();
        let minus_one = -ScalarField::ONE;
        // (q - 1) * G + G = q * G = O
        assert_eq!(g * minus_one + g, Affine::INFINITY);
    }

    #[test]
    fn test_distributes_over_scalar_addition() {
        let g = Affine::generator();
        let a = ScalarField::from_u64(3);
        let b = ScalarField::from_u64(5);
        assert_eq!(g * (a + b), g * a + g * b);
    }

    #[test]
    fn test_mul_generator_uses_table_consistently() {
        let mut rng = StdRng::seed_from_u64(7);
        let scalar = ScalarField::random(&mut rng);
        let expected = Affine::generator().scalar_mul(&scalar);
        assert_eq!(<Affine as Group>::mul_generator(&scalar), expected);
    }

    #[test]
    fn test_generator_powers_double() {
        let table = Affine::generator_powers();
        assert_eq!(table.len(), GENERATOR_TABLE_LEN);
        assert_eq!(table[0], Affine::generator());
        assert_eq!(table[3], Affine::generator().mul_u64(8));
    }

    #[test]
    fn test_double_scalar_mul() {
        let mut rng = StdRng::seed_from_u64(11);
        let g = Affine::generator();
        let p = g.mul_u64(987_654_321);
        let a = ScalarField::random(&mut rng);
        let b = ScalarField::random(&mut rng);
        assert_eq!(g.double_scalar_mul(&a, &p, &b), g * a + p * b);
    }
}
