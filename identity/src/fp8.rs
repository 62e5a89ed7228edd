//! Constraint gadgets over the degree-8 extension of KoalaBear.
//!
//! An Fp8 value occupies [`COORD_LIMBS`] consecutive columns holding its
//! basis coefficients; multiplication reduces with `u^8 = W`.

use curve::{KoalaBear, COORD_LIMBS};
use p3_air::AirBuilder;
use p3_field::extension::BinomiallyExtendable;
use p3_field::PrimeCharacteristicRing;

pub(crate) type Fp8Expr<AB> = [<AB as AirBuilder>::Expr; COORD_LIMBS];

const CURVE_A_COEFF: u32 = 3;
const CURVE_B: u32 = 42639;

pub(crate) fn read_fp8<AB: AirBuilder<F = KoalaBear>>(row: &[AB::Var], start: usize) -> Fp8Expr<AB> {
    core::array::from_fn(|i| row[start + i].clone().into())
}

pub(crate) fn assert_fp8_eq<AB: AirBuilder<F = KoalaBear>>(
    builder: &mut AB,
    lhs: &Fp8Expr<AB>,
    rhs: &Fp8Expr<AB>,
) {
    for (l, r) in lhs.iter().zip(rhs) {
        builder.assert_eq(l.clone(), r.clone());
    }
}

pub(crate) fn fp8_constant<AB: AirBuilder<F = KoalaBear>>(index: usize, value: u32) -> Fp8Expr<AB> {
    core::array::from_fn(|i| {
        if i == index {
            AB::Expr::from(KoalaBear::from_u32(value))
        } else {
            AB::Expr::ZERO
        }
    })
}

pub(crate) fn fp8_one<AB: AirBuilder<F = KoalaBear>>() -> Fp8Expr<AB> {
    fp8_constant::<AB>(0, 1)
}

/// `a = 3u`
pub(crate) fn fp8_a<AB: AirBuilder<F = KoalaBear>>() -> Fp8Expr<AB> {
    fp8_constant::<AB>(1, CURVE_A_COEFF)
}

/// `b = 42639`
pub(crate) fn fp8_b<AB: AirBuilder<F = KoalaBear>>() -> Fp8Expr<AB> {
    fp8_constant::<AB>(0, CURVE_B)
}

pub(crate) fn fp8_add<AB: AirBuilder<F = KoalaBear>>(a: &Fp8Expr<AB>, b: &Fp8Expr<AB>) -> Fp8Expr<AB> {
    core::array::from_fn(|i| a[i].clone() + b[i].clone())
}

pub(crate) fn fp8_sub<AB: AirBuilder<F = KoalaBear>>(a: &Fp8Expr<AB>, b: &Fp8Expr<AB>) -> Fp8Expr<AB> {
    core::array::from_fn(|i| a[i].clone() - b[i].clone())
}

pub(crate) fn fp8_mul_scalar<AB: AirBuilder<F = KoalaBear>>(
    a: &Fp8Expr<AB>,
    scalar: KoalaBear,
) -> Fp8Expr<AB> {
    core::array::from_fn(|i| a[i].clone() * scalar)
}

/// Schoolbook product, folding `u^(8+k)` back as `W * u^k`.
pub(crate) fn fp8_mul<AB: AirBuilder<F = KoalaBear>>(a: &Fp8Expr<AB>, b: &Fp8Expr<AB>) -> Fp8Expr<AB> {
    let mut t = vec![AB::Expr::ZERO; 2 * COORD_LIMBS - 1];
    for (i, a_i) in a.iter().enumerate() {
        for (j, b_j) in b.iter().enumerate() {
            t[i + j] += a_i.clone() * b_j.clone();
        }
    }

    let w = <KoalaBear as BinomiallyExtendable<COORD_LIMBS>>::W;
    core::array::from_fn(|k| {
        let mut acc = t[k].clone();
        if k + COORD_LIMBS < t.len() {
            acc += t[k + COORD_LIMBS].clone() * w;
        }
        acc
    })
}

/// `y^2 = x^3 + a*x + b` for the point stored at `x_start` / `y_start`.
pub(crate) fn enforce_on_curve<AB: AirBuilder<F = KoalaBear>>(
    builder: &mut AB,
    row: &[AB::Var],
    x_start: usize,
    y_start: usize,
) {
    let x = read_fp8::<AB>(row, x_start);
    let y = read_fp8::<AB>(row, y_start);
    let y2 = fp8_mul::<AB>(&y, &y);
    let x3 = fp8_mul::<AB>(&fp8_mul::<AB>(&x, &x), &x);
    let ax = fp8_mul::<AB>(&x, &fp8_a::<AB>());
    let rhs = fp8_add::<AB>(&fp8_add::<AB>(&x3, &ax), &fp8_b::<AB>());
    assert_fp8_eq(builder, &y2, &rhs);
}

/// Columns witnessing one chord or tangent step: numerator, denominator,
/// denominator inverse and slope, in that order.
pub(crate) struct SlopeCols<AB: AirBuilder> {
    pub num: Fp8Expr<AB>,
    pub den: Fp8Expr<AB>,
    pub inv: Fp8Expr<AB>,
    pub slope: Fp8Expr<AB>,
}

impl<AB: AirBuilder<F = KoalaBear>> SlopeCols<AB> {
    pub(crate) fn read(row: &[AB::Var], start: usize) -> Self {
        Self {
            num: read_fp8::<AB>(row, start),
            den: read_fp8::<AB>(row, start + COORD_LIMBS),
            inv: read_fp8::<AB>(row, start + 2 * COORD_LIMBS),
            slope: read_fp8::<AB>(row, start + 3 * COORD_LIMBS),
        }
    }

    fn enforce_slope(&self, builder: &mut AB) {
        assert_fp8_eq(builder, &fp8_mul::<AB>(&self.den, &self.inv), &fp8_one::<AB>());
        assert_fp8_eq(builder, &self.slope, &fp8_mul::<AB>(&self.num, &self.inv));
    }
}

/// `(x3, y3) = (x1, y1) + (x2, y2)` for distinct x-coordinates.
pub(crate) fn enforce_add<AB: AirBuilder<F = KoalaBear>>(
    builder: &mut AB,
    lhs: (&Fp8Expr<AB>, &Fp8Expr<AB>),
    rhs: (&Fp8Expr<AB>, &Fp8Expr<AB>),
    step: &SlopeCols<AB>,
    out: (&Fp8Expr<AB>, &Fp8Expr<AB>),
) {
    let (x1, y1) = lhs;
    let (x2, y2) = rhs;
    assert_fp8_eq(builder, &step.num, &fp8_sub::<AB>(y2, y1));
    assert_fp8_eq(builder, &step.den, &fp8_sub::<AB>(x2, x1));
    step.enforce_slope(builder);

    let slope2 = fp8_mul::<AB>(&step.slope, &step.slope);
    let x3 = fp8_sub::<AB>(&fp8_sub::<AB>(&slope2, x1), x2);
    let y3 = fp8_sub::<AB>(&fp8_mul::<AB>(&step.slope, &fp8_sub::<AB>(x1, &x3)), y1);
    assert_fp8_eq(builder, out.0, &x3);
    assert_fp8_eq(builder, out.1, &y3);
}

/// `(x3, y3) = 2 * (x1, y1)`.
pub(crate) fn enforce_double<AB: AirBuilder<F = KoalaBear>>(
    builder: &mut AB,
    point: (&Fp8Expr<AB>, &Fp8Expr<AB>),
    step: &SlopeCols<AB>,
    out: (&Fp8Expr<AB>, &Fp8Expr<AB>),
) {
    let (x1, y1) = point;
    let x1_sq = fp8_mul::<AB>(x1, x1);
    let num = fp8_add::<AB>(&fp8_mul_scalar::<AB>(&x1_sq, KoalaBear::from_u32(3)), &fp8_a::<AB>());
    assert_fp8_eq(builder, &step.num, &num);
    assert_fp8_eq(builder, &step.den, &fp8_mul_scalar::<AB>(y1, KoalaBear::TWO));
    step.enforce_slope(builder);

    let slope2 = fp8_mul::<AB>(&step.slope, &step.slope);
    let x3 = fp8_sub::<AB>(&slope2, &fp8_mul_scalar::<AB>(x1, KoalaBear::TWO));
    let y3 = fp8_sub::<AB>(&fp8_mul::<AB>(&step.slope, &fp8_sub::<AB>(x1, &x3)), y1);
    assert_fp8_eq(builder, out.0, &x3);
    assert_fp8_eq(builder, out.1, &y3);
}
