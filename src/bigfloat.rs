use std::cmp::Ordering;
use std::f64::consts::LN_10;
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg};

use num_traits::Float;

/// Extended-range scalar: `mantissa * 10^exponent`.
///
/// Probability products over hundreds of spins underflow f64 long before they
/// become irrelevant to the mean-field log-odds, so the probability caches and
/// the interaction field accumulate in this representation instead.
///
/// Kept normalized after every operation: `|mantissa|` in `[1, 10)`, or
/// `mantissa == 0` with `exponent == 0`. Normalized form is unique per value,
/// so equality is plain field comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BigFloat {
    mantissa: f64,
    exponent: i64,
}

impl BigFloat {
    pub const ZERO: BigFloat = BigFloat {
        mantissa: 0.0,
        exponent: 0,
    };

    /// Build `base * 10^exp` and normalize.
    pub fn new(base: f64, exp: i64) -> Self {
        let mut value = BigFloat {
            mantissa: base,
            exponent: exp,
        };
        value.normalize();
        value
    }

    /// Build `10^log10` from a decimal exponent, e.g. `-7.5` -> `10^-0.5 * 10^-7`.
    ///
    /// This is how the interaction multiplier enters: the parameter is a
    /// decimal log, and the multiplier itself is usually far below f64's
    /// denormal range.
    pub fn from_decimal_log(log10: f64) -> Self {
        let whole = log10.trunc();
        BigFloat::new(10f64.powf(log10 - whole), whole as i64)
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.mantissa == 0.0
    }

    #[inline]
    pub fn mantissa(&self) -> f64 {
        self.mantissa
    }

    #[inline]
    pub fn exponent(&self) -> i64 {
        self.exponent
    }

    /// Scale the mantissa into `[1, 10)`. Zero and non-finite mantissas pin
    /// the exponent to 0; zero has no valid scale fixed point.
    fn normalize(&mut self) {
        if self.mantissa == 0.0 || !self.mantissa.is_finite() {
            self.exponent = 0;
            return;
        }
        while self.mantissa.abs() >= 10.0 {
            self.mantissa /= 10.0;
            self.exponent += 1;
        }
        while self.mantissa.abs() < 1.0 {
            self.mantissa *= 10.0;
            self.exponent -= 1;
        }
    }

    /// Natural log as a plain f64: `exponent * ln(10) + ln(mantissa)`.
    ///
    /// Turns a probability ratio into an additive field contribution without
    /// materializing the ratio in native precision. NaN for negative values,
    /// `-inf` for zero, as the math dictates.
    pub fn ln(&self) -> f64 {
        self.exponent as f64 * LN_10 + self.mantissa.ln()
    }

    /// Multiplicative inverse. Zero inverts to an infinite mantissa, which
    /// normalization pins at exponent 0.
    pub fn recip(&self) -> Self {
        BigFloat::new(self.mantissa.recip(), -self.exponent)
    }

    /// Narrow to f64, saturating at `f64::MAX` magnitude once the exponent
    /// leaves f64's decimal range instead of overflowing to infinity.
    pub fn to_f64(&self) -> f64 {
        if self.exponent >= f64::MAX_10_EXP as i64 {
            return f64::MAX * self.mantissa.signum();
        }
        // Below even the subnormal range the value is indistinguishable
        // from zero in native precision.
        if self.exponent < -350 {
            return 0.0;
        }
        self.mantissa * 10f64.powi(self.exponent as i32)
    }

    /// Narrow to any float type, saturating at the target's max magnitude.
    pub fn narrow<T: Float>(&self) -> T {
        let max = T::max_value().to_f64().unwrap_or(f64::MAX);
        let value = self.to_f64();
        if value > max {
            T::max_value()
        } else if value < -max {
            -T::max_value()
        } else {
            T::from(value).unwrap_or_else(T::nan)
        }
    }
}

impl Default for BigFloat {
    fn default() -> Self {
        BigFloat::ZERO
    }
}

impl From<f64> for BigFloat {
    fn from(value: f64) -> Self {
        BigFloat::new(value, 0)
    }
}

impl Add for BigFloat {
    type Output = BigFloat;

    fn add(self, rhs: BigFloat) -> BigFloat {
        // Zero operands skip alignment entirely.
        if rhs.mantissa == 0.0 {
            return self;
        }
        if self.mantissa == 0.0 {
            return rhs;
        }

        let mut out = self;
        if out.exponent < rhs.exponent {
            // Shift the smaller-exponent operand's mantissa down; it may
            // underflow to 0 when the gap is large, leaving rhs dominant.
            let diff = rhs.exponent - out.exponent;
            out.mantissa /= 10f64.powf(diff as f64);
            out.exponent = rhs.exponent;
        }
        out.mantissa += rhs.mantissa * 10f64.powf((rhs.exponent - out.exponent) as f64);
        out.normalize();
        out
    }
}

impl AddAssign for BigFloat {
    fn add_assign(&mut self, rhs: BigFloat) {
        *self = *self + rhs;
    }
}

impl Mul for BigFloat {
    type Output = BigFloat;

    fn mul(self, rhs: BigFloat) -> BigFloat {
        BigFloat::new(self.mantissa * rhs.mantissa, self.exponent + rhs.exponent)
    }
}

impl Mul<f64> for BigFloat {
    type Output = BigFloat;

    fn mul(self, rhs: f64) -> BigFloat {
        self * BigFloat::from(rhs)
    }
}

impl MulAssign for BigFloat {
    fn mul_assign(&mut self, rhs: BigFloat) {
        *self = *self * rhs;
    }
}

impl Div for BigFloat {
    type Output = BigFloat;

    fn div(self, rhs: BigFloat) -> BigFloat {
        self * rhs.recip()
    }
}

impl Div<f64> for BigFloat {
    type Output = BigFloat;

    fn div(self, rhs: f64) -> BigFloat {
        self * BigFloat::from(rhs).recip()
    }
}

impl Neg for BigFloat {
    type Output = BigFloat;

    fn neg(self) -> BigFloat {
        BigFloat {
            mantissa: -self.mantissa,
            exponent: self.exponent,
        }
    }
}

impl PartialOrd for BigFloat {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.mantissa * other.mantissa <= 0.0 {
            // Differing signs, or at least one zero: mantissa sign decides.
            return self.mantissa.partial_cmp(&other.mantissa);
        }
        // Same sign: a larger exponent means larger magnitude, which for
        // negative values means the smaller number.
        let negative = self.mantissa < 0.0;
        let by_exponent = if negative {
            other.exponent.cmp(&self.exponent)
        } else {
            self.exponent.cmp(&other.exponent)
        };
        match by_exponent {
            Ordering::Equal => self.mantissa.partial_cmp(&other.mantissa),
            ord => Some(ord),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn constructor_normalizes() {
        let x = BigFloat::new(123.0, 0);
        assert!((x.mantissa() - 1.23).abs() < 1e-12);
        assert_eq!(x.exponent(), 2);

        let y = BigFloat::new(0.004, 1);
        assert!((y.mantissa() - 4.0).abs() < 1e-12);
        assert_eq!(y.exponent(), -2);
    }

    #[test]
    fn zero_pins_exponent() {
        let z = BigFloat::new(0.0, 57);
        assert!(z.is_zero());
        assert_eq!(z.exponent(), 0);
        assert_eq!(z, BigFloat::ZERO);
    }

    #[test]
    fn round_trip_within_native_range() {
        for &v in &[1.0, -2.5, 3.7e-40, 9.999e100, -1.0e-200] {
            let x = BigFloat::from(v);
            let back = x.to_f64();
            assert!(
                ((back - v) / v).abs() < 1e-12,
                "round trip failed for {v}: got {back}"
            );
        }
    }

    #[test]
    fn add_aligns_exponents() {
        let a = BigFloat::new(1.0, 3);
        let b = BigFloat::new(5.0, 1);
        let sum = a + b;
        assert!((sum.to_f64() - 1050.0).abs() < 1e-9);
    }

    #[test]
    fn add_zero_is_identity() {
        let a = BigFloat::new(-3.2, -45);
        assert_eq!(a + BigFloat::ZERO, a);
        assert_eq!(BigFloat::ZERO + a, a);
    }

    #[test]
    fn add_swallows_far_smaller_operand() {
        let big = BigFloat::new(1.0, 100);
        let tiny = BigFloat::new(1.0, -100);
        assert_eq!(big + tiny, big);
    }

    #[test]
    fn log_of_product_is_sum_of_logs() {
        let a = BigFloat::new(3.7, -211);
        let b = BigFloat::new(1.2, 145);
        let lhs = (a * b).ln();
        let rhs = a.ln() + b.ln();
        assert!((lhs - rhs).abs() < 1e-9, "{lhs} vs {rhs}");
    }

    #[test]
    fn reciprocal_is_true_inverse() {
        let a = BigFloat::new(4.0, -387);
        let unit = a * a.recip();
        assert_eq!(unit.mantissa(), 1.0);
        assert_eq!(unit.exponent(), 0);

        let b = BigFloat::new(4.2, 250);
        let near_unit = b * b.recip();
        assert!((near_unit.to_f64() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn narrowing_saturates() {
        let huge = BigFloat::new(1.0, 400);
        assert_eq!(huge.to_f64(), f64::MAX);
        assert_eq!((-huge).to_f64(), -f64::MAX);

        // In f64 range but outside f32's.
        let wide = BigFloat::new(1.0, 100);
        assert_eq!(wide.narrow::<f32>(), f32::MAX);
        assert_eq!((-wide).narrow::<f32>(), -f32::MAX);
    }

    #[test]
    fn comparison_handles_signs_and_magnitudes() {
        let pos_small = BigFloat::new(2.0, -90);
        let pos_large = BigFloat::new(1.0, 5);
        let neg_small = BigFloat::new(-2.0, -90);
        let neg_large = BigFloat::new(-1.0, 5);

        assert!(pos_large > pos_small);
        assert!(pos_small > BigFloat::ZERO);
        assert!(neg_small < BigFloat::ZERO);
        assert!(pos_small > neg_large);
        assert!(neg_small > neg_large);
    }

    #[test]
    fn from_decimal_log_splits_fraction() {
        let m = BigFloat::from_decimal_log(-7.5);
        assert!((m.ln() - (-7.5 * LN_10)).abs() < 1e-9);
        let p = BigFloat::from_decimal_log(3.0);
        assert!((p.to_f64() - 1000.0).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn normalized_invariant_holds(m in -1e6f64..1e6f64, e in -500i64..500i64) {
            let x = BigFloat::new(m, e);
            if m == 0.0 {
                prop_assert_eq!(x.exponent(), 0);
            } else {
                prop_assert!(x.mantissa().abs() >= 1.0 && x.mantissa().abs() < 10.0);
            }
            // Normalization is idempotent: rebuilding from the parts is a no-op.
            let again = BigFloat::new(x.mantissa(), x.exponent());
            prop_assert_eq!(again, x);
        }

        #[test]
        fn product_log_additive(a in 1e-300f64..1e300f64, b in 1e-300f64..1e300f64) {
            let x = BigFloat::from(a);
            let y = BigFloat::from(b);
            let lhs = (x * y).ln();
            let rhs = x.ln() + y.ln();
            prop_assert!((lhs - rhs).abs() < 1e-6 * lhs.abs().max(1.0));
        }
    }
}
