//! IEEE 754 semantics over raw `(sign, exponent, significand)` fields.
//!
//! Values of any format `(eb, sb)` are handled exactly with big integers:
//! arithmetic computes the exact result and rounds it once.

use crate::ast::RoundingMode;
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, Zero};
use std::cmp::Ordering;

/// A floating-point value as its three bit fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FpBits {
    /// Sign bit.
    pub sign: bool,
    /// Biased exponent field, `eb` bits.
    pub exp: BigInt,
    /// Trailing significand field, `sb - 1` bits.
    pub sig: BigInt,
    /// Exponent width.
    pub eb: u32,
    /// Significand width including the hidden bit.
    pub sb: u32,
}

fn ones(width: u32) -> BigInt {
    (BigInt::one() << width) - 1
}

impl FpBits {
    /// The canonical NaN: positive sign, all-ones exponent, significand `0..01`.
    #[must_use]
    pub fn nan(eb: u32, sb: u32) -> Self {
        Self {
            sign: false,
            exp: ones(eb),
            sig: BigInt::one(),
            eb,
            sb,
        }
    }

    /// Signed zero.
    #[must_use]
    pub fn zero(sign: bool, eb: u32, sb: u32) -> Self {
        Self {
            sign,
            exp: BigInt::zero(),
            sig: BigInt::zero(),
            eb,
            sb,
        }
    }

    /// Signed infinity.
    #[must_use]
    pub fn infinity(sign: bool, eb: u32, sb: u32) -> Self {
        Self {
            sign,
            exp: ones(eb),
            sig: BigInt::zero(),
            eb,
            sb,
        }
    }

    /// Largest finite magnitude with the given sign.
    #[must_use]
    pub fn max_finite(sign: bool, eb: u32, sb: u32) -> Self {
        Self {
            sign,
            exp: ones(eb) - 1,
            sig: ones(sb - 1),
            eb,
            sb,
        }
    }

    fn bias(&self) -> i64 {
        (1i64 << (self.eb - 1)) - 1
    }

    fn exp_all_ones(&self) -> bool {
        self.exp == ones(self.eb)
    }

    /// NaN?
    #[must_use]
    pub fn is_nan(&self) -> bool {
        self.exp_all_ones() && !self.sig.is_zero()
    }

    /// ±infinity?
    #[must_use]
    pub fn is_infinite(&self) -> bool {
        self.exp_all_ones() && self.sig.is_zero()
    }

    /// ±zero?
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.exp.is_zero() && self.sig.is_zero()
    }

    /// Normal number?
    #[must_use]
    pub fn is_normal(&self) -> bool {
        !self.exp.is_zero() && !self.exp_all_ones()
    }

    /// Subnormal number?
    #[must_use]
    pub fn is_subnormal(&self) -> bool {
        self.exp.is_zero() && !self.sig.is_zero()
    }

    /// Negative and not NaN.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.sign && !self.is_nan()
    }

    /// Positive and not NaN.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        !self.sign && !self.is_nan()
    }

    /// Flip the sign bit.
    #[must_use]
    pub fn neg(&self) -> Self {
        Self {
            sign: !self.sign,
            ..self.clone()
        }
    }

    /// Clear the sign bit.
    #[must_use]
    pub fn abs(&self) -> Self {
        Self {
            sign: false,
            ..self.clone()
        }
    }

    /// Exact magnitude `m * 2^e` of a finite value.
    fn exact(&self) -> (BigInt, i64) {
        let p = i64::from(self.sb);
        let emin = 1 - self.bias();
        if self.exp.is_zero() {
            (self.sig.clone(), emin - (p - 1))
        } else {
            let biased = i64::try_from(&self.exp).unwrap_or(i64::MAX);
            let m = &self.sig + (BigInt::one() << (self.sb - 1));
            (m, biased - self.bias() - (p - 1))
        }
    }

    /// Signed magnitude key; monotone in the represented value, both zeros map to 0.
    fn order_key(&self) -> BigInt {
        if self.is_zero() {
            return BigInt::zero();
        }
        let mag = (&self.exp << (self.sb - 1)) + &self.sig;
        if self.sign { -mag } else { mag }
    }

    /// SMT-LIB `=`: NaNs are equal to each other, zeros of different sign are not.
    #[must_use]
    pub fn smt_eq(&self, other: &Self) -> bool {
        if self.is_nan() || other.is_nan() {
            return self.is_nan() && other.is_nan();
        }
        self.sign == other.sign && self.exp == other.exp && self.sig == other.sig
    }

    /// IEEE comparison; `None` when unordered (a NaN is involved).
    #[must_use]
    pub fn ieee_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.is_nan() || other.is_nan() {
            return None;
        }
        Some(self.order_key().cmp(&other.order_key()))
    }

    /// `fp.eq`.
    #[must_use]
    pub fn fp_eq(&self, other: &Self) -> bool {
        self.ieee_cmp(other) == Some(Ordering::Equal)
    }

    /// `fp.lt`.
    #[must_use]
    pub fn fp_lt(&self, other: &Self) -> bool {
        self.ieee_cmp(other) == Some(Ordering::Less)
    }

    /// `fp.leq`.
    #[must_use]
    pub fn fp_leq(&self, other: &Self) -> bool {
        matches!(
            self.ieee_cmp(other),
            Some(Ordering::Less | Ordering::Equal)
        )
    }

    /// `fp.add`.
    #[must_use]
    pub fn add(&self, rm: RoundingMode, other: &Self) -> Self {
        let (eb, sb) = (self.eb, self.sb);
        if self.is_nan() || other.is_nan() {
            return Self::nan(eb, sb);
        }
        match (self.is_infinite(), other.is_infinite()) {
            (true, true) if self.sign != other.sign => return Self::nan(eb, sb),
            (true, _) => return self.clone(),
            (false, true) => return other.clone(),
            _ => {}
        }
        match (self.is_zero(), other.is_zero()) {
            (true, true) => {
                let sign = if rm == RoundingMode::RTN {
                    self.sign || other.sign
                } else {
                    self.sign && other.sign
                };
                return Self::zero(sign, eb, sb);
            }
            (true, false) => return other.clone(),
            (false, true) => return self.clone(),
            _ => {}
        }
        let (ma, ea) = self.exact();
        let (mb, eb_) = other.exact();
        let ma = if self.sign { -ma } else { ma };
        let mb = if other.sign { -mb } else { mb };
        let e = ea.min(eb_);
        let m = (ma << (ea - e) as usize) + (mb << (eb_ - e) as usize);
        if m.is_zero() {
            return Self::zero(rm == RoundingMode::RTN, eb, sb);
        }
        round(m.is_negative(), m.abs(), e, rm, eb, sb)
    }

    /// `fp.mul`.
    #[must_use]
    pub fn mul(&self, rm: RoundingMode, other: &Self) -> Self {
        let (eb, sb) = (self.eb, self.sb);
        if self.is_nan() || other.is_nan() {
            return Self::nan(eb, sb);
        }
        let sign = self.sign != other.sign;
        if self.is_infinite() || other.is_infinite() {
            if self.is_zero() || other.is_zero() {
                return Self::nan(eb, sb);
            }
            return Self::infinity(sign, eb, sb);
        }
        if self.is_zero() || other.is_zero() {
            return Self::zero(sign, eb, sb);
        }
        let (ma, ea) = self.exact();
        let (mb, eb_) = other.exact();
        round(sign, ma * mb, ea + eb_, rm, eb, sb)
    }
}

/// Round the exact positive magnitude `m * 2^e` into format `(eb, sb)`.
fn round(sign: bool, m: BigInt, e: i64, rm: RoundingMode, eb: u32, sb: u32) -> FpBits {
    debug_assert!(m.is_positive());
    let bias = (1i64 << (eb - 1)) - 1;
    let emin = 1 - bias;
    let emax = bias;
    let p = i64::from(sb);

    let top = e + m.bits() as i64 - 1;
    let mut lsb = (top - (p - 1)).max(emin - (p - 1));
    let shift = lsb - e;
    let mut q = if shift <= 0 {
        m << (-shift) as usize
    } else {
        let shift = shift as usize;
        let q = &m >> shift;
        let r = &m - (&q << shift);
        let half = BigInt::one() << (shift - 1);
        let round_up = match rm {
            RoundingMode::RNE => r > half || (r == half && q.is_odd()),
            RoundingMode::RNA => r >= half,
            RoundingMode::RTP => !r.is_zero() && !sign,
            RoundingMode::RTN => !r.is_zero() && sign,
            RoundingMode::RTZ => false,
        };
        if round_up { q + 1 } else { q }
    };
    if q.bits() as i64 > p {
        // carry out of the significand; q is a power of two
        q >>= 1;
        lsb += 1;
    }
    if q.is_zero() {
        return FpBits::zero(sign, eb, sb);
    }
    let top = lsb + q.bits() as i64 - 1;
    if top > emax {
        let to_infinity = match rm {
            RoundingMode::RNE | RoundingMode::RNA => true,
            RoundingMode::RTP => !sign,
            RoundingMode::RTN => sign,
            RoundingMode::RTZ => false,
        };
        return if to_infinity {
            FpBits::infinity(sign, eb, sb)
        } else {
            FpBits::max_finite(sign, eb, sb)
        };
    }
    if q.bits() as i64 == p {
        FpBits {
            sign,
            exp: BigInt::from(top + bias),
            sig: q - (BigInt::one() << (sb - 1)),
            eb,
            sb,
        }
    } else {
        FpBits {
            sign,
            exp: BigInt::zero(),
            sig: q,
            eb,
            sb,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // half precision
    const EB: u32 = 5;
    const SB: u32 = 11;

    fn half(bits: u16) -> FpBits {
        FpBits {
            sign: bits >> 15 == 1,
            exp: BigInt::from((bits >> 10) & 0x1f),
            sig: BigInt::from(bits & 0x3ff),
            eb: EB,
            sb: SB,
        }
    }

    #[test]
    fn test_classification() {
        assert!(half(0x7e00).is_nan());
        assert!(half(0x7c00).is_infinite());
        assert!(half(0x8000).is_zero());
        assert!(half(0x0001).is_subnormal());
        assert!(half(0x3c00).is_normal());
        assert!(half(0xbc00).is_negative());
        assert!(!FpBits::nan(EB, SB).is_positive());
    }

    #[test]
    fn test_add_exact_and_rounded() {
        // 1.0 + 1.0 = 2.0
        assert_eq!(half(0x3c00).add(RoundingMode::RNE, &half(0x3c00)), half(0x4000));
        // 1.0 + 2^-11 ties to even: stays 1.0
        let tiny = half(0x1000);
        assert_eq!(half(0x3c00).add(RoundingMode::RNE, &tiny), half(0x3c00));
        assert_eq!(half(0x3c00).add(RoundingMode::RTP, &tiny), half(0x3c01));
        // 1.0 + (-1.0) = +0, or -0 under RTN
        assert_eq!(half(0x3c00).add(RoundingMode::RNE, &half(0xbc00)), half(0x0000));
        assert_eq!(half(0x3c00).add(RoundingMode::RTN, &half(0xbc00)), half(0x8000));
    }

    #[test]
    fn test_overflow_and_specials() {
        let max = FpBits::max_finite(false, EB, SB);
        assert!(max.add(RoundingMode::RNE, &max).is_infinite());
        assert_eq!(max.add(RoundingMode::RTZ, &max), max);
        let inf = FpBits::infinity(false, EB, SB);
        assert!(inf.add(RoundingMode::RNE, &inf.neg()).is_nan());
        assert!(inf.mul(RoundingMode::RNE, &FpBits::zero(true, EB, SB)).is_nan());
    }

    #[test]
    fn test_mul_subnormal() {
        // smallest subnormal * 0.5 rounds to zero under RNE (tie to even 0)
        let min_sub = half(0x0001);
        let point_five = half(0x3800);
        assert!(min_sub.mul(RoundingMode::RNE, &point_five).is_zero());
        assert_eq!(min_sub.mul(RoundingMode::RTP, &point_five), min_sub);
        // 3 * 0.5 = 1.5
        assert_eq!(half(0x4200).mul(RoundingMode::RNE, &point_five), half(0x3e00));
    }

    #[test]
    fn test_comparisons() {
        let pz = half(0x0000);
        let nz = half(0x8000);
        assert!(pz.fp_eq(&nz));
        assert!(!pz.smt_eq(&nz));
        assert!(!pz.fp_lt(&nz));
        assert!(half(0xbc00).fp_lt(&nz));
        let nan = FpBits::nan(EB, SB);
        assert!(!nan.fp_eq(&nan));
        assert!(nan.smt_eq(&half(0x7e00)));
        assert!(!nan.fp_leq(&pz));
    }
}
