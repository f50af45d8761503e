//! Binary floating-point numbers of unbounded precision.
//!
//! A [`Float`] is `man · 2^exp` with a `BigInt` mantissa. Values are kept in
//! canonical form (odd mantissa, or zero with exponent 0) so structural
//! equality is numeric equality. Every rounded operation reports a bound on
//! the error it committed; [`crate::ball`] adds that bound to the radius.

use std::cmp::Ordering;
use std::fmt;

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, Signed, ToPrimitive, Zero};

/// Rounding direction for inexact results
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Round {
    /// Toward zero
    Down,
    /// Away from zero
    Up,
    /// Toward negative infinity
    Floor,
    /// Toward positive infinity
    Ceil,
    /// To nearest, ties to even
    Nearest,
}

/// A rounded value together with `Some(e)` when the rounding was inexact,
/// in which case the committed error is strictly below `2^e`.
pub type Rounded = (Float, Option<i64>);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Float {
    Finite { man: BigInt, exp: i64 },
    Nan,
}

impl Default for Float {
    fn default() -> Self {
        Float::zero()
    }
}

impl Float {
    pub fn zero() -> Self {
        Float::Finite {
            man: BigInt::zero(),
            exp: 0,
        }
    }

    pub fn nan() -> Self {
        Float::Nan
    }

    /// Builds `man · 2^exp`, stripping trailing zero bits of the mantissa.
    pub fn from_parts(man: BigInt, exp: i64) -> Self {
        match man.trailing_zeros() {
            None => Float::zero(),
            Some(0) => Float::Finite { man, exp },
            Some(tz) => Float::Finite {
                man: man >> tz,
                exp: exp + tz as i64,
            },
        }
    }

    pub fn from_i64(value: i64) -> Self {
        Self::from_parts(BigInt::from(value), 0)
    }

    /// Exact conversion. Infinities and NaN become NaN.
    pub fn from_f64(value: f64) -> Self {
        if !value.is_finite() {
            return Float::Nan;
        }
        if value == 0.0 {
            return Float::zero();
        }
        let bits = value.to_bits();
        let biased = ((bits >> 52) & 0x7ff) as i64;
        let frac = bits & ((1u64 << 52) - 1);
        let (mant, exp) = if biased == 0 {
            (frac, -1074)
        } else {
            (frac | (1u64 << 52), biased - 1075)
        };
        let man = BigInt::from(mant);
        let man = if bits >> 63 == 1 { -man } else { man };
        Self::from_parts(man, exp)
    }

    /// The exact power of two `2^e`.
    pub fn pow2(e: i64) -> Self {
        Float::Finite {
            man: BigInt::one(),
            exp: e,
        }
    }

    /// Nearest-ish `f64`; intended for display and tests.
    pub fn to_f64(&self) -> f64 {
        let (man, exp) = match self {
            Float::Nan => return f64::NAN,
            Float::Finite { man, exp } => (man, *exp),
        };
        if man.is_zero() {
            return 0.0;
        }
        let bits = man.bits();
        let (m, e) = if bits > 64 {
            let shift = bits - 64;
            (man >> shift, exp + shift as i64)
        } else {
            (man.clone(), exp)
        };
        let m = m.to_f64().unwrap_or(f64::NAN);
        let e = e.clamp(-4000, 4000) as i32;
        m * 2f64.powi(e / 2) * 2f64.powi(e - e / 2)
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, Float::Nan)
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Float::Finite { man, .. } if man.is_zero())
    }

    pub fn is_negative(&self) -> bool {
        matches!(self, Float::Finite { man, .. } if man.is_negative())
    }

    /// Number of significant bits of the mantissa (0 for zero and NaN).
    pub fn bits(&self) -> u64 {
        match self {
            Float::Finite { man, .. } => man.bits(),
            Float::Nan => 0,
        }
    }

    pub fn neg(&self) -> Self {
        match self {
            Float::Finite { man, exp } => Float::Finite {
                man: -man,
                exp: *exp,
            },
            Float::Nan => Float::Nan,
        }
    }

    pub fn abs(&self) -> Self {
        match self {
            Float::Finite { man, exp } => Float::Finite {
                man: man.abs(),
                exp: *exp,
            },
            Float::Nan => Float::Nan,
        }
    }

    /// Exact multiplication by `2^k`.
    pub fn mul_2exp(&self, k: i64) -> Self {
        match self {
            Float::Finite { man, exp } if !man.is_zero() => Float::Finite {
                man: man.clone(),
                exp: exp + k,
            },
            other => other.clone(),
        }
    }

    pub fn round(&self, prec: u64, rnd: Round) -> Rounded {
        match self {
            Float::Finite { man, exp } => round_parts(man, *exp, prec, rnd),
            Float::Nan => (Float::Nan, None),
        }
    }

    pub fn add_exact(&self, other: &Float) -> Float {
        match (self, other) {
            (Float::Finite { man: ma, exp: ea }, Float::Finite { man: mb, exp: eb }) => {
                let (man, exp) = aligned_sum(ma, *ea, mb, *eb);
                Float::from_parts(man, exp)
            }
            _ => Float::Nan,
        }
    }

    pub fn sub_exact(&self, other: &Float) -> Float {
        self.add_exact(&other.neg())
    }

    pub fn mul_exact(&self, other: &Float) -> Float {
        match (self, other) {
            (Float::Finite { man: ma, exp: ea }, Float::Finite { man: mb, exp: eb }) => {
                Float::from_parts(ma * mb, ea + eb)
            }
            _ => Float::Nan,
        }
    }

    pub fn add(&self, other: &Float, prec: u64, rnd: Round) -> Rounded {
        let (Float::Finite { man: ma, exp: ea }, Float::Finite { man: mb, exp: eb }) =
            (self, other)
        else {
            return (Float::Nan, None);
        };
        if ma.is_zero() {
            return other.round(prec, rnd);
        }
        if mb.is_zero() {
            return self.round(prec, rnd);
        }

        // An operand entirely below the other's rounding position only
        // matters through its sign, so it is replaced by a sticky bit.
        let (man, exp) = if let Some(lim) = sticky_limit(ma, *ea, mb, *eb, prec) {
            aligned_sum(ma, *ea, &mb.signum(), lim - 1)
        } else if let Some(lim) = sticky_limit(mb, *eb, ma, *ea, prec) {
            aligned_sum(mb, *eb, &ma.signum(), lim - 1)
        } else {
            aligned_sum(ma, *ea, mb, *eb)
        };
        round_parts(&man, exp, prec, rnd)
    }

    pub fn sub(&self, other: &Float, prec: u64, rnd: Round) -> Rounded {
        self.add(&other.neg(), prec, rnd)
    }

    pub fn mul(&self, other: &Float, prec: u64, rnd: Round) -> Rounded {
        match (self, other) {
            (Float::Finite { man: ma, exp: ea }, Float::Finite { man: mb, exp: eb }) => {
                round_parts(&(ma * mb), ea + eb, prec, rnd)
            }
            _ => (Float::Nan, None),
        }
    }

    /// `self + x · y` with a single rounding.
    pub fn addmul(&self, x: &Float, y: &Float, prec: u64, rnd: Round) -> Rounded {
        self.add(&x.mul_exact(y), prec, rnd)
    }

    /// Rounded quotient. Division by zero gives NaN.
    pub fn div(&self, other: &Float, prec: u64, rnd: Round) -> Rounded {
        let (Float::Finite { man: ma, exp: ea }, Float::Finite { man: mb, exp: eb }) =
            (self, other)
        else {
            return (Float::Nan, None);
        };
        if mb.is_zero() {
            return (Float::Nan, None);
        }
        if ma.is_zero() {
            return (Float::zero(), None);
        }

        // Scale the dividend so the integer quotient carries at least
        // prec + 2 bits; a nonzero remainder becomes a sticky low bit.
        let shift = (prec as i64 + 2 + mb.bits() as i64 - ma.bits() as i64).max(0) as u64;
        let num: BigUint = ma.magnitude() << shift;
        let den = mb.magnitude();
        let mut q = &num / den;
        let mut exp = ea - eb - shift as i64;
        if !(&num % den).is_zero() {
            q = (q << 1u32) + 1u32;
            exp -= 1;
        }
        let sign = if ma.sign() == mb.sign() {
            Sign::Plus
        } else {
            Sign::Minus
        };
        round_parts(&BigInt::from_biguint(sign, q), exp, prec, rnd)
    }
}

fn round_parts(man: &BigInt, exp: i64, prec: u64, rnd: Round) -> Rounded {
    let bits = man.bits();
    if bits <= prec {
        return (Float::from_parts(man.clone(), exp), None);
    }
    let shift = bits - prec;
    let sign = man.sign();
    let mag = man.magnitude();
    let q = mag >> shift;
    let rem = mag - (&q << shift);
    let e = exp + shift as i64;
    if rem.is_zero() {
        return (Float::from_parts(BigInt::from_biguint(sign, q), e), None);
    }

    let negative = sign == Sign::Minus;
    let away = match rnd {
        Round::Down => false,
        Round::Up => true,
        Round::Floor => negative,
        Round::Ceil => !negative,
        Round::Nearest => match rem.cmp(&(BigUint::one() << (shift - 1))) {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => !(&q % 2u32).is_zero(),
        },
    };
    let q = if away { q + 1u32 } else { q };
    (Float::from_parts(BigInt::from_biguint(sign, q), e), Some(e))
}

fn aligned_sum(ma: &BigInt, ea: i64, mb: &BigInt, eb: i64) -> (BigInt, i64) {
    let e = ea.min(eb);
    let a: BigInt = ma << (ea - e) as u64;
    let b: BigInt = mb << (eb - e) as u64;
    (a + b, e)
}

/// If `lo` lies strictly below both the lowest bit of `hi` and two bits under
/// its rounding position, returns that limit exponent.
fn sticky_limit(hi: &BigInt, hi_exp: i64, lo: &BigInt, lo_exp: i64, prec: u64) -> Option<i64> {
    let hi_top = hi_exp + hi.bits() as i64;
    let lo_top = lo_exp + lo.bits() as i64;
    let lim = hi_exp.min(hi_top - prec as i64 - 2);
    (lo_top < lim).then_some(lim)
}

impl PartialOrd for Float {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.sub_exact(other) {
            Float::Nan => None,
            Float::Finite { man, .. } => Some(match man.sign() {
                Sign::Minus => Ordering::Less,
                Sign::NoSign => Ordering::Equal,
                Sign::Plus => Ordering::Greater,
            }),
        }
    }
}

impl fmt::Display for Float {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Float::Nan => write!(f, "nan"),
            Float::Finite { .. } => write!(f, "{}", self.to_f64()),
        }
    }
}
