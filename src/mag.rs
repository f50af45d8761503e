//! Error radii.
//!
//! A [`Mag`] is a non-negative upper bound, either finite or infinite. Finite
//! values carry at most [`MAG_BITS`] bits and every operation rounds up, so a
//! radius never shrinks below the true error.

use std::fmt;

use crate::float::{Float, Round};
use crate::types::MAG_BITS;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mag {
    Finite(Float),
    Inf,
}

impl Default for Mag {
    fn default() -> Self {
        Mag::zero()
    }
}

impl Mag {
    pub fn zero() -> Self {
        Mag::Finite(Float::zero())
    }

    pub fn inf() -> Self {
        Mag::Inf
    }

    pub fn pow2(e: i64) -> Self {
        Mag::Finite(Float::pow2(e))
    }

    /// Upper bound for `|x|`. NaN gives infinity.
    pub fn from_float(x: &Float) -> Self {
        if x.is_nan() {
            return Mag::Inf;
        }
        Mag::Finite(x.abs().round(MAG_BITS, Round::Ceil).0)
    }

    /// Upper bound for `|x|`; non-finite input gives infinity.
    pub fn from_f64(x: f64) -> Self {
        if x.is_finite() {
            Self::from_float(&Float::from_f64(x))
        } else {
            Mag::Inf
        }
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Mag::Finite(v) if v.is_zero())
    }

    pub fn is_finite(&self) -> bool {
        matches!(self, Mag::Finite(_))
    }

    pub fn as_float(&self) -> Option<&Float> {
        match self {
            Mag::Finite(v) => Some(v),
            Mag::Inf => None,
        }
    }

    pub fn add(&self, other: &Mag) -> Mag {
        match (self, other) {
            (Mag::Finite(a), Mag::Finite(b)) => Mag::Finite(a.add(b, MAG_BITS, Round::Ceil).0),
            _ => Mag::Inf,
        }
    }

    pub fn mul(&self, other: &Mag) -> Mag {
        match (self, other) {
            (Mag::Finite(a), Mag::Finite(b)) => Mag::Finite(a.mul(b, MAG_BITS, Round::Ceil).0),
            _ => Mag::Inf,
        }
    }

    /// Upper bound for `self / d`, where `d` is a positive lower bound of
    /// the true divisor.
    pub fn div_lower(&self, d: &Float) -> Mag {
        match self {
            Mag::Finite(a) if d > &Float::zero() => Mag::Finite(a.div(d, MAG_BITS, Round::Ceil).0),
            Mag::Finite(a) if a.is_zero() => Mag::zero(),
            _ => Mag::Inf,
        }
    }

    /// Adds the bound `2^e` reported by an inexact rounding.
    pub fn add_error(&self, err: Option<i64>) -> Mag {
        match err {
            Some(e) => self.add(&Mag::pow2(e)),
            None => self.clone(),
        }
    }

    pub fn mul_2exp(&self, k: i64) -> Mag {
        match self {
            Mag::Finite(v) => Mag::Finite(v.mul_2exp(k)),
            Mag::Inf => Mag::Inf,
        }
    }

    pub fn to_f64(&self) -> f64 {
        match self {
            Mag::Finite(v) => v.to_f64(),
            Mag::Inf => f64::INFINITY,
        }
    }
}

impl fmt::Display for Mag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mag::Finite(v) => write!(f, "{}", v),
            Mag::Inf => write!(f, "inf"),
        }
    }
}
