//! Ball numbers: a midpoint and a radius enclosing `[mid - rad, mid + rad]`.
//!
//! Two families of operations live here. The certified ones round the
//! midpoint toward zero and fold every error term, the rounding error
//! included, into the radius. The `approx_*` ones work on the midpoint alone,
//! also rounding toward zero, and never read or write the destination radius.

use std::fmt;

use crate::float::{Float, Round};
use crate::mag::Mag;
use crate::types::MAG_BITS;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Ball {
    mid: Float,
    rad: Mag,
}

impl Ball {
    pub fn new(mid: Float, rad: Mag) -> Self {
        if mid.is_nan() {
            return Self::indeterminate();
        }
        Self { mid, rad }
    }

    /// A ball with zero radius.
    pub fn exact(mid: Float) -> Self {
        Self::new(mid, Mag::zero())
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn one() -> Self {
        Self::from_i64(1)
    }

    pub fn from_i64(value: i64) -> Self {
        Self::exact(Float::from_i64(value))
    }

    pub fn from_f64(value: f64) -> Self {
        Self::exact(Float::from_f64(value))
    }

    /// The ball containing every real number.
    pub fn indeterminate() -> Self {
        Self {
            mid: Float::Nan,
            rad: Mag::Inf,
        }
    }

    pub fn mid(&self) -> &Float {
        &self.mid
    }

    pub fn rad(&self) -> &Mag {
        &self.rad
    }

    pub fn is_exact(&self) -> bool {
        self.rad.is_zero()
    }

    pub fn is_zero(&self) -> bool {
        self.mid.is_zero() && self.rad.is_zero()
    }

    pub fn is_finite(&self) -> bool {
        !self.mid.is_nan() && self.rad.is_finite()
    }

    /// The midpoint as an exact ball.
    pub fn get_mid(&self) -> Ball {
        Self {
            mid: self.mid.clone(),
            rad: Mag::zero(),
        }
    }

    /// Drops the radius in place.
    pub fn clear_rad(&mut self) {
        self.rad = Mag::zero();
    }

    fn from_rounded(mid: (Float, Option<i64>), rad: Mag) -> Self {
        let (mid, err) = mid;
        if mid.is_nan() || !rad.is_finite() {
            return Self::indeterminate();
        }
        Self {
            mid,
            rad: rad.add_error(err),
        }
    }

    fn mid_mag(&self) -> Mag {
        Mag::from_float(&self.mid)
    }

    /// Bound on `|x|·r_y + |y|·r_x + r_x·r_y`, the propagated part of a
    /// product's radius.
    fn product_rad(x: &Ball, y: &Ball) -> Mag {
        if x.rad.is_zero() && y.rad.is_zero() {
            return Mag::zero();
        }
        x.mid_mag()
            .mul(&y.rad)
            .add(&y.mid_mag().mul(&x.rad))
            .add(&x.rad.mul(&y.rad))
    }

    pub fn add(&self, other: &Ball, prec: u64) -> Ball {
        Self::from_rounded(
            self.mid.add(&other.mid, prec, Round::Down),
            self.rad.add(&other.rad),
        )
    }

    pub fn sub(&self, other: &Ball, prec: u64) -> Ball {
        Self::from_rounded(
            self.mid.sub(&other.mid, prec, Round::Down),
            self.rad.add(&other.rad),
        )
    }

    pub fn mul(&self, other: &Ball, prec: u64) -> Ball {
        Self::from_rounded(
            self.mid.mul(&other.mid, prec, Round::Down),
            Self::product_rad(self, other),
        )
    }

    /// `self += x · y` with a single rounding of the midpoint.
    pub fn addmul(&mut self, x: &Ball, y: &Ball, prec: u64) {
        let rad = self.rad.add(&Self::product_rad(x, y));
        *self = Self::from_rounded(self.mid.addmul(&x.mid, &y.mid, prec, Round::Down), rad);
    }

    /// Quotient; indeterminate when the divisor contains zero.
    pub fn div(&self, other: &Ball, prec: u64) -> Ball {
        if !self.is_finite() || !other.is_finite() {
            return Self::indeterminate();
        }
        let (Some(xr), Some(yr)) = (self.rad.as_float(), other.rad.as_float()) else {
            return Self::indeterminate();
        };

        let y_abs = other.mid.abs();
        let y_lo = y_abs.round(MAG_BITS, Round::Down).0;
        let gap = y_abs.sub(yr, MAG_BITS, Round::Floor).0;
        if gap <= Float::zero() {
            return Self::indeterminate();
        }

        // |x/y - mx/my| <= (|mx| r_y + |my| r_x) / (|my| (|my| - r_y))
        let num = Mag::from_float(&self.mid.abs().mul_exact(yr))
            .add(&Mag::from_float(&y_abs.mul_exact(xr)));
        let den = y_lo.mul(&gap, MAG_BITS, Round::Down).0;
        Self::from_rounded(self.mid.div(&other.mid, prec, Round::Down), num.div_lower(&den))
    }

    /// Exact multiplication by `2^k`.
    pub fn mul_2exp(&self, k: i64) -> Ball {
        Self {
            mid: self.mid.mul_2exp(k),
            rad: self.rad.mul_2exp(k),
        }
    }

    /// Whether every point of `other` lies in `self`.
    pub fn contains(&self, other: &Ball) -> bool {
        let Some(r) = self.rad.as_float() else {
            return true;
        };
        let Some(s) = other.rad.as_float() else {
            return false;
        };
        if self.mid.is_nan() || other.mid.is_nan() {
            return false;
        }
        let reach = self.mid.sub_exact(&other.mid).abs().add_exact(s);
        reach <= *r
    }

    /// Whether `self` and `other` share at least one point.
    pub fn overlaps(&self, other: &Ball) -> bool {
        let (Some(r), Some(s)) = (self.rad.as_float(), other.rad.as_float()) else {
            return true;
        };
        if self.mid.is_nan() || other.mid.is_nan() {
            return true;
        }
        self.mid.sub_exact(&other.mid).abs() <= r.add_exact(s)
    }
}

/// Midpoint-only operations. Each writes `z.mid` and leaves `z.rad` as it was.
impl Ball {
    pub fn approx_set(z: &mut Ball, x: &Ball) {
        z.mid = x.mid.clone();
    }

    pub fn approx_add(z: &mut Ball, x: &Ball, y: &Ball, prec: u64) {
        z.mid = x.mid.add(&y.mid, prec, Round::Down).0;
    }

    pub fn approx_sub(z: &mut Ball, x: &Ball, y: &Ball, prec: u64) {
        z.mid = x.mid.sub(&y.mid, prec, Round::Down).0;
    }

    pub fn approx_mul(z: &mut Ball, x: &Ball, y: &Ball, prec: u64) {
        z.mid = x.mid.mul(&y.mid, prec, Round::Down).0;
    }

    pub fn approx_addmul(z: &mut Ball, x: &Ball, y: &Ball, prec: u64) {
        z.mid = z.mid.addmul(&x.mid, &y.mid, prec, Round::Down).0;
    }

    /// A zero divisor midpoint gives a NaN midpoint.
    pub fn approx_div(z: &mut Ball, x: &Ball, y: &Ball, prec: u64) {
        z.mid = x.mid.div(&y.mid, prec, Round::Down).0;
    }
}

impl fmt::Display for Ball {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} +/- {}]", self.mid, self.rad)
    }
}
