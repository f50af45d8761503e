//! Numeric modes.
//!
//! The solvers are written once against [`BallArithmetic`] and instantiated
//! with [`Certified`] (radius-propagating) or [`Approximate`] (midpoint-only,
//! round toward zero) scalar and matrix primitives.

use crate::ball::Ball;
use crate::matrix::{self, BallMat, MatMut, MatRef};

pub trait BallArithmetic {
    /// Short name used in trace events.
    const MODE: &'static str;

    fn set(z: &mut Ball, x: &Ball);

    fn zero(z: &mut Ball) {
        *z = Ball::zero();
    }

    fn add(z: &mut Ball, x: &Ball, y: &Ball, prec: u64);

    fn sub(z: &mut Ball, x: &Ball, y: &Ball, prec: u64);

    fn mul(z: &mut Ball, x: &Ball, y: &Ball, prec: u64);

    fn div(z: &mut Ball, x: &Ball, y: &Ball, prec: u64);

    /// `z += x · y`
    fn addmul(z: &mut Ball, x: &Ball, y: &Ball, prec: u64);

    fn mat_mul(a: MatRef<'_>, b: MatRef<'_>, prec: u64) -> BallMat;

    /// `dst = b - a · x`. When `b` is `None` the right-hand side is `dst`
    /// itself.
    fn residual(
        mut dst: MatMut<'_>,
        b: Option<MatRef<'_>>,
        a: MatRef<'_>,
        x: MatRef<'_>,
        prec: u64,
    ) {
        let t = Self::mat_mul(a, x, prec);
        sub_entries::<Self>(dst.rb_mut(), b, t.as_ref(), prec);
    }
}

/// `dst = b - t` entrywise, reading `b` from `dst` when it is `None`.
fn sub_entries<A: BallArithmetic + ?Sized>(
    mut dst: MatMut<'_>,
    b: Option<MatRef<'_>>,
    t: MatRef<'_>,
    prec: u64,
) {
    for i in 0..dst.rows() {
        for j in 0..dst.cols() {
            let lhs = match b {
                Some(b) => b.entry(i, j).clone(),
                None => dst.entry(i, j).clone(),
            };
            A::sub(dst.entry_mut(i, j), &lhs, t.entry(i, j), prec);
        }
    }
}

/// Rigorous mode: every result encloses the exact result of its inputs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Certified;

impl BallArithmetic for Certified {
    const MODE: &'static str = "certified";

    fn set(z: &mut Ball, x: &Ball) {
        z.clone_from(x);
    }

    fn add(z: &mut Ball, x: &Ball, y: &Ball, prec: u64) {
        *z = x.add(y, prec);
    }

    fn sub(z: &mut Ball, x: &Ball, y: &Ball, prec: u64) {
        *z = x.sub(y, prec);
    }

    fn mul(z: &mut Ball, x: &Ball, y: &Ball, prec: u64) {
        *z = x.mul(y, prec);
    }

    fn div(z: &mut Ball, x: &Ball, y: &Ball, prec: u64) {
        *z = x.div(y, prec);
    }

    fn addmul(z: &mut Ball, x: &Ball, y: &Ball, prec: u64) {
        z.addmul(x, y, prec);
    }

    fn mat_mul(a: MatRef<'_>, b: MatRef<'_>, prec: u64) -> BallMat {
        matrix::mul(a, b, prec)
    }
}

/// Midpoint-only mode. Radii are never read, and destination radii are left
/// alone, except that residual blocks of the recursive solvers are coerced
/// to exact midpoints.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Approximate;

impl BallArithmetic for Approximate {
    const MODE: &'static str = "approximate";

    fn set(z: &mut Ball, x: &Ball) {
        Ball::approx_set(z, x);
    }

    fn add(z: &mut Ball, x: &Ball, y: &Ball, prec: u64) {
        Ball::approx_add(z, x, y, prec);
    }

    fn sub(z: &mut Ball, x: &Ball, y: &Ball, prec: u64) {
        Ball::approx_sub(z, x, y, prec);
    }

    fn mul(z: &mut Ball, x: &Ball, y: &Ball, prec: u64) {
        Ball::approx_mul(z, x, y, prec);
    }

    fn div(z: &mut Ball, x: &Ball, y: &Ball, prec: u64) {
        Ball::approx_div(z, x, y, prec);
    }

    fn addmul(z: &mut Ball, x: &Ball, y: &Ball, prec: u64) {
        Ball::approx_addmul(z, x, y, prec);
    }

    fn mat_mul(a: MatRef<'_>, b: MatRef<'_>, prec: u64) -> BallMat {
        matrix::approx_mul(a, b, prec)
    }

    fn residual(
        mut dst: MatMut<'_>,
        b: Option<MatRef<'_>>,
        a: MatRef<'_>,
        x: MatRef<'_>,
        prec: u64,
    ) {
        let mut t = Self::mat_mul(a, x, prec);
        t.get_mid();
        sub_entries::<Self>(dst.rb_mut(), b, t.as_ref(), prec);
        dst.get_mid();
    }
}
