//! Truncated polynomial multiplication: `res = poly1 · poly2 mod x^n`.
//!
//! The slice kernel is the classical schoolbook product, with a dedicated
//! path for squaring that computes each cross term once and doubles it.
//! Every operation here is certified.

use std::ptr;

use tracing::trace;

use crate::ball::Ball;
use crate::poly::BallPoly;

/// `res[i] = src[i] · c`
fn scalar_mul(res: &mut [Ball], src: &[Ball], c: &Ball, prec: u64) {
    for (r, s) in res.iter_mut().zip(src) {
        *r = s.mul(c, prec);
    }
}

/// `res[i] += src[i] · c`
fn scalar_addmul(res: &mut [Ball], src: &[Ball], c: &Ball, prec: u64) {
    for (r, s) in res.iter_mut().zip(src) {
        r.addmul(s, c, prec);
    }
}

/// Writes the first `n` coefficients of `poly1 · poly2` to `res[..n]`.
///
/// Requires both inputs non-empty, `1 <= n <= poly1.len() + poly2.len() - 1`
/// and `res.len() >= n`. Passing the same slice for both factors selects the
/// squaring path.
pub fn mullow_classical(res: &mut [Ball], poly1: &[Ball], poly2: &[Ball], n: usize, prec: u64) {
    debug_assert!(!poly1.is_empty() && !poly2.is_empty());
    debug_assert!(n >= 1 && n < poly1.len() + poly2.len());
    debug_assert!(res.len() >= n);

    let squaring = ptr::eq(poly1, poly2);
    let len1 = poly1.len().min(n);
    let len2 = poly2.len().min(n);

    if n == 1 {
        res[0] = poly1[0].mul(&poly2[0], prec);
        return;
    }

    if squaring && len1 == len2 {
        // p_i · p_0 for i < len1, then p_j · p_{len1-1} past the head
        scalar_mul(&mut res[..len1], &poly1[..len1], &poly1[0], prec);
        scalar_mul(&mut res[len1..n], &poly1[1..1 + n - len1], &poly1[len1 - 1], prec);

        // remaining cross terms p_j · p_i with 1 <= j < i < len1 - 1
        for i in 1..len1 - 1 {
            let cnt = (i - 1).min(n - i - 1);
            scalar_addmul(&mut res[i + 1..i + 1 + cnt], &poly1[1..1 + cnt], &poly1[i], prec);
        }

        for r in res.iter_mut().take((2 * len1 - 2).min(n)).skip(1) {
            *r = r.mul_2exp(1);
        }

        for i in 1..(len1 - 1).min((n + 1) / 2) {
            res[2 * i].addmul(&poly1[i], &poly1[i], prec);
        }
    } else {
        scalar_mul(&mut res[..len1], &poly1[..len1], &poly2[0], prec);

        if n > len1 {
            scalar_mul(&mut res[len1..n], &poly2[1..1 + n - len1], &poly1[len1 - 1], prec);
        }

        for i in 0..len1 - 1 {
            let cnt = len2.min(n - i) - 1;
            scalar_addmul(&mut res[i + 1..i + 1 + cnt], &poly2[1..1 + cnt], &poly1[i], prec);
        }
    }
}

/// Product length after truncation, or `None` when the result is zero.
fn output_length(len1: usize, len2: usize, n: usize) -> Option<usize> {
    if len1 == 0 || len2 == 0 || n == 0 {
        None
    } else {
        Some(n.min(len1 + len2 - 1))
    }
}

/// `res = poly1 · poly2 mod x^n`. Passing the same polynomial twice squares it.
pub fn mullow(res: &mut BallPoly, poly1: &BallPoly, poly2: &BallPoly, n: usize, prec: u64) {
    let Some(n) = output_length(poly1.len(), poly2.len(), n) else {
        res.zero();
        return;
    };
    trace!(
        len1 = poly1.len(),
        len2 = poly2.len(),
        n,
        squaring = ptr::eq(poly1, poly2),
        "truncated multiplication"
    );

    res.fit_length(n);
    mullow_classical(&mut res.coeffs_mut()[..n], poly1.coeffs(), poly2.coeffs(), n, prec);
    res.set_length(n);
    res.normalise();
}

/// `res = res · other mod x^n`.
pub fn mullow_assign(res: &mut BallPoly, other: &BallPoly, n: usize, prec: u64) {
    assign_product(res, other, false, n, prec);
}

/// `res = other · res mod x^n`, keeping `other` as the first factor.
pub fn mullow_assign_rhs(res: &mut BallPoly, other: &BallPoly, n: usize, prec: u64) {
    assign_product(res, other, true, n, prec);
}

/// Computes the product of `res` and `other` into a fresh buffer, then moves
/// it into `res`. The general kernel is not symmetric in its rounding, so
/// `res_is_rhs` fixes which operand is the first factor.
fn assign_product(res: &mut BallPoly, other: &BallPoly, res_is_rhs: bool, n: usize, prec: u64) {
    let Some(n) = output_length(res.len(), other.len(), n) else {
        res.zero();
        return;
    };
    trace!(
        res_len = res.len(),
        other_len = other.len(),
        n,
        res_is_rhs,
        "truncated multiplication in place"
    );

    let (poly1, poly2) = if res_is_rhs {
        (other.coeffs(), res.coeffs())
    } else {
        (res.coeffs(), other.coeffs())
    };
    let mut out = BallPoly::with_capacity(n);
    mullow_classical(out.coeffs_mut(), poly1, poly2, n, prec);
    out.set_length(n);
    out.normalise();
    *res = out;
}

/// `res = res² mod x^n`.
pub fn sqrlow_assign(res: &mut BallPoly, n: usize, prec: u64) {
    let len = res.len();
    let Some(n) = output_length(len, len, n) else {
        res.zero();
        return;
    };
    trace!(len, n, "truncated squaring in place");

    let mut out = BallPoly::with_capacity(n);
    let coeffs = res.coeffs();
    mullow_classical(out.coeffs_mut(), coeffs, coeffs, n, prec);
    out.set_length(n);
    out.normalise();
    *res = out;
}

/// `res = poly² mod x^n`.
pub fn sqrlow(res: &mut BallPoly, poly: &BallPoly, n: usize, prec: u64) {
    mullow(res, poly, poly, n, prec);
}
