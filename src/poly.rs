//! Polynomials with ball coefficients.

use std::fmt;

use crate::ball::Ball;
use crate::error::{BallError, Result};

/// Coefficients in increasing degree. Storage beyond `length` is kept zero,
/// and `length` never counts exactly-zero trailing coefficients once
/// normalised.
#[derive(Clone, Debug, Default)]
pub struct BallPoly {
    coeffs: Vec<Ball>,
    length: usize,
}

impl BallPoly {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            coeffs: vec![Ball::zero(); capacity],
            length: 0,
        }
    }

    pub fn from_coeffs(coeffs: Vec<Ball>) -> Self {
        let length = coeffs.len();
        let mut poly = Self { coeffs, length };
        poly.normalise();
        poly
    }

    pub fn from_i64(coeffs: &[i64]) -> Self {
        Self::from_coeffs(coeffs.iter().map(|&c| Ball::from_i64(c)).collect())
    }

    pub fn from_f64(coeffs: &[f64]) -> Result<Self> {
        let mut out = Vec::with_capacity(coeffs.len());
        for &c in coeffs {
            if !c.is_finite() {
                return Err(BallError::NonFinite(c));
            }
            out.push(Ball::from_f64(c));
        }
        Ok(Self::from_coeffs(out))
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_zero(&self) -> bool {
        self.length == 0
    }

    pub fn capacity(&self) -> usize {
        self.coeffs.len()
    }

    /// The meaningful coefficients.
    pub fn coeffs(&self) -> &[Ball] {
        &self.coeffs[..self.length]
    }

    pub fn coeff(&self, i: usize) -> Option<&Ball> {
        self.coeffs().get(i)
    }

    /// Grows storage to hold at least `n` coefficients.
    pub fn fit_length(&mut self, n: usize) {
        if self.coeffs.len() < n {
            self.coeffs.resize(n, Ball::zero());
        }
    }

    pub(crate) fn coeffs_mut(&mut self) -> &mut [Ball] {
        &mut self.coeffs
    }

    /// Sets the length, zeroing coefficients that fall off the end.
    pub fn set_length(&mut self, n: usize) {
        debug_assert!(n <= self.coeffs.len());
        if n < self.length {
            self.coeffs[n..self.length].fill(Ball::zero());
        }
        self.length = n;
    }

    /// Drops trailing coefficients that are exactly zero.
    pub fn normalise(&mut self) {
        while self.length > 0 && self.coeffs[self.length - 1].is_zero() {
            self.length -= 1;
        }
    }

    pub fn zero(&mut self) {
        self.set_length(0);
    }

    /// Keeps the terms of degree below `n`.
    pub fn truncate(&mut self, n: usize) {
        if n < self.length {
            self.set_length(n);
            self.normalise();
        }
    }

    /// Whether each coefficient of `self` contains the matching one of
    /// `other`, missing coefficients counting as exact zeros.
    pub fn contains(&self, other: &BallPoly) -> bool {
        let zero = Ball::zero();
        let n = self.length.max(other.length);
        (0..n).all(|i| {
            let a = self.coeff(i).unwrap_or(&zero);
            let b = other.coeff(i).unwrap_or(&zero);
            a.contains(b)
        })
    }

    pub fn overlaps(&self, other: &BallPoly) -> bool {
        let zero = Ball::zero();
        let n = self.length.max(other.length);
        (0..n).all(|i| {
            let a = self.coeff(i).unwrap_or(&zero);
            let b = other.coeff(i).unwrap_or(&zero);
            a.overlaps(b)
        })
    }
}

impl PartialEq for BallPoly {
    fn eq(&self, other: &Self) -> bool {
        self.coeffs() == other.coeffs()
    }
}

impl Eq for BallPoly {}

impl fmt::Display for BallPoly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, c) in self.coeffs().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", c)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::float::Float;
    use crate::mag::Mag;

    #[test]
    fn test_normalisation() {
        let p = BallPoly::from_i64(&[1, 2, 0, 0]);
        assert_eq!(p.len(), 2);
        assert_eq!(p.capacity(), 4);
        assert!(BallPoly::from_i64(&[0, 0]).is_zero());

        // a zero midpoint with a radius is not an exact zero
        let fuzzy = Ball::new(Float::zero(), Mag::from_f64(1e-3));
        let q = BallPoly::from_coeffs(vec![Ball::one(), fuzzy]);
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn test_length_management() {
        let mut p = BallPoly::from_i64(&[1, 2, 3, 4]);
        p.truncate(2);
        assert_eq!(p, BallPoly::from_i64(&[1, 2]));
        p.fit_length(4);
        p.set_length(4);
        assert_eq!(p.coeffs()[3], Ball::zero());
        p.normalise();
        assert_eq!(p.len(), 2);

        p.zero();
        assert!(p.is_zero());
        assert_eq!(p.coeff(0), None);
        assert_eq!(p, BallPoly::new());
    }

    #[test]
    fn test_containment() {
        let exact = BallPoly::from_i64(&[1, 2]);
        let wide = BallPoly::from_coeffs(vec![
            Ball::new(Float::from_i64(1), Mag::from_f64(0.5)),
            Ball::new(Float::from_i64(2), Mag::from_f64(0.5)),
            Ball::new(Float::zero(), Mag::from_f64(0.5)),
        ]);
        assert!(wide.contains(&exact));
        assert!(!exact.contains(&wide));
        assert!(exact.overlaps(&wide));
        assert!(BallPoly::from_f64(&[f64::NAN]).is_err());
        assert_eq!(format!("{}", exact), "[[1 +/- 0], [2 +/- 0]]");
    }
}
