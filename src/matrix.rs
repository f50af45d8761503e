//! Dense ball matrices and borrowed windows into them.
//!
//! [`BallMat`] owns row-major storage. [`MatRef`] and [`MatMut`] are
//! non-owning rectangular views: a slice starting at the window's first entry,
//! a row stride inherited from the parent, and the window's extents. Shared
//! windows may overlap freely; exclusive windows are only produced by
//! splitting along rows, which keeps them disjoint.

use rayon::prelude::*;

use crate::ball::Ball;
use crate::error::{BallError, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BallMat {
    entries: Vec<Ball>,
    rows: usize,
    cols: usize,
}

impl BallMat {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            entries: vec![Ball::zero(); rows * cols],
            rows,
            cols,
        }
    }

    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> Ball) -> Self {
        let mut entries = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                entries.push(f(i, j));
            }
        }
        Self {
            entries,
            rows,
            cols,
        }
    }

    pub fn identity(n: usize) -> Self {
        Self::from_fn(n, n, |i, j| if i == j { Ball::one() } else { Ball::zero() })
    }

    pub fn from_rows(data: Vec<Vec<Ball>>) -> Result<Self> {
        let rows = data.len();
        let cols = data.first().map_or(0, Vec::len);
        let mut entries = Vec::with_capacity(rows * cols);
        for row in data {
            if row.len() != cols {
                return Err(BallError::InvalidDimension {
                    expected: cols,
                    got: row.len(),
                });
            }
            entries.extend(row);
        }
        Ok(Self {
            entries,
            rows,
            cols,
        })
    }

    pub fn from_i64_rows<R: AsRef<[i64]>>(data: &[R]) -> Result<Self> {
        Self::from_rows(
            data.iter()
                .map(|row| row.as_ref().iter().map(|&v| Ball::from_i64(v)).collect())
                .collect(),
        )
    }

    pub fn from_f64_rows<R: AsRef<[f64]>>(data: &[R]) -> Result<Self> {
        let mut rows = Vec::with_capacity(data.len());
        for row in data {
            let mut out = Vec::with_capacity(row.as_ref().len());
            for &v in row.as_ref() {
                if !v.is_finite() {
                    return Err(BallError::NonFinite(v));
                }
                out.push(Ball::from_f64(v));
            }
            rows.push(out);
        }
        Self::from_rows(rows)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    pub fn entry(&self, i: usize, j: usize) -> &Ball {
        debug_assert!(i < self.rows && j < self.cols);
        &self.entries[i * self.cols + j]
    }

    pub fn entry_mut(&mut self, i: usize, j: usize) -> &mut Ball {
        debug_assert!(i < self.rows && j < self.cols);
        &mut self.entries[i * self.cols + j]
    }

    pub fn as_ref(&self) -> MatRef<'_> {
        MatRef {
            data: &self.entries,
            rows: self.rows,
            cols: self.cols,
            stride: self.cols,
        }
    }

    pub fn as_mut(&mut self) -> MatMut<'_> {
        MatMut {
            data: &mut self.entries,
            rows: self.rows,
            cols: self.cols,
            stride: self.cols,
        }
    }

    /// Rows `r0..r1`, columns `c0..c1`.
    pub fn window(&self, r0: usize, c0: usize, r1: usize, c1: usize) -> MatRef<'_> {
        self.as_ref().window(r0, c0, r1, c1)
    }

    pub fn get_mid(&mut self) {
        self.entries.iter_mut().for_each(Ball::clear_rad);
    }

    /// Certified product `self · other`.
    pub fn mul(&self, other: &BallMat, prec: u64) -> BallMat {
        mul(self.as_ref(), other.as_ref(), prec)
    }

    pub fn contains(&self, other: &BallMat) -> bool {
        self.rows == other.rows
            && self.cols == other.cols
            && self
                .entries
                .iter()
                .zip(&other.entries)
                .all(|(a, b)| a.contains(b))
    }

    pub fn overlaps(&self, other: &BallMat) -> bool {
        self.rows == other.rows
            && self.cols == other.cols
            && self
                .entries
                .iter()
                .zip(&other.entries)
                .all(|(a, b)| a.overlaps(b))
    }
}

#[derive(Clone, Copy, Debug)]
pub struct MatRef<'a> {
    data: &'a [Ball],
    rows: usize,
    cols: usize,
    stride: usize,
}

impl<'a> MatRef<'a> {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn entry(&self, i: usize, j: usize) -> &'a Ball {
        debug_assert!(i < self.rows && j < self.cols);
        &self.data[i * self.stride + j]
    }

    /// Rows `r0..r1`, columns `c0..c1` of this view, sharing its storage.
    pub fn window(&self, r0: usize, c0: usize, r1: usize, c1: usize) -> MatRef<'a> {
        debug_assert!(r0 <= r1 && r1 <= self.rows && c0 <= c1 && c1 <= self.cols);
        let rows = r1 - r0;
        let cols = c1 - c0;
        let data = if rows == 0 || cols == 0 {
            &self.data[..0]
        } else {
            &self.data[r0 * self.stride + c0..]
        };
        MatRef {
            data,
            rows,
            cols,
            stride: self.stride,
        }
    }

    pub fn to_mat(&self) -> BallMat {
        BallMat::from_fn(self.rows, self.cols, |i, j| self.entry(i, j).clone())
    }
}

#[derive(Debug)]
pub struct MatMut<'a> {
    data: &'a mut [Ball],
    rows: usize,
    cols: usize,
    stride: usize,
}

impl<'a> MatMut<'a> {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn entry(&self, i: usize, j: usize) -> &Ball {
        debug_assert!(i < self.rows && j < self.cols);
        &self.data[i * self.stride + j]
    }

    pub fn entry_mut(&mut self, i: usize, j: usize) -> &mut Ball {
        debug_assert!(i < self.rows && j < self.cols);
        &mut self.data[i * self.stride + j]
    }

    pub fn as_ref(&self) -> MatRef<'_> {
        MatRef {
            data: &*self.data,
            rows: self.rows,
            cols: self.cols,
            stride: self.stride,
        }
    }

    /// Reborrows this view for a shorter lifetime.
    pub fn rb_mut(&mut self) -> MatMut<'_> {
        MatMut {
            data: &mut *self.data,
            rows: self.rows,
            cols: self.cols,
            stride: self.stride,
        }
    }

    /// Splits into rows `0..r` and rows `r..`.
    pub fn split_rows_at(self, r: usize) -> (MatMut<'a>, MatMut<'a>) {
        debug_assert!(r <= self.rows);
        let Self {
            data,
            rows,
            cols,
            stride,
        } = self;
        let cut = (r * stride).min(data.len());
        let (top, bottom) = data.split_at_mut(cut);
        (
            MatMut {
                data: top,
                rows: r,
                cols,
                stride,
            },
            MatMut {
                data: bottom,
                rows: rows - r,
                cols,
                stride,
            },
        )
    }

    /// Drops every radius in the window.
    pub fn get_mid(&mut self) {
        for i in 0..self.rows {
            for j in 0..self.cols {
                self.entry_mut(i, j).clear_rad();
            }
        }
    }
}

/// Certified product `a · b`. Output rows are computed in parallel.
pub fn mul(a: MatRef<'_>, b: MatRef<'_>, prec: u64) -> BallMat {
    debug_assert_eq!(a.cols(), b.rows());
    let mut out = BallMat::zeros(a.rows(), b.cols());
    if out.is_empty() {
        return out;
    }
    let cols = out.cols;
    out.entries
        .par_chunks_mut(cols)
        .enumerate()
        .for_each(|(i, row)| {
            for (j, z) in row.iter_mut().enumerate() {
                for k in 0..a.cols() {
                    z.addmul(a.entry(i, k), b.entry(k, j), prec);
                }
            }
        });
    out
}

/// Midpoint-only product `a · b`; every entry of the result is exact.
pub fn approx_mul(a: MatRef<'_>, b: MatRef<'_>, prec: u64) -> BallMat {
    debug_assert_eq!(a.cols(), b.rows());
    let mut out = BallMat::zeros(a.rows(), b.cols());
    if out.is_empty() {
        return out;
    }
    let cols = out.cols;
    out.entries
        .par_chunks_mut(cols)
        .enumerate()
        .for_each(|(i, row)| {
            for (j, z) in row.iter_mut().enumerate() {
                for k in 0..a.cols() {
                    Ball::approx_addmul(z, a.entry(i, k), b.entry(k, j), prec);
                }
            }
        });
    out
}
