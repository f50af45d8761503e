//! Triangular solves `L·X = B` and `U·X = B` over ball matrices.
//!
//! Two algorithms are provided for each shape:
//! - Substitution: per right-hand-side column, O(n²) scalar operations,
//!   run on a scratch copy of the column so `X` may share storage with `B`.
//! - Block recursion: split at `r = n / 2` and apply the block inverse
//!   identity. For the lower case
//!
//!   ```text
//!   [A 0]^-1 [X]   [A^-1 X             ]
//!   [C D]    [Y] = [D^-1 (Y - C A^-1 X)]
//!   ```
//!
//!   and mirrored for the upper case. The off-diagonal block is applied with
//!   one general matrix product, so for large `n` the cost follows matrix
//!   multiplication.
//!
//! Entries on the wrong side of the diagonal are never read, nor is the
//! diagonal when `unit` is set. A singular diagonal is not detected; the
//! division produces indeterminate entries which flow into the result.

use std::marker::PhantomData;

use tracing::trace;

use crate::arith::{Approximate, BallArithmetic, Certified};
use crate::ball::Ball;
use crate::error::{BallError, Result};
use crate::matrix::{BallMat, MatMut, MatRef};
use crate::types::SolveConfig;

#[derive(Debug)]
pub struct TriangularSolver<A> {
    config: SolveConfig,
    mode: PhantomData<A>,
}

pub type CertifiedSolver = TriangularSolver<Certified>;
pub type ApproxSolver = TriangularSolver<Approximate>;

impl<A> Clone for TriangularSolver<A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A> Copy for TriangularSolver<A> {}

impl<A> Default for TriangularSolver<A> {
    fn default() -> Self {
        Self::new(SolveConfig::default())
    }
}

impl<A> TriangularSolver<A> {
    pub fn new(config: SolveConfig) -> Self {
        Self {
            config,
            mode: PhantomData,
        }
    }

    pub fn config(&self) -> &SolveConfig {
        &self.config
    }
}

impl<A: BallArithmetic> TriangularSolver<A> {
    /// Solves `L·X = B` for `X`, where `L` is `n × n` lower triangular and
    /// `X`, `B` are `n × m`. `b == None` solves in place with `B` taken from
    /// `X`.
    pub fn solve_lower(
        &self,
        x: MatMut<'_>,
        l: MatRef<'_>,
        b: Option<MatRef<'_>>,
        unit: bool,
        prec: u64,
    ) {
        debug_assert_shapes(&x, l, b);
        if self.config.use_classical(l.rows(), x.cols()) {
            self.solve_lower_classical(x, l, b, unit, prec);
        } else {
            self.solve_lower_recursive(x, l, b, unit, prec);
        }
    }

    /// Forward substitution.
    pub fn solve_lower_classical(
        &self,
        mut x: MatMut<'_>,
        l: MatRef<'_>,
        b: Option<MatRef<'_>>,
        unit: bool,
        prec: u64,
    ) {
        let n = l.rows();
        let m = x.cols();
        if n == 0 || m == 0 {
            return;
        }
        trace!(n, m, mode = A::MODE, "lower triangular substitution");

        let mut tmp = vec![Ball::zero(); n];
        let mut s = Ball::zero();
        for i in 0..m {
            for (j, t) in tmp.iter_mut().enumerate() {
                A::set(t, x.entry(j, i));
            }

            for j in 0..n {
                A::zero(&mut s);
                for (k, t) in tmp.iter().enumerate().take(j) {
                    A::addmul(&mut s, l.entry(j, k), t, prec);
                }
                let diag = (!unit).then(|| l.entry(j, j));
                substitute::<A>(&mut s, &x, b, j, i, diag, prec);
                A::set(&mut tmp[j], &s);
            }

            for (j, t) in tmp.iter().enumerate() {
                A::set(x.entry_mut(j, i), t);
            }
        }
    }

    pub fn solve_lower_recursive(
        &self,
        x: MatMut<'_>,
        l: MatRef<'_>,
        b: Option<MatRef<'_>>,
        unit: bool,
        prec: u64,
    ) {
        let n = l.rows();
        let m = x.cols();
        if n == 0 || m == 0 {
            return;
        }
        let r = n / 2;
        trace!(n, m, r, mode = A::MODE, "lower triangular block split");

        let la = l.window(0, 0, r, r);
        let lc = l.window(r, 0, n, r);
        let ld = l.window(r, r, n, n);
        let (bx, by) = split_rhs(b, r, n, m);
        let (mut xx, mut xy) = x.split_rows_at(r);

        self.solve_lower(xx.rb_mut(), la, bx, unit, prec);
        A::residual(xy.rb_mut(), by, lc, xx.as_ref(), prec);
        self.solve_lower(xy, ld, None, unit, prec);
    }

    /// Solves `U·X = B` for `X`, where `U` is `n × n` upper triangular and
    /// `X`, `B` are `n × m`. `b == None` solves in place with `B` taken from
    /// `X`.
    pub fn solve_upper(
        &self,
        x: MatMut<'_>,
        u: MatRef<'_>,
        b: Option<MatRef<'_>>,
        unit: bool,
        prec: u64,
    ) {
        debug_assert_shapes(&x, u, b);
        if self.config.use_classical(u.rows(), x.cols()) {
            self.solve_upper_classical(x, u, b, unit, prec);
        } else {
            self.solve_upper_recursive(x, u, b, unit, prec);
        }
    }

    /// Backward substitution.
    pub fn solve_upper_classical(
        &self,
        mut x: MatMut<'_>,
        u: MatRef<'_>,
        b: Option<MatRef<'_>>,
        unit: bool,
        prec: u64,
    ) {
        let n = u.rows();
        let m = x.cols();
        if n == 0 || m == 0 {
            return;
        }
        trace!(n, m, mode = A::MODE, "upper triangular substitution");

        let mut tmp = vec![Ball::zero(); n];
        let mut s = Ball::zero();
        for i in 0..m {
            for (j, t) in tmp.iter_mut().enumerate() {
                A::set(t, x.entry(j, i));
            }

            for j in (0..n).rev() {
                A::zero(&mut s);
                for (k, t) in tmp.iter().enumerate().skip(j + 1) {
                    A::addmul(&mut s, u.entry(j, k), t, prec);
                }
                let diag = (!unit).then(|| u.entry(j, j));
                substitute::<A>(&mut s, &x, b, j, i, diag, prec);
                A::set(&mut tmp[j], &s);
            }

            for (j, t) in tmp.iter().enumerate() {
                A::set(x.entry_mut(j, i), t);
            }
        }
    }

    pub fn solve_upper_recursive(
        &self,
        x: MatMut<'_>,
        u: MatRef<'_>,
        b: Option<MatRef<'_>>,
        unit: bool,
        prec: u64,
    ) {
        let n = u.rows();
        let m = x.cols();
        if n == 0 || m == 0 {
            return;
        }
        let r = n / 2;
        trace!(n, m, r, mode = A::MODE, "upper triangular block split");

        let ua = u.window(0, 0, r, r);
        let ub = u.window(0, r, r, n);
        let ud = u.window(r, r, n, n);
        let (bx, by) = split_rhs(b, r, n, m);
        let (mut xx, mut xy) = x.split_rows_at(r);

        self.solve_upper(xy.rb_mut(), ud, by, unit, prec);
        A::residual(xx.rb_mut(), bx, ub, xy.as_ref(), prec);
        self.solve_upper(xx, ua, None, unit, prec);
    }
}

/// Finishes row `j` of column `i`: `s = B[j, i] - s`, then `s /= diag`.
fn substitute<A: BallArithmetic>(
    s: &mut Ball,
    x: &MatMut<'_>,
    b: Option<MatRef<'_>>,
    j: usize,
    i: usize,
    diag: Option<&Ball>,
    prec: u64,
) {
    let rhs = match b {
        Some(b) => b.entry(j, i),
        None => x.entry(j, i),
    };
    let acc = std::mem::take(s);
    A::sub(s, rhs, &acc, prec);
    if let Some(d) = diag {
        let num = std::mem::take(s);
        A::div(s, &num, d, prec);
    }
}

fn split_rhs<'a>(
    b: Option<MatRef<'a>>,
    r: usize,
    n: usize,
    m: usize,
) -> (Option<MatRef<'a>>, Option<MatRef<'a>>) {
    match b {
        Some(b) => (Some(b.window(0, 0, r, m)), Some(b.window(r, 0, n, m))),
        None => (None, None),
    }
}

fn debug_assert_shapes(x: &MatMut<'_>, t: MatRef<'_>, b: Option<MatRef<'_>>) {
    debug_assert_eq!(t.rows(), t.cols(), "triangular matrix must be square");
    debug_assert_eq!(x.rows(), t.rows(), "solution rows must match the system");
    if let Some(b) = b {
        debug_assert_eq!((b.rows(), b.cols()), (x.rows(), x.cols()));
    }
}

/// Checks the shape contract of the solvers: `t` square `n × n`, `b` and
/// `x` both `n × m`.
pub fn check_solve_shapes(x: &BallMat, t: &BallMat, b: &BallMat) -> Result<()> {
    if t.rows() != t.cols() {
        return Err(BallError::ShapeMismatch(format!(
            "triangular matrix is {}x{}, expected square",
            t.rows(),
            t.cols()
        )));
    }
    if b.rows() != t.rows() {
        return Err(BallError::InvalidDimension {
            expected: t.rows(),
            got: b.rows(),
        });
    }
    if (x.rows(), x.cols()) != (b.rows(), b.cols()) {
        return Err(BallError::ShapeMismatch(format!(
            "solution is {}x{}, right-hand side is {}x{}",
            x.rows(),
            x.cols(),
            b.rows(),
            b.cols()
        )));
    }
    Ok(())
}

/// Certified solve of `L·X = B`. See [`solve_tril_in_place`] when `X` holds `B`.
pub fn solve_tril(x: &mut BallMat, l: &BallMat, b: &BallMat, unit: bool, prec: u64) {
    CertifiedSolver::default().solve_lower(x.as_mut(), l.as_ref(), Some(b.as_ref()), unit, prec);
}

/// Certified solve of `U·X = B`. See [`solve_triu_in_place`] when `X` holds `B`.
pub fn solve_triu(x: &mut BallMat, u: &BallMat, b: &BallMat, unit: bool, prec: u64) {
    CertifiedSolver::default().solve_upper(x.as_mut(), u.as_ref(), Some(b.as_ref()), unit, prec);
}

/// Midpoint-only solve of `L·X = B`.
pub fn approx_solve_tril(x: &mut BallMat, l: &BallMat, b: &BallMat, unit: bool, prec: u64) {
    ApproxSolver::default().solve_lower(x.as_mut(), l.as_ref(), Some(b.as_ref()), unit, prec);
}

/// Midpoint-only solve of `U·X = B`.
pub fn approx_solve_triu(x: &mut BallMat, u: &BallMat, b: &BallMat, unit: bool, prec: u64) {
    ApproxSolver::default().solve_upper(x.as_mut(), u.as_ref(), Some(b.as_ref()), unit, prec);
}

/// Certified solve of `L·X = B` where `X` holds `B` on entry.
pub fn solve_tril_in_place(x: &mut BallMat, l: &BallMat, unit: bool, prec: u64) {
    CertifiedSolver::default().solve_lower(x.as_mut(), l.as_ref(), None, unit, prec);
}

/// Certified solve of `U·X = B` where `X` holds `B` on entry.
pub fn solve_triu_in_place(x: &mut BallMat, u: &BallMat, unit: bool, prec: u64) {
    CertifiedSolver::default().solve_upper(x.as_mut(), u.as_ref(), None, unit, prec);
}

/// Midpoint-only solve of `L·X = B` where `X` holds `B` on entry.
pub fn approx_solve_tril_in_place(x: &mut BallMat, l: &BallMat, unit: bool, prec: u64) {
    ApproxSolver::default().solve_lower(x.as_mut(), l.as_ref(), None, unit, prec);
}

/// Midpoint-only solve of `U·X = B` where `X` holds `B` on entry.
pub fn approx_solve_triu_in_place(x: &mut BallMat, u: &BallMat, unit: bool, prec: u64) {
    ApproxSolver::default().solve_upper(x.as_mut(), u.as_ref(), None, unit, prec);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::float::Float;
    use crate::mag::Mag;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    const PREC: u64 = 96;

    fn random_triangular(n: usize, lower: bool, rng: &mut ChaCha8Rng) -> BallMat {
        BallMat::from_fn(n, n, |i, j| {
            if i == j {
                Ball::from_i64(rng.gen_range(n as i64 + 2..3 * n as i64 + 4))
            } else if (i > j) == lower {
                Ball::from_f64(rng.gen_range(-1.0..1.0))
            } else {
                // garbage on the ignored side
                Ball::from_i64(rng.gen_range(-1000..1000))
            }
        })
    }

    fn random_rhs(n: usize, m: usize, rng: &mut ChaCha8Rng) -> BallMat {
        BallMat::from_fn(n, m, |_, _| Ball::from_f64(rng.gen_range(-10.0..10.0)))
    }

    fn triangle_only(t: &BallMat, lower: bool) -> BallMat {
        BallMat::from_fn(t.rows(), t.cols(), |i, j| {
            if i == j || (i > j) == lower {
                t.entry(i, j).clone()
            } else {
                Ball::zero()
            }
        })
    }

    fn max_midpoint_gap(a: &BallMat, b: &BallMat) -> f64 {
        let mut gap: f64 = 0.0;
        for i in 0..a.rows() {
            for j in 0..a.cols() {
                let d = a.entry(i, j).mid().to_f64() - b.entry(i, j).mid().to_f64();
                gap = gap.max(d.abs());
            }
        }
        gap
    }

    #[test]
    fn test_lower_concrete_scenario() {
        let l = BallMat::from_i64_rows(&[[2, 0], [3, 4]]).unwrap();
        let b = BallMat::from_i64_rows(&[[4], [11]]).unwrap();
        let expected = BallMat::from_f64_rows(&[[2.0], [1.25]]).unwrap();

        let mut x = BallMat::zeros(2, 1);
        solve_tril(&mut x, &l, &b, false, PREC);
        assert_eq!(x, expected);

        let mut x = BallMat::zeros(2, 1);
        approx_solve_tril(&mut x, &l, &b, false, PREC);
        assert_eq!(x, expected);
    }

    #[test]
    fn test_upper_concrete_scenario() {
        let u = BallMat::from_i64_rows(&[[2, 1], [0, 4]]).unwrap();
        let b = BallMat::from_i64_rows(&[[4], [8]]).unwrap();
        let expected = BallMat::from_i64_rows(&[[1], [2]]).unwrap();

        let mut x = BallMat::zeros(2, 1);
        solve_triu(&mut x, &u, &b, false, PREC);
        assert_eq!(x, expected);

        let mut x = BallMat::zeros(2, 1);
        approx_solve_triu(&mut x, &u, &b, false, PREC);
        assert_eq!(x, expected);
    }

    #[test]
    fn test_empty_systems_are_untouched() {
        let solver = CertifiedSolver::default();
        let l = BallMat::zeros(0, 0);
        let mut x = BallMat::zeros(0, 3);
        solver.solve_lower_recursive(x.as_mut(), l.as_ref(), None, false, PREC);
        solver.solve_upper_classical(x.as_mut(), l.as_ref(), None, false, PREC);
        assert_eq!(x, BallMat::zeros(0, 3));

        let l = BallMat::identity(12);
        let b = BallMat::zeros(12, 0);
        let mut x = BallMat::zeros(12, 0);
        solver.solve_lower_recursive(x.as_mut(), l.as_ref(), Some(b.as_ref()), false, PREC);
        ApproxSolver::default().solve_upper_recursive(x.as_mut(), l.as_ref(), None, true, PREC);
        assert_eq!(x.cols(), 0);
    }

    #[test]
    fn test_certified_solution_encloses_rhs() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for &(n, m) in &[(1, 1), (3, 2), (7, 9), (9, 9), (16, 10), (21, 8)] {
            for lower in [true, false] {
                let t = random_triangular(n, lower, &mut rng);
                let b = random_rhs(n, m, &mut rng);
                let mut x = BallMat::zeros(n, m);
                if lower {
                    solve_tril(&mut x, &t, &b, false, PREC);
                } else {
                    solve_triu(&mut x, &t, &b, false, PREC);
                }
                let image = triangle_only(&t, lower).mul(&x, PREC);
                assert!(image.contains(&b), "n={} m={} lower={}", n, m, lower);
            }
        }
    }

    fn classical_and_recursive<A: BallArithmetic>(
        solver: &TriangularSolver<A>,
        t: &BallMat,
        b: &BallMat,
        lower: bool,
    ) -> (BallMat, BallMat) {
        let (t, rhs) = (t.as_ref(), Some(b.as_ref()));
        let mut classical = BallMat::zeros(b.rows(), b.cols());
        let mut recursive = BallMat::zeros(b.rows(), b.cols());
        if lower {
            solver.solve_lower_classical(classical.as_mut(), t, rhs, false, PREC);
            solver.solve_lower_recursive(recursive.as_mut(), t, rhs, false, PREC);
        } else {
            solver.solve_upper_classical(classical.as_mut(), t, rhs, false, PREC);
            solver.solve_upper_recursive(recursive.as_mut(), t, rhs, false, PREC);
        }
        (classical, recursive)
    }

    #[test]
    fn test_classical_and_recursive_agree_across_crossover() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for n in [7, 8, 9, 17] {
            let b = random_rhs(n, 9, &mut rng);
            for lower in [true, false] {
                let t = random_triangular(n, lower, &mut rng);

                let (classical, recursive) =
                    classical_and_recursive(&CertifiedSolver::default(), &t, &b, lower);
                assert!(classical.overlaps(&recursive));
                assert!(max_midpoint_gap(&classical, &recursive) < 1e-20);

                let (classical, recursive) =
                    classical_and_recursive(&ApproxSolver::default(), &t, &b, lower);
                assert!(max_midpoint_gap(&classical, &recursive) < 1e-20);
            }
        }
    }

    #[test]
    fn test_approximate_residual_is_small() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let n = 20;
        let l = random_triangular(n, true, &mut rng);
        let b = random_rhs(n, 12, &mut rng);
        let mut x = BallMat::zeros(n, 12);
        approx_solve_tril(&mut x, &l, &b, false, PREC);
        x.get_mid();
        let image = triangle_only(&l, true).mul(&x, PREC);
        assert!(max_midpoint_gap(&image, &b) < 1e-20);
    }

    #[test]
    fn test_in_place_matches_separate_rhs() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for n in [5, 12] {
            let t = random_triangular(n, false, &mut rng);
            let b = random_rhs(n, 10, &mut rng);

            let mut separate = b.clone();
            solve_triu(&mut separate, &t, &b, false, PREC);
            let mut aliased = b.clone();
            CertifiedSolver::default().solve_upper(aliased.as_mut(), t.as_ref(), None, false, PREC);
            assert_eq!(separate, aliased);
            let mut aliased = b.clone();
            solve_triu_in_place(&mut aliased, &t, false, PREC);
            assert_eq!(separate, aliased);

            let t = random_triangular(n, true, &mut rng);
            let mut separate = b.clone();
            approx_solve_tril(&mut separate, &t, &b, false, PREC);
            let mut aliased = b.clone();
            ApproxSolver::default().solve_lower(aliased.as_mut(), t.as_ref(), None, false, PREC);
            assert_eq!(separate, aliased);
            let mut aliased = b.clone();
            approx_solve_tril_in_place(&mut aliased, &t, false, PREC);
            assert_eq!(separate, aliased);
        }
    }

    #[test]
    fn test_unit_diagonal_is_never_read() {
        let mut rng = ChaCha8Rng::seed_from_u64(13);
        for n in [4, 10] {
            let l = random_triangular(n, true, &mut rng);
            let b = random_rhs(n, 9, &mut rng);
            let mut ones = l.clone();
            let mut junk = l.clone();
            for i in 0..n {
                *ones.entry_mut(i, i) = Ball::one();
                *junk.entry_mut(i, i) = Ball::new(Float::from_i64(0), Mag::inf());
            }

            let mut x1 = BallMat::zeros(n, 9);
            let mut x2 = BallMat::zeros(n, 9);
            let mut x3 = BallMat::zeros(n, 9);
            solve_tril(&mut x1, &ones, &b, false, PREC);
            solve_tril(&mut x2, &ones, &b, true, PREC);
            solve_tril(&mut x3, &junk, &b, true, PREC);
            assert_eq!(x2, x3);
            assert!(x1.overlaps(&x2));
            assert!(max_midpoint_gap(&x1, &x2) < 1e-20);
        }
    }

    #[test]
    fn test_singular_diagonal_gives_indeterminate_entries() {
        let u = BallMat::from_i64_rows(&[[1, 2], [0, 0]]).unwrap();
        let b = BallMat::from_i64_rows(&[[1], [1]]).unwrap();
        let mut x = BallMat::zeros(2, 1);
        solve_triu(&mut x, &u, &b, false, PREC);
        assert!(!x.entry(1, 0).is_finite());
        assert!(!x.entry(0, 0).is_finite());

        let mut x = BallMat::zeros(2, 1);
        approx_solve_triu(&mut x, &u, &b, false, PREC);
        assert!(x.entry(1, 0).mid().is_nan());
    }

    #[test]
    fn test_approximate_substitution_keeps_solution_radii() {
        let l = BallMat::from_i64_rows(&[[2, 0], [3, 4]]).unwrap();
        let b = BallMat::from_i64_rows(&[[4], [11]]).unwrap();
        let mut x = BallMat::from_fn(2, 1, |_, _| Ball::new(Float::zero(), Mag::from_f64(1.0)));
        approx_solve_tril(&mut x, &l, &b, false, PREC);
        assert_eq!(x.entry(1, 0).mid(), &Float::from_f64(1.25));
        assert_eq!(x.entry(1, 0).rad(), &Mag::from_f64(1.0));
    }

    #[test]
    fn test_approximate_recursion_zeroes_residual_block_radii() {
        let n = 8;
        let l = BallMat::identity(n);
        let b = BallMat::from_fn(n, n, |i, j| Ball::from_i64((i * n + j) as i64));
        let mut x = BallMat::from_fn(n, n, |_, _| Ball::new(Float::zero(), Mag::from_f64(1.0)));
        approx_solve_tril(&mut x, &l, &b, false, PREC);
        assert_eq!(x.entry(0, 0).rad(), &Mag::from_f64(1.0));
        assert!(x.entry(n - 1, 0).is_exact());
        assert_eq!(x.entry(n - 1, 3).mid(), &Float::from_i64(((n - 1) * n + 3) as i64));
    }

    #[test]
    fn test_custom_crossover() {
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        let n = 6;
        let u = random_triangular(n, false, &mut rng);
        let b = random_rhs(n, 3, &mut rng);
        let eager = CertifiedSolver::new(SolveConfig::new(2).unwrap());
        let mut x1 = BallMat::zeros(n, 3);
        let mut x2 = BallMat::zeros(n, 3);
        eager.solve_upper(x1.as_mut(), u.as_ref(), Some(b.as_ref()), false, PREC);
        solve_triu(&mut x2, &u, &b, false, PREC);
        assert!(x1.overlaps(&x2));
        let image = triangle_only(&u, false).mul(&x1, PREC);
        assert!(image.contains(&b));
    }

    #[test]
    fn test_shape_checks() {
        let t = BallMat::zeros(3, 3);
        let b = BallMat::zeros(3, 2);
        assert!(check_solve_shapes(&BallMat::zeros(3, 2), &t, &b).is_ok());
        assert!(matches!(
            check_solve_shapes(&BallMat::zeros(3, 2), &BallMat::zeros(3, 2), &b),
            Err(BallError::ShapeMismatch(_))
        ));
        assert_eq!(
            check_solve_shapes(&BallMat::zeros(2, 2), &t, &BallMat::zeros(2, 2)),
            Err(BallError::InvalidDimension { expected: 3, got: 2 })
        );
        assert!(check_solve_shapes(&BallMat::zeros(3, 1), &t, &b).is_err());
    }
}
