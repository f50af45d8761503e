//! Ball arithmetic kernels: triangular solves over ball matrices and
//! truncated multiplication of ball polynomials.
//!
//! A ball `[m +/- r]` is an arbitrary-precision binary floating-point
//! midpoint with a low-precision radius. Certified operations return balls
//! that enclose the exact result of any point inside their inputs; the
//! approximate variants compute midpoints only.

pub mod arith;
pub mod ball;
pub mod error;
pub mod float;
pub mod mag;
pub mod matrix;
pub mod mullow;
pub mod poly;
pub mod triangular;
pub mod types;


pub use arith::{Approximate, BallArithmetic, Certified};
pub use ball::Ball;
pub use error::{BallError, Result};
pub use float::{Float, Round, Rounded};
pub use mag::Mag;
pub use matrix::{BallMat, MatMut, MatRef};
pub use mullow::{
    mullow, mullow_assign, mullow_assign_rhs, mullow_classical, sqrlow, sqrlow_assign,
};
pub use poly::BallPoly;
pub use triangular::{
    approx_solve_tril, approx_solve_tril_in_place, approx_solve_triu, approx_solve_triu_in_place,
    check_solve_shapes, solve_tril, solve_tril_in_place, solve_triu, solve_triu_in_place,
    ApproxSolver, CertifiedSolver, TriangularSolver,
};
pub use types::{SolveConfig, DEFAULT_CROSSOVER, MAG_BITS};
