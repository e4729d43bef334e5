//! # Markowitz Math
//!
//! Numerical utilities for the Markowitz portfolio optimization library.
//!
//! This crate provides:
//!
//! - **Linear Algebra**: Symmetric matrix helpers, quadratic forms, rank checks
//! - **Optimization**: Convex quadratic programs with linear equality and box
//!   constraints, solved by the Clarabel interior-point solver
//!
//! ## Design Philosophy
//!
//! - **Deterministic**: The same inputs always produce the same solution
//! - **Numerical Stability**: Symmetrization and a relative ridge keep PSD-singular
//!   problems well posed
//! - **Reentrant**: No global solver state

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::similar_names)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::needless_range_loop)]

pub mod error;
pub mod linear_algebra;
pub mod optimization;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{MathError, MathResult};
    pub use crate::linear_algebra::{is_symmetric, quadratic_form, symmetrize};
    pub use crate::optimization::{solve_qp, QpConfig, QpSolution, QuadraticProgram};
}

pub use error::{MathError, MathResult};
