//! Optimization algorithms.
//!
//! This module provides the quadratic program solver shared by every
//! mean-variance routine, backed by the Clarabel interior-point solver:
//!
//! ```text
//! minimize    ½ xᵀQx + cᵀx
//! subject to  A x = b
//!             l ≤ x ≤ u
//! ```
//!
//! # Example: Two-Asset Minimum Variance
//!
//! ```rust
//! use markowitz_math::optimization::{solve_qp, QpConfig, QuadraticProgram};
//! use nalgebra::{DMatrix, DVector};
//!
//! let cov = DMatrix::from_row_slice(2, 2, &[0.04, 0.0, 0.0, 0.09]);
//! let problem = QuadraticProgram::new(cov)
//!     .with_equality(DVector::from_element(2, 1.0), 1.0)
//!     .with_uniform_bounds(0.0, 1.0);
//!
//! let solution = solve_qp(&problem, &QpConfig::default()).unwrap();
//! assert!((solution.x[0] - 9.0 / 13.0).abs() < 1e-6);
//! ```

mod qp;

pub use qp::{solve_qp, QpSolution, QuadraticProgram};

use serde::{Deserialize, Serialize};

/// Default duality-gap tolerance (absolute and relative).
pub const DEFAULT_TOLERANCE: f64 = 1e-10;

/// Default primal and dual feasibility tolerance.
pub const DEFAULT_FEASIBILITY_TOLERANCE: f64 = 1e-9;

/// Default distance within which a value is snapped onto its bound.
pub const DEFAULT_BOUND_TOLERANCE: f64 = 1e-8;

/// Default maximum number of interior-point iterations.
pub const DEFAULT_MAX_ITERATIONS: u32 = 200;

/// Default relative ridge added to the quadratic term.
pub const DEFAULT_REGULARIZATION: f64 = 1e-10;

/// Configuration for the quadratic program solver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QpConfig {
    /// Duality-gap tolerance.
    pub tolerance: f64,
    /// Primal and dual residual tolerance.
    pub feasibility_tolerance: f64,
    /// Values this close to a finite bound are set to the bound.
    pub bound_tolerance: f64,
    /// Maximum number of interior-point iterations.
    pub max_iterations: u32,
    /// Ridge added to the diagonal, relative to the mean diagonal of Q.
    pub regularization: f64,
}

impl Default for QpConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            feasibility_tolerance: DEFAULT_FEASIBILITY_TOLERANCE,
            bound_tolerance: DEFAULT_BOUND_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            regularization: DEFAULT_REGULARIZATION,
        }
    }
}

impl QpConfig {
    /// Creates a new solver configuration.
    #[must_use]
    pub fn new(tolerance: f64, max_iterations: u32) -> Self {
        Self {
            tolerance,
            max_iterations,
            ..Self::default()
        }
    }

    /// Sets the duality-gap tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the feasibility tolerance.
    #[must_use]
    pub fn with_feasibility_tolerance(mut self, tolerance: f64) -> Self {
        self.feasibility_tolerance = tolerance;
        self
    }

    /// Sets the bound snapping distance.
    #[must_use]
    pub fn with_bound_tolerance(mut self, tolerance: f64) -> Self {
        self.bound_tolerance = tolerance;
        self
    }

    /// Sets the maximum iterations.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the relative ridge.
    #[must_use]
    pub fn with_regularization(mut self, regularization: f64) -> Self {
        self.regularization = regularization;
        self
    }

    /// Checks that every setting is finite and in range.
    pub fn validate(&self) -> crate::MathResult<()> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.tolerance) {
            return Err(crate::MathError::invalid_input(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if !positive(self.feasibility_tolerance) {
            return Err(crate::MathError::invalid_input(format!(
                "feasibility tolerance must be positive, got {}",
                self.feasibility_tolerance
            )));
        }
        if !(self.bound_tolerance.is_finite() && self.bound_tolerance >= 0.0) {
            return Err(crate::MathError::invalid_input(format!(
                "bound tolerance must be non-negative, got {}",
                self.bound_tolerance
            )));
        }
        if self.max_iterations == 0 {
            return Err(crate::MathError::invalid_input(
                "max_iterations must be at least 1",
            ));
        }
        if !(self.regularization.is_finite() && self.regularization >= 0.0) {
            return Err(crate::MathError::invalid_input(format!(
                "regularization must be non-negative, got {}",
                self.regularization
            )));
        }
        Ok(())
    }
}
