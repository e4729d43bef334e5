//! Error types for portfolio optimization.
//!
//! Every error is returned to the immediate caller. Nothing in this crate
//! retries with relaxed constraints or returns partial results.

use markowitz_math::MathError;
use thiserror::Error;

/// Result type for portfolio operations.
pub type OptimizerResult<T> = Result<T, OptimizerError>;

/// Errors that can occur during estimation and optimization.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OptimizerError {
    /// Fewer observations or assets than a valid estimate needs.
    #[error("Insufficient data: need at least {required} {what}, got {actual}")]
    InsufficientData {
        /// What was counted (e.g. "observations").
        what: String,
        /// Minimum required.
        required: usize,
        /// Actual count.
        actual: usize,
    },

    /// Lengths of paired inputs disagree.
    #[error("Dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// The input whose length is wrong.
        what: String,
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// The constraint set admits no feasible point.
    #[error("Infeasible: {reason}")]
    Infeasible {
        /// Why no feasible point exists.
        reason: String,
    },

    /// The numerical solver exhausted its budget.
    #[error("Solver did not converge after {iterations} iterations (residual: {residual:.2e})")]
    NonConverged {
        /// Iterations used.
        iterations: u32,
        /// Final residual.
        residual: f64,
    },

    /// Malformed input container or matrix.
    #[error("Invalid input: {reason}")]
    InvalidInput {
        /// What is wrong with the input.
        reason: String,
    },

    /// Configuration value outside its domain.
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: String,
        /// What is wrong with the value.
        reason: String,
    },
}

impl OptimizerError {
    /// Create an insufficient data error.
    #[must_use]
    pub fn insufficient_data(what: impl Into<String>, required: usize, actual: usize) -> Self {
        Self::InsufficientData {
            what: what.into(),
            required,
            actual,
        }
    }

    /// Create a dimension mismatch error.
    #[must_use]
    pub fn dimension_mismatch(what: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            what: what.into(),
            expected,
            actual,
        }
    }

    /// Create an infeasible error.
    #[must_use]
    pub fn infeasible(reason: impl Into<String>) -> Self {
        Self::Infeasible {
            reason: reason.into(),
        }
    }

    /// Create a non-converged error.
    #[must_use]
    pub fn non_converged(iterations: u32, residual: f64) -> Self {
        Self::NonConverged {
            iterations,
            residual,
        }
    }

    /// Create an invalid input error.
    #[must_use]
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Create an invalid parameter error.
    #[must_use]
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

impl From<MathError> for OptimizerError {
    fn from(err: MathError) -> Self {
        match err {
            MathError::ConvergenceFailed {
                iterations,
                residual,
            } => Self::NonConverged {
                iterations,
                residual,
            },
            MathError::Infeasible { reason } => Self::Infeasible { reason },
            MathError::DimensionMismatch {
                what,
                expected,
                actual,
            } => Self::DimensionMismatch {
                what,
                expected,
                actual,
            },
            MathError::InsufficientData { required, actual } => Self::InsufficientData {
                what: "data points".to_string(),
                required,
                actual,
            },
            MathError::SingularMatrix => Self::InvalidInput {
                reason: "singular system in quadratic program".to_string(),
            },
            MathError::InvalidInput { reason } => Self::InvalidInput { reason },
        }
    }
}
