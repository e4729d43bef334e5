//! Long-only mean-variance solvers.
//!
//! Every solver works on annualized (μ, Σ) addressed by asset position and
//! delegates the constrained minimization to
//! [`solve_qp`](markowitz_math::optimization::solve_qp):
//!
//! - [`min_variance`]: minimize `wᵀΣw` s.t. `Σwᵢ = 1`, `wᵢ ≥ 0`
//! - [`max_sharpe`]: maximize `(wᵀμ - rf) / sqrt(wᵀΣw)` on the same set
//! - [`efficient_frontier`]: [`min_variance`] plus `wᵀμ = r` over a target grid
//!
//! All solvers are deterministic: the same inputs give bitwise-identical
//! outputs regardless of thread count.

mod frontier;
mod max_sharpe;
mod min_variance;
mod parallel;

pub use frontier::efficient_frontier;
pub use max_sharpe::max_sharpe;
pub use min_variance::min_variance;

use markowitz_math::linear_algebra::is_symmetric;
use nalgebra::{DMatrix, DVector};

use crate::error::{OptimizerError, OptimizerResult};
use crate::types::{OptimizedPortfolio, OptimizerConfig, Strategy};

/// Relative tolerance for the symmetry check on Σ.
pub const SYMMETRY_TOLERANCE: f64 = 1e-8;

/// Checks that μ and Σ describe the same non-empty universe.
///
/// # Errors
///
/// - [`OptimizerError::Infeasible`] for zero assets
/// - [`OptimizerError::DimensionMismatch`] if Σ is not `N × N`
/// - [`OptimizerError::InvalidInput`] for non-finite values, an asymmetric Σ,
///   or a negative variance
pub fn validate_inputs(mu: &DVector<f64>, cov: &DMatrix<f64>) -> OptimizerResult<()> {
    let n = mu.len();
    if n == 0 {
        return Err(OptimizerError::infeasible("no assets"));
    }
    if cov.nrows() != n {
        return Err(OptimizerError::dimension_mismatch(
            "covariance rows",
            n,
            cov.nrows(),
        ));
    }
    if cov.ncols() != n {
        return Err(OptimizerError::dimension_mismatch(
            "covariance columns",
            n,
            cov.ncols(),
        ));
    }
    if mu.iter().any(|v| !v.is_finite()) {
        return Err(OptimizerError::invalid_input(
            "expected returns contain non-finite values",
        ));
    }
    if cov.iter().any(|v| !v.is_finite()) {
        return Err(OptimizerError::invalid_input(
            "covariance contains non-finite values",
        ));
    }
    if !is_symmetric(cov, SYMMETRY_TOLERANCE) {
        return Err(OptimizerError::invalid_input("covariance is not symmetric"));
    }
    if let Some(i) = cov.diagonal().iter().position(|&v| v < 0.0) {
        return Err(OptimizerError::invalid_input(format!(
            "negative variance for asset {i}"
        )));
    }
    Ok(())
}

/// Runs the solver chosen by `config.strategy`.
///
/// The returned portfolio always carries a Sharpe ratio against
/// `config.risk_free_rate`.
pub fn optimize(
    mu: &DVector<f64>,
    cov: &DMatrix<f64>,
    config: &OptimizerConfig,
) -> OptimizerResult<OptimizedPortfolio> {
    config.validate()?;
    match config.strategy {
        Strategy::MinVariance => {
            Ok(min_variance(mu, cov, &config.solver)?.with_sharpe(config.risk_free_rate))
        }
        Strategy::MaxSharpe => max_sharpe(mu, cov, config.risk_free_rate, &config.solver),
    }
}

/// Lowest index holding the largest value.
pub(crate) fn argmax(v: &DVector<f64>) -> usize {
    let mut best = 0;
    for i in 1..v.len() {
        if v[i] > v[best] {
            best = i;
        }
    }
    best
}
