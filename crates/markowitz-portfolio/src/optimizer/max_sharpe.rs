//! Maximum-Sharpe (tangency) portfolio.
//!
//! The ratio objective is not convex, so it is solved through the
//! homogeneous reformulation
//!
//! ```text
//! minimize    yᵀΣy
//! subject to  (μ - rf)ᵀ y = 1
//!             y ≥ 0
//! ```
//!
//! and rescaled with `w = y / Σyᵢ`. The reformulation is exact whenever at
//! least one asset has a positive excess return. Otherwise no long-only
//! portfolio has a positive Sharpe ratio and the minimum-variance portfolio
//! is returned with [`OptimizedPortfolio::fallback`] set.

use markowitz_math::optimization::{solve_qp, QpConfig, QuadraticProgram};
use nalgebra::{DMatrix, DVector};
use tracing::{debug, warn};

use super::min_variance::{min_variance, renormalize};
use super::{argmax, validate_inputs};
use crate::error::{OptimizerError, OptimizerResult};
use crate::types::{OptimizedPortfolio, PortfolioMetrics, Strategy};

/// Finds the long-only, fully invested portfolio with the highest Sharpe ratio.
///
/// # Errors
///
/// - [`OptimizerError::InvalidParameter`] if `risk_free_rate` is not finite
/// - [`OptimizerError::Infeasible`] for zero assets
/// - [`OptimizerError::NonConverged`] if the solver runs out of iterations
pub fn max_sharpe(
    mu: &DVector<f64>,
    cov: &DMatrix<f64>,
    risk_free_rate: f64,
    solver: &QpConfig,
) -> OptimizerResult<OptimizedPortfolio> {
    validate_inputs(mu, cov)?;
    if !risk_free_rate.is_finite() {
        return Err(OptimizerError::invalid_parameter(
            "risk_free_rate",
            format!("must be finite, got {risk_free_rate}"),
        ));
    }

    let n = mu.len();
    let excess = mu.add_scalar(-risk_free_rate);
    let best = argmax(&excess);

    if excess[best] <= 0.0 {
        warn!(
            assets = n,
            risk_free_rate,
            best_excess = excess[best],
            "no asset beats the risk-free rate, using minimum-variance portfolio"
        );
        let fallback = min_variance(mu, cov, solver)?;
        return Ok(OptimizedPortfolio {
            strategy: Strategy::MaxSharpe,
            fallback: true,
            ..fallback.with_sharpe(risk_free_rate)
        });
    }

    let (weights, iterations) = if n == 1 {
        (DVector::from_element(1, 1.0), 0)
    } else {
        let problem = QuadraticProgram::new(cov.clone())
            .with_equality(excess, 1.0)
            .with_bounds(DVector::zeros(n), DVector::from_element(n, f64::INFINITY));
        let solution = solve_qp(&problem, solver)?;

        // (μ - rf)ᵀy = 1 forces some positive holding; a zero sum means the
        // solver stopped short.
        let total = solution.x.sum();
        if !(total.is_finite() && total > 0.0) {
            return Err(OptimizerError::non_converged(solution.iterations, total.abs()));
        }
        (renormalize(solution.x), solution.iterations)
    };

    let metrics = PortfolioMetrics::compute(&weights, mu, cov, Some(risk_free_rate));
    debug!(
        assets = n,
        iterations,
        sharpe = metrics.sharpe,
        "maximum-Sharpe portfolio solved"
    );

    Ok(OptimizedPortfolio {
        weights,
        metrics,
        strategy: Strategy::MaxSharpe,
        fallback: false,
        iterations,
    })
}
