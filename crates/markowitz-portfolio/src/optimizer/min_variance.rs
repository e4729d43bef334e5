//! Minimum-variance portfolio.

use markowitz_math::optimization::{solve_qp, QpConfig, QpSolution, QuadraticProgram};
use nalgebra::{DMatrix, DVector};
use tracing::debug;

use super::validate_inputs;
use crate::error::OptimizerResult;
use crate::types::{OptimizedPortfolio, PortfolioMetrics, Strategy};

/// Minimizes `wᵀΣw` over the long-only simplex, optionally with `wᵀμ = r`.
///
/// Shared by [`min_variance`] and the frontier sweep.
pub(crate) fn solve_variance_qp(
    cov: &DMatrix<f64>,
    target: Option<(&DVector<f64>, f64)>,
    solver: &QpConfig,
) -> OptimizerResult<QpSolution> {
    let n = cov.nrows();
    let mut problem = QuadraticProgram::new(cov.clone())
        .with_equality(DVector::from_element(n, 1.0), 1.0)
        .with_uniform_bounds(0.0, 1.0);
    if let Some((mu, r)) = target {
        problem = problem.with_equality(mu.clone(), r);
    }
    Ok(solve_qp(&problem, solver)?)
}

/// Finds the long-only, fully invested portfolio with the lowest variance.
///
/// When Σ is singular on the simplex the solver's ridge selects the
/// minimum-norm optimum among ties.
///
/// # Errors
///
/// - [`Infeasible`](crate::OptimizerError::Infeasible) for zero assets
/// - [`DimensionMismatch`](crate::OptimizerError::DimensionMismatch) if μ and Σ disagree
/// - [`NonConverged`](crate::OptimizerError::NonConverged) if the solver runs out of iterations
pub fn min_variance(
    mu: &DVector<f64>,
    cov: &DMatrix<f64>,
    solver: &QpConfig,
) -> OptimizerResult<OptimizedPortfolio> {
    validate_inputs(mu, cov)?;
    let n = mu.len();

    let (weights, iterations) = if n == 1 {
        (DVector::from_element(1, 1.0), 0)
    } else {
        let solution = solve_variance_qp(cov, None, solver)?;
        (renormalize(solution.x), solution.iterations)
    };

    let metrics = PortfolioMetrics::compute(&weights, mu, cov, None);
    debug!(
        assets = n,
        iterations,
        volatility = metrics.volatility,
        "minimum-variance portfolio solved"
    );

    Ok(OptimizedPortfolio {
        weights,
        metrics,
        strategy: Strategy::MinVariance,
        fallback: false,
        iterations,
    })
}

/// Removes the rounding drift of a budget-constrained solution.
pub(crate) fn renormalize(weights: DVector<f64>) -> DVector<f64> {
    let clipped = weights.map(|w| w.max(0.0));
    let total = clipped.sum();
    if total > 0.0 {
        clipped / total
    } else {
        clipped
    }
}
