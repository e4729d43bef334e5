//! Efficient frontier sweep.

use nalgebra::{DMatrix, DVector};
use tracing::{debug, warn};

use super::min_variance::{min_variance, renormalize, solve_variance_qp};
use super::parallel::maybe_parallel_map;
use super::{argmax, validate_inputs};
use crate::error::{OptimizerError, OptimizerResult};
use crate::types::{
    portfolio_return, portfolio_volatility, Frontier, FrontierPoint, OptimizerConfig,
};

/// Traces the long-only efficient frontier.
///
/// Targets are `n_points` evenly spaced returns from the minimum-variance
/// portfolio's return up to `max(μ)` inclusive. Interior targets are solved
/// as the minimum-variance program with the extra constraint `wᵀμ = target`,
/// so every point depends only on (μ, Σ, target). The first point is the
/// minimum-variance portfolio itself; the last is the minimum-variance mix of
/// the assets tied at `max(μ)`, the only holdings that reach that return.
///
/// A target that turns out infeasible is skipped, so the result may hold
/// fewer than `n_points` entries. When `n_points` is 1, or every feasible
/// return equals the minimum-variance return, the frontier is that single
/// point.
///
/// # Errors
///
/// - [`OptimizerError::InvalidParameter`] if `n_points` is zero
/// - any error of [`min_variance`]
/// - [`OptimizerError::NonConverged`] if any target exhausts the solver budget
pub fn efficient_frontier(
    mu: &DVector<f64>,
    cov: &DMatrix<f64>,
    n_points: usize,
    config: &OptimizerConfig,
) -> OptimizerResult<Frontier> {
    validate_inputs(mu, cov)?;
    if n_points == 0 {
        return Err(OptimizerError::invalid_parameter(
            "n_points",
            "must be at least 1",
        ));
    }

    let anchor = min_variance(mu, cov, &config.solver)?;
    let r_min = anchor.expected_return();
    let r_max = mu[argmax(mu)];

    let span = r_max - r_min;
    if n_points == 1 || span <= config.solver.feasibility_tolerance * r_max.abs().max(1.0) {
        debug!(n_points, span, "frontier collapses to the minimum-variance point");
        return Ok(Frontier {
            points: vec![FrontierPoint {
                target_return: r_min,
                expected_return: r_min,
                volatility: anchor.volatility(),
                weights: anchor.weights,
            }],
        });
    }

    let step = span / (n_points - 1) as f64;
    let targets: Vec<f64> = (0..n_points)
        .map(|k| {
            if k == n_points - 1 {
                r_max
            } else {
                r_min + step * k as f64
            }
        })
        .collect();

    let solved = maybe_parallel_map(&targets, config, |&target| {
        let weights = if target <= r_min {
            Ok(anchor.weights.clone())
        } else if target >= r_max {
            top_return_mix(mu, cov, r_max, config)
        } else {
            solve_variance_qp(cov, Some((mu, target)), &config.solver)
                .map(|solution| renormalize(solution.x))
        };
        weights.map(|w| point(mu, cov, target, w))
    });

    let mut points = Vec::with_capacity(n_points);
    for (target, result) in targets.iter().zip(solved) {
        match result {
            Ok(point) => points.push(point),
            Err(OptimizerError::Infeasible { reason }) => {
                warn!(target_return = target, %reason, "skipping infeasible frontier target");
            }
            Err(e) => return Err(e),
        }
    }

    debug!(
        requested = n_points,
        solved = points.len(),
        r_min,
        r_max,
        "efficient frontier traced"
    );

    Ok(Frontier { points })
}

/// Lowest-variance portfolio among the assets whose return equals `r_max`.
fn top_return_mix(
    mu: &DVector<f64>,
    cov: &DMatrix<f64>,
    r_max: f64,
    config: &OptimizerConfig,
) -> OptimizerResult<DVector<f64>> {
    let top: Vec<usize> = (0..mu.len()).filter(|&i| mu[i] >= r_max).collect();
    let mut weights = DVector::zeros(mu.len());
    if let [only] = top.as_slice() {
        weights[*only] = 1.0;
        return Ok(weights);
    }

    let sub = cov.select_rows(top.iter()).select_columns(top.iter());
    let solution = solve_variance_qp(&sub, None, &config.solver)?;
    for (k, w) in renormalize(solution.x).iter().enumerate() {
        weights[top[k]] = *w;
    }
    Ok(weights)
}

fn point(
    mu: &DVector<f64>,
    cov: &DMatrix<f64>,
    target: f64,
    weights: DVector<f64>,
) -> FrontierPoint {
    FrontierPoint {
        target_return: target,
        expected_return: portfolio_return(&weights, mu),
        volatility: portfolio_volatility(&weights, cov),
        weights,
    }
}
