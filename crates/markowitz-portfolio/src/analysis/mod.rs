//! End-to-end analysis: returns in, estimates and optimal portfolios out.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::OptimizerResult;
use crate::estimation::{estimate, Estimates};
use crate::format::{format_portfolio, format_weights, FormattedWeights, WeightReport};
use crate::optimizer::{efficient_frontier, max_sharpe, min_variance};
use crate::types::{Frontier, OptimizedPortfolio, OptimizerConfig, ReturnSeries, Strategy};

/// Everything one optimization run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioAnalysis {
    /// Annualized μ and Σ with their labels.
    pub estimates: Estimates,
    /// Minimum-variance portfolio, with Sharpe against the configured rate.
    pub min_variance: OptimizedPortfolio,
    /// Maximum-Sharpe portfolio.
    pub max_sharpe: OptimizedPortfolio,
    /// Efficient frontier, if requested.
    pub frontier: Option<Frontier>,
    /// Strategy from the configuration.
    pub strategy: Strategy,
}

impl PortfolioAnalysis {
    /// Asset labels in weight order.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.estimates.labels
    }

    /// The portfolio solved for `strategy`.
    #[must_use]
    pub fn selected(&self, strategy: Strategy) -> &OptimizedPortfolio {
        match strategy {
            Strategy::MinVariance => &self.min_variance,
            Strategy::MaxSharpe => &self.max_sharpe,
        }
    }

    /// The portfolio for the configured strategy.
    #[must_use]
    pub fn chosen(&self) -> &OptimizedPortfolio {
        self.selected(self.strategy)
    }

    /// Labeled weights for `strategy`.
    pub fn weights_for(&self, strategy: Strategy) -> OptimizerResult<FormattedWeights> {
        format_weights(self.selected(strategy).weights_slice(), self.labels())
    }

    /// Weight report for the configured strategy.
    pub fn report(&self) -> OptimizerResult<WeightReport> {
        format_portfolio(self.chosen(), self.labels())
    }
}

/// Estimates (μ, Σ) from `returns` and solves every portfolio.
///
/// All or nothing: the first error is returned and nothing else.
pub fn analyze(returns: &ReturnSeries, config: &OptimizerConfig) -> OptimizerResult<PortfolioAnalysis> {
    config.validate()?;

    let estimates = estimate(returns, config.periods_per_year)?;
    let mu = &estimates.expected_returns;
    let cov = &estimates.covariance;

    let min_var = min_variance(mu, cov, &config.solver)?.with_sharpe(config.risk_free_rate);
    let tangency = max_sharpe(mu, cov, config.risk_free_rate, &config.solver)?;
    let frontier = if config.include_frontier {
        Some(efficient_frontier(mu, cov, config.n_frontier_points, config)?)
    } else {
        None
    };

    debug!(
        assets = estimates.n_assets(),
        observations = estimates.observations,
        strategy = %config.strategy,
        frontier_points = frontier.as_ref().map_or(0, Frontier::len),
        "portfolio analysis complete"
    );

    Ok(PortfolioAnalysis {
        estimates,
        min_variance: min_var,
        max_sharpe: tangency,
        frontier,
        strategy: config.strategy,
    })
}
