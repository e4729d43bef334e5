//! Solver outputs: optimal portfolios and the efficient frontier.

use markowitz_math::linear_algebra::quadratic_form;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use super::Strategy;

/// Annualized expected return `wᵀμ`.
#[must_use]
pub fn portfolio_return(weights: &DVector<f64>, mu: &DVector<f64>) -> f64 {
    weights.dot(mu)
}

/// Annualized volatility `sqrt(wᵀΣw)`.
///
/// Rounding can push the variance of a near-riskless mix slightly below
/// zero; it is clamped before the square root.
#[must_use]
pub fn portfolio_volatility(weights: &DVector<f64>, cov: &DMatrix<f64>) -> f64 {
    quadratic_form(weights, cov).max(0.0).sqrt()
}

/// Sharpe ratio `(r - rf) / σ`, or 0 when the volatility is not positive.
#[must_use]
pub fn sharpe_ratio(expected_return: f64, volatility: f64, risk_free_rate: f64) -> f64 {
    if volatility > 0.0 {
        (expected_return - risk_free_rate) / volatility
    } else {
        0.0
    }
}

/// Return and risk of a weight vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioMetrics {
    /// Annualized expected return.
    pub expected_return: f64,
    /// Annualized volatility.
    pub volatility: f64,
    /// Sharpe ratio, when a risk-free rate was supplied.
    pub sharpe: Option<f64>,
}

impl PortfolioMetrics {
    /// Computes return and volatility, plus Sharpe when `risk_free_rate` is given.
    #[must_use]
    pub fn compute(
        weights: &DVector<f64>,
        mu: &DVector<f64>,
        cov: &DMatrix<f64>,
        risk_free_rate: Option<f64>,
    ) -> Self {
        let expected_return = portfolio_return(weights, mu);
        let volatility = portfolio_volatility(weights, cov);
        Self {
            expected_return,
            volatility,
            sharpe: risk_free_rate.map(|rf| sharpe_ratio(expected_return, volatility, rf)),
        }
    }
}

/// A long-only, fully invested portfolio produced by one of the solvers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizedPortfolio {
    /// Weights by asset position; non-negative, summing to 1.
    pub weights: DVector<f64>,
    /// Return, volatility and Sharpe.
    pub metrics: PortfolioMetrics,
    /// Objective this portfolio was solved for.
    pub strategy: Strategy,
    /// True when max-Sharpe fell back to min-variance because no asset
    /// beats the risk-free rate.
    pub fallback: bool,
    /// Solver iterations spent (0 when no program was solved).
    pub iterations: u32,
}

impl OptimizedPortfolio {
    /// Number of assets.
    #[must_use]
    pub fn n_assets(&self) -> usize {
        self.weights.len()
    }

    /// Weights as a plain slice.
    #[must_use]
    pub fn weights_slice(&self) -> &[f64] {
        self.weights.as_slice()
    }

    /// Annualized expected return.
    #[must_use]
    pub fn expected_return(&self) -> f64 {
        self.metrics.expected_return
    }

    /// Annualized volatility.
    #[must_use]
    pub fn volatility(&self) -> f64 {
        self.metrics.volatility
    }

    /// Fills in the Sharpe ratio against `risk_free_rate`.
    #[must_use]
    pub fn with_sharpe(mut self, risk_free_rate: f64) -> Self {
        self.metrics.sharpe = Some(sharpe_ratio(
            self.metrics.expected_return,
            self.metrics.volatility,
            risk_free_rate,
        ));
        self
    }

    /// Number of assets holding at least `threshold` of the portfolio.
    #[must_use]
    pub fn holdings_above(&self, threshold: f64) -> usize {
        self.weights.iter().filter(|&&w| w >= threshold).count()
    }
}

/// The minimum-variance portfolio for one target return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrontierPoint {
    /// Target return the point was solved for.
    pub target_return: f64,
    /// Achieved expected return (equals the target within tolerance).
    pub expected_return: f64,
    /// Achieved volatility.
    pub volatility: f64,
    /// Optimal weights.
    pub weights: DVector<f64>,
}

/// Efficient frontier, ordered by ascending target return.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Frontier {
    /// Solved points. Infeasible targets are absent.
    pub points: Vec<FrontierPoint>,
}

impl Frontier {
    /// Number of solved points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if no point was solved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterates over points in ascending target order.
    pub fn iter(&self) -> impl Iterator<Item = &FrontierPoint> {
        self.points.iter()
    }

    /// Volatility of each point.
    #[must_use]
    pub fn volatilities(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.volatility).collect()
    }

    /// Achieved return of each point.
    #[must_use]
    pub fn returns(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.expected_return).collect()
    }
}

impl<'a> IntoIterator for &'a Frontier {
    type Item = &'a FrontierPoint;
    type IntoIter = std::slice::Iter<'a, FrontierPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
