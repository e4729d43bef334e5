//! Configuration for portfolio optimization.

use std::fmt;
use std::str::FromStr;

use markowitz_math::optimization::QpConfig;
use serde::{Deserialize, Serialize};

use crate::error::{OptimizerError, OptimizerResult};

/// Which optimal portfolio a caller wants to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Lowest achievable volatility.
    MinVariance,
    /// Highest excess return per unit of volatility.
    #[default]
    MaxSharpe,
}

impl Strategy {
    /// Canonical snake_case name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MinVariance => "min_variance",
            Self::MaxSharpe => "max_sharpe",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = OptimizerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "min_variance" | "minvariance" | "min_var" => Ok(Self::MinVariance),
            "max_sharpe" | "maxsharpe" | "tangency" => Ok(Self::MaxSharpe),
            other => Err(OptimizerError::invalid_parameter(
                "strategy",
                format!("unknown strategy '{other}', expected min_variance or max_sharpe"),
            )),
        }
    }
}

/// Configuration for estimation and optimization.
///
/// Passed explicitly into every call; there are no process-wide defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Annualized risk-free rate used in Sharpe ratios.
    pub risk_free_rate: f64,

    /// Periods per year used to annualize means and covariances.
    pub periods_per_year: u32,

    /// Number of target returns in the frontier sweep.
    pub n_frontier_points: usize,

    /// Portfolio the caller acts on.
    pub strategy: Strategy,

    /// Whether [`analyze`](crate::analysis::analyze) sweeps the frontier.
    pub include_frontier: bool,

    /// Solve frontier points in parallel (requires the `parallel` feature).
    pub parallel: bool,

    /// Minimum frontier point count that triggers parallel solves.
    pub parallel_threshold: usize,

    /// Numerical budget for every quadratic program.
    pub solver: QpConfig,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.07,
            periods_per_year: 252,
            n_frontier_points: 20,
            strategy: Strategy::MaxSharpe,
            include_frontier: true,
            parallel: true,
            parallel_threshold: 8,
            solver: QpConfig::default(),
        }
    }
}

impl OptimizerConfig {
    /// Creates a new config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a config that always solves sequentially.
    #[must_use]
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    /// Sets the annualized risk-free rate.
    #[must_use]
    pub fn with_risk_free_rate(mut self, rate: f64) -> Self {
        self.risk_free_rate = rate;
        self
    }

    /// Sets the annualization factor.
    #[must_use]
    pub fn with_periods_per_year(mut self, periods: u32) -> Self {
        self.periods_per_year = periods;
        self
    }

    /// Sets the frontier resolution.
    #[must_use]
    pub fn with_frontier_points(mut self, points: usize) -> Self {
        self.n_frontier_points = points;
        self
    }

    /// Sets the strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets whether the analysis pipeline sweeps the frontier.
    #[must_use]
    pub fn with_frontier(mut self, include: bool) -> Self {
        self.include_frontier = include;
        self
    }

    /// Sets whether to use parallel processing.
    #[must_use]
    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    /// Sets the threshold for parallel processing.
    #[must_use]
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Sets the solver budget.
    #[must_use]
    pub fn with_solver(mut self, solver: QpConfig) -> Self {
        self.solver = solver;
        self
    }

    /// Returns true if parallel processing should be used for the given count.
    #[must_use]
    pub fn should_parallelize(&self, count: usize) -> bool {
        cfg!(feature = "parallel") && self.parallel && count >= self.parallel_threshold
    }

    /// Checks every value against its domain.
    pub fn validate(&self) -> OptimizerResult<()> {
        if !self.risk_free_rate.is_finite() {
            return Err(OptimizerError::invalid_parameter(
                "risk_free_rate",
                format!("must be finite, got {}", self.risk_free_rate),
            ));
        }
        if self.periods_per_year == 0 {
            return Err(OptimizerError::invalid_parameter(
                "periods_per_year",
                "must be at least 1",
            ));
        }
        if self.n_frontier_points == 0 {
            return Err(OptimizerError::invalid_parameter(
                "n_frontier_points",
                "must be at least 1",
            ));
        }
        self.solver
            .validate()
            .map_err(|e| OptimizerError::invalid_parameter("solver", e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let config = OptimizerConfig::default();
        assert_eq!(config.risk_free_rate, 0.07);
        assert_eq!(config.periods_per_year, 252);
        assert_eq!(config.n_frontier_points, 20);
        assert_eq!(config.strategy, Strategy::MaxSharpe);
        assert!(config.include_frontier);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sequential() {
        let config = OptimizerConfig::sequential();
        assert!(!config.parallel);
        assert!(!config.should_parallelize(1_000));
    }

    #[test]
    fn test_builder_pattern() {
        let config = OptimizerConfig::new()
            .with_risk_free_rate(0.02)
            .with_periods_per_year(52)
            .with_frontier_points(5)
            .with_strategy(Strategy::MinVariance)
            .with_frontier(false)
            .with_threshold(4);

        assert_eq!(config.risk_free_rate, 0.02);
        assert_eq!(config.periods_per_year, 52);
        assert_eq!(config.n_frontier_points, 5);
        assert_eq!(config.strategy, Strategy::MinVariance);
        assert!(!config.include_frontier);
        assert_eq!(config.parallel_threshold, 4);
    }

    #[test]
    fn test_should_parallelize() {
        let config = OptimizerConfig::new().with_threshold(8);

        #[cfg(feature = "parallel")]
        {
            assert!(!config.should_parallelize(4));
            assert!(config.should_parallelize(8));
        }

        #[cfg(not(feature = "parallel"))]
        {
            assert!(!config.should_parallelize(4));
            assert!(!config.should_parallelize(8));
        }
    }

    #[test]
    fn test_validate() {
        let bad = OptimizerConfig::new().with_periods_per_year(0);
        assert!(matches!(
            bad.validate(),
            Err(OptimizerError::InvalidParameter { ref name, .. }) if name == "periods_per_year"
        ));

        let bad = OptimizerConfig::new().with_frontier_points(0);
        assert!(bad.validate().is_err());

        let bad = OptimizerConfig::new().with_risk_free_rate(f64::NAN);
        assert!(bad.validate().is_err());

        let bad = OptimizerConfig::new().with_solver(QpConfig::default().with_max_iterations(0));
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("min_variance".parse::<Strategy>().unwrap(), Strategy::MinVariance);
        assert_eq!("Max-Sharpe".parse::<Strategy>().unwrap(), Strategy::MaxSharpe);
        assert!("momentum".parse::<Strategy>().is_err());
        assert_eq!(Strategy::MinVariance.to_string(), "min_variance");
    }

    #[test]
    fn test_serde() {
        let config = OptimizerConfig::new()
            .with_risk_free_rate(0.05)
            .with_strategy(Strategy::MinVariance);

        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"min_variance\""));
        let parsed: OptimizerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);

        let partial: OptimizerConfig = serde_json::from_str(r#"{"risk_free_rate": 0.0}"#).unwrap();
        assert_eq!(partial.risk_free_rate, 0.0);
        assert_eq!(partial.periods_per_year, 252);
    }
}
