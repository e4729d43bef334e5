//! # Markowitz Portfolio
//!
//! Long-only mean-variance portfolio optimization.
//!
//! This crate turns a history of asset returns into annualized estimates and
//! solves for optimal fully invested portfolios without short selling.
//!
//! ## Design Philosophy
//!
//! - **Pure functions**: every call is a function of its inputs, no caching or I/O
//! - **Fixed schema**: assets are addressed by column position, fixed once at construction
//! - **Explicit configuration**: [`OptimizerConfig`] is passed into every call
//! - **One solver**: all three objectives share [`markowitz_math::optimization::solve_qp`]
//! - **Config-driven parallelism**: optional rayon support for the frontier sweep
//!
//! ## Quick Start
//!
//! ```rust
//! use markowitz_portfolio::prelude::*;
//! use nalgebra::{DMatrix, DVector};
//!
//! let mu = DVector::from_vec(vec![0.10, 0.20]);
//! let cov = DMatrix::from_row_slice(2, 2, &[0.04, 0.0, 0.0, 0.09]);
//! let config = OptimizerConfig::default();
//!
//! let portfolio = min_variance(&mu, &cov, &config.solver)?;
//! assert!((portfolio.weights[0] - 0.6923).abs() < 1e-4);
//!
//! let weights = format_weights(portfolio.weights_slice(), &["BONDS", "STOCKS"])?;
//! assert_eq!(weights.entries()[0].label, "BONDS");
//! # Ok::<(), OptimizerError>(())
//! ```
//!
//! ## Module Overview
//!
//! - [`types`] - Return/price tables, configuration, solver outputs
//! - [`estimation`] - Annualized expected returns and covariance
//! - [`optimizer`] - Minimum variance, maximum Sharpe, efficient frontier
//! - [`format`] - Labeled weights and reports
//! - [`analysis`] - End-to-end pipeline
//!
//! ## Feature Flags
//!
//! - `parallel`: Solve frontier points on rayon

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod analysis;
pub mod error;
pub mod estimation;
pub mod format;
pub mod optimizer;
pub mod types;

// Re-export error types at crate root
pub use error::{OptimizerError, OptimizerResult};

// Re-export commonly used types
pub use analysis::{analyze, PortfolioAnalysis};
pub use estimation::{estimate, Estimates};
pub use format::{format_portfolio, format_weights, AssetWeight, FormattedWeights, WeightReport};
pub use optimizer::{efficient_frontier, max_sharpe, min_variance, optimize};
pub use types::{
    Frontier, FrontierPoint, OptimizedPortfolio, OptimizerConfig, PortfolioMetrics, PriceTable,
    ReturnKind, ReturnSeries, Strategy,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::analysis::{analyze, PortfolioAnalysis};
    pub use crate::error::{OptimizerError, OptimizerResult};
    pub use crate::estimation::{estimate, Estimates};
    pub use crate::format::{format_portfolio, format_weights, FormattedWeights, WeightReport};
    pub use crate::optimizer::{efficient_frontier, max_sharpe, min_variance, optimize};
    pub use crate::types::{
        portfolio_return, portfolio_volatility, sharpe_ratio, Frontier, FrontierPoint,
        OptimizedPortfolio, OptimizerConfig, PortfolioMetrics, PriceTable, ReturnKind,
        ReturnSeries, Strategy,
    };
    pub use markowitz_math::optimization::QpConfig;
}
