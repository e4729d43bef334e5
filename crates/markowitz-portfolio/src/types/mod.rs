//! Core types for portfolio optimization.
//!
//! This module contains the fundamental data structures:
//! - [`ReturnSeries`] and [`PriceTable`]: date-indexed, fixed-schema asset tables
//! - [`OptimizerConfig`] and [`Strategy`]: explicit configuration
//! - [`PortfolioMetrics`], [`OptimizedPortfolio`], [`Frontier`]: solver outputs

mod config;
mod portfolio;
mod returns;

pub use config::{OptimizerConfig, Strategy};
pub use portfolio::{
    portfolio_return, portfolio_volatility, sharpe_ratio, Frontier, FrontierPoint,
    OptimizedPortfolio, PortfolioMetrics,
};
pub use returns::{PriceTable, ReturnKind, ReturnSeries};
