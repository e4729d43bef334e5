//! # Markowitz Ext File
//!
//! File-based price and return tables for the Markowitz optimizer.
//!
//! The optimizer core never touches the filesystem. This crate loads
//! date-keyed CSV files into its containers:
//! - [`load_prices`] / [`read_prices`]: close prices into a [`PriceTable`](markowitz_portfolio::PriceTable)
//! - [`load_returns`] / [`read_returns`]: period returns into a [`ReturnSeries`](markowitz_portfolio::ReturnSeries)
//!
//! For live data, fetch bars elsewhere and build the containers directly.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod table;

pub use error::{FileError, FileResult};
pub use table::{load_prices, load_returns, read_prices, read_returns};
