//! Annualized return and risk estimates.
//!
//! Turns a [`ReturnSeries`] into the expected-return vector μ and the
//! covariance matrix Σ consumed by every solver. Asset order is the column
//! order of the input and is preserved end to end.

use markowitz_math::linear_algebra::symmetrize;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{OptimizerError, OptimizerResult};
use crate::types::ReturnSeries;

/// Minimum number of clean observations for an unbiased covariance.
pub const MIN_OBSERVATIONS: usize = 2;

/// Annualized estimates for one asset universe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Estimates {
    /// Asset labels, in μ/Σ order.
    pub labels: Vec<String>,
    /// Annualized expected returns.
    pub expected_returns: DVector<f64>,
    /// Annualized covariance matrix, exactly symmetric.
    pub covariance: DMatrix<f64>,
    /// Clean observations used.
    pub observations: usize,
    /// Annualization factor applied.
    pub periods_per_year: u32,
}

impl Estimates {
    /// Number of assets.
    #[must_use]
    pub fn n_assets(&self) -> usize {
        self.labels.len()
    }

    /// Annualized volatility of each asset, `sqrt(Σᵢᵢ)`.
    #[must_use]
    pub fn volatilities(&self) -> DVector<f64> {
        self.covariance.diagonal().map(|v| v.max(0.0).sqrt())
    }

    /// Correlation matrix implied by Σ. Zero-variance assets get zero
    /// off-diagonal correlation and a unit diagonal.
    #[must_use]
    pub fn correlation(&self) -> DMatrix<f64> {
        let vol = self.volatilities();
        let n = self.n_assets();
        DMatrix::from_fn(n, n, |i, j| {
            if i == j {
                1.0
            } else if vol[i] > 0.0 && vol[j] > 0.0 {
                self.covariance[(i, j)] / (vol[i] * vol[j])
            } else {
                0.0
            }
        })
    }
}

/// Estimates annualized μ and Σ from per-period returns.
///
/// - μ = column means × `periods_per_year`
/// - Σ = unbiased sample covariance (divisor `T - 1`) × `periods_per_year`
///
/// Rows containing any non-finite value are dropped first; at least two rows
/// must remain.
///
/// # Errors
///
/// - [`OptimizerError::InvalidParameter`] if `periods_per_year` is zero
/// - [`OptimizerError::InsufficientData`] with no asset columns, or fewer
///   than two observations before or after dropping rows
pub fn estimate(returns: &ReturnSeries, periods_per_year: u32) -> OptimizerResult<Estimates> {
    if periods_per_year == 0 {
        return Err(OptimizerError::invalid_parameter(
            "periods_per_year",
            "must be at least 1",
        ));
    }
    if returns.n_assets() == 0 {
        return Err(OptimizerError::insufficient_data("asset columns", 1, 0));
    }
    if returns.n_observations() < MIN_OBSERVATIONS {
        return Err(OptimizerError::insufficient_data(
            "observations",
            MIN_OBSERVATIONS,
            returns.n_observations(),
        ));
    }

    let clean = returns.finite_rows();
    let dropped = returns.n_observations() - clean.n_observations();
    if dropped > 0 {
        debug!(
            dropped,
            kept = clean.n_observations(),
            "dropped return rows with non-finite values"
        );
    }

    let t = clean.n_observations();
    if t < MIN_OBSERVATIONS {
        return Err(OptimizerError::insufficient_data(
            "finite observations",
            MIN_OBSERVATIONS,
            t,
        ));
    }

    let values = clean.values();
    let scale = f64::from(periods_per_year);
    let means = values.row_mean().transpose();

    let mut centered = values.clone();
    for (j, mut column) in centered.column_iter_mut().enumerate() {
        column.add_scalar_mut(-means[j]);
    }
    let sample_cov = centered.transpose() * &centered / (t as f64 - 1.0);
    let covariance = symmetrize(&(sample_cov * scale))?;
    let expected_returns = means * scale;

    debug!(
        assets = clean.n_assets(),
        observations = t,
        periods_per_year,
        "estimated expected returns and covariance"
    );

    Ok(Estimates {
        labels: clean.labels().to_vec(),
        expected_returns,
        covariance,
        observations: t,
        periods_per_year,
    })
}
