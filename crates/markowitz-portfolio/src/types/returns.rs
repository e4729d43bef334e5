//! Date-indexed asset tables.
//!
//! Both tables fix their schema (asset label → column position) at
//! construction. Everything downstream addresses assets by position.

use chrono::NaiveDate;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::{OptimizerError, OptimizerResult};

/// How period returns are derived from consecutive prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnKind {
    /// `p_t / p_{t-1} - 1`
    #[default]
    Simple,
    /// `ln(p_t / p_{t-1})`
    Log,
}

fn validate_schema(
    dates: &[NaiveDate],
    labels: &[String],
    values: &DMatrix<f64>,
) -> OptimizerResult<()> {
    if values.nrows() != dates.len() {
        return Err(OptimizerError::dimension_mismatch(
            "table rows",
            dates.len(),
            values.nrows(),
        ));
    }
    if values.ncols() != labels.len() {
        return Err(OptimizerError::dimension_mismatch(
            "asset labels",
            values.ncols(),
            labels.len(),
        ));
    }
    if let Some(pair) = dates.windows(2).find(|w| w[0] >= w[1]) {
        return Err(OptimizerError::invalid_input(format!(
            "dates must be strictly ascending: {} is followed by {}",
            pair[0], pair[1]
        )));
    }
    for (i, label) in labels.iter().enumerate() {
        if labels[..i].contains(label) {
            return Err(OptimizerError::invalid_input(format!(
                "duplicate asset label '{label}'"
            )));
        }
    }
    Ok(())
}

fn columns_to_matrix(
    rows: usize,
    columns: &[(String, Vec<f64>)],
) -> OptimizerResult<DMatrix<f64>> {
    for (label, column) in columns {
        if column.len() != rows {
            return Err(OptimizerError::dimension_mismatch(
                format!("column '{label}'"),
                rows,
                column.len(),
            ));
        }
    }
    Ok(DMatrix::from_fn(rows, columns.len(), |r, c| columns[c].1[r]))
}

/// Per-period asset returns: one row per date, one column per asset.
///
/// Missing observations are stored as NaN; the estimator drops any row that
/// contains a non-finite value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnSeries {
    dates: Vec<NaiveDate>,
    labels: Vec<String>,
    values: DMatrix<f64>,
}

impl ReturnSeries {
    /// Creates a return table.
    ///
    /// Dates must be strictly ascending, labels unique, and `values` must be
    /// `dates.len()` × `labels.len()`.
    pub fn new(
        dates: Vec<NaiveDate>,
        labels: Vec<String>,
        values: DMatrix<f64>,
    ) -> OptimizerResult<Self> {
        validate_schema(&dates, &labels, &values)?;
        Ok(Self {
            dates,
            labels,
            values,
        })
    }

    /// Creates a return table from `(label, column)` pairs.
    pub fn from_columns(
        dates: Vec<NaiveDate>,
        columns: Vec<(String, Vec<f64>)>,
    ) -> OptimizerResult<Self> {
        let values = columns_to_matrix(dates.len(), &columns)?;
        let labels = columns.into_iter().map(|(label, _)| label).collect();
        Self::new(dates, labels, values)
    }

    /// Observation dates, ascending.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Asset labels in column order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Raw values, rows = dates, columns = assets.
    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    /// Number of asset columns.
    pub fn n_assets(&self) -> usize {
        self.labels.len()
    }

    /// Number of dated rows, including rows with missing values.
    pub fn n_observations(&self) -> usize {
        self.dates.len()
    }

    /// Column position of an asset.
    pub fn asset_index(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// Returns a copy without the rows that contain a non-finite value.
    #[must_use]
    pub fn finite_rows(&self) -> Self {
        let keep: Vec<usize> = (0..self.values.nrows())
            .filter(|&r| self.values.row(r).iter().all(|v| v.is_finite()))
            .collect();
        Self {
            dates: keep.iter().map(|&r| self.dates[r]).collect(),
            labels: self.labels.clone(),
            values: self.values.select_rows(keep.iter()),
        }
    }
}

/// Close prices: one row per date, one column per asset, NaN where an asset
/// has no bar for that date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceTable {
    dates: Vec<NaiveDate>,
    labels: Vec<String>,
    prices: DMatrix<f64>,
}

impl PriceTable {
    /// Creates a price table with the same schema rules as [`ReturnSeries::new`].
    pub fn new(
        dates: Vec<NaiveDate>,
        labels: Vec<String>,
        prices: DMatrix<f64>,
    ) -> OptimizerResult<Self> {
        validate_schema(&dates, &labels, &prices)?;
        Ok(Self {
            dates,
            labels,
            prices,
        })
    }

    /// Creates a price table from `(label, column)` pairs.
    pub fn from_columns(
        dates: Vec<NaiveDate>,
        columns: Vec<(String, Vec<f64>)>,
    ) -> OptimizerResult<Self> {
        let prices = columns_to_matrix(dates.len(), &columns)?;
        let labels = columns.into_iter().map(|(label, _)| label).collect();
        Self::new(dates, labels, prices)
    }

    /// Price dates, ascending.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Asset labels in column order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Raw prices, rows = dates, columns = assets.
    pub fn prices(&self) -> &DMatrix<f64> {
        &self.prices
    }

    /// Derives period returns.
    ///
    /// Only dates on which every asset has a finite, positive price are used
    /// (intersection of available history). Each pair of consecutive kept
    /// dates yields one return, stamped with the later date.
    pub fn to_returns(&self, kind: ReturnKind) -> OptimizerResult<ReturnSeries> {
        if self.labels.is_empty() {
            return Err(OptimizerError::insufficient_data("asset columns", 1, 0));
        }

        let kept: Vec<usize> = (0..self.prices.nrows())
            .filter(|&r| {
                self.prices
                    .row(r)
                    .iter()
                    .all(|p| p.is_finite() && *p > 0.0)
            })
            .collect();
        if kept.len() < 2 {
            return Err(OptimizerError::insufficient_data(
                "dates with a complete set of prices",
                2,
                kept.len(),
            ));
        }

        let n_assets = self.labels.len();
        let values = DMatrix::from_fn(kept.len() - 1, n_assets, |r, c| {
            let ratio = self.prices[(kept[r + 1], c)] / self.prices[(kept[r], c)];
            match kind {
                ReturnKind::Simple => ratio - 1.0,
                ReturnKind::Log => ratio.ln(),
            }
        });
        let dates = kept[1..].iter().map(|&r| self.dates[r]).collect();

        ReturnSeries::new(dates, self.labels.clone(), values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_from_columns() {
        let series = ReturnSeries::from_columns(
            vec![day(2), day(3), day(4)],
            vec![
                ("AAA".to_string(), vec![0.01, 0.02, -0.01]),
                ("BBB".to_string(), vec![0.00, 0.01, 0.03]),
            ],
        )
        .unwrap();

        assert_eq!(series.n_assets(), 2);
        assert_eq!(series.n_observations(), 3);
        assert_eq!(series.asset_index("BBB"), Some(1));
        assert_relative_eq!(series.values()[(2, 1)], 0.03);
    }

    #[test]
    fn test_rejects_unsorted_dates() {
        let err = ReturnSeries::from_columns(
            vec![day(3), day(2)],
            vec![("AAA".to_string(), vec![0.01, 0.02])],
        )
        .unwrap_err();
        assert!(matches!(err, OptimizerError::InvalidInput { .. }));

        let err = ReturnSeries::from_columns(
            vec![day(2), day(2)],
            vec![("AAA".to_string(), vec![0.01, 0.02])],
        )
        .unwrap_err();
        assert!(matches!(err, OptimizerError::InvalidInput { .. }));
    }

    #[test]
    fn test_rejects_duplicate_labels() {
        let err = ReturnSeries::from_columns(
            vec![day(2), day(3)],
            vec![
                ("AAA".to_string(), vec![0.01, 0.02]),
                ("AAA".to_string(), vec![0.01, 0.02]),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, OptimizerError::InvalidInput { .. }));
    }

    #[test]
    fn test_rejects_ragged_columns() {
        let err = ReturnSeries::from_columns(
            vec![day(2), day(3)],
            vec![("AAA".to_string(), vec![0.01])],
        )
        .unwrap_err();
        assert!(matches!(err, OptimizerError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_finite_rows() {
        let series = ReturnSeries::from_columns(
            vec![day(2), day(3), day(4)],
            vec![
                ("AAA".to_string(), vec![0.01, f64::NAN, -0.01]),
                ("BBB".to_string(), vec![0.00, 0.01, f64::INFINITY]),
            ],
        )
        .unwrap();

        let clean = series.finite_rows();
        assert_eq!(clean.n_observations(), 1);
        assert_eq!(clean.dates(), &[day(2)]);
    }

    #[test]
    fn test_simple_returns_from_prices() {
        let prices = PriceTable::from_columns(
            vec![day(2), day(3), day(4)],
            vec![
                ("AAA".to_string(), vec![100.0, 110.0, 99.0]),
                ("BBB".to_string(), vec![50.0, 50.0, 55.0]),
            ],
        )
        .unwrap();

        let returns = prices.to_returns(ReturnKind::Simple).unwrap();
        assert_eq!(returns.dates(), &[day(3), day(4)]);
        assert_relative_eq!(returns.values()[(0, 0)], 0.10, epsilon = 1e-12);
        assert_relative_eq!(returns.values()[(1, 0)], -0.10, epsilon = 1e-12);
        assert_relative_eq!(returns.values()[(1, 1)], 0.10, epsilon = 1e-12);
    }

    #[test]
    fn test_log_returns_from_prices() {
        let prices = PriceTable::from_columns(
            vec![day(2), day(3)],
            vec![("AAA".to_string(), vec![100.0, 110.0])],
        )
        .unwrap();

        let returns = prices.to_returns(ReturnKind::Log).unwrap();
        assert_relative_eq!(returns.values()[(0, 0)], 1.1_f64.ln(), epsilon = 1e-12);
    }

    #[test]
    fn test_missing_history_uses_date_intersection() {
        // BBB has no bar on the 3rd; the return spans the 2nd to the 4th.
        let prices = PriceTable::from_columns(
            vec![day(2), day(3), day(4)],
            vec![
                ("AAA".to_string(), vec![100.0, 105.0, 120.0]),
                ("BBB".to_string(), vec![50.0, f64::NAN, 60.0]),
            ],
        )
        .unwrap();

        let returns = prices.to_returns(ReturnKind::Simple).unwrap();
        assert_eq!(returns.dates(), &[day(4)]);
        assert_relative_eq!(returns.values()[(0, 0)], 0.20, epsilon = 1e-12);
        assert_relative_eq!(returns.values()[(0, 1)], 0.20, epsilon = 1e-12);
    }

    #[test]
    fn test_too_few_complete_dates() {
        let prices = PriceTable::from_columns(
            vec![day(2), day(3)],
            vec![
                ("AAA".to_string(), vec![100.0, 105.0]),
                ("BBB".to_string(), vec![f64::NAN, 60.0]),
            ],
        )
        .unwrap();

        let err = prices.to_returns(ReturnKind::Simple).unwrap_err();
        assert!(matches!(
            err,
            OptimizerError::InsufficientData {
                required: 2,
                actual: 1,
                ..
            }
        ));
    }
}
