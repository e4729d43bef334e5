//! Presentation-ready weight records.
//!
//! Formatting never alters the weights used for further computation:
//! rounding happens only in [`Display`](std::fmt::Display) output.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{OptimizerError, OptimizerResult};
use crate::types::{OptimizedPortfolio, PortfolioMetrics, Strategy};

/// One asset's weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetWeight {
    /// Asset label.
    pub label: String,
    /// Unrounded weight.
    pub weight: f64,
}

/// Ordered mapping from asset label to weight.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FormattedWeights {
    entries: Vec<AssetWeight>,
}

impl FormattedWeights {
    /// Entries in asset order.
    #[must_use]
    pub fn entries(&self) -> &[AssetWeight] {
        &self.entries
    }

    /// Weight of the asset with this label.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.label == label)
            .map(|e| e.weight)
    }

    /// Number of assets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates in asset order.
    pub fn iter(&self) -> impl Iterator<Item = &AssetWeight> {
        self.entries.iter()
    }

    /// Entries sorted by descending weight; equal weights keep asset order.
    #[must_use]
    pub fn ranked(&self) -> Vec<&AssetWeight> {
        let mut ranked: Vec<&AssetWeight> = self.entries.iter().collect();
        ranked.sort_by(|a, b| b.weight.total_cmp(&a.weight));
        ranked
    }
}

impl fmt::Display for FormattedWeights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.entries.iter().map(|e| e.label.len()).max().unwrap_or(0);
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(
                f,
                "{:<width$}  {:>7.2}%",
                entry.label,
                entry.weight * 100.0,
                width = width
            )?;
        }
        Ok(())
    }
}

/// Pairs weights with asset labels, preserving order.
///
/// # Errors
///
/// [`OptimizerError::DimensionMismatch`] if the lengths differ.
pub fn format_weights<S: AsRef<str>>(
    weights: &[f64],
    labels: &[S],
) -> OptimizerResult<FormattedWeights> {
    if weights.len() != labels.len() {
        return Err(OptimizerError::dimension_mismatch(
            "asset labels",
            weights.len(),
            labels.len(),
        ));
    }
    Ok(FormattedWeights {
        entries: weights
            .iter()
            .zip(labels)
            .map(|(&weight, label)| AssetWeight {
                label: label.as_ref().to_string(),
                weight,
            })
            .collect(),
    })
}

/// Weights plus metrics, handed to whatever presents the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightReport {
    /// Labeled weights.
    pub weights: FormattedWeights,
    /// Return, volatility and Sharpe.
    pub metrics: PortfolioMetrics,
    /// Objective the weights were solved for.
    pub strategy: Strategy,
    /// True when max-Sharpe fell back to minimum variance.
    pub fallback: bool,
}

/// Builds a [`WeightReport`] for a solved portfolio.
pub fn format_portfolio<S: AsRef<str>>(
    portfolio: &OptimizedPortfolio,
    labels: &[S],
) -> OptimizerResult<WeightReport> {
    Ok(WeightReport {
        weights: format_weights(portfolio.weights_slice(), labels)?,
        metrics: portfolio.metrics,
        strategy: portfolio.strategy,
        fallback: portfolio.fallback,
    })
}

impl fmt::Display for WeightReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.weights)?;
        write!(
            f,
            "return {:.2}%  volatility {:.2}%",
            self.metrics.expected_return * 100.0,
            self.metrics.volatility * 100.0
        )?;
        if let Some(sharpe) = self.metrics.sharpe {
            write!(f, "  sharpe {sharpe:.2}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DVector;

    #[test]
    fn test_format_weights_preserves_order() {
        let formatted = format_weights(&[0.25, 0.5, 0.25], &["C", "A", "B"]).unwrap();
        let labels: Vec<&str> = formatted.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["C", "A", "B"]);
        assert_eq!(formatted.get("A"), Some(0.5));
        assert_eq!(formatted.get("Z"), None);
        assert_eq!(formatted.len(), 3);
    }

    #[test]
    fn test_length_mismatch() {
        let err = format_weights(&[0.2, 0.3, 0.5], &["A", "B"]).unwrap_err();
        assert!(matches!(
            err,
            OptimizerError::DimensionMismatch {
                expected: 3,
                actual: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_display_rounds_only_for_output() {
        let formatted = format_weights(&[0.123456, 0.876544], &["AAA", "B"]).unwrap();
        let text = formatted.to_string();
        assert!(text.contains("12.35%"));
        assert!(text.contains("87.65%"));
        assert_eq!(formatted.get("AAA"), Some(0.123456));
    }

    #[test]
    fn test_ranked() {
        let formatted = format_weights(&[0.2, 0.4, 0.2, 0.2], &["A", "B", "C", "D"]).unwrap();
        let ranked: Vec<&str> = formatted.ranked().iter().map(|e| e.label.as_str()).collect();
        assert_eq!(ranked, vec!["B", "A", "C", "D"]);
    }

    #[test]
    fn test_format_portfolio() {
        let weights = DVector::from_vec(vec![0.6, 0.4]);
        let portfolio = OptimizedPortfolio {
            metrics: PortfolioMetrics {
                expected_return: 0.12,
                volatility: 0.15,
                sharpe: Some(0.5),
            },
            weights,
            strategy: Strategy::MaxSharpe,
            fallback: false,
            iterations: 3,
        };
        let labels = vec!["SPY".to_string(), "TLT".to_string()];

        let report = format_portfolio(&portfolio, &labels).unwrap();
        assert_eq!(report.weights.get("TLT"), Some(0.4));
        assert!(report.to_string().contains("sharpe 0.50"));

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"max_sharpe\""));

        assert!(format_portfolio(&portfolio, &["SPY"]).is_err());
    }
}
