//! Linear algebra utilities.
//!
//! This module provides the small dense-matrix operations needed by the
//! quadratic program builder and the covariance estimator.

use crate::error::{MathError, MathResult};
use nalgebra::{DMatrix, DVector};

/// Relative threshold below which a singular value counts as zero.
pub const RANK_TOLERANCE: f64 = 1e-10;

/// Returns `(m + mᵀ) / 2`.
///
/// Estimated covariance matrices are symmetric only up to rounding; every
/// consumer of a covariance matrix goes through this first.
pub fn symmetrize(m: &DMatrix<f64>) -> MathResult<DMatrix<f64>> {
    if m.nrows() != m.ncols() {
        return Err(MathError::invalid_input(format!(
            "Matrix must be square, got {}x{}",
            m.nrows(),
            m.ncols()
        )));
    }
    Ok((m + m.transpose()) * 0.5)
}

/// Checks `|m[i,j] - m[j,i]| <= tol * max(1, |m[i,j]|)` for every pair.
pub fn is_symmetric(m: &DMatrix<f64>, tol: f64) -> bool {
    if m.nrows() != m.ncols() {
        return false;
    }
    let n = m.nrows();
    for i in 0..n {
        for j in (i + 1)..n {
            let a = m[(i, j)];
            let b = m[(j, i)];
            if (a - b).abs() > tol * a.abs().max(1.0) {
                return false;
            }
        }
    }
    true
}

/// Computes `xᵀ Q x`.
pub fn quadratic_form(x: &DVector<f64>, q: &DMatrix<f64>) -> f64 {
    x.dot(&(q * x))
}

/// Numerical rank of a matrix, relative to its largest singular value.
pub fn row_rank(m: &DMatrix<f64>) -> usize {
    if m.nrows() == 0 || m.ncols() == 0 {
        return 0;
    }
    let svd = m.clone().svd(false, false);
    let largest = svd.singular_values.max();
    if largest <= 0.0 || !largest.is_finite() {
        return 0;
    }
    svd.rank(largest * RANK_TOLERANCE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_symmetrize() {
        let m = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 4.0, 3.0]);
        let s = symmetrize(&m).unwrap();
        assert_relative_eq!(s[(0, 1)], 3.0);
        assert_relative_eq!(s[(1, 0)], 3.0);
        assert!(is_symmetric(&s, 1e-15));
        assert!(!is_symmetric(&m, 1e-6));
    }

    #[test]
    fn test_symmetrize_rejects_rectangular() {
        let m = DMatrix::<f64>::zeros(2, 3);
        assert!(symmetrize(&m).is_err());
    }

    #[test]
    fn test_quadratic_form() {
        let q = DMatrix::from_row_slice(2, 2, &[0.04, 0.0, 0.0, 0.09]);
        let x = DVector::from_vec(vec![0.5, 0.5]);
        assert_relative_eq!(quadratic_form(&x, &q), 0.0325, epsilon = 1e-15);
    }

    #[test]
    fn test_row_rank() {
        let full = DMatrix::from_row_slice(2, 3, &[1.0, 1.0, 1.0, 0.1, 0.2, 0.3]);
        assert_eq!(row_rank(&full), 2);

        let deficient = DMatrix::from_row_slice(2, 3, &[1.0, 1.0, 1.0, 0.2, 0.2, 0.2]);
        assert_eq!(row_rank(&deficient), 1);

        assert_eq!(row_rank(&DMatrix::zeros(2, 0)), 0);
    }
}
