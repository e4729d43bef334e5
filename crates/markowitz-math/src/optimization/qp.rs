//! Convex quadratic programs solved with Clarabel.
//!
//! A [`QuadraticProgram`] is translated into Clarabel's conic form
//!
//! ```text
//! minimize    ½ xᵀPx + qᵀx
//! subject to  A x + s = b,  s ∈ {0}ᵐ × ℝ₊ᵏ
//! ```
//!
//! with the equality rows in the zero cone and every finite bound as one row
//! of the nonnegative cone. P is passed as its upper triangle.

use clarabel::algebra::CscMatrix;
use nalgebra::{DMatrix, DVector};
use tracing::{debug, trace};

use super::QpConfig;
use crate::error::{MathError, MathResult};
use crate::linear_algebra::{quadratic_form, row_rank, symmetrize};

/// A convex quadratic program `min ½ xᵀQx + cᵀx  s.t.  Ax = b, l ≤ x ≤ u`.
#[derive(Debug, Clone)]
pub struct QuadraticProgram {
    q: DMatrix<f64>,
    c: Option<DVector<f64>>,
    equalities: Vec<(DVector<f64>, f64)>,
    lower: Option<DVector<f64>>,
    upper: Option<DVector<f64>>,
}

impl QuadraticProgram {
    /// Creates an unconstrained program with quadratic term `q`.
    #[must_use]
    pub fn new(q: DMatrix<f64>) -> Self {
        Self {
            q,
            c: None,
            equalities: Vec::new(),
            lower: None,
            upper: None,
        }
    }

    /// Sets the linear term `c`.
    #[must_use]
    pub fn with_linear(mut self, c: DVector<f64>) -> Self {
        self.c = Some(c);
        self
    }

    /// Appends the equality constraint `rowᵀ x = rhs`.
    #[must_use]
    pub fn with_equality(mut self, row: DVector<f64>, rhs: f64) -> Self {
        self.equalities.push((row, rhs));
        self
    }

    /// Sets per-variable bounds. Infinite values leave a side open.
    #[must_use]
    pub fn with_bounds(mut self, lower: DVector<f64>, upper: DVector<f64>) -> Self {
        self.lower = Some(lower);
        self.upper = Some(upper);
        self
    }

    /// Applies the same `[lower, upper]` interval to every variable.
    #[must_use]
    pub fn with_uniform_bounds(self, lower: f64, upper: f64) -> Self {
        let n = self.q.nrows();
        self.with_bounds(
            DVector::from_element(n, lower),
            DVector::from_element(n, upper),
        )
    }

    /// Number of decision variables.
    pub fn dimension(&self) -> usize {
        self.q.nrows()
    }

    /// Number of equality constraints.
    pub fn equality_count(&self) -> usize {
        self.equalities.len()
    }

    /// Evaluates `½ xᵀQx + cᵀx` without any regularization.
    pub fn objective(&self, x: &DVector<f64>) -> f64 {
        let linear = self.c.as_ref().map_or(0.0, |c| c.dot(x));
        0.5 * quadratic_form(x, &self.q) + linear
    }

    fn lower_bounds(&self) -> DVector<f64> {
        self.lower
            .clone()
            .unwrap_or_else(|| DVector::from_element(self.dimension(), f64::NEG_INFINITY))
    }

    fn upper_bounds(&self) -> DVector<f64> {
        self.upper
            .clone()
            .unwrap_or_else(|| DVector::from_element(self.dimension(), f64::INFINITY))
    }

    fn linear_term(&self) -> DVector<f64> {
        self.c
            .clone()
            .unwrap_or_else(|| DVector::zeros(self.dimension()))
    }

    /// Checks shapes, finiteness and bound ordering.
    pub fn validate(&self) -> MathResult<()> {
        let n = self.q.nrows();
        if self.q.ncols() != n {
            return Err(MathError::dimension_mismatch(
                "quadratic term columns",
                n,
                self.q.ncols(),
            ));
        }
        if self.q.iter().any(|v| !v.is_finite()) {
            return Err(MathError::invalid_input(
                "quadratic term contains non-finite values",
            ));
        }
        if let Some(c) = &self.c {
            if c.len() != n {
                return Err(MathError::dimension_mismatch("linear term", n, c.len()));
            }
            if c.iter().any(|v| !v.is_finite()) {
                return Err(MathError::invalid_input(
                    "linear term contains non-finite values",
                ));
            }
        }
        for (row, rhs) in &self.equalities {
            if row.len() != n {
                return Err(MathError::dimension_mismatch(
                    "equality constraint row",
                    n,
                    row.len(),
                ));
            }
            if row.iter().any(|v| !v.is_finite()) || !rhs.is_finite() {
                return Err(MathError::invalid_input(
                    "equality constraint contains non-finite values",
                ));
            }
        }
        if let Some(lower) = &self.lower {
            if lower.len() != n {
                return Err(MathError::dimension_mismatch("lower bounds", n, lower.len()));
            }
        }
        if let Some(upper) = &self.upper {
            if upper.len() != n {
                return Err(MathError::dimension_mismatch("upper bounds", n, upper.len()));
            }
        }
        let lower = self.lower_bounds();
        let upper = self.upper_bounds();
        for i in 0..n {
            if lower[i].is_nan() || upper[i].is_nan() || lower[i] > upper[i] {
                return Err(MathError::invalid_input(format!(
                    "bounds for variable {i} are inconsistent: [{}, {}]",
                    lower[i], upper[i]
                )));
            }
        }
        Ok(())
    }
}

/// Solution of a quadratic program.
#[derive(Debug, Clone)]
pub struct QpSolution {
    /// Optimal point, clamped into its bounds.
    pub x: DVector<f64>,
    /// Unregularized objective `½ xᵀQx + cᵀx` at `x`.
    pub objective: f64,
    /// Interior-point iterations used.
    pub iterations: u32,
    /// Number of variables resting on a bound.
    pub active_bounds: usize,
    /// Lagrange multipliers of the equality constraints, in insertion order,
    /// with the convention `Qx + c = Aᵀλ` on the free variables.
    pub equality_multipliers: DVector<f64>,
}

/// Solves a convex quadratic program.
///
/// The conic problem is handed to Clarabel's interior-point solver. Values
/// within `config.bound_tolerance` of a finite bound are snapped onto it and
/// the result is clamped into the bounds.
///
/// # Errors
///
/// - [`MathError::DimensionMismatch`] / [`MathError::InvalidInput`] for a
///   malformed program or dependent equality rows
/// - [`MathError::Infeasible`] for zero variables or an empty feasible set
/// - [`MathError::ConvergenceFailed`] for every other unsuccessful status,
///   including an exhausted `config.max_iterations`
///
/// Degenerate problems (Q singular on the feasible set) get a ridge of
/// `config.regularization` times the mean diagonal of Q, so ties resolve to
/// the same point on every call.
pub fn solve_qp(problem: &QuadraticProgram, config: &QpConfig) -> MathResult<QpSolution> {
    use clarabel::solver::*;

    config.validate()?;
    problem.validate()?;

    let n = problem.dimension();
    if n == 0 {
        return Err(MathError::infeasible("problem has no decision variables"));
    }

    let m = problem.equality_count();
    let mut a_eq = DMatrix::zeros(m, n);
    for (r, (row, _)) in problem.equalities.iter().enumerate() {
        a_eq.set_row(r, &row.transpose());
    }
    if m > 0 && row_rank(&a_eq) < m {
        return Err(MathError::invalid_input(
            "equality constraints are linearly dependent",
        ));
    }

    let lower = problem.lower_bounds();
    let upper = problem.upper_bounds();

    let mut q = symmetrize(&problem.q)?;
    let mean_diag = q.diagonal().iter().map(|v| v.abs()).sum::<f64>() / n as f64;
    let ridge = if mean_diag > 0.0 {
        config.regularization * mean_diag
    } else {
        config.regularization
    };
    for i in 0..n {
        q[(i, i)] += ridge;
    }

    // Rows: equalities, then `-xᵢ ≤ -lᵢ`, then `xᵢ ≤ uᵢ` for finite bounds.
    let mut rows: Vec<DVector<f64>> = Vec::with_capacity(m + 2 * n);
    let mut rhs: Vec<f64> = Vec::with_capacity(m + 2 * n);
    for (row, b) in &problem.equalities {
        rows.push(row.clone());
        rhs.push(*b);
    }
    for i in (0..n).filter(|&i| lower[i].is_finite()) {
        let mut row = DVector::zeros(n);
        row[i] = -1.0;
        rows.push(row);
        rhs.push(-lower[i]);
    }
    for i in (0..n).filter(|&i| upper[i].is_finite()) {
        let mut row = DVector::zeros(n);
        row[i] = 1.0;
        rows.push(row);
        rhs.push(upper[i]);
    }
    let k = rows.len() - m;
    let mut a = DMatrix::zeros(rows.len(), n);
    for (r, row) in rows.iter().enumerate() {
        a.set_row(r, &row.transpose());
    }

    let mut cones = Vec::with_capacity(2);
    if m > 0 {
        cones.push(ZeroConeT(m));
    }
    if k > 0 {
        cones.push(NonnegativeConeT(k));
    }

    let p = to_csc(&q, true);
    let a = to_csc(&a, false);
    let c: Vec<f64> = problem.linear_term().iter().copied().collect();

    let settings = DefaultSettingsBuilder::default()
        .max_iter(config.max_iterations)
        .tol_gap_abs(config.tolerance)
        .tol_gap_rel(config.tolerance)
        .tol_feas(config.feasibility_tolerance)
        .verbose(false)
        .build()
        .map_err(|e| MathError::invalid_input(format!("solver settings: {e}")))?;

    let mut solver = DefaultSolver::new(&p, &c, &a, &rhs, &cones, settings)
        .map_err(|e| MathError::invalid_input(format!("solver setup: {e:?}")))?;
    solver.solve();

    let solution = &solver.solution;
    let iterations = solution.iterations;
    trace!(
        variables = n,
        equalities = m,
        bound_rows = k,
        status = ?solution.status,
        iterations,
        "interior-point solve finished"
    );

    match solution.status {
        SolverStatus::Solved | SolverStatus::AlmostSolved => {}
        SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
            return Err(MathError::infeasible(
                "constraints admit no feasible point",
            ));
        }
        _ => {
            return Err(MathError::convergence_failed(
                iterations,
                solution.r_prim.max(solution.r_dual),
            ));
        }
    }

    let mut active_bounds = 0;
    let x = DVector::from_fn(n, |i, _| {
        let v = solution.x[i];
        if v - lower[i] <= config.bound_tolerance {
            active_bounds += 1;
            lower[i]
        } else if upper[i] - v <= config.bound_tolerance {
            active_bounds += 1;
            upper[i]
        } else {
            v
        }
    });
    let equality_multipliers = DVector::from_fn(m, |r, _| -solution.z[r]);
    let objective = problem.objective(&x);

    debug!(
        variables = n,
        equalities = m,
        iterations,
        active_bounds,
        objective,
        "quadratic program solved"
    );

    Ok(QpSolution {
        x,
        objective,
        iterations,
        active_bounds,
        equality_multipliers,
    })
}

/// Compressed-column copy of `m`, skipping exact zeros. With `upper_only`
/// the entries below the diagonal are dropped.
fn to_csc(m: &DMatrix<f64>, upper_only: bool) -> CscMatrix<f64> {
    let mut colptr = Vec::with_capacity(m.ncols() + 1);
    let mut rowval = Vec::new();
    let mut nzval = Vec::new();
    colptr.push(0);
    for j in 0..m.ncols() {
        let last = if upper_only { (j + 1).min(m.nrows()) } else { m.nrows() };
        for i in 0..last {
            let v = m[(i, j)];
            if v != 0.0 {
                rowval.push(i);
                nzval.push(v);
            }
        }
        colptr.push(rowval.len());
    }
    CscMatrix::new(m.nrows(), m.ncols(), colptr, rowval, nzval)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn budget(n: usize) -> DVector<f64> {
        DVector::from_element(n, 1.0)
    }

    #[test]
    fn test_unconstrained_quadratic() {
        // Minimize (x-2)^2 + (y-3)^2 = ½ xᵀ(2I)x - (4, 6)ᵀx + const
        let problem = QuadraticProgram::new(DMatrix::identity(2, 2) * 2.0)
            .with_linear(DVector::from_vec(vec![-4.0, -6.0]));

        let solution =
            solve_qp(&problem, &QpConfig::default().with_regularization(0.0)).unwrap();

        assert_relative_eq!(solution.x[0], 2.0, epsilon = 1e-7);
        assert_relative_eq!(solution.x[1], 3.0, epsilon = 1e-7);
        assert_eq!(solution.active_bounds, 0);
    }

    #[test]
    fn test_bound_becomes_active() {
        // Same objective, but y <= 1.
        let problem = QuadraticProgram::new(DMatrix::identity(2, 2) * 2.0)
            .with_linear(DVector::from_vec(vec![-4.0, -6.0]))
            .with_bounds(
                DVector::from_element(2, f64::NEG_INFINITY),
                DVector::from_vec(vec![f64::INFINITY, 1.0]),
            );

        let solution = solve_qp(&problem, &QpConfig::default()).unwrap();

        assert_relative_eq!(solution.x[0], 2.0, epsilon = 1e-7);
        assert_eq!(solution.x[1], 1.0);
        assert_eq!(solution.active_bounds, 1);
    }

    #[test]
    fn test_simplex_minimum_variance() {
        let q = DMatrix::from_row_slice(2, 2, &[0.04, 0.0, 0.0, 0.09]);
        let problem = QuadraticProgram::new(q)
            .with_equality(budget(2), 1.0)
            .with_uniform_bounds(0.0, 1.0);

        let solution = solve_qp(&problem, &QpConfig::default()).unwrap();

        assert_relative_eq!(solution.x[0], 9.0 / 13.0, epsilon = 1e-6);
        assert_relative_eq!(solution.x[1], 4.0 / 13.0, epsilon = 1e-6);
        // λ equals the gradient Qx on the free variables.
        let expected = 0.04 * 9.0 / 13.0;
        assert_relative_eq!(solution.equality_multipliers[0], expected, epsilon = 1e-5);
    }

    #[test]
    fn test_nonnegativity_binds() {
        // Third asset is dominated: high variance, positively correlated.
        let q = DMatrix::from_row_slice(
            3,
            3,
            &[0.04, 0.01, 0.05, 0.01, 0.09, 0.06, 0.05, 0.06, 0.50],
        );
        let problem = QuadraticProgram::new(q)
            .with_equality(budget(3), 1.0)
            .with_uniform_bounds(0.0, 1.0);

        let solution = solve_qp(&problem, &QpConfig::default()).unwrap();

        assert_relative_eq!(solution.x.sum(), 1.0, epsilon = 1e-7);
        assert_eq!(solution.x[2], 0.0);
        assert!(solution.x.iter().all(|&w| w >= 0.0));
        // Two-asset closed form on the remaining pair.
        let w0 = (0.09 - 0.01) / (0.04 + 0.09 - 2.0 * 0.01);
        assert_relative_eq!(solution.x[0], w0, epsilon = 1e-6);
    }

    #[test]
    fn test_two_equalities_and_open_upper_bound() {
        // Homogeneous tangency form: y ≥ 0, (μ - rf)ᵀy = 1.
        let q = DMatrix::from_row_slice(2, 2, &[0.04, 0.0, 0.0, 0.09]);
        let excess = DVector::from_vec(vec![0.08, 0.18]);
        let problem = QuadraticProgram::new(q)
            .with_equality(excess, 1.0)
            .with_bounds(DVector::zeros(2), DVector::from_element(2, f64::INFINITY));

        let solution = solve_qp(&problem, &QpConfig::default()).unwrap();

        // y ∝ Σ⁻¹(μ - rf) = (2, 2).
        assert_relative_eq!(solution.x[0], solution.x[1], epsilon = 1e-6);
        assert_relative_eq!(0.08 * solution.x[0] + 0.18 * solution.x[1], 1.0, epsilon = 1e-7);
    }

    #[test]
    fn test_singular_quadratic_term() {
        // Perfectly correlated assets: every split has the same variance.
        let q = DMatrix::from_row_slice(2, 2, &[0.04, 0.04, 0.04, 0.04]);
        let problem = QuadraticProgram::new(q)
            .with_equality(budget(2), 1.0)
            .with_uniform_bounds(0.0, 1.0);

        let config = QpConfig::default();
        let first = solve_qp(&problem, &config).unwrap();
        let second = solve_qp(&problem, &config).unwrap();

        assert_relative_eq!(first.x.sum(), 1.0, epsilon = 1e-7);
        assert_relative_eq!(first.objective, 0.02, epsilon = 1e-8);
        assert_eq!(first.x, second.x);
    }

    #[test]
    fn test_rank_deficient_with_tied_returns() {
        // Rank-three covariance on five assets, three of them sharing the
        // top return, pinned to a return target on the frontier.
        let factors = DMatrix::from_row_slice(
            5,
            3,
            &[
                0.20, 0.05, 0.00, //
                0.18, 0.00, 0.06, //
                0.19, 0.03, 0.03, //
                0.05, 0.10, 0.00, //
                0.08, 0.00, 0.12,
            ],
        );
        let q = &factors * factors.transpose();
        let mu = DVector::from_vec(vec![0.09, 0.09, 0.09, 0.03, 0.05]);
        let config = QpConfig::default();

        for target in [0.05, 0.07, 0.085, 0.0899] {
            let problem = QuadraticProgram::new(q.clone())
                .with_equality(budget(5), 1.0)
                .with_equality(mu.clone(), target)
                .with_uniform_bounds(0.0, 1.0);

            let solution = solve_qp(&problem, &config).unwrap();
            assert_relative_eq!(solution.x.sum(), 1.0, epsilon = 1e-6);
            assert_relative_eq!(solution.x.dot(&mu), target, epsilon = 1e-7);
            assert!(solution.x.iter().all(|&w| (0.0..=1.0).contains(&w)));
        }
    }

    #[test]
    fn test_infeasible_constraints() {
        // Both weights capped at 0.4 cannot sum to one.
        let problem = QuadraticProgram::new(DMatrix::identity(2, 2))
            .with_equality(budget(2), 1.0)
            .with_uniform_bounds(0.0, 0.4);

        let err = solve_qp(&problem, &QpConfig::default()).unwrap_err();
        assert!(matches!(err, MathError::Infeasible { .. }));
    }

    #[test]
    fn test_empty_problem_is_infeasible() {
        let problem = QuadraticProgram::new(DMatrix::zeros(0, 0));
        let err = solve_qp(&problem, &QpConfig::default()).unwrap_err();
        assert!(matches!(err, MathError::Infeasible { .. }));
    }

    #[test]
    fn test_dependent_equalities_rejected() {
        let problem = QuadraticProgram::new(DMatrix::identity(2, 2))
            .with_equality(budget(2), 1.0)
            .with_equality(budget(2) * 2.0, 2.0);

        let err = solve_qp(&problem, &QpConfig::default()).unwrap_err();
        assert!(matches!(err, MathError::InvalidInput { .. }));
    }

    #[test]
    fn test_dimension_mismatch() {
        let problem = QuadraticProgram::new(DMatrix::identity(3, 3))
            .with_equality(budget(2), 1.0);
        let err = solve_qp(&problem, &QpConfig::default()).unwrap_err();
        assert!(matches!(err, MathError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_iteration_budget_exhausted() {
        let q = DMatrix::from_row_slice(
            3,
            3,
            &[0.04, 0.01, 0.05, 0.01, 0.09, 0.06, 0.05, 0.06, 0.50],
        );
        let problem = QuadraticProgram::new(q)
            .with_equality(budget(3), 1.0)
            .with_uniform_bounds(0.0, 1.0);

        let config = QpConfig::default().with_max_iterations(1);
        let err = solve_qp(&problem, &config).unwrap_err();
        assert!(matches!(err, MathError::ConvergenceFailed { .. }));
    }

    #[test]
    fn test_to_csc_upper_triangle() {
        let m = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 0.0]);
        let upper = to_csc(&m, true);
        assert_eq!(upper.colptr, vec![0, 1, 2]);
        assert_eq!(upper.rowval, vec![0, 0]);
        assert_eq!(upper.nzval, vec![1.0, 2.0]);

        let full = to_csc(&m, false);
        assert_eq!(full.nzval, vec![1.0, 2.0, 2.0]);
    }

    proptest::proptest! {
        #[test]
        fn prop_diagonal_simplex_matches_inverse_variance(
            diag in proptest::collection::vec(0.01f64..1.0, 2..8),
        ) {
            let n = diag.len();
            let problem = QuadraticProgram::new(DMatrix::from_diagonal(&DVector::from_vec(diag.clone())))
                .with_equality(budget(n), 1.0)
                .with_uniform_bounds(0.0, 1.0);

            let solution = solve_qp(&problem, &QpConfig::default()).unwrap();

            let total: f64 = diag.iter().map(|d| 1.0 / d).sum();
            for i in 0..n {
                proptest::prop_assert!((solution.x[i] - 1.0 / diag[i] / total).abs() < 1e-6);
            }
        }
    }
}
