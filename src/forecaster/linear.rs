//! Ordinary least squares on an intercept plus the selected regressors
//!
//! Used for both the autoregressive baseline and the signal-augmented
//! variant; the two differ only in their `feature_ids`. The solution is
//! closed form via the normal equations and a Cholesky factorization,
//! which doubles as the rank check: a training window with a collinear
//! or constant regressor fails to factorize and surfaces as
//! `EstimationError::SingularDesign`.

use ndarray::{s, Array1, Array2, ArrayView1};

use super::{EstimationError, EstimationResult, FittedModel, Forecaster};
use crate::domain_types::TableSlice;

/// OLS forecaster; stateless, refit from scratch on every window
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearForecaster;

/// A fitted linear model; coefficient 0 is the intercept
#[derive(Debug, Clone)]
pub struct OlsModel {
    coefficients: Array1<f64>,
}

impl Forecaster for LinearForecaster {
    type Fitted = OlsModel;

    fn fit(&self, train: &TableSlice<'_>, feature_ids: &[usize]) -> EstimationResult<OlsModel> {
        let n = train.len();
        let k = feature_ids.len() + 1;

        // need more observations than parameters
        if n <= k {
            return Err(EstimationError::DegenerateWindow {
                rows: n,
                required: k + 1,
            });
        }

        let full = train.feature_matrix(feature_ids);

        // an identically-zero regressor carries no information; its
        // coefficient is pinned to zero instead of failing the
        // factorization (matching pseudoinverse least squares)
        let active: Vec<usize> = (0..full.ncols())
            .filter(|&j| full.column(j).iter().any(|&v| v != 0.0))
            .collect();

        let mut x = Array2::ones((n, active.len() + 1));
        for (slot, &j) in active.iter().enumerate() {
            x.column_mut(slot + 1).assign(&full.column(j));
        }
        let y = train.targets();

        let xtx = x.t().dot(&x);
        let xty = x.t().dot(&y);

        let reduced = cholesky_solve(&xtx, &xty).ok_or(EstimationError::SingularDesign)?;

        // re-expand to one coefficient per requested regressor
        let mut coefficients = Array1::zeros(k);
        coefficients[0] = reduced[0];
        for (slot, &j) in active.iter().enumerate() {
            coefficients[j + 1] = reduced[slot + 1];
        }

        Ok(OlsModel { coefficients })
    }
}

impl FittedModel for OlsModel {
    fn predict(&self, features: ArrayView1<'_, f64>) -> f64 {
        debug_assert_eq!(features.len() + 1, self.coefficients.len());
        self.coefficients[0] + self.coefficients.slice(s![1..]).dot(&features)
    }
}

impl OlsModel {
    /// Estimated coefficients, intercept first
    pub fn coefficients(&self) -> ArrayView1<'_, f64> {
        self.coefficients.view()
    }
}

/// Solve `a * x = b` for a symmetric positive definite `a`.
///
/// Returns None when the factorization hits a non-positive pivot, i.e.
/// the matrix is singular or indefinite within tolerance.
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    debug_assert_eq!(a.ncols(), n);
    debug_assert_eq!(b.len(), n);

    // pivot tolerance relative to the matrix magnitude
    let scale = (0..n).map(|i| a[[i, i]].abs()).fold(1.0, f64::max);
    let tol = scale * 1e-12;

    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[[i, j]];
            for k in 0..j {
                sum -= l[[i, k]] * l[[j, k]];
            }
            if i == j {
                // `!(sum > tol)` also rejects NaN pivots
                if !(sum > tol) {
                    return None;
                }
                l[[i, i]] = sum.sqrt();
            } else {
                l[[i, j]] = sum / l[[j, j]];
            }
        }
    }

    // forward substitution: L z = b
    let mut z = Array1::zeros(n);
    for i in 0..n {
        let mut sum = b[i];
        for k in 0..i {
            sum -= l[[i, k]] * z[k];
        }
        z[i] = sum / l[[i, i]];
    }

    // backward substitution: L^T x = z
    let mut x = Array1::zeros(n);
    for i in (0..n).rev() {
        let mut sum = z[i];
        for k in i + 1..n {
            sum -= l[[k, i]] * x[k];
        }
        x[i] = sum / l[[i, i]];
    }

    Some(x)
}
