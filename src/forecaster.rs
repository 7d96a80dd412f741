//! Forecasting models for the walk-forward evaluation
//!
//! Every model obeys the same contract: `fit` is a pure function of the
//! training window and returns a fitted model whose `predict` maps one
//! feature row to a scalar one-step-ahead forecast. A failed fit is a
//! recoverable per-step condition, never a fatal error.

use ndarray::ArrayView1;
use thiserror::Error;

use crate::domain_types::TableSlice;

pub mod forest;
pub mod linear;

// 重新導出主要類型和結構
pub use forest::{ForestForecaster, ForestModel};
pub use linear::{LinearForecaster, OlsModel};

/// Errors that can occur while estimating a model on one training window
#[derive(Debug, Error)]
pub enum EstimationError {
    #[error("degenerate training window: {rows} rows, need at least {required}")]
    DegenerateWindow { rows: usize, required: usize },

    #[error("singular design matrix")]
    SingularDesign,
}

/// Estimation result type alias
pub type EstimationResult<T> = Result<T, EstimationError>;

/// A forecasting model that can be fit on a training window.
///
/// `feature_ids` selects the regressor columns out of the underlying
/// table; the fitted model expects prediction rows with the same columns
/// in the same order.
pub trait Forecaster {
    type Fitted: FittedModel;

    fn fit(&self, train: &TableSlice<'_>, feature_ids: &[usize]) -> EstimationResult<Self::Fitted>;
}

/// A fitted model producing point forecasts for single rows
pub trait FittedModel {
    fn predict(&self, features: ArrayView1<'_, f64>) -> f64;
}
