//! Statistics engine: pure numeric functions behind the charts.
//!
//! - [`correlation`] - Pearson r, regression line and the approximate p-value.
//! - [`survival`] - Kaplan-Meier step-curve semantics.
//!
//! Functions that can be undefined for their input return
//! [`AnalysisError::DegenerateInput`](crate::error::AnalysisError::DegenerateInput)
//! instead of a non-finite number.

pub mod correlation;
pub mod survival;

pub use correlation::{
    CorrelationSummary, Regression, approximate_p_value, approximate_t_cdf, least_squares,
    linear_regression, pearson_correlation,
};
pub use survival::{StepCurve, sort_by_time, step_after_vertices};

use serde::{Deserialize, Serialize};

/// Significance threshold on p-values.
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

/// Fold-change threshold for calling a gene regulated (linear scale).
pub const FOLD_CHANGE_THRESHOLD: f64 = 1.5;

/// Direction of differential expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regulation {
    Up,
    Down,
    NotSignificant,
}

impl Regulation {
    /// Classify a gene from its log2 fold change and p-value.
    pub fn classify(log2_fold_change: f64, p_value: f64) -> Self {
        let threshold = FOLD_CHANGE_THRESHOLD.log2();
        if p_value < SIGNIFICANCE_LEVEL && log2_fold_change > threshold {
            Self::Up
        } else if p_value < SIGNIFICANCE_LEVEL && log2_fold_change < -threshold {
            Self::Down
        } else {
            Self::NotSignificant
        }
    }
}

/// `-log10(p)`, the volcano y coordinate.
pub fn neg_log10(p_value: f64) -> f64 {
    -p_value.log10()
}
