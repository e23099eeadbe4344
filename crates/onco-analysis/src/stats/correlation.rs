//! Pearson correlation, least-squares line and an approximate p-value.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AnalysisError, Result};

/// Slope and intercept of a fitted line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Regression {
    pub slope: f64,
    pub intercept: f64,
}

impl Regression {
    /// Evaluate the line at `x`.
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Centered sums of a paired sample.
struct Moments {
    n: usize,
    mean_x: f64,
    mean_y: f64,
    sxx: f64,
    syy: f64,
    sxy: f64,
}

impl Moments {
    fn of(xs: &[f64], ys: &[f64]) -> Result<Self> {
        if xs.len() != ys.len() {
            return Err(AnalysisError::DegenerateInput(format!(
                "paired samples differ in length ({} vs {})",
                xs.len(),
                ys.len()
            )));
        }
        let n = xs.len();
        if n < 2 {
            return Err(AnalysisError::DegenerateInput(format!(
                "correlation needs at least 2 points, got {n}"
            )));
        }

        let nf = n as f64;
        let mean_x = xs.iter().sum::<f64>() / nf;
        let mean_y = ys.iter().sum::<f64>() / nf;

        let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
        for (x, y) in xs.iter().zip(ys) {
            let dx = x - mean_x;
            let dy = y - mean_y;
            sxx += dx * dx;
            syy += dy * dy;
            sxy += dx * dy;
        }

        if !(sxx.is_finite() && syy.is_finite() && sxy.is_finite()) {
            return Err(AnalysisError::DegenerateInput(
                "non-finite sample values".to_string(),
            ));
        }
        if sxx == 0.0 || syy == 0.0 {
            return Err(AnalysisError::DegenerateInput(
                "zero variance in one of the series".to_string(),
            ));
        }

        Ok(Self {
            n,
            mean_x,
            mean_y,
            sxx,
            syy,
            sxy,
        })
    }

    fn r(&self) -> f64 {
        (self.sxy / (self.sxx * self.syy).sqrt()).clamp(-1.0, 1.0)
    }
}

/// Pearson product-moment correlation of paired samples.
///
/// Fails with `DegenerateInput` for fewer than 2 points or when either
/// series has zero variance. The result is always in `[-1, 1]`.
pub fn pearson_correlation(xs: &[f64], ys: &[f64]) -> Result<f64> {
    Moments::of(xs, ys).map(|m| m.r())
}

/// Regression line derived from `r` and the population standard deviations:
/// `slope = r * sd(y) / sd(x)`, `intercept = mean(y) - slope * mean(x)`.
///
/// Only defined for more than 2 non-degenerate points.
pub fn linear_regression(xs: &[f64], ys: &[f64], r: f64) -> Result<Regression> {
    let m = Moments::of(xs, ys)?;
    if m.n <= 2 {
        return Err(AnalysisError::DegenerateInput(format!(
            "regression needs more than 2 points, got {}",
            m.n
        )));
    }
    if !r.is_finite() {
        return Err(AnalysisError::DegenerateInput(
            "correlation coefficient is not finite".to_string(),
        ));
    }

    // sd(y)/sd(x) with the 1/n factors cancelled
    let slope = r * (m.syy / m.sxx).sqrt();
    let intercept = m.mean_y - slope * m.mean_x;
    Ok(Regression { slope, intercept })
}

/// Ordinary least-squares line `slope = Sxy / Sxx` through paired samples.
///
/// Unlike [`linear_regression`] this needs only 2 points and tolerates a
/// flat y series; it fails when x does not vary.
pub fn least_squares(xs: &[f64], ys: &[f64]) -> Result<Regression> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return Err(AnalysisError::DegenerateInput(format!(
            "line fit needs at least 2 paired points, got {} and {}",
            xs.len(),
            ys.len()
        )));
    }

    let nf = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / nf;
    let mean_y = ys.iter().sum::<f64>() / nf;
    let (sxx, sxy) = xs.iter().zip(ys).fold((0.0, 0.0), |(sxx, sxy), (x, y)| {
        let dx = x - mean_x;
        (sxx + dx * dx, sxy + dx * (y - mean_y))
    });

    if !(sxx.is_finite() && sxy.is_finite()) || sxx == 0.0 {
        return Err(AnalysisError::DegenerateInput(
            "x values do not vary".to_string(),
        ));
    }

    let slope = sxy / sxx;
    Ok(Regression {
        slope,
        intercept: mean_y - slope * mean_x,
    })
}

/// Heuristic CDF standing in for Student's t distribution:
/// `F(t, df) = 1 - 0.5 * (df / (df + t^2))^(df / 2)`.
///
/// This is not the true t CDF. It reproduces the p-values the analysis
/// frontend has always displayed, and is the one place to swap in an exact
/// distribution.
pub fn approximate_t_cdf(t: f64, df: f64) -> f64 {
    1.0 - 0.5 * (df / (df + t * t)).powf(df / 2.0)
}

/// Approximate two-sided p-value for a correlation coefficient.
///
/// `t = r * sqrt((n - 2) / (1 - r^2))`, `p = 2 * (1 - F(|t|, n - 2))` with
/// [`approximate_t_cdf`]. A perfect correlation (`|r| = 1`) returns 0.
pub fn approximate_p_value(r: f64, n: usize) -> Result<f64> {
    if n < 3 {
        return Err(AnalysisError::DegenerateInput(format!(
            "p-value needs at least 3 points, got {n}"
        )));
    }
    if !r.is_finite() {
        return Err(AnalysisError::DegenerateInput(
            "correlation coefficient is not finite".to_string(),
        ));
    }
    if r.abs() >= 1.0 {
        return Ok(0.0);
    }

    let df = (n - 2) as f64;
    let t = r * (df / (1.0 - r * r)).sqrt();
    let p = 2.0 * (1.0 - approximate_t_cdf(t.abs(), df));
    if !p.is_finite() {
        return Err(AnalysisError::DegenerateInput(format!(
            "p-value is not finite for r = {r}, n = {n}"
        )));
    }
    Ok(p.clamp(0.0, 1.0))
}

/// All derived numbers a correlation chart displays.
///
/// Undefined values are `None`; they are annotated as not applicable rather
/// than reported as errors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrelationSummary {
    pub n: usize,
    pub r: Option<f64>,
    pub p_value: Option<f64>,
    pub regression: Option<Regression>,
}

impl CorrelationSummary {
    pub fn compute(xs: &[f64], ys: &[f64]) -> Self {
        let n = xs.len().min(ys.len());

        let r = match pearson_correlation(xs, ys) {
            Ok(r) => Some(r),
            Err(e) => {
                debug!("Correlation omitted: {}", e);
                None
            }
        };

        let p_value = r.and_then(|r| match approximate_p_value(r, n) {
            Ok(p) => Some(p),
            Err(e) => {
                debug!("p-value omitted: {}", e);
                None
            }
        });

        let regression = r.and_then(|r| linear_regression(xs, ys, r).ok());

        Self {
            n,
            r,
            p_value,
            regression,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    // ------------------------------------------------------------------------
    // pearson_correlation
    // ------------------------------------------------------------------------

    #[test]
    fn test_perfect_positive_correlation() {
        let r = pearson_correlation(&[1.0, 2.0, 3.0, 4.0, 5.0], &[2.0, 4.0, 6.0, 8.0, 10.0])
            .unwrap();
        assert_eq!(r, 1.0);
    }

    #[test]
    fn test_perfect_negative_correlation() {
        let r = pearson_correlation(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).unwrap();
        assert!((r + 1.0).abs() < EPS);
    }

    #[test]
    fn test_correlation_in_unit_interval() {
        let samples: [(&[f64], &[f64]); 3] = [
            (&[1.0, 2.0, 3.0, 4.0], &[1.5, 1.0, 4.0, 3.2]),
            (&[0.1, 0.2, 0.15, 9.0, 3.3], &[100.0, -3.0, 8.0, 2.0, 2.5]),
            (&[1e6, 1e6 + 1.0, 1e6 + 2.0], &[5.0, 5.0 + 1e-9, 5.0 + 3e-9]),
        ];
        for (xs, ys) in samples {
            let r = pearson_correlation(xs, ys).unwrap();
            assert!((-1.0..=1.0).contains(&r), "r = {r} out of range");
        }
    }

    #[test]
    fn test_correlation_too_few_points() {
        let err = pearson_correlation(&[1.0], &[2.0]).unwrap_err();
        assert!(err.is_degenerate());
    }

    #[test]
    fn test_correlation_zero_variance() {
        let err = pearson_correlation(&[1.0, 2.0, 3.0], &[4.0, 4.0, 4.0]).unwrap_err();
        assert!(err.is_degenerate());
    }

    // ------------------------------------------------------------------------
    // linear_regression
    // ------------------------------------------------------------------------

    #[test]
    fn test_regression_exact_line() {
        let xs = [1.0, 2.0, 3.0, 4.0, 5.0];
        let ys = [2.0, 4.0, 6.0, 8.0, 10.0];
        let reg = linear_regression(&xs, &ys, 1.0).unwrap();
        assert_eq!(reg.slope, 2.0);
        assert_eq!(reg.intercept, 0.0);
        assert_eq!(reg.predict(3.0), 6.0);
    }

    #[test]
    fn test_regression_requires_more_than_two_points() {
        let err = linear_regression(&[1.0, 2.0], &[3.0, 5.0], 1.0).unwrap_err();
        assert!(err.is_degenerate());
    }

    // ------------------------------------------------------------------------
    // approximate_p_value
    // ------------------------------------------------------------------------

    #[test]
    fn test_p_value_perfect_correlation_is_zero() {
        assert_eq!(approximate_p_value(1.0, 5).unwrap(), 0.0);
        assert_eq!(approximate_p_value(-1.0, 5).unwrap(), 0.0);
    }

    #[test]
    fn test_p_value_zero_correlation_is_one() {
        assert!((approximate_p_value(0.0, 10).unwrap() - 1.0).abs() < EPS);
    }

    #[test]
    fn test_p_value_matches_formula() {
        // n = 6, df = 4, r = 0.5 -> t^2 = 0.25 * 4 / 0.75 = 4/3
        // p = (4 / (4 + 4/3))^2 = 0.5625
        let p = approximate_p_value(0.5, 6).unwrap();
        assert!((p - 0.5625).abs() < EPS);
    }

    #[test]
    fn test_p_value_decreases_with_stronger_correlation() {
        let weak = approximate_p_value(0.2, 20).unwrap();
        let strong = approximate_p_value(0.8, 20).unwrap();
        assert!(strong < weak);
    }

    #[test]
    fn test_p_value_too_few_points() {
        assert!(approximate_p_value(0.5, 2).unwrap_err().is_degenerate());
    }

    // ------------------------------------------------------------------------
    // CorrelationSummary
    // ------------------------------------------------------------------------

    #[test]
    fn test_summary_perfect_line() {
        let s = CorrelationSummary::compute(
            &[1.0, 2.0, 3.0, 4.0, 5.0],
            &[2.0, 4.0, 6.0, 8.0, 10.0],
        );
        assert_eq!(s.n, 5);
        assert_eq!(s.r, Some(1.0));
        assert_eq!(s.p_value, Some(0.0));
        assert_eq!(
            s.regression,
            Some(Regression {
                slope: 2.0,
                intercept: 0.0
            })
        );
    }

    #[test]
    fn test_summary_degenerate_omits_everything_derived() {
        let s = CorrelationSummary::compute(&[1.0, 1.0, 1.0], &[2.0, 3.0, 4.0]);
        assert_eq!(s.n, 3);
        assert_eq!(s.r, None);
        assert_eq!(s.p_value, None);
        assert_eq!(s.regression, None);
    }

    // ------------------------------------------------------------------------
    // least_squares
    // ------------------------------------------------------------------------

    #[test]
    fn test_least_squares_exact_line() {
        let fit = least_squares(&[0.0, 1.0, 2.0, 3.0], &[1.0, 3.0, 5.0, 7.0]).unwrap();
        assert!((fit.slope - 2.0).abs() < EPS);
        assert!((fit.intercept - 1.0).abs() < EPS);
    }

    #[test]
    fn test_least_squares_two_points_and_flat_y() {
        let fit = least_squares(&[1.0, 3.0], &[2.0, 6.0]).unwrap();
        assert!((fit.slope - 2.0).abs() < EPS);
        assert!(fit.intercept.abs() < EPS);

        let flat = least_squares(&[1.0, 2.0, 3.0], &[4.0, 4.0, 4.0]).unwrap();
        assert_eq!(flat.slope, 0.0);
        assert_eq!(flat.intercept, 4.0);
    }

    #[test]
    fn test_least_squares_degenerate() {
        assert!(least_squares(&[1.0], &[1.0]).unwrap_err().is_degenerate());
        assert!(least_squares(&[2.0, 2.0], &[1.0, 5.0]).unwrap_err().is_degenerate());
        assert!(least_squares(&[1.0, 2.0], &[1.0]).is_err());
    }

    #[test]
    fn test_summary_two_points_has_r_only() {
        let s = CorrelationSummary::compute(&[1.0, 2.0], &[1.0, 3.0]);
        assert_eq!(s.r, Some(1.0));
        assert_eq!(s.p_value, None);
        assert_eq!(s.regression, None);
    }
}
