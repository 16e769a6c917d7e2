//! Weighted polynomial smoothing of an edge trace.

use crate::error::FitError;
use crate::trace::EdgeTrace;
use nalgebra::{DMatrix, DVector, Point2};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// What to do with columns whose spread cannot be turned into a weight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightPolicy {
    /// Fail the fit on the first zero or non-finite spread.
    #[default]
    Reject,
    /// Leave such columns out of the regression; the curve is still
    /// evaluated at every column.
    SkipDegenerate,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FitParams {
    pub degree: usize,
    pub weight_policy: WeightPolicy,
}

impl Default for FitParams {
    fn default() -> Self {
        Self {
            degree: 5,
            weight_policy: WeightPolicy::Reject,
        }
    }
}

/// Smoothed curve sampled at the trace's x positions.
#[derive(Clone, Debug, PartialEq)]
pub struct FittedCurve {
    pub points: Vec<Point2<f64>>,
    /// Ascending-power coefficients in the normalized variable
    /// `t = (x - x_center) / x_half_range`.
    pub coefficients: Vec<f64>,
    pub x_center: f64,
    pub x_half_range: f64,
}

impl FittedCurve {
    /// Evaluate the polynomial at an arbitrary `x`.
    pub fn eval(&self, x: f64) -> f64 {
        horner(&self.coefficients, (x - self.x_center) / self.x_half_range)
    }
}

fn horner(coefficients: &[f64], t: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * t + c)
}

/// Fit `y = f(x)` with row weights `1 / spread` and evaluate it at every x.
#[cfg_attr(feature = "tracing", instrument(level = "debug", skip_all, fields(n = trace.len())))]
pub fn fit_curve(trace: &EdgeTrace, params: &FitParams) -> Result<FittedCurve, FitError> {
    if trace.points.len() != trace.spreads.len() {
        return Err(FitError::LengthMismatch {
            points: trace.points.len(),
            spreads: trace.spreads.len(),
        });
    }
    if trace
        .points
        .iter()
        .any(|p| !p.x.is_finite() || !p.y.is_finite())
    {
        return Err(FitError::NonFinite);
    }

    let needed = params.degree + 1;
    let mut rows: Vec<(f64, f64, f64)> = Vec::with_capacity(trace.len());
    for (index, (p, &spread)) in trace.points.iter().zip(&trace.spreads).enumerate() {
        let usable = spread.is_finite() && spread > 0.0;
        if usable {
            rows.push((p.x, p.y, 1.0 / spread));
        } else if params.weight_policy == WeightPolicy::Reject {
            return Err(FitError::InvalidWeight { index, spread });
        }
    }
    if rows.len() < needed {
        return Err(FitError::TooFewPoints {
            needed,
            got: rows.len(),
        });
    }

    let (x_min, x_max) = trace
        .points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.x), hi.max(p.x))
        });
    let x_center = 0.5 * (x_min + x_max);
    let x_half_range = if x_max > x_min {
        0.5 * (x_max - x_min)
    } else {
        1.0
    };

    let a = DMatrix::from_fn(rows.len(), needed, |i, j| {
        let (x, _, w) = rows[i];
        w * ((x - x_center) / x_half_range).powi(j as i32)
    });
    let b = DVector::from_iterator(rows.len(), rows.iter().map(|&(_, y, w)| w * y));

    let svd = a.svd(true, true);
    let tol = 1e-12 * svd.singular_values.max();
    if svd.rank(tol) < needed {
        return Err(FitError::Singular);
    }
    let coefficients = svd.solve(&b, tol).map_err(|_| FitError::Singular)?;
    if coefficients.iter().any(|c| !c.is_finite()) {
        return Err(FitError::NonFinite);
    }

    let coefficients: Vec<f64> = coefficients.iter().copied().collect();
    let points = trace
        .points
        .iter()
        .map(|p| Point2::new(p.x, horner(&coefficients, (p.x - x_center) / x_half_range)))
        .collect();

    Ok(FittedCurve {
        points,
        coefficients,
        x_center,
        x_half_range,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn trace_of(n: usize, f: impl Fn(f64) -> f64, spread: impl Fn(usize) -> f64) -> EdgeTrace {
        EdgeTrace {
            points: (0..n).map(|i| Point2::new(i as f64, f(i as f64))).collect(),
            spreads: (0..n).map(spread).collect(),
        }
    }

    #[test]
    fn exact_quintic_is_reproduced() {
        let f = |x: f64| 3.0 + 0.5 * x - 0.02 * x * x + 1e-4 * x.powi(3) - 2e-7 * x.powi(5);
        let trace = trace_of(120, f, |i| 1.0 + (i % 7) as f64);
        let curve = fit_curve(&trace, &FitParams::default()).expect("fit");
        assert_eq!(curve.points.len(), 120);
        for p in &curve.points {
            assert_abs_diff_eq!(p.y, f(p.x), epsilon = 1e-6);
        }
        assert_abs_diff_eq!(curve.eval(60.5), f(60.5), epsilon = 1e-6);
    }

    #[test]
    fn lower_degree_polynomials_fit_exactly_too() {
        let f = |x: f64| 10.0 - 0.01 * (x - 40.0).powi(2);
        let trace = trace_of(80, f, |_| 3.0);
        let curve = fit_curve(&trace, &FitParams::default()).expect("fit");
        for p in &curve.points {
            assert_abs_diff_eq!(p.y, f(p.x), epsilon = 1e-8);
        }
    }

    #[test]
    fn weights_pull_towards_confident_columns() {
        // Outlier column with a huge spread barely moves a constant fit.
        let mut trace = trace_of(40, |_| 5.0, |_| 1.0);
        trace.points[20].y = 50.0;
        trace.spreads[20] = 1e6;
        let params = FitParams {
            degree: 0,
            ..FitParams::default()
        };
        let curve = fit_curve(&trace, &params).expect("fit");
        assert_abs_diff_eq!(curve.points[20].y, 5.0, epsilon = 1e-3);
    }

    #[test]
    fn zero_spread_is_rejected_by_default() {
        let trace = trace_of(20, |x| x, |i| if i == 7 { 0.0 } else { 1.0 });
        assert_eq!(
            fit_curve(&trace, &FitParams::default()),
            Err(FitError::InvalidWeight {
                index: 7,
                spread: 0.0
            })
        );
    }

    #[test]
    fn skip_policy_drops_degenerate_columns() {
        let trace = trace_of(20, |x| 2.0 * x + 1.0, |i| if i % 2 == 0 { 0.0 } else { 1.0 });
        let params = FitParams {
            weight_policy: WeightPolicy::SkipDegenerate,
            ..FitParams::default()
        };
        let curve = fit_curve(&trace, &params).expect("fit");
        assert_eq!(curve.points.len(), 20);
        assert_abs_diff_eq!(curve.points[0].y, 1.0, epsilon = 1e-8);
        assert_abs_diff_eq!(curve.points[19].y, 39.0, epsilon = 1e-8);
    }

    #[test]
    fn too_few_points_and_mismatch() {
        let trace = trace_of(4, |x| x, |_| 1.0);
        assert_eq!(
            fit_curve(&trace, &FitParams::default()),
            Err(FitError::TooFewPoints { needed: 6, got: 4 })
        );

        let mut broken = trace_of(10, |x| x, |_| 1.0);
        broken.spreads.pop();
        assert!(matches!(
            fit_curve(&broken, &FitParams::default()),
            Err(FitError::LengthMismatch { points: 10, spreads: 9 })
        ));
    }

    #[test]
    fn repeated_x_is_singular() {
        let trace = EdgeTrace {
            points: (0..10).map(|i| Point2::new(3.0, i as f64)).collect(),
            spreads: vec![1.0; 10],
        };
        assert_eq!(
            fit_curve(&trace, &FitParams::default()),
            Err(FitError::Singular)
        );
    }
}
