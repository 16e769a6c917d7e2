//! Draft and camber from a smoothed stripe curve.

use crate::error::ShapeError;
use crate::fit::FittedCurve;
use serde::{Deserialize, Serialize};

/// Shape numbers for one stripe.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StripeMetrics {
    pub name: String,
    /// Position of maximum depth along the chord, in percent.
    pub draft_pct: f64,
    /// Maximum depth relative to the chord, in percent.
    pub camber_pct: f64,
    /// Chord angle in degrees.
    pub twist_deg: f64,
    pub chord_length_px: f64,
    /// Maximum depth in crop pixels.
    pub camber_depth_px: f64,
}

/// Depth is measured downwards from the chord, so the deepest point is the
/// largest `y`. Both percentages are normalized by the number of columns.
pub fn analyze_shape(
    name: &str,
    curve: &FittedCurve,
    twist_deg: f64,
    chord_length_px: f64,
) -> Result<StripeMetrics, ShapeError> {
    let Some(first) = curve.points.first() else {
        return Err(ShapeError::InvalidInput("empty curve"));
    };
    if curve.points.iter().any(|p| !p.y.is_finite()) {
        return Err(ShapeError::InvalidInput("non-finite curve value"));
    }

    let mut draft_idx = 0usize;
    let mut y_max = first.y;
    let mut y_min = first.y;
    for (i, p) in curve.points.iter().enumerate().skip(1) {
        if p.y > y_max {
            y_max = p.y;
            draft_idx = i;
        }
        y_min = y_min.min(p.y);
    }

    let n = curve.points.len() as f64;
    let depth = y_max - y_min;
    Ok(StripeMetrics {
        name: name.to_string(),
        draft_pct: draft_idx as f64 / n * 100.0,
        camber_pct: depth / n * 100.0,
        twist_deg,
        chord_length_px,
        camber_depth_px: depth,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::Point2;

    fn curve(ys: impl IntoIterator<Item = f64>) -> FittedCurve {
        FittedCurve {
            points: ys
                .into_iter()
                .enumerate()
                .map(|(i, y)| Point2::new(i as f64, y))
                .collect(),
            coefficients: Vec::new(),
            x_center: 0.0,
            x_half_range: 1.0,
        }
    }

    #[test]
    fn symmetric_bump_has_mid_draft() {
        let c = curve((0..101).map(|i| {
            let t = (i as f64 - 50.0) / 50.0;
            20.0 * (1.0 - t * t)
        }));
        let m = analyze_shape("Middle", &c, 1.5, 101.0).expect("metrics");
        assert_abs_diff_eq!(m.draft_pct, 50.0 / 101.0 * 100.0, epsilon = 1e-9);
        assert!((m.draft_pct - 50.0).abs() < 1.0);
        assert_abs_diff_eq!(m.camber_depth_px, 20.0, epsilon = 1e-9);
        assert_abs_diff_eq!(m.camber_pct, 20.0 / 101.0 * 100.0, epsilon = 1e-9);
        assert_eq!(m.twist_deg, 1.5);
    }

    #[test]
    fn draft_uses_fractional_depth() {
        // Both peaks share the integer depth 10; the later one is deeper.
        let m = analyze_shape("Bottom", &curve([0.0, 4.0, 8.0, 10.2, 9.0, 9.5, 10.7, 6.0, 2.0, 0.0]), 0.0, 10.0)
            .expect("metrics");
        assert_abs_diff_eq!(m.draft_pct, 60.0, epsilon = 1e-9);
        assert_abs_diff_eq!(m.camber_depth_px, 10.7, epsilon = 1e-9);
    }

    #[test]
    fn flat_curve_has_zero_camber_and_zero_draft() {
        let m = analyze_shape("Top", &curve([4.0; 30]), 0.0, 30.0).expect("metrics");
        assert_eq!(m.draft_pct, 0.0);
        assert_eq!(m.camber_pct, 0.0);
    }

    #[test]
    fn ranges_hold_for_arbitrary_curves() {
        let c = curve((0..64).map(|i| ((i * 37) % 11) as f64 - 3.0));
        let m = analyze_shape("Bottom", &c, 0.0, 64.0).expect("metrics");
        assert!((0.0..=100.0).contains(&m.draft_pct));
        assert!(m.camber_pct >= 0.0);
    }

    #[test]
    fn empty_or_nan_curves_are_invalid() {
        assert!(analyze_shape("x", &curve([]), 0.0, 0.0).is_err());
        assert!(analyze_shape("x", &curve([1.0, f64::NAN]), 0.0, 2.0).is_err());
    }
}
