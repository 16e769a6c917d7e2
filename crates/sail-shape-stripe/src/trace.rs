//! Column-wise tracing of the dark stripe edge in a rectified crop.

use crate::error::TraceError;
use nalgebra::Point2;
use sail_shape_core::{GrayImage, GrayImageView};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TraceParams {
    /// Pixels above this value are background.
    pub threshold: u8,
    /// Foreground value after binarization.
    pub max_value: u8,
    /// Columns summed per histogram, narrowing at the right edge.
    pub window: usize,
}

impl Default for TraceParams {
    fn default() -> Self {
        Self {
            threshold: 127,
            max_value: 255,
            window: 10,
        }
    }
}

/// One `(x, y)` sample per crop column and the histogram spread behind it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EdgeTrace {
    pub points: Vec<Point2<f64>>,
    pub spreads: Vec<f64>,
}

impl EdgeTrace {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Inverted global threshold: `v > threshold` becomes 0, everything else `max_value`.
pub fn binarize_inv(crop: &GrayImageView<'_>, params: &TraceParams) -> GrayImage {
    GrayImage {
        width: crop.width,
        height: crop.height,
        data: crop
            .data
            .iter()
            .map(|&v| if v > params.threshold { 0 } else { params.max_value })
            .collect(),
    }
}

/// Trace the stripe in `crop`.
///
/// For each column `x`, foreground is summed per row over columns
/// `x..min(x + window, width)`; the row with the largest sum (first on ties)
/// is the edge position and the population standard deviation of the row sums
/// is its spread.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip_all, fields(w = crop.width, h = crop.height))
)]
pub fn trace_edge(crop: &GrayImageView<'_>, params: &TraceParams) -> Result<EdgeTrace, TraceError> {
    let binary = binarize_inv(crop, params);
    trace_binary(&binary.view(), params.window)
}

/// Same as [`trace_edge`] on an already binarized image.
pub fn trace_binary(binary: &GrayImageView<'_>, window: usize) -> Result<EdgeTrace, TraceError> {
    let (w, h) = (binary.width, binary.height);
    if w == 0 || h == 0 {
        return Err(TraceError::EmptyImage);
    }
    if window == 0 {
        return Err(TraceError::ZeroWindow);
    }

    // Row prefix sums turn each window sum into one subtraction.
    let mut prefix = vec![0u64; h * (w + 1)];
    for y in 0..h {
        let row = &mut prefix[y * (w + 1)..(y + 1) * (w + 1)];
        for x in 0..w {
            row[x + 1] = row[x] + binary.get(x, y) as u64;
        }
    }

    let mut trace = EdgeTrace {
        points: Vec::with_capacity(w),
        spreads: Vec::with_capacity(w),
    };
    let mut hist = vec![0f64; h];
    for x in 0..w {
        let x_end = (x + window).min(w);
        for (y, bin) in hist.iter_mut().enumerate() {
            let row = y * (w + 1);
            *bin = (prefix[row + x_end] - prefix[row + x]) as f64;
        }

        let mut best = 0usize;
        for (y, &v) in hist.iter().enumerate().skip(1) {
            if v > hist[best] {
                best = y;
            }
        }

        trace.points.push(Point2::new(x as f64, best as f64));
        trace.spreads.push(population_std(&hist));
    }

    Ok(trace)
}

fn population_std(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    var.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn step_edge_is_found_in_every_column() {
        // White above row 12, dark from row 12 down.
        let crop = GrayImage::from_fn(30, 20, |_, y| if y < 12 { 240 } else { 20 });
        let trace = trace_edge(&crop.view(), &TraceParams::default()).expect("trace");
        assert_eq!(trace.len(), 30);
        for (x, p) in trace.points.iter().enumerate() {
            assert_eq!(p.x, x as f64);
            assert_eq!(p.y, 12.0, "column {x}");
        }
        assert!(trace.spreads.iter().all(|s| s.is_finite() && *s > 0.0));
    }

    #[test]
    fn dark_line_position_and_spread() {
        let crop = GrayImage::from_fn(12, 4, |_, y| if y == 2 { 0 } else { 255 });
        let trace = trace_edge(&crop.view(), &TraceParams::default()).expect("trace");
        assert_eq!(trace.points[0].y, 2.0);
        // Window of 10 columns: histogram [0, 0, 2550, 0].
        assert_abs_diff_eq!(trace.spreads[0], 2550.0 * 3f64.sqrt() / 4.0, epsilon = 1e-9);
        // Window narrows to the two last columns.
        assert_abs_diff_eq!(trace.spreads[10], 510.0 * 3f64.sqrt() / 4.0, epsilon = 1e-9);
    }

    #[test]
    fn blank_column_has_zero_spread() {
        let crop = GrayImage::filled(5, 6, 255);
        let trace = trace_edge(&crop.view(), &TraceParams::default()).expect("trace");
        assert!(trace.points.iter().all(|p| p.y == 0.0));
        assert!(trace.spreads.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn empty_crop_is_rejected() {
        let crop = GrayImage::filled(0, 8, 0);
        assert_eq!(
            trace_edge(&crop.view(), &TraceParams::default()),
            Err(TraceError::EmptyImage)
        );
    }
}
