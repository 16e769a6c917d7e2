//! Marker decoding from an image-space quad.

use crate::threshold::otsu_threshold_from_samples;
use crate::Matcher;
use nalgebra::Point2;
use sail_shape_core::{homography_from_4pt, GrayImageView, Homography};
use serde::{Deserialize, Serialize};

/// Sampling and acceptance settings for one marker.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DecodeParams {
    /// Marker border width in cells.
    pub border_bits: usize,
    /// Fraction of the marker side ignored near its outline.
    pub inset_frac: f32,
    /// Required black ratio of the border cells.
    pub min_border_score: f32,
    /// Also try the white-on-black polarity.
    pub detect_inverted: bool,
}

impl Default for DecodeParams {
    fn default() -> Self {
        Self {
            border_bits: 1,
            inset_frac: 0.0,
            min_border_score: 0.85,
            detect_inverted: false,
        }
    }
}

/// A decoded quad.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Decoded {
    pub id: u32,
    pub rotation: u8,
    pub hamming: u8,
    pub border_score: f32,
}

#[derive(Clone, Copy, Debug)]
struct Observation {
    code: u64,
    border_score: f32,
}

/// Side of the canonical square the sample grid lives in.
const CANONICAL_SIDE: f32 = 100.0;
const THRESH_SUBDIV: usize = 3;

/// Precomputed sample points in canonical marker coordinates.
pub(crate) struct QuadDecoder<'a> {
    params: &'a DecodeParams,
    matcher: &'a Matcher,
    bits: usize,
    cells: usize,
    points: Vec<Point2<f32>>,
    threshold_points: Vec<Point2<f32>>,
    canonical: [Point2<f64>; 4],
}

impl<'a> QuadDecoder<'a> {
    pub(crate) fn new(params: &'a DecodeParams, matcher: &'a Matcher) -> Self {
        let bits = matcher.dictionary().marker_size;
        let cells = bits + 2 * params.border_bits;
        let inset = params.inset_frac.clamp(0.0, 0.3) * CANONICAL_SIDE;
        let side = CANONICAL_SIDE - 2.0 * inset;

        let grid = |n: usize| {
            let step = side / n as f32;
            let mut pts = Vec::with_capacity(n * n);
            for cy in 0..n {
                for cx in 0..n {
                    pts.push(Point2::new(
                        inset + (cx as f32 + 0.5) * step,
                        inset + (cy as f32 + 0.5) * step,
                    ));
                }
            }
            pts
        };

        let s = CANONICAL_SIDE as f64;
        Self {
            params,
            matcher,
            bits,
            cells,
            points: grid(cells),
            threshold_points: grid(cells * THRESH_SUBDIV),
            canonical: [
                Point2::new(0.0, 0.0),
                Point2::new(s, 0.0),
                Point2::new(s, s),
                Point2::new(0.0, s),
            ],
        }
    }

    /// Read and match the marker inside `quad` (corners clockwise on screen).
    pub(crate) fn decode(&self, img: &GrayImageView<'_>, quad: &[Point2<f32>; 4]) -> Option<Decoded> {
        let dst = quad.map(|p| Point2::new(p.x as f64, p.y as f64));
        let h = homography_from_4pt(&self.canonical, &dst)?;
        let obs = self.observe(img, &h)?;
        let m = self.matcher.match_code(obs.code)?;
        Some(Decoded {
            id: m.id,
            rotation: m.rotation,
            hamming: m.hamming,
            border_score: obs.border_score,
        })
    }

    fn observe(&self, img: &GrayImageView<'_>, h: &Homography) -> Option<Observation> {
        let samples = self
            .points
            .iter()
            .map(|p| {
                let q = h.apply_f32(*p);
                sample_mean_3x3(img, q.x, q.y)
            })
            .collect::<Option<Vec<u8>>>()?;
        let thr_samples: Vec<u8> = self
            .threshold_points
            .iter()
            .filter_map(|p| {
                let q = h.apply_f32(*p);
                sample_mean_3x3(img, q.x, q.y)
            })
            .collect();

        let thr = if thr_samples.is_empty() {
            otsu_threshold_from_samples(&samples)
        } else {
            otsu_threshold_from_samples(&thr_samples)
        };

        let polarities: &[bool] = if self.params.detect_inverted {
            &[false, true]
        } else {
            &[false]
        };
        let mut best: Option<Observation> = None;
        for &inverted in polarities {
            let obs = read_bits(&samples, thr, self.cells, self.bits, self.params.border_bits, inverted);
            if obs.border_score < self.params.min_border_score {
                continue;
            }
            if best.is_none_or(|b| obs.border_score > b.border_score) {
                best = Some(obs);
            }
        }
        best
    }
}

fn read_bits(
    samples: &[u8],
    thr: u8,
    cells: usize,
    bits: usize,
    border: usize,
    inverted: bool,
) -> Observation {
    let mut border_ok = 0u32;
    let mut border_total = 0u32;
    let mut code = 0u64;

    for cy in 0..cells {
        for cx in 0..cells {
            let is_black = (samples[cy * cells + cx] < thr) != inverted;
            let in_border = cx < border || cy < border || cx >= border + bits || cy >= border + bits;
            if in_border {
                border_total += 1;
                border_ok += is_black as u32;
            } else if is_black {
                code |= 1u64 << ((cy - border) * bits + (cx - border));
            }
        }
    }

    let border_score = if border_total == 0 {
        1.0
    } else {
        border_ok as f32 / border_total as f32
    };
    Observation { code, border_score }
}

fn sample_mean_3x3(img: &GrayImageView<'_>, x: f32, y: f32) -> Option<u8> {
    if !x.is_finite() || !y.is_finite() {
        return None;
    }
    let ix = x.round() as i64;
    let iy = y.round() as i64;
    if ix < 1 || iy < 1 || ix + 1 >= img.width as i64 || iy + 1 >= img.height as i64 {
        return None;
    }
    let mut sum = 0u32;
    for dy in -1..=1 {
        for dx in -1..=1 {
            sum += img.get((ix + dx) as usize, (iy + dy) as usize) as u32;
        }
    }
    Some((sum / 9) as u8)
}
