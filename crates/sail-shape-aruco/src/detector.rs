//! Full-frame tag detection: binarize, extract quads, decode.

use crate::decode::{DecodeParams, QuadDecoder};
use crate::quads::{find_quad_candidates, QuadFilter};
use crate::threshold::adaptive_threshold_inv;
use crate::{builtins, Dictionary, DictionaryError, Matcher};
use log::debug;
use nalgebra::Point2;
use sail_shape_core::{quad_area, quad_centroid, GrayImageView};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// One decoded fiducial tag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: u32,
    /// Clockwise on screen, starting at the tag's own top-left corner.
    pub corners: [Point2<f32>; 4],
    pub rotation: u8,
    pub hamming: u8,
    pub border_score: f32,
    /// Polygon area in square pixels.
    pub area: f32,
}

impl Tag {
    /// Mean of the four corners.
    pub fn centroid(&self) -> Point2<f64> {
        quad_centroid(&self.corners)
    }
}

/// Result of [`TagDetector::detect`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TagDetections {
    /// Decoded tags in contour scan order.
    pub tags: Vec<Tag>,
    /// Quads that passed the geometry gates but did not decode.
    pub rejected: Vec<[Point2<f32>; 4]>,
}

impl TagDetections {
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// All tags carrying `id`, in detection order.
    pub fn with_id(&self, id: u32) -> impl Iterator<Item = &Tag> {
        self.tags.iter().filter(move |t| t.id == id)
    }
}

/// Detector configuration. The dictionary travels with the parameters.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TagDetectorParams {
    pub dictionary: Dictionary,
    /// Maximum corrected bits; `None` uses the dictionary's correction capacity.
    pub max_hamming: Option<u8>,
    pub adaptive_block_radius: u32,
    pub adaptive_offset: i32,
    /// Contour length bounds relative to `max(width, height)`.
    pub min_perimeter_rate: f64,
    pub max_perimeter_rate: f64,
    /// Douglas–Peucker epsilon relative to the contour length.
    pub polygon_accuracy_rate: f64,
    pub min_side_px: f32,
    pub min_corner_distance_rate: f64,
    pub decode: DecodeParams,
}

impl Default for TagDetectorParams {
    fn default() -> Self {
        Self {
            dictionary: builtins::DICT_4X4_50,
            max_hamming: None,
            adaptive_block_radius: 11,
            adaptive_offset: 7,
            min_perimeter_rate: 0.03,
            max_perimeter_rate: 4.0,
            polygon_accuracy_rate: 0.03,
            min_side_px: 8.0,
            min_corner_distance_rate: 0.05,
            decode: DecodeParams::default(),
        }
    }
}

/// Reusable detector built from [`TagDetectorParams`].
#[derive(Clone, Debug)]
pub struct TagDetector {
    params: TagDetectorParams,
    matcher: Matcher,
}

impl TagDetector {
    pub fn new(params: TagDetectorParams) -> Result<Self, DictionaryError> {
        let max_hamming = params
            .max_hamming
            .unwrap_or(params.dictionary.max_correction_bits);
        let matcher = Matcher::new(params.dictionary.clone(), max_hamming)?;
        Ok(Self { params, matcher })
    }

    pub fn params(&self) -> &TagDetectorParams {
        &self.params
    }

    /// Detect every tag in `image`. An empty frame yields no tags.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip_all, fields(width = image.width, height = image.height))
    )]
    pub fn detect(&self, image: &GrayImageView<'_>) -> TagDetections {
        let mut out = TagDetections::default();
        if image.width == 0 || image.height == 0 {
            return out;
        }

        let p = &self.params;
        let binary = adaptive_threshold_inv(image, p.adaptive_block_radius, p.adaptive_offset);
        let max_dim = image.width.max(image.height) as f64;
        let filter = QuadFilter {
            min_perimeter: p.min_perimeter_rate * max_dim,
            max_perimeter: p.max_perimeter_rate * max_dim,
            polygon_accuracy_rate: p.polygon_accuracy_rate,
            min_side_px: p.min_side_px,
            min_corner_distance_rate: p.min_corner_distance_rate,
        };
        let candidates = find_quad_candidates(&binary, &filter);
        debug!("{} quad candidates", candidates.len());

        let decoder = QuadDecoder::new(&p.decode, &self.matcher);
        for quad in candidates {
            match decoder.decode(image, &quad) {
                Some(d) => {
                    let r = d.rotation as usize;
                    let corners = [0, 1, 2, 3].map(|i| quad[(i + r) % 4]);
                    out.tags.push(Tag {
                        id: d.id,
                        corners,
                        rotation: d.rotation,
                        hamming: d.hamming,
                        border_score: d.border_score,
                        area: quad_area(&quad) as f32,
                    });
                }
                None => out.rejected.push(quad),
            }
        }

        debug!(
            "decoded {} tags, rejected {} quads",
            out.tags.len(),
            out.rejected.len()
        );
        out
    }
}
