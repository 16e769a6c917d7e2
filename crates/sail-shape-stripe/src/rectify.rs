//! Rotating a stripe chord onto the horizontal and cropping the region below it.

use crate::error::RectifyError;
use crate::locator::StripeBoundary;
use crate::raster::{fill_polygon, from_buffer, to_buffer};
use log::debug;
use nalgebra::Point2;
use sail_shape_core::{quad_centroid, warp_affine_gray, Affine2, GrayImage, GrayImageView};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RectifyParams {
    /// Crop depth below the chord as a fraction of the chord length.
    pub depth_ratio: f64,
    /// Chords shorter than this are rejected.
    pub min_chord_px: f64,
}

impl Default for RectifyParams {
    fn default() -> Self {
        Self {
            depth_ratio: 0.2,
            min_chord_px: 2.0,
        }
    }
}

/// Crop of the levelled stripe region plus the chord geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct RectifiedStripe {
    pub crop: GrayImage,
    /// Chord angle in degrees, positive when the end tag sits lower on screen.
    pub twist_deg: f64,
    pub chord_length_px: f64,
    pub start_centroid: Point2<f64>,
    /// End centroid after the rotation.
    pub end_centroid: Point2<f64>,
    /// Top-left of the crop in the rotated frame.
    pub crop_origin: (usize, usize),
}

/// Level the chord between the two tags and crop the band below it.
///
/// Both tag polygons are painted white first so their dark borders do not
/// leak into the trace.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip_all, fields(stripe = %boundary.name))
)]
pub fn rectify_stripe(
    image: &GrayImageView<'_>,
    boundary: &StripeBoundary,
    params: &RectifyParams,
) -> Result<RectifiedStripe, RectifyError> {
    let start = quad_centroid(&boundary.start_corners);
    let end = quad_centroid(&boundary.end_corners);
    let twist_deg = (end.y - start.y).atan2(end.x - start.x).to_degrees();
    let rotation = Affine2::rotation_about(start, twist_deg, 1.0);

    let mut masked = to_buffer(image);
    fill_polygon(&mut masked, &boundary.start_corners, 255);
    fill_polygon(&mut masked, &boundary.end_corners, 255);
    let masked = from_buffer(masked);

    let rotated = warp_affine_gray(&masked.view(), &rotation, image.width, image.height)
        .ok_or(RectifyError::WarpFailed)?;

    let rot_end_corners = boundary
        .end_corners
        .map(|c| rotation.apply(Point2::new(c.x as f64, c.y as f64)));
    let end_centroid = mean(&rot_end_corners);
    let chord_length_px = (end_centroid - start).norm();
    if !(chord_length_px >= params.min_chord_px) {
        return Err(RectifyError::ChordTooShort {
            chord_px: chord_length_px,
            min_px: params.min_chord_px,
        });
    }

    let depth = (params.depth_ratio * chord_length_px).max(0.0) as usize;
    let x0 = clamp_coord(start.x, rotated.width);
    let x1 = clamp_coord(end_centroid.x, rotated.width);
    let y0 = clamp_coord(start.y, rotated.height);
    let width = x1.saturating_sub(x0);
    let height = depth.min(rotated.height - y0);
    if width == 0 || height == 0 {
        return Err(RectifyError::EmptyCrop { width, height });
    }

    let crop = rotated.view().crop(x0, y0, width, height);
    debug!(
        "stripe {}: twist {:.2} deg, chord {:.1} px, crop {}x{} at ({}, {})",
        boundary.name, twist_deg, chord_length_px, crop.width, crop.height, x0, y0
    );

    Ok(RectifiedStripe {
        crop,
        twist_deg,
        chord_length_px,
        start_centroid: start,
        end_centroid,
        crop_origin: (x0, y0),
    })
}

fn mean(points: &[Point2<f64>; 4]) -> Point2<f64> {
    let sum = points.iter().fold(nalgebra::Vector2::zeros(), |acc, p| acc + p.coords);
    Point2::from(sum / 4.0)
}

fn clamp_coord(v: f64, limit: usize) -> usize {
    if v.is_nan() || v <= 0.0 {
        0
    } else {
        (v.round() as usize).min(limit)
    }
}
