//! Core image and geometry types for sail shape measurement.
//!
//! This crate is purely geometric. It does *not* depend on any concrete image
//! decoder or marker detector: images are plain row-major `u8` buffers and
//! points are `nalgebra` types.

mod affine;
mod camera;
mod homography;
mod image;
mod logger;
mod quad;

pub use affine::{warp_affine_gray, Affine2};
pub use camera::{CameraIntrinsics, CameraModel, RadialTangentialDistortion};
pub use homography::{homography_from_4pt, Homography};
pub use image::{sample_bilinear, sample_bilinear_u8, GrayImage, GrayImageView};
pub use quad::{is_convex, min_side, order_clockwise, quad_area, quad_centroid, signed_area};

#[cfg(feature = "tracing")]
pub use logger::{default_directives, init_tracing};

pub use logger::{init_with_level, init_with_verbosity, level_for_verbosity};
