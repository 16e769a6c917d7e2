//! Fiducial tag detection for sail stripe markers.
//!
//! This crate covers:
//! - an embedded 4×4 dictionary and JSON loading of custom tables,
//! - matching observed codes under all four rotations,
//! - full-frame detection: adaptive binarization, contour quads, decoding.
//!
//! ```no_run
//! use sail_shape_aruco::{TagDetector, TagDetectorParams};
//! use sail_shape_core::GrayImage;
//!
//! let frame = GrayImage::filled(640, 480, 255);
//! let detector = TagDetector::new(TagDetectorParams::default()).unwrap();
//! for tag in detector.detect(&frame.view()).tags {
//!     println!("tag {} at {:?}", tag.id, tag.centroid());
//! }
//! ```

pub mod builtins;
mod decode;
mod detector;
mod dictionary;
mod matcher;
mod quads;
mod threshold;

pub use decode::DecodeParams;
pub use detector::{Tag, TagDetections, TagDetector, TagDetectorParams};
pub use dictionary::{Dictionary, DictionaryError};
pub use matcher::{rotate_code_u64, Match, Matcher};
