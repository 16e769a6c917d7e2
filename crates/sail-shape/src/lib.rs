//! Sail shape measurement from a single photograph.
//!
//! Each horizontal draft stripe on the sail is bounded by two fiducial tags.
//! This crate ties the workspace together:
//! - re-exports of the core, tag and stripe crates,
//! - (feature `image`) end-to-end helpers from an `image::GrayImage`,
//! - calibration records and single-marker pose estimation,
//! - JSON configuration and reports.
//!
//! ## Quickstart
//!
//! ```no_run
//! use sail_shape::io::MeasureConfig;
//! use sail_shape::measure::{load_gray, measure_sail_shape};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let img = load_gray("sail.jpg")?;
//! let result = measure_sail_shape(&img, &MeasureConfig::default())?;
//! for m in result.report.measured() {
//!     println!("{} draft {:.1} camber {:.1} twist {:.1}", m.name, m.draft_pct, m.camber_pct, m.twist_deg);
//! }
//! # Ok(())
//! # }
//! ```

pub use sail_shape_aruco as aruco;
pub use sail_shape_core as core;
pub use sail_shape_stripe as stripe;

pub use sail_shape_aruco::{Tag, TagDetections, TagDetector, TagDetectorParams};
pub use sail_shape_stripe::{StripeMetrics, StripeOutcome, StripeParams, StripeReport};

pub mod calibration;
pub mod io;
pub mod pose;

#[cfg(feature = "image")]
pub mod diagnostics;
#[cfg(feature = "image")]
pub mod measure;
