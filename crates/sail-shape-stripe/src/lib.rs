//! Sail stripe shape measurement.
//!
//! Each stripe is bounded by two tags. The pipeline levels the chord between
//! their centroids, crops the band below it, traces the dark stripe column by
//! column, smooths the trace with a weighted degree-5 polynomial and reads
//! draft, camber and twist off the smoothed curve.
//!
//! Stripes are independent: a failure in one is reported in its
//! [`StripeOutcome`] and never stops the others.

mod error;
pub mod fit;
pub mod locator;
mod pipeline;
mod raster;
pub mod rectify;
pub mod shape;
pub mod trace;

pub use error::{FitError, RectifyError, ShapeError, StripeError, TraceError};
pub use fit::{fit_curve, FitParams, FittedCurve, WeightPolicy};
pub use locator::{
    locate_stripes, DuplicatePolicy, Located, StripeBoundary, StripeLayout, StripeSpec,
};
pub use pipeline::{DiagnosticsSink, StripeMeasurer, StripeOutcome, StripeParams, StripeReport};
pub use rectify::{rectify_stripe, RectifiedStripe, RectifyParams};
pub use shape::{analyze_shape, StripeMetrics};
pub use trace::{binarize_inv, trace_binary, trace_edge, EdgeTrace, TraceParams};
