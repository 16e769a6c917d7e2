//! Error types for the stripe pipeline.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RectifyError {
    #[error("tag chord is {chord_px:.2} px, below the {min_px} px minimum")]
    ChordTooShort { chord_px: f64, min_px: f64 },
    #[error("crop window is empty after clipping ({width}x{height})")]
    EmptyCrop { width: usize, height: usize },
    #[error("rotation could not be applied to the image")]
    WarpFailed,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TraceError {
    #[error("cannot trace an empty image")]
    EmptyImage,
    #[error("trace window must be at least one column")]
    ZeroWindow,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FitError {
    #[error("need at least {needed} usable points for the fit, got {got}")]
    TooFewPoints { needed: usize, got: usize },
    #[error("column {index} has unusable spread {spread}")]
    InvalidWeight { index: usize, spread: f64 },
    #[error("points ({points}) and spreads ({spreads}) differ in length")]
    LengthMismatch { points: usize, spreads: usize },
    #[error("least-squares system is singular")]
    Singular,
    #[error("fit produced non-finite values")]
    NonFinite,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ShapeError {
    #[error("invalid curve for shape analysis: {0}")]
    InvalidInput(&'static str),
}

/// Any failure of a single located stripe.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StripeError {
    #[error("rectify: {0}")]
    Rectify(#[from] RectifyError),
    #[error("trace: {0}")]
    Trace(#[from] TraceError),
    #[error("fit: {0}")]
    Fit(#[from] FitError),
    #[error("shape: {0}")]
    Shape(#[from] ShapeError),
}
