//! End-to-end helpers over `image::GrayImage`.

use crate::io::MeasureConfig;
use sail_shape_aruco::{DictionaryError, Tag, TagDetector};
use sail_shape_core::GrayImageView;
use sail_shape_stripe::{DiagnosticsSink, StripeMeasurer, StripeReport};
use std::path::Path;

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(thiserror::Error, Debug)]
pub enum MeasureError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Dictionary(#[from] DictionaryError),
}

/// Tags found in the frame and the per-stripe outcomes.
#[derive(Clone, Debug, PartialEq)]
pub struct MeasureResult {
    pub tags: Vec<Tag>,
    pub report: StripeReport,
}

/// Borrow an `image::GrayImage` as a core view.
pub fn gray_view(img: &image::GrayImage) -> GrayImageView<'_> {
    GrayImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

/// Decode any supported image file to 8-bit grayscale.
pub fn load_gray(path: impl AsRef<Path>) -> Result<image::GrayImage, MeasureError> {
    Ok(image::ImageReader::open(path.as_ref())?
        .with_guessed_format()?
        .decode()?
        .to_luma8())
}

/// Detect tags and measure every stripe in the configured layout.
pub fn measure_sail_shape(
    img: &image::GrayImage,
    cfg: &MeasureConfig,
) -> Result<MeasureResult, MeasureError> {
    run(img, cfg, None)
}

/// Like [`measure_sail_shape`], handing intermediate images to `sink`.
pub fn measure_sail_shape_with_diagnostics(
    img: &image::GrayImage,
    cfg: &MeasureConfig,
    sink: &mut dyn DiagnosticsSink,
) -> Result<MeasureResult, MeasureError> {
    run(img, cfg, Some(sink))
}

#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all, fields(width = img.width(), height = img.height()))
)]
fn run(
    img: &image::GrayImage,
    cfg: &MeasureConfig,
    sink: Option<&mut dyn DiagnosticsSink>,
) -> Result<MeasureResult, MeasureError> {
    let view = gray_view(img);
    let detector = TagDetector::new(cfg.detector.clone())?;
    let detections = detector.detect(&view);
    log::info!(
        "detected {} tags ({} rejected candidates)",
        detections.tags.len(),
        detections.rejected.len()
    );

    let measurer = StripeMeasurer::new(cfg.stripes.clone());
    let report = match sink {
        Some(sink) => measurer.measure_tags_with_diagnostics(&view, &detections.tags, sink),
        None => measurer.measure_tags(&view, &detections.tags),
    };
    if report.measured().next().is_none() {
        log::warn!("no stripe could be measured");
    }

    Ok(MeasureResult {
        tags: detections.tags,
        report,
    })
}
