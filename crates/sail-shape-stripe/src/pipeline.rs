//! Per-stripe measurement over a set of detected tags.

use crate::error::StripeError;
use crate::fit::{fit_curve, FitParams};
use crate::locator::{locate_stripes, DuplicatePolicy, Located, StripeBoundary, StripeLayout};
use crate::raster::{draw_polyline, from_buffer, to_buffer};
use crate::rectify::{rectify_stripe, RectifyParams};
use crate::shape::{analyze_shape, StripeMetrics};
use crate::trace::{binarize_inv, trace_binary, TraceParams};
use log::{debug, warn};
use sail_shape_aruco::Tag;
use sail_shape_core::GrayImageView;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Everything that tunes the per-stripe pipeline.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StripeParams {
    pub layout: StripeLayout,
    pub duplicate_policy: DuplicatePolicy,
    pub rectify: RectifyParams,
    pub trace: TraceParams,
    pub fit: FitParams,
}

/// Receives intermediate images of every measured stripe.
pub trait DiagnosticsSink {
    /// Binarized crop the trace was taken from.
    fn stripe_binary(&mut self, name: &str, binary: &GrayImageView<'_>);
    /// Crop with the fitted curve drawn in.
    fn stripe_overlay(&mut self, name: &str, overlay: &GrayImageView<'_>);
}

/// Result for one layout entry.
#[derive(Clone, Debug, PartialEq)]
pub enum StripeOutcome {
    Measured(StripeMetrics),
    /// At least one of the stripe's tags was not detected.
    Skipped { name: String, missing_ids: Vec<u32> },
    Failed { name: String, error: StripeError },
}

impl StripeOutcome {
    pub fn name(&self) -> &str {
        match self {
            Self::Measured(m) => &m.name,
            Self::Skipped { name, .. } | Self::Failed { name, .. } => name,
        }
    }

    /// Why the stripe was not measured, if it wasn't.
    pub fn reason(&self) -> Option<String> {
        match self {
            Self::Measured(_) => None,
            Self::Skipped { missing_ids, .. } => {
                let ids: Vec<String> = missing_ids.iter().map(|id| id.to_string()).collect();
                Some(format!("missing tag {}", ids.join(", ")))
            }
            Self::Failed { error, .. } => Some(error.to_string()),
        }
    }
}

/// Outcomes in layout order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StripeReport {
    pub outcomes: Vec<StripeOutcome>,
}

impl StripeReport {
    pub fn measured(&self) -> impl Iterator<Item = &StripeMetrics> {
        self.outcomes.iter().filter_map(|o| match o {
            StripeOutcome::Measured(m) => Some(m),
            _ => None,
        })
    }

    pub fn skipped(&self) -> impl Iterator<Item = &StripeOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, StripeOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> impl Iterator<Item = &StripeOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, StripeOutcome::Failed { .. }))
    }

    pub fn get(&self, name: &str) -> Option<&StripeOutcome> {
        self.outcomes.iter().find(|o| o.name() == name)
    }
}

/// Runs locate → rectify → trace → fit → analyze for every configured stripe.
#[derive(Clone, Debug, Default)]
pub struct StripeMeasurer {
    params: StripeParams,
}

impl StripeMeasurer {
    pub fn new(params: StripeParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &StripeParams {
        &self.params
    }

    pub fn measure_tags(&self, image: &GrayImageView<'_>, tags: &[Tag]) -> StripeReport {
        self.run(image, tags, None)
    }

    pub fn measure_tags_with_diagnostics(
        &self,
        image: &GrayImageView<'_>,
        tags: &[Tag],
        sink: &mut dyn DiagnosticsSink,
    ) -> StripeReport {
        self.run(image, tags, Some(sink))
    }

    #[cfg_attr(feature = "tracing", instrument(level = "info", skip_all, fields(tags = tags.len())))]
    fn run(
        &self,
        image: &GrayImageView<'_>,
        tags: &[Tag],
        mut sink: Option<&mut dyn DiagnosticsSink>,
    ) -> StripeReport {
        let p = &self.params;
        let outcomes = locate_stripes(tags, &p.layout, p.duplicate_policy)
            .into_iter()
            .map(|located| match located {
                Located::Found(boundary) => {
                    match self.measure_one(image, &boundary, &mut sink) {
                        Ok(metrics) => {
                            debug!(
                                "stripe {}: draft {:.1} camber {:.1} twist {:.1}",
                                metrics.name, metrics.draft_pct, metrics.camber_pct, metrics.twist_deg
                            );
                            StripeOutcome::Measured(metrics)
                        }
                        Err(error) => {
                            warn!("stripe {} failed: {}", boundary.name, error);
                            StripeOutcome::Failed {
                                name: boundary.name,
                                error,
                            }
                        }
                    }
                }
                Located::Missing { name, missing_ids } => {
                    warn!("stripe {name} skipped: tag(s) {missing_ids:?} not detected");
                    StripeOutcome::Skipped { name, missing_ids }
                }
            })
            .collect();
        StripeReport { outcomes }
    }

    /// Measure a single located stripe.
    pub fn measure_boundary(
        &self,
        image: &GrayImageView<'_>,
        boundary: &StripeBoundary,
    ) -> Result<StripeMetrics, StripeError> {
        self.measure_one(image, boundary, &mut None)
    }

    fn measure_one(
        &self,
        image: &GrayImageView<'_>,
        boundary: &StripeBoundary,
        sink: &mut Option<&mut dyn DiagnosticsSink>,
    ) -> Result<StripeMetrics, StripeError> {
        let p = &self.params;
        let rect = rectify_stripe(image, boundary, &p.rectify)?;
        let binary = binarize_inv(&rect.crop.view(), &p.trace);
        let trace = trace_binary(&binary.view(), p.trace.window)?;
        let curve = fit_curve(&trace, &p.fit)?;
        let metrics = analyze_shape(&boundary.name, &curve, rect.twist_deg, rect.chord_length_px)?;

        if let Some(sink) = sink.as_mut() {
            sink.stripe_binary(&boundary.name, &binary.view());
            let mut overlay = to_buffer(&rect.crop.view());
            draw_polyline(&mut overlay, &curve.points, 128);
            sink.stripe_overlay(&boundary.name, &from_buffer(overlay).view());
        }

        Ok(metrics)
    }
}
