//! JSON configuration and report helpers.

use sail_shape_aruco::{Tag, TagDetectorParams};
use sail_shape_stripe::{StripeMetrics, StripeOutcome, StripeParams, StripeReport};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(thiserror::Error, Debug)]
pub enum IoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Full measurement configuration. Missing fields fall back to defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasureConfig {
    pub detector: TagDetectorParams,
    pub stripes: StripeParams,
}

impl MeasureConfig {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StripeStatus {
    Measured,
    Skipped,
    Failed,
}

/// One stripe in the JSON report.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StripeRecord {
    pub name: String,
    pub status: StripeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<StripeMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<&StripeOutcome> for StripeRecord {
    fn from(outcome: &StripeOutcome) -> Self {
        let (status, metrics) = match outcome {
            StripeOutcome::Measured(m) => (StripeStatus::Measured, Some(m.clone())),
            StripeOutcome::Skipped { .. } => (StripeStatus::Skipped, None),
            StripeOutcome::Failed { .. } => (StripeStatus::Failed, None),
        };
        Self {
            name: outcome.name().to_string(),
            status,
            metrics,
            reason: outcome.reason(),
        }
    }
}

/// Machine-readable result of one run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeasureReport {
    #[serde(default)]
    pub image_path: Option<String>,
    pub tags: Vec<Tag>,
    pub stripes: Vec<StripeRecord>,
}

impl MeasureReport {
    pub fn new(image_path: Option<String>, tags: &[Tag], report: &StripeReport) -> Self {
        Self {
            image_path,
            tags: tags.to_vec(),
            stripes: report.outcomes.iter().map(StripeRecord::from).collect(),
        }
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
