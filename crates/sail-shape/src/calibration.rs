//! Camera calibration record: intrinsic matrix plus distortion coefficients.

use sail_shape_core::{CameraIntrinsics, CameraModel, RadialTangentialDistortion};
use serde::{Deserialize, Deserializer, Serialize};
use std::{fs, path::Path};

#[derive(thiserror::Error, Debug)]
pub enum CalibrationError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("camera matrix has non-finite or zero focal length")]
    InvalidMatrix,
}

/// Output of an external calibration run, stored as `{"mtx": .., "dist": ..}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationData {
    /// Row-major 3×3 camera matrix.
    pub mtx: [[f64; 3]; 3],
    /// OpenCV-ordered distortion coefficients `k1, k2, p1, p2[, k3, ...]`.
    #[serde(deserialize_with = "deserialize_dist")]
    pub dist: Vec<f64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DistLayout {
    Flat(Vec<f64>),
    Nested(Vec<Vec<f64>>),
}

/// Accepts a flat list as well as the row/column matrix layouts numpy emits.
fn deserialize_dist<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<f64>, D::Error> {
    Ok(match DistLayout::deserialize(d)? {
        DistLayout::Flat(v) => v,
        DistLayout::Nested(rows) => rows.into_iter().flatten().collect(),
    })
}

impl CalibrationData {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, CalibrationError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn store_json(&self, path: impl AsRef<Path>) -> Result<(), CalibrationError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)?;
        log::info!("stored camera calibration to {}", path.as_ref().display());
        Ok(())
    }

    pub fn camera_model(&self) -> Result<CameraModel, CalibrationError> {
        let intrinsics = CameraIntrinsics::from_matrix(&self.mtx);
        if !intrinsics.is_valid() {
            return Err(CalibrationError::InvalidMatrix);
        }
        Ok(CameraModel {
            intrinsics,
            distortion: RadialTangentialDistortion::from_coefficients(&self.dist),
        })
    }
}
