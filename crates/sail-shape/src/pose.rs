//! Single-marker pose from a detected tag and a calibrated camera.

use nalgebra::{Matrix3, Point2, Vector3};
use sail_shape_aruco::Tag;
use sail_shape_core::{homography_from_4pt, CameraModel};
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PoseError {
    #[error("marker length must be positive, got {0}")]
    InvalidMarkerLength(f64),
    #[error("corner {0} could not be undistorted")]
    Undistort(usize),
    #[error("tag corners do not define a valid homography")]
    DegenerateHomography,
}

/// Marker pose in the camera frame.
///
/// The marker frame has its origin at the tag centre, x towards the tag's
/// top-right corner, y towards its bottom-left corner and z into the scene
/// for a marker facing the camera.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkerPose {
    pub id: u32,
    pub rotation: Matrix3<f64>,
    /// Marker centre in the camera frame, same unit as the marker length.
    pub translation: Vector3<f64>,
    /// Distance from the camera centre to the marker centre.
    pub distance: f64,
}

/// Estimate the pose of `tag` for a square marker with side `marker_length`.
pub fn estimate_marker_pose(
    tag: &Tag,
    marker_length: f64,
    camera: &CameraModel,
) -> Result<MarkerPose, PoseError> {
    if !(marker_length > 0.0 && marker_length.is_finite()) {
        return Err(PoseError::InvalidMarkerLength(marker_length));
    }

    let h = marker_length / 2.0;
    let object = [
        Point2::new(-h, -h),
        Point2::new(h, -h),
        Point2::new(h, h),
        Point2::new(-h, h),
    ];
    let mut image = [Point2::origin(); 4];
    for (i, c) in tag.corners.iter().enumerate() {
        let n = camera
            .undistort_to_normalized([c.x as f64, c.y as f64])
            .ok_or(PoseError::Undistort(i))?;
        image[i] = Point2::new(n[0], n[1]);
    }

    let hom = homography_from_4pt(&object, &image).ok_or(PoseError::DegenerateHomography)?;
    let (rotation, translation) = decompose_planar(&hom.h)?;
    Ok(MarkerPose {
        id: tag.id,
        rotation,
        translation,
        distance: translation.norm(),
    })
}

/// Split `H ~ [r1 r2 t]` (plane to normalized image) into a rotation and a
/// translation in front of the camera.
fn decompose_planar(hm: &Matrix3<f64>) -> Result<(Matrix3<f64>, Vector3<f64>), PoseError> {
    let h1 = hm.column(0).into_owned();
    let h2 = hm.column(1).into_owned();
    let h3 = hm.column(2).into_owned();
    let norm = 0.5 * (h1.norm() + h2.norm());
    if !(norm > 1e-12 && norm.is_finite()) {
        return Err(PoseError::DegenerateHomography);
    }

    let mut scale = 1.0 / norm;
    if h3.z * scale < 0.0 {
        scale = -scale;
    }
    let r1 = h1 * scale;
    let r2 = h2 * scale;
    let t = h3 * scale;
    let r3 = r1.cross(&r2);

    let approx = Matrix3::from_columns(&[r1, r2, r3]);
    let svd = approx.svd(true, true);
    let (Some(u), Some(v_t)) = (svd.u, svd.v_t) else {
        return Err(PoseError::DegenerateHomography);
    };
    let mut rotation = u * v_t;
    if rotation.determinant() < 0.0 {
        let mut u = u;
        u.column_mut(2).neg_mut();
        rotation = u * v_t;
    }
    if !rotation.iter().chain(t.iter()).all(|v| v.is_finite()) {
        return Err(PoseError::DegenerateHomography);
    }
    Ok((rotation, t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::{Point3, Rotation3};
    use sail_shape_core::{CameraIntrinsics, RadialTangentialDistortion};

    fn camera() -> CameraModel {
        CameraModel {
            intrinsics: CameraIntrinsics {
                fx: 1000.0,
                fy: 1000.0,
                cx: 640.0,
                cy: 360.0,
            },
            distortion: RadialTangentialDistortion::default(),
        }
    }

    fn project_tag(rot: &Rotation3<f64>, t: Vector3<f64>, length: f64) -> Tag {
        let cam = camera();
        let h = length / 2.0;
        let obj = [(-h, -h), (h, -h), (h, h), (-h, h)];
        let corners = obj.map(|(x, y)| {
            let p = rot * Point3::new(x, y, 0.0) + t;
            let px = cam.intrinsics.normalized_to_pixel([p.x / p.z, p.y / p.z]);
            Point2::new(px[0] as f32, px[1] as f32)
        });
        Tag {
            id: 3,
            corners,
            rotation: 0,
            hamming: 0,
            border_score: 1.0,
            area: 0.0,
        }
    }

    #[test]
    fn fronto_parallel_marker_distance() {
        let tag = project_tag(&Rotation3::identity(), Vector3::new(0.0, 0.0, 2.0), 0.19);
        let pose = estimate_marker_pose(&tag, 0.19, &camera()).expect("pose");
        assert_abs_diff_eq!(pose.distance, 2.0, epsilon = 1e-4);
        assert_abs_diff_eq!(pose.rotation, Matrix3::identity(), epsilon = 1e-4);
        assert_eq!(pose.id, 3);
    }

    #[test]
    fn tilted_marker_pose_is_recovered() {
        let rot = Rotation3::from_euler_angles(0.2, -0.5, 0.1);
        let t = Vector3::new(0.3, -0.1, 3.5);
        let tag = project_tag(&rot, t, 0.19);
        let pose = estimate_marker_pose(&tag, 0.19, &camera()).expect("pose");
        assert_abs_diff_eq!(pose.translation, t, epsilon = 2e-3);
        assert_abs_diff_eq!(pose.rotation, *rot.matrix(), epsilon = 2e-3);
        assert_abs_diff_eq!(pose.distance, t.norm(), epsilon = 2e-3);
    }

    #[test]
    fn bad_inputs_are_reported() {
        let tag = project_tag(&Rotation3::identity(), Vector3::new(0.0, 0.0, 2.0), 0.19);
        assert_eq!(
            estimate_marker_pose(&tag, 0.0, &camera()),
            Err(PoseError::InvalidMarkerLength(0.0))
        );
        let mut collapsed = tag;
        collapsed.corners = [Point2::new(100.0, 100.0); 4];
        assert!(estimate_marker_pose(&collapsed, 0.19, &camera()).is_err());
    }
}
