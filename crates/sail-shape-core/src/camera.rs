//! Pinhole camera with Brown-Conrady distortion.

use serde::{Deserialize, Serialize};

/// Pinhole intrinsics in pixels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CameraIntrinsics {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
}

impl CameraIntrinsics {
    /// Read `fx, fy, cx, cy` from a row-major 3×3 camera matrix.
    pub fn from_matrix(k: &[[f64; 3]; 3]) -> Self {
        Self {
            fx: k[0][0],
            fy: k[1][1],
            cx: k[0][2],
            cy: k[1][2],
        }
    }

    pub fn is_valid(self) -> bool {
        [self.fx, self.fy, self.cx, self.cy]
            .iter()
            .all(|v| v.is_finite())
            && self.fx.abs() > 1e-12
            && self.fy.abs() > 1e-12
    }

    pub fn pixel_to_normalized(self, pixel_xy: [f64; 2]) -> Option<[f64; 2]> {
        if !self.is_valid() {
            return None;
        }
        let x = (pixel_xy[0] - self.cx) / self.fx;
        let y = (pixel_xy[1] - self.cy) / self.fy;
        (x.is_finite() && y.is_finite()).then_some([x, y])
    }

    pub fn normalized_to_pixel(self, normalized_xy: [f64; 2]) -> [f64; 2] {
        [
            self.fx * normalized_xy[0] + self.cx,
            self.fy * normalized_xy[1] + self.cy,
        ]
    }
}

/// Radial-tangential coefficients in OpenCV order `k1, k2, p1, p2, k3`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct RadialTangentialDistortion {
    pub k1: f64,
    pub k2: f64,
    pub p1: f64,
    pub p2: f64,
    pub k3: f64,
}

impl RadialTangentialDistortion {
    /// Build from an OpenCV-style coefficient list; missing trailing terms are 0
    /// and terms past `k3` (rational model) are ignored.
    pub fn from_coefficients(c: &[f64]) -> Self {
        let at = |i: usize| c.get(i).copied().unwrap_or(0.0);
        Self {
            k1: at(0),
            k2: at(1),
            p1: at(2),
            p2: at(3),
            k3: at(4),
        }
    }

    pub fn distort_normalized(self, xy: [f64; 2]) -> [f64; 2] {
        let [x, y] = xy;
        let r2 = x * x + y * y;
        let radial = 1.0 + r2 * (self.k1 + r2 * (self.k2 + r2 * self.k3));
        let x_tan = 2.0 * self.p1 * x * y + self.p2 * (r2 + 2.0 * x * x);
        let y_tan = self.p1 * (r2 + 2.0 * y * y) + 2.0 * self.p2 * x * y;
        [x * radial + x_tan, y * radial + y_tan]
    }
}

/// Intrinsics plus distortion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CameraModel {
    pub intrinsics: CameraIntrinsics,
    pub distortion: RadialTangentialDistortion,
}

const UNDISTORT_MAX_ITERS: usize = 20;
const UNDISTORT_EPS: f64 = 1e-12;

impl CameraModel {
    pub fn distort_pixel(self, undistorted_xy: [f64; 2]) -> Option<[f64; 2]> {
        let xn = self.intrinsics.pixel_to_normalized(undistorted_xy)?;
        let xd = self.distortion.distort_normalized(xn);
        let pix = self.intrinsics.normalized_to_pixel(xd);
        (pix[0].is_finite() && pix[1].is_finite()).then_some(pix)
    }

    /// Undistorted normalized coordinates of a distorted pixel (fixed-point inversion).
    pub fn undistort_to_normalized(self, distorted_xy: [f64; 2]) -> Option<[f64; 2]> {
        let xd = self.intrinsics.pixel_to_normalized(distorted_xy)?;
        let d = self.distortion;
        let [mut x, mut y] = xd;

        for _ in 0..UNDISTORT_MAX_ITERS {
            let r2 = x * x + y * y;
            let radial = 1.0 + r2 * (d.k1 + r2 * (d.k2 + r2 * d.k3));
            if !radial.is_finite() || radial.abs() < 1e-12 {
                return None;
            }
            let dx_tan = 2.0 * d.p1 * x * y + d.p2 * (r2 + 2.0 * x * x);
            let dy_tan = d.p1 * (r2 + 2.0 * y * y) + 2.0 * d.p2 * x * y;
            let x_next = (xd[0] - dx_tan) / radial;
            let y_next = (xd[1] - dy_tan) / radial;
            if !x_next.is_finite() || !y_next.is_finite() {
                return None;
            }
            let step = ((x_next - x).powi(2) + (y_next - y).powi(2)).sqrt();
            x = x_next;
            y = y_next;
            if step <= UNDISTORT_EPS {
                break;
            }
        }
        Some([x, y])
    }

    pub fn undistort_pixel(self, distorted_xy: [f64; 2]) -> Option<[f64; 2]> {
        let n = self.undistort_to_normalized(distorted_xy)?;
        Some(self.intrinsics.normalized_to_pixel(n))
    }
}
