//! 2D affine transforms and affine image warping.

use crate::{sample_bilinear_u8, GrayImage, GrayImageView};
use nalgebra::{Matrix2, Point2, Vector2};

/// Affine map `p' = A * p + t`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Affine2 {
    pub a: Matrix2<f64>,
    pub t: Vector2<f64>,
}

impl Affine2 {
    pub const IDENTITY: Self = Self {
        a: Matrix2::new(1.0, 0.0, 0.0, 1.0),
        t: Vector2::new(0.0, 0.0),
    };

    /// Rotation about `center` by `angle_deg`, scaled by `scale`.
    ///
    /// Same convention as OpenCV's `getRotationMatrix2D`: in image coordinates
    /// (y pointing down) a positive angle turns the picture counter-clockwise
    /// on screen, so a point at `center + r·(cos θ, sin θ)` lands on
    /// `center + r·(1, 0)` when `angle_deg = θ`.
    pub fn rotation_about(center: Point2<f64>, angle_deg: f64, scale: f64) -> Self {
        let (s, c) = angle_deg.to_radians().sin_cos();
        let alpha = scale * c;
        let beta = scale * s;
        let a = Matrix2::new(alpha, beta, -beta, alpha);
        let t = center.coords - a * center.coords;
        Self { a, t }
    }

    #[inline]
    pub fn apply(&self, p: Point2<f64>) -> Point2<f64> {
        Point2::from(self.a * p.coords + self.t)
    }

    pub fn inverse(&self) -> Option<Self> {
        let a = self.a.try_inverse()?;
        Some(Self { a, t: -(a * self.t) })
    }

    /// Row-major `2×3` matrix `[A | t]`.
    pub fn to_rows(&self) -> [[f64; 3]; 2] {
        [
            [self.a[(0, 0)], self.a[(0, 1)], self.t[0]],
            [self.a[(1, 0)], self.a[(1, 1)], self.t[1]],
        ]
    }
}

/// Warp `src` with the forward transform `src_to_dst`.
///
/// Every output pixel `(x, y)` samples the source at `src_to_dst⁻¹(x, y)` with
/// bilinear interpolation; samples falling outside the source read as 0.
/// Returns `None` when the transform is not invertible.
pub fn warp_affine_gray(
    src: &GrayImageView<'_>,
    src_to_dst: &Affine2,
    out_w: usize,
    out_h: usize,
) -> Option<GrayImage> {
    let inv = src_to_dst.inverse()?;
    let mut out = vec![0u8; out_w * out_h];

    for y in 0..out_h {
        for x in 0..out_w {
            let p = inv.apply(Point2::new(x as f64, y as f64));
            out[y * out_w + x] = sample_bilinear_u8(src, p.x as f32, p.y as f32);
        }
    }

    Some(GrayImage {
        width: out_w,
        height: out_h,
        data: out,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn rotation_levels_a_sloped_chord() {
        let start: Point2<f64> = Point2::new(100.0, 50.0);
        let end = Point2::new(180.0, 110.0);
        let angle = (end.y - start.y).atan2(end.x - start.x).to_degrees();
        let rot = Affine2::rotation_about(start, angle, 1.0);

        let s = rot.apply(start);
        let e = rot.apply(end);
        assert_abs_diff_eq!(s.x, start.x, epsilon = 1e-9);
        assert_abs_diff_eq!(s.y, start.y, epsilon = 1e-9);
        assert_abs_diff_eq!(e.y, start.y, epsilon = 1e-9);
        assert_abs_diff_eq!(e.x, start.x + 100.0, epsilon = 1e-9);
    }

    #[test]
    fn zero_angle_is_identity() {
        let rot = Affine2::rotation_about(Point2::new(12.0, 7.0), 0.0, 1.0);
        assert_eq!(rot, Affine2::IDENTITY);
    }

    #[test]
    fn identity_warp_copies_pixels() {
        let img = GrayImage::from_fn(5, 4, |x, y| (x * 40 + y) as u8);
        let out = warp_affine_gray(&img.view(), &Affine2::IDENTITY, 5, 4).expect("warp");
        assert_eq!(out, img);
    }

    #[test]
    fn quarter_turn_moves_pixels() {
        let mut img = GrayImage::filled(9, 9, 0);
        img.set(6, 4, 255);
        // +90° about the centre takes (6,4) to (4,2).
        let rot = Affine2::rotation_about(Point2::new(4.0, 4.0), 90.0, 1.0);
        let out = warp_affine_gray(&img.view(), &rot, 9, 9).expect("warp");
        assert_eq!(out.get(4, 2), 255);
        assert_eq!(out.get(6, 4), 0);
    }
}
