//! Conversions between the core buffers and `image` buffers for `imageproc`.

use image::Luma;
use imageproc::drawing::{draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point;
use nalgebra::Point2;
use sail_shape_core::{GrayImage, GrayImageView};

pub(crate) fn to_buffer(view: &GrayImageView<'_>) -> image::GrayImage {
    image::GrayImage::from_fn(view.width as u32, view.height as u32, |x, y| {
        Luma([view.get(x as usize, y as usize)])
    })
}

pub(crate) fn from_buffer(buf: image::GrayImage) -> GrayImage {
    GrayImage {
        width: buf.width() as usize,
        height: buf.height() as usize,
        data: buf.into_raw(),
    }
}

/// Fill a polygon given in image coordinates. Degenerate polygons are skipped.
pub(crate) fn fill_polygon(buf: &mut image::GrayImage, corners: &[Point2<f32>], value: u8) {
    let mut poly: Vec<Point<i32>> = Vec::with_capacity(corners.len());
    for c in corners {
        if !c.x.is_finite() || !c.y.is_finite() {
            return;
        }
        let p = Point::new(c.x.round() as i32, c.y.round() as i32);
        if poly.last() != Some(&p) {
            poly.push(p);
        }
    }
    while poly.len() > 1 && poly.first() == poly.last() {
        poly.pop();
    }
    if poly.len() < 2 {
        return;
    }
    draw_polygon_mut(buf, &poly, Luma([value]));
}

/// Draw a polyline through `points` (crop coordinates).
pub(crate) fn draw_polyline(buf: &mut image::GrayImage, points: &[Point2<f64>], value: u8) {
    for w in points.windows(2) {
        let (a, b) = (w[0], w[1]);
        if a.coords.iter().chain(b.coords.iter()).all(|v| v.is_finite()) {
            draw_line_segment_mut(
                buf,
                (a.x as f32, a.y as f32),
                (b.x as f32, b.y as f32),
                Luma([value]),
            );
        }
    }
}
