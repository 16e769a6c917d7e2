//! Quad candidates from a binarized frame.

use image::GrayImage as ImageBuffer;
use imageproc::contours::{find_contours, BorderType};
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::point::Point;
use nalgebra::Point2;
use sail_shape_core::{is_convex, min_side, order_clockwise, quad_centroid};

/// Geometry gates for candidate quads.
#[derive(Clone, Copy, Debug)]
pub(crate) struct QuadFilter {
    pub min_perimeter: f64,
    pub max_perimeter: f64,
    pub polygon_accuracy_rate: f64,
    pub min_side_px: f32,
    pub min_corner_distance_rate: f64,
}

/// Outer contours of `binary` that simplify to convex quads, corners clockwise
/// on screen and pushed out by half a pixel to the region boundary.
pub(crate) fn find_quad_candidates(binary: &ImageBuffer, filter: &QuadFilter) -> Vec<[Point2<f32>; 4]> {
    let mut out = Vec::new();
    for contour in find_contours::<i32>(binary) {
        if contour.border_type != BorderType::Outer || contour.points.len() < 4 {
            continue;
        }
        let perimeter = arc_length(&contour.points, true);
        if perimeter < filter.min_perimeter || perimeter > filter.max_perimeter {
            continue;
        }
        let eps = (filter.polygon_accuracy_rate * perimeter).max(1.0);
        let poly = approximate_closed(&contour.points, eps);
        if poly.len() != 4 {
            continue;
        }

        let quad = order_clockwise([0, 1, 2, 3].map(|i| {
            Point2::new(poly[i].x as f32, poly[i].y as f32)
        }));
        if !is_convex(&quad) || min_side(&quad) < filter.min_side_px {
            continue;
        }
        let min_corner_dist = (filter.min_corner_distance_rate * perimeter) as f32;
        if min_diagonal_gap(&quad) < min_corner_dist {
            continue;
        }
        out.push(expand_half_pixel(quad));
    }
    out
}

/// Douglas–Peucker on a closed curve: split at the point farthest from the
/// first one and simplify both halves as open curves.
fn approximate_closed(points: &[Point<i32>], eps: f64) -> Vec<Point<i32>> {
    let start = points[0];
    let (far, _) = points.iter().enumerate().fold((0, 0i64), |best, (i, p)| {
        let dx = (p.x - start.x) as i64;
        let dy = (p.y - start.y) as i64;
        let d = dx * dx + dy * dy;
        if d > best.1 {
            (i, d)
        } else {
            best
        }
    });
    if far == 0 {
        return vec![start];
    }

    let mut second: Vec<Point<i32>> = points[far..].to_vec();
    second.push(start);

    let mut poly = approximate_polygon_dp(&points[..=far], eps, false);
    poly.pop();
    poly.extend(approximate_polygon_dp(&second, eps, false));
    poly.pop();
    poly
}

fn min_diagonal_gap(q: &[Point2<f32>; 4]) -> f32 {
    let d = |a: Point2<f32>, b: Point2<f32>| (b - a).norm();
    min_side(q).min(d(q[0], q[2])).min(d(q[1], q[3]))
}

/// Contour points are pixel centres on the region boundary; move each corner
/// half a pixel outwards along both axes.
fn expand_half_pixel(q: [Point2<f32>; 4]) -> [Point2<f32>; 4] {
    let c = quad_centroid(&q);
    q.map(|p| {
        let sx = if (p.x as f64) < c.x { -0.5 } else { 0.5 };
        let sy = if (p.y as f64) < c.y { -0.5 } else { 0.5 };
        Point2::new(p.x + sx, p.y + sy)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn filter() -> QuadFilter {
        QuadFilter {
            min_perimeter: 10.0,
            max_perimeter: 1000.0,
            polygon_accuracy_rate: 0.03,
            min_side_px: 8.0,
            min_corner_distance_rate: 0.05,
        }
    }

    #[test]
    fn filled_square_yields_one_quad() {
        let bin = ImageBuffer::from_fn(60, 60, |x, y| {
            let inside = (15..45).contains(&x) && (20..50).contains(&y);
            Luma([if inside { 255 } else { 0 }])
        });
        let quads = find_quad_candidates(&bin, &filter());
        assert_eq!(quads.len(), 1);
        let q = quads[0];
        let xs: Vec<f32> = q.iter().map(|p| p.x).collect();
        let ys: Vec<f32> = q.iter().map(|p| p.y).collect();
        assert!(xs.iter().all(|&x| x == 14.5 || x == 44.5), "{q:?}");
        assert!(ys.iter().all(|&y| y == 19.5 || y == 49.5), "{q:?}");
        assert!(sail_shape_core::signed_area(&q) > 0.0);
    }

    #[test]
    fn thin_lines_and_specks_are_ignored() {
        let bin = ImageBuffer::from_fn(60, 60, |x, y| {
            let line = y == 5 && (5..55).contains(&x);
            let speck = (30..32).contains(&x) && (30..32).contains(&y);
            Luma([if line || speck { 255 } else { 0 }])
        });
        assert!(find_quad_candidates(&bin, &filter()).is_empty());
    }
}
