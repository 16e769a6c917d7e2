//! Small helpers for 4-corner polygons in image coordinates (y down).

use nalgebra::Point2;

/// Mean of the four corners.
pub fn quad_centroid(q: &[Point2<f32>; 4]) -> Point2<f64> {
    let (sx, sy) = q
        .iter()
        .fold((0.0f64, 0.0f64), |(sx, sy), p| (sx + p.x as f64, sy + p.y as f64));
    Point2::new(sx / 4.0, sy / 4.0)
}

/// Shoelace sum; positive when the corners run clockwise on screen.
pub fn signed_area(q: &[Point2<f32>; 4]) -> f64 {
    let mut acc = 0.0f64;
    for i in 0..4 {
        let a = q[i];
        let b = q[(i + 1) % 4];
        acc += a.x as f64 * b.y as f64 - b.x as f64 * a.y as f64;
    }
    0.5 * acc
}

pub fn quad_area(q: &[Point2<f32>; 4]) -> f64 {
    signed_area(q).abs()
}

/// Strictly convex with a consistent turning direction.
pub fn is_convex(q: &[Point2<f32>; 4]) -> bool {
    let mut sign = 0.0f64;
    for i in 0..4 {
        let a = q[i];
        let b = q[(i + 1) % 4];
        let c = q[(i + 2) % 4];
        let cross = (b.x - a.x) as f64 * (c.y - b.y) as f64 - (b.y - a.y) as f64 * (c.x - b.x) as f64;
        if cross.abs() < 1e-9 {
            return false;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    true
}

/// Reverse the corner order if needed so the quad runs clockwise on screen.
pub fn order_clockwise(mut q: [Point2<f32>; 4]) -> [Point2<f32>; 4] {
    if signed_area(&q) < 0.0 {
        q.swap(1, 3);
    }
    q
}

/// Shortest side length.
pub fn min_side(q: &[Point2<f32>; 4]) -> f32 {
    (0..4)
        .map(|i| {
            let a = q[i];
            let b = q[(i + 1) % 4];
            ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt()
        })
        .fold(f32::INFINITY, f32::min)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> [Point2<f32>; 4] {
        [
            Point2::new(10.0, 10.0),
            Point2::new(20.0, 10.0),
            Point2::new(20.0, 20.0),
            Point2::new(10.0, 20.0),
        ]
    }

    #[test]
    fn screen_clockwise_square_has_positive_area() {
        let q = square();
        assert!((signed_area(&q) - 100.0).abs() < 1e-9);
        assert!(is_convex(&q));
        let c = quad_centroid(&q);
        assert_eq!((c.x, c.y), (15.0, 15.0));
    }

    #[test]
    fn counter_clockwise_input_is_reordered() {
        let mut q = square();
        q.swap(1, 3);
        assert!(signed_area(&q) < 0.0);
        let fixed = order_clockwise(q);
        assert!(signed_area(&fixed) > 0.0);
        assert_eq!(fixed[0], q[0]);
    }

    #[test]
    fn bow_tie_is_not_convex() {
        let q = [
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(10.0, 0.0),
            Point2::new(0.0, 10.0),
        ];
        assert!(!is_convex(&q));
        assert_eq!(min_side(&square()), 10.0);
    }
}
