//! Binarization used by quad extraction and code sampling.

use image::{GrayImage as ImageBuffer, Luma};
use imageproc::integral_image::integral_image;
use sail_shape_core::GrayImageView;

/// Otsu threshold over a set of intensity samples.
///
/// Falls back to the midpoint when the samples occupy at most two bins.
pub(crate) fn otsu_threshold_from_samples(samples: &[u8]) -> u8 {
    let Some((&first, rest)) = samples.split_first() else {
        return 127;
    };
    let (min_v, max_v) = rest
        .iter()
        .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if min_v == max_v {
        return min_v;
    }

    let mut hist = [0u32; 256];
    for &v in samples {
        hist[v as usize] += 1;
    }
    if hist.iter().filter(|&&h| h > 0).count() <= 2 {
        return ((min_v as u16 + max_v as u16) / 2) as u8;
    }

    let total = samples.len() as f64;
    let sum_total: f64 = hist
        .iter()
        .enumerate()
        .map(|(i, &h)| i as f64 * h as f64)
        .sum();

    let mut sum_b = 0f64;
    let mut w_b = 0f64;
    let mut best_var = -1f64;
    let mut best_t = 127u8;

    for (t, &h) in hist.iter().enumerate() {
        w_b += h as f64;
        if w_b < 1.0 {
            continue;
        }
        let w_f = total - w_b;
        if w_f < 1.0 {
            break;
        }
        sum_b += t as f64 * h as f64;
        let m_b = sum_b / w_b;
        let m_f = (sum_total - sum_b) / w_f;
        let var_between = w_b * w_f * (m_b - m_f) * (m_b - m_f);
        if var_between > best_var {
            best_var = var_between;
            best_t = t as u8;
        }
    }

    best_t
}

/// Local-mean threshold: dark pixels become foreground (255).
///
/// A pixel is foreground when `value + offset < mean` over the
/// `(2 * radius + 1)²` window clipped to the image.
pub(crate) fn adaptive_threshold_inv(
    src: &GrayImageView<'_>,
    radius: u32,
    offset: i32,
) -> ImageBuffer {
    let (w, h) = (src.width as u32, src.height as u32);
    let mut out = ImageBuffer::new(w, h);
    if w == 0 || h == 0 {
        return out;
    }

    let input = ImageBuffer::from_fn(w, h, |x, y| Luma([src.get(x as usize, y as usize)]));
    // u64 sums: a u32 integral overflows past ~16.8 M white pixels.
    let integral = integral_image::<_, u64>(&input);
    let at = |x: u32, y: u32| integral.get_pixel(x, y)[0];

    for y in 0..h {
        let y0 = y.saturating_sub(radius);
        let y1 = (y + radius).min(h - 1) + 1;
        for x in 0..w {
            let x0 = x.saturating_sub(radius);
            let x1 = (x + radius).min(w - 1) + 1;
            let count = ((x1 - x0) * (y1 - y0)) as i64;
            let sum = (at(x1, y1) + at(x0, y0) - at(x0, y1) - at(x1, y0)) as i64;
            let value = input.get_pixel(x, y)[0] as i64;
            // value + offset < sum / count, kept in integers.
            if (value + offset as i64) * count < sum {
                out.put_pixel(x, y, Luma([255]));
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use sail_shape_core::GrayImage;

    #[test]
    fn otsu_splits_bimodal_samples() {
        let mut samples = vec![20u8; 50];
        samples.extend(std::iter::repeat(200u8).take(50));
        samples.extend([60, 90, 140]);
        let t = otsu_threshold_from_samples(&samples);
        assert!((20..200).contains(&t), "threshold {t}");
        assert_eq!(otsu_threshold_from_samples(&[]), 127);
        assert_eq!(otsu_threshold_from_samples(&[42, 42]), 42);
    }

    #[test]
    fn dark_square_edges_become_foreground() {
        let img = GrayImage::from_fn(40, 40, |x, y| {
            if (10..30).contains(&x) && (10..30).contains(&y) {
                10
            } else {
                230
            }
        });
        let bin = adaptive_threshold_inv(&img.view(), 5, 7);
        assert_eq!(bin.get_pixel(10, 10)[0], 255);
        assert_eq!(bin.get_pixel(29, 20)[0], 255);
        assert_eq!(bin.get_pixel(2, 2)[0], 0);
        assert_eq!(bin.get_pixel(35, 20)[0], 0);
    }

    #[test]
    fn full_resolution_white_frame_does_not_overflow() {
        // 4200 x 4100 white pixels sum past u32::MAX.
        let (w, h) = (4200, 4100);
        let mut img = GrayImage::filled(w, h, 255);
        for y in h - 6..h - 3 {
            for x in w - 6..w - 3 {
                img.set(x, y, 0);
            }
        }
        let bin = adaptive_threshold_inv(&img.view(), 11, 7);
        assert_eq!(bin.get_pixel((w - 5) as u32, (h - 5) as u32)[0], 255);
        assert_eq!(bin.get_pixel(100, 100)[0], 0);
        let foreground = bin.pixels().filter(|p| p[0] == 255).count();
        assert_eq!(foreground, 9);
    }
}
