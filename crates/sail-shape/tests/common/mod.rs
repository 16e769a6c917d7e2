#![allow(dead_code)]

use image::{GrayImage, Luma};
use sail_shape::aruco::builtins::DICT_4X4_50;

pub const CELL: u32 = 8;
pub const TAG_SIDE: u32 = 6 * CELL;

/// Paint tag `id` upright with its outer top-left corner at `(x0, y0)`.
pub fn paint_tag(img: &mut GrayImage, id: u32, x0: u32, y0: u32) {
    let code = DICT_4X4_50.codes[id as usize];
    for cy in 0..6u32 {
        for cx in 0..6u32 {
            let border = cx == 0 || cy == 0 || cx == 5 || cy == 5;
            let black = border || (code >> ((cy - 1) * 4 + (cx - 1))) & 1 == 1;
            let v = if black { 0 } else { 255 };
            for yy in 0..CELL {
                for xx in 0..CELL {
                    img.put_pixel(x0 + cx * CELL + xx, y0 + cy * CELL + yy, Luma([v]));
                }
            }
        }
    }
}

/// A stripe between two tags whose tops sit on row `tag_y`; the dark band
/// starts 35 px below the chord and sags by `depth` px at mid-chord.
#[derive(Clone, Copy)]
pub struct SceneStripe {
    pub start_id: u32,
    pub end_id: u32,
    pub tag_y: u32,
    pub depth: f64,
}

pub const BOTTOM: SceneStripe = SceneStripe {
    start_id: 1,
    end_id: 2,
    tag_y: 40,
    depth: 40.0,
};

pub const MIDDLE: SceneStripe = SceneStripe {
    start_id: 3,
    end_id: 4,
    tag_y: 200,
    depth: 25.0,
};

pub const LEFT_X: u32 = 40;
pub const RIGHT_X: u32 = 552;
/// Distance between the two tag centroids.
pub const CHORD: f64 = (RIGHT_X - LEFT_X) as f64;

/// White 640×400 frame (plus `offset`) with the given stripes drawn in.
pub fn sail_scene(stripes: &[SceneStripe], offset: (u32, u32)) -> GrayImage {
    let (dx, dy) = offset;
    let mut img = GrayImage::from_pixel(640 + dx, 400 + dy, Luma([255]));

    for s in stripes {
        let cx0 = (LEFT_X + dx) as f64 + TAG_SIDE as f64 / 2.0 - 0.5;
        let cx1 = cx0 + CHORD;
        let cy = (s.tag_y + dy) as f64 + TAG_SIDE as f64 / 2.0 - 0.5;
        for x in (cx0 as u32 - 4)..=(cx1 as u32 + 4) {
            let t = ((x as f64 - cx0) / (cx1 - cx0)).clamp(0.0, 1.0);
            let edge = cy + 35.0 + s.depth * 4.0 * t * (1.0 - t);
            for y in edge.ceil() as u32..(edge + 6.0).ceil() as u32 {
                img.put_pixel(x, y, Luma([0]));
            }
        }
        paint_tag(&mut img, s.start_id, LEFT_X + dx, s.tag_y + dy);
        paint_tag(&mut img, s.end_id, RIGHT_X + dx, s.tag_y + dy);
    }
    img
}

/// Expected camber in percent for a stripe drawn by [`sail_scene`].
pub fn expected_camber(s: &SceneStripe) -> f64 {
    s.depth / CHORD * 100.0
}
