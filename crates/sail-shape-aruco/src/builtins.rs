//! Embedded built-in dictionaries.
//!
//! `DICT_4X4_50` is the OpenCV ArUco table of the same name. The rows below
//! are OpenCV's own byte list (unrotated marker, row-major, MSB first,
//! `1 = white`); they are converted to this crate's `black = 1`,
//! `idx = y * 4 + x` layout at compile time.

#![allow(clippy::unreadable_literal)]

use crate::Dictionary;
use std::borrow::Cow;

const DICT_4X4_50_BYTES: [[u8; 2]; 50] = [
    [181, 50], [15, 154], [51, 45], [153, 70], [84, 158],
    [121, 205], [158, 46], [196, 242], [254, 218], [207, 86],
    [249, 238], [3, 94], [65, 30], [69, 248], [86, 155],
    [85, 183], [109, 44], [130, 75], [146, 107], [251, 147],
    [255, 58], [208, 178], [29, 96], [30, 245], [55, 87],
    [88, 154], [113, 134], [153, 30], [216, 163], [211, 155],
    [227, 28], [210, 105], [112, 114], [107, 9], [142, 17],
    [160, 234], [225, 183], [224, 101], [135, 98], [161, 210],
    [248, 23], [245, 67], [167, 110], [186, 18], [182, 208],
    [242, 152], [244, 93], [255, 134], [203, 8], [207, 100],
];

/// Convert one OpenCV 4×4 byte pair to a packed `black = 1` code.
pub const fn code_from_opencv_bytes(bytes: [u8; 2]) -> u64 {
    let word = ((bytes[0] as u16) << 8) | bytes[1] as u16;
    let mut code = 0u64;
    let mut k = 0;
    while k < 16 {
        let white = (word >> (15 - k)) & 1 == 1;
        if !white {
            code |= 1 << k;
        }
        k += 1;
    }
    code
}

const fn convert_table<const N: usize>(bytes: &[[u8; 2]; N]) -> [u64; N] {
    let mut out = [0u64; N];
    let mut i = 0;
    while i < N {
        out[i] = code_from_opencv_bytes(bytes[i]);
        i += 1;
    }
    out
}

static DICT_4X4_50_CODES: [u64; 50] = convert_table(&DICT_4X4_50_BYTES);

/// OpenCV `DICT_4X4_50`, the default for stripe tags.
pub const DICT_4X4_50: Dictionary = Dictionary {
    name: Cow::Borrowed("DICT_4X4_50"),
    marker_size: 4,
    max_correction_bits: 1,
    codes: Cow::Borrowed(&DICT_4X4_50_CODES),
};

/// Names accepted by [`builtin_dictionary`].
pub const BUILTIN_DICTIONARY_NAMES: &[&str] = &["DICT_4X4_50"];

/// Look up a built-in dictionary by name.
pub fn builtin_dictionary(name: &str) -> Option<Dictionary> {
    match name {
        "DICT_4X4_50" => Some(DICT_4X4_50),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rotate_code_u64;

    #[test]
    fn builtin_table_is_valid() {
        let dict = builtin_dictionary("DICT_4X4_50").expect("builtin");
        dict.validate().expect("valid");
        assert_eq!(dict.len(), 50);
        assert!(builtin_dictionary("DICT_6X6_1000").is_none());
    }

    #[test]
    fn byte_conversion_flips_polarity_and_bit_order() {
        // Id 1: rows 0000 1111 1001 1010 with 1 = white.
        let code = code_from_opencv_bytes([15, 154]);
        let black_cells: Vec<usize> = (0..16).filter(|k| (code >> k) & 1 == 1).collect();
        assert_eq!(black_cells, vec![0, 1, 2, 3, 9, 10, 13, 15]);
        assert_eq!(DICT_4X4_50.code(1), Some(code));
        assert_eq!(code_from_opencv_bytes([255, 255]), 0);
        assert_eq!(code_from_opencv_bytes([0, 0]), 0xffff);
    }

    #[test]
    fn no_code_equals_a_rotation_of_another() {
        let codes = &DICT_4X4_50.codes;
        for (i, &a) in codes.iter().enumerate() {
            for rot in 1..4 {
                assert_ne!(a, rotate_code_u64(a, 4, rot), "id {i} is rotation symmetric");
            }
            for (j, &b) in codes.iter().enumerate().skip(i + 1) {
                for rot in 0..4 {
                    assert_ne!(rotate_code_u64(a, 4, rot), b, "ids {i} and {j} collide");
                }
            }
        }
    }
}
