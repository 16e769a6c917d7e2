//! Dictionary metadata and packed marker codes.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::{fs, path::Path};

#[derive(thiserror::Error, Debug)]
pub enum DictionaryError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("marker_size {marker_size} implies {bits} bits > 64 (unsupported)")]
    TooManyBits { marker_size: usize, bits: usize },
    #[error("code #{index} ({code:#x}) has bits above the {bits}-bit payload")]
    CodeOutOfRange { index: usize, code: u64, bits: usize },
    #[error("dictionary '{0}' has no codes")]
    Empty(String),
}

/// A fixed ArUco-style dictionary.
///
/// Built-in dictionaries borrow `'static` tables; dictionaries loaded from
/// JSON own their codes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dictionary {
    /// Human-readable name (for debugging/logging).
    pub name: Cow<'static, str>,
    /// Marker side length (number of inner bits per side).
    pub marker_size: usize,
    /// Maximum error-correcting Hamming distance supported by the dictionary.
    pub max_correction_bits: u8,
    /// One `u64` per marker id, encoding the inner `marker_size × marker_size` bits.
    ///
    /// Bits are stored in row-major order (`idx = y * marker_size + x`) with **black = 1**.
    pub codes: Cow<'static, [u64]>,
}

impl Dictionary {
    /// Total number of inner bits per marker.
    #[inline]
    pub fn bit_count(&self) -> usize {
        self.marker_size * self.marker_size
    }

    /// Number of distinct ids.
    #[inline]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Code for `id`, if the id exists.
    pub fn code(&self, id: u32) -> Option<u64> {
        self.codes.get(id as usize).copied()
    }

    /// Check the table is usable by the matcher.
    pub fn validate(&self) -> Result<(), DictionaryError> {
        let bits = self.bit_count();
        if bits > 64 {
            return Err(DictionaryError::TooManyBits {
                marker_size: self.marker_size,
                bits,
            });
        }
        if self.codes.is_empty() {
            return Err(DictionaryError::Empty(self.name.to_string()));
        }
        if bits < 64 {
            for (index, &code) in self.codes.iter().enumerate() {
                if code >> bits != 0 {
                    return Err(DictionaryError::CodeOutOfRange { index, code, bits });
                }
            }
        }
        Ok(())
    }

    /// Load a dictionary from a JSON file and validate it.
    ///
    /// Expected layout: `{"name": .., "marker_size": 4, "max_correction_bits": 1, "codes": [..]}`.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, DictionaryError> {
        let raw = fs::read_to_string(path)?;
        let dict: Self = serde_json::from_str(&raw)?;
        dict.validate()?;
        Ok(dict)
    }

    /// Write this dictionary to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), DictionaryError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::DICT_4X4_50;

    #[test]
    fn json_round_trip_owns_codes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("dict.json");
        DICT_4X4_50.write_json(&path).expect("write");
        let loaded = Dictionary::load_json(&path).expect("load");
        assert_eq!(loaded, DICT_4X4_50);
        assert!(matches!(loaded.codes, Cow::Owned(_)));
    }

    #[test]
    fn oversized_codes_are_rejected() {
        let dict = Dictionary {
            name: Cow::Borrowed("broken"),
            marker_size: 4,
            max_correction_bits: 0,
            codes: Cow::Owned(vec![0x1_0000]),
        };
        assert!(matches!(
            dict.validate(),
            Err(DictionaryError::CodeOutOfRange { index: 0, .. })
        ));
    }
}
