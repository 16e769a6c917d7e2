//! Pairing detected tags into named stripe boundaries.

use nalgebra::Point2;
use sail_shape_aruco::Tag;
use serde::{Deserialize, Serialize};

/// One stripe: the tag at its luff end, the tag at its leech end, and its name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StripeSpec {
    pub start_id: u32,
    pub end_id: u32,
    pub name: String,
}

impl StripeSpec {
    pub fn new(start_id: u32, end_id: u32, name: impl Into<String>) -> Self {
        Self {
            start_id,
            end_id,
            name: name.into(),
        }
    }
}

/// Ordered list of stripes to look for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StripeLayout(pub Vec<StripeSpec>);

impl Default for StripeLayout {
    fn default() -> Self {
        Self(vec![
            StripeSpec::new(1, 2, "Bottom"),
            StripeSpec::new(3, 4, "Middle"),
            StripeSpec::new(5, 6, "Top"),
        ])
    }
}

impl StripeLayout {
    pub fn iter(&self) -> impl Iterator<Item = &StripeSpec> {
        self.0.iter()
    }
}

/// Which instance wins when an id was detected more than once.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// First in detector order.
    #[default]
    First,
    /// Highest border score, then fewest corrected bits.
    BestScore,
    /// Largest polygon area.
    LargestArea,
}

impl DuplicatePolicy {
    pub fn select<'a>(self, tags: &'a [Tag], id: u32) -> Option<&'a Tag> {
        let mut same = tags.iter().filter(|t| t.id == id);
        match self {
            Self::First => same.next(),
            Self::BestScore => same.reduce(|best, t| {
                let better = t.border_score > best.border_score
                    || (t.border_score == best.border_score && t.hamming < best.hamming);
                if better {
                    t
                } else {
                    best
                }
            }),
            Self::LargestArea => same.reduce(|best, t| if t.area > best.area { t } else { best }),
        }
    }
}

/// Corners of a located stripe's two tags.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StripeBoundary {
    pub name: String,
    pub start_id: u32,
    pub end_id: u32,
    pub start_corners: [Point2<f32>; 4],
    pub end_corners: [Point2<f32>; 4],
}

/// Locator output for one layout entry.
#[derive(Clone, Debug, PartialEq)]
pub enum Located {
    Found(StripeBoundary),
    Missing { name: String, missing_ids: Vec<u32> },
}

/// Resolve every layout entry against the detected tags, in layout order.
pub fn locate_stripes(tags: &[Tag], layout: &StripeLayout, policy: DuplicatePolicy) -> Vec<Located> {
    layout
        .iter()
        .map(|spec| {
            let start = policy.select(tags, spec.start_id);
            let end = policy.select(tags, spec.end_id);
            match (start, end) {
                (Some(s), Some(e)) => Located::Found(StripeBoundary {
                    name: spec.name.clone(),
                    start_id: spec.start_id,
                    end_id: spec.end_id,
                    start_corners: s.corners,
                    end_corners: e.corners,
                }),
                _ => {
                    let missing_ids = [(spec.start_id, start), (spec.end_id, end)]
                        .into_iter()
                        .filter(|(_, t)| t.is_none())
                        .map(|(id, _)| id)
                        .collect();
                    Located::Missing {
                        name: spec.name.clone(),
                        missing_ids,
                    }
                }
            }
        })
        .collect()
}
