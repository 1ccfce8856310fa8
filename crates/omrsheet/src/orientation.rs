//! Orientation hypotheses and reading quality.
//!
//! Corner detection labels points by image quadrant, not by their role on the
//! printed page. Each [`Orientation`] reassigns the detected points to page
//! corners; the pipeline evaluates all of them and keeps the best reading.

use crate::config::OrientationConfig;
use crate::corners::CornerSet;
use crate::reader::ItemResult;

/// How the printed page sits in the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Identity,
    Rotate180,
    Rotate90Cw,
    Rotate90Ccw,
    MirrorHorizontal,
    MirrorVertical,
    Transpose,
    AntiTranspose,
}

impl Orientation {
    /// Evaluation order; earlier entries win quality ties.
    pub const ALL: [Orientation; 8] = [
        Orientation::Identity,
        Orientation::Rotate180,
        Orientation::Rotate90Cw,
        Orientation::Rotate90Ccw,
        Orientation::MirrorHorizontal,
        Orientation::MirrorVertical,
        Orientation::Transpose,
        Orientation::AntiTranspose,
    ];

    /// Page corners `(TL, TR, BL, BR)` taken from image-quadrant corners `detected`.
    pub fn apply(self, detected: &CornerSet) -> CornerSet {
        let CornerSet {
            top_left: tl,
            top_right: tr,
            bottom_left: bl,
            bottom_right: br,
        } = *detected;
        let [a, b, c, d] = match self {
            Self::Identity => [tl, tr, bl, br],
            Self::Rotate180 => [br, bl, tr, tl],
            Self::Rotate90Cw => [tr, br, tl, bl],
            Self::Rotate90Ccw => [bl, tl, br, tr],
            Self::MirrorHorizontal => [tr, tl, br, bl],
            Self::MirrorVertical => [bl, br, tl, tr],
            Self::Transpose => [tl, bl, tr, br],
            Self::AntiTranspose => [br, tr, bl, tl],
        };
        CornerSet::new(a, b, c, d)
    }
}

/// Per-item contribution to the hypothesis quality.
fn item_quality(item: &ItemResult, config: &OrientationConfig) -> f64 {
    let top = item.top_score() as f64;
    let gap = item.score_gap() as f64;
    let mut q = config.top_weight * top + config.gap_weight * gap;
    if top < config.low_top_score {
        q -= config.low_top_penalty;
    }
    if gap < config.small_gap {
        q -= config.small_gap_penalty;
    }
    q
}

/// Mean item quality; `None` for an empty reading.
pub fn reading_quality(items: &[ItemResult], config: &OrientationConfig) -> Option<f64> {
    if items.is_empty() {
        return None;
    }
    let sum: f64 = items.iter().map(|it| item_quality(it, config)).sum();
    Some(sum / items.len() as f64)
}
