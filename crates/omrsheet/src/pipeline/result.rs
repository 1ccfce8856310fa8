use std::collections::BTreeMap;

use crate::choice::Choice;
use crate::corners::CornerSet;
use crate::orientation::Orientation;
use crate::reader::{ItemReading, ItemResult};
use crate::scoring::Responses;

/// Quality of one evaluated orientation hypothesis.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HypothesisScore {
    pub orientation: Orientation,
    /// Mean item quality, or `None` if the hypothesis was not computable.
    pub quality: Option<f64>,
}

/// Full scan result for a single image.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScanResult {
    /// Per-item readings and fill scores, in item order.
    pub items: Vec<ItemResult>,
    /// Page corners (source pixels) of the selected orientation.
    pub corners: CornerSet,
    /// `false` when corners were supplied by the caller.
    pub corners_auto_detected: bool,
    pub orientation: Orientation,
    /// Quality of the selected hypothesis.
    pub quality: f64,
    /// Every hypothesis that was evaluated, in evaluation order.
    pub hypotheses: Vec<HypothesisScore>,
    /// Measured sharpness of the source image.
    pub sharpness: f64,
    /// Source-to-canvas homography (3x3, row-major).
    pub homography: [[f64; 3]; 3],
    /// Canvas-to-source homography (3x3, row-major).
    pub homography_inverse: [[f64; 3]; 3],
    /// Source image dimensions [width, height].
    pub image_size: [u32; 2],
    /// Canonical canvas dimensions [width, height].
    pub canvas_size: [u32; 2],
}

impl ScanResult {
    pub fn item(&self, item: u32) -> Option<&ItemResult> {
        let idx = usize::try_from(item.checked_sub(1)?).ok()?;
        self.items.get(idx).filter(|it| it.item == item)
    }

    pub fn reading(&self, item: u32) -> Option<ItemReading> {
        self.item(item).map(|it| it.reading)
    }

    /// Fill score of `(item, choice)`.
    pub fn confidence(&self, item: u32, choice: Choice) -> Option<f32> {
        self.item(item)?.score(choice)
    }

    /// Item → accepted choice (`None` for ambiguous or unmarked).
    pub fn answers(&self) -> BTreeMap<u32, Option<Choice>> {
        self.items
            .iter()
            .map(|it| (it.item, it.reading.choice()))
            .collect()
    }

    /// Sparse response map for grading: only items with an accepted mark.
    pub fn responses(&self) -> Responses {
        self.items
            .iter()
            .filter_map(|it| it.reading.choice().map(|c| (it.item, c)))
            .collect()
    }

    /// Items that need a human decision.
    pub fn ambiguous_items(&self) -> Vec<u32> {
        self.items
            .iter()
            .filter(|it| it.reading == ItemReading::Ambiguous)
            .map(|it| it.item)
            .collect()
    }
}
