//! Bubble reader.
//!
//! Reads every expected bubble of a rectified canvas at its layout position and
//! turns the per-choice fill scores into a tri-state item reading.

mod decision;
mod sampling;

use image::RgbaImage;

use crate::choice::Choice;
use crate::config::BubbleReadConfig;
use crate::raster::luma_plane;
use crate::sheet_layout::{SheetLayout, SheetSpec};

use sampling::BubbleSampler;

/// Outcome for one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "status", content = "choice", rename_all = "snake_case")]
pub enum ItemReading {
    /// One clearly filled bubble.
    Marked(Choice),
    /// Multiple or smudged marks; needs a human decision.
    Ambiguous,
    /// No bubble is filled enough.
    Unmarked,
}

impl ItemReading {
    pub fn choice(&self) -> Option<Choice> {
        match self {
            Self::Marked(c) => Some(*c),
            Self::Ambiguous | Self::Unmarked => None,
        }
    }
}

/// Reading and raw fill scores of one item.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ItemResult {
    /// 1-based item number.
    pub item: u32,
    pub reading: ItemReading,
    /// Fill score per choice, index = choice index.
    pub scores: Vec<f32>,
}

impl ItemResult {
    /// Highest fill score of the item.
    pub fn top_score(&self) -> f32 {
        decision::top_two(&self.scores).map_or(0.0, |(_, top, _)| top)
    }

    /// Gap between the highest and second-highest fill score.
    pub fn score_gap(&self) -> f32 {
        decision::top_two(&self.scores).map_or(0.0, |(_, top, second)| top - second)
    }

    pub fn score(&self, choice: Choice) -> Option<f32> {
        self.scores.get(choice.index()).copied()
    }
}

/// Read all items of `sheet` from a canonical canvas.
pub fn read_bubbles(
    canvas: &RgbaImage,
    layout: &SheetLayout,
    sheet: &SheetSpec,
    config: &BubbleReadConfig,
) -> Vec<ItemResult> {
    let luma = luma_plane(canvas);
    let sampler = BubbleSampler::new(&luma, layout.bubble_radius, config);
    let fill_threshold = config.fill_threshold.unwrap_or(layout.fill_threshold);

    sheet
        .items()
        .map(|item| {
            let scores: Vec<f32> = Choice::all(sheet.num_choices)
                .map(|choice| {
                    layout
                        .bubble_center(item, choice)
                        .map_or(0.0, |center| sampler.fill_score(center))
                })
                .collect();
            let reading = decision::classify(&scores, fill_threshold, config);
            ItemResult {
                item,
                reading,
                scores,
            }
        })
        .collect()
}

/// Fill score of a single bubble centered at `center` on `canvas`.
pub fn bubble_fill_score(
    canvas: &RgbaImage,
    center: [f64; 2],
    bubble_radius: f64,
    config: &BubbleReadConfig,
) -> f32 {
    let luma = luma_plane(canvas);
    BubbleSampler::new(&luma, bubble_radius, config).fill_score(center)
}
