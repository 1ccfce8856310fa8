//! Optical mark recognition for printed multiple-choice answer sheets.
//!
//! The scan pipeline stages are:
//!
//! 1. **Acquire** – decode a capture into an RGBA raster.
//! 2. **Blur gate** – reject unusably soft images before any geometry.
//! 3. **Corners** – locate the four printed corner squares by connected components.
//! 4. **Orientation search** – for each corner reassignment: four-point homography,
//!    perspective warp onto a canonical canvas (1 px per layout unit), bubble
//!    reading, quality score. The best hypothesis wins.
//! 5. **Bubbles** – local-contrast fill scores with a small center search; per-item
//!    tri-state decision (marked / ambiguous / unmarked).
//!
//! Downstream, [`scoring`] grades attempts against an [`AnswerKey`] and computes
//! item difficulty/discrimination and exam summaries over a batch of attempts.
//!
//! # Public API
//! - [`Scanner`] as the primary entry point, with [`SheetLayout`] as the shared
//!   geometric contract and [`ScanConfig`] for tuning
//! - [`render_sheet`] to rasterize a printable (optionally pre-marked) sheet
//! - [`CornerLocator`] to plug in a different corner finder

mod acquire;
mod api;
mod choice;
mod config;
mod corners;
mod error;
mod homography;
mod orientation;
mod pipeline;
mod raster;
mod reader;
pub mod records;
pub mod scoring;
mod sharpness;
mod sheet_layout;
mod sheet_render;
mod warp;

#[cfg(test)]
pub(crate) mod test_utils;

pub use acquire::{decode_image, load_image, AcquireError};
pub use api::Scanner;
pub use choice::{Choice, MAX_CHOICE_LETTERS};
pub use config::{
    BubbleReadConfig, ConfigError, CornerDetectConfig, OrientationConfig, ScanConfig,
    SharpnessConfig,
};
pub use corners::{CornerLocator, CornerPosition, CornerSet, QuadrantCornerLocator};
pub use error::ScanError;
pub use homography::{estimate_homography, homography_project, invert_homography, HomographyError};
pub use orientation::{reading_quality, Orientation};
pub use pipeline::{HypothesisScore, ScanResult};
pub use raster::{luma_plane, luminance, LumaPlane};
pub use reader::{bubble_fill_score, read_bubbles, ItemReading, ItemResult};
pub use records::{AnswerKeyRecord, AttemptRecord, RecordError};
pub use scoring::{AnswerKey, Attempt, ExamSummary, ItemStatistic, Responses};
pub use sharpness::{is_sharp_enough, measure_sharpness};
pub use sheet_layout::{LayoutError, SheetLayout, SheetSpec};
pub use sheet_render::{render_sheet, PencilMark};
pub use warp::{warp_perspective, warp_to_canvas, BLANK_PIXEL};
