//! Attempt scoring and item analysis.
//!
//! - [`score_responses`] / [`Attempt::grade`]: one paper against its key.
//! - [`compute_item_statistics`]: difficulty and discrimination per item.
//! - [`compute_exam_summary`]: exam-level aggregate; never fails on empty input.

mod answer_key;
mod attempt;
mod item_analysis;
mod summary;

pub use answer_key::AnswerKey;
pub use attempt::{score_responses, Attempt, Responses};
pub use item_analysis::{
    compute_item_statistics, discrimination_group_size, DifficultyBand, DiscriminationBand,
    ItemStatistic, DISCRIMINATION_GROUP_FRACTION,
};
pub use summary::{compute_exam_summary, ExamSummary, PASS_FRACTION};
