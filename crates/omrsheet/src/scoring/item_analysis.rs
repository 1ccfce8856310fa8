//! Classical item analysis over a batch of attempts.
//!
//! Statistics are always recomputed from the full attempt set.

use std::collections::BTreeMap;

use super::{AnswerKey, Attempt};
use crate::choice::Choice;

/// Fraction of attempts in each of the upper and lower score groups.
pub const DISCRIMINATION_GROUP_FRACTION: f64 = 0.27;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyBand {
    /// Fewer than 30% answered correctly.
    Hard,
    Moderate,
    /// More than 70% answered correctly.
    Easy,
}

impl DifficultyBand {
    pub fn from_index(p: f64) -> Self {
        if p < 0.3 {
            Self::Hard
        } else if p <= 0.7 {
            Self::Moderate
        } else {
            Self::Easy
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscriminationBand {
    /// Low scorers answer correctly more often than high scorers.
    Negative,
    Poor,
    Acceptable,
    Good,
    Excellent,
}

impl DiscriminationBand {
    pub fn from_index(d: f64) -> Self {
        if d < 0.0 {
            Self::Negative
        } else if d < 0.2 {
            Self::Poor
        } else if d < 0.3 {
            Self::Acceptable
        } else if d < 0.4 {
            Self::Good
        } else {
            Self::Excellent
        }
    }
}

/// Statistics of one item across all attempts.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ItemStatistic {
    pub item: u32,
    pub correct_choice: Option<Choice>,
    /// Proportion of attempts answering correctly, in `[0, 1]`.
    pub difficulty_index: f64,
    /// Upper-group minus lower-group correct rate, in `[-1, 1]`.
    pub discrimination_index: f64,
    /// Times each choice was picked; every key choice is present.
    pub choice_counts: BTreeMap<Choice, u32>,
    /// Attempts with no response for this item.
    pub omitted: u32,
    /// Attempts counted.
    pub total_responses: u32,
    pub difficulty_band: DifficultyBand,
    pub discrimination_band: DiscriminationBand,
}

/// Size of each discrimination group: 27% of `n`, at least 1.
pub fn discrimination_group_size(n: usize) -> usize {
    ((n as f64 * DISCRIMINATION_GROUP_FRACTION).floor() as usize).max(1)
}

fn correct_rate(group: &[&Attempt], item: u32, correct: Choice) -> f64 {
    if group.is_empty() {
        return 0.0;
    }
    let hits = group
        .iter()
        .filter(|a| a.response(item) == Some(correct))
        .count();
    hits as f64 / group.len() as f64
}

/// Per-item statistics for items `1..=key.total_items()`.
///
/// Upper and lower groups come from attempts sorted by descending score; the
/// sort is stable, so ties keep input order.
pub fn compute_item_statistics(attempts: &[Attempt], key: &AnswerKey) -> Vec<ItemStatistic> {
    let n = attempts.len();
    let mut ranked: Vec<&Attempt> = attempts.iter().collect();
    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    let g = discrimination_group_size(n).min(n);
    let upper = &ranked[..g];
    let lower = &ranked[n - g..];

    key.iter()
        .map(|(item, correct_choice)| {
            let mut choice_counts: BTreeMap<Choice, u32> =
                Choice::all(key.num_choices()).map(|c| (c, 0)).collect();
            let mut omitted = 0u32;
            let mut correct = 0u32;
            for attempt in attempts {
                match attempt.response(item) {
                    Some(choice) => {
                        *choice_counts.entry(choice).or_insert(0) += 1;
                        if Some(choice) == correct_choice {
                            correct += 1;
                        }
                    }
                    None => omitted += 1,
                }
            }

            let (difficulty_index, discrimination_index) = match correct_choice {
                Some(c) if n > 0 => (
                    correct as f64 / n as f64,
                    correct_rate(upper, item, c) - correct_rate(lower, item, c),
                ),
                _ => (0.0, 0.0),
            };

            ItemStatistic {
                item,
                correct_choice,
                difficulty_index,
                discrimination_index,
                choice_counts,
                omitted,
                total_responses: n as u32,
                difficulty_band: DifficultyBand::from_index(difficulty_index),
                discrimination_band: DiscriminationBand::from_index(discrimination_index),
            }
        })
        .collect()
}
