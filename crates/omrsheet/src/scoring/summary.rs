use std::collections::BTreeMap;

use super::{Attempt, ItemStatistic};

/// Attempts scoring at least this fraction of the total items pass.
pub const PASS_FRACTION: f64 = 0.5;

/// Exam-level aggregate over all attempts.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct ExamSummary {
    pub total_attempts: u32,
    pub total_items: u32,
    pub mean_score: f64,
    pub median_score: f64,
    /// Population standard deviation of the scores.
    pub std_dev: f64,
    pub min_score: u32,
    pub max_score: u32,
    pub pass_count: u32,
    pub pass_rate: f64,
    /// Score → number of attempts with that score.
    pub histogram: BTreeMap<u32, u32>,
    /// Mean difficulty index over keyed items only; 0 when no item is keyed.
    pub mean_difficulty: f64,
    /// Mean discrimination index over keyed items only.
    pub mean_discrimination: f64,
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 {
        return 0.0;
    }
    sum / n as f64
}

fn median(sorted: &[u32]) -> f64 {
    match sorted.len() {
        0 => 0.0,
        n if n % 2 == 1 => sorted[n / 2] as f64,
        n => (sorted[n / 2 - 1] as f64 + sorted[n / 2] as f64) * 0.5,
    }
}

/// Summarize `attempts`; zero attempts produce an all-zero summary.
pub fn compute_exam_summary(
    attempts: &[Attempt],
    statistics: &[ItemStatistic],
    total_items: u32,
) -> ExamSummary {
    let mut scores: Vec<u32> = attempts.iter().map(|a| a.score).collect();
    scores.sort_unstable();

    let n = scores.len();
    let mean_score = mean(scores.iter().map(|&s| s as f64));
    let std_dev = if n == 0 {
        0.0
    } else {
        mean(scores.iter().map(|&s| (s as f64 - mean_score).powi(2))).sqrt()
    };

    let cutoff = PASS_FRACTION * total_items as f64;
    let pass_count = scores.iter().filter(|&&s| s as f64 >= cutoff).count() as u32;
    let pass_rate = if n == 0 {
        0.0
    } else {
        pass_count as f64 / n as f64
    };

    let mut histogram = BTreeMap::new();
    for &s in &scores {
        *histogram.entry(s).or_insert(0u32) += 1;
    }

    let keyed: Vec<&ItemStatistic> = statistics
        .iter()
        .filter(|s| s.correct_choice.is_some())
        .collect();

    ExamSummary {
        total_attempts: n as u32,
        total_items,
        mean_score,
        median_score: median(&scores),
        std_dev,
        min_score: scores.first().copied().unwrap_or(0),
        max_score: scores.last().copied().unwrap_or(0),
        pass_count,
        pass_rate,
        histogram,
        mean_difficulty: mean(keyed.iter().map(|s| s.difficulty_index)),
        mean_discrimination: mean(keyed.iter().map(|s| s.discrimination_index)),
    }
}
