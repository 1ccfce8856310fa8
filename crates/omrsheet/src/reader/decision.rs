use super::ItemReading;
use crate::choice::Choice;
use crate::config::BubbleReadConfig;

/// Index and score of the best choice plus the runner-up score.
pub(crate) fn top_two(scores: &[f32]) -> Option<(usize, f32, f32)> {
    let (best_idx, &best) = scores
        .iter()
        .enumerate()
        .fold(None, |acc: Option<(usize, &f32)>, (i, s)| match acc {
            Some((_, b)) if *b >= *s => acc,
            _ => Some((i, s)),
        })?;
    let second = scores
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != best_idx)
        .map(|(_, &s)| s)
        .fold(0.0f32, f32::max);
    Some((best_idx, best, second))
}

/// Accept the top choice only when it clears `fill_threshold` and is clearly
/// separated from the runner-up.
pub(crate) fn classify(scores: &[f32], fill_threshold: f32, config: &BubbleReadConfig) -> ItemReading {
    let Some((idx, top, second)) = top_two(scores) else {
        return ItemReading::Unmarked;
    };
    if top < fill_threshold {
        return ItemReading::Unmarked;
    }
    if top - second < config.min_score_gap || second > config.max_second_score {
        return ItemReading::Ambiguous;
    }
    u8::try_from(idx)
        .ok()
        .and_then(Choice::new)
        .map_or(ItemReading::Unmarked, ItemReading::Marked)
}
