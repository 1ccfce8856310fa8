use std::collections::BTreeMap;

use super::AnswerKey;
use crate::choice::Choice;

/// Sparse item → chosen choice map; omitted items are absent.
pub type Responses = BTreeMap<u32, Choice>;

/// Number of responses that match the key. Unanswered and unkeyed items never count.
pub fn score_responses(responses: &Responses, key: &AnswerKey) -> u32 {
    responses
        .iter()
        .filter(|&(&item, &choice)| key.correct(item) == Some(choice))
        .count() as u32
}

/// One graded paper.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Attempt {
    pub responses: Responses,
    pub score: u32,
    pub total_items: u32,
}

impl Attempt {
    /// Grade `responses` against `key`.
    pub fn grade(responses: Responses, key: &AnswerKey) -> Self {
        let score = score_responses(&responses, key);
        Self {
            responses,
            score,
            total_items: key.total_items(),
        }
    }

    pub fn response(&self, item: u32) -> Option<Choice> {
        self.responses.get(&item).copied()
    }

    /// Score as a fraction of the total items, 0 when the exam has no items.
    pub fn percentage(&self) -> f64 {
        if self.total_items == 0 {
            0.0
        } else {
            self.score as f64 / self.total_items as f64
        }
    }
}
