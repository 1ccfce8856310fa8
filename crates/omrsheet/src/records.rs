//! Persistence-boundary records.
//!
//! Answer keys and attempts arrive as loosely typed JSON (string item numbers,
//! letter strings, nullable answers). These records mirror that shape and are
//! validated into the typed scoring core before any analysis runs.

use std::collections::BTreeMap;

use crate::choice::Choice;
use crate::scoring::{AnswerKey, Attempt, Responses};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("invalid item number '{0}'")]
    InvalidItemNumber(String),
    #[error("item {item}: '{value}' is not a single answer letter")]
    InvalidLetter { item: u32, value: String },
    #[error("item {item}: choice {choice} exceeds {num_choices} choices")]
    ChoiceOutOfRange {
        item: u32,
        choice: Choice,
        num_choices: u8,
    },
    #[error("item {item} outside 1..={total_items}")]
    ItemOutOfRange { item: u32, total_items: u32 },
    #[error("invalid record: {0}")]
    InvalidShape(String),
}

/// Stored answer key: `{ total_questions, num_choices, answers: { "1": "A" | null } }`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AnswerKeyRecord {
    pub total_questions: u32,
    pub num_choices: u8,
    #[serde(default)]
    pub answers: BTreeMap<String, Option<String>>,
}

/// Stored attempt: `{ answers: { "1": "B" }, score?, total_items? }`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AttemptRecord {
    #[serde(default)]
    pub answers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_items: Option<u32>,
}

fn parse_item(raw: &str) -> Result<u32, RecordError> {
    raw.trim()
        .parse::<u32>()
        .ok()
        .filter(|&item| item >= 1)
        .ok_or_else(|| RecordError::InvalidItemNumber(raw.to_string()))
}

fn parse_letter(item: u32, raw: &str) -> Result<Choice, RecordError> {
    let mut chars = raw.trim().chars();
    let choice = match (chars.next(), chars.next()) {
        (Some(c), None) => Choice::from_letter(c),
        _ => None,
    };
    choice.ok_or_else(|| RecordError::InvalidLetter {
        item,
        value: raw.to_string(),
    })
}

impl TryFrom<AnswerKeyRecord> for AnswerKey {
    type Error = RecordError;

    fn try_from(record: AnswerKeyRecord) -> Result<Self, Self::Error> {
        let mut answers = BTreeMap::new();
        for (raw_item, raw_answer) in &record.answers {
            let item = parse_item(raw_item)?;
            // blank strings are unset answers
            let answer = match raw_answer.as_deref().map(str::trim) {
                None | Some("") => None,
                Some(letter) => Some(parse_letter(item, letter)?),
            };
            answers.insert(item, answer);
        }
        AnswerKey::new(record.total_questions, record.num_choices, &answers)
    }
}

impl From<&AnswerKey> for AnswerKeyRecord {
    fn from(key: &AnswerKey) -> Self {
        Self {
            total_questions: key.total_items(),
            num_choices: key.num_choices(),
            answers: key
                .iter()
                .map(|(item, c)| (item.to_string(), c.map(|c| c.to_string())))
                .collect(),
        }
    }
}

impl AttemptRecord {
    /// Validate against `key` and regrade. A stored score that disagrees with
    /// the regraded one is logged and replaced.
    pub fn into_attempt(self, key: &AnswerKey) -> Result<Attempt, RecordError> {
        let mut responses = Responses::new();
        for (raw_item, raw_letter) in &self.answers {
            let item = parse_item(raw_item)?;
            if item > key.total_items() {
                return Err(RecordError::ItemOutOfRange {
                    item,
                    total_items: key.total_items(),
                });
            }
            if raw_letter.trim().is_empty() {
                continue;
            }
            let choice = parse_letter(item, raw_letter)?;
            if choice.index() >= key.num_choices() as usize {
                return Err(RecordError::ChoiceOutOfRange {
                    item,
                    choice,
                    num_choices: key.num_choices(),
                });
            }
            responses.insert(item, choice);
        }

        let attempt = Attempt::grade(responses, key);
        if let Some(stored) = self.score {
            if stored != attempt.score {
                tracing::warn!(stored, regraded = attempt.score, "stored attempt score disagrees with key");
            }
        }
        if let Some(stored_total) = self.total_items {
            if stored_total != attempt.total_items {
                tracing::warn!(
                    stored_total,
                    key_total = attempt.total_items,
                    "stored attempt total disagrees with key"
                );
            }
        }
        Ok(attempt)
    }
}

impl From<&Attempt> for AttemptRecord {
    fn from(attempt: &Attempt) -> Self {
        Self {
            answers: attempt
                .responses
                .iter()
                .map(|(item, c)| (item.to_string(), c.to_string()))
                .collect(),
            score: Some(attempt.score),
            total_items: Some(attempt.total_items),
        }
    }
}
