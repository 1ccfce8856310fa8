use std::collections::BTreeMap;

use crate::choice::{Choice, MAX_CHOICE_LETTERS};
use crate::records::RecordError;
use crate::sheet_layout::SheetSpec;

/// Correct choice per item for one exam.
///
/// Items without a configured answer (`None`) never count as correct.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct AnswerKey {
    total_items: u32,
    num_choices: u8,
    /// Index = item - 1.
    answers: Vec<Option<Choice>>,
}

impl AnswerKey {
    /// Build a key; every listed item must be in `1..=total_items` and every
    /// answer within `num_choices`.
    pub fn new(
        total_items: u32,
        num_choices: u8,
        answers: &BTreeMap<u32, Option<Choice>>,
    ) -> Result<Self, RecordError> {
        if total_items == 0 {
            return Err(RecordError::InvalidShape("total_items must be >= 1".into()));
        }
        if num_choices < 2 || num_choices > MAX_CHOICE_LETTERS {
            return Err(RecordError::InvalidShape(format!(
                "num_choices must be in [2, {MAX_CHOICE_LETTERS}], got {num_choices}"
            )));
        }
        let mut slots = vec![None; total_items as usize];
        for (&item, &answer) in answers {
            if item == 0 || item > total_items {
                return Err(RecordError::ItemOutOfRange { item, total_items });
            }
            if let Some(choice) = answer {
                if choice.index() >= num_choices as usize {
                    return Err(RecordError::ChoiceOutOfRange {
                        item,
                        choice,
                        num_choices,
                    });
                }
            }
            slots[(item - 1) as usize] = answer;
        }
        Ok(Self {
            total_items,
            num_choices,
            answers: slots,
        })
    }

    pub fn total_items(&self) -> u32 {
        self.total_items
    }

    pub fn num_choices(&self) -> u8 {
        self.num_choices
    }

    /// Correct choice for a 1-based item, if configured.
    pub fn correct(&self, item: u32) -> Option<Choice> {
        let idx = usize::try_from(item.checked_sub(1)?).ok()?;
        self.answers.get(idx).copied().flatten()
    }

    /// `(item, correct choice)` for every item `1..=total_items`.
    pub fn iter(&self) -> impl Iterator<Item = (u32, Option<Choice>)> + '_ {
        self.answers
            .iter()
            .enumerate()
            .map(|(i, a)| (i as u32 + 1, *a))
    }

    /// Sheet shape to scan with this key.
    pub fn sheet_spec(&self) -> SheetSpec {
        SheetSpec::new(self.total_items, self.num_choices)
    }
}
