//! Answer choice identifiers.

use std::fmt;

/// Highest choice count any sheet may carry (`A`..=`Z`).
pub const MAX_CHOICE_LETTERS: u8 = 26;

/// A 0-based choice index within one item.
///
/// Serializes as its letter (`'A'` for index 0), which is the representation used
/// by answer keys and stored attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "char", into = "char")]
pub struct Choice(u8);

impl Choice {
    /// Create a choice from its 0-based index.
    pub fn new(index: u8) -> Option<Self> {
        (index < MAX_CHOICE_LETTERS).then_some(Self(index))
    }

    /// Parse an answer letter. Lowercase letters are accepted.
    pub fn from_letter(letter: char) -> Option<Self> {
        let upper = letter.to_ascii_uppercase();
        if upper.is_ascii_uppercase() {
            Some(Self(upper as u8 - b'A'))
        } else {
            None
        }
    }

    /// 0-based index of this choice.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Answer letter of this choice.
    pub fn letter(self) -> char {
        (b'A' + self.0) as char
    }

    /// Iterate over the first `num_choices` choices in order.
    pub fn all(num_choices: u8) -> impl Iterator<Item = Choice> {
        (0..num_choices.min(MAX_CHOICE_LETTERS)).map(Choice)
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl TryFrom<char> for Choice {
    type Error = String;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        Self::from_letter(value).ok_or_else(|| format!("'{value}' is not an answer letter"))
    }
}

impl From<Choice> for char {
    fn from(value: Choice) -> Self {
        value.letter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_map_to_indices() {
        assert_eq!(Choice::from_letter('A').map(Choice::index), Some(0));
        assert_eq!(Choice::from_letter('e').map(Choice::index), Some(4));
        assert_eq!(Choice::from_letter('?'), None);
        assert_eq!(Choice::new(2).map(Choice::letter), Some('C'));
        assert_eq!(Choice::new(26), None);
    }

    #[test]
    fn serializes_as_letter() {
        let c = Choice::new(1).unwrap();
        assert_eq!(serde_json::to_string(&c).unwrap(), "\"B\"");
        let back: Choice = serde_json::from_str("\"d\"").unwrap();
        assert_eq!(back.index(), 3);
        assert!(serde_json::from_str::<Choice>("\"7\"").is_err());
    }
}
