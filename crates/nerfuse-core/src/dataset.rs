//! Decoded dataset types.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{NerfuseError, Result};
use crate::label::LabelVocab;

/// A named partition of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitName {
    Train,
    Valid,
    Test,
}

impl SplitName {
    pub const ALL: [SplitName; 3] = [SplitName::Train, SplitName::Valid, SplitName::Test];

    pub fn as_str(self) -> &'static str {
        match self {
            SplitName::Train => "train",
            SplitName::Valid => "valid",
            SplitName::Test => "test",
        }
    }
}

impl fmt::Display for SplitName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SplitName {
    type Err = NerfuseError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "train" => Ok(SplitName::Train),
            "valid" | "dev" => Ok(SplitName::Valid),
            "test" => Ok(SplitName::Test),
            other => Err(NerfuseError::InvalidConfig(format!(
                "unknown split name {other:?} (expected train, valid or test)"
            ))),
        }
    }
}

/// Sentences of one split with their parallel label ids.
///
/// `data[i]` and `label[i]` always have the same length; when present,
/// `date` has one entry per sentence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSplit {
    pub data: Vec<Vec<String>>,
    pub label: Vec<Vec<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<Vec<String>>,
}

impl DatasetSplit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sentences.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of tokens over all sentences.
    pub fn token_count(&self) -> usize {
        self.data.iter().map(Vec::len).sum()
    }

    /// Checks the positional invariants between data, label and date.
    pub fn validate(&self) -> Result<()> {
        if self.data.len() != self.label.len() {
            return Err(NerfuseError::PairLengthMismatch {
                row: None,
                tokens: self.data.len(),
                tags: self.label.len(),
            });
        }
        for (row, (tokens, labels)) in self.data.iter().zip(&self.label).enumerate() {
            if tokens.len() != labels.len() {
                return Err(NerfuseError::PairLengthMismatch {
                    row: Some(row),
                    tokens: tokens.len(),
                    tags: labels.len(),
                });
            }
        }
        match &self.date {
            Some(dates) if dates.len() != self.data.len() => {
                Err(NerfuseError::MalformedRecord(format!(
                    "{} dates for {} sentences",
                    dates.len(),
                    self.data.len()
                )))
            }
            _ => Ok(()),
        }
    }

    /// A copy with every token lower-cased; labels are untouched.
    #[must_use]
    pub fn lowercased(&self) -> Self {
        Self {
            data: self
                .data
                .iter()
                .map(|sentence| sentence.iter().map(|t| t.to_lowercase()).collect())
                .collect(),
            label: self.label.clone(),
            date: self.date.clone(),
        }
    }

    /// Appends another split. Dates survive only if both sides carry them.
    pub fn extend(&mut self, other: DatasetSplit) {
        let had_sentences = !self.is_empty();
        self.date = match (self.date.take(), other.date) {
            (Some(mut mine), Some(theirs)) => {
                mine.extend(theirs);
                Some(mine)
            }
            (None, Some(theirs)) if !had_sentences => Some(theirs),
            _ => None,
        };
        self.data.extend(other.data);
        self.label.extend(other.label);
    }
}

/// Split name to split, ordered train, valid, test.
pub type Splits = BTreeMap<SplitName, DatasetSplit>;

/// The output of a dataset build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuiltDataset {
    pub splits: Splits,
    pub label_to_id: LabelVocab,
    pub language: String,
    /// Labels of the vocabulary never assigned to any decoded token.
    pub unseen_labels: BTreeSet<String>,
}

impl BuiltDataset {
    pub fn split(&self, name: SplitName) -> Option<&DatasetSplit> {
        self.splits.get(&name)
    }

    /// Label strings of one sentence.
    pub fn labels_of(&self, split: SplitName, sentence: usize) -> Option<Vec<&str>> {
        let ids = self.splits.get(&split)?.label.get(sentence)?;
        ids.iter().map(|&id| self.label_to_id.label(id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(data: &[&[&str]], label: &[&[usize]]) -> DatasetSplit {
        DatasetSplit {
            data: data
                .iter()
                .map(|s| s.iter().map(|t| t.to_string()).collect())
                .collect(),
            label: label.iter().map(|l| l.to_vec()).collect(),
            date: None,
        }
    }

    #[test]
    fn test_split_name_roundtrip() {
        for name in SplitName::ALL {
            assert_eq!(name.as_str().parse::<SplitName>().unwrap(), name);
        }
        assert_eq!("dev".parse::<SplitName>().unwrap(), SplitName::Valid);
        assert!("tmp".parse::<SplitName>().is_err());
    }

    #[test]
    fn test_validate() {
        assert!(split(&[&["a", "b"]], &[&[0, 1]]).validate().is_ok());
        assert!(split(&[&["a", "b"]], &[&[0]]).validate().is_err());
        assert!(split(&[&["a"]], &[]).validate().is_err());

        let mut dated = split(&[&["a"]], &[&[0]]);
        dated.date = Some(vec![]);
        assert!(dated.validate().is_err());
    }

    #[test]
    fn test_lowercase_only_touches_tokens() {
        let original = split(&[&["NYC"]], &[&[3]]);
        let lowered = original.lowercased();
        assert_eq!(lowered.data, vec![vec!["nyc".to_string()]]);
        assert_eq!(lowered.label, original.label);
    }

    #[test]
    fn test_extend_drops_partial_dates() {
        let mut a = split(&[&["a"]], &[&[0]]);
        a.date = Some(vec!["2021".into()]);
        a.extend(split(&[&["b"]], &[&[1]]));
        assert_eq!(a.len(), 2);
        assert_eq!(a.date, None);

        let mut empty = DatasetSplit::new();
        let mut dated = split(&[&["c"]], &[&[0]]);
        dated.date = Some(vec!["2022".into()]);
        empty.extend(dated);
        assert_eq!(empty.date, Some(vec!["2022".to_string()]));
    }

    #[test]
    fn test_serialized_schema() {
        let json = serde_json::to_value(split(&[&["a"]], &[&[0]])).unwrap();
        assert_eq!(json, serde_json::json!({"data": [["a"]], "label": [[0]]}));

        let mut splits = Splits::new();
        splits.insert(SplitName::Valid, DatasetSplit::new());
        let json = serde_json::to_value(&splits).unwrap();
        assert!(json.get("valid").is_some());
    }
}
