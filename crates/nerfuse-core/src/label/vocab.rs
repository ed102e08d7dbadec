//! Label-to-id vocabulary with dense ids in first-seen order.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{NerfuseError, Result};
use crate::label::tag::OUTSIDE;

/// A mapping from label string to a dense integer id.
///
/// Ids are assigned in first-seen order starting at 0 and never change once
/// assigned. Serializes as a JSON object in id order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "HashMap<String, usize>")]
pub struct LabelVocab {
    labels: Vec<String>,
    ids: HashMap<String, usize>,
}

impl LabelVocab {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a vocabulary whose ids follow the iteration order of `labels`.
    /// Duplicates keep their first id.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut vocab = Self::new();
        for label in labels {
            vocab.insert(label.into());
        }
        vocab
    }

    /// Loads a vocabulary from a JSON object `{"label": id, ...}`.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| NerfuseError::io(path, e))?;
        serde_json::from_str(&json)
            .map_err(|e| NerfuseError::InvalidConfig(format!("{}: {e}", path.display())))
    }

    fn insert(&mut self, label: String) -> usize {
        if let Some(&id) = self.ids.get(&label) {
            return id;
        }
        let id = self.labels.len();
        self.ids.insert(label.clone(), id);
        self.labels.push(label);
        id
    }

    /// Returns the id of `label`.
    ///
    /// Unknown labels are appended with the next id, unless `frozen`, in
    /// which case they are coerced to the id of `O`.
    ///
    /// # Errors
    ///
    /// Returns `NerfuseError::MissingOutsideLabel` when a frozen vocabulary
    /// has to coerce a label but has no `O` entry.
    pub fn assign(&mut self, label: &str, frozen: bool) -> Result<usize> {
        if let Some(&id) = self.ids.get(label) {
            return Ok(id);
        }
        if frozen {
            return self
                .get(OUTSIDE)
                .ok_or_else(|| NerfuseError::MissingOutsideLabel {
                    label: label.to_string(),
                });
        }
        Ok(self.insert(label.to_string()))
    }

    pub fn get(&self, label: &str) -> Option<usize> {
        self.ids.get(label).copied()
    }

    pub fn label(&self, id: usize) -> Option<&str> {
        self.labels.get(id).map(String::as_str)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.ids.contains_key(label)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// `(label, id)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.labels
            .iter()
            .enumerate()
            .map(|(id, label)| (label.as_str(), id))
    }

    /// Labels of the vocabulary whose id is not in `used`.
    pub fn unseen(&self, used: &HashSet<usize>) -> BTreeSet<String> {
        self.iter()
            .filter(|(_, id)| !used.contains(id))
            .map(|(label, _)| label.to_string())
            .collect()
    }
}

impl TryFrom<HashMap<String, usize>> for LabelVocab {
    type Error = String;

    fn try_from(map: HashMap<String, usize>) -> std::result::Result<Self, Self::Error> {
        let mut pairs: Vec<(String, usize)> = map.into_iter().collect();
        pairs.sort_by_key(|(_, id)| *id);
        for (expected, (label, id)) in pairs.iter().enumerate() {
            if *id != expected {
                return Err(format!(
                    "label ids must be dense from 0, found {label:?} with id {id} at position {expected}"
                ));
            }
        }
        Ok(Self::from_labels(pairs.into_iter().map(|(label, _)| label)))
    }
}

impl Serialize for LabelVocab {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (label, id) in self.iter() {
            map.serialize_entry(label, &id)?;
        }
        map.end()
    }
}
