//! Merging several aggregated datasets into one training split.

use std::collections::BTreeSet;

use tracing::warn;

use crate::aggregate::{AggregatedDataset, intersect_into};
use crate::dataset::{DatasetSplit, SplitName, Splits};

/// Default language of datasets that do not declare one.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Most frequent language, one vote per dataset. Ties go to the language
/// encountered first.
///
/// # Examples
/// ```
/// use nerfuse_core::merge::majority_language;
///
/// assert_eq!(majority_language(&["ja", "en", "en"]), Some("en".to_string()));
/// assert_eq!(majority_language(&["ja", "en"]), Some("ja".to_string()));
/// ```
pub fn majority_language<S: AsRef<str>>(languages: &[S]) -> Option<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for language in languages {
        let language = language.as_ref();
        match counts.iter_mut().find(|(l, _)| *l == language) {
            Some((_, n)) => *n += 1,
            None => counts.push((language, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (language, n) in counts {
        if best.is_none_or(|(_, top)| n > top) {
            best = Some((language, n));
        }
    }
    best.map(|(language, _)| language.to_string())
}

/// A dataset ready to be merged: its splits and its language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedDataset {
    pub name: String,
    pub language: String,
    pub dataset: AggregatedDataset,
}

/// Result of merging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedDataset {
    pub splits: Splits,
    pub language: String,
    pub unseen: BTreeSet<String>,
}

/// Combines datasets decoded against one shared vocabulary.
///
/// A single dataset is returned with all its splits. Several datasets are
/// reduced to one `train` split concatenated in argument order; their
/// other splits are dropped. Unseen labels are intersected and the language
/// is chosen by [`majority_language`].
pub fn merge_datasets(datasets: Vec<NamedDataset>) -> MergedDataset {
    let languages: Vec<&str> = datasets.iter().map(|d| d.language.as_str()).collect();
    let language =
        majority_language(&languages).unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

    let mut unseen = None;
    let splits = if datasets.len() == 1 {
        let only = datasets.into_iter().next().map(|d| d.dataset).unwrap_or_default();
        unseen = Some(only.unseen);
        only.splits
    } else {
        let mut train = DatasetSplit::new();
        for NamedDataset { name, dataset, .. } in datasets {
            intersect_into(&mut unseen, dataset.unseen);
            let mut splits = dataset.splits;
            match splits.remove(&SplitName::Train) {
                Some(split) => train.extend(split),
                None => warn!("dataset {name} has no train split; nothing merged from it"),
            }
        }
        Splits::from([(SplitName::Train, train)])
    };

    MergedDataset {
        splits,
        language,
        unseen: unseen.unwrap_or_default(),
    }
}
