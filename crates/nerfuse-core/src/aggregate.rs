//! Multi-file aggregation: decodes every split of one dataset against a
//! single vocabulary.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::dataset::{SplitName, Splits};
use crate::decode::FileDecoder;
use crate::error::Result;
use crate::label::LabelVocab;

/// All splits of one dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregatedDataset {
    pub splits: Splits,
    /// Labels unseen in every decoded split.
    pub unseen: BTreeSet<String>,
}

/// Intersects `next` into an optional running set; `None` means no set yet.
pub(crate) fn intersect_into(acc: &mut Option<BTreeSet<String>>, next: BTreeSet<String>) {
    *acc = Some(match acc.take() {
        None => next,
        Some(current) => current.intersection(&next).cloned().collect(),
    });
}

/// Decodes `files` in order, threading `vocab` through every call so ids
/// stay consistent across splits.
///
/// # Errors
///
/// Propagates the first decoding error; nothing is returned for the
/// splits decoded before it.
pub fn decode_all_files(
    decoder: &FileDecoder<'_>,
    files: &[(SplitName, PathBuf)],
    base_dir: Option<&Path>,
    vocab: &mut LabelVocab,
) -> Result<AggregatedDataset> {
    let mut splits = Splits::new();
    let mut unseen = None;

    for (name, file) in files {
        let decoded = decoder.decode_file(file, base_dir, vocab)?;
        match base_dir {
            Some(dir) => info!(
                "dataset {}/{} ({name}): {} entries",
                dir.display(),
                file.display(),
                decoded.split.len()
            ),
            None => info!(
                "dataset {} ({name}): {} entries",
                file.display(),
                decoded.split.len()
            ),
        }
        intersect_into(&mut unseen, decoded.unseen);
        splits.insert(*name, decoded.split);
    }

    Ok(AggregatedDataset {
        splits,
        unseen: unseen.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::DecodeOptions;
    use crate::label::LabelSpace;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        PathBuf::from(name)
    }

    #[test]
    fn test_vocab_threaded_across_splits() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![
            (SplitName::Train, write(dir.path(), "train.txt", "a B-PER\nb O\n")),
            (SplitName::Valid, write(dir.path(), "dev.txt", "c B-LOC\nd B-PER\n")),
        ];

        let space = LabelSpace::default();
        let decoder = FileDecoder::new(&space, DecodeOptions::new()).unwrap();
        let mut vocab = LabelVocab::new();
        let dataset = decode_all_files(&decoder, &files, Some(dir.path()), &mut vocab).unwrap();

        assert_eq!(dataset.splits.len(), 2);
        assert_eq!(dataset.splits[&SplitName::Train].label, vec![vec![0, 1]]);
        assert_eq!(dataset.splits[&SplitName::Valid].label, vec![vec![2, 0]]);
        // train used every label known at the time, valid left "O" unused
        assert!(dataset.unseen.is_empty());
    }

    #[test]
    fn test_unseen_intersection() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![
            (SplitName::Train, write(dir.path(), "train.txt", "a O\n")),
            (SplitName::Test, write(dir.path(), "test.txt", "b B-LOC\n")),
        ];

        let space = LabelSpace::default();
        let decoder = FileDecoder::new(&space, DecodeOptions::new()).unwrap();
        let mut vocab = LabelVocab::from_labels(["O", "B-location", "B-person"]);
        let dataset = decode_all_files(&decoder, &files, Some(dir.path()), &mut vocab).unwrap();

        assert_eq!(dataset.unseen.into_iter().collect::<Vec<_>>(), vec!["B-person"]);
    }

    #[test]
    fn test_missing_split_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![(SplitName::Train, PathBuf::from("missing.txt"))];
        let space = LabelSpace::default();
        let decoder = FileDecoder::new(&space, DecodeOptions::new()).unwrap();
        let mut vocab = LabelVocab::new();
        assert!(decode_all_files(&decoder, &files, Some(dir.path()), &mut vocab).is_err());
    }

    #[test]
    fn test_intersect_into() {
        let mut acc = None;
        intersect_into(&mut acc, ["a", "b"].iter().map(|s| s.to_string()).collect());
        intersect_into(&mut acc, ["b", "c"].iter().map(|s| s.to_string()).collect());
        assert_eq!(acc.unwrap().into_iter().collect::<Vec<_>>(), vec!["b"]);
    }
}
