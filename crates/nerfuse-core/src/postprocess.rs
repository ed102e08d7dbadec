//! Passes applied to decoded splits: lower-casing and language-specific
//! re-tokenization.

use crate::dataset::{DatasetSplit, Splits};
use crate::error::{NerfuseError, Result};
use crate::label::LabelVocab;

/// Language-specific re-tokenizer.
///
/// Receives a decoded sentence with its canonical label strings and returns
/// a new tokenization with one label per new token.
pub trait Retokenizer {
    fn retokenize(&self, tokens: &[String], labels: &[&str]) -> Result<(Vec<String>, Vec<String>)>;
}

/// Lower-cases every token of every split. Labels are not touched.
pub fn lowercase_splits(splits: Splits) -> Splits {
    splits
        .into_iter()
        .map(|(name, split)| (name, split.lowercased()))
        .collect()
}

/// Rebuilds every split through `retokenizer`.
///
/// # Errors
///
/// Returns `NerfuseError::MalformedRecord` when the re-tokenizer returns
/// tokens and labels of different lengths or a label missing from `vocab`.
pub fn retokenize_splits(
    splits: Splits,
    vocab: &LabelVocab,
    retokenizer: &dyn Retokenizer,
) -> Result<Splits> {
    splits
        .into_iter()
        .map(|(name, split)| {
            let mut rebuilt = DatasetSplit {
                data: Vec::with_capacity(split.len()),
                label: Vec::with_capacity(split.len()),
                date: split.date,
            };
            for (tokens, ids) in split.data.iter().zip(&split.label) {
                let labels = ids
                    .iter()
                    .map(|&id| {
                        vocab.label(id).ok_or_else(|| {
                            NerfuseError::MalformedRecord(format!("label id {id} not in vocabulary"))
                        })
                    })
                    .collect::<Result<Vec<&str>>>()?;

                let (new_tokens, new_labels) = retokenizer.retokenize(tokens, &labels)?;
                if new_tokens.len() != new_labels.len() {
                    return Err(NerfuseError::MalformedRecord(format!(
                        "re-tokenizer returned {} tokens and {} labels",
                        new_tokens.len(),
                        new_labels.len()
                    )));
                }
                let new_ids = new_labels
                    .iter()
                    .map(|label| {
                        vocab.get(label).ok_or_else(|| {
                            NerfuseError::MalformedRecord(format!(
                                "re-tokenizer produced label {label:?} outside the vocabulary"
                            ))
                        })
                    })
                    .collect::<Result<Vec<usize>>>()?;

                rebuilt.data.push(new_tokens);
                rebuilt.label.push(new_ids);
            }
            Ok((name, rebuilt))
        })
        .collect()
}
