//! # File Decoder
//!
//! Turns one line-oriented token/tag file into sentences and label-id
//! sequences, growing (or consulting) a shared [`LabelVocab`].

use std::collections::{BTreeSet, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::debug;

use crate::dataset::DatasetSplit;
use crate::error::{NerfuseError, Result};
use crate::label::tag::OUTSIDE;
use crate::label::{LabelSpace, LabelVocab};

/// Line opening a new document in CoNLL files.
const DOCSTART: &str = "-DOCSTART-";
/// MultiCoNER sentence header.
const HEADER_PREFIX: &str = "# id ";
/// Tag marking a line to throw away.
const JUNK_TAG: &str = "junk";
/// Placeholder column in MultiCoNER (`token _ _ tag`).
const PLACEHOLDER: &str = "_";

/// Dialect and label policy for decoding a file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Tag is the first column instead of the last.
    pub entity_first: bool,
    /// Recompute `B-`/`I-` prefixes from mention continuity.
    pub to_bio: bool,
    /// Keep mentions missing from the synonym table as their own category.
    pub allow_new_entity: bool,
    /// Never grow the vocabulary; unknown labels become `O`.
    pub fix_label_dict: bool,
    /// Use raw tags verbatim instead of canonical labels.
    pub keep_original_surface: bool,
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity_first(mut self, enabled: bool) -> Self {
        self.entity_first = enabled;
        self
    }

    pub fn with_to_bio(mut self, enabled: bool) -> Self {
        self.to_bio = enabled;
        self
    }

    pub fn with_allow_new_entity(mut self, enabled: bool) -> Self {
        self.allow_new_entity = enabled;
        self
    }

    pub fn with_fix_label_dict(mut self, enabled: bool) -> Self {
        self.fix_label_dict = enabled;
        self
    }

    pub fn with_keep_original_surface(mut self, enabled: bool) -> Self {
        self.keep_original_surface = enabled;
        self
    }
}

/// One decoded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFile {
    pub split: DatasetSplit,
    /// Vocabulary labels not assigned to any token of this file.
    pub unseen: BTreeSet<String>,
}

/// Decoder for annotated token/tag files.
pub struct FileDecoder<'a> {
    space: &'a LabelSpace,
    options: DecodeOptions,
    re_created_at: Regex,
}

/// Sentence being accumulated, plus the BIO-repair state.
struct SentenceState {
    tokens: Vec<String>,
    labels: Vec<usize>,
    previous_mention: String,
}

impl SentenceState {
    fn new() -> Self {
        Self {
            tokens: Vec::new(),
            labels: Vec::new(),
            previous_mention: OUTSIDE.to_string(),
        }
    }

    /// Moves the open sentence into `out` if it has any token.
    fn close(&mut self, out: &mut DatasetSplit, source: &Path, line: usize) -> Result<()> {
        self.previous_mention = OUTSIDE.to_string();
        if self.tokens.is_empty() {
            return Ok(());
        }
        if self.tokens.len() != self.labels.len() {
            return Err(NerfuseError::SentenceLengthMismatch {
                path: source.to_path_buf(),
                line,
                tokens: self.tokens.len(),
                labels: self.labels.len(),
            });
        }
        out.data.push(std::mem::take(&mut self.tokens));
        out.label.push(std::mem::take(&mut self.labels));
        Ok(())
    }
}

impl<'a> FileDecoder<'a> {
    /// Constructs a decoder over `space`.
    ///
    /// # Errors
    ///
    /// Returns `NerfuseError::RegexError` if the metadata pattern fails to
    /// compile (should never happen with the static pattern defined here).
    pub fn new(space: &'a LabelSpace, options: DecodeOptions) -> Result<Self> {
        Ok(Self {
            space,
            options,
            re_created_at: Regex::new(r#""created_at":\s*(?:"([^"]*)"|([^,}\s]+))"#)?,
        })
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Decodes `file_name`, resolved against `base_dir` when given.
    ///
    /// # Errors
    ///
    /// Returns `NerfuseError::MissingFile` if the file does not exist, and
    /// any error of [`FileDecoder::decode_reader`].
    pub fn decode_file(
        &self,
        file_name: impl AsRef<Path>,
        base_dir: Option<&Path>,
        vocab: &mut LabelVocab,
    ) -> Result<DecodedFile> {
        let path: PathBuf = match base_dir {
            Some(dir) => dir.join(file_name),
            None => file_name.as_ref().to_path_buf(),
        };
        if !path.exists() {
            return Err(NerfuseError::MissingFile { path });
        }
        let file = File::open(&path).map_err(|e| NerfuseError::io(&path, e))?;
        self.decode_reader(BufReader::new(file), &path, vocab)
    }

    /// Decodes annotated lines from `reader`; `source` only names the input
    /// in errors and logs.
    ///
    /// # Errors
    ///
    /// Returns `NerfuseError::SentenceLengthMismatch` or
    /// `NerfuseError::DateCountMismatch` on malformed input, and
    /// `NerfuseError::MissingOutsideLabel` if a frozen vocabulary without
    /// `O` must coerce a label.
    ///
    /// A metadata line whose sentence ends up empty (every token a stop
    /// word or junk) still counts as a date, so the whole file fails with
    /// `DateCountMismatch`.
    pub fn decode_reader<R: BufRead>(
        &self,
        reader: R,
        source: &Path,
        vocab: &mut LabelVocab,
    ) -> Result<DecodedFile> {
        let mut split = DatasetSplit::new();
        let mut dates = Vec::new();
        let mut state = SentenceState::new();
        let mut line_no = 0;

        for line in reader.lines() {
            line_no += 1;
            let line = line.map_err(|e| NerfuseError::io(source, e))?;
            let line = line.trim();

            if line.starts_with(HEADER_PREFIX) {
                continue;
            }

            if line.starts_with("# \"id\":") {
                dates.push(self.extract_date(line));
                continue;
            }

            if line.is_empty() || line.starts_with(DOCSTART) {
                state.close(&mut split, source, line_no)?;
                continue;
            }

            self.decode_line(line, &mut state, vocab)?;
        }
        state.close(&mut split, source, line_no)?;

        if !dates.is_empty() {
            if dates.len() != split.len() {
                return Err(NerfuseError::DateCountMismatch {
                    path: source.to_path_buf(),
                    dates: dates.len(),
                    sentences: split.len(),
                });
            }
            split.date = Some(dates);
        }

        let used: HashSet<usize> = split.label.iter().flatten().copied().collect();
        let unseen = vocab.unseen(&used);

        debug!(
            source = %source.display(),
            sentences = split.len(),
            tokens = split.token_count(),
            vocab = vocab.len(),
            "decoded file"
        );

        Ok(DecodedFile { split, unseen })
    }

    /// Handles one token line: column split, filters, label resolution.
    fn decode_line(
        &self,
        line: &str,
        state: &mut SentenceState,
        vocab: &mut LabelVocab,
    ) -> Result<()> {
        let columns: Vec<&str> = line
            .split_whitespace()
            .filter(|c| *c != PLACEHOLDER)
            .collect();
        // Unlabeled lines (e.g. test files without gold tags)
        if columns.len() < 2 {
            return Ok(());
        }

        let (tag, words) = if self.options.entity_first {
            (columns[0], &columns[1..])
        } else {
            (columns[columns.len() - 1], &columns[..columns.len() - 1])
        };
        if tag == JUNK_TAG {
            return Ok(());
        }
        let token = words.join(" ");
        if self.space.is_stopword(&token) {
            return Ok(());
        }

        let canonical = if self.options.keep_original_surface {
            self.space.passthrough(tag)
        } else {
            self.space.canonicalize(
                tag,
                &state.previous_mention,
                self.options.to_bio,
                self.options.allow_new_entity,
            )
        };
        let id = vocab.assign(&canonical.tag, self.options.fix_label_dict)?;

        state.previous_mention = canonical.mention;
        state.tokens.push(token);
        state.labels.push(id);
        Ok(())
    }

    fn extract_date(&self, line: &str) -> String {
        match self.re_created_at.captures(line) {
            Some(c) => c
                .get(1)
                .or_else(|| c.get(2))
                .map_or_else(String::new, |m| m.as_str().trim().to_string()),
            None => line.replace('"', ""),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn decode(
        text: &str,
        options: DecodeOptions,
        vocab: &mut LabelVocab,
    ) -> Result<DecodedFile> {
        let space = LabelSpace::default();
        let decoder = FileDecoder::new(&space, options)?;
        decoder.decode_reader(Cursor::new(text), Path::new("test.txt"), vocab)
    }

    fn tokens(file: &DecodedFile) -> Vec<Vec<&str>> {
        file.split
            .data
            .iter()
            .map(|s| s.iter().map(String::as_str).collect())
            .collect()
    }

    #[test]
    fn test_basic_sentences() {
        let text = "-DOCSTART- -X- O O\n\nEU B-ORG\nrejects O\n\nPeter B-PER\nBlackburn I-PER\n";
        let mut vocab = LabelVocab::new();
        let file = decode(text, DecodeOptions::new(), &mut vocab).unwrap();

        assert_eq!(tokens(&file), vec![vec!["EU", "rejects"], vec!["Peter", "Blackburn"]]);
        assert_eq!(file.split.label, vec![vec![0, 1], vec![2, 3]]);
        assert_eq!(
            vocab.iter().map(|(l, _)| l).collect::<Vec<_>>(),
            vec!["B-organization", "O", "B-person", "I-person"]
        );
        assert!(file.unseen.is_empty());
        assert!(file.split.validate().is_ok());
    }

    #[test]
    fn test_multi_column_token_joined() {
        let text = "New York B-LOC\n";
        let mut vocab = LabelVocab::new();
        let file = decode(text, DecodeOptions::new(), &mut vocab).unwrap();
        assert_eq!(tokens(&file), vec![vec!["New York"]]);
    }

    #[test]
    fn test_entity_first() {
        let text = "B-Actor steve\nI-Actor mcqueen\nO movies\n";
        let mut vocab = LabelVocab::new();
        let options = DecodeOptions::new().with_entity_first(true);
        let file = decode(text, options, &mut vocab).unwrap();
        assert_eq!(tokens(&file), vec![vec!["steve", "mcqueen", "movies"]]);
        assert_eq!(vocab.label(file.split.label[0][1]), Some("I-actor"));
    }

    #[test]
    fn test_skips_junk_stopwords_placeholders_and_unlabeled() {
        let text = "# id 1234\nfoo _ _ O\nNone O\n# O\nbar junk\nlonely\nbaz B-LOC\n";
        let mut vocab = LabelVocab::new();
        let file = decode(text, DecodeOptions::new(), &mut vocab).unwrap();
        assert_eq!(tokens(&file), vec![vec!["foo", "baz"]]);
        assert_eq!(file.split.label[0].len(), 2);
    }

    #[test]
    fn test_metadata_dates() {
        let text = "# \"id\": \"1\", \"created_at\": \"2020-01-01\"\na O\n\n# \"id\": \"2\", \"created_at\": \"2020-02-02\"\nb O\n";
        let mut vocab = LabelVocab::new();
        let file = decode(text, DecodeOptions::new(), &mut vocab).unwrap();
        assert_eq!(
            file.split.date,
            Some(vec!["2020-01-01".to_string(), "2020-02-02".to_string()])
        );
    }

    #[test]
    fn test_date_count_mismatch() {
        let text = "# \"id\": \"1\", \"created_at\": \"2020-01-01\"\na O\n\nb O\n";
        let mut vocab = LabelVocab::new();
        let err = decode(text, DecodeOptions::new(), &mut vocab).unwrap_err();
        assert!(matches!(err, NerfuseError::DateCountMismatch { dates: 1, sentences: 2, .. }));
    }

    #[test]
    fn test_metadata_unquoted_date() {
        let text = "# \"id\": \"1\", \"created_at\": 1600000000, \"lang\": \"en\"\na O\n";
        let mut vocab = LabelVocab::new();
        let file = decode(text, DecodeOptions::new(), &mut vocab).unwrap();
        assert_eq!(file.split.date, Some(vec!["1600000000".to_string()]));
    }

    #[test]
    fn test_metadata_sentence_without_tokens() {
        let text = "# \"id\": \"1\", \"created_at\": \"2020-01-01\"\na O\n\n\
                    # \"id\": \"2\", \"created_at\": \"2020-02-02\"\nNone O\nb junk\n";
        let mut vocab = LabelVocab::new();
        let err = decode(text, DecodeOptions::new(), &mut vocab).unwrap_err();
        assert!(matches!(err, NerfuseError::DateCountMismatch { dates: 2, sentences: 1, .. }));
    }

    #[test]
    fn test_to_bio_repair() {
        let text = "a I-PER\nb I-PER\nc O\nd I-PER\n";
        let mut vocab = LabelVocab::new();
        let options = DecodeOptions::new().with_to_bio(true);
        let file = decode(text, options, &mut vocab).unwrap();
        let labels: Vec<&str> = file.split.label[0]
            .iter()
            .map(|&id| vocab.label(id).unwrap())
            .collect();
        assert_eq!(labels, vec!["B-person", "I-person", "O", "B-person"]);
    }

    #[test]
    fn test_to_bio_resets_at_sentence_boundary() {
        let text = "a I-PER\n\nb I-PER\n";
        let mut vocab = LabelVocab::new();
        let options = DecodeOptions::new().with_to_bio(true);
        let file = decode(text, options, &mut vocab).unwrap();
        assert_eq!(file.split.label, vec![vec![0], vec![0]]);
        assert_eq!(vocab.label(0), Some("B-person"));
    }

    #[test]
    fn test_frozen_vocab_unchanged() {
        let seed = LabelVocab::from_labels(["O", "B-location"]);
        let mut vocab = seed.clone();
        let options = DecodeOptions::new().with_fix_label_dict(true);
        let file = decode("a B-PER\nb B-LOC\n", options, &mut vocab).unwrap();
        assert_eq!(vocab, seed);
        assert_eq!(file.split.label, vec![vec![0, 1]]);
    }

    #[test]
    fn test_new_entity_policy() {
        let mut vocab = LabelVocab::new();
        let file = decode("a B-XYZ\n", DecodeOptions::new(), &mut vocab).unwrap();
        assert_eq!(vocab.label(file.split.label[0][0]), Some("O"));

        let mut vocab = LabelVocab::new();
        let options = DecodeOptions::new().with_allow_new_entity(true);
        decode("a B-XYZ\n", options, &mut vocab).unwrap();
        assert!(vocab.contains("B-XYZ"));
    }

    #[test]
    fn test_keep_original_surface() {
        let mut vocab = LabelVocab::new();
        let options = DecodeOptions::new().with_keep_original_surface(true);
        decode("a B-PER\nb I-ZZZ\n", options, &mut vocab).unwrap();
        assert!(vocab.contains("B-PER"));
        assert!(vocab.contains("I-ZZZ"));
        assert!(!vocab.contains("B-person"));
    }

    #[test]
    fn test_unseen_labels() {
        let mut vocab = LabelVocab::from_labels(["B-location", "B-person", "O"]);
        let file = decode("a B-LOC\nb O\n", DecodeOptions::new(), &mut vocab).unwrap();
        assert_eq!(file.unseen.into_iter().collect::<Vec<_>>(), vec!["B-person"]);
    }

    #[test]
    fn test_deterministic_vocab() {
        let text = "a B-PER\nb I-PER\n\nc B-MISC\nd O\n";
        let mut first = LabelVocab::new();
        let mut second = LabelVocab::new();
        decode(text, DecodeOptions::new(), &mut first).unwrap();
        decode(text, DecodeOptions::new(), &mut second).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_file() {
        let space = LabelSpace::default();
        let decoder = FileDecoder::new(&space, DecodeOptions::new()).unwrap();
        let mut vocab = LabelVocab::new();
        let err = decoder
            .decode_file("does-not-exist.txt", Some(Path::new("/nonexistent")), &mut vocab)
            .unwrap_err();
        assert!(matches!(err, NerfuseError::MissingFile { .. }));
    }
}
