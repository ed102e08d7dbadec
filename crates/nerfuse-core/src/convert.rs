//! # Format Converter
//!
//! Writes parallel token/tag matrices as the two-column `token tag` format
//! read by the decoder, and turns PubTator corpora into such matrices.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{NerfuseError, Result};
use crate::label::tag::{OUTSIDE, TagPrefix, join_tag};

/// Parallel token and tag matrices, one row per sentence (or packed row).
pub type Sequences = (Vec<Vec<String>>, Vec<Vec<String>>);

fn read_matrix(path: &Path) -> Result<Vec<Vec<String>>> {
    let content = std::fs::read_to_string(path).map_err(|e| NerfuseError::io(path, e))?;
    Ok(content
        .lines()
        .map(|line| line.split_whitespace().map(str::to_string).collect())
        .collect())
}

/// Writes `token tag` lines with a blank line after every row.
///
/// With `sentence_division`, a blank line also follows every token equal to
/// it, and a row ending on such a token gets no second blank line. Rows
/// empty on both sides are skipped.
///
/// # Errors
///
/// Returns `NerfuseError::PairLengthMismatch` if the matrices differ in
/// outer length or in the length of any row; nothing is written in that
/// case.
pub fn write_conll<W, S, T>(
    writer: &mut W,
    tokens: &[Vec<S>],
    tags: &[Vec<T>],
    sentence_division: Option<&str>,
) -> Result<()>
where
    W: Write,
    S: AsRef<str>,
    T: AsRef<str>,
{
    if tokens.len() != tags.len() {
        return Err(NerfuseError::PairLengthMismatch {
            row: None,
            tokens: tokens.len(),
            tags: tags.len(),
        });
    }
    for (row, (token_row, tag_row)) in tokens.iter().zip(tags).enumerate() {
        if token_row.len() != tag_row.len() {
            return Err(NerfuseError::PairLengthMismatch {
                row: Some(row),
                tokens: token_row.len(),
                tags: tag_row.len(),
            });
        }
    }

    let io_err = |e| NerfuseError::io("<conll output>", e);
    for (token_row, tag_row) in tokens.iter().zip(tags) {
        if token_row.is_empty() {
            continue;
        }
        let mut ended = false;
        for (token, tag) in token_row.iter().zip(tag_row) {
            let token = token.as_ref();
            writeln!(writer, "{} {}", token, tag.as_ref()).map_err(io_err)?;
            ended = sentence_division == Some(token);
            if ended {
                writeln!(writer).map_err(io_err)?;
            }
        }
        if !ended {
            writeln!(writer).map_err(io_err)?;
        }
    }
    Ok(())
}

/// Writes in-memory sequences to `output_file` (see [`write_conll`]).
pub fn conll_format_sequences<S, T>(
    output_file: impl AsRef<Path>,
    tokens: &[Vec<S>],
    tags: &[Vec<T>],
    sentence_division: Option<&str>,
) -> Result<()>
where
    S: AsRef<str>,
    T: AsRef<str>,
{
    let output_file = output_file.as_ref();
    let mut buffer = Vec::new();
    write_conll(&mut buffer, tokens, tags, sentence_division)?;

    let file = File::create(output_file).map_err(|e| NerfuseError::io(output_file, e))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(&buffer)
        .and_then(|_| writer.flush())
        .map_err(|e| NerfuseError::io(output_file, e))?;
    debug!(output = %output_file.display(), rows = tokens.len(), "wrote conll file");
    Ok(())
}

/// Converts a token file and a tag file (one row per line, columns separated
/// by whitespace) into one two-column file.
pub fn conll_format_files(
    file_token: impl AsRef<Path>,
    file_tag: impl AsRef<Path>,
    output_file: impl AsRef<Path>,
    sentence_division: Option<&str>,
) -> Result<()> {
    let tokens = read_matrix(file_token.as_ref())?;
    let tags = read_matrix(file_tag.as_ref())?;
    conll_format_sequences(output_file, &tokens, &tags, sentence_division)
}

/// Splits text at word/non-word boundaries, drops spaces inside each piece,
/// and discards empty pieces.
fn split_word_boundaries(text: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut current_is_word = None;

    for c in text.chars() {
        let is_word = c.is_alphanumeric() || c == '_';
        if current_is_word.is_some_and(|w| w != is_word) {
            pieces.push(std::mem::take(&mut current));
        }
        current_is_word = Some(is_word);
        current.push(c);
    }
    pieces.push(current);

    pieces
        .into_iter()
        .map(|p| p.replace(' ', ""))
        .filter(|p| !p.is_empty())
        .collect()
}

fn push_outside(segment: &[char], tokens: &mut Vec<String>, tags: &mut Vec<String>) {
    for piece in split_word_boundaries(&segment.iter().collect::<String>()) {
        tokens.push(piece);
        tags.push(OUTSIDE.to_string());
    }
}

/// Converts one PubTator record (title line, abstract line, annotation
/// lines) into tokens and BIO tags.
fn pubtator_record(record: &str) -> Result<(Vec<String>, Vec<String>)> {
    let mut lines = record.lines();
    let (Some(title), Some(body)) = (lines.next(), lines.next()) else {
        return Err(NerfuseError::MalformedRecord(format!(
            "pubtator record without title and abstract: {record:?}"
        )));
    };
    let title = title.rsplit("|t|").next().unwrap_or_default();
    let body = body.rsplit("|a|").next().unwrap_or_default();
    let text: Vec<char> = format!("{title} {body}").chars().collect();

    let mut tokens = Vec::new();
    let mut tags = Vec::new();
    let mut last_end = 0;

    for annotation in lines {
        let fields: Vec<&str> = annotation.split('\t').collect();
        if fields.len() < 5 {
            continue;
        }
        let (Ok(start), Ok(end)) = (fields[1].parse::<usize>(), fields[2].parse::<usize>()) else {
            continue;
        };
        let (mention, entity_type) = (fields[3], fields[4]);

        if start < last_end || end < start || end > text.len() {
            warn!(start, end, mention, "skipping overlapping or out-of-range annotation");
            continue;
        }
        let surface: String = text[start..end].iter().collect();
        if surface != mention {
            return Err(NerfuseError::MalformedRecord(format!(
                "annotation {mention:?} does not match text {surface:?} at {start}..{end}"
            )));
        }

        push_outside(&text[last_end..start], &mut tokens, &mut tags);
        last_end = end;

        for (i, word) in mention.split(' ').enumerate() {
            let prefix = if i == 0 {
                TagPrefix::Begin
            } else {
                TagPrefix::Inside
            };
            tokens.push(word.to_string());
            tags.push(join_tag(&prefix, entity_type));
        }
    }
    push_outside(&text[last_end..], &mut tokens, &mut tags);

    Ok((tokens, tags))
}

/// Converts a PubTator corpus into parallel token/tag sequences, one row per
/// document.
///
/// Text after the last annotation of a document is kept as `O` tokens
/// rather than dropped.
///
/// # Errors
///
/// Returns `NerfuseError::MalformedRecord` when a record lacks its title or
/// abstract line or an annotation does not match the text at its offsets.
pub fn pubtator_to_sequences(content: &str) -> Result<Sequences> {
    let mut tokens = Vec::new();
    let mut tags = Vec::new();
    for record in content.split("\n\n").filter(|r| !r.trim().is_empty()) {
        let (t, g) = pubtator_record(record.trim_start_matches('\n'))?;
        tokens.push(t);
        tags.push(g);
    }
    Ok((tokens, tags))
}
