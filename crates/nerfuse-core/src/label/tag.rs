//! # BIO / IOB Tags
//!
//! Splitting raw tag strings into prefix and mention, and conversion
//! between the IOB1 and IOB2 (BIO) tagging conventions.

use std::fmt;

/// The outside tag shared by every tagging convention.
pub const OUTSIDE: &str = "O";

/// Position of a token inside an entity span.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TagPrefix {
    /// `B-`: first token of a span.
    Begin,
    /// `I-`: continuation of a span.
    Inside,
    /// Any other prefix (`E-`, `S-`, ...), kept verbatim.
    Other(String),
}

impl TagPrefix {
    fn parse(prefix: &str) -> Self {
        match prefix {
            "B" => TagPrefix::Begin,
            "I" => TagPrefix::Inside,
            other => TagPrefix::Other(other.to_string()),
        }
    }
}

impl fmt::Display for TagPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagPrefix::Begin => write!(f, "B"),
            TagPrefix::Inside => write!(f, "I"),
            TagPrefix::Other(p) => write!(f, "{p}"),
        }
    }
}

/// A tag read from a corpus file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RawTag<'a> {
    /// `O`
    Outside,
    /// `<PREFIX>-<MENTION>`
    Entity {
        prefix: TagPrefix,
        mention: &'a str,
    },
}

impl<'a> RawTag<'a> {
    /// Splits a tag at its first `-`.
    ///
    /// A tag without a separator is read as a `B-` tag whose mention is the
    /// whole string.
    ///
    /// # Examples
    /// ```
    /// use nerfuse_core::label::tag::{RawTag, TagPrefix};
    ///
    /// let tag = RawTag::parse("I-work-of-art");
    /// assert_eq!(tag.mention(), "work-of-art");
    /// assert_eq!(tag.prefix(), Some(&TagPrefix::Inside));
    /// ```
    pub fn parse(tag: &'a str) -> Self {
        if tag == OUTSIDE {
            return RawTag::Outside;
        }
        match tag.split_once('-') {
            Some((prefix, mention)) => RawTag::Entity {
                prefix: TagPrefix::parse(prefix),
                mention,
            },
            None => RawTag::Entity {
                prefix: TagPrefix::Begin,
                mention: tag,
            },
        }
    }

    /// The mention (entity type) of the tag; `O` for the outside tag.
    pub fn mention(&self) -> &'a str {
        match self {
            RawTag::Outside => OUTSIDE,
            RawTag::Entity { mention, .. } => mention,
        }
    }

    pub fn prefix(&self) -> Option<&TagPrefix> {
        match self {
            RawTag::Outside => None,
            RawTag::Entity { prefix, .. } => Some(prefix),
        }
    }
}

/// Joins a prefix and a mention into a tag string.
pub fn join_tag(prefix: &TagPrefix, mention: &str) -> String {
    format!("{prefix}-{mention}")
}

/// Converts IOB1 tags (where `B-` only separates two adjacent spans of the
/// same type) into IOB2 tags (where every span starts with `B-`).
pub fn iob1_to_iob2<S: AsRef<str>>(tags: &[S]) -> Vec<String> {
    let mut out = Vec::with_capacity(tags.len());
    let mut previous = OUTSIDE;

    for tag in tags {
        let tag = tag.as_ref();
        let converted = match RawTag::parse(tag) {
            RawTag::Entity {
                prefix: TagPrefix::Inside,
                mention,
            } if RawTag::parse(previous).mention() != mention => {
                join_tag(&TagPrefix::Begin, mention)
            }
            _ => tag.to_string(),
        };
        out.push(converted);
        previous = tag;
    }

    out
}

/// Converts IOB2 tags into IOB1: a `B-` survives only when it directly
/// follows a token of the same type.
pub fn iob2_to_iob1<S: AsRef<str>>(tags: &[S]) -> Vec<String> {
    let mut out = Vec::with_capacity(tags.len());
    let mut previous = OUTSIDE;

    for tag in tags {
        let tag = tag.as_ref();
        let converted = match RawTag::parse(tag) {
            RawTag::Entity {
                prefix: TagPrefix::Begin,
                mention,
            } if RawTag::parse(previous).mention() != mention => {
                join_tag(&TagPrefix::Inside, mention)
            }
            _ => tag.to_string(),
        };
        out.push(converted);
        previous = tag;
    }

    out
}

/// An entity span over token indices, `end` exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub mention: String,
    pub start: usize,
    pub end: usize,
}

/// Extracts the maximal entity spans of an IOB2 tag sequence.
///
/// An `I-` tag that does not continue a span of the same type opens a new
/// span, so IOB1 input is handled as well.
pub fn extract_spans<S: AsRef<str>>(tags: &[S]) -> Vec<Span> {
    let mut spans: Vec<Span> = Vec::new();
    let mut open: Option<Span> = None;

    for (i, tag) in tags.iter().enumerate() {
        match RawTag::parse(tag.as_ref()) {
            RawTag::Outside => {
                spans.extend(open.take());
            }
            RawTag::Entity { prefix, mention } => {
                let continues = prefix != TagPrefix::Begin
                    && open.as_ref().is_some_and(|s| s.mention == mention);
                if continues {
                    if let Some(span) = open.as_mut() {
                        span.end = i + 1;
                    }
                } else {
                    spans.extend(open.take());
                    open = Some(Span {
                        mention: mention.to_string(),
                        start: i,
                        end: i + 1,
                    });
                }
            }
        }
    }
    spans.extend(open);

    spans
}
