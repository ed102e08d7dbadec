//! # Label Space
//!
//! Resolves raw corpus tags into canonical labels over an injected synonym
//! table and stop-word set.

use std::collections::HashSet;

use crate::label::synonyms::{STOPWORDS, SynonymTable};
use crate::label::tag::{OUTSIDE, RawTag, TagPrefix, join_tag};

/// Result of canonicalizing one raw tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canonical {
    /// The canonical tag, e.g. `B-person` or `O`.
    pub tag: String,
    /// The raw mention the tag was read with; the next token's
    /// `previous_mention`.
    pub mention: String,
}

impl Canonical {
    fn outside() -> Self {
        Self {
            tag: OUTSIDE.to_string(),
            mention: OUTSIDE.to_string(),
        }
    }
}

/// Canonical tag resolution shared by every file of a dataset build.
#[derive(Debug, Clone)]
pub struct LabelSpace {
    synonyms: SynonymTable,
    stopwords: HashSet<String>,
}

impl Default for LabelSpace {
    fn default() -> Self {
        Self::new(SynonymTable::shared())
    }
}

impl LabelSpace {
    /// A label space over `synonyms` with the default stop words.
    pub fn new(synonyms: SynonymTable) -> Self {
        Self {
            synonyms,
            stopwords: STOPWORDS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Replaces the stop-word set.
    pub fn with_stopwords<I, S>(mut self, stopwords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stopwords = stopwords.into_iter().map(Into::into).collect();
        self
    }

    pub fn synonyms(&self) -> &SynonymTable {
        &self.synonyms
    }

    /// Whether a token is dropped from decoded sentences.
    pub fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.contains(token)
    }

    /// Maps `raw_tag` into the shared label space.
    ///
    /// With `to_bio`, the prefix is recomputed: `I-` when the mention equals
    /// `previous_mention`, `B-` otherwise. Mentions missing from the synonym
    /// table are kept as their own category when `allow_new_entity`, and
    /// demoted to `O` otherwise.
    ///
    /// # Examples
    /// ```
    /// use nerfuse_core::label::LabelSpace;
    ///
    /// let space = LabelSpace::default();
    /// let first = space.canonicalize("I-PER", "O", true, false);
    /// assert_eq!(first.tag, "B-person");
    /// let second = space.canonicalize("I-PER", &first.mention, true, false);
    /// assert_eq!(second.tag, "I-person");
    /// ```
    pub fn canonicalize(
        &self,
        raw_tag: &str,
        previous_mention: &str,
        to_bio: bool,
        allow_new_entity: bool,
    ) -> Canonical {
        let (prefix, mention) = match RawTag::parse(raw_tag) {
            RawTag::Outside => return Canonical::outside(),
            RawTag::Entity { prefix, mention } => (prefix, mention),
        };

        let prefix = match (to_bio, mention == previous_mention) {
            (true, true) => TagPrefix::Inside,
            (true, false) => TagPrefix::Begin,
            (false, _) => prefix,
        };

        let tag = match self.synonyms.lookup(mention) {
            Some(category) => join_tag(&prefix, category),
            None if allow_new_entity => join_tag(&prefix, mention),
            None => OUTSIDE.to_string(),
        };

        Canonical {
            tag,
            mention: mention.to_string(),
        }
    }

    /// Pass-through variant: keeps the raw tag verbatim but still reports the
    /// mention for previous-mention tracking.
    pub fn passthrough(&self, raw_tag: &str) -> Canonical {
        Canonical {
            tag: raw_tag.to_string(),
            mention: RawTag::parse(raw_tag).mention().to_string(),
        }
    }
}
