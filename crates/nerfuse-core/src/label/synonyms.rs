//! # Shared Entity Vocabulary
//!
//! Maps corpus-specific mention strings (`PER`, `PSN`, `person`, ...) onto
//! one canonical category name shared by every corpus.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;

use crate::error::{NerfuseError, Result};

/// Built-in categories and their synonyms, in declaration order.
const SHARED_NER_LABEL: &[(&str, &[&str])] = &[
    ("location", &["LOCATION", "LOC", "location", "Location"]),
    ("organization", &["ORGANIZATION", "ORG", "organization"]),
    ("person", &["PERSON", "PSN", "person", "PER"]),
    ("date", &["DATE", "DAT", "YEAR", "Year"]),
    ("time", &["TIME", "TIM", "Hours"]),
    ("artifact", &["ARTIFACT", "ART", "artifact"]),
    ("percent", &["PERCENT", "PNT"]),
    ("other", &["OTHER", "MISC"]),
    ("money", &["MONEY", "MNY", "Price"]),
    // WNUT 2017
    ("corporation", &["corporation", "CORP"]),
    ("group", &["group", "NORP", "GRP"]),
    ("product", &["product", "PRODUCT", "PROD"]),
    // MIT restaurant
    ("rating", &["Rating", "RATING"]),
    ("amenity", &["Amenity"]),
    ("restaurant", &["Restaurant_Name"]),
    ("dish", &["Dish"]),
    ("cuisine", &["Cuisine"]),
    // MIT movie
    ("actor", &["ACTOR", "Actor"]),
    ("title", &["TITLE"]),
    ("genre", &["GENRE", "Genre"]),
    ("director", &["DIRECTOR", "Director"]),
    ("song", &["SONG"]),
    ("plot", &["PLOT", "Plot"]),
    ("review", &["REVIEW"]),
    ("character", &["CHARACTER"]),
    ("ratings average", &["RATINGS_AVERAGE"]),
    ("trailer", &["TRAILER"]),
    ("opinion", &["Opinion"]),
    ("award", &["Award"]),
    ("origin", &["Origin"]),
    ("soundtrack", &["Soundtrack"]),
    ("relationship", &["Relationship"]),
    ("character name", &["Character_Name"]),
    ("quote", &["Quote"]),
    // OntoNotes 5
    ("cardinal number", &["CARDINAL"]),
    ("ordinal number", &["ORDINAL"]),
    ("quantity", &["QUANTITY"]),
    ("law", &["LAW"]),
    ("geopolitical area", &["GPE"]),
    (
        "work of art",
        &["WORK_OF_ART", "work-of-art", "creative-work", "CW", "creative"],
    ),
    ("facility", &["FAC"]),
    ("language", &["LANGUAGE"]),
    ("event", &["EVENT"]),
    // BioNLP 2004
    ("dna", &["DNA"]),
    ("protein", &["protein"]),
    ("cell type", &["cell_type"]),
    ("cell line", &["cell_line"]),
    ("rna", &["RNA"]),
    // BC5CDR
    ("chemical", &["Chemical"]),
    ("disease", &["Disease"]),
];

/// Tokens dropped from every corpus.
pub const STOPWORDS: &[&str] = &["None", "#"];

/// An ordered synonym table.
///
/// When a mention is listed under more than one category, the category
/// declared first wins.
#[derive(Debug, Clone, Default)]
pub struct SynonymTable {
    categories: Vec<(String, Vec<String>)>,
    index: HashMap<String, usize>,
}

/// On-disk form: a list of `[category, [synonym, ...]]` pairs, so that
/// declaration order survives JSON.
#[derive(Debug, Deserialize)]
struct CategoryEntry(String, Vec<String>);

impl SynonymTable {
    /// An empty table: every mention is unknown.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in shared table covering all preset corpora.
    pub fn shared() -> Self {
        SHARED_NER_LABEL
            .iter()
            .fold(Self::new(), |table, (name, synonyms)| {
                table.with_category(*name, synonyms.iter().copied())
            })
    }

    /// Appends a category. Synonyms already claimed by an earlier category
    /// keep resolving to that earlier category.
    pub fn with_category<I, S>(mut self, name: impl Into<String>, synonyms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let position = self.categories.len();
        let synonyms: Vec<String> = synonyms.into_iter().map(Into::into).collect();
        for synonym in &synonyms {
            self.index.entry(synonym.clone()).or_insert(position);
        }
        self.categories.push((name.into(), synonyms));
        self
    }

    /// Parses a table from JSON of the form `[["location", ["LOC", "GPE"]], ...]`.
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<CategoryEntry> = serde_json::from_str(json)
            .map_err(|e| NerfuseError::InvalidConfig(format!("synonym table: {e}")))?;
        Ok(entries
            .into_iter()
            .fold(Self::new(), |table, CategoryEntry(name, synonyms)| {
                table.with_category(name, synonyms)
            }))
    }

    /// Loads a table from a JSON file (see [`SynonymTable::from_json`]).
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| NerfuseError::io(path, e))?;
        Self::from_json(&json)
    }

    /// Canonical category for a mention, if any.
    pub fn lookup(&self, mention: &str) -> Option<&str> {
        self.index
            .get(mention)
            .map(|&i| self.categories[i].0.as_str())
    }

    /// Mentions listed under more than one category, with every category
    /// that lists them in declaration order.
    pub fn ambiguous_mentions(&self) -> Vec<(String, Vec<String>)> {
        let mut seen = HashSet::new();
        let mut ambiguous = Vec::new();
        for (_, synonyms) in &self.categories {
            for synonym in synonyms {
                if !seen.insert(synonym.as_str()) {
                    continue;
                }
                let owners: Vec<String> = self
                    .categories
                    .iter()
                    .filter(|(_, s)| s.contains(synonym))
                    .map(|(name, _)| name.clone())
                    .collect();
                if owners.len() > 1 {
                    ambiguous.push((synonym.clone(), owners));
                }
            }
        }
        ambiguous
    }

    /// Category names in declaration order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_lookup() {
        let table = SynonymTable::shared();
        assert_eq!(table.lookup("PER"), Some("person"));
        assert_eq!(table.lookup("GPE"), Some("geopolitical area"));
        assert_eq!(table.lookup("Restaurant_Name"), Some("restaurant"));
        assert_eq!(table.lookup("per"), None);
        assert_eq!(table.len(), 50);
    }

    #[test]
    fn test_shared_table_is_unambiguous() {
        assert!(SynonymTable::shared().ambiguous_mentions().is_empty());
    }

    #[test]
    fn test_first_declared_category_wins() {
        let table = SynonymTable::new()
            .with_category("location", ["LOC", "GPE"])
            .with_category("geopolitical area", ["GPE"]);

        assert_eq!(table.lookup("GPE"), Some("location"));
        assert_eq!(
            table.ambiguous_mentions(),
            vec![(
                "GPE".to_string(),
                vec!["location".to_string(), "geopolitical area".to_string()]
            )]
        );
    }

    #[test]
    fn test_from_json_keeps_order() {
        let table =
            SynonymTable::from_json(r#"[["b", ["X"]], ["a", ["X", "Y"]]]"#).unwrap();
        assert_eq!(table.lookup("X"), Some("b"));
        assert_eq!(table.lookup("Y"), Some("a"));
        assert_eq!(table.categories().collect::<Vec<_>>(), vec!["b", "a"]);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let err = SynonymTable::from_json("{\"a\": 1}").unwrap_err();
        assert!(err.is_configuration());
    }
}
