//! Build configuration: custom dataset descriptions and pipeline options.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dataset::SplitName;
use crate::error::{NerfuseError, Result};
use crate::label::LabelVocab;

/// Environment variable overriding the default cache directory.
pub const CACHE_DIR_ENV: &str = "NERFUSE_CACHE_DIR";

/// Default cache directory: `<platform cache dir>/nerfuse`.
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("nerfuse")
}

/// A user-supplied dataset: one file per split plus an optional language.
///
/// ```json
/// {"train": "data/train.txt", "valid": "data/dev.txt", "language": "de"}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomDataset {
    #[serde(default)]
    pub train: Option<PathBuf>,
    #[serde(default)]
    pub valid: Option<PathBuf>,
    #[serde(default)]
    pub test: Option<PathBuf>,
    #[serde(default)]
    pub language: Option<String>,
}

impl CustomDataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_split(mut self, split: SplitName, path: impl Into<PathBuf>) -> Self {
        let path = Some(path.into());
        match split {
            SplitName::Train => self.train = path,
            SplitName::Valid => self.valid = path,
            SplitName::Test => self.test = path,
        }
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Parses a description from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| NerfuseError::InvalidConfig(format!("custom dataset: {e}")))
    }

    /// Loads a description from a JSON file. Relative split paths are
    /// resolved against the file's directory.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| NerfuseError::io(path, e))?;
        let mut dataset = Self::from_json(&json)?;
        if let Some(base) = path.parent() {
            for slot in [&mut dataset.train, &mut dataset.valid, &mut dataset.test] {
                if let Some(file) = slot.as_mut() {
                    if file.is_relative() {
                        *file = base.join(&*file);
                    }
                }
            }
        }
        Ok(dataset)
    }

    /// Split files in train, valid, test order.
    pub fn files(&self) -> Vec<(SplitName, PathBuf)> {
        SplitName::ALL
            .into_iter()
            .zip([&self.train, &self.valid, &self.test])
            .filter_map(|(split, path)| path.clone().map(|p| (split, p)))
            .collect()
    }

    /// Checks that at least one split is given and every file exists.
    ///
    /// # Errors
    ///
    /// Returns `NerfuseError::InvalidConfig` when no split is given and
    /// `NerfuseError::MissingFile` for the first file that does not exist.
    pub fn validate(&self) -> Result<()> {
        let files = self.files();
        if files.is_empty() {
            return Err(NerfuseError::InvalidConfig(
                "custom dataset names no split file".to_string(),
            ));
        }
        match files.into_iter().find(|(_, path)| !path.exists()) {
            Some((_, path)) => Err(NerfuseError::MissingFile { path }),
            None => Ok(()),
        }
    }
}

/// What to build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetRequest {
    /// One or more preset names, merged when more than one.
    Presets(Vec<String>),
    /// A custom dataset.
    Custom(CustomDataset),
}

/// Options of a dataset build.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Vocabulary to start from.
    pub label_to_id: Option<LabelVocab>,
    /// Never grow the vocabulary.
    pub fix_label_dict: bool,
    /// Lower-case every token after decoding.
    pub lower_case: bool,
    /// Keep raw tags instead of canonical labels.
    pub keep_original_surface: bool,
    /// Keep mentions missing from the synonym table as their own category.
    pub allow_new_entity: bool,
    /// Where preset datasets are cached.
    pub cache_dir: PathBuf,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            label_to_id: None,
            fix_label_dict: false,
            lower_case: false,
            keep_original_surface: false,
            allow_new_entity: true,
            cache_dir: default_cache_dir(),
        }
    }
}

impl BuildOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_label_to_id(mut self, vocab: LabelVocab) -> Self {
        self.label_to_id = Some(vocab);
        self
    }

    pub fn with_fix_label_dict(mut self, enabled: bool) -> Self {
        self.fix_label_dict = enabled;
        self
    }

    pub fn with_lower_case(mut self, enabled: bool) -> Self {
        self.lower_case = enabled;
        self
    }

    pub fn with_keep_original_surface(mut self, enabled: bool) -> Self {
        self.keep_original_surface = enabled;
        self
    }

    pub fn with_allow_new_entity(mut self, enabled: bool) -> Self {
        self.allow_new_entity = enabled;
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }
}
