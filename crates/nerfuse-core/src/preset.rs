//! # Preset Datasets
//!
//! Registry of the public corpora the pipeline knows how to lay out: their
//! split files, column dialect and language.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::dataset::SplitName;
use crate::error::{NerfuseError, Result};

/// WikiAnn (PAN-X) languages.
pub const PANX_LANGUAGES: &[&str] = &[
    "ace", "bg", "da", "fur", "ilo", "lij", "mzn", "qu", "su", "vi", "af", "bh", "de", "fy", "io",
    "lmo", "nap", "rm", "sv", "vls", "als", "bn", "diq", "ga", "is", "ln", "nds", "ro", "sw", "vo",
    "am", "bo", "dv", "gan", "it", "lt", "ne", "ru", "szl", "wa", "an", "br", "el", "gd", "ja",
    "lv", "nl", "rw", "ta", "war", "ang", "bs", "eml", "gl", "jbo", "map-bms", "nn", "sa", "te",
    "wuu", "ar", "ca", "en", "gn", "jv", "mg", "no", "sah", "tg", "xmf", "arc", "cbk-zam", "eo",
    "gu", "ka", "mhr", "nov", "scn", "th", "yi", "arz", "cdo", "es", "hak", "kk", "mi", "oc", "sco",
    "tk", "yo", "as", "ce", "et", "he", "km", "min", "or", "sd", "tl", "zea", "ast", "ceb", "eu",
    "hi", "kn", "mk", "os", "sh", "tr", "zh-classical", "ay", "ckb", "ext", "hr", "ko", "ml", "pa",
    "si", "tt", "zh-min-nan", "az", "co", "fa", "hsb", "ksh", "mn", "pdc", "simple", "ug", "zh-yue",
    "ba", "crh", "fi", "hu", "ku", "mr", "pl", "sk", "uk", "zh", "bar", "cs", "fiu-vro", "hy", "ky",
    "ms", "pms", "sl", "ur", "bat-smg", "csb", "fo", "ia", "la", "mt", "pnb", "so", "uz",
    "be-x-old", "cv", "fr", "id", "lb", "mwl", "ps", "sq", "vec", "be", "cy", "frr", "ig", "li",
    "my", "pt", "sr", "vep",
];

const PANX_PREFIX: &str = "panx_dataset";

/// Which public corpus a preset is.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PresetKind {
    Conll2003,
    Ontonotes5,
    Wnut2017,
    MitMovieTrivia,
    MitRestaurant,
    Fin,
    Bionlp2004,
    Bc5cdr,
    /// WikiAnn for one language.
    Panx { language: String },
}

impl PresetKind {
    /// Parses a preset name; `panx_dataset_<lang>` and `panx_dataset/<lang>`
    /// are both accepted.
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "conll2003" => PresetKind::Conll2003,
            "ontonotes5" => PresetKind::Ontonotes5,
            "wnut2017" => PresetKind::Wnut2017,
            "mit_movie_trivia" => PresetKind::MitMovieTrivia,
            "mit_restaurant" => PresetKind::MitRestaurant,
            "fin" => PresetKind::Fin,
            "bionlp2004" => PresetKind::Bionlp2004,
            "bc5cdr" => PresetKind::Bc5cdr,
            other => {
                let language = other
                    .strip_prefix(PANX_PREFIX)
                    .and_then(|rest| rest.strip_prefix(|c: char| c == '_' || c == '/'))?;
                if !PANX_LANGUAGES.contains(&language) {
                    return None;
                }
                PresetKind::Panx {
                    language: language.to_string(),
                }
            }
        };
        Some(kind)
    }
}

impl fmt::Display for PresetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresetKind::Conll2003 => write!(f, "conll2003"),
            PresetKind::Ontonotes5 => write!(f, "ontonotes5"),
            PresetKind::Wnut2017 => write!(f, "wnut2017"),
            PresetKind::MitMovieTrivia => write!(f, "mit_movie_trivia"),
            PresetKind::MitRestaurant => write!(f, "mit_restaurant"),
            PresetKind::Fin => write!(f, "fin"),
            PresetKind::Bionlp2004 => write!(f, "bionlp2004"),
            PresetKind::Bc5cdr => write!(f, "bc5cdr"),
            PresetKind::Panx { language } => write!(f, "{PANX_PREFIX}_{language}"),
        }
    }
}

/// A resolved preset: where its files live and how to read them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetDataset {
    pub kind: PresetKind,
    /// Split files relative to the preset's data directory, in decode order.
    pub files: Vec<(SplitName, PathBuf)>,
    pub entity_first: bool,
    pub to_bio: bool,
    pub language: String,
    /// Needs the language-specific re-tokenization pass.
    pub retokenize: bool,
}

impl PresetDataset {
    /// Looks up a preset by name.
    ///
    /// # Errors
    ///
    /// Returns `NerfuseError::UnknownDataset` for names outside the registry.
    ///
    /// # Examples
    /// ```
    /// use nerfuse_core::preset::PresetDataset;
    ///
    /// let preset = PresetDataset::resolve("mit_restaurant").unwrap();
    /// assert!(preset.entity_first);
    /// assert!(PresetDataset::resolve("conll2099").is_err());
    /// ```
    pub fn resolve(name: &str) -> Result<Self> {
        let kind = PresetKind::from_name(name).ok_or_else(|| NerfuseError::UnknownDataset {
            name: name.to_string(),
        })?;
        Ok(Self::from_kind(kind))
    }

    pub fn from_kind(kind: PresetKind) -> Self {
        use SplitName::{Test, Train, Valid};

        let conll_layout = [(Train, "train.txt"), (Valid, "dev.txt"), (Test, "test.txt")];
        let (files, entity_first, to_bio): (&[(SplitName, &str)], bool, bool) = match &kind {
            PresetKind::Conll2003 | PresetKind::Ontonotes5 | PresetKind::Bc5cdr => {
                (&conll_layout, false, false)
            }
            PresetKind::Wnut2017 => (
                &[(Train, "train.txt"), (Valid, "valid.txt"), (Test, "test.txt")],
                false,
                false,
            ),
            PresetKind::Bionlp2004 => (
                &[
                    (Train, "Genia4ERtask1.iob2"),
                    (Valid, "Genia4EReval1.iob2"),
                ],
                false,
                false,
            ),
            PresetKind::Fin => (&[(Train, "FIN5.txt"), (Valid, "FIN3.txt")], false, true),
            PresetKind::MitRestaurant => (
                &[
                    (Train, "restauranttrain.bio"),
                    (Valid, "restauranttest.bio"),
                ],
                true,
                false,
            ),
            PresetKind::MitMovieTrivia => (
                &[
                    (Train, "trivia10k13train.bio"),
                    (Valid, "trivia10k13test.bio"),
                ],
                true,
                false,
            ),
            PresetKind::Panx { .. } => (
                &[(Valid, "dev.txt"), (Train, "train.txt"), (Test, "test.txt")],
                false,
                false,
            ),
        };

        let (language, retokenize) = match &kind {
            PresetKind::Panx { language } => (language.clone(), language == "ja"),
            _ => ("en".to_string(), false),
        };

        Self {
            files: files
                .iter()
                .map(|(split, file)| (*split, PathBuf::from(file)))
                .collect(),
            kind,
            entity_first,
            to_bio,
            language,
            retokenize,
        }
    }

    /// Canonical name of the preset.
    pub fn name(&self) -> String {
        self.kind.to_string()
    }

    /// Directory of the preset under `cache_dir`.
    pub fn data_dir(&self, cache_dir: &Path) -> PathBuf {
        cache_dir.join(self.name())
    }
}

/// Every name accepted by [`PresetDataset::resolve`].
pub fn valid_dataset_names() -> Vec<String> {
    let fixed = [
        PresetKind::Conll2003,
        PresetKind::Wnut2017,
        PresetKind::Ontonotes5,
        PresetKind::MitMovieTrivia,
        PresetKind::MitRestaurant,
        PresetKind::Fin,
        PresetKind::Bionlp2004,
        PresetKind::Bc5cdr,
    ];
    fixed
        .iter()
        .map(ToString::to_string)
        .chain(PANX_LANGUAGES.iter().map(|l| format!("{PANX_PREFIX}_{l}")))
        .collect()
}
