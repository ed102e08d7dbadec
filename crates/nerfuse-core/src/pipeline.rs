//! # Dataset Builder
//!
//! End-to-end build: resolve the request, make every dataset available
//! locally, decode each against one vocabulary, post-process and merge.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::aggregate::{AggregatedDataset, decode_all_files};
use crate::config::{BuildOptions, CustomDataset, DatasetRequest};
use crate::dataset::BuiltDataset;
use crate::decode::{DecodeOptions, FileDecoder};
use crate::error::{NerfuseError, Result};
use crate::label::tag::OUTSIDE;
use crate::label::{LabelSpace, LabelVocab};
use crate::merge::{DEFAULT_LANGUAGE, NamedDataset, merge_datasets};
use crate::postprocess::{Retokenizer, lowercase_splits, retokenize_splits};
use crate::preset::PresetDataset;

/// Makes a preset's files available on disk.
pub trait DatasetProvider {
    /// Returns the directory holding `preset`'s split files, fetching and
    /// preparing them under `cache_dir` if needed.
    fn prepare(&self, preset: &PresetDataset, cache_dir: &Path) -> Result<PathBuf>;
}

/// Provider that only looks in the cache directory and never fetches.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalProvider;

impl DatasetProvider for LocalProvider {
    fn prepare(&self, preset: &PresetDataset, cache_dir: &Path) -> Result<PathBuf> {
        let dir = preset.data_dir(cache_dir);
        if !dir.is_dir() {
            return Err(NerfuseError::MissingFile { path: dir });
        }
        Ok(dir)
    }
}

/// One dataset of a request, resolved but not yet decoded.
enum Source {
    Preset(PresetDataset),
    Custom(CustomDataset),
}

/// Builds a [`BuiltDataset`] from presets or a custom dataset.
///
/// # Examples
/// ```no_run
/// use nerfuse_core::config::{BuildOptions, DatasetRequest};
/// use nerfuse_core::pipeline::DatasetBuilder;
///
/// let builder = DatasetBuilder::new(BuildOptions::default().with_lower_case(true));
/// let built = builder
///     .build(&DatasetRequest::Presets(vec!["wnut2017".into()]))
///     .unwrap();
/// println!("{} labels", built.label_to_id.len());
/// ```
pub struct DatasetBuilder {
    options: BuildOptions,
    space: LabelSpace,
    provider: Box<dyn DatasetProvider>,
    retokenizer: Option<Box<dyn Retokenizer>>,
}

impl DatasetBuilder {
    /// Constructs a builder with the shared synonym table and the
    /// [`LocalProvider`].
    pub fn new(options: BuildOptions) -> Self {
        Self {
            options,
            space: LabelSpace::default(),
            provider: Box::new(LocalProvider),
            retokenizer: None,
        }
    }

    pub fn with_space(mut self, space: LabelSpace) -> Self {
        self.space = space;
        self
    }

    pub fn with_provider(mut self, provider: impl DatasetProvider + 'static) -> Self {
        self.provider = Box::new(provider);
        self
    }

    pub fn with_retokenizer(mut self, retokenizer: impl Retokenizer + 'static) -> Self {
        self.retokenizer = Some(Box::new(retokenizer));
        self
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Runs the build.
    ///
    /// Every preset name is resolved and a custom dataset validated before
    /// anything is fetched or decoded.
    ///
    /// # Errors
    ///
    /// Configuration errors (`UnknownDataset`, `MissingFile`,
    /// `MissingOutsideLabel`, `InvalidConfig`) come first; then provider,
    /// decoding and re-tokenization errors in dataset order.
    pub fn build(&self, request: &DatasetRequest) -> Result<BuiltDataset> {
        let sources = self.resolve(request)?;
        let mut vocab = self.initial_vocab()?;

        let mut named = Vec::with_capacity(sources.len());
        for source in sources {
            named.push(self.build_one(source, &mut vocab)?);
        }

        let merged = merge_datasets(named);
        info!(
            "target dataset: {} splits, {} labels, language {}",
            merged.splits.len(),
            vocab.len(),
            merged.language
        );

        Ok(BuiltDataset {
            splits: merged.splits,
            label_to_id: vocab,
            language: merged.language,
            unseen_labels: merged.unseen,
        })
    }

    fn resolve(&self, request: &DatasetRequest) -> Result<Vec<Source>> {
        match request {
            DatasetRequest::Presets(names) => {
                if names.is_empty() {
                    return Err(NerfuseError::InvalidConfig(
                        "no dataset requested".to_string(),
                    ));
                }
                names
                    .iter()
                    .map(|name| PresetDataset::resolve(name).map(Source::Preset))
                    .collect()
            }
            DatasetRequest::Custom(custom) => {
                custom.validate()?;
                Ok(vec![Source::Custom(custom.clone())])
            }
        }
    }

    fn initial_vocab(&self) -> Result<LabelVocab> {
        let vocab = self.options.label_to_id.clone().unwrap_or_default();
        if self.options.fix_label_dict && !vocab.contains(OUTSIDE) {
            return Err(NerfuseError::MissingOutsideLabel {
                label: OUTSIDE.to_string(),
            });
        }
        Ok(vocab)
    }

    fn decode_options(&self) -> DecodeOptions {
        DecodeOptions::new()
            .with_allow_new_entity(self.options.allow_new_entity)
            .with_fix_label_dict(self.options.fix_label_dict)
            .with_keep_original_surface(self.options.keep_original_surface)
    }

    fn build_one(&self, source: Source, vocab: &mut LabelVocab) -> Result<NamedDataset> {
        let (name, language, mut dataset, retokenize) = match source {
            Source::Preset(preset) => {
                let dir = self.provider.prepare(&preset, &self.options.cache_dir)?;
                let options = self
                    .decode_options()
                    .with_entity_first(preset.entity_first)
                    .with_to_bio(preset.to_bio);
                let decoder = FileDecoder::new(&self.space, options)?;
                let dataset = decode_all_files(&decoder, &preset.files, Some(&dir), vocab)?;
                (preset.name(), preset.language, dataset, preset.retokenize)
            }
            Source::Custom(custom) => {
                let decoder = FileDecoder::new(&self.space, self.decode_options())?;
                let dataset = decode_all_files(&decoder, &custom.files(), None, vocab)?;
                let language = custom
                    .language
                    .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
                ("custom".to_string(), language, dataset, false)
            }
        };

        if retokenize {
            dataset = self.retokenize(&name, dataset, vocab)?;
        }
        if self.options.lower_case {
            dataset.splits = lowercase_splits(dataset.splits);
        }

        Ok(NamedDataset {
            name,
            language,
            dataset,
        })
    }

    fn retokenize(
        &self,
        name: &str,
        mut dataset: AggregatedDataset,
        vocab: &LabelVocab,
    ) -> Result<AggregatedDataset> {
        match &self.retokenizer {
            Some(retokenizer) => {
                info!("re-tokenizing {name}");
                dataset.splits = retokenize_splits(dataset.splits, vocab, &**retokenizer)?;
            }
            None => warn!("{name} expects re-tokenization but no re-tokenizer is configured"),
        }
        Ok(dataset)
    }
}
