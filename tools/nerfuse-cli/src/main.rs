//! nerfuse command-line tool
//!
//! Builds unified NER datasets from presets or custom files, converts
//! token/tag files into the two-column format, and reports label statistics
//! of a single file.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use nerfuse_core::config::{
    BuildOptions, CACHE_DIR_ENV, CustomDataset, DatasetRequest, default_cache_dir,
};
use nerfuse_core::convert::{conll_format_files, conll_format_sequences, pubtator_to_sequences};
use nerfuse_core::decode::{DecodeOptions, FileDecoder};
use nerfuse_core::label::{LabelSpace, LabelVocab, SynonymTable, extract_spans};
use nerfuse_core::pipeline::{DatasetBuilder, LocalProvider};
use nerfuse_core::preset::valid_dataset_names;
use nerfuse_fetch::PresetDownloader;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// CLI arguments
#[derive(Parser, Debug)]
#[command(name = "nerfuse")]
#[command(about = "Decode, unify and merge NER corpora")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Cache directory for preset datasets
    #[arg(long, global = true, env = CACHE_DIR_ENV)]
    cache_dir: Option<PathBuf>,

    /// Synonym table JSON replacing the built-in one
    #[arg(long, global = true)]
    synonyms: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a dataset from presets or a custom description
    Build {
        /// Preset names; several are merged into one train split
        #[arg(short, long = "dataset", required_unless_present_any = ["custom", "list"])]
        datasets: Vec<String>,
        /// Custom dataset JSON (`{"train": ..., "valid": ..., "test": ..., "language": ...}`)
        #[arg(long, conflicts_with = "datasets")]
        custom: Option<PathBuf>,
        /// Label vocabulary JSON to start from
        #[arg(long)]
        label_dict: Option<PathBuf>,
        /// Never grow the label vocabulary
        #[arg(long, requires = "label_dict")]
        fix_label_dict: bool,
        /// Lower-case every token
        #[arg(long)]
        lower_case: bool,
        /// Keep raw tags instead of canonical labels
        #[arg(long)]
        keep_original_surface: bool,
        /// Demote entity types missing from the synonym table to `O`
        #[arg(long)]
        no_new_entity: bool,
        /// Only use datasets already in the cache
        #[arg(long)]
        offline: bool,
        /// Print every known preset name and exit
        #[arg(long)]
        list: bool,
        /// Output JSON file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Merge a token file and a tag file into one two-column file
    Convert {
        /// One sentence of whitespace-separated tokens per line
        #[arg(long)]
        tokens: PathBuf,
        /// One sentence of whitespace-separated tags per line
        #[arg(long)]
        tags: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Token after which a sentence boundary is inserted
        #[arg(long)]
        sentence_division: Option<String>,
    },
    /// Convert a PubTator corpus into a two-column file
    Pubtator {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long, default_value = ".")]
        sentence_division: String,
    },
    /// Decode one file and report label statistics
    Stats {
        file: PathBuf,
        /// Tag is the first column
        #[arg(long)]
        entity_first: bool,
        /// Recompute B-/I- prefixes
        #[arg(long)]
        to_bio: bool,
        /// Label vocabulary JSON to decode against
        #[arg(long)]
        label_dict: Option<PathBuf>,
    },
}

/// Label statistics of one decoded file.
#[derive(Debug, Serialize)]
struct FileStats {
    file: String,
    sentences: usize,
    tokens: usize,
    labels: BTreeMap<String, usize>,
    spans: BTreeMap<String, usize>,
    unseen: Vec<String>,
}

fn load_space(synonyms: Option<&Path>) -> Result<LabelSpace> {
    match synonyms {
        Some(path) => {
            let table = SynonymTable::from_json_file(path)
                .with_context(|| format!("failed to load synonym table {}", path.display()))?;
            for (mention, categories) in table.ambiguous_mentions() {
                warn!("{mention:?} is listed under {categories:?}; the first one wins");
            }
            Ok(LabelSpace::new(table))
        }
        None => Ok(LabelSpace::default()),
    }
}

fn load_vocab(path: Option<&Path>) -> Result<Option<LabelVocab>> {
    path.map(|p| {
        LabelVocab::from_json_file(p)
            .with_context(|| format!("failed to load label dictionary {}", p.display()))
    })
    .transpose()
}

fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, value)?;
            writer.flush()?;
            info!("wrote {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            serde_json::to_writer_pretty(&mut lock, value)?;
            writeln!(lock)?;
        }
    }
    Ok(())
}

fn file_stats(
    space: &LabelSpace,
    file: &Path,
    options: DecodeOptions,
    vocab: Option<LabelVocab>,
) -> Result<FileStats> {
    let decoder = FileDecoder::new(space, options)?;
    let mut vocab = vocab.unwrap_or_default();
    let decoded = decoder
        .decode_file(file, None, &mut vocab)
        .with_context(|| format!("failed to decode {}", file.display()))?;

    let mut labels = BTreeMap::new();
    let mut spans = BTreeMap::new();
    for ids in &decoded.split.label {
        let tags: Vec<&str> = ids.iter().filter_map(|&id| vocab.label(id)).collect();
        for tag in &tags {
            *labels.entry(tag.to_string()).or_insert(0) += 1;
        }
        for span in extract_spans(&tags) {
            *spans.entry(span.mention).or_insert(0) += 1;
        }
    }

    Ok(FileStats {
        file: file.display().to_string(),
        sentences: decoded.split.len(),
        tokens: decoded.split.token_count(),
        labels,
        spans,
        unseen: decoded.unseen.into_iter().collect(),
    })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let cache_dir = cli.cache_dir.unwrap_or_else(default_cache_dir);
    let space = load_space(cli.synonyms.as_deref())?;

    match cli.command {
        Commands::Build {
            datasets,
            custom,
            label_dict,
            fix_label_dict,
            lower_case,
            keep_original_surface,
            no_new_entity,
            offline,
            list,
            output,
        } => {
            if list {
                for name in valid_dataset_names() {
                    println!("{name}");
                }
                return Ok(());
            }

            let request = match custom {
                Some(path) => DatasetRequest::Custom(
                    CustomDataset::from_json_file(&path)
                        .with_context(|| format!("failed to load {}", path.display()))?,
                ),
                None if datasets.is_empty() => bail!("no dataset given"),
                None => DatasetRequest::Presets(datasets),
            };

            let mut options = BuildOptions::default()
                .with_cache_dir(&cache_dir)
                .with_fix_label_dict(fix_label_dict)
                .with_lower_case(lower_case)
                .with_keep_original_surface(keep_original_surface)
                .with_allow_new_entity(!no_new_entity);
            if let Some(vocab) = load_vocab(label_dict.as_deref())? {
                options = options.with_label_to_id(vocab);
            }

            let builder = DatasetBuilder::new(options).with_space(space);
            let builder = if offline {
                builder.with_provider(LocalProvider)
            } else {
                builder.with_provider(
                    PresetDownloader::new().context("failed to create downloader")?,
                )
            };

            let built = builder.build(&request).context("dataset build failed")?;
            write_json(&built, output.as_deref())?;
        }
        Commands::Convert {
            tokens,
            tags,
            output,
            sentence_division,
        } => {
            conll_format_files(&tokens, &tags, &output, sentence_division.as_deref())
                .with_context(|| format!("failed to convert {}", tokens.display()))?;
            info!("wrote {}", output.display());
        }
        Commands::Pubtator {
            input,
            output,
            sentence_division,
        } => {
            let content = std::fs::read_to_string(&input)
                .with_context(|| format!("failed to read {}", input.display()))?;
            let (tokens, tags) = pubtator_to_sequences(&content)?;
            conll_format_sequences(&output, &tokens, &tags, Some(sentence_division.as_str()))?;
            info!("wrote {} documents to {}", tokens.len(), output.display());
        }
        Commands::Stats {
            file,
            entity_first,
            to_bio,
            label_dict,
        } => {
            let options = DecodeOptions::new()
                .with_entity_first(entity_first)
                .with_to_bio(to_bio)
                .with_allow_new_entity(true);
            let stats = file_stats(&space, &file, options, load_vocab(label_dict.as_deref())?)?;
            write_json(&stats, None)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_build() {
        let cli = Cli::try_parse_from([
            "nerfuse",
            "build",
            "-d",
            "conll2003",
            "-d",
            "wnut2017",
            "--lower-case",
            "--cache-dir",
            "/tmp/nerfuse",
        ])
        .unwrap();
        assert_eq!(cli.cache_dir, Some(PathBuf::from("/tmp/nerfuse")));
        match cli.command {
            Commands::Build {
                datasets,
                lower_case,
                ..
            } => {
                assert_eq!(datasets, vec!["conll2003", "wnut2017"]);
                assert!(lower_case);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_fix_label_dict_requires_dict() {
        assert!(Cli::try_parse_from(["nerfuse", "build", "-d", "fin", "--fix-label-dict"]).is_err());
    }

    #[test]
    fn test_file_stats() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("train.txt");
        std::fs::write(&file, "Peter B-PER\nBlackburn I-PER\nin O\nParis B-LOC\n").unwrap();

        let stats = file_stats(&LabelSpace::default(), &file, DecodeOptions::new(), None).unwrap();
        assert_eq!(stats.sentences, 1);
        assert_eq!(stats.tokens, 4);
        assert_eq!(stats.labels["I-person"], 1);
        assert_eq!(stats.spans["person"], 1);
        assert_eq!(stats.spans["location"], 1);
        assert!(stats.unseen.is_empty());
    }
}
