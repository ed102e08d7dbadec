//! Per-preset download and preparation.
//!
//! Each preset is fetched once into `<cache>/<preset name>` and rewritten
//! into the two-column files the decoder reads.

use std::fs;
use std::path::{Path, PathBuf};

use nerfuse_core::convert::{conll_format_files, conll_format_sequences, pubtator_to_sequences};
use nerfuse_core::pipeline::DatasetProvider;
use nerfuse_core::preset::{PresetDataset, PresetKind};
use tracing::{debug, info, warn};

use crate::archive::{ArchiveCache, extract};
use crate::error::{FetchError, Result};

const NEIGHBOR_TAGGING_URL: &str =
    "https://github.com/asahi417/neighbor-tagging/raw/master/data.tar.gz";
const CDR_URL: &str = "https://github.com/JHnlp/BioCreative-V-CDR-Corpus/raw/master/CDR_Data.zip";
const GENIA_URLS: [&str; 2] = [
    "http://www.nactem.ac.uk/GENIA/current/Shared-tasks/JNLPBA/Train/Genia4ERtraining.tar.gz",
    "http://www.nactem.ac.uk/GENIA/current/Shared-tasks/JNLPBA/Evaluation/Genia4ERtest.tar.gz",
];
const FIN_URL: &str =
    "https://people.eng.unimelb.edu.au/tbaldwin/resources/finance-sec/financial_risk_assessment.tgz";
const MIT_RESTAURANT_URLS: [&str; 2] = [
    "https://groups.csail.mit.edu/sls/downloads/restaurant/restauranttrain.bio",
    "https://groups.csail.mit.edu/sls/downloads/restaurant/restauranttest.bio",
];
const MIT_MOVIE_TRIVIA_URLS: [&str; 2] = [
    "https://groups.csail.mit.edu/sls/downloads/movie/trivia10k13train.bio",
    "https://groups.csail.mit.edu/sls/downloads/movie/trivia10k13test.bio",
];
/// WNUT 2017 sources and the file each is normalized into.
const WNUT_URLS: [(&str, &str); 3] = [
    (
        "https://github.com/leondz/emerging_entities_17/raw/master/wnut17train.conll",
        "train.txt",
    ),
    (
        "https://github.com/leondz/emerging_entities_17/raw/master/emerging.dev.conll",
        "valid.txt",
    ),
    (
        "https://raw.githubusercontent.com/leondz/emerging_entities_17/master/emerging.test.annotated",
        "test.txt",
    ),
];
const WIKIANN_URL: &str =
    "https://github.com/asahi417/neighbor-tagging/releases/download/0.0.0/wikiann.zip";

const CONLL_SPLITS: [&str; 3] = ["train", "dev", "test"];
const CDR_CORPUS_DIR: &str = "CDR.Corpus.v010516";
/// PubTator source of each BC5CDR split file.
const CDR_FILES: [(&str, &str); 3] = [
    ("CDR_DevelopmentSet.PubTator.txt", "dev.txt"),
    ("CDR_TestSet.PubTator.txt", "test.txt"),
    ("CDR_TrainingSet.PubTator.txt", "train.txt"),
];

/// Replaces tab separators with single spaces.
pub fn normalize_tabs(content: &str) -> String {
    content.replace('\t', " ")
}

/// Removes the `<language>:` prefix WikiAnn puts in front of every token.
pub fn strip_language_prefix(content: &str, language: &str) -> String {
    let prefix = format!("{language}:");
    content
        .lines()
        .map(|line| line.strip_prefix(prefix.as_str()).unwrap_or(line))
        .collect::<Vec<_>>()
        .join("\n")
        + "\n"
}

fn rename(from: &Path, to: &Path) -> Result<()> {
    fs::rename(from, to).map_err(|e| FetchError::io(from, e))
}

fn rewrite(from: &Path, to: &Path, f: impl FnOnce(&str) -> String) -> Result<()> {
    let content = fs::read_to_string(from).map_err(|e| FetchError::io(from, e))?;
    fs::write(to, f(&content)).map_err(|e| FetchError::io(to, e))
}

/// Writes `{train,dev,test}.txt` from the unpacked neighbor-tagging
/// `.words`/tag file pairs under `dir/data`.
pub fn format_neighbor_tagging(dir: &Path, ontonotes: bool) -> Result<()> {
    for split in CONLL_SPLITS {
        let (words, tags) = if ontonotes {
            (
                dir.join(format!("data/onto/{split}.words")),
                dir.join(format!("data/onto/{split}.ner")),
            )
        } else {
            (
                dir.join(format!("data/conll2003/conll2003-{split}.words")),
                dir.join(format!("data/conll2003/conll2003-{split}.nertags")),
            )
        };
        conll_format_files(&words, &tags, dir.join(format!("{split}.txt")), None)?;
    }
    Ok(())
}

/// Moves the unpacked BC5CDR corpus up into `dir` and converts each
/// PubTator file into a split file, breaking sentences at `.`.
pub fn convert_cdr(dir: &Path) -> Result<()> {
    let corpus = dir.join(CDR_CORPUS_DIR);
    rename(&dir.join("CDR_Data").join(CDR_CORPUS_DIR), &corpus)?;
    for (source, target) in CDR_FILES {
        let path = corpus.join(source);
        let content = fs::read_to_string(&path).map_err(|e| FetchError::io(&path, e))?;
        let (tokens, tags) = pubtator_to_sequences(&content)?;
        conll_format_sequences(dir.join(target), &tokens, &tags, Some("."))?;
    }
    Ok(())
}

/// Moves `files` out of the unpacked `dir/dataset` folder.
pub fn move_fin_files<'a>(
    dir: &Path,
    files: impl IntoIterator<Item = &'a PathBuf>,
) -> Result<()> {
    for file in files {
        rename(&dir.join("dataset").join(file), &dir.join(file))?;
    }
    Ok(())
}

/// Writes the tab-free copy of a downloaded WNUT file to `out`.
pub fn normalize_wnut_file(raw: &Path, out: &Path) -> Result<()> {
    rewrite(raw, out, normalize_tabs)
}

/// Turns each extracted WikiAnn split into its `.txt` file without the
/// language prefix, removing the raw file.
pub fn strip_panx_files<'a>(
    dir: &Path,
    files: impl IntoIterator<Item = &'a PathBuf>,
    language: &str,
) -> Result<()> {
    for file in files {
        let raw = dir.join(file.with_extension(""));
        rewrite(&raw, &dir.join(file), |content| {
            strip_language_prefix(content, language)
        })?;
        fs::remove_file(&raw).map_err(|e| FetchError::io(&raw, e))?;
    }
    Ok(())
}

/// [`DatasetProvider`] that downloads missing presets.
pub struct PresetDownloader {
    cache: ArchiveCache,
}

impl PresetDownloader {
    /// Constructs a downloader.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        Ok(Self {
            cache: ArchiveCache::new()?,
        })
    }

    /// Fetches and converts `preset` into `dir`, which already exists.
    fn populate(&self, preset: &PresetDataset, dir: &Path, cache_dir: &Path) -> Result<()> {
        match &preset.kind {
            PresetKind::Conll2003 | PresetKind::Ontonotes5 => {
                self.cache.fetch(NEIGHBOR_TAGGING_URL, dir)?;
                format_neighbor_tagging(dir, matches!(preset.kind, PresetKind::Ontonotes5))?;
            }
            PresetKind::Bc5cdr => {
                self.cache.fetch(CDR_URL, dir)?;
                convert_cdr(dir)?;
            }
            PresetKind::Bionlp2004 => {
                for url in GENIA_URLS {
                    self.cache.fetch(url, dir)?;
                }
            }
            PresetKind::Fin => {
                self.cache.fetch(FIN_URL, dir)?;
                move_fin_files(dir, preset.files.iter().map(|(_, file)| file))?;
            }
            PresetKind::MitRestaurant => {
                for url in MIT_RESTAURANT_URLS {
                    self.cache.download(url, dir)?;
                }
            }
            PresetKind::MitMovieTrivia => {
                for url in MIT_MOVIE_TRIVIA_URLS {
                    self.cache.download(url, dir)?;
                }
            }
            PresetKind::Wnut2017 => {
                for (url, target) in WNUT_URLS {
                    let raw = self.cache.download(url, dir)?;
                    normalize_wnut_file(&raw, &dir.join(target))?;
                }
            }
            PresetKind::Panx { language } => {
                // wikiann.zip holds every language; unpack it once per cache
                let bundle = cache_dir.join("panx_dataset").join(format!("{language}.tar.gz"));
                if !bundle.exists() {
                    self.cache.fetch(WIKIANN_URL, cache_dir)?;
                }
                extract(&bundle, dir)?;
                strip_panx_files(dir, preset.files.iter().map(|(_, file)| file), language)?;
            }
        }
        Ok(())
    }
}

impl DatasetProvider for PresetDownloader {
    fn prepare(&self, preset: &PresetDataset, cache_dir: &Path) -> nerfuse_core::Result<PathBuf> {
        let dir = preset.data_dir(cache_dir);
        if dir.exists() {
            debug!("{} already prepared at {}", preset.name(), dir.display());
            return Ok(dir);
        }

        info!("preparing preset {} in {}", preset.name(), dir.display());
        fs::create_dir_all(&dir).map_err(|e| FetchError::io(&dir, e))?;
        if let Err(err) = self.populate(preset, &dir, cache_dir) {
            // a half-populated directory would be taken as prepared next time
            if let Err(e) = fs::remove_dir_all(&dir) {
                warn!("could not remove {}: {e}", dir.display());
            }
            return Err(err.into());
        }
        Ok(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nerfuse_core::NerfuseError;

    fn write_tree(dir: &Path, files: &[(&str, &str)]) {
        for (name, content) in files {
            let path = dir.join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
    }

    fn read(dir: &Path, name: &str) -> String {
        fs::read_to_string(dir.join(name)).unwrap()
    }

    #[test]
    fn test_normalize_tabs() {
        assert_eq!(normalize_tabs("Apple\tB-corporation\n\n"), "Apple B-corporation\n\n");
    }

    #[test]
    fn test_strip_language_prefix() {
        let raw = "ja:東京\tB-LOC\nja:へ\tO\n\nja:ja:x O";
        assert_eq!(
            strip_language_prefix(raw, "ja"),
            "東京\tB-LOC\nへ\tO\n\nja:x O\n"
        );
    }

    #[test]
    fn test_existing_dir_is_reused() {
        let cache = tempfile::tempdir().unwrap();
        let preset = PresetDataset::resolve("fin").unwrap();
        fs::create_dir_all(preset.data_dir(cache.path())).unwrap();

        let downloader = PresetDownloader::new().unwrap();
        let dir = downloader.prepare(&preset, cache.path()).unwrap();
        assert_eq!(dir, cache.path().join("fin"));
    }

    #[test]
    fn test_panx_uses_cached_bundle() {
        use flate2::Compression;
        use flate2::write::GzEncoder;

        let cache = tempfile::tempdir().unwrap();
        let bundles = cache.path().join("panx_dataset");
        fs::create_dir_all(&bundles).unwrap();
        {
            let file = fs::File::create(bundles.join("de.tar.gz")).unwrap();
            let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
            for name in ["dev", "train", "test"] {
                let content = b"de:Berlin B-LOC\n";
                let mut header = tar::Header::new_gnu();
                header.set_size(content.len() as u64);
                header.set_mode(0o644);
                builder.append_data(&mut header, name, &content[..]).unwrap();
            }
            builder.into_inner().unwrap().finish().unwrap();
        }

        let preset = PresetDataset::resolve("panx_dataset_de").unwrap();
        let dir = PresetDownloader::new()
            .unwrap()
            .prepare(&preset, cache.path())
            .unwrap();

        assert_eq!(fs::read_to_string(dir.join("train.txt")).unwrap(), "Berlin B-LOC\n");
        assert!(!dir.join("train").exists());
    }

    #[test]
    fn test_format_neighbor_tagging_conll() {
        let dir = tempfile::tempdir().unwrap();
        let mut files = Vec::new();
        for split in CONLL_SPLITS {
            files.push((format!("data/conll2003/conll2003-{split}.words"), "EU rejects\nPeter\n"));
            files.push((format!("data/conll2003/conll2003-{split}.nertags"), "B-ORG O\nB-PER\n"));
        }
        let files: Vec<(&str, &str)> = files.iter().map(|(n, c)| (n.as_str(), *c)).collect();
        write_tree(dir.path(), &files);

        format_neighbor_tagging(dir.path(), false).unwrap();
        for split in CONLL_SPLITS {
            assert_eq!(
                read(dir.path(), &format!("{split}.txt")),
                "EU B-ORG\nrejects O\n\nPeter B-PER\n\n"
            );
        }
    }

    #[test]
    fn test_format_neighbor_tagging_ontonotes() {
        let dir = tempfile::tempdir().unwrap();
        write_tree(
            dir.path(),
            &[
                ("data/onto/train.words", "Obama spoke\n"),
                ("data/onto/train.ner", "B-PERSON O\n"),
                ("data/onto/dev.words", "in Ohio\n"),
                ("data/onto/dev.ner", "O B-GPE\n"),
            ],
        );

        // test split missing from the archive
        let err = format_neighbor_tagging(dir.path(), true).unwrap_err();
        assert!(matches!(err, FetchError::Core(NerfuseError::Io { .. })));
        assert_eq!(read(dir.path(), "train.txt"), "Obama B-PERSON\nspoke O\n\n");
        assert_eq!(read(dir.path(), "dev.txt"), "in O\nOhio B-GPE\n\n");
    }

    #[test]
    fn test_convert_cdr() {
        let dir = tempfile::tempdir().unwrap();
        let doc = "1|t|Aspirin works.\n1|a|\n1\t0\t7\tAspirin\tChemical\tD1\n";
        let files: Vec<(String, &str)> = CDR_FILES
            .iter()
            .map(|(source, _)| (format!("CDR_Data/{CDR_CORPUS_DIR}/{source}"), doc))
            .collect();
        let files: Vec<(&str, &str)> = files.iter().map(|(n, c)| (n.as_str(), *c)).collect();
        write_tree(dir.path(), &files);

        convert_cdr(dir.path()).unwrap();
        assert!(dir.path().join(CDR_CORPUS_DIR).is_dir());
        for (_, target) in CDR_FILES {
            assert_eq!(read(dir.path(), target), "Aspirin B-Chemical\nworks O\n. O\n\n");
        }
    }

    #[test]
    fn test_convert_cdr_without_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let err = convert_cdr(dir.path()).unwrap_err();
        assert!(matches!(err, FetchError::Io { .. }));
    }

    #[test]
    fn test_move_fin_files() {
        let dir = tempfile::tempdir().unwrap();
        write_tree(
            dir.path(),
            &[("dataset/FIN5.txt", "Bank B-ORG\n"), ("dataset/FIN3.txt", "Loan O\n")],
        );
        let preset = PresetDataset::resolve("fin").unwrap();

        move_fin_files(dir.path(), preset.files.iter().map(|(_, file)| file)).unwrap();
        assert_eq!(read(dir.path(), "FIN5.txt"), "Bank B-ORG\n");
        assert_eq!(read(dir.path(), "FIN3.txt"), "Loan O\n");
        assert!(!dir.path().join("dataset/FIN5.txt").exists());
    }

    #[test]
    fn test_normalize_wnut_file() {
        let dir = tempfile::tempdir().unwrap();
        write_tree(dir.path(), &[("wnut17train.conll", "@paul\tO\nApple\tB-corporation\n\n")]);

        let out = dir.path().join("train.txt");
        normalize_wnut_file(&dir.path().join("wnut17train.conll"), &out).unwrap();
        assert_eq!(read(dir.path(), "train.txt"), "@paul O\nApple B-corporation\n\n");
        assert!(dir.path().join("wnut17train.conll").exists());
    }
}
