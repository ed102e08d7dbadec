//! # Archive Cache
//!
//! Downloads files into a cache directory and unpacks `.tar.gz`, `.tgz`
//! and `.zip` archives in place.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tracing::{debug, info, warn};

use crate::error::{FetchError, Result};

const USER_AGENT: &str = concat!("nerfuse/", env!("CARGO_PKG_VERSION"));

/// Archive formats the cache can unpack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    TarGz,
    Zip,
}

impl ArchiveKind {
    /// Detects the format from the file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(ArchiveKind::TarGz)
        } else if name.ends_with(".zip") {
            Some(ArchiveKind::Zip)
        } else {
            None
        }
    }
}

/// Last path segment of `url`, used as the cached file name.
pub fn file_name_from_url(url: &str) -> Result<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    match path.rsplit('/').next() {
        Some(name) if !name.is_empty() && path.contains('/') => Ok(name.to_string()),
        _ => Err(FetchError::InvalidUrl {
            url: url.to_string(),
        }),
    }
}

/// Unpacks `archive` into `dest`.
///
/// Returns `Ok(false)` without touching anything when `archive` is not a
/// recognized archive.
pub fn extract(archive: &Path, dest: &Path) -> Result<bool> {
    let Some(kind) = ArchiveKind::from_path(archive) else {
        return Ok(false);
    };
    let file = File::open(archive).map_err(|e| FetchError::io(archive, e))?;
    let failed = |reason: String| FetchError::Archive {
        path: archive.to_path_buf(),
        reason,
    };

    match kind {
        ArchiveKind::TarGz => tar::Archive::new(GzDecoder::new(file))
            .unpack(dest)
            .map_err(|e| failed(e.to_string()))?,
        ArchiveKind::Zip => zip::ZipArchive::new(file)
            .and_then(|mut zip| zip.extract(dest))
            .map_err(|e| failed(e.to_string()))?,
    }
    debug!(archive = %archive.display(), dest = %dest.display(), "extracted");
    Ok(true)
}

/// Blocking downloader writing into cache directories.
pub struct ArchiveCache {
    client: reqwest::blocking::Client,
}

impl ArchiveCache {
    /// Constructs a cache with a fresh HTTP client.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the client cannot be built.
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::Http {
                url: String::new(),
                reason: format!("failed to create HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }

    /// Downloads `url` into `dir` and returns the written path.
    ///
    /// A partially written file is removed when the download fails.
    pub fn download(&self, url: &str, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir).map_err(|e| FetchError::io(dir, e))?;
        let path = dir.join(file_name_from_url(url)?);

        info!("downloading {url}");
        let result = self.download_to(url, &path);
        if result.is_err() && path.exists() {
            if let Err(e) = fs::remove_file(&path) {
                warn!("could not remove partial download {}: {e}", path.display());
            }
        }
        result.map(|bytes| {
            debug!(path = %path.display(), bytes, "download complete");
            path
        })
    }

    fn download_to(&self, url: &str, path: &Path) -> Result<u64> {
        let http = |e: reqwest::Error| FetchError::Http {
            url: url.to_string(),
            reason: e.to_string(),
        };
        let mut response = self.client.get(url).send().map_err(http)?;
        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }
        let mut file = File::create(path).map_err(|e| FetchError::io(path, e))?;
        response.copy_to(&mut file).map_err(http)
    }

    /// Downloads `url` into `dir` and unpacks it there if it is an archive.
    pub fn fetch(&self, url: &str, dir: &Path) -> Result<PathBuf> {
        let path = self.download(url, dir)?;
        extract(&path, dir)?;
        Ok(path)
    }
}
