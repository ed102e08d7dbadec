//! # nerfuse-fetch
//!
//! Fetches the public corpora known to `nerfuse-core` and lays them out in
//! the cache directory. Plug [`PresetDownloader`] into a
//! [`nerfuse_core::DatasetBuilder`] to build presets straight from the
//! network:
//!
//! ```no_run
//! use nerfuse_core::{BuildOptions, DatasetBuilder, DatasetRequest};
//! use nerfuse_fetch::PresetDownloader;
//!
//! let builder = DatasetBuilder::new(BuildOptions::default())
//!     .with_provider(PresetDownloader::new().unwrap());
//! let built = builder
//!     .build(&DatasetRequest::Presets(vec!["conll2003".into()]))
//!     .unwrap();
//! ```

pub mod archive;
pub mod error;
pub mod prepare;

pub use archive::{ArchiveCache, ArchiveKind, extract, file_name_from_url};
pub use error::{FetchError, Result};
pub use prepare::PresetDownloader;
