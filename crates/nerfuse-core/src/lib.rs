//! # nerfuse-core
//!
//! Decoding and label unification for heterogeneous named-entity corpora.
//!
//! Annotated files in the many CoNLL-style dialects (`token tag`,
//! `tag token`, MultiCoNER `token _ _ tag`, IOB1 or IOB2, custom entity
//! names) are decoded into token/label-id sequences against one shared
//! label vocabulary. Entity names are mapped to canonical categories by a
//! synonym table, so `PER`, `PERSON` and `PSN` all become `person`.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::io::Cursor;
//! use std::path::Path;
//!
//! use nerfuse_core::decode::{DecodeOptions, FileDecoder};
//! use nerfuse_core::label::{LabelSpace, LabelVocab};
//!
//! let space = LabelSpace::default();
//! let decoder = FileDecoder::new(&space, DecodeOptions::default()).unwrap();
//! let mut vocab = LabelVocab::new();
//!
//! let text = "EU B-ORG\nrejects O\n\nPeter B-PER\n";
//! let decoded = decoder
//!     .decode_reader(Cursor::new(text), Path::new("inline"), &mut vocab)
//!     .unwrap();
//!
//! assert_eq!(decoded.split.data[0], vec!["EU", "rejects"]);
//! assert_eq!(vocab.get("B-organization"), Some(0));
//! ```
//!
//! Whole datasets (presets or custom files) are built with
//! [`pipeline::DatasetBuilder`].

pub mod aggregate;
pub mod config;
pub mod convert;
pub mod dataset;
pub mod decode;
pub mod error;
pub mod label;
pub mod merge;
pub mod pipeline;
pub mod postprocess;
pub mod preset;

pub use config::{BuildOptions, CustomDataset, DatasetRequest};
pub use dataset::{BuiltDataset, DatasetSplit, SplitName, Splits};
pub use decode::{DecodeOptions, FileDecoder};
pub use error::{NerfuseError, Result};
pub use label::{LabelSpace, LabelVocab, SynonymTable};
pub use pipeline::{DatasetBuilder, DatasetProvider, LocalProvider};
pub use postprocess::Retokenizer;
pub use preset::PresetDataset;
