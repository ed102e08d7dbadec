pub mod space;
pub mod synonyms;
pub mod tag;
pub mod vocab;

pub use space::{Canonical, LabelSpace};
pub use synonyms::{STOPWORDS, SynonymTable};
pub use tag::{RawTag, Span, TagPrefix, extract_spans, iob1_to_iob2, iob2_to_iob1};
pub use vocab::LabelVocab;
