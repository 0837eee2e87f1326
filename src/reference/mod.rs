//! Externally curated, read-only reference data injected into the pipeline.

pub mod labels;
pub mod vocabulary;

pub use labels::{LabelRow, LabelTable};
pub use vocabulary::ReferenceVocabulary;
