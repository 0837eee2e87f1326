// File-based adapters for the classify use case ports

pub mod jsonl_source;
pub mod output_adapter;
pub mod reference_files;

pub use jsonl_source::{FlatRecordSource, JoinedRecordSource};
pub use output_adapter::FileOutputAdapter;
pub use reference_files::ReferenceFiles;
