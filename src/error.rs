use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Reference resource '{resource}' unavailable: {message}")]
    Reference { resource: String, message: String },

    #[error("Event '{event_id}' has inconsistent {field}: '{first}' vs '{second}'")]
    InconsistentEvent {
        event_id: String,
        field: &'static str,
        first: String,
        second: String,
    },

    #[error("Ingredient row references unknown event '{event_id}'")]
    UnknownEvent { event_id: String },

    #[error("Malformed input in {} at line {line}: {message}", path.display())]
    MalformedInput {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Phase '{phase}' removed a quality tag from record {record_index}")]
    TagRegression {
        phase: &'static str,
        record_index: usize,
    },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
