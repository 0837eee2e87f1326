pub mod config;
pub mod constants;
pub mod error;
pub mod observability;

// Record shapes and curated reference data
pub mod domain;
pub mod reference;

// Classification phases and their runner
pub mod pipeline;

// Application boundary and file adapters
pub mod app;
pub mod infra;

pub use config::Config;
pub use error::{PipelineError, Result};
