pub mod classify_use_case;
pub mod ports;

pub use classify_use_case::{validate_source, ClassifyOutcome, ClassifyUseCase, ValidationOutcome};
