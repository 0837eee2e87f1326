//! Record shapes shared by every pipeline phase.

pub mod record;
pub mod record_set;
pub mod tags;

pub use record::{DerivedFields, IngredientRecord};
pub use record_set::RecordSet;
pub use tags::{QualityTag, TagSet};
