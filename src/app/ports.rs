use crate::domain::IngredientRecord;
use crate::error::Result;
use crate::pipeline::{PipelineReport, RunSummary, UnresolvedCas};
use crate::reference::{LabelTable, ReferenceVocabulary};

/// Supplies the ingredient records of one batch
pub trait RecordSourcePort: Send + Sync {
    fn load_records(&self) -> Result<Vec<IngredientRecord>>;
}

/// Supplies the curated, read-only reference resources.
/// A missing or unreadable resource is a fatal `Reference` error.
pub trait ReferencePort: Send + Sync {
    fn load_vocabulary(&self) -> Result<ReferenceVocabulary>;
    fn load_labels(&self) -> Result<LabelTable>;
}

/// Receives the classified batch and its reports
pub trait ClassifyOutputPort: Send + Sync {
    fn write_records(&self, records: &[IngredientRecord]) -> Result<usize>;

    fn write_usable(&self, records: &[&IngredientRecord]) -> Result<usize>;

    fn write_summary(&self, summary: &RunSummary, report: &PipelineReport) -> Result<()>;

    fn write_curation(&self, entries: &[UnresolvedCas]) -> Result<()>;
}
