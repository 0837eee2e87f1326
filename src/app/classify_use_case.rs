use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::app::ports::{ClassifyOutputPort, RecordSourcePort, ReferencePort};
use crate::config::Config;
use crate::domain::{IngredientRecord, RecordSet};
use crate::observability::metrics;
use crate::pipeline::{
    check_event_consistency, unresolved_cas_report, Pipeline, PipelineReport, RunSummary,
};

/// What a classification run produced
#[derive(Debug, Clone)]
pub struct ClassifyOutcome {
    pub summary: RunSummary,
    pub report: PipelineReport,
    pub records_written: usize,
    pub usable_written: usize,
    pub unresolved_cas: usize,
}

/// Counts from an input check that runs no phase
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOutcome {
    pub records: usize,
    pub events: usize,
    pub placeholder_records: usize,
}

/// Use case for classifying one batch of disclosure records end to end
pub struct ClassifyUseCase {
    source: Arc<dyn RecordSourcePort>,
    references: Arc<dyn ReferencePort>,
    output: Arc<dyn ClassifyOutputPort>,
    config: Config,
}

impl ClassifyUseCase {
    pub fn new(
        source: Arc<dyn RecordSourcePort>,
        references: Arc<dyn ReferencePort>,
        output: Arc<dyn ClassifyOutputPort>,
        config: Config,
    ) -> Self {
        Self {
            source,
            references,
            output,
            config,
        }
    }

    fn load(&self) -> Result<RecordSet> {
        let records = self
            .source
            .load_records()
            .context("Failed to load ingredient records")?;
        let set = RecordSet::new(records);
        metrics::input::records_loaded(set.len());
        metrics::input::events_loaded(set.event_count());
        info!("Loaded {} records across {} events", set.len(), set.event_count());
        Ok(set)
    }

    /// Load, run every phase, then write records and reports
    pub fn run(&self) -> Result<ClassifyOutcome> {
        let start_time = Instant::now();

        let vocabulary = Arc::new(
            self.references
                .load_vocabulary()
                .context("Reference vocabulary is required")?,
        );
        let labels = Arc::new(
            self.references
                .load_labels()
                .context("Proprietary label table is required")?,
        );
        let mut records = self.load()?;

        let pipeline = Pipeline::new(&self.config, vocabulary.clone(), labels.clone());
        let report = pipeline
            .run(&mut records)
            .context("Classification pipeline aborted")?;

        let summary = RunSummary::collect(&records, &report, &vocabulary);
        summary.log();
        let curation = unresolved_cas_report(&records, &labels);

        let usable: Vec<&IngredientRecord> = records.usable().collect();
        metrics::output::usable_records(usable.len());
        let usable_written = self
            .output
            .write_usable(&usable)
            .context("Failed to write usable records")?;
        let records_written = self
            .output
            .write_records(records.records())
            .context("Failed to write classified records")?;
        metrics::output::records_written(records_written);
        self.output
            .write_summary(&summary, &report)
            .context("Failed to write run summary")?;
        self.output
            .write_curation(&curation)
            .context("Failed to write curation report")?;

        info!(
            "Classification finished in {:.2}s: {} records written, {} usable",
            start_time.elapsed().as_secs_f64(),
            records_written,
            usable_written
        );

        Ok(ClassifyOutcome {
            summary,
            report,
            records_written,
            usable_written,
            unresolved_cas: curation.len(),
        })
    }

    /// Load the records and check the event-level invariant only
    pub fn validate(&self) -> Result<ValidationOutcome> {
        validate_source(self.source.as_ref())
    }
}

/// Input check that needs no reference data and writes nothing
pub fn validate_source(source: &dyn RecordSourcePort) -> Result<ValidationOutcome> {
    let records = RecordSet::new(
        source
            .load_records()
            .context("Failed to load ingredient records")?,
    );
    check_event_consistency(&records).context("Event-level fields are inconsistent")?;
    info!(
        "Validated {} records across {} events",
        records.len(),
        records.event_count()
    );
    Ok(ValidationOutcome {
        records: records.len(),
        events: records.event_count(),
        placeholder_records: records
            .records()
            .iter()
            .filter(|r| r.record_id.is_none())
            .count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::QualityTag;
    use crate::error::{PipelineError, Result as PipelineResult};
    use crate::pipeline::UnresolvedCas;
    use crate::reference::{LabelRow, LabelTable, ReferenceVocabulary};
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    struct MockSource(Vec<IngredientRecord>);

    impl RecordSourcePort for MockSource {
        fn load_records(&self) -> PipelineResult<Vec<IngredientRecord>> {
            Ok(self.0.clone())
        }
    }

    struct MockReferences {
        vocabulary_available: bool,
    }

    impl ReferencePort for MockReferences {
        fn load_vocabulary(&self) -> PipelineResult<ReferenceVocabulary> {
            if !self.vocabulary_available {
                return Err(PipelineError::Reference {
                    resource: "reference vocabulary".to_string(),
                    message: "not found".to_string(),
                });
            }
            let mut raw = BTreeMap::new();
            raw.insert("7732-18-5".to_string(), vec!["water".to_string()]);
            raw.insert("14808-60-7".to_string(), vec!["silica".to_string()]);
            Ok(ReferenceVocabulary::new(raw))
        }

        fn load_labels(&self) -> PipelineResult<LabelTable> {
            Ok(LabelTable::new(vec![LabelRow {
                label: "proprietary".to_string(),
                count: 1,
                proprietary: true,
                hiding: false,
            }]))
        }
    }

    #[derive(Default)]
    struct MockOutput {
        records: Mutex<Vec<IngredientRecord>>,
        usable: Mutex<usize>,
        curation: Mutex<Vec<UnresolvedCas>>,
    }

    impl ClassifyOutputPort for MockOutput {
        fn write_records(&self, records: &[IngredientRecord]) -> PipelineResult<usize> {
            self.records.lock().unwrap().extend_from_slice(records);
            Ok(records.len())
        }

        fn write_usable(&self, records: &[&IngredientRecord]) -> PipelineResult<usize> {
            *self.usable.lock().unwrap() = records.len();
            Ok(records.len())
        }

        fn write_summary(&self, _: &RunSummary, _: &PipelineReport) -> PipelineResult<()> {
            Ok(())
        }

        fn write_curation(&self, entries: &[UnresolvedCas]) -> PipelineResult<()> {
            self.curation.lock().unwrap().extend_from_slice(entries);
            Ok(())
        }
    }

    fn record(record_id: &str, cas: &str, name: &str, percent: f64) -> IngredientRecord {
        IngredientRecord {
            event_id: "ev-1".to_string(),
            record_id: Some(record_id.to_string()),
            cas_raw: cas.to_string(),
            ingredient_name: name.to_string(),
            supplier: "Acme".to_string(),
            purpose: "Proppant".to_string(),
            percent_of_job: Some(percent),
            total_base_fluid_volume: Some(1000.0),
            api_number: "0512345678".to_string(),
            state_number: Some(5),
            county_number: Some(123),
            job_date: "1/1/2020".to_string(),
            ..Default::default()
        }
    }

    fn batch() -> Vec<IngredientRecord> {
        vec![
            record("1", "7732-18-5", "Water", 85.0),
            record("2", "14808-60-7", "Crystalline silica", 13.0),
            record("3", "Proprietary", "Surfactant", 2.0),
        ]
    }

    #[test]
    fn classifies_and_writes_everything() {
        let output = Arc::new(MockOutput::default());
        let use_case = ClassifyUseCase::new(
            Arc::new(MockSource(batch())),
            Arc::new(MockReferences {
                vocabulary_available: true,
            }),
            output.clone(),
            Config::default(),
        );
        let outcome = use_case.run().unwrap();

        assert_eq!(outcome.records_written, 3);
        assert_eq!(outcome.usable_written, 3);
        assert_eq!(outcome.unresolved_cas, 1);
        assert_eq!(outcome.summary.in_tolerance_events, 1);

        let written = output.records.lock().unwrap();
        assert!(written[0].has_tag(QualityTag::MassInferred));
        assert!(written[2].has_tag(QualityTag::ProprietaryClaim));
        assert_eq!(output.curation.lock().unwrap()[0].cas_raw, "Proprietary");
    }

    #[test]
    fn missing_vocabulary_is_fatal() {
        let output = Arc::new(MockOutput::default());
        let use_case = ClassifyUseCase::new(
            Arc::new(MockSource(batch())),
            Arc::new(MockReferences {
                vocabulary_available: false,
            }),
            output.clone(),
            Config::default(),
        );
        assert!(use_case.run().is_err());
        assert!(output.records.lock().unwrap().is_empty());
    }

    #[test]
    fn validate_counts_without_classifying() {
        let mut records = batch();
        records.push(IngredientRecord {
            event_id: "ev-2".to_string(),
            ..Default::default()
        });
        let use_case = ClassifyUseCase::new(
            Arc::new(MockSource(records)),
            Arc::new(MockReferences {
                vocabulary_available: true,
            }),
            Arc::new(MockOutput::default()),
            Config::default(),
        );
        let outcome = use_case.validate().unwrap();
        assert_eq!(
            outcome,
            ValidationOutcome {
                records: 4,
                events: 2,
                placeholder_records: 1
            }
        );
    }
}
