use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, info_span};

use crate::config::Config;
use crate::domain::{RecordSet, TagSet};
use crate::error::{PipelineError, Result};
use crate::observability::metrics;
use crate::pipeline::invariants::check_event_consistency;
use crate::pipeline::phase::{Phase, PhaseReport};
use crate::pipeline::processing::{
    CasMatcher, Canonicalizer, EventFilter, MassApportioner, PercentValidator,
    ProprietaryClassifier, RedundancyDetector,
};
use crate::reference::{LabelTable, ReferenceVocabulary};

/// Result of a complete pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub records: usize,
    pub events: usize,
    pub phases: Vec<PhaseReport>,
}

impl PipelineReport {
    pub fn phase(&self, name: &str) -> Option<&PhaseReport> {
        self.phases.iter().find(|report| report.phase == name)
    }
}

/// Runs the phases in order over the full record set.
///
/// Each phase completes over every event before the next one starts. The
/// run aborts, leaving no partially classified output, if the event-level
/// invariant fails or if a phase drops a tag.
pub struct Pipeline {
    phases: Vec<Box<dyn Phase>>,
}

impl Pipeline {
    /// The seven-phase classification pipeline
    pub fn new(
        config: &Config,
        vocabulary: Arc<ReferenceVocabulary>,
        labels: Arc<LabelTable>,
    ) -> Self {
        Self::with_phases(vec![
            Box::new(Canonicalizer::new(config.canonicalize.clone())),
            Box::new(EventFilter::new()),
            Box::new(CasMatcher::new(vocabulary)),
            Box::new(ProprietaryClassifier::new(labels)),
            Box::new(RedundancyDetector::new(config.redundancy.clone())),
            Box::new(PercentValidator::new(
                config.percent.clone(),
                config.carrier.clone(),
            )),
            Box::new(MassApportioner::new(
                config.carrier.clone(),
                config.mass.clone(),
            )),
        ])
    }

    pub fn with_phases(phases: Vec<Box<dyn Phase>>) -> Self {
        Self { phases }
    }

    pub fn phase_names(&self) -> Vec<&'static str> {
        self.phases.iter().map(|phase| phase.name()).collect()
    }

    pub fn run(&self, records: &mut RecordSet) -> Result<PipelineReport> {
        check_event_consistency(records)?;

        let mut reports = Vec::with_capacity(self.phases.len());
        for phase in &self.phases {
            let span = info_span!("phase", name = phase.name());
            let _enter = span.enter();

            let before: Vec<TagSet> = records.records().iter().map(|r| *r.tags()).collect();
            let start_time = Instant::now();
            let report = phase.apply(records)?;
            let elapsed = start_time.elapsed();

            if let Some(record_index) = before
                .iter()
                .zip(records.records())
                .position(|(prior, record)| !record.tags().is_superset_of(prior))
            {
                return Err(PipelineError::TagRegression {
                    phase: phase.name(),
                    record_index,
                });
            }

            metrics::phases::duration(phase.name(), elapsed.as_secs_f64());
            for (tag, count) in &report.tags_added {
                metrics::phases::tags_added(phase.name(), *tag, *count);
            }
            info!(
                "Phase {} finished in {:.3}s, tags added: {:?}",
                phase.name(),
                elapsed.as_secs_f64(),
                report.tags_added
            );
            reports.push(report);
        }

        Ok(PipelineReport {
            records: records.len(),
            events: records.event_count(),
            phases: reports,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{IngredientRecord, QualityTag};

    struct Clearing;

    impl Phase for Clearing {
        fn name(&self) -> &'static str {
            "clearing"
        }

        fn apply(&self, records: &mut RecordSet) -> Result<PhaseReport> {
            for record in records.records_mut() {
                record.derived.quality_tags = TagSet::new();
            }
            Ok(PhaseReport::new(self.name()))
        }
    }

    struct Marking;

    impl Phase for Marking {
        fn name(&self) -> &'static str {
            "marking"
        }

        fn apply(&self, records: &mut RecordSet) -> Result<PhaseReport> {
            let mut report = PhaseReport::new(self.name());
            for record in records.records_mut() {
                report.tag(record, QualityTag::CasPerfectMatch);
            }
            Ok(report)
        }
    }

    fn record(event_id: &str) -> IngredientRecord {
        IngredientRecord {
            event_id: event_id.to_string(),
            record_id: Some("r".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn default_phase_order() {
        let pipeline = Pipeline::new(
            &Config::default(),
            Arc::new(ReferenceVocabulary::default()),
            Arc::new(LabelTable::default()),
        );
        assert_eq!(
            pipeline.phase_names(),
            vec![
                "canonicalize",
                "event_filter",
                "cas_match",
                "proprietary",
                "redundancy",
                "percent",
                "mass"
            ]
        );
    }

    #[test]
    fn tag_removal_aborts_the_run() {
        let pipeline = Pipeline::with_phases(vec![Box::new(Marking), Box::new(Clearing)]);
        let mut set = RecordSet::new(vec![record("a")]);
        match pipeline.run(&mut set) {
            Err(PipelineError::TagRegression {
                phase,
                record_index,
            }) => {
                assert_eq!(phase, "clearing");
                assert_eq!(record_index, 0);
            }
            other => panic!("expected TagRegression, got {:?}", other),
        }
    }

    #[test]
    fn collects_one_report_per_phase() {
        let pipeline = Pipeline::with_phases(vec![Box::new(Marking), Box::new(Marking)]);
        let mut set = RecordSet::new(vec![record("a"), record("b")]);
        let report = pipeline.run(&mut set).unwrap();
        assert_eq!(report.phases.len(), 2);
        assert_eq!(report.events, 2);
        assert_eq!(report.phases[0].tagged(QualityTag::CasPerfectMatch), 2);
        assert_eq!(report.phases[1].tagged(QualityTag::CasPerfectMatch), 0);
    }

    #[test]
    fn inconsistent_events_fail_before_any_phase() {
        let mut a = record("a");
        let mut b = record("a");
        a.api_number = "0512345678".to_string();
        b.api_number = "0599999999".to_string();
        let pipeline = Pipeline::with_phases(vec![Box::new(Marking)]);
        let mut set = RecordSet::new(vec![a, b]);
        assert!(matches!(
            pipeline.run(&mut set),
            Err(PipelineError::InconsistentEvent { .. })
        ));
        assert!(set.records().iter().all(|r| r.tags().is_empty()));
    }
}
