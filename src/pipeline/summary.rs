use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::info;

use crate::domain::{QualityTag, RecordSet};
use crate::pipeline::processing::percent::{bucket_counts, event_percent_totals};
use crate::pipeline::runner::PipelineReport;
use crate::reference::ReferenceVocabulary;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BucketCount {
    pub bucket: String,
    pub events: usize,
}

/// Raw and filtered statistics of one run
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RunSummary {
    pub total_records: usize,
    pub total_events: usize,
    pub usable_records: usize,
    pub records_per_tag: BTreeMap<String, usize>,
    pub percent_buckets: Vec<BucketCount>,
    pub empty_events: usize,
    pub duplicate_events: usize,
    pub in_tolerance_events: usize,
    pub well_id_fallbacks: usize,
    pub unparsed_dates: usize,
    pub vocabulary_cas_numbers: usize,
    pub vocabulary_synonyms: usize,
}

fn events_with(records: &RecordSet, tag: QualityTag) -> usize {
    records
        .records()
        .iter()
        .filter(|r| r.has_tag(tag))
        .map(|r| r.event_id.as_str())
        .collect::<HashSet<_>>()
        .len()
}

impl RunSummary {
    pub fn collect(
        records: &RecordSet,
        report: &PipelineReport,
        vocabulary: &ReferenceVocabulary,
    ) -> Self {
        let records_per_tag = QualityTag::ALL
            .iter()
            .map(|tag| {
                let n = records.records().iter().filter(|r| r.has_tag(*tag)).count();
                (tag.as_str().to_string(), n)
            })
            .collect();

        let percent_buckets = bucket_counts(&event_percent_totals(records))
            .into_iter()
            .map(|(bucket, events)| BucketCount {
                bucket: bucket.label().to_string(),
                events,
            })
            .collect();

        let canonicalize_counter = |name: &str| {
            report
                .phase("canonicalize")
                .map(|phase| phase.counter(name))
                .unwrap_or(0)
        };

        Self {
            total_records: records.len(),
            total_events: records.event_count(),
            usable_records: records.usable().count(),
            records_per_tag,
            percent_buckets,
            empty_events: events_with(records, QualityTag::EmptyEvent),
            duplicate_events: events_with(records, QualityTag::DuplicateEvent),
            in_tolerance_events: events_with(records, QualityTag::InToleranceRange),
            well_id_fallbacks: canonicalize_counter("well_id_fallbacks"),
            unparsed_dates: canonicalize_counter("unparsed_dates"),
            vocabulary_cas_numbers: vocabulary.len(),
            vocabulary_synonyms: vocabulary.synonym_count(),
        }
    }

    pub fn log(&self) {
        info!(
            "Run summary: {} records in {} events, {} usable",
            self.total_records, self.total_events, self.usable_records
        );
        info!(
            "Events removed: empty: {}, duplicate: {}; events with inferred mass: {}",
            self.empty_events, self.duplicate_events, self.in_tolerance_events
        );
        for bucket in &self.percent_buckets {
            info!("  percent total {:>10}: {} events", bucket.bucket, bucket.events);
        }
        for (tag, count) in &self.records_per_tag {
            info!("  {:<22} {}", tag, count);
        }
    }
}
