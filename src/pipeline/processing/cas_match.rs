use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use super::canonicalize::canonicalize_cas;
use crate::constants::UNRESOLVED_CAS;
use crate::domain::{QualityTag, RecordSet};
use crate::error::Result;
use crate::pipeline::phase::{Phase, PhaseReport};
use crate::reference::ReferenceVocabulary;

/// Exact lookup of each record's canonical CAS candidate in the reference
/// vocabulary. Approximate correction belongs to the curation tools, which
/// feed improvements back as a new vocabulary.
pub struct CasMatcher {
    vocabulary: Arc<ReferenceVocabulary>,
}

impl CasMatcher {
    pub fn new(vocabulary: Arc<ReferenceVocabulary>) -> Self {
        Self { vocabulary }
    }
}

impl Phase for CasMatcher {
    fn name(&self) -> &'static str {
        "cas_match"
    }

    fn apply(&self, records: &mut RecordSet) -> Result<PhaseReport> {
        let mut report = PhaseReport::new(self.name());
        let mut resolved: HashMap<String, Option<String>> = HashMap::new();

        for record in records.records_mut() {
            let candidate = record
                .derived
                .cas_candidate
                .get_or_insert_with(|| canonicalize_cas(&record.cas_raw))
                .clone();
            let hit = resolved
                .entry(candidate)
                .or_insert_with_key(|cas| self.vocabulary.lookup(cas).map(str::to_string))
                .clone();

            match hit {
                Some(key) => {
                    record.derived.canonical_cas = Some(key);
                    report.tag(record, QualityTag::CasPerfectMatch);
                }
                None => {
                    record.derived.canonical_cas = Some(UNRESOLVED_CAS.to_string());
                }
            }
        }

        let matched_values = resolved.values().filter(|hit| hit.is_some()).count();
        report.count("distinct_candidates", resolved.len());
        report.count("matched_candidates", matched_values);
        info!(
            "Number of perfect matches: {} of {} distinct identifiers; records affected: {}",
            matched_values,
            resolved.len(),
            report.tagged(QualityTag::CasPerfectMatch)
        );
        Ok(report)
    }
}
