use std::collections::HashMap;
use tracing::info;

use crate::config::RedundancyConfig;
use crate::domain::{IngredientRecord, QualityTag, RecordSet};
use crate::error::Result;
use crate::pipeline::phase::{Phase, PhaseReport};

/// Exact-duplicate key within an event. Quantities compare bitwise so that
/// absent and present values never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DuplicateKey<'a> {
    event_id: &'a str,
    ingredient_name: &'a str,
    cas_raw: &'a str,
    mass_reported: Option<u64>,
    percent_of_job: Option<u64>,
}

impl<'a> DuplicateKey<'a> {
    fn of(record: &'a IngredientRecord) -> Self {
        Self {
            event_id: &record.event_id,
            ingredient_name: &record.ingredient_name,
            cas_raw: &record.cas_raw,
            mass_reported: record.mass_reported.map(f64::to_bits),
            percent_of_job: record.percent_of_job.map(f64::to_bits),
        }
    }
}

/// Finds rows repeated by the PDF-to-table conversion of older disclosures.
///
/// Duplicates are detected over (event, ingredient name, raw CAS, mass,
/// percent) among detail records. Only matched records whose supplier reads
/// "listed above" and whose purpose starts with "see trade" are redundant;
/// other duplicates may be genuine and are kept.
pub struct RedundancyDetector {
    config: RedundancyConfig,
}

impl RedundancyDetector {
    pub fn new(config: RedundancyConfig) -> Self {
        Self { config }
    }

    fn has_conversion_signature(&self, record: &IngredientRecord) -> bool {
        let supplier = record.supplier.trim().to_lowercase();
        let purpose = record.purpose.trim_start().to_lowercase();
        supplier == self.config.supplier_marker.to_lowercase()
            && purpose.starts_with(&self.config.purpose_prefix.to_lowercase())
    }
}

impl Phase for RedundancyDetector {
    fn name(&self) -> &'static str {
        "redundancy"
    }

    fn apply(&self, records: &mut RecordSet) -> Result<PhaseReport> {
        let mut report = PhaseReport::new(self.name());

        let mut groups: HashMap<DuplicateKey<'_>, Vec<usize>> = HashMap::new();
        for (idx, record) in records.records().iter().enumerate() {
            if record.record_id.is_some() {
                groups.entry(DuplicateKey::of(record)).or_default().push(idx);
            }
        }

        let mut duplicates: Vec<usize> = groups
            .into_values()
            .filter(|members| members.len() > 1)
            .flatten()
            .collect();
        duplicates.sort_unstable();

        let all = records.records_mut();
        for &idx in &duplicates {
            let record = &mut all[idx];
            record.derived.is_duplicate_record = true;
            if record.has_tag(QualityTag::CasPerfectMatch) && self.has_conversion_signature(record) {
                record.derived.is_redundant_record = true;
                report.tag(record, QualityTag::RedundantRecord);
            }
        }

        report.count("duplicate_records", duplicates.len());
        info!(
            "Duplicate records: {}; redundant records flagged: {}",
            duplicates.len(),
            report.tagged(QualityTag::RedundantRecord)
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(record_id: &str, supplier: &str, purpose: &str, matched: bool) -> IngredientRecord {
        let mut rec = IngredientRecord {
            event_id: "ev".to_string(),
            record_id: Some(record_id.to_string()),
            cas_raw: "7732-18-5".to_string(),
            ingredient_name: "Water".to_string(),
            supplier: supplier.to_string(),
            purpose: purpose.to_string(),
            percent_of_job: Some(85.0),
            ..Default::default()
        };
        if matched {
            rec.tag(QualityTag::CasPerfectMatch);
        }
        rec
    }

    #[test]
    fn flags_only_conversion_artifacts() {
        let mut set = RecordSet::new(vec![
            record("1", "Operator", "Carrier", true),
            record("2", "Listed Above", "See Trade Name(s) List", true),
        ]);
        let report = RedundancyDetector::new(RedundancyConfig::default())
            .apply(&mut set)
            .unwrap();
        let recs = set.records();
        assert!(recs.iter().all(|r| r.derived.is_duplicate_record));
        assert!(!recs[0].has_tag(QualityTag::RedundantRecord));
        assert!(recs[1].has_tag(QualityTag::RedundantRecord));
        assert!(recs[1].derived.is_redundant_record);
        assert_eq!(report.counter("duplicate_records"), 2);
    }

    #[test]
    fn unique_rows_are_never_redundant() {
        let mut lone = record("1", "listed above", "see trade name", true);
        lone.percent_of_job = Some(1.0);
        let other = record("2", "listed above", "see trade name", true);
        let mut set = RecordSet::new(vec![lone, other]);
        RedundancyDetector::new(RedundancyConfig::default())
            .apply(&mut set)
            .unwrap();
        assert!(set.records().iter().all(|r| r.tags().len() == 1));
        assert!(set.records().iter().all(|r| !r.derived.is_duplicate_record));
    }

    #[test]
    fn unmatched_duplicates_are_kept() {
        let mut set = RecordSet::new(vec![
            record("1", "listed above", "see trade name", false),
            record("2", "listed above", "see trade name", false),
        ]);
        RedundancyDetector::new(RedundancyConfig::default())
            .apply(&mut set)
            .unwrap();
        assert!(set.records().iter().all(|r| !r.has_tag(QualityTag::RedundantRecord)));
    }

    #[test]
    fn placeholder_rows_are_ignored() {
        let mut a = record("1", "listed above", "see trade name", true);
        let mut b = record("2", "listed above", "see trade name", true);
        a.record_id = None;
        b.record_id = None;
        let mut set = RecordSet::new(vec![a, b]);
        RedundancyDetector::new(RedundancyConfig::default())
            .apply(&mut set)
            .unwrap();
        assert!(set.records().iter().all(|r| !r.derived.is_duplicate_record));
    }
}
