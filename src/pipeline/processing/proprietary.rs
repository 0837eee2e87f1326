use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::domain::{QualityTag, RecordSet};
use crate::error::Result;
use crate::pipeline::phase::{Phase, PhaseReport};
use crate::reference::LabelTable;

/// Flags explicit trade-secret claims and identity-masking placeholders
/// using the curated label table.
///
/// A masked identity with a reported quantity (`MASKED_WITH_QUANTITY`) hides
/// real material; one without a quantity (`MASKED_NO_QUANTITY`) is usually a
/// non-data row. Both disqualify the record.
pub struct ProprietaryClassifier {
    labels: Arc<LabelTable>,
}

impl ProprietaryClassifier {
    pub fn new(labels: Arc<LabelTable>) -> Self {
        Self { labels }
    }
}

impl Phase for ProprietaryClassifier {
    fn name(&self) -> &'static str {
        "proprietary"
    }

    fn apply(&self, records: &mut RecordSet) -> Result<PhaseReport> {
        let mut report = PhaseReport::new(self.name());
        let mut verdicts: HashMap<String, (bool, bool)> = HashMap::new();

        for record in records.records_mut() {
            let (proprietary, hiding) = *verdicts
                .entry(record.disclosed_cas().to_string())
                .or_insert_with_key(|raw| (self.labels.is_proprietary(raw), self.labels.is_hiding(raw)));

            if proprietary {
                record.derived.is_proprietary = true;
                report.tag(record, QualityTag::ProprietaryClaim);
            }
            if hiding {
                record.derived.is_masked_identity = true;
                let tag = if record.reports_quantity() {
                    QualityTag::MaskedWithQuantity
                } else {
                    QualityTag::MaskedNoQuantity
                };
                report.tag(record, tag);
            }
        }

        info!(
            "Total proprietary records: {}; masked with quantity: {}; masked without quantity: {}",
            report.tagged(QualityTag::ProprietaryClaim),
            report.tagged(QualityTag::MaskedWithQuantity),
            report.tagged(QualityTag::MaskedNoQuantity)
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::IngredientRecord;
    use crate::reference::LabelRow;

    fn labels() -> Arc<LabelTable> {
        Arc::new(LabelTable::new(vec![
            LabelRow {
                label: "Proprietary".to_string(),
                count: 10,
                proprietary: true,
                hiding: false,
            },
            LabelRow {
                label: "See SDS".to_string(),
                count: 4,
                proprietary: false,
                hiding: true,
            },
        ]))
    }

    fn record(cas_raw: &str, percent: Option<f64>, mass: Option<f64>) -> IngredientRecord {
        IngredientRecord {
            event_id: "ev".to_string(),
            record_id: Some("r".to_string()),
            cas_raw: cas_raw.to_string(),
            percent_of_job: percent,
            mass_reported: mass,
            ..Default::default()
        }
    }

    #[test]
    fn flags_proprietary_claims() {
        let mut set = RecordSet::new(vec![record(" PROPRIETARY", Some(0.2), None)]);
        ProprietaryClassifier::new(labels()).apply(&mut set).unwrap();
        let rec = &set.records()[0];
        assert!(rec.has_tag(QualityTag::ProprietaryClaim));
        assert!(rec.derived.is_proprietary);
        assert!(!rec.derived.is_masked_identity);
    }

    #[test]
    fn masking_splits_on_quantity() {
        let mut set = RecordSet::new(vec![
            record("see sds", Some(0.0), Some(0.0)),
            record("see sds", Some(1.5), None),
            record("see sds", None, Some(12.0)),
            record("see sds", None, None),
        ]);
        let report = ProprietaryClassifier::new(labels()).apply(&mut set).unwrap();
        let recs = set.records();
        assert!(recs[0].has_tag(QualityTag::MaskedNoQuantity));
        assert!(!recs[0].has_tag(QualityTag::MaskedWithQuantity));
        assert!(recs[1].has_tag(QualityTag::MaskedWithQuantity));
        assert!(recs[2].has_tag(QualityTag::MaskedWithQuantity));
        assert!(recs[3].has_tag(QualityTag::MaskedNoQuantity));
        assert!(recs.iter().all(|r| r.derived.is_masked_identity));
        assert_eq!(report.tagged(QualityTag::MaskedWithQuantity), 2);
    }

    #[test]
    fn labels_match_text_before_blank_normalization() {
        let mut rec = record("_empty_entry_", Some(5.0), None);
        rec.derived.cas_raw_original = Some("See SDS".to_string());
        let mut set = RecordSet::new(vec![rec]);
        ProprietaryClassifier::new(labels()).apply(&mut set).unwrap();
        let rec = &set.records()[0];
        assert!(rec.has_tag(QualityTag::MaskedWithQuantity));
        assert!(rec.derived.is_masked_identity);
    }

    #[test]
    fn ordinary_identifiers_untouched() {
        let mut set = RecordSet::new(vec![record("7732-18-5", Some(80.0), None)]);
        ProprietaryClassifier::new(labels()).apply(&mut set).unwrap();
        assert!(set.records()[0].tags().is_empty());
    }
}
