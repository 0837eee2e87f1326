use serde::Serialize;
use std::collections::HashMap;

use crate::domain::{QualityTag, RecordSet};
use crate::reference::LabelTable;

/// One raw CAS text still lacking a vocabulary match
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UnresolvedCas {
    pub cas_raw: String,
    pub cas_candidate: String,
    pub records: usize,
    pub proprietary: bool,
    pub hiding: bool,
    /// Share of all unresolved records covered by this entry and every
    /// entry above it
    pub cumulative_fraction: f64,
}

#[derive(Default)]
struct Tally<'a> {
    records: usize,
    candidate: &'a str,
    proprietary: bool,
    hiding: bool,
}

/// Work list for the curation tools: unresolved raw CAS texts, most
/// frequent first, with the cumulative coverage curve.
///
/// Label flags come from the disclosed text, so a blank-normalized entry is
/// flagged when any of the placeholders it absorbed is a curated label.
pub fn unresolved_cas_report(records: &RecordSet, labels: &LabelTable) -> Vec<UnresolvedCas> {
    let mut tallies: HashMap<&str, Tally> = HashMap::new();
    for record in records.records() {
        if record.has_tag(QualityTag::CasPerfectMatch) {
            continue;
        }
        let tally = tallies.entry(record.cas_raw.as_str()).or_insert_with(|| Tally {
            candidate: record.derived.cas_candidate.as_deref().unwrap_or(""),
            ..Default::default()
        });
        tally.records += 1;
        tally.proprietary |= labels.is_proprietary(record.disclosed_cas());
        tally.hiding |= labels.is_hiding(record.disclosed_cas());
    }

    let mut entries: Vec<(&str, Tally)> = tallies.into_iter().collect();
    entries.sort_by(|a, b| b.1.records.cmp(&a.1.records).then_with(|| a.0.cmp(b.0)));

    let total: usize = entries.iter().map(|(_, t)| t.records).sum();
    let mut covered = 0;
    entries
        .into_iter()
        .map(|(raw, tally)| {
            covered += tally.records;
            UnresolvedCas {
                cas_raw: raw.to_string(),
                cas_candidate: tally.candidate.to_string(),
                records: tally.records,
                proprietary: tally.proprietary,
                hiding: tally.hiding,
                cumulative_fraction: covered as f64 / total as f64,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::IngredientRecord;
    use crate::reference::LabelRow;

    fn record(cas_raw: &str, matched: bool) -> IngredientRecord {
        let mut rec = IngredientRecord {
            event_id: "ev".to_string(),
            cas_raw: cas_raw.to_string(),
            ..Default::default()
        };
        rec.derived.cas_candidate = Some(cas_raw.replace(' ', ""));
        if matched {
            rec.tag(QualityTag::CasPerfectMatch);
        }
        rec
    }

    #[test]
    fn sorted_by_count_with_coverage_curve() {
        let set = RecordSet::new(vec![
            record("7732-18-5", true),
            record("proprietary", false),
            record("proprietary", false),
            record("trade secret", false),
            record("1234-5", false),
        ]);
        let labels = LabelTable::new(vec![LabelRow {
            label: "Proprietary".to_string(),
            count: 10,
            proprietary: true,
            hiding: false,
        }]);
        let report = unresolved_cas_report(&set, &labels);

        let raws: Vec<&str> = report.iter().map(|e| e.cas_raw.as_str()).collect();
        assert_eq!(raws, vec!["proprietary", "1234-5", "trade secret"]);
        assert_eq!(report[0].records, 2);
        assert!(report[0].proprietary);
        assert!(!report[1].proprietary);
        assert_eq!(report[2].cas_candidate, "tradesecret");
        assert!((report[0].cumulative_fraction - 0.5).abs() < 1e-9);
        assert!((report[2].cumulative_fraction - 1.0).abs() < 1e-9);
    }

    #[test]
    fn blank_entries_keep_their_placeholder_flags() {
        let mut hidden = record("_empty_entry_", false);
        hidden.derived.cas_raw_original = Some("N/A".to_string());
        let mut empty = record("_empty_entry_", false);
        empty.derived.cas_raw_original = Some(String::new());
        let set = RecordSet::new(vec![hidden, empty]);
        let labels = LabelTable::new(vec![LabelRow {
            label: "n/a".to_string(),
            count: 3,
            proprietary: false,
            hiding: true,
        }]);
        let report = unresolved_cas_report(&set, &labels);
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].records, 2);
        assert!(report[0].hiding);
        assert!(!report[0].proprietary);
    }

    #[test]
    fn nothing_unresolved_gives_empty_report() {
        let set = RecordSet::new(vec![record("7732-18-5", true)]);
        assert!(unresolved_cas_report(&set, &LabelTable::default()).is_empty());
    }
}
