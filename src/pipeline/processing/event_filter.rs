use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::info;

use crate::domain::{QualityTag, RecordSet};
use crate::error::Result;
use crate::pipeline::phase::{Phase, PhaseReport};

/// Flags whole disclosure events that cannot be analysed.
///
/// * `EMPTY_EVENT`: no record of the event carries a detail `record_id`.
///   Such events have header data (location, operator, volume) but no
///   ingredients, and would distort presence/absence estimates.
/// * `DUPLICATE_EVENT`: two or more non-empty events share a well and job
///   date. Every member is flagged; revision order says nothing about which
///   version is correct, so none is kept.
#[derive(Debug, Default)]
pub struct EventFilter;

impl EventFilter {
    pub fn new() -> Self {
        Self
    }
}

impl Phase for EventFilter {
    fn name(&self) -> &'static str {
        "event_filter"
    }

    fn apply(&self, records: &mut RecordSet) -> Result<PhaseReport> {
        let mut report = PhaseReport::new(self.name());

        let mut empty_rows: Vec<usize> = Vec::new();
        let mut by_well_date: HashMap<(String, NaiveDate), Vec<&[usize]>> = HashMap::new();
        let mut empty_events = 0;

        for (_, rows) in records.events() {
            let all_placeholders = rows
                .iter()
                .all(|&idx| records.records()[idx].record_id.is_none());
            if all_placeholders {
                empty_events += 1;
                empty_rows.extend_from_slice(rows);
                continue;
            }
            let first = &records.records()[rows[0]];
            if let (Some(well), Some(date)) = (&first.derived.well_id10, first.derived.parsed_date) {
                by_well_date.entry((well.clone(), date)).or_default().push(rows);
            }
        }

        let mut duplicate_rows: Vec<usize> = Vec::new();
        let mut duplicate_events = 0;
        for members in by_well_date.values().filter(|members| members.len() > 1) {
            duplicate_events += members.len();
            for rows in members {
                duplicate_rows.extend_from_slice(rows);
            }
        }

        let all = records.records_mut();
        for idx in empty_rows {
            report.tag(&mut all[idx], QualityTag::EmptyEvent);
        }
        for idx in duplicate_rows {
            report.tag(&mut all[idx], QualityTag::DuplicateEvent);
        }

        report.count("empty_events", empty_events);
        report.count("duplicate_events", duplicate_events);
        info!(
            "Removed events: empty: {}, duplicate: {}",
            empty_events, duplicate_events
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::IngredientRecord;

    fn record(event_id: &str, record_id: Option<&str>, well: &str, day: u32) -> IngredientRecord {
        let mut rec = IngredientRecord {
            event_id: event_id.to_string(),
            record_id: record_id.map(str::to_string),
            ..Default::default()
        };
        rec.derived.well_id10 = Some(well.to_string());
        rec.derived.parsed_date = NaiveDate::from_ymd_opt(2020, 1, day);
        rec
    }

    #[test]
    fn flags_event_without_detail_records() {
        let mut set = RecordSet::new(vec![
            record("empty", None, "0512345678", 1),
            record("full", Some("r1"), "0599999999", 1),
        ]);
        let report = EventFilter::new().apply(&mut set).unwrap();
        assert!(set.records()[0].has_tag(QualityTag::EmptyEvent));
        assert!(!set.records()[1].has_tag(QualityTag::EmptyEvent));
        assert_eq!(report.counter("empty_events"), 1);
    }

    #[test]
    fn flags_every_member_of_a_duplicate_group() {
        let mut set = RecordSet::new(vec![
            record("a", Some("a1"), "0512345678", 1),
            record("a", Some("a2"), "0512345678", 1),
            record("b", Some("b1"), "0512345678", 1),
            record("c", Some("c1"), "0512345678", 2),
        ]);
        let report = EventFilter::new().apply(&mut set).unwrap();
        for rec in set.event_records("a").chain(set.event_records("b")) {
            assert!(rec.has_tag(QualityTag::DuplicateEvent));
        }
        assert!(!set.event_records("c").any(|r| r.has_tag(QualityTag::DuplicateEvent)));
        assert_eq!(report.counter("duplicate_events"), 2);
        assert_eq!(report.tagged(QualityTag::DuplicateEvent), 3);
    }

    #[test]
    fn empty_events_do_not_form_duplicates() {
        let mut set = RecordSet::new(vec![
            record("placeholder", None, "0512345678", 1),
            record("real", Some("r1"), "0512345678", 1),
        ]);
        EventFilter::new().apply(&mut set).unwrap();
        assert!(!set.records()[1].has_tag(QualityTag::DuplicateEvent));
    }

    #[test]
    fn events_without_dates_are_not_grouped() {
        let mut a = record("a", Some("a1"), "0512345678", 1);
        let mut b = record("b", Some("b1"), "0512345678", 1);
        a.derived.parsed_date = None;
        b.derived.parsed_date = None;
        let mut set = RecordSet::new(vec![a, b]);
        EventFilter::new().apply(&mut set).unwrap();
        assert!(set.records().iter().all(|r| r.tags().is_empty()));
    }
}
