//! First phase: blank normalization, CAS and well-identifier canonicalization,
//! job-date parsing and system-approach detection.

pub mod cas;
pub mod dates;
pub mod well;

use rayon::prelude::*;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::config::{BlankField, CanonicalizeConfig};
use crate::constants::EMPTY_ENTRY;
use crate::domain::{IngredientRecord, RecordSet};
use crate::error::Result;
use crate::observability::metrics;
use crate::pipeline::phase::{Phase, PhaseReport};

pub use cas::canonicalize_cas;
pub use dates::parse_job_date;
pub use well::{reconcile_well_id, WellIdOutcome};

/// Per-event values computed once and broadcast to every record of the event
#[derive(Debug, Clone, Default)]
struct EventCanon {
    well_id10: Option<String>,
    well_fallback: bool,
    system_supplier: Option<String>,
    is_system_approach: bool,
}

pub struct Canonicalizer {
    config: CanonicalizeConfig,
}

impl Canonicalizer {
    pub fn new(config: CanonicalizeConfig) -> Self {
        Self { config }
    }

    fn is_blank(&self, value: &str) -> bool {
        let value = value.trim();
        self.config
            .blank_sentinels
            .iter()
            .any(|sentinel| sentinel.trim().eq_ignore_ascii_case(value))
    }

    fn normalize_blanks(&self, record: &mut IngredientRecord) {
        for field in &self.config.blank_fields {
            let value = match field {
                BlankField::CasRaw => &mut record.cas_raw,
                BlankField::IngredientName => &mut record.ingredient_name,
                BlankField::Supplier => &mut record.supplier,
                BlankField::Purpose => &mut record.purpose,
                BlankField::TradeName => &mut record.trade_name,
                BlankField::OperatorName => &mut record.operator_name,
            };
            if self.is_blank(value) {
                let original = std::mem::replace(value, EMPTY_ENTRY.to_string());
                if *field == BlankField::CasRaw {
                    record.derived.cas_raw_original = Some(original);
                }
            }
        }
    }

    /// Well id and system-approach facts for one event
    fn canonicalize_event(&self, event_id: &str, rows: &[&IngredientRecord]) -> EventCanon {
        let Some(first) = rows.first() else {
            return EventCanon::default();
        };

        let outcome = reconcile_well_id(&first.api_number, first.state_number, first.county_number);
        if outcome.is_fallback() {
            warn!(
                event_id = %event_id,
                api_number = %first.api_number,
                "API10 adjustment failed, using raw prefix"
            );
            metrics::canonicalize::well_id_adjustment_failed();
        }
        let well_id10 = Some(outcome.well_id10().to_string()).filter(|id| !id.is_empty());

        let marker = self.config.system_approach_marker.trim();
        let mut supplier_counts: Vec<(&str, usize)> = Vec::new();
        for record in rows.iter().filter(|r| r.cas_raw.trim().eq_ignore_ascii_case(marker)) {
            match supplier_counts.iter_mut().find(|(s, _)| *s == record.supplier) {
                Some((_, n)) => *n += 1,
                None => supplier_counts.push((record.supplier.as_str(), 1)),
            }
        }
        // max_by_key keeps the last maximum; iterate reversed to keep the first
        let system_supplier = supplier_counts
            .iter()
            .rev()
            .max_by_key(|(_, n)| *n)
            .map(|(s, _)| s.to_string());

        EventCanon {
            well_id10,
            well_fallback: outcome.is_fallback(),
            is_system_approach: system_supplier.is_some(),
            system_supplier,
        }
    }
}

impl Phase for Canonicalizer {
    fn name(&self) -> &'static str {
        "canonicalize"
    }

    fn apply(&self, records: &mut RecordSet) -> Result<PhaseReport> {
        let mut report = PhaseReport::new(self.name());

        records
            .records_mut()
            .par_iter_mut()
            .for_each(|record| self.normalize_blanks(record));

        // CAS candidates over distinct raw values
        let mut candidates: HashMap<String, String> = HashMap::new();
        for record in records.records() {
            if !candidates.contains_key(&record.cas_raw) {
                candidates.insert(record.cas_raw.clone(), canonicalize_cas(&record.cas_raw));
            }
        }
        report.count("distinct_cas_raw", candidates.len());
        debug!("Canonicalized {} distinct CAS strings", candidates.len());

        // Dates over distinct raw values
        let parsed_dates = dates::parse_distinct(records.records().iter().map(|r| r.job_date.as_str()))
            .into_iter()
            .map(|(text, date)| (text.to_string(), date))
            .collect::<HashMap<String, _>>();
        let unparsed: Vec<&String> = parsed_dates
            .iter()
            .filter(|(text, date)| date.is_none() && !text.trim().is_empty())
            .map(|(text, _)| text)
            .collect();
        for text in &unparsed {
            warn!(job_date = %text, "Unparseable job date, leaving date empty");
        }
        report.count("unparsed_dates", unparsed.len());
        metrics::canonicalize::dates_unparsed(unparsed.len());

        // Event-level values, one computation per event
        let event_canon: HashMap<String, EventCanon> = records
            .event_groups()
            .par_iter()
            .map(|(event_id, rows)| {
                let rows: Vec<&IngredientRecord> = rows
                    .iter()
                    .filter_map(|&idx| records.get(idx))
                    .collect();
                (event_id.to_string(), self.canonicalize_event(event_id, &rows))
            })
            .collect();

        let fallbacks = event_canon.values().filter(|c| c.well_fallback).count();
        let system_events = event_canon.values().filter(|c| c.is_system_approach).count();
        report.count("well_id_fallbacks", fallbacks);
        report.count("system_approach_events", system_events);

        for record in records.records_mut() {
            record.derived.cas_candidate = candidates.get(&record.cas_raw).cloned();
            record.derived.parsed_date = parsed_dates.get(&record.job_date).copied().flatten();
            if let Some(canon) = event_canon.get(&record.event_id) {
                record.derived.well_id10 = canon.well_id10.clone();
                record.derived.is_system_approach = canon.is_system_approach;
                record.derived.system_supplier = canon.system_supplier.clone();
            }
        }

        info!(
            "Canonicalized {} records across {} events ({} well-id fallbacks, {} unparsed dates)",
            records.len(),
            records.event_count(),
            fallbacks,
            unparsed.len()
        );
        Ok(report)
    }
}
