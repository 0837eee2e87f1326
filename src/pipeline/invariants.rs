use tracing::debug;

use crate::domain::{IngredientRecord, RecordSet};
use crate::error::{PipelineError, Result};

/// Event-level fields that must be identical on every record of an event.
///
/// `operator_name` is free text and not part of the check; blank variants of
/// it are normalized later by the canonicalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventField {
    TotalBaseFluidVolume,
    ApiNumber,
    StateNumber,
    CountyNumber,
    JobDate,
}

impl EventField {
    pub const ALL: [EventField; 5] = [
        EventField::TotalBaseFluidVolume,
        EventField::ApiNumber,
        EventField::StateNumber,
        EventField::CountyNumber,
        EventField::JobDate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventField::TotalBaseFluidVolume => "total_base_fluid_volume",
            EventField::ApiNumber => "api_number",
            EventField::StateNumber => "state_number",
            EventField::CountyNumber => "county_number",
            EventField::JobDate => "job_date",
        }
    }

    fn text(&self, record: &IngredientRecord) -> String {
        let optional = |value: Option<u32>| value.map(|v| v.to_string()).unwrap_or_default();
        match self {
            EventField::TotalBaseFluidVolume => record
                .total_base_fluid_volume
                .map(|v| v.to_string())
                .unwrap_or_default(),
            EventField::ApiNumber => record.api_number.clone(),
            EventField::StateNumber => optional(record.state_number),
            EventField::CountyNumber => optional(record.county_number),
            EventField::JobDate => record.job_date.clone(),
        }
    }

    fn matches(&self, a: &IngredientRecord, b: &IngredientRecord) -> bool {
        match self {
            // bitwise, so NaN equals itself and -0.0 differs from 0.0
            EventField::TotalBaseFluidVolume => {
                a.total_base_fluid_volume.map(f64::to_bits) == b.total_base_fluid_volume.map(f64::to_bits)
            }
            EventField::ApiNumber => a.api_number == b.api_number,
            EventField::StateNumber => a.state_number == b.state_number,
            EventField::CountyNumber => a.county_number == b.county_number,
            EventField::JobDate => a.job_date == b.job_date,
        }
    }
}

/// First event-level field on which two records of one event disagree
pub fn event_conflict(event_id: &str, a: &IngredientRecord, b: &IngredientRecord) -> Option<PipelineError> {
    EventField::ALL
        .iter()
        .find(|field| !field.matches(a, b))
        .map(|field| PipelineError::InconsistentEvent {
            event_id: event_id.to_string(),
            field: field.as_str(),
            first: field.text(a),
            second: field.text(b),
        })
}

/// Fails on the first event whose records disagree on an event-level field.
///
/// Runs before any phase: disagreement means ingestion is corrupt and no
/// tag written afterwards could be trusted.
pub fn check_event_consistency(records: &RecordSet) -> Result<()> {
    for (event_id, rows) in records.events() {
        let mut members = rows.iter().filter_map(|&idx| records.get(idx));
        let Some(first) = members.next() else {
            continue;
        };
        for other in members {
            if let Some(err) = event_conflict(event_id, first, other) {
                return Err(err);
            }
        }
    }
    debug!("Event-level fields consistent across {} events", records.event_count());
    Ok(())
}
