//! Metric names and emitters for the classification pipeline.
//!
//! Uses the `metrics` facade only; whichever recorder the host installs
//! receives these. With no recorder installed every call is a no-op.

use std::fmt;

use crate::domain::QualityTag;

/// Enum representing all metric names used in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Input
    RecordsLoaded,
    EventsLoaded,

    // Phases
    PhaseDuration,
    TagsAdded,

    // Canonicalizer
    WellIdAdjustmentFailed,
    DatesUnparsed,

    // Mass apportionment
    EventsApportioned,
    EventsApportionRejected,

    // Output
    UsableRecords,
    RecordsWritten,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::RecordsLoaded => "chem_records_loaded_total",
            MetricName::EventsLoaded => "chem_events_loaded_total",
            MetricName::PhaseDuration => "chem_phase_duration_seconds",
            MetricName::TagsAdded => "chem_tags_added_total",
            MetricName::WellIdAdjustmentFailed => "chem_well_id_adjustment_failed_total",
            MetricName::DatesUnparsed => "chem_dates_unparsed_total",
            MetricName::EventsApportioned => "chem_events_apportioned_total",
            MetricName::EventsApportionRejected => "chem_events_apportion_rejected_total",
            MetricName::UsableRecords => "chem_usable_records",
            MetricName::RecordsWritten => "chem_records_written_total",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub mod input {
    use super::MetricName;

    pub fn records_loaded(count: usize) {
        ::metrics::counter!(MetricName::RecordsLoaded.as_str()).increment(count as u64);
    }

    pub fn events_loaded(count: usize) {
        ::metrics::counter!(MetricName::EventsLoaded.as_str()).increment(count as u64);
    }
}

pub mod phases {
    use super::{MetricName, QualityTag};

    pub fn duration(phase: &'static str, secs: f64) {
        ::metrics::histogram!(MetricName::PhaseDuration.as_str(), "phase" => phase).record(secs);
    }

    pub fn tags_added(phase: &'static str, tag: QualityTag, count: usize) {
        ::metrics::counter!(
            MetricName::TagsAdded.as_str(),
            "phase" => phase,
            "tag" => tag.as_str()
        )
        .increment(count as u64);
    }
}

pub mod canonicalize {
    use super::MetricName;

    pub fn well_id_adjustment_failed() {
        ::metrics::counter!(MetricName::WellIdAdjustmentFailed.as_str()).increment(1);
    }

    pub fn dates_unparsed(count: usize) {
        ::metrics::counter!(MetricName::DatesUnparsed.as_str()).increment(count as u64);
    }
}

pub mod mass {
    use super::MetricName;

    pub fn events_apportioned(count: usize) {
        ::metrics::counter!(MetricName::EventsApportioned.as_str()).increment(count as u64);
    }

    pub fn events_rejected(count: usize) {
        ::metrics::counter!(MetricName::EventsApportionRejected.as_str()).increment(count as u64);
    }
}

pub mod output {
    use super::MetricName;

    pub fn usable_records(count: usize) {
        ::metrics::gauge!(MetricName::UsableRecords.as_str()).set(count as f64);
    }

    pub fn records_written(count: usize) {
        ::metrics::counter!(MetricName::RecordsWritten.as_str()).increment(count as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_names_are_prometheus_style() {
        for name in [
            MetricName::RecordsLoaded,
            MetricName::PhaseDuration,
            MetricName::UsableRecords,
        ] {
            assert!(name.as_str().starts_with("chem_"));
            assert!(!name.as_str().contains('-'));
        }
        assert_eq!(MetricName::TagsAdded.to_string(), "chem_tags_added_total");
    }

    #[test]
    fn emitters_are_noops_without_recorder() {
        phases::tags_added("test", QualityTag::CasPerfectMatch, 3);
        canonicalize::well_id_adjustment_failed();
        output::usable_records(10);
    }
}
