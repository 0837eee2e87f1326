use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info};

use crate::config::{CarrierConfig, PercentConfig};
use crate::domain::{QualityTag, RecordSet};
use crate::error::Result;
use crate::pipeline::phase::{Phase, PhaseReport};

/// Diagnostic bucket of an event's percent-of-job total.
/// Upper bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum PercentBucket {
    UpToOne,
    OneToTen,
    TenToNinety,
    NinetyToNinetyFive,
    NinetyFiveToOneHundredFive,
    OneHundredFiveToOneHundredTen,
    OverOneHundredTen,
}

impl PercentBucket {
    pub const ALL: [PercentBucket; 7] = [
        PercentBucket::UpToOne,
        PercentBucket::OneToTen,
        PercentBucket::TenToNinety,
        PercentBucket::NinetyToNinetyFive,
        PercentBucket::NinetyFiveToOneHundredFive,
        PercentBucket::OneHundredFiveToOneHundredTen,
        PercentBucket::OverOneHundredTen,
    ];

    pub fn classify(total: f64) -> Self {
        match total {
            t if t <= 1.0 => PercentBucket::UpToOne,
            t if t <= 10.0 => PercentBucket::OneToTen,
            t if t <= 90.0 => PercentBucket::TenToNinety,
            t if t <= 95.0 => PercentBucket::NinetyToNinetyFive,
            t if t <= 105.0 => PercentBucket::NinetyFiveToOneHundredFive,
            t if t <= 110.0 => PercentBucket::OneHundredFiveToOneHundredTen,
            _ => PercentBucket::OverOneHundredTen,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PercentBucket::UpToOne => "<=1",
            PercentBucket::OneToTen => "(1, 10]",
            PercentBucket::TenToNinety => "(10, 90]",
            PercentBucket::NinetyToNinetyFive => "(90, 95]",
            PercentBucket::NinetyFiveToOneHundredFive => "(95, 105]",
            PercentBucket::OneHundredFiveToOneHundredTen => "(105, 110]",
            PercentBucket::OverOneHundredTen => ">110",
        }
    }
}

impl fmt::Display for PercentBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Percent-of-job total per event over records not flagged redundant.
/// Absent percentages count as zero.
pub fn event_percent_totals(records: &RecordSet) -> Vec<(String, f64)> {
    records
        .event_groups()
        .par_iter()
        .map(|(event_id, rows)| {
            let total: f64 = rows
                .iter()
                .filter_map(|&idx| records.get(idx))
                .filter(|r| !r.has_tag(QualityTag::RedundantRecord))
                .filter_map(|r| r.percent_of_job)
                .sum();
            (event_id.to_string(), total)
        })
        .collect()
}

/// Number of events in each bucket, every bucket listed
pub fn bucket_counts(totals: &[(String, f64)]) -> Vec<(PercentBucket, usize)> {
    let mut counts: HashMap<PercentBucket, usize> = HashMap::new();
    for (_, total) in totals {
        *counts.entry(PercentBucket::classify(*total)).or_insert(0) += 1;
    }
    PercentBucket::ALL
        .iter()
        .map(|bucket| (*bucket, counts.get(bucket).copied().unwrap_or(0)))
        .collect()
}

/// Whether a purpose value names the carrier/base fluid.
///
/// Long values are composite cells listing several purposes and would match
/// spuriously, so they never count.
pub fn is_carrier_purpose(purpose: &str, config: &CarrierConfig) -> bool {
    let clean = purpose.trim().to_lowercase();
    clean.chars().count() < config.purpose_max_len
        && config
            .purpose_markers
            .iter()
            .any(|marker| clean.contains(marker.as_str()))
}

/// Validates per-event percent totals and marks carrier-purpose records
pub struct PercentValidator {
    percent: PercentConfig,
    carrier: CarrierConfig,
}

impl PercentValidator {
    pub fn new(percent: PercentConfig, carrier: CarrierConfig) -> Self {
        Self { percent, carrier }
    }

    fn within_window(&self, total: f64) -> bool {
        total >= self.percent.valid_min && total <= self.percent.valid_max
    }
}

impl Phase for PercentValidator {
    fn name(&self) -> &'static str {
        "percent"
    }

    fn apply(&self, records: &mut RecordSet) -> Result<PhaseReport> {
        let mut report = PhaseReport::new(self.name());

        let totals = event_percent_totals(records);
        for (bucket, events) in bucket_counts(&totals) {
            debug!(bucket = %bucket, events, "Percent total range");
            report.count(&format!("events_{}", bucket.label()), events);
        }

        let valid_events: Vec<&str> = totals
            .iter()
            .filter(|(_, total)| self.within_window(*total))
            .map(|(event_id, _)| event_id.as_str())
            .collect();
        let valid_rows: Vec<usize> = valid_events
            .iter()
            .filter_map(|event_id| records.event_rows(event_id))
            .flat_map(|rows| rows.iter().copied())
            .collect();
        report.count("valid_events", valid_events.len());

        // Carrier detection over distinct purposes
        let mut carrier_purposes: HashMap<String, bool> = HashMap::new();
        for record in records.records() {
            if !carrier_purposes.contains_key(&record.purpose) {
                carrier_purposes.insert(
                    record.purpose.clone(),
                    is_carrier_purpose(&record.purpose, &self.carrier),
                );
            }
        }
        report.count(
            "carrier_purposes",
            carrier_purposes.values().filter(|c| **c).count(),
        );

        let all = records.records_mut();
        for idx in valid_rows {
            report.tag(&mut all[idx], QualityTag::PercentSumValid);
        }
        for record in all.iter_mut() {
            if carrier_purposes.get(&record.purpose).copied().unwrap_or(false) {
                record.derived.is_carrier_record = true;
            }
        }

        info!(
            "Events with percent total in [{}, {}]: {} of {}",
            self.percent.valid_min,
            self.percent.valid_max,
            report.counter("valid_events"),
            totals.len()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::IngredientRecord;

    fn record(event_id: &str, purpose: &str, percent: Option<f64>) -> IngredientRecord {
        IngredientRecord {
            event_id: event_id.to_string(),
            record_id: Some("r".to_string()),
            purpose: purpose.to_string(),
            percent_of_job: percent,
            ..Default::default()
        }
    }

    fn validator() -> PercentValidator {
        PercentValidator::new(PercentConfig::default(), CarrierConfig::default())
    }

    #[test]
    fn bucket_boundaries_are_right_inclusive() {
        assert_eq!(PercentBucket::classify(0.0), PercentBucket::UpToOne);
        assert_eq!(PercentBucket::classify(1.0), PercentBucket::UpToOne);
        assert_eq!(PercentBucket::classify(1.01), PercentBucket::OneToTen);
        assert_eq!(PercentBucket::classify(95.0), PercentBucket::NinetyToNinetyFive);
        assert_eq!(PercentBucket::classify(100.0), PercentBucket::NinetyFiveToOneHundredFive);
        assert_eq!(PercentBucket::classify(105.0), PercentBucket::NinetyFiveToOneHundredFive);
        assert_eq!(PercentBucket::classify(250.0), PercentBucket::OverOneHundredTen);
    }

    #[test]
    fn window_is_inclusive_and_skips_redundant_rows() {
        let mut redundant = record("edge", "Additive", Some(20.0));
        redundant.tag(QualityTag::RedundantRecord);
        let mut set = RecordSet::new(vec![
            record("edge", "Carrier", Some(90.0)),
            record("edge", "Additive", Some(5.0)),
            redundant,
            record("low", "Carrier", Some(60.0)),
            record("high", "Carrier", Some(105.5)),
        ]);
        let report = validator().apply(&mut set).unwrap();
        assert!(set
            .event_records("edge")
            .all(|r| r.has_tag(QualityTag::PercentSumValid)));
        assert!(!set.event_records("low").any(|r| r.has_tag(QualityTag::PercentSumValid)));
        assert!(!set.event_records("high").any(|r| r.has_tag(QualityTag::PercentSumValid)));
        assert_eq!(report.counter("valid_events"), 1);
        assert_eq!(report.counter("events_(10, 90]"), 1);
    }

    #[test]
    fn carrier_purpose_heuristic() {
        let config = CarrierConfig::default();
        assert!(is_carrier_purpose("Carrier / Base Fluid", &config));
        assert!(is_carrier_purpose(" BASE FLUID ", &config));
        assert!(!is_carrier_purpose("Friction Reducer", &config));
        let composite = "Carrier, Acidizing, Friction Reducer, Biocide, Scale Inhibitor, Surfactant";
        assert!(composite.len() >= 50);
        assert!(!is_carrier_purpose(composite, &config));
    }

    #[test]
    fn marks_carrier_records() {
        let mut set = RecordSet::new(vec![
            record("ev", "Carrier Fluid", Some(85.0)),
            record("ev", "Gelling agent", Some(1.0)),
        ]);
        validator().apply(&mut set).unwrap();
        assert!(set.records()[0].derived.is_carrier_record);
        assert!(!set.records()[1].derived.is_carrier_record);
    }
}
