use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::{CarrierConfig, MassConfig};
use crate::domain::{IngredientRecord, QualityTag, RecordSet};
use crate::error::Result;
use crate::observability::metrics;
use crate::pipeline::phase::{Phase, PhaseReport};

/// Outcome of back-calculating one event's total mass
#[derive(Debug, Clone, PartialEq)]
pub enum Apportionment {
    /// Carrier percent within tolerance; masses can be assigned
    Accepted {
        carrier_percent: f64,
        total_event_mass: f64,
    },
    /// Carrier percent found but outside (min, max]
    OutOfTolerance { carrier_percent: f64 },
    /// No carrier records or no base-fluid volume to work from
    NotComputable,
}

/// Infers each ingredient's mass from its percent of job, using the
/// carrier fluid's reported volume as the anchor:
///
/// `total_event_mass = volume * density / (carrier_percent / 100)`
///
/// Only events with a valid percent total are considered. Events whose
/// carrier percent falls outside the tolerance window keep no mass; that is
/// an expected outcome, not an error.
pub struct MassApportioner {
    carrier: CarrierConfig,
    mass: MassConfig,
}

impl MassApportioner {
    pub fn new(carrier: CarrierConfig, mass: MassConfig) -> Self {
        Self { carrier, mass }
    }

    /// Water by identity (canonical CAS or ingredient name), or a record whose
    /// purpose marks it as the carrier
    pub fn is_carrier_fluid(&self, record: &IngredientRecord) -> bool {
        if record.has_tag(QualityTag::RedundantRecord) {
            return false;
        }
        if record.derived.is_carrier_record {
            return true;
        }
        let name = record.ingredient_name.to_lowercase();
        let is_water = record.derived.canonical_cas.as_deref() == Some(self.carrier.water_cas.as_str())
            || self
                .carrier
                .water_name_markers
                .iter()
                .any(|marker| name.contains(marker.as_str()));
        match self.carrier.water_min_percent {
            Some(min) => is_water && record.percent_of_job.is_some_and(|p| p > min),
            None => is_water,
        }
    }

    pub fn apportion<'a>(&self, rows: impl IntoIterator<Item = &'a IngredientRecord>) -> Apportionment {
        let mut volume = None;
        let mut carrier_percent = 0.0;
        let mut carriers = 0usize;
        for record in rows {
            if volume.is_none() {
                volume = record.total_base_fluid_volume;
            }
            if self.is_carrier_fluid(record) {
                carriers += 1;
                carrier_percent += record.percent_of_job.unwrap_or(0.0);
            }
        }

        let Some(volume) = volume else {
            return Apportionment::NotComputable;
        };
        if carriers == 0 || carrier_percent <= 0.0 {
            return Apportionment::NotComputable;
        }
        if carrier_percent <= self.mass.carrier_percent_min || carrier_percent > self.mass.carrier_percent_max {
            return Apportionment::OutOfTolerance { carrier_percent };
        }

        let carrier_mass = volume * self.mass.carrier_density;
        Apportionment::Accepted {
            carrier_percent,
            total_event_mass: carrier_mass / (carrier_percent / 100.0),
        }
    }
}

impl Phase for MassApportioner {
    fn name(&self) -> &'static str {
        "mass"
    }

    fn apply(&self, records: &mut RecordSet) -> Result<PhaseReport> {
        let mut report = PhaseReport::new(self.name());

        let outcomes: Vec<(Vec<usize>, Apportionment)> = records
            .event_groups()
            .par_iter()
            .filter(|(_, rows)| {
                rows.first()
                    .and_then(|&idx| records.get(idx))
                    .is_some_and(|r| r.has_tag(QualityTag::PercentSumValid))
            })
            .map(|(event_id, rows)| {
                let outcome = self.apportion(rows.iter().filter_map(|&idx| records.get(idx)));
                debug!(event_id = %event_id, ?outcome, "Apportionment");
                (rows.to_vec(), outcome)
            })
            .collect();

        let mut accepted = 0;
        let mut rejected = 0;
        let mut not_computable = 0;
        let all = records.records_mut();
        for (rows, outcome) in outcomes {
            match outcome {
                Apportionment::Accepted {
                    carrier_percent,
                    total_event_mass,
                } => {
                    accepted += 1;
                    for idx in rows {
                        let record = &mut all[idx];
                        record.derived.carrier_percent = Some(carrier_percent);
                        record.derived.total_event_mass = Some(total_event_mass);
                        record.derived.inferred_mass =
                            record.percent_of_job.map(|p| (p / 100.0) * total_event_mass);
                        report.tag(record, QualityTag::InToleranceRange);
                        if record.percent_of_job.is_some_and(|p| p > 0.0) {
                            report.tag(record, QualityTag::MassInferred);
                        }
                    }
                }
                Apportionment::OutOfTolerance { carrier_percent } => {
                    rejected += 1;
                    for idx in rows {
                        all[idx].derived.carrier_percent = Some(carrier_percent);
                    }
                }
                Apportionment::NotComputable => not_computable += 1,
            }
        }

        report.count("events_apportioned", accepted);
        report.count("events_out_of_tolerance", rejected);
        report.count("events_not_computable", not_computable);
        metrics::mass::events_apportioned(accepted);
        metrics::mass::events_rejected(rejected + not_computable);
        info!(
            "Mass apportioned for {} events ({} out of tolerance, {} without carrier data)",
            accepted, rejected, not_computable
        );
        Ok(report)
    }
}
