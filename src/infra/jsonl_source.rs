use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::app::ports::RecordSourcePort;
use crate::domain::record::nullable_text;
use crate::domain::IngredientRecord;
use crate::error::{PipelineError, Result};
use crate::pipeline::event_conflict;

/// Read one JSON value per non-blank line
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut rows = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let row = serde_json::from_str::<T>(&line).map_err(|e| PipelineError::MalformedInput {
            path: path.to_path_buf(),
            line: idx + 1,
            message: e.to_string(),
        })?;
        rows.push(row);
    }
    debug!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// One row of the disclosure event table
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct EventRow {
    pub event_id: String,
    #[serde(default, deserialize_with = "nullable_text")]
    pub api_number: String,
    #[serde(default)]
    pub state_number: Option<u32>,
    #[serde(default)]
    pub county_number: Option<u32>,
    #[serde(default, deserialize_with = "nullable_text")]
    pub job_date: String,
    #[serde(default)]
    pub total_base_fluid_volume: Option<f64>,
    #[serde(default, deserialize_with = "nullable_text")]
    pub operator_name: String,
}

impl EventRow {
    fn record(&self) -> IngredientRecord {
        IngredientRecord {
            event_id: self.event_id.clone(),
            total_base_fluid_volume: self.total_base_fluid_volume,
            api_number: self.api_number.clone(),
            state_number: self.state_number,
            county_number: self.county_number,
            operator_name: self.operator_name.clone(),
            job_date: self.job_date.clone(),
            ..Default::default()
        }
    }
}

/// One row of the ingredient table
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct IngredientRow {
    pub event_id: String,
    #[serde(default)]
    pub record_id: Option<String>,
    #[serde(default, deserialize_with = "nullable_text")]
    pub cas_raw: String,
    #[serde(default, deserialize_with = "nullable_text")]
    pub ingredient_name: String,
    #[serde(default, deserialize_with = "nullable_text")]
    pub supplier: String,
    #[serde(default, deserialize_with = "nullable_text")]
    pub purpose: String,
    #[serde(default, deserialize_with = "nullable_text")]
    pub trade_name: String,
    #[serde(default)]
    pub percent_of_job: Option<f64>,
    #[serde(default)]
    pub mass_reported: Option<f64>,
}

/// Join the event and ingredient tables into one record per ingredient.
///
/// Every event yields at least one record; an event without ingredient rows
/// becomes a single placeholder record with no `record_id`.
pub fn join_event_tables(
    events: Vec<EventRow>,
    ingredients: Vec<IngredientRow>,
) -> Result<Vec<IngredientRecord>> {
    let mut order: Vec<String> = Vec::new();
    let mut by_id: HashMap<String, EventRow> = HashMap::new();
    for event in events {
        match by_id.get(&event.event_id) {
            Some(existing) => {
                if let Some(err) = event_conflict(&event.event_id, &existing.record(), &event.record()) {
                    return Err(err);
                }
                if existing.operator_name != event.operator_name {
                    debug!(
                        event_id = %event.event_id,
                        kept = %existing.operator_name,
                        dropped = %event.operator_name,
                        "Repeated event row differs only in operator name, keeping the first"
                    );
                }
            }
            None => {
                order.push(event.event_id.clone());
                by_id.insert(event.event_id.clone(), event);
            }
        }
    }

    let mut detail: HashMap<String, Vec<IngredientRecord>> = HashMap::new();
    for row in ingredients {
        let Some(event) = by_id.get(&row.event_id) else {
            return Err(PipelineError::UnknownEvent {
                event_id: row.event_id,
            });
        };
        let record = IngredientRecord {
            record_id: row.record_id,
            cas_raw: row.cas_raw,
            ingredient_name: row.ingredient_name,
            supplier: row.supplier,
            purpose: row.purpose,
            trade_name: row.trade_name,
            percent_of_job: row.percent_of_job,
            mass_reported: row.mass_reported,
            ..event.record()
        };
        detail.entry(row.event_id).or_default().push(record);
    }

    let mut records = Vec::new();
    let mut placeholders = 0;
    for event_id in order {
        match detail.remove(&event_id) {
            Some(rows) => records.extend(rows),
            None => {
                if let Some(event) = by_id.get(&event_id) {
                    placeholders += 1;
                    records.push(event.record());
                }
            }
        }
    }
    info!(
        "Joined {} events into {} records ({} events without ingredients)",
        by_id.len(),
        records.len(),
        placeholders
    );
    Ok(records)
}

/// Records already flattened to one JSON object per ingredient
pub struct FlatRecordSource {
    path: PathBuf,
}

impl FlatRecordSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSourcePort for FlatRecordSource {
    fn load_records(&self) -> Result<Vec<IngredientRecord>> {
        let records: Vec<IngredientRecord> = read_jsonl(&self.path)?;
        info!("Loaded {} flat records from {}", records.len(), self.path.display());
        Ok(records)
    }
}

/// Separate event and ingredient tables, joined on `event_id`
pub struct JoinedRecordSource {
    events: PathBuf,
    ingredients: PathBuf,
}

impl JoinedRecordSource {
    pub fn new(events: impl Into<PathBuf>, ingredients: impl Into<PathBuf>) -> Self {
        Self {
            events: events.into(),
            ingredients: ingredients.into(),
        }
    }
}

impl RecordSourcePort for JoinedRecordSource {
    fn load_records(&self) -> Result<Vec<IngredientRecord>> {
        let events: Vec<EventRow> = read_jsonl(&self.events)?;
        let ingredients: Vec<IngredientRow> = read_jsonl(&self.ingredients)?;
        join_event_tables(events, ingredients)
    }
}
