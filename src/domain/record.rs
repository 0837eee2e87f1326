use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use super::tags::{QualityTag, TagSet};

/// One disclosed ingredient of one disclosure event.
///
/// Input fields come from the ingestion collaborator and are never changed
/// after canonicalization; `derived` is populated additively by the pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IngredientRecord {
    pub event_id: String,
    /// Absent on the placeholder row of an event with no ingredient detail
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

    // Event-level fields, constant across an event
    #[serde(default)]
    pub total_base_fluid_volume: Option<f64>,
    #[serde(default, deserialize_with = "nullable_text")]
    pub api_number: String,
    #[serde(default)]
    pub state_number: Option<u32>,
    #[serde(default)]
    pub county_number: Option<u32>,
    #[serde(default, deserialize_with = "nullable_text")]
    pub operator_name: String,
    #[serde(default, deserialize_with = "nullable_text")]
    pub job_date: String,

    #[serde(flatten)]
    pub derived: DerivedFields,
}

/// Fields appended by the pipeline phases
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DerivedFields {
    pub quality_tags: TagSet,
    /// `cas_raw` as ingested, kept when blank normalization rewrote it
    pub cas_raw_original: Option<String>,
    /// Cleaned and zero-corrected form of `cas_raw`
    pub cas_candidate: Option<String>,
    /// Matched vocabulary key, or the unresolved sentinel
    pub canonical_cas: Option<String>,
    pub is_proprietary: bool,
    pub is_masked_identity: bool,
    pub is_duplicate_record: bool,
    pub is_redundant_record: bool,
    pub is_carrier_record: bool,
    pub is_system_approach: bool,
    pub system_supplier: Option<String>,
    pub well_id10: Option<String>,
    pub parsed_date: Option<NaiveDate>,
    pub carrier_percent: Option<f64>,
    pub total_event_mass: Option<f64>,
    pub inferred_mass: Option<f64>,
}

impl IngredientRecord {
    pub fn tags(&self) -> &TagSet {
        &self.derived.quality_tags
    }

    pub fn has_tag(&self, tag: QualityTag) -> bool {
        self.derived.quality_tags.contains(tag)
    }

    /// Returns true when the tag was newly added
    pub fn tag(&mut self, tag: QualityTag) -> bool {
        self.derived.quality_tags.insert(tag)
    }

    pub fn is_usable(&self) -> bool {
        self.derived.quality_tags.is_usable()
    }

    /// CAS text as disclosed, before any blank normalization
    pub fn disclosed_cas(&self) -> &str {
        self.derived.cas_raw_original.as_deref().unwrap_or(&self.cas_raw)
    }

    /// A positive percent or a positive reported mass
    pub fn reports_quantity(&self) -> bool {
        self.percent_of_job.is_some_and(|p| p > 0.0) || self.mass_reported.is_some_and(|m| m > 0.0)
    }
}

/// JSON `null` reads as empty text; blank normalization handles it later.
pub(crate) fn nullable_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
