use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::constants::{CARRIER_DENSITY, CARRIER_PURPOSE_MAX_LEN, WATER_CAS};
use crate::error::{PipelineError, Result};

/// Top-level pipeline configuration. Every section falls back to the
/// documented defaults, so a partial file is enough.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub canonicalize: CanonicalizeConfig,
    pub percent: PercentConfig,
    pub carrier: CarrierConfig,
    pub mass: MassConfig,
    pub redundancy: RedundancyConfig,
}

/// Blank normalization and system-approach detection settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CanonicalizeConfig {
    /// Values (compared trimmed, case-insensitive) that mean "field absent"
    pub blank_sentinels: Vec<String>,
    /// Identity fields subject to blank normalization
    pub blank_fields: Vec<BlankField>,
    /// `cas_raw` text that marks a system-approach disclosure
    pub system_approach_marker: String,
}

/// Identity fields the canonicalizer may rewrite to the empty marker
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BlankField {
    CasRaw,
    IngredientName,
    Supplier,
    Purpose,
    TradeName,
    OperatorName,
}

impl Default for CanonicalizeConfig {
    fn default() -> Self {
        Self {
            blank_sentinels: ["", "n/a", "na", "nan", "null"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            blank_fields: vec![
                BlankField::CasRaw,
                BlankField::IngredientName,
                BlankField::Supplier,
                BlankField::Purpose,
                BlankField::TradeName,
                BlankField::OperatorName,
            ],
            system_approach_marker: "listed below".to_string(),
        }
    }
}

/// Per-event percent total acceptance window (inclusive)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PercentConfig {
    pub valid_min: f64,
    pub valid_max: f64,
}

impl Default for PercentConfig {
    fn default() -> Self {
        Self {
            valid_min: 95.0,
            valid_max: 105.0,
        }
    }
}

/// Carrier-fluid identification heuristics
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CarrierConfig {
    /// Purposes must be strictly shorter than this to count as carrier markers
    pub purpose_max_len: usize,
    /// Substrings of a normalized purpose that mark a carrier
    pub purpose_markers: Vec<String>,
    /// Canonical identifier of the carrier fluid
    pub water_cas: String,
    /// Substrings of a lower-cased ingredient name that mark the carrier fluid
    pub water_name_markers: Vec<String>,
    /// When set, identity-matched water records only count above this percent
    pub water_min_percent: Option<f64>,
}

impl Default for CarrierConfig {
    fn default() -> Self {
        Self {
            purpose_max_len: CARRIER_PURPOSE_MAX_LEN,
            purpose_markers: vec!["base".to_string(), "carrier".to_string()],
            water_cas: WATER_CAS.to_string(),
            water_name_markers: vec!["water".to_string(), "h2o".to_string()],
            water_min_percent: None,
        }
    }
}

/// Mass back-calculation settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MassConfig {
    /// Mass per unit of base-fluid volume
    pub carrier_density: f64,
    /// Carrier percent must be strictly above this
    pub carrier_percent_min: f64,
    /// Carrier percent must be at or below this
    pub carrier_percent_max: f64,
}

impl Default for MassConfig {
    fn default() -> Self {
        Self {
            carrier_density: CARRIER_DENSITY,
            carrier_percent_min: 50.0,
            carrier_percent_max: 100.0,
        }
    }
}

/// Signature of records duplicated by the PDF-to-table conversion
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RedundancyConfig {
    pub supplier_marker: String,
    pub purpose_prefix: String,
}

impl Default for RedundancyConfig {
    fn default() -> Self {
        Self {
            supplier_marker: "listed above".to_string(),
            purpose_prefix: "see trade".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config_content = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config: Config = toml::from_str(&config_content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make the tolerance windows meaningless
    pub fn validate(&self) -> Result<()> {
        if self.percent.valid_min > self.percent.valid_max {
            return Err(PipelineError::Config(format!(
                "percent.valid_min {} exceeds percent.valid_max {}",
                self.percent.valid_min, self.percent.valid_max
            )));
        }
        if self.mass.carrier_percent_min >= self.mass.carrier_percent_max {
            return Err(PipelineError::Config(format!(
                "mass.carrier_percent_min {} must be below mass.carrier_percent_max {}",
                self.mass.carrier_percent_min, self.mass.carrier_percent_max
            )));
        }
        if self.mass.carrier_density <= 0.0 {
            return Err(PipelineError::Config(
                "mass.carrier_density must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
