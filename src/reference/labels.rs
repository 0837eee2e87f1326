use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Read;

use tracing::info;

use crate::error::{PipelineError, Result};

/// One curated row of the proprietary/hiding label table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabelRow {
    /// Text as it appears in the raw CAS field
    pub label: String,
    /// How many raw records carried this text when the table was curated
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub proprietary: bool,
    #[serde(default)]
    pub hiding: bool,
}

/// Lookup over the label table, keyed by trimmed lower-case label text
#[derive(Debug, Clone, Default)]
pub struct LabelTable {
    rows: Vec<LabelRow>,
    proprietary: HashSet<String>,
    hiding: HashSet<String>,
}

pub(crate) fn label_key(text: &str) -> String {
    text.trim().to_lowercase()
}

impl LabelTable {
    pub fn new(rows: Vec<LabelRow>) -> Self {
        let proprietary = rows
            .iter()
            .filter(|row| row.proprietary)
            .map(|row| label_key(&row.label))
            .collect();
        let hiding = rows
            .iter()
            .filter(|row| row.hiding)
            .map(|row| label_key(&row.label))
            .collect();
        Self {
            rows,
            proprietary,
            hiding,
        }
    }

    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let rows: Vec<LabelRow> =
            serde_json::from_reader(reader).map_err(|e| PipelineError::Reference {
                resource: "label table".to_string(),
                message: e.to_string(),
            })?;
        let table = Self::new(rows);
        info!(
            "Loaded label table: {} rows, {} proprietary labels, {} hiding labels",
            table.rows.len(),
            table.proprietary.len(),
            table.hiding.len()
        );
        Ok(table)
    }

    pub fn is_proprietary(&self, cas_raw: &str) -> bool {
        self.proprietary.contains(&label_key(cas_raw))
    }

    pub fn is_hiding(&self, cas_raw: &str) -> bool {
        self.hiding.contains(&label_key(cas_raw))
    }

    pub fn rows(&self) -> &[LabelRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
