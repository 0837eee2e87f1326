use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::{IngredientRecord, QualityTag, RecordSet};
use crate::error::Result;

/// One stage of the classification pipeline.
///
/// A phase reads derived fields written by earlier phases and appends its own.
/// It must never remove a tag or a record.
pub trait Phase: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(&self, records: &mut RecordSet) -> Result<PhaseReport>;
}

/// What a phase did to the record set
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PhaseReport {
    pub phase: &'static str,
    /// Records that newly received each tag
    pub tags_added: BTreeMap<QualityTag, usize>,
    /// Phase-specific counts (events examined, fallbacks taken, ...)
    pub counters: BTreeMap<String, usize>,
}

impl PhaseReport {
    pub fn new(phase: &'static str) -> Self {
        Self {
            phase,
            tags_added: BTreeMap::new(),
            counters: BTreeMap::new(),
        }
    }

    /// Tag a record and count it if the tag is new
    pub fn tag(&mut self, record: &mut IngredientRecord, tag: QualityTag) {
        if record.tag(tag) {
            *self.tags_added.entry(tag).or_insert(0) += 1;
        }
    }

    pub fn count(&mut self, counter: &str, n: usize) {
        *self.counters.entry(counter.to_string()).or_insert(0) += n;
    }

    pub fn tagged(&self, tag: QualityTag) -> usize {
        self.tags_added.get(&tag).copied().unwrap_or(0)
    }

    pub fn counter(&self, counter: &str) -> usize {
        self.counters.get(counter).copied().unwrap_or(0)
    }
}
