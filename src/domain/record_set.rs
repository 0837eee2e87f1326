use std::collections::BTreeMap;

use super::record::IngredientRecord;

/// The full batch of ingredient records with an index of each event's rows.
///
/// Phases only tag records; the set never gains or loses rows once built, so
/// the event index stays valid for the life of a run.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    records: Vec<IngredientRecord>,
    events: BTreeMap<String, Vec<usize>>,
}

impl RecordSet {
    pub fn new(records: Vec<IngredientRecord>) -> Self {
        let mut events: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (idx, record) in records.iter().enumerate() {
            events.entry(record.event_id.clone()).or_default().push(idx);
        }
        Self { records, events }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn records(&self) -> &[IngredientRecord] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut [IngredientRecord] {
        &mut self.records
    }

    pub fn get(&self, idx: usize) -> Option<&IngredientRecord> {
        self.records.get(idx)
    }

    /// Events in ascending id order with the indices of their records
    pub fn events(&self) -> impl Iterator<Item = (&str, &[usize])> {
        self.events
            .iter()
            .map(|(id, rows)| (id.as_str(), rows.as_slice()))
    }

    /// Event groups as an owned list, convenient for `rayon` fan-out
    pub fn event_groups(&self) -> Vec<(&str, &[usize])> {
        self.events().collect()
    }

    pub fn event_rows(&self, event_id: &str) -> Option<&[usize]> {
        self.events.get(event_id).map(|rows| rows.as_slice())
    }

    pub fn event_records<'a>(&'a self, event_id: &str) -> impl Iterator<Item = &'a IngredientRecord> + 'a {
        self.events
            .get(event_id)
            .into_iter()
            .flat_map(move |rows| rows.iter().map(move |&idx| &self.records[idx]))
    }

    pub fn usable(&self) -> impl Iterator<Item = &IngredientRecord> {
        self.records.iter().filter(|record| record.is_usable())
    }

    pub fn into_records(self) -> Vec<IngredientRecord> {
        self.records
    }
}
