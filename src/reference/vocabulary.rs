use std::collections::{BTreeMap, HashMap};
use std::io::Read;

use tracing::info;

use crate::error::{PipelineError, Result};

/// Curated mapping of canonical CAS registry numbers to accepted synonyms.
///
/// Built offline by curation tools; read-only for the pipeline.
#[derive(Debug, Clone, Default)]
pub struct ReferenceVocabulary {
    entries: BTreeMap<String, Vec<String>>,
    synonyms: HashMap<String, Vec<String>>,
}

impl ReferenceVocabulary {
    /// Build from `cas -> synonyms`. Synonyms are lower-cased, trimmed and
    /// de-duplicated with first-seen order kept.
    pub fn new(raw: BTreeMap<String, Vec<String>>) -> Self {
        let mut entries = BTreeMap::new();
        let mut synonyms: HashMap<String, Vec<String>> = HashMap::new();

        for (cas, names) in raw {
            let cas = cas.trim().to_string();
            let mut ordered: Vec<String> = Vec::with_capacity(names.len());
            for name in names {
                let name = name.trim().to_lowercase();
                if !name.is_empty() && !ordered.contains(&name) {
                    ordered.push(name);
                }
            }
            for name in &ordered {
                let owners = synonyms.entry(name.clone()).or_default();
                if !owners.contains(&cas) {
                    owners.push(cas.clone());
                }
            }
            entries.insert(cas, ordered);
        }

        Self { entries, synonyms }
    }

    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let raw: BTreeMap<String, Vec<String>> =
            serde_json::from_reader(reader).map_err(|e| PipelineError::Reference {
                resource: "reference vocabulary".to_string(),
                message: e.to_string(),
            })?;
        let vocabulary = Self::new(raw);
        info!(
            "Loaded reference vocabulary: {} CAS numbers, {} synonyms, {} ambiguous synonyms",
            vocabulary.len(),
            vocabulary.synonym_count(),
            vocabulary.ambiguous_synonyms().count()
        );
        Ok(vocabulary)
    }

    pub fn contains(&self, cas: &str) -> bool {
        self.entries.contains_key(cas)
    }

    /// Returns the stored key for an exact match
    pub fn lookup(&self, cas: &str) -> Option<&str> {
        self.entries.get_key_value(cas).map(|(key, _)| key.as_str())
    }

    pub fn synonyms(&self, cas: &str) -> Option<&[String]> {
        self.entries.get(cas).map(|names| names.as_slice())
    }

    /// CAS numbers that list `name` as a synonym
    pub fn cas_for_synonym(&self, name: &str) -> &[String] {
        self.synonyms
            .get(&name.trim().to_lowercase())
            .map(|owners| owners.as_slice())
            .unwrap_or(&[])
    }

    /// Synonyms claimed by more than one CAS number
    pub fn ambiguous_synonyms(&self) -> impl Iterator<Item = &str> {
        self.synonyms
            .iter()
            .filter(|(_, owners)| owners.len() > 1)
            .map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total synonyms across all entries
    pub fn synonym_count(&self) -> usize {
        self.entries.values().map(|names| names.len()).sum()
    }
}
