use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::app::ports::ClassifyOutputPort;
use crate::domain::IngredientRecord;
use crate::error::Result;
use crate::pipeline::{PipelineReport, RunSummary, UnresolvedCas};

fn create(path: &Path) -> Result<BufWriter<File>> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    Ok(BufWriter::new(file))
}

fn write_jsonl<'a, T: Serialize + 'a>(path: &Path, rows: impl IntoIterator<Item = &'a T>) -> Result<usize> {
    let mut writer = create(path)?;
    let mut written = 0;
    for row in rows {
        serde_json::to_writer(&mut writer, row)?;
        writer.write_all(b"\n")?;
        written += 1;
    }
    writer.flush()?;
    info!("Wrote {} rows to {}", written, path.display());
    Ok(written)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut writer = create(path)?;
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    info!("Wrote {}", path.display());
    Ok(())
}

#[derive(Serialize)]
struct SummaryDocument<'a> {
    summary: &'a RunSummary,
    phases: &'a PipelineReport,
}

/// Writes classified records as JSON lines and reports as JSON files.
/// Optional outputs are skipped when no path is configured.
#[derive(Debug, Clone)]
pub struct FileOutputAdapter {
    records: PathBuf,
    usable: Option<PathBuf>,
    summary: Option<PathBuf>,
    curation: Option<PathBuf>,
}

impl FileOutputAdapter {
    pub fn new(records: impl Into<PathBuf>) -> Self {
        Self {
            records: records.into(),
            usable: None,
            summary: None,
            curation: None,
        }
    }

    pub fn with_usable(mut self, path: Option<PathBuf>) -> Self {
        self.usable = path;
        self
    }

    pub fn with_summary(mut self, path: Option<PathBuf>) -> Self {
        self.summary = path;
        self
    }

    pub fn with_curation(mut self, path: Option<PathBuf>) -> Self {
        self.curation = path;
        self
    }
}

impl ClassifyOutputPort for FileOutputAdapter {
    fn write_records(&self, records: &[IngredientRecord]) -> Result<usize> {
        write_jsonl(&self.records, records)
    }

    fn write_usable(&self, records: &[&IngredientRecord]) -> Result<usize> {
        match &self.usable {
            Some(path) => write_jsonl(path, records.iter().copied()),
            None => Ok(0),
        }
    }

    fn write_summary(&self, summary: &RunSummary, report: &PipelineReport) -> Result<()> {
        match &self.summary {
            Some(path) => write_json(
                path,
                &SummaryDocument {
                    summary,
                    phases: report,
                },
            ),
            None => Ok(()),
        }
    }

    fn write_curation(&self, entries: &[UnresolvedCas]) -> Result<()> {
        match &self.curation {
            Some(path) => write_json(path, entries),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::QualityTag;
    use tempfile::TempDir;

    #[test]
    fn records_round_trip_with_tag_codes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("records.jsonl");
        let mut record = IngredientRecord {
            event_id: "ev".to_string(),
            record_id: Some("1".to_string()),
            ..Default::default()
        };
        record.tag(QualityTag::CasPerfectMatch);
        record.tag(QualityTag::PercentSumValid);

        let adapter = FileOutputAdapter::new(&path);
        assert_eq!(adapter.write_records(&[record.clone()]).unwrap(), 1);

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains(r#""quality_tags":"0-%-P""#));
        let back: IngredientRecord = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn optional_outputs_are_skipped_without_path() {
        let dir = TempDir::new().unwrap();
        let adapter = FileOutputAdapter::new(dir.path().join("records.jsonl"));
        let record = IngredientRecord::default();
        assert_eq!(adapter.write_usable(&[&record]).unwrap(), 0);
        adapter.write_curation(&[]).unwrap();
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn curation_report_is_a_json_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("curation.json");
        let adapter = FileOutputAdapter::new(dir.path().join("records.jsonl"))
            .with_curation(Some(path.clone()));
        adapter
            .write_curation(&[UnresolvedCas {
                cas_raw: "secret".to_string(),
                cas_candidate: String::new(),
                records: 4,
                proprietary: true,
                hiding: false,
                cumulative_fraction: 1.0,
            }])
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value[0]["cas_raw"], "secret");
        assert_eq!(value[0]["records"], 4);
    }
}
