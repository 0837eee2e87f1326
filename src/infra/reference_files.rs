use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::app::ports::ReferencePort;
use crate::error::{PipelineError, Result};
use crate::reference::{LabelTable, ReferenceVocabulary};

/// Reference vocabulary and label table read from JSON files
pub struct ReferenceFiles {
    vocabulary: PathBuf,
    labels: PathBuf,
}

impl ReferenceFiles {
    pub fn new(vocabulary: impl Into<PathBuf>, labels: impl Into<PathBuf>) -> Self {
        Self {
            vocabulary: vocabulary.into(),
            labels: labels.into(),
        }
    }
}

fn open(resource: &str, path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| PipelineError::Reference {
            resource: resource.to_string(),
            message: format!("{}: {}", path.display(), e),
        })
}

impl ReferencePort for ReferenceFiles {
    fn load_vocabulary(&self) -> Result<ReferenceVocabulary> {
        ReferenceVocabulary::from_reader(open("reference vocabulary", &self.vocabulary)?)
    }

    fn load_labels(&self) -> Result<LabelTable> {
        LabelTable::from_reader(open("label table", &self.labels)?)
    }
}
