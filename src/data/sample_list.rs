// Copyright (C) 2025 Bellande Artificial Intelligence Computer Vision Research Innovation Center, Ronaldson Bellande

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use crate::core::error::{PipelineError, Result};
use crate::utilities::config::Configuration;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const TRAINSET_SUFFIX: &str = "_trainset.csv";

/// One CSV row: an image path relative to the data directory and its class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub path: String,
    pub label: i64,
}

/// Rows of a dataset CSV, verbatim and in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleList {
    samples: Vec<Sample>,
}

impl SampleList {
    pub fn new(samples: Vec<Sample>) -> Self {
        SampleList { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Sample> {
        self.samples.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    pub fn paths(&self) -> Vec<&str> {
        self.samples.iter().map(|s| s.path.as_str()).collect()
    }

    pub fn labels(&self) -> Vec<i64> {
        self.samples.iter().map(|s| s.label).collect()
    }

    /// Joins every row's path onto `data_path`, keeping labels alongside.
    pub fn resolve_paths<P: AsRef<Path>>(&self, data_path: P) -> Vec<(PathBuf, i64)> {
        let root = data_path.as_ref();
        self.samples
            .iter()
            .map(|s| (root.join(&s.path), s.label))
            .collect()
    }
}

impl From<Vec<Sample>> for SampleList {
    fn from(samples: Vec<Sample>) -> Self {
        SampleList::new(samples)
    }
}

impl<'a> IntoIterator for &'a SampleList {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

/// Reads a `path,label` CSV. The first row is a header; columns past the
/// second are ignored.
pub fn load_sample_list<P: AsRef<Path>>(path: P) -> Result<SampleList> {
    let path = path.as_ref();
    let csv_error = |message: String| PipelineError::CsvError {
        path: path.display().to_string(),
        message,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| csv_error(e.to_string()))?;

    let mut samples = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| csv_error(e.to_string()))?;
        // blank lines are skipped by the reader, so ask it where the record started
        let line = record
            .position()
            .map(|position| position.line())
            .unwrap_or(row as u64 + 2);

        let (image, label) = match (record.get(0), record.get(1)) {
            (Some(image), Some(label)) => (image, label),
            _ => {
                return Err(csv_error(format!(
                    "line {}: expected at least 2 columns, got {}",
                    line,
                    record.len()
                )))
            }
        };

        let label = label
            .trim()
            .parse::<i64>()
            .map_err(|e| csv_error(format!("line {}: invalid label {:?}: {}", line, label, e)))?;

        samples.push(Sample {
            path: image.to_string(),
            label,
        });
    }

    debug!("Loaded {} samples from {}", samples.len(), path.display());
    Ok(SampleList::new(samples))
}

/// Loads the train and validation lists named by `config.dataset`.
pub fn set_dataset(config: &Configuration) -> Result<(SampleList, SampleList)> {
    let trainset = load_sample_list(config.train_csv())?;
    let valset = load_sample_list(config.val_csv())?;

    info!(
        "Dataset {}: {} train / {} val samples",
        config.dataset,
        trainset.len(),
        valset.len()
    );

    Ok((trainset, valset))
}

/// Names of every dataset with a `<name>_trainset.csv` under `data_path`, sorted.
pub fn list_datasets<P: AsRef<Path>>(data_path: P) -> Result<Vec<String>> {
    let pattern = data_path.as_ref().join(format!("*{}", TRAINSET_SUFFIX));
    let pattern = pattern.to_string_lossy();

    let mut names = Vec::new();
    for entry in glob::glob(&pattern)? {
        let entry = entry.map_err(|e| PipelineError::IOError(e.to_string()))?;
        if let Some(name) = entry
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_suffix(TRAINSET_SUFFIX))
        {
            names.push(name.to_string());
        }
    }

    names.sort();
    Ok(names)
}
