//! Reading one revision's JSON documents from its data directory.

use std::path::{Path, PathBuf};

use kek_core::model::{MediaRecord, ShareholderRecord};
use kek_core::{Error, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use walkdir::WalkDir;

use crate::source::DataDir;

/// A record together with the document it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded<T> {
    pub path: PathBuf,
    pub record: T,
}

/// All media and shareholder documents of one revision.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordBatch {
    pub media: Vec<Loaded<MediaRecord>>,
    pub shareholders: Vec<Loaded<ShareholderRecord>>,
}

impl RecordBatch {
    /// Read every `*.json` document under `media/` and `shareholders/`,
    /// keeping at most `sample` of each when a cap is given.
    ///
    /// Files are taken in file-name order; a missing directory yields no
    /// records of that type.
    pub fn load(data_dir: &DataDir, sample: Option<usize>) -> Result<Self> {
        let media = read_records(&data_dir.media_dir(), sample)?;
        let shareholders = read_records(&data_dir.shareholders_dir(), sample)?;
        log::info!(
            "Read {} media and {} shareholder documents from {}",
            media.len(),
            shareholders.len(),
            data_dir.root().display()
        );
        Ok(Self {
            media,
            shareholders,
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.media.is_empty() && self.shareholders.is_empty()
    }
}

fn json_files(dir: &Path, sample: Option<usize>) -> Vec<PathBuf> {
    if !dir.is_dir() {
        log::debug!("No record directory at {}", dir.display());
        return Vec::new();
    }

    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(std::result::Result::ok)
        .map(walkdir::DirEntry::into_path)
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
        .take(sample.unwrap_or(usize::MAX))
        .collect()
}

fn read_records<T: DeserializeOwned>(dir: &Path, sample: Option<usize>) -> Result<Vec<Loaded<T>>> {
    json_files(dir, sample)
        .into_iter()
        .map(|path| {
            let record = read_record(&path)?;
            Ok(Loaded { path, record })
        })
        .collect()
}

/// Parse one document. Schema-invalid API responses were archived as
/// `{"errors": [...], "value": {...}}`; those are unwrapped to `value`.
fn read_record<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)?;
    let value: Value =
        serde_json::from_str(&text).map_err(|e| Error::malformed(path, e.to_string()))?;
    let value = unwrap_invalid(value);
    serde_json::from_value(value).map_err(|e| Error::malformed(path, e.to_string()))
}

fn unwrap_invalid(value: Value) -> Value {
    match value {
        Value::Object(mut map) if !map.contains_key("squuid") && map.contains_key("errors") => {
            map.remove("value").unwrap_or(Value::Object(map))
        }
        other => other,
    }
}
