//! Flat CSV persistence for the three stores.
//!
//! Every file is headerless and flexible-width: the first field of a row is
//! its key, the remaining fields are values. Saves rewrite the whole file
//! through a sibling temporary file that is renamed over the target.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::PersistenceError;

pub const LISTS_FILE: &str = "symbols.csv";
pub const MONTHS_FILE: &str = "months.csv";
pub const SETTINGS_FILE: &str = "settings.csv";

/// Row of a persisted file: key followed by values.
pub type Row = Vec<String>;

/// Locations of the persisted files under one data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub root: PathBuf,
    pub lists: PathBuf,
    pub months: PathBuf,
    pub settings: PathBuf,
}

impl DataPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            lists: root.join(LISTS_FILE),
            months: root.join(MONTHS_FILE),
            settings: root.join(SETTINGS_FILE),
            root,
        }
    }

    /// Creates the data directory when missing. Returns `true` if it was created.
    pub fn prepare(&self) -> Result<bool, PersistenceError> {
        if self.root.is_dir() {
            return Ok(false);
        }
        fs::create_dir_all(&self.root).map_err(|error| PersistenceError::io(&self.root, error))?;
        debug!(path = %self.root.display(), "created data directory");
        Ok(true)
    }
}

/// Reads all rows of `path`, skipping rows whose key field is empty.
pub fn read_rows(path: &Path) -> Result<Vec<Row>, PersistenceError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|error| PersistenceError::csv(path, error))?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|error| PersistenceError::csv(path, error))?;
        let row: Row = record.iter().map(|field| field.trim().to_owned()).collect();
        if row.first().is_some_and(|key| !key.is_empty()) {
            rows.push(row);
        }
    }

    debug!(path = %path.display(), rows = rows.len(), "read persisted rows");
    Ok(rows)
}

/// Like [`read_rows`], but a missing file yields `None`.
pub fn read_rows_if_exists(path: &Path) -> Result<Option<Vec<Row>>, PersistenceError> {
    if path.exists() {
        read_rows(path).map(Some)
    } else {
        Ok(None)
    }
}

/// Replaces the contents of `path` with `rows`.
pub fn write_rows(path: &Path, rows: &[Row]) -> Result<(), PersistenceError> {
    let staging = staging_path(path);

    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&staging)
            .map_err(|error| PersistenceError::csv(&staging, error))?;
        for row in rows {
            writer
                .write_record(row)
                .map_err(|error| PersistenceError::csv(&staging, error))?;
        }
        writer
            .flush()
            .map_err(|error| PersistenceError::io(&staging, error))?;
    }

    fs::rename(&staging, path).map_err(|error| PersistenceError::io(path, error))?;
    debug!(path = %path.display(), rows = rows.len(), "wrote persisted rows");
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(fields: &[&str]) -> Row {
        fields.iter().map(|field| (*field).to_owned()).collect()
    }

    #[test]
    fn rows_of_different_widths_survive_a_rewrite() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("months.csv");
        let rows = vec![
            row(&["AAPL", "20261120", "20261218"]),
            row(&["MSFT"]),
            row(&["BRK.B", "20261120"]),
        ];

        write_rows(&path, &rows).expect("write");
        assert_eq!(read_rows(&path).expect("read"), rows);
        assert!(!staging_path(&path).exists(), "staging file must be renamed away");
    }

    #[test]
    fn missing_file_reads_as_none() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("absent.csv");
        assert!(read_rows_if_exists(&path).expect("no error").is_none());
    }

    #[test]
    fn blank_keys_are_skipped() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("symbols.csv");
        fs::write(&path, "TECH,AAPL\n,ORPHAN\nEMPTY\n").expect("seed");

        let rows = read_rows(&path).expect("read");
        assert_eq!(rows, vec![row(&["TECH", "AAPL"]), row(&["EMPTY"])]);
    }

    #[test]
    fn prepare_reports_creation_once() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = DataPaths::new(temp.path().join("data"));
        assert!(paths.prepare().expect("create"));
        assert!(!paths.prepare().expect("exists"));
        assert_eq!(paths.months, temp.path().join("data").join(MONTHS_FILE));
    }
}
