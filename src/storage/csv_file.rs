use std::collections::HashSet;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::grade::Grade;
use crate::models::{StudentInput, StudentRecord};

use super::Storage;

/// Column names, in the order they are written. Loading matches columns by
/// name, so hand-edited files may reorder them.
pub const HEADER: [&str; 4] = ["Roll No", "Name", "Marks", "Grade"];

/// Columns that must be present for a non-empty file to load. The grade is
/// derived, so a file without it still loads.
const REQUIRED_COLUMNS: [&str; 3] = ["Roll No", "Name", "Marks"];

#[derive(Serialize)]
struct RowOut<'a> {
    roll: &'a str,
    name: &'a str,
    marks: u8,
    grade: Grade,
}

#[derive(Deserialize)]
struct RowIn {
    #[serde(rename = "Roll No")]
    roll: String,
    #[serde(rename = "Name")]
    name: String,
    // Kept as text so a bad value is reported with its content instead of a
    // generic deserialize error.
    #[serde(rename = "Marks")]
    marks: String,
    #[serde(rename = "Grade", default)]
    grade: Option<String>,
}

/// Snapshot storage in a comma-separated text file with a fixed header row.
#[derive(Debug, Clone)]
pub struct CsvFile {
    path: PathBuf,
}

impl CsvFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Move the current file to an unused `<file>.corrupt[.N]` sibling so the
    /// next save cannot overwrite rows that failed to load. Returns the
    /// backup path.
    pub fn set_aside(&self) -> StoreResult<PathBuf> {
        let backup = (0..)
            .map(|n| backup_path(&self.path, n))
            .find(|candidate| !candidate.exists())
            .unwrap_or_else(|| backup_path(&self.path, 0));
        fs::rename(&self.path, &backup).map_err(|err| StoreError::io(&self.path, err))?;
        warn!(
            "event=snapshot_set_aside module=storage path={} backup={}",
            self.path.display(),
            backup.display()
        );
        Ok(backup)
    }

    fn read_snapshot(&self, file: File) -> StoreResult<Vec<StudentRecord>> {
        let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(file);

        let headers = reader
            .headers()
            .map_err(|err| csv_error(&self.path, err))?
            .clone();
        if headers.is_empty() {
            return Ok(Vec::new());
        }
        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == column) {
                return Err(StoreError::parse(
                    &self.path,
                    1,
                    format!("missing `{column}` column in header"),
                ));
            }
        }

        let mut records = Vec::new();
        let mut seen = HashSet::new();
        let mut raw = StringRecord::new();
        while reader
            .read_record(&mut raw)
            .map_err(|err| csv_error(&self.path, err))?
        {
            let line = raw.position().map_or(0, |pos| pos.line());
            let row: RowIn = raw
                .deserialize(Some(&headers))
                .map_err(|err| StoreError::parse(&self.path, line, err.to_string()))?;
            let record = self.record_from_row(row, line)?;

            if !seen.insert(record.roll().to_string()) {
                return Err(StoreError::parse(
                    &self.path,
                    line,
                    format!("duplicate roll number `{}`", record.roll()),
                ));
            }
            records.push(record);
        }

        Ok(records)
    }

    fn record_from_row(&self, row: RowIn, line: u64) -> StoreResult<StudentRecord> {
        let marks = row.marks.parse::<i64>().map_err(|_| {
            StoreError::parse(
                &self.path,
                line,
                format!("marks `{}` is not an integer", row.marks),
            )
        })?;
        let input = StudentInput::new(&row.roll, &row.name, marks)
            .map_err(|err| StoreError::parse(&self.path, line, err.to_string()))?;
        let record = StudentRecord::from_input(input);

        if let Some(stored) = row.grade.as_deref().filter(|g| !g.is_empty()) {
            if stored.parse::<Grade>().ok() != Some(record.grade()) {
                warn!(
                    "event=grade_recomputed module=storage line={} roll={} stored={} derived={}",
                    line,
                    record.roll(),
                    stored,
                    record.grade()
                );
            }
        }

        Ok(record)
    }

    fn write_snapshot(&self, target: &Path, records: &[StudentRecord]) -> StoreResult<()> {
        let file = File::create(target).map_err(|err| StoreError::io(target, err))?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);

        writer
            .write_record(HEADER)
            .map_err(|err| csv_error(target, err))?;
        for record in records {
            writer
                .serialize(RowOut {
                    roll: record.roll(),
                    name: record.name(),
                    marks: record.marks(),
                    grade: record.grade(),
                })
                .map_err(|err| csv_error(target, err))?;
        }

        let file = writer
            .into_inner()
            .map_err(|err| StoreError::io(target, err.into_error()))?;
        file.sync_all().map_err(|err| StoreError::io(target, err))
    }
}

impl Storage for CsvFile {
    fn load(&self) -> StoreResult<Vec<StudentRecord>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(
                    "event=snapshot_missing module=storage path={}",
                    self.path.display()
                );
                return Ok(Vec::new());
            }
            Err(err) => return Err(StoreError::io(&self.path, err)),
        };

        let records = self.read_snapshot(file)?;
        info!(
            "event=snapshot_load module=storage status=ok path={} records={}",
            self.path.display(),
            records.len()
        );
        Ok(records)
    }

    fn save(&self, records: &[StudentRecord]) -> StoreResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| StoreError::io(parent, err))?;
        }

        let staging = staging_path(&self.path);
        let written = self.write_snapshot(&staging, records).and_then(|()| {
            fs::rename(&staging, &self.path).map_err(|err| StoreError::io(&self.path, err))
        });
        if written.is_err() {
            let _ = fs::remove_file(&staging);
        }
        written?;

        debug!(
            "event=snapshot_save module=storage status=ok path={} records={}",
            self.path.display(),
            records.len()
        );
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Sibling file the snapshot is written to before it replaces the real one.
fn staging_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

fn backup_path(path: &Path, n: u32) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".corrupt");
    if n > 0 {
        name.push(format!(".{n}"));
    }
    PathBuf::from(name)
}

fn csv_error(path: &Path, err: csv::Error) -> StoreError {
    let line = err.position().map_or(0, |pos| pos.line());
    let message = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(source) => StoreError::io(path, source),
        _ => StoreError::parse(path, line, message),
    }
}
