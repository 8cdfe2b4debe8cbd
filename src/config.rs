use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use directories::BaseDirs;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".student-grades";
/// Record file stored inside the application data directory.
const DATA_FILE_NAME: &str = "students.csv";
/// Log folder inside the application data directory.
const LOG_DIR_NAME: &str = "logs";

/// Where the application keeps its files. There are no flags or environment
/// variables; everything hangs off the home directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_file: PathBuf,
    pub log_dir: PathBuf,
}

impl Config {
    /// Resolve the default locations inside the user's home directory.
    pub fn resolve() -> Result<Self> {
        let base_dirs =
            BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
        Ok(Self::in_dir(base_dirs.home_dir().join(DATA_DIR_NAME)))
    }

    /// Keep the data file and logs together under `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            data_file: dir.join(DATA_FILE_NAME),
            log_dir: dir.join(LOG_DIR_NAME),
        }
    }

    /// Use an explicit record file; logs go next to it.
    pub fn with_data_file(path: impl Into<PathBuf>) -> Self {
        let data_file = path.into();
        let log_dir = data_file
            .parent()
            .map(|parent| parent.join(LOG_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from(LOG_DIR_NAME));
        Self { data_file, log_dir }
    }
}
