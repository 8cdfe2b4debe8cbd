//! Student roll-number, name and marks records with derived letter grades,
//! kept in memory and written through to a CSV file after every change.
//!
//! The library is usable without the terminal UI: build a [`RecordStore`] over
//! any [`Storage`] and call its operations directly.
pub mod config;
pub mod error;
pub mod grade;
pub mod logging;
pub mod models;
pub mod storage;
pub mod store;
pub mod ui;

pub use config::Config;
pub use error::{Field, InputError, StoreError, StoreResult};
pub use grade::{grade_for, Grade};
pub use models::{Statistics, StudentInput, StudentRecord};
pub use storage::{CsvFile, MemoryStorage, Storage};
pub use store::RecordStore;

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
