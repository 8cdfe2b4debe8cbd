//! Persistence backends. A backend only ever sees whole snapshots: `load`
//! returns every record in store order and `save` replaces whatever was stored
//! before with the given slice.

mod csv_file;
mod memory;

pub use csv_file::{CsvFile, HEADER};
pub use memory::MemoryStorage;

use crate::error::StoreResult;
use crate::models::StudentRecord;

pub trait Storage {
    /// Read the full snapshot. A backend with nothing stored yet returns an
    /// empty list.
    fn load(&self) -> StoreResult<Vec<StudentRecord>>;

    /// Overwrite the stored snapshot with `records`.
    fn save(&self, records: &[StudentRecord]) -> StoreResult<()>;

    /// Human-readable location shown in the UI and in logs.
    fn describe(&self) -> String;
}
