use std::cell::{Cell, RefCell};
use std::io;
use std::rc::Rc;

use crate::error::{StoreError, StoreResult};
use crate::models::StudentRecord;

use super::Storage;

/// Snapshot storage kept in memory.
///
/// Clones share the same snapshot, so a test can hand one clone to a store and
/// keep the other to inspect what was saved. Saves can be switched to fail to
/// exercise the store's behavior when the disk goes away.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    snapshot: Rc<RefCell<Vec<StudentRecord>>>,
    saves: Rc<Cell<usize>>,
    fail_saves: Rc<Cell<bool>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing snapshot, as if it had been saved earlier.
    pub fn with_records(records: Vec<StudentRecord>) -> Self {
        let storage = Self::default();
        *storage.snapshot.borrow_mut() = records;
        storage
    }

    /// Copy of the last saved snapshot.
    pub fn snapshot(&self) -> Vec<StudentRecord> {
        self.snapshot.borrow().clone()
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.get()
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.set(fail);
    }
}

impl Storage for MemoryStorage {
    fn load(&self) -> StoreResult<Vec<StudentRecord>> {
        Ok(self.snapshot())
    }

    fn save(&self, records: &[StudentRecord]) -> StoreResult<()> {
        if self.fail_saves.get() {
            return Err(StoreError::io("memory", io::Error::other("saves disabled")));
        }
        *self.snapshot.borrow_mut() = records.to_vec();
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StudentInput;

    fn record(roll: &str, marks: i64) -> StudentRecord {
        StudentRecord::from_input(StudentInput::new(roll, "Student", marks).unwrap())
    }

    #[test]
    fn clones_share_snapshot() {
        let storage = MemoryStorage::new();
        let observer = storage.clone();
        storage.save(&[record("1", 80)]).unwrap();

        assert_eq!(observer.snapshot().len(), 1);
        assert_eq!(observer.save_count(), 1);
        assert_eq!(observer.load().unwrap()[0].roll(), "1");
    }

    #[test]
    fn failing_saves_keep_previous_snapshot() {
        let storage = MemoryStorage::with_records(vec![record("1", 80)]);
        storage.set_fail_saves(true);

        let err = storage.save(&[]).unwrap_err();
        assert!(err.is_persistence());
        assert_eq!(storage.snapshot().len(), 1);
        assert_eq!(storage.save_count(), 0);
    }
}
