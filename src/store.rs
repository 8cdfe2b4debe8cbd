//! The in-memory record store.
//!
//! Records keep insertion order, which is also the order they are saved and
//! displayed in. Every successful mutation writes the full snapshot through to
//! the backing [`Storage`] before returning. When that write fails the change
//! stays in memory, the store remains the source of truth for the session, and
//! the caller gets the I/O error to show the user.

use log::{error, info, warn};

use crate::error::{Field, InputError, StoreError, StoreResult};
use crate::models::{Statistics, StudentInput, StudentRecord};
use crate::storage::{CsvFile, Storage};

pub struct RecordStore<S: Storage> {
    storage: S,
    records: Vec<StudentRecord>,
}

impl<S: Storage> RecordStore<S> {
    /// Load the persisted snapshot. A backend with nothing stored yields an
    /// empty store.
    pub fn open(storage: S) -> StoreResult<Self> {
        let records = storage.load()?;
        info!(
            "event=store_load module=store status=ok location={} records={}",
            storage.describe(),
            records.len()
        );
        Self::with_records(storage, records)
    }

    /// Start with no records without reading the backend. Used when loading
    /// failed and the session carries on empty.
    pub fn empty(storage: S) -> Self {
        Self {
            storage,
            records: Vec::new(),
        }
    }

    /// Seed the store with records that did not come from `storage`. Nothing
    /// is written until the first mutation.
    pub fn with_records(storage: S, records: Vec<StudentRecord>) -> StoreResult<Self> {
        for (idx, record) in records.iter().enumerate() {
            if records[..idx].iter().any(|r| r.roll() == record.roll()) {
                return Err(StoreError::DuplicateKey(record.roll().to_string()));
            }
        }
        Ok(Self { storage, records })
    }

    /// Append a new record. Fails with `DuplicateKey` when the roll number is
    /// taken, leaving the store untouched.
    pub fn add(&mut self, input: StudentInput) -> StoreResult<StudentRecord> {
        if self.position(input.roll()).is_some() {
            return Err(StoreError::DuplicateKey(input.roll().to_string()));
        }

        let record = StudentRecord::from_input(input);
        self.records.push(record.clone());
        info!(
            "event=record_add module=store roll={} records={}",
            record.roll(),
            self.records.len()
        );
        self.persist("add")?;
        Ok(record)
    }

    /// Replace the record currently keyed by `previous_roll` in place. The roll
    /// number itself may change, but not to one another record already holds.
    pub fn update(
        &mut self,
        previous_roll: &str,
        input: StudentInput,
    ) -> StoreResult<StudentRecord> {
        let idx = self
            .position(previous_roll)
            .ok_or_else(|| StoreError::NotFound(previous_roll.to_string()))?;

        if input.roll() != previous_roll && self.position(input.roll()).is_some() {
            return Err(StoreError::DuplicateKey(input.roll().to_string()));
        }

        let record = StudentRecord::from_input(input);
        self.records[idx] = record.clone();
        info!(
            "event=record_update module=store previous_roll={} roll={} grade={}",
            previous_roll,
            record.roll(),
            record.grade()
        );
        self.persist("update")?;
        Ok(record)
    }

    /// Remove a record, returning it. Confirmation with the user is the
    /// caller's job.
    pub fn delete(&mut self, roll: &str) -> StoreResult<StudentRecord> {
        let idx = self
            .position(roll)
            .ok_or_else(|| StoreError::NotFound(roll.to_string()))?;

        let removed = self.records.remove(idx);
        info!(
            "event=record_delete module=store roll={} records={}",
            removed.roll(),
            self.records.len()
        );
        self.persist("delete")?;
        Ok(removed)
    }

    /// Exact-match lookup by roll number.
    pub fn find_by_roll(&self, roll: &str) -> StoreResult<&StudentRecord> {
        self.records
            .iter()
            .find(|r| r.roll() == roll)
            .ok_or_else(|| StoreError::NotFound(roll.to_string()))
    }

    pub fn list_all(&self) -> &[StudentRecord] {
        &self.records
    }

    pub fn statistics(&self) -> StoreResult<Statistics> {
        Statistics::from_records(&self.records).ok_or(StoreError::EmptyStore)
    }

    /// Validate raw form text and add the record.
    pub fn add_student(
        &mut self,
        roll: &str,
        name: &str,
        marks_text: &str,
    ) -> StoreResult<StudentRecord> {
        let input = StudentInput::parse(roll, name, marks_text)?;
        self.add(input)
    }

    /// Validate raw form text and update the record selected under
    /// `previous_roll`.
    pub fn update_student(
        &mut self,
        previous_roll: &str,
        roll: &str,
        name: &str,
        marks_text: &str,
    ) -> StoreResult<StudentRecord> {
        let input = StudentInput::parse(roll, name, marks_text)?;
        self.update(previous_roll.trim(), input)
    }

    pub fn delete_student(&mut self, roll: &str) -> StoreResult<()> {
        self.delete(roll.trim()).map(|_| ())
    }

    /// Look up the roll number typed into the search box.
    pub fn search_student(&self, roll: &str) -> StoreResult<StudentRecord> {
        let roll = roll.trim();
        if roll.is_empty() {
            return Err(InputError::MissingField(Field::RollNumber).into());
        }
        self.find_by_roll(roll).cloned()
    }

    /// Write the current snapshot again, e.g. after an earlier save failed.
    pub fn save(&self) -> StoreResult<()> {
        self.persist("resave")
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Index of the record with this roll number.
    pub fn position(&self, roll: &str) -> Option<usize> {
        self.records.iter().position(|r| r.roll() == roll)
    }

    pub fn data_location(&self) -> String {
        self.storage.describe()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn persist(&self, op: &str) -> StoreResult<()> {
        self.storage.save(&self.records).inspect_err(|err| {
            warn!(
                "event=snapshot_save module=store status=error op={} records={} error={}",
                op,
                self.records.len(),
                err
            );
        })
    }
}

impl RecordStore<CsvFile> {
    /// Load the data file for a session. When it cannot be loaded the session
    /// starts empty and the returned message explains why. A file that failed
    /// to parse is moved aside first, so the first save starts a fresh file
    /// instead of replacing rows the user may still want back.
    pub fn open_or_set_aside(storage: CsvFile) -> (Self, Option<String>) {
        let err = match Self::open(storage.clone()) {
            Ok(store) => return (store, None),
            Err(err) => err,
        };
        error!("event=store_load module=store status=error error={err}");

        let message = match &err {
            StoreError::Parse { .. } => match storage.set_aside() {
                Ok(backup) => format!(
                    "Failed to load data: {err}. The file was moved to {}.",
                    backup.display()
                ),
                Err(move_err) => {
                    format!("Failed to load data: {err}. Could not move it aside: {move_err}")
                }
            },
            _ => format!("Failed to load data: {err}"),
        };
        (Self::empty(storage), Some(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grade::Grade;
    use crate::storage::MemoryStorage;

    fn store() -> (RecordStore<MemoryStorage>, MemoryStorage) {
        let storage = MemoryStorage::new();
        let store = RecordStore::open(storage.clone()).unwrap();
        (store, storage)
    }

    #[test]
    fn every_mutation_writes_through() {
        let (mut store, storage) = store();
        store.add_student("1", "Ann", "50").unwrap();
        store.update_student("1", "1", "Ann", "60").unwrap();
        store.delete_student("1").unwrap();
        assert_eq!(storage.save_count(), 3);
        assert!(storage.snapshot().is_empty());
    }

    #[test]
    fn rejected_operations_do_not_save() {
        let (mut store, storage) = store();
        store.add_student("1", "Ann", "50").unwrap();

        assert!(store.add_student("1", "Bob", "70").is_err());
        assert!(store.add_student("2", "Bob", "abc").is_err());
        assert!(store.update_student("9", "9", "Bob", "70").is_err());
        assert!(store.delete_student("9").is_err());
        assert_eq!(storage.save_count(), 1);
    }

    #[test]
    fn failed_save_keeps_change_in_memory() {
        let (mut store, storage) = store();
        storage.set_fail_saves(true);

        let err = store.add_student("1", "Ann", "95").unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
        assert_eq!(store.len(), 1);
        assert!(storage.snapshot().is_empty());

        storage.set_fail_saves(false);
        store.save().unwrap();
        assert_eq!(storage.snapshot()[0].grade(), Grade::APlus);
    }

    #[test]
    fn update_can_rename_roll_number() {
        let (mut store, _) = store();
        store.add_student("1", "Ann", "50").unwrap();
        store.add_student("2", "Bob", "60").unwrap();

        let updated = store.update_student("1", "10", "Ann", "55").unwrap();
        assert_eq!(updated.roll(), "10");
        assert_eq!(store.position("10"), Some(0));
        assert!(store.find_by_roll("1").is_err());
    }

    #[test]
    fn update_refuses_to_take_another_roll_number() {
        let (mut store, _) = store();
        store.add_student("1", "Ann", "50").unwrap();
        store.add_student("2", "Bob", "60").unwrap();

        let err = store.update_student("1", "2", "Ann", "55").unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey(ref roll) if roll == "2"));
        assert_eq!(store.list_all()[0].roll(), "1");
        assert_eq!(store.list_all()[0].marks(), 50);
    }

    #[test]
    fn search_needs_a_roll_number() {
        let (store, _) = store();
        let err = store.search_student("  ").unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidInput(InputError::MissingField(Field::RollNumber))
        ));
    }

    #[test]
    fn seeding_rejects_duplicate_rolls() {
        let a = StudentRecord::from_input(StudentInput::new("1", "Ann", 50).unwrap());
        let b = StudentRecord::from_input(StudentInput::new("1", "Bob", 60).unwrap());
        let result = RecordStore::with_records(MemoryStorage::new(), vec![a, b]);
        assert!(matches!(result, Err(StoreError::DuplicateKey(_))));
    }
}
