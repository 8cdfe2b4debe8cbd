use student_grades::{
    CsvFile, Field, Grade, InputError, MemoryStorage, RecordStore, Storage, StoreError,
};
use tempfile::TempDir;

fn csv_store(dir: &TempDir) -> RecordStore<CsvFile> {
    RecordStore::open(CsvFile::new(dir.path().join("students.csv"))).unwrap()
}

#[test]
fn add_update_delete_scenario() {
    let dir = TempDir::new().unwrap();
    let mut store = csv_store(&dir);

    let added = store.add_student("101", "Alice", "95").unwrap();
    assert_eq!(store.len(), 1);
    assert_eq!(added.grade(), Grade::APlus);

    let updated = store.update_student("101", "101", "Alice", "65").unwrap();
    assert_eq!(updated.grade(), Grade::B);
    assert_eq!(store.find_by_roll("101").unwrap().grade(), Grade::B);

    store.delete_student("101").unwrap();
    assert!(store.is_empty());
    assert!(matches!(store.statistics(), Err(StoreError::EmptyStore)));
}

#[test]
fn every_mutation_is_on_disk_immediately() {
    let dir = TempDir::new().unwrap();
    let mut store = csv_store(&dir);
    store.add_student("101", "Alice", "95").unwrap();
    store.add_student("102", "Bob", "45").unwrap();

    let reopened = csv_store(&dir);
    assert_eq!(reopened.list_all(), store.list_all());

    store.delete_student("101").unwrap();
    let reopened = csv_store(&dir);
    assert_eq!(reopened.len(), 1);
    assert_eq!(reopened.list_all()[0].roll(), "102");
}

#[test]
fn duplicate_add_leaves_store_unchanged() {
    let storage = MemoryStorage::new();
    let mut store = RecordStore::open(storage.clone()).unwrap();
    store.add_student("101", "Alice", "95").unwrap();
    let before = store.list_all().to_vec();

    let err = store.add_student("101", "Someone", "10").unwrap_err();
    assert!(matches!(err, StoreError::DuplicateKey(ref roll) if roll == "101"));
    assert_eq!(store.list_all(), before.as_slice());
    assert_eq!(storage.snapshot(), before);
}

#[test]
fn deleting_unknown_roll_leaves_store_unchanged() {
    let mut store = RecordStore::open(MemoryStorage::new()).unwrap();
    store.add_student("101", "Alice", "95").unwrap();

    let err = store.delete_student("999").unwrap_err();
    assert!(matches!(err, StoreError::NotFound(ref roll) if roll == "999"));
    assert_eq!(store.len(), 1);
}

#[test]
fn update_of_unknown_roll_is_not_found() {
    let mut store = RecordStore::open(MemoryStorage::new()).unwrap();
    let err = store.update_student("1", "1", "Ann", "50").unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[test]
fn invalid_input_is_rejected_before_the_store_changes() {
    let mut store = RecordStore::open(MemoryStorage::new()).unwrap();

    let cases = [
        ("", "Alice", "50", InputError::MissingField(Field::RollNumber)),
        ("1", "", "50", InputError::MissingField(Field::Name)),
        ("1", "Alice", "fifty", InputError::MarksNotANumber("fifty".into())),
        ("1", "Alice", "101", InputError::MarksOutOfRange(101)),
    ];
    for (roll, name, marks, expected) in cases {
        match store.add_student(roll, name, marks) {
            Err(StoreError::InvalidInput(err)) => assert_eq!(err, expected),
            other => panic!("expected invalid input, got {other:?}"),
        }
    }
    assert!(store.is_empty());
}

#[test]
fn update_keeps_position() {
    let mut store = RecordStore::open(MemoryStorage::new()).unwrap();
    for (roll, marks) in [("1", "50"), ("2", "60"), ("3", "70")] {
        store.add_student(roll, "Student", marks).unwrap();
    }

    store.update_student("2", "20", "Renamed", "99").unwrap();
    let rolls: Vec<&str> = store.list_all().iter().map(|r| r.roll()).collect();
    assert_eq!(rolls, ["1", "20", "3"]);
    assert_eq!(store.list_all()[1].name(), "Renamed");
}

#[test]
fn statistics_example() {
    let mut store = RecordStore::open(MemoryStorage::new()).unwrap();
    store.add_student("1", "A", "90").unwrap();
    store.add_student("2", "B", "50").unwrap();
    store.add_student("3", "C", "70").unwrap();

    let stats = store.statistics().unwrap();
    assert_eq!(stats.count, 3);
    assert!((stats.average - 70.0).abs() < f64::EPSILON);
    assert_eq!(stats.average_display(), "70.00");
    assert_eq!(stats.max, 90);
    assert_eq!(stats.min, 50);
}

#[test]
fn search_is_exact_match_only() {
    let mut store = RecordStore::open(MemoryStorage::new()).unwrap();
    store.add_student("101", "Alice", "95").unwrap();

    assert_eq!(store.search_student(" 101 ").unwrap().name(), "Alice");
    assert!(matches!(
        store.search_student("10"),
        Err(StoreError::NotFound(_))
    ));
}

#[test]
fn unreadable_snapshot_is_moved_aside_before_the_first_save() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("students.csv");
    let original = "1,Ann,50,C\n2,Ben,x,F\n";
    std::fs::write(&path, original).unwrap();

    let storage = CsvFile::new(&path);
    assert!(matches!(
        RecordStore::open(storage.clone()),
        Err(StoreError::Parse { .. })
    ));

    let (mut store, message) = RecordStore::open_or_set_aside(storage);
    assert!(store.is_empty());
    let backup = dir.path().join("students.csv.corrupt");
    assert!(message.unwrap().contains(&backup.display().to_string()));

    store.add_student("3", "Cy", "40").unwrap();
    assert_eq!(std::fs::read_to_string(&backup).unwrap(), original);
    let saved = CsvFile::new(&path).load().unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].roll(), "3");
}

#[test]
fn earlier_backups_are_not_replaced() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("students.csv");
    std::fs::write(dir.path().join("students.csv.corrupt"), "older").unwrap();
    std::fs::write(&path, "Roll No,Name,Marks\n1,Ann,lots\n").unwrap();

    let (_, message) = RecordStore::open_or_set_aside(CsvFile::new(&path));
    assert!(message.is_some());
    assert_eq!(
        std::fs::read_to_string(dir.path().join("students.csv.corrupt")).unwrap(),
        "older"
    );
    assert_eq!(
        std::fs::read_to_string(dir.path().join("students.csv.corrupt.1")).unwrap(),
        "Roll No,Name,Marks\n1,Ann,lots\n"
    );
    assert!(!path.exists());
}

#[test]
fn readable_or_missing_snapshot_is_left_in_place() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("students.csv");

    let (store, message) = RecordStore::open_or_set_aside(CsvFile::new(&path));
    assert!(store.is_empty());
    assert!(message.is_none());

    std::fs::write(&path, "Roll No,Name,Marks,Grade\n1,Ann,50,C\n").unwrap();
    let (store, message) = RecordStore::open_or_set_aside(CsvFile::new(&path));
    assert_eq!(store.len(), 1);
    assert!(message.is_none());
    assert!(!dir.path().join("students.csv.corrupt").exists());
}
