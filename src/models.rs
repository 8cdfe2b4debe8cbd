//! Domain models that the store owns and the UI renders. These stay plain data
//! holders; validation lives in `StudentInput` so a malformed value never
//! reaches the store, and the grade is derived on construction so it cannot
//! drift away from the marks.

use std::fmt;

use crate::error::{Field, InputError};
use crate::grade::{grade_for, Grade, MAX_MARKS};

#[derive(Debug, Clone, PartialEq, Eq)]
/// One student's row. Fields are read-only from outside the crate so the grade
/// always agrees with the marks.
pub struct StudentRecord {
    roll: String,
    name: String,
    marks: u8,
    grade: Grade,
}

impl StudentRecord {
    /// Build a record from validated input, deriving the grade.
    pub fn from_input(input: StudentInput) -> Self {
        let StudentInput { roll, name, marks } = input;
        Self {
            grade: grade_for(marks),
            roll,
            name,
            marks,
        }
    }

    pub fn roll(&self) -> &str {
        &self.roll
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn marks(&self) -> u8 {
        self.marks
    }

    pub fn grade(&self) -> Grade {
        self.grade
    }
}

impl fmt::Display for StudentRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({} marks, {})",
            self.roll, self.name, self.marks, self.grade
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Form values that passed validation: both text fields are trimmed and
/// non-empty, and the marks sit inside `0..=100`.
pub struct StudentInput {
    roll: String,
    name: String,
    marks: u8,
}

impl StudentInput {
    /// Validate already-numeric marks.
    pub fn new(roll: &str, name: &str, marks: i64) -> Result<Self, InputError> {
        let roll = required(roll, Field::RollNumber)?;
        let name = required(name, Field::Name)?;
        let marks = check_range(marks)?;
        Ok(Self { roll, name, marks })
    }

    /// Validate raw form text. Field presence is checked before the marks are
    /// parsed so an empty form reports the first missing field.
    pub fn parse(roll: &str, name: &str, marks_text: &str) -> Result<Self, InputError> {
        let roll = required(roll, Field::RollNumber)?;
        let name = required(name, Field::Name)?;
        let marks_raw = required(marks_text, Field::Marks)?;
        let value = marks_raw
            .parse::<i64>()
            .map_err(|_| InputError::MarksNotANumber(marks_raw.clone()))?;
        let marks = check_range(value)?;
        Ok(Self { roll, name, marks })
    }

    pub fn roll(&self) -> &str {
        &self.roll
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn marks(&self) -> u8 {
        self.marks
    }
}

fn required(value: &str, field: Field) -> Result<String, InputError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(InputError::MissingField(field))
    } else {
        Ok(trimmed.to_string())
    }
}

fn check_range(value: i64) -> Result<u8, InputError> {
    u8::try_from(value)
        .ok()
        .filter(|marks| *marks <= MAX_MARKS)
        .ok_or(InputError::MarksOutOfRange(value))
}

#[derive(Debug, Clone, PartialEq)]
/// Aggregate view over every record in the store.
pub struct Statistics {
    pub count: usize,
    pub average: f64,
    pub max: u8,
    pub min: u8,
    /// Number of records per grade, best grade first. Grades nobody earned are
    /// still listed with a zero count.
    pub grade_counts: Vec<(Grade, usize)>,
}

impl Statistics {
    /// Summarize a non-empty slice. Returns `None` for an empty one.
    pub fn from_records(records: &[StudentRecord]) -> Option<Self> {
        let max = records.iter().map(StudentRecord::marks).max()?;
        let min = records.iter().map(StudentRecord::marks).min()?;
        let total: u64 = records.iter().map(|r| u64::from(r.marks())).sum();
        let count = records.len();

        let grade_counts = Grade::ALL
            .into_iter()
            .map(|grade| {
                let n = records.iter().filter(|r| r.grade() == grade).count();
                (grade, n)
            })
            .collect();

        Some(Self {
            count,
            average: total as f64 / count as f64,
            max,
            min,
            grade_counts,
        })
    }

    /// Average marks rounded to two decimals for display.
    pub fn average_display(&self) -> String {
        format!("{:.2}", self.average)
    }
}
