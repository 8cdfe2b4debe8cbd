//! Letter grades derived from a 0-100 score.
//!
//! The threshold table is fixed and descending: the first threshold the score
//! reaches wins. Grades are stored as text in the data file, so the enum knows
//! how to render and parse its own labels.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

/// Highest score a record may carry.
pub const MAX_MARKS: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
/// A letter grade. Variants are declared best-first so `Ord` follows rank.
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "D")]
    D,
    #[serde(rename = "F")]
    F,
}

/// Lower bound of each passing grade, best first. Anything below the last
/// threshold is an `F`.
const THRESHOLDS: [(u8, Grade); 6] = [
    (90, Grade::APlus),
    (80, Grade::A),
    (70, Grade::BPlus),
    (60, Grade::B),
    (50, Grade::C),
    (40, Grade::D),
];

impl Grade {
    /// Every grade in descending rank.
    pub const ALL: [Grade; 7] = [
        Grade::APlus,
        Grade::A,
        Grade::BPlus,
        Grade::B,
        Grade::C,
        Grade::D,
        Grade::F,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }
}

/// Map a score in `0..=100` to its letter grade.
///
/// Scores above 100 are a caller bug; they are not rejected here and simply
/// land in the top band.
pub fn grade_for(marks: u8) -> Grade {
    debug_assert!(marks <= MAX_MARKS, "marks {marks} outside 0..=100");
    THRESHOLDS
        .iter()
        .find(|(floor, _)| marks >= *floor)
        .map(|(_, grade)| *grade)
        .unwrap_or(Grade::F)
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown grade `{0}`")]
pub struct UnknownGrade(pub String);

impl FromStr for Grade {
    type Err = UnknownGrade;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Grade::ALL
            .into_iter()
            .find(|grade| grade.as_str() == trimmed)
            .ok_or_else(|| UnknownGrade(trimmed.to_string()))
    }
}
