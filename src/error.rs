use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Field names used in validation messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    RollNumber,
    Name,
    Marks,
}

impl Field {
    pub fn label(self) -> &'static str {
        match self {
            Field::RollNumber => "Roll No",
            Field::Name => "Name",
            Field::Marks => "Marks",
        }
    }
}

/// Reasons a set of form values cannot become a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("{} is required.", .0.label())]
    MissingField(Field),
    #[error("Marks should be a valid number, got `{0}`.")]
    MarksNotANumber(String),
    #[error("Marks should be between 0 and 100, got {0}.")]
    MarksOutOfRange(i64),
}

/// Everything the record store and its storage backends can fail with. None of
/// these are fatal; callers surface them and keep the session going.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    InvalidInput(#[from] InputError),
    #[error("Roll number {0} already exists!")]
    DuplicateKey(String),
    #[error("No student found with roll number {0}!")]
    NotFound(String),
    #[error("No student data available!")]
    EmptyStore,
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{}, line {line}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: u64,
        message: String,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, line: u64, message: impl Into<String>) -> Self {
        StoreError::Parse {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    /// Whether the error came from the persistence layer rather than from the
    /// caller's request.
    pub fn is_persistence(&self) -> bool {
        matches!(self, StoreError::Io { .. } | StoreError::Parse { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
