use chrono::NaiveDate;
use thiserror::Error;

/// Everything that can go wrong between the journal directory and the session.
///
/// A missing half of an entry's file pair is deliberately absent from this list:
/// the store reports it as "no entry" instead of failing.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The host refused access to the journal directory or one of its files.
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    /// A metadata document exists but its required fields could not be decoded.
    #[error("corrupt entry {name}: {reason}")]
    CorruptEntry { name: String, reason: String },
    /// Generic write/read/delete failure reported by the host.
    #[error("storage failure on {name}: {reason}")]
    Storage { name: String, reason: String },
    /// Some writes of a rename/merge/delete batch failed after others succeeded.
    /// Re-running the same operation is safe.
    #[error("tag operation incomplete: {} of {attempted} entries failed to save", failed.len())]
    TagOperationPartialFailure {
        attempted: usize,
        failed: Vec<NaiveDate>,
    },
    #[error("no journal directory is ready")]
    NotReady,
    #[error("invalid tag {0:?}")]
    InvalidTag(String),
    #[error("invalid date {0:?}")]
    InvalidDate(String),
    #[error("invalid entry: {0}")]
    InvalidEntry(String),
}

impl StoreError {
    pub(crate) fn storage(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::Storage {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn corrupt(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::CorruptEntry {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// Maps an I/O failure on `name` onto the taxonomy, keeping permission
    /// problems distinguishable from everything else.
    pub(crate) fn from_io(name: impl Into<String>, error: std::io::Error) -> Self {
        let name = name.into();
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(name),
            _ => Self::storage(name, error),
        }
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
