//! Record-level persistence over the family and reminder tables.
//!
//! # Responsibility
//! - Keep SQL and storage shapes (epoch millis, TEXT ids, 0/1 flags) inside
//!   this module.
//! - Convert between stored epoch millis and local civil date-times.
//!
//! # Invariants
//! - Delete/update of an absent id is a silent no-op reported as `false`,
//!   never an error.
//! - Read paths reject malformed persisted rows instead of masking them.

pub mod datetime;
pub mod family_repo;
pub mod reminder_repo;

use crate::db::DbError;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for family and reminder persistence.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("{0}")]
    Db(#[from] DbError),
    #[error("invalid persisted data: {0}")]
    InvalidData(String),
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<uuid::Uuid> {
    uuid::Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}
