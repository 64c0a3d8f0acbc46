//! Error taxonomy shared by every component in the analyzer core.
//!
//! Variants correspond to the kinds enumerated in the error-handling design:
//! callers match on kind, not on component-specific detail, so a new failure
//! source should map onto an existing variant before a new one is added.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A caller supplied a request or config value that fails validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A service method was called before `initialize()` completed.
    #[error("{0} is not initialized")]
    NotInitialized(&'static str),

    /// A configured strategy has no implementation (e.g. the remote cache tier).
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// An operation exceeded its deadline; no partial state was left behind.
    #[error("operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// A bounded resource (pool, concurrency cap, listener table) is full.
    #[error("capacity exceeded: {0}")]
    CapacityExceeded(String),

    /// A retryable contention error (`busy`/`locked`) survived all attempts.
    #[error("transient contention: {0}")]
    TransientContention(String),

    /// A non-retryable storage failure (disk, corruption, permissions).
    #[error("persistent I/O error: {0}")]
    PersistentIo(String),

    /// A foreign-key constraint could not be satisfied even after repair.
    #[error("foreign key violation: {0}")]
    FkViolation(String),

    /// The on-disk schema version is newer than or incompatible with this binary.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// A downstream component (layer, pipeline stage, learning component) failed.
    #[error("dependency failed: {0}")]
    DependencyFailed(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _)
                if e.code == rusqlite::ErrorCode::DatabaseBusy
                    || e.code == rusqlite::ErrorCode::DatabaseLocked =>
            {
                Error::TransientContention(err.to_string())
            }
            rusqlite::Error::SqliteFailure(e, _)
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Error::FkViolation(err.to_string())
            }
            _ => Error::PersistentIo(err.to_string()),
        }
    }
}

impl From<r2d2::Error> for Error {
    fn from(_err: r2d2::Error) -> Self {
        Error::Timeout(std::time::Duration::from_secs(5))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidInput(format!("malformed JSON document: {err}"))
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::InvalidInput(format!("malformed config: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_are_readable() {
        let err = Error::InvalidInput("confidence out of range".into());
        assert_eq!(err.to_string(), "invalid input: confidence out of range");

        let err = Error::NotInitialized("DatabaseService");
        assert_eq!(err.to_string(), "DatabaseService is not initialized");
    }

    #[test]
    fn errors_are_cloneable_and_comparable() {
        let a = Error::CapacityExceeded("pool".into());
        let b = a.clone();
        assert_eq!(a, b);
        assert_ne!(a, Error::InvalidInput("x".into()));
    }
}
