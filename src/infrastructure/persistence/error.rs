//! Storage error surface and the transient-failure classifier.
//!
//! Driver errors are converted into a [`StoreError`] exactly once, at the
//! adapter boundary. The retryability flag decided here is the only input the
//! retry executor looks at.

use std::io;

use serde_json::json;

use crate::domain::context::Done;
use crate::error::AppError;

/// What went wrong, independent of the driver that reported it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// Serialization failures, deadlocks, resource exhaustion, dropped connections.
    Transient,
    UniqueViolation { constraint: Option<String> },
    /// The idempotency token was first used with a different request.
    IdempotencyMismatch,
    NotFound,
    Cancelled,
    DeadlineExceeded,
    Fatal,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct StoreError {
    kind: StoreErrorKind,
    retryable: bool,
    message: String,
}

impl StoreError {
    pub fn new(kind: StoreErrorKind, retryable: bool, message: impl Into<String>) -> Self {
        Self {
            kind,
            retryable,
            message: message.into(),
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Transient, true, message)
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Fatal, false, message)
    }

    pub fn unique_violation(constraint: Option<String>, message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::UniqueViolation { constraint }, false, message)
    }

    pub fn idempotency_mismatch() -> Self {
        Self::new(
            StoreErrorKind::IdempotencyMismatch,
            false,
            "idempotency key already used for a different request",
        )
    }

    pub fn cancelled() -> Self {
        Self::new(StoreErrorKind::Cancelled, false, "operation cancelled")
    }

    /// The caller's deadline passed. Retryable: the next backoff wait observes
    /// the expired context and stops the loop.
    pub fn deadline_exceeded() -> Self {
        Self::new(StoreErrorKind::DeadlineExceeded, true, "deadline exceeded")
    }

    /// Every attempt failed with a retryable error.
    pub fn retries_exhausted(attempts: u32, last: &StoreError) -> Self {
        Self::new(
            StoreErrorKind::DeadlineExceeded,
            false,
            format!("deadline exceeded after {attempts} attempts: {last}"),
        )
    }

    pub fn kind(&self) -> &StoreErrorKind {
        &self.kind
    }

    pub fn is_retryable(&self) -> bool {
        self.retryable
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<Done> for StoreError {
    fn from(done: Done) -> Self {
        match done {
            Done::Cancelled => StoreError::cancelled(),
            Done::DeadlineExceeded => StoreError::deadline_exceeded(),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        classify(&err)
    }
}

/// SQLSTATE codes worth another attempt.
const RETRYABLE_SQLSTATES: &[&str] = &[
    "40001", // serialization_failure
    "40P01", // deadlock_detected
    "53000", // insufficient_resources
    "53100", // disk_full
    "53200", // out_of_memory
    "53300", // too_many_connections
    "08000", // connection_exception
    "08001", // sqlclient_unable_to_establish_sqlconnection
    "08003", // connection_does_not_exist
    "08004", // sqlserver_rejected_establishment_of_sqlconnection
    "08006", // connection_failure
    "57P01", // admin_shutdown
    "57P02", // crash_shutdown
    "57P03", // cannot_connect_now
];

pub fn is_retryable_sqlstate(code: &str) -> bool {
    RETRYABLE_SQLSTATES.contains(&code)
}

fn is_retryable_io(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::TimedOut
    )
}

/// Maps a driver error to a [`StoreError`] with its retryability decided.
pub fn classify(err: &sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db) => {
            if db.is_unique_violation() {
                return StoreError::unique_violation(
                    db.constraint().map(str::to_string),
                    db.message(),
                );
            }
            match db.code() {
                Some(code) if is_retryable_sqlstate(&code) => {
                    StoreError::transient(format!("{} (SQLSTATE {})", db.message(), code))
                }
                _ => StoreError::fatal(db.message()),
            }
        }
        sqlx::Error::Io(io_err) if is_retryable_io(io_err.kind()) => {
            StoreError::transient(io_err.to_string())
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::WorkerCrashed => {
            StoreError::transient(err.to_string())
        }
        sqlx::Error::RowNotFound => {
            StoreError::new(StoreErrorKind::NotFound, false, err.to_string())
        }
        other => StoreError::fatal(other.to_string()),
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err.kind() {
            StoreErrorKind::IdempotencyMismatch => AppError::idempotency_key_reused(json!({})),
            StoreErrorKind::UniqueViolation { constraint } => {
                tracing::warn!(constraint = ?constraint, "unique constraint violation");
                AppError::conflict("Unique constraint violation", json!({}))
            }
            _ => {
                tracing::error!(
                    kind = ?err.kind(),
                    retryable = err.is_retryable(),
                    error = %err,
                    "database operation failed"
                );
                AppError::internal()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    #[derive(Debug)]
    struct FakeDbError {
        code: &'static str,
        constraint: Option<&'static str>,
    }

    impl fmt::Display for FakeDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "fake error {}", self.code)
        }
    }

    impl StdError for FakeDbError {}

    impl DatabaseError for FakeDbError {
        fn message(&self) -> &str {
            "fake database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.code))
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn constraint(&self) -> Option<&str> {
            self.constraint
        }

        fn kind(&self) -> ErrorKind {
            match self.code {
                "23505" => ErrorKind::UniqueViolation,
                "23503" => ErrorKind::ForeignKeyViolation,
                _ => ErrorKind::Other,
            }
        }
    }

    fn db_error(code: &'static str) -> sqlx::Error {
        sqlx::Error::Database(Box::new(FakeDbError {
            code,
            constraint: None,
        }))
    }

    #[test]
    fn test_transient_sqlstates_are_retryable() {
        for code in [
            "40001", "40P01", "53300", "53000", "53100", "53200", "08001", "08004", "08006", "57P01",
            "57P02", "57P03",
        ] {
            let err = classify(&db_error(code));
            assert!(err.is_retryable(), "SQLSTATE {code} should be retryable");
            assert_eq!(err.kind(), &StoreErrorKind::Transient);
        }
    }

    #[test]
    fn test_permanent_sqlstates_are_not_retryable() {
        // syntax error, undefined table, foreign key violation
        for code in ["42601", "42P01", "23503"] {
            let err = classify(&db_error(code));
            assert!(!err.is_retryable(), "SQLSTATE {code} should not be retryable");
            assert_eq!(err.kind(), &StoreErrorKind::Fatal);
        }
    }

    #[test]
    fn test_unique_violation_keeps_constraint() {
        let err = classify(&sqlx::Error::Database(Box::new(FakeDbError {
            code: "23505",
            constraint: Some("short_urls_slug_key"),
        })));

        assert!(!err.is_retryable());
        assert_eq!(
            err.kind(),
            &StoreErrorKind::UniqueViolation {
                constraint: Some("short_urls_slug_key".to_string())
            }
        );
    }

    #[test]
    fn test_connection_io_errors_are_retryable() {
        for kind in [
            io::ErrorKind::ConnectionRefused,
            io::ErrorKind::ConnectionReset,
            io::ErrorKind::ConnectionAborted,
            io::ErrorKind::TimedOut,
        ] {
            let err = classify(&sqlx::Error::Io(io::Error::from(kind)));
            assert!(err.is_retryable(), "{kind:?} should be retryable");
        }
    }

    #[test]
    fn test_other_io_errors_are_fatal() {
        let err = classify(&sqlx::Error::Io(io::Error::from(
            io::ErrorKind::PermissionDenied,
        )));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_pool_timeout_is_retryable() {
        assert!(classify(&sqlx::Error::PoolTimedOut).is_retryable());
        assert!(!classify(&sqlx::Error::PoolClosed).is_retryable());
    }

    #[test]
    fn test_row_not_found_is_not_retryable() {
        let err = classify(&sqlx::Error::RowNotFound);
        assert_eq!(err.kind(), &StoreErrorKind::NotFound);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_deadline_is_retryable_but_cancel_is_not() {
        assert!(StoreError::from(Done::DeadlineExceeded).is_retryable());
        assert!(!StoreError::from(Done::Cancelled).is_retryable());
    }

    #[test]
    fn test_app_error_mapping_hides_details() {
        let app: AppError = StoreError::transient("connection reset by peer").into();
        let info = app.to_error_info();
        assert_eq!(info.code, "internal_error");
        assert!(!info.message.contains("connection reset"));

        let app: AppError = StoreError::idempotency_mismatch().into();
        assert!(matches!(app, AppError::IdempotencyKeyReused { .. }));

        let app: AppError =
            StoreError::unique_violation(Some("short_urls_slug_key".to_string()), "dup").into();
        assert!(matches!(app, AppError::Conflict { .. }));
        assert_eq!(app.to_error_info().details, json!({}));
    }
}
