//!
//! Error types for the interlink core.
//!
//! Every public operation either succeeds or fails with exactly one of
//! these kinds. Nothing is retried internally; driver failures are carried
//! as the `source` of the variant that wraps them.
//!

use std::path::PathBuf;

use thiserror::Error;

use crate::driver::DriverError;
use crate::registry::ResourceKind;

pub type Result<T> = std::result::Result<T, InterlinkError>;

#[derive(Debug, Error)]
pub enum InterlinkError {
    #[error("invalid handle: {handle}")]
    InvalidHandle { handle: u64 },

    #[error("handle {handle} holds a {found}, expected a {expected}")]
    HandleKindMismatch {
        handle: u64,
        expected: ResourceKind,
        found: ResourceKind,
    },

    #[error("not connected to database '{target}'")]
    NotConnected { target: String },

    #[error("connection to '{target}' failed: {source}")]
    ConnectionError {
        target: String,
        #[source]
        source: DriverError,
    },

    #[error("query failed: {source}")]
    QueryError {
        sql: String,
        #[source]
        source: DriverError,
    },

    #[error("index ({row}, {column}) out of range for result of {rows} rows x {columns} columns")]
    OutOfRange {
        row: usize,
        column: usize,
        rows: usize,
        columns: usize,
    },

    #[error("{runtime} call to '{symbol}' is not implemented")]
    NotImplemented { runtime: String, symbol: String },

    #[error("user with ID {id} not found")]
    UserNotFound { id: i64 },

    #[error("invalid config at {path}: {reason}")]
    Config { path: PathBuf, reason: String },
}

impl InterlinkError {
    pub(crate) fn query(sql: &str, source: impl Into<DriverError>) -> Self {
        InterlinkError::QueryError {
            sql: sql.to_string(),
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = InterlinkError::InvalidHandle { handle: 42 };
        assert!(err.to_string().contains("invalid handle"));
        assert!(err.to_string().contains("42"));

        let err = InterlinkError::HandleKindMismatch {
            handle: 7,
            expected: ResourceKind::User,
            found: ResourceKind::Result,
        };
        assert!(err.to_string().contains("handle 7"));
        assert!(err.to_string().contains("user"));
        assert!(err.to_string().contains("result"));

        let err = InterlinkError::NotConnected {
            target: "app.db".to_string(),
        };
        assert!(err.to_string().contains("not connected"));
        assert!(err.to_string().contains("app.db"));

        let err = InterlinkError::OutOfRange {
            row: 5,
            column: 0,
            rows: 1,
            columns: 1,
        };
        assert!(err.to_string().contains("(5, 0)"));
        assert!(err.to_string().contains("out of range"));

        let err = InterlinkError::NotImplemented {
            runtime: "java".to_string(),
            symbol: "UserService.find".to_string(),
        };
        assert!(err.to_string().contains("java"));
        assert!(err.to_string().contains("UserService.find"));
        assert!(err.to_string().contains("not implemented"));

        let err = InterlinkError::UserNotFound { id: 9 };
        assert!(err.to_string().contains("user with ID 9 not found"));

        let err = InterlinkError::Config {
            path: PathBuf::from("/tmp/interlink.toml"),
            reason: "expected a table".to_string(),
        };
        assert!(err.to_string().contains("/tmp/interlink.toml"));
        assert!(err.to_string().contains("expected a table"));
    }

    #[test]
    fn test_connection_error_keeps_source() {
        use std::error::Error as _;

        let err = InterlinkError::ConnectionError {
            target: "missing.db".to_string(),
            source: DriverError::Unreachable("no such file".to_string()),
        };
        assert!(err.to_string().contains("missing.db"));
        let source = err.source().expect("driver error should be the source");
        assert!(source.to_string().contains("no such file"));
    }
}
