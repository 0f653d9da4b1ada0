//!
//! SQL driver capability interface.
//!
//! The connector and result layers only talk to a database through these
//! traits, so any backend that can open, ping, run a query and execute a
//! statement is interchangeable. SQLite (via rusqlite) ships in-tree.
//!
//! Cursors are scoped: `DriverConnection::query` lends a `&mut dyn Cursor`
//! to a visitor and reclaims it before returning, so a cursor can never
//! escape the connection it is bound to.
//!

pub mod sqlite;

use std::fmt;

use serde::Serialize;
use thiserror::Error;

pub use sqlite::SqliteDriver;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("target unreachable: {0}")]
    Unreachable(String),

    #[error("{0}")]
    Other(String),
}

/// A single cell as produced by a driver or bound as a statement argument.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    /// Canonical text form used by materialized results: null is empty,
    /// everything else uses its natural string form.
    ///
    /// TEXT cells holding invalid UTF-8 are decoded lossily by the driver:
    /// each bad sequence becomes U+FFFD, so the original bytes cannot be
    /// recovered from the text form. Read such columns as BLOB instead.
    pub fn to_text(&self) -> String {
        self.to_string()
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", r),
            Value::Text(s) => f.write_str(s),
            Value::Blob(bytes) => {
                f.write_str("\\x")?;
                for byte in bytes {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Forward-only view over the rows of one executing statement.
pub trait Cursor {
    fn columns(&self) -> Vec<String>;

    /// Next row, or `None` once the statement is exhausted.
    fn next_row(&mut self) -> Result<Option<Vec<Value>>, DriverError>;

    /// Stop stepping and release the statement's row state. Further
    /// `next_row` calls return `None`.
    fn close(&mut self);
}

pub type CursorVisitor<'a> = dyn FnMut(&mut dyn Cursor) -> Result<(), DriverError> + 'a;

/// One open connection to a database.
pub trait DriverConnection: Send {
    /// Round trip proving the connection is live.
    fn ping(&mut self) -> Result<(), DriverError>;

    fn query(
        &mut self,
        sql: &str,
        args: &[Value],
        visit: &mut CursorVisitor<'_>,
    ) -> Result<(), DriverError>;

    /// Run a statement that returns no rows; yields the affected row count.
    fn execute(&mut self, sql: &str, args: &[Value]) -> Result<u64, DriverError>;

    fn close(self: Box<Self>) -> Result<(), DriverError>;
}

pub trait Driver: Send + Sync {
    fn name(&self) -> &str;

    fn open(&self, target: &str) -> Result<Box<dyn DriverConnection>, DriverError>;
}
