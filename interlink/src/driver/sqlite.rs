//!
//! SQLite backend for the driver interface.
//!
//! Uses rusqlite with bundled SQLite. Targets:
//! - ":memory:" opens a private in-memory database
//! - anything else is a file path, opened read/write; the file is only
//!   created when `create_if_missing` is set, so a missing path fails the
//!   same way an unreachable server would
//!
//! TEXT values that are not valid UTF-8 are decoded lossily (U+FFFD).
//!

use std::time::Duration;

use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params_from_iter, Connection, OpenFlags, Row, Rows};

use super::{Cursor, CursorVisitor, Driver, DriverConnection, DriverError, Value};

pub const MEMORY_TARGET: &str = ":memory:";

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct SqliteDriver {
    create_if_missing: bool,
    busy_timeout: Duration,
}

impl SqliteDriver {
    pub fn new() -> Self {
        Self {
            create_if_missing: false,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }
}

impl Default for SqliteDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl Driver for SqliteDriver {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn open(&self, target: &str) -> Result<Box<dyn DriverConnection>, DriverError> {
        if target.trim().is_empty() {
            return Err(DriverError::Unreachable("empty connection target".to_string()));
        }

        let conn = if target == MEMORY_TARGET {
            Connection::open_in_memory()?
        } else {
            let mut flags = OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX;
            if self.create_if_missing {
                flags |= OpenFlags::SQLITE_OPEN_CREATE;
            }
            Connection::open_with_flags(target, flags)?
        };
        conn.busy_timeout(self.busy_timeout)?;

        Ok(Box::new(SqliteConnection { conn }))
    }
}

struct SqliteConnection {
    conn: Connection,
}

impl DriverConnection for SqliteConnection {
    fn ping(&mut self) -> Result<(), DriverError> {
        self.conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    fn query(
        &mut self,
        sql: &str,
        args: &[Value],
        visit: &mut CursorVisitor<'_>,
    ) -> Result<(), DriverError> {
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();
        let rows = stmt.query(params_from_iter(args.iter()))?;

        let mut cursor = SqliteCursor {
            columns,
            rows: Some(rows),
        };
        visit(&mut cursor)
    }

    fn execute(&mut self, sql: &str, args: &[Value]) -> Result<u64, DriverError> {
        let affected = self.conn.execute(sql, params_from_iter(args.iter()))?;
        Ok(affected as u64)
    }

    fn close(self: Box<Self>) -> Result<(), DriverError> {
        self.conn.close().map_err(|(_, e)| DriverError::from(e))
    }
}

struct SqliteCursor<'stmt> {
    columns: Vec<String>,
    rows: Option<Rows<'stmt>>,
}

impl Cursor for SqliteCursor<'_> {
    fn columns(&self) -> Vec<String> {
        self.columns.clone()
    }

    fn next_row(&mut self) -> Result<Option<Vec<Value>>, DriverError> {
        let width = self.columns.len();
        let Some(rows) = self.rows.as_mut() else {
            return Ok(None);
        };

        let values = match rows.next()? {
            Some(row) => Some(read_row(row, width)?),
            None => None,
        };
        if values.is_none() {
            self.rows = None;
        }
        Ok(values)
    }

    fn close(&mut self) {
        self.rows = None;
    }
}

fn read_row(row: &Row<'_>, width: usize) -> Result<Vec<Value>, DriverError> {
    let mut values = Vec::with_capacity(width);
    for i in 0..width {
        values.push(Value::from(row.get_ref(i)?));
    }
    Ok(values)
}

impl From<ValueRef<'_>> for Value {
    fn from(v: ValueRef<'_>) -> Self {
        match v {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(f) => Value::Real(f),
            ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => Value::Blob(b.to_vec()),
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Value::Integer(i) => ToSqlOutput::from(*i),
            Value::Real(f) => ToSqlOutput::from(*f),
            Value::Text(s) => ToSqlOutput::from(s.as_str()),
            Value::Blob(b) => ToSqlOutput::from(b.as_slice()),
        })
    }
}
