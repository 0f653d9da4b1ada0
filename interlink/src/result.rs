//!
//! Materialized query results.
//!
//! A cursor is bound to its connection and to the statement that produced
//! it, so it cannot cross a runtime boundary. `MaterializedResult` drains
//! the cursor completely at construction, converts every cell to its
//! canonical text form and closes the cursor before returning. What is left
//! is plain immutable data.
//!
//! Closing a result only flips a flag. Reads after `close` still succeed;
//! there is no live state behind the snapshot to protect.
//!
//! The whole result set is buffered, so this is not meant for unbounded
//! queries.
//!

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use indexmap::IndexMap;
use serde::Serialize;

use crate::driver::{Cursor, DriverError};
use crate::error::{InterlinkError, Result};
use crate::handle::Handle;
use crate::registry::{HandleRegistry, Resource};

#[derive(Debug, Serialize)]
pub struct MaterializedResult {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
    #[serde(skip)]
    closed: AtomicBool,
}

impl MaterializedResult {
    /// Build a result from already-materialized data. Rows are padded with
    /// empty cells or truncated to the column count.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self {
            columns,
            rows,
            closed: AtomicBool::new(false),
        }
    }

    /// Drain `cursor` into a snapshot. The cursor is closed before this
    /// returns, whether or not draining succeeded.
    pub fn from_cursor(cursor: &mut dyn Cursor) -> std::result::Result<Self, DriverError> {
        let columns = cursor.columns();
        let mut rows: Vec<Vec<String>> = Vec::new();

        let drained = loop {
            match cursor.next_row() {
                Ok(Some(values)) => rows.push(values.iter().map(|v| v.to_text()).collect()),
                Ok(None) => break Ok(()),
                Err(err) => break Err(err),
            }
        };
        cursor.close();
        drained?;

        Ok(Self::new(columns, rows))
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    pub fn value_at(&self, row: usize, column: usize) -> Result<&str> {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .map(String::as_str)
            .ok_or(InterlinkError::OutOfRange {
                row,
                column,
                rows: self.row_count(),
                columns: self.column_count(),
            })
    }

    pub fn row(&self, row: usize) -> Option<&[String]> {
        self.rows.get(row).map(Vec::as_slice)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[String]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Index of the first column named `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// One column-name -> value map per row, in column order. Duplicate
    /// column names keep the last value.
    pub fn to_records(&self) -> Vec<IndexMap<String, String>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect()
    }

    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            tracing::debug!(rows = self.row_count(), "result closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Move the result into the registry and return its handle.
    pub fn into_handle(self, registry: &HandleRegistry) -> Handle {
        Arc::new(self).as_handle(registry)
    }

    /// Register a shared result; the registry holds its own reference.
    pub fn as_handle(self: &Arc<Self>, registry: &HandleRegistry) -> Handle {
        registry.register(Resource::Result(Arc::clone(self)))
    }
}
