//!
//! User records and their data-access primitives.
//!
//! `User` is a plain value: it crosses a runtime boundary either by copy or
//! as a registry handle (`to_handle` / `from_handle`). `UserStore` is the
//! small set of queries the HTTP, gRPC and proxy layers build on; it runs
//! over any open `ConnectionRef` and materializes every result.
//!

use serde::{Deserialize, Serialize};

use crate::connector::ConnectionRef;
use crate::driver::{DriverError, Value};
use crate::error::{InterlinkError, Result};
use crate::handle::Handle;
use crate::registry::{HandleRegistry, Resource};
use crate::result::MaterializedResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
}

impl User {
    pub fn new(id: i64, username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            email: email.into(),
        }
    }

    /// Register a copy of this user and return its handle.
    pub fn to_handle(&self, registry: &HandleRegistry) -> Handle {
        registry.register(Resource::User(self.clone()))
    }

    /// Copy the user stored under `handle`. Fails with `InvalidHandle` for an
    /// unknown handle and `HandleKindMismatch` when the handle holds
    /// something else.
    pub fn from_handle(registry: &HandleRegistry, handle: Handle) -> Result<User> {
        registry.resolve_user(handle)
    }
}

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT UNIQUE NOT NULL,
    email TEXT UNIQUE NOT NULL
)";

const SELECT_USER: &str = "SELECT id, username, email FROM users";

pub struct UserStore {
    conn: ConnectionRef,
}

impl UserStore {
    pub fn new(conn: ConnectionRef) -> Self {
        Self { conn }
    }

    pub fn ensure_schema(&self) -> Result<()> {
        self.conn.execute(SCHEMA, &[])?;
        Ok(())
    }

    /// Insert a user; `id` on the input is ignored and assigned by the
    /// database.
    pub fn create(&self, username: &str, email: &str) -> Result<User> {
        let sql = "INSERT INTO users (username, email) VALUES (?1, ?2) RETURNING id, username, email";
        let result = self.conn.query(sql, &[Value::from(username), Value::from(email)])?;
        users_from(&result, sql)?
            .into_iter()
            .next()
            .ok_or_else(|| InterlinkError::query(sql, DriverError::Other("insert returned no row".to_string())))
    }

    pub fn get(&self, id: i64) -> Result<User> {
        let sql = format!("{} WHERE id = ?1", SELECT_USER);
        let result = self.conn.query(&sql, &[Value::Integer(id)])?;
        users_from(&result, &sql)?
            .into_iter()
            .next()
            .ok_or(InterlinkError::UserNotFound { id })
    }

    pub fn list(&self) -> Result<Vec<User>> {
        let sql = format!("{} ORDER BY id", SELECT_USER);
        let result = self.conn.query(&sql, &[])?;
        users_from(&result, &sql)
    }

    /// One page of users ordered by id. Pages are numbered from 1; page 0
    /// is treated as page 1.
    pub fn list_page(&self, page_size: u32, page_number: u32) -> Result<Vec<User>> {
        let offset = u64::from(page_number.saturating_sub(1)) * u64::from(page_size);
        let sql = format!("{} ORDER BY id LIMIT ?1 OFFSET ?2", SELECT_USER);
        let result = self.conn.query(
            &sql,
            &[Value::Integer(i64::from(page_size)), Value::Integer(offset as i64)],
        )?;
        users_from(&result, &sql)
    }

    pub fn count(&self) -> Result<u64> {
        let sql = "SELECT COUNT(*) FROM users";
        let result = self.conn.query(sql, &[])?;
        let cell = result.value_at(0, 0)?;
        cell.parse::<u64>()
            .map_err(|e| InterlinkError::query(sql, DriverError::Other(format!("bad count '{}': {}", cell, e))))
    }

    /// Overwrite username and email of the user with `user.id`; returns the
    /// number of rows changed.
    pub fn update(&self, user: &User) -> Result<u64> {
        self.conn.execute(
            "UPDATE users SET username = ?1, email = ?2 WHERE id = ?3",
            &[
                Value::from(user.username.as_str()),
                Value::from(user.email.as_str()),
                Value::Integer(user.id),
            ],
        )
    }

    pub fn delete(&self, id: i64) -> Result<u64> {
        self.conn.execute("DELETE FROM users WHERE id = ?1", &[Value::Integer(id)])
    }
}

fn users_from(result: &MaterializedResult, sql: &str) -> Result<Vec<User>> {
    result
        .rows()
        .map(|row| {
            let id = row[0].parse::<i64>().map_err(|e| {
                InterlinkError::query(sql, DriverError::Other(format!("bad user id '{}': {}", row[0], e)))
            })?;
            Ok(User::new(id, row[1].as_str(), row[2].as_str()))
        })
        .collect()
}
