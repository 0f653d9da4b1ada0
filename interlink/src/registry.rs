//!
//! Process-wide handle registry.
//!
//! Maps opaque `Handle`s to the resources they stand for. The registry owns
//! every entry between `register` and `release`; wrappers only remember the
//! integer. All table access goes through one mutex and only touches
//! metadata: `resolve` hands back a clone of the entry (an `Arc` or a small
//! value) so no resource work ever runs under the table lock.
//!
//! Handles come from a single atomic counter starting at 1 and are never
//! reused for the lifetime of the registry.
//!

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::connector::ConnectionRef;
use crate::error::{InterlinkError, Result};
use crate::handle::Handle;
use crate::result::MaterializedResult;
use crate::user::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Connection,
    Result,
    User,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Connection => "connection",
            ResourceKind::Result => "result",
            ResourceKind::User => "user",
        };
        f.write_str(name)
    }
}

/// Everything that can sit behind a handle.
#[derive(Debug, Clone)]
pub enum Resource {
    Connection(ConnectionRef),
    Result(Arc<MaterializedResult>),
    User(User),
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Connection(_) => ResourceKind::Connection,
            Resource::Result(_) => ResourceKind::Result,
            Resource::User(_) => ResourceKind::User,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Resource::Connection(conn) => format!(
                "connection to '{}' ({})",
                conn.target(),
                if conn.is_connected() { "open" } else { "closed" }
            ),
            Resource::Result(result) => format!(
                "result of {} rows x {} columns",
                result.row_count(),
                result.column_count()
            ),
            Resource::User(user) => format!("user {} '{}'", user.id, user.username),
        }
    }
}

pub struct HandleRegistry {
    next_id: AtomicU64,
    entries: Mutex<HashMap<Handle, Resource>>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn register(&self, resource: Resource) -> Handle {
        let raw = self.next_id.fetch_add(1, Ordering::Relaxed);
        let Some(handle) = Handle::from_raw(raw) else {
            panic!("handle space exhausted");
        };

        tracing::debug!(%handle, kind = %resource.kind(), "registered handle");
        self.entries.lock().insert(handle, resource);
        handle
    }

    pub fn resolve(&self, handle: Handle) -> Result<Resource> {
        self.entries
            .lock()
            .get(&handle)
            .cloned()
            .ok_or(InterlinkError::InvalidHandle {
                handle: handle.get(),
            })
    }

    /// Remove and drop the entry. The removed resource is dropped after the
    /// table lock is released.
    pub fn release(&self, handle: Handle) -> Result<()> {
        let removed = self.entries.lock().remove(&handle);
        match removed {
            Some(resource) => {
                tracing::debug!(%handle, kind = %resource.kind(), "released handle");
                drop(resource);
                Ok(())
            }
            None => Err(InterlinkError::InvalidHandle {
                handle: handle.get(),
            }),
        }
    }

    /// `resolve` for a bare integer received from a foreign caller.
    pub fn resolve_raw(&self, raw: u64) -> Result<Resource> {
        self.resolve(Self::parse_raw(raw)?)
    }

    /// `release` for a bare integer received from a foreign caller.
    pub fn release_raw(&self, raw: u64) -> Result<()> {
        self.release(Self::parse_raw(raw)?)
    }

    pub fn resolve_connection(&self, handle: Handle) -> Result<ConnectionRef> {
        match self.resolve(handle)? {
            Resource::Connection(conn) => Ok(conn),
            other => Err(mismatch(handle, ResourceKind::Connection, &other)),
        }
    }

    pub fn resolve_result(&self, handle: Handle) -> Result<Arc<MaterializedResult>> {
        match self.resolve(handle)? {
            Resource::Result(result) => Ok(result),
            other => Err(mismatch(handle, ResourceKind::Result, &other)),
        }
    }

    pub fn resolve_user(&self, handle: Handle) -> Result<User> {
        match self.resolve(handle)? {
            Resource::User(user) => Ok(user),
            other => Err(mismatch(handle, ResourceKind::User, &other)),
        }
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.entries.lock().contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Tear the registry down: drain every entry, close connection entries,
    /// and return how many entries were dropped. Handles keep counting up
    /// afterwards; none are reused.
    pub fn shutdown(&self) -> usize {
        let drained: Vec<(Handle, Resource)> = self.entries.lock().drain().collect();
        let count = drained.len();

        for (handle, resource) in drained {
            if let Resource::Connection(conn) = &resource {
                if let Err(err) = conn.close() {
                    tracing::warn!(%handle, error = %err, "closing connection during shutdown failed");
                }
            }
        }

        tracing::info!(count, "handle registry shut down");
        count
    }

    fn parse_raw(raw: u64) -> Result<Handle> {
        Handle::from_raw(raw).ok_or(InterlinkError::InvalidHandle { handle: raw })
    }
}

impl Default for HandleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HandleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleRegistry")
            .field("next_id", &self.next_id.load(Ordering::Relaxed))
            .field("live", &self.len())
            .finish()
    }
}

fn mismatch(handle: Handle, expected: ResourceKind, found: &Resource) -> InterlinkError {
    InterlinkError::HandleKindMismatch {
        handle: handle.get(),
        expected,
        found: found.kind(),
    }
}
