//!
//! Safe wrapper around a live database connection.
//!
//! `Connector` is the single owner a host holds; `ConnectionRef` is the
//! clonable view that lives in the handle registry and is what foreign
//! callers get back when they resolve a connection handle. Both share one
//! `ConnectorInner` whose state is guarded by its own mutex, independent of
//! the registry lock and of every other resource.
//!
//! State machine: Disconnected -> Connected -> Disconnected. A registry
//! handle exists exactly while the connection is open. Statements on one
//! connector are serialized; distinct connectors run in parallel.
//!

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::driver::{Driver, DriverConnection, DriverError, Value};
use crate::error::{InterlinkError, Result};
use crate::finalizer::Finalizer;
use crate::handle::Handle;
use crate::registry::{HandleRegistry, Resource};
use crate::result::MaterializedResult;

struct ConnectionState {
    conn: Option<Box<dyn DriverConnection>>,
    handle: Option<Handle>,
}

struct ConnectorInner {
    target: String,
    driver: Arc<dyn Driver>,
    registry: Arc<HandleRegistry>,
    state: Mutex<ConnectionState>,
}

impl ConnectorInner {
    fn not_connected(&self) -> InterlinkError {
        InterlinkError::NotConnected {
            target: self.target.clone(),
        }
    }

    fn close(&self) -> Result<()> {
        let mut state = self.state.lock();
        let Some(conn) = state.conn.take() else {
            return Ok(());
        };

        if let Some(handle) = state.handle.take() {
            if self.registry.release(handle).is_err() {
                tracing::debug!(%handle, db = %self.target, "connection handle already released");
            }
        }

        tracing::debug!(db = %self.target, "closing connection");
        conn.close().map_err(|source| InterlinkError::ConnectionError {
            target: self.target.clone(),
            source,
        })
    }

    fn query(&self, sql: &str, args: &[Value]) -> Result<MaterializedResult> {
        let mut state = self.state.lock();
        let conn = state.conn.as_mut().ok_or_else(|| self.not_connected())?;

        let mut snapshot = None;
        conn.query(sql, args, &mut |cursor| {
            snapshot = Some(MaterializedResult::from_cursor(cursor)?);
            Ok(())
        })
        .map_err(|source| InterlinkError::query(sql, source))?;

        snapshot.ok_or_else(|| {
            InterlinkError::query(sql, DriverError::Other("driver returned no cursor".to_string()))
        })
    }

    fn execute(&self, sql: &str, args: &[Value]) -> Result<u64> {
        let mut state = self.state.lock();
        let conn = state.conn.as_mut().ok_or_else(|| self.not_connected())?;
        conn.execute(sql, args)
            .map_err(|source| InterlinkError::query(sql, source))
    }
}

/// Registry-held view of a connector. Cloning is cheap; every clone sees
/// the same connection state.
#[derive(Clone)]
pub struct ConnectionRef {
    inner: Arc<ConnectorInner>,
}

impl ConnectionRef {
    fn connect(&self) -> Result<Handle> {
        let inner = &self.inner;
        let mut state = inner.state.lock();
        if let Some(handle) = state.handle {
            if inner.registry.contains(handle) {
                return Ok(handle);
            }
            // Released from the foreign side while still open.
            let fresh = inner.registry.register(Resource::Connection(self.clone()));
            state.handle = Some(fresh);
            tracing::debug!(stale = %handle, handle = %fresh, db = %inner.target, "re-registered open connection");
            return Ok(fresh);
        }

        let connection_error = |source| InterlinkError::ConnectionError {
            target: inner.target.clone(),
            source,
        };

        let mut conn = inner.driver.open(&inner.target).map_err(connection_error)?;
        if let Err(source) = conn.ping() {
            if let Err(err) = conn.close() {
                tracing::debug!(db = %inner.target, error = %err, "teardown after failed ping");
            }
            return Err(connection_error(source));
        }

        let handle = inner.registry.register(Resource::Connection(self.clone()));
        state.conn = Some(conn);
        state.handle = Some(handle);
        tracing::debug!(%handle, db = %inner.target, driver = inner.driver.name(), "connected");
        Ok(handle)
    }

    pub(crate) fn close(&self) -> Result<()> {
        self.inner.close()
    }

    /// Execute `sql` and snapshot every row it returns.
    pub fn query(&self, sql: &str, args: &[Value]) -> Result<MaterializedResult> {
        self.inner.query(sql, args)
    }

    /// Execute a statement that returns no rows; yields the affected row count.
    pub fn execute(&self, sql: &str, args: &[Value]) -> Result<u64> {
        self.inner.execute(sql, args)
    }

    pub fn is_connected(&self) -> bool {
        self.inner.state.lock().conn.is_some()
    }

    pub fn handle(&self) -> Option<Handle> {
        self.inner.state.lock().handle
    }

    pub fn target(&self) -> &str {
        &self.inner.target
    }
}

impl fmt::Debug for ConnectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionRef")
            .field("target", &self.inner.target)
            .field("driver", &self.inner.driver.name())
            .finish()
    }
}

/// Owning wrapper around one database connection.
///
/// `connect` and `close` are idempotent. Dropping a connector that is still
/// connected closes it through its finalizer; callers should still close
/// explicitly to observe the close result.
pub struct Connector {
    shared: ConnectionRef,
    finalizer: Mutex<Option<Finalizer>>,
}

impl Connector {
    pub fn new(
        target: impl Into<String>,
        driver: Arc<dyn Driver>,
        registry: Arc<HandleRegistry>,
    ) -> Self {
        let inner = ConnectorInner {
            target: target.into(),
            driver,
            registry,
            state: Mutex::new(ConnectionState {
                conn: None,
                handle: None,
            }),
        };
        Self {
            shared: ConnectionRef {
                inner: Arc::new(inner),
            },
            finalizer: Mutex::new(None),
        }
    }

    /// Open and ping the connection, then register it. Returns the
    /// connection's handle; an already-open connector returns its existing
    /// handle, or a fresh one if the old handle was released through the
    /// registry. On failure nothing is registered.
    pub fn connect(&self) -> Result<Handle> {
        // Held across the state change so close cannot disarm a finalizer
        // that a concurrent connect relies on.
        let mut finalizer = self.finalizer.lock();
        let handle = self.shared.connect()?;

        if finalizer.is_none() {
            let label = format!("connector '{}'", self.shared.target());
            *finalizer = Some(Finalizer::attach(
                &self.shared.inner,
                label,
                ConnectorInner::close,
            ));
        }
        Ok(handle)
    }

    /// Release the handle and close the connection. The connector is
    /// disconnected afterwards even when the driver reports a close error.
    pub fn close(&self) -> Result<()> {
        let mut finalizer = self.finalizer.lock();
        let closed = self.shared.close();
        if let Some(mut armed) = finalizer.take() {
            armed.disarm();
        }
        closed
    }

    pub fn query(&self, sql: &str, args: &[Value]) -> Result<MaterializedResult> {
        self.shared.query(sql, args)
    }

    pub fn execute(&self, sql: &str, args: &[Value]) -> Result<u64> {
        self.shared.execute(sql, args)
    }

    pub fn is_connected(&self) -> bool {
        self.shared.is_connected()
    }

    pub fn handle(&self) -> Option<Handle> {
        self.shared.handle()
    }

    pub fn target(&self) -> &str {
        self.shared.target()
    }

    pub fn connection_ref(&self) -> ConnectionRef {
        self.shared.clone()
    }
}

impl fmt::Debug for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connector")
            .field("target", &self.shared.target())
            .field("handle", &self.handle())
            .finish()
    }
}
