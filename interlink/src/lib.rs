//!
//! interlink - Opaque-handle resource bridge
//!
//! Lets stateful resources (database connections, query results, user
//! records) be passed to callers in another runtime as bare integers:
//!
//! - `HandleRegistry` maps `Handle`s to the resources they stand for
//! - `Connector` wraps a live connection and owns at most one handle
//! - `MaterializedResult` is an immutable snapshot of a query's rows
//! - `Finalizer` closes a forgotten connector when its owner is dropped
//! - `interop` holds the (unimplemented) foreign-call entry points
//!
//! Resources are never shared by reference across the boundary. A foreign
//! caller only ever holds the integer, and a stale integer resolves to
//! `InvalidHandle` rather than to freed memory.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use interlink::{Connector, HandleRegistry, SqliteDriver};
//!
//! let registry = Arc::new(HandleRegistry::new());
//! let connector = Connector::new(":memory:", Arc::new(SqliteDriver::new()), registry.clone());
//! let handle = connector.connect()?;
//! let result = connector.query("SELECT 1 AS x", &[])?;
//! assert_eq!(result.value_at(0, 0)?, "1");
//! connector.close()?;
//! ```
//!

pub mod config;
pub mod connector;
pub mod driver;
pub mod error;
pub mod finalizer;
pub mod handle;
pub mod interop;
pub mod registry;
pub mod result;
pub mod user;

pub use config::{InterlinkConfig, CONFIG_FILE_NAME};
pub use connector::{ConnectionRef, Connector};
pub use driver::{Cursor, Driver, DriverConnection, DriverError, SqliteDriver, Value};
pub use error::{InterlinkError, Result};
pub use finalizer::Finalizer;
pub use handle::Handle;
pub use interop::{ForeignRuntime, UnimplementedRuntime};
pub use registry::{HandleRegistry, Resource, ResourceKind};
pub use result::MaterializedResult;
pub use user::{User, UserStore};
