//!
//! # End-to-end connector scenarios
//!
//! Covers the full lifecycle against real SQLite databases: connect,
//! query, snapshot isolation, idempotent close, unreachable targets, and
//! foreign callers working purely through handles.
//!

use std::sync::Arc;
use std::thread;

use tempfile::TempDir;

use interlink::interop::call_java_method;
use interlink::{
    Connector, ForeignRuntime, HandleRegistry, InterlinkError, SqliteDriver, UnimplementedRuntime,
    User, UserStore, Value,
};

fn memory_connector(registry: &Arc<HandleRegistry>) -> Connector {
    Connector::new(":memory:", Arc::new(SqliteDriver::new()), Arc::clone(registry))
}

#[test]
fn test_select_one_lifecycle() {
    let registry = Arc::new(HandleRegistry::new());
    let connector = memory_connector(&registry);

    let handle = connector.connect().expect("in-memory database should be reachable");
    assert_ne!(handle.get(), 0);

    let result = connector.query("SELECT 1 AS x", &[]).unwrap();
    assert_eq!(result.column_count(), 1);
    assert_eq!(result.row_count(), 1);
    assert_eq!(result.column_names(), ["x"]);
    assert_eq!(result.value_at(0, 0).unwrap(), "1");

    connector.close().unwrap();
    connector.close().unwrap();
    assert!(matches!(
        connector.query("SELECT 1 AS x", &[]),
        Err(InterlinkError::NotConnected { .. })
    ));
}

#[test]
fn test_unreachable_target() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("no-such-dir").join("app.db");
    let registry = Arc::new(HandleRegistry::new());
    let before = registry.len();

    let connector = Connector::new(
        missing.to_string_lossy(),
        Arc::new(SqliteDriver::new().create_if_missing(true)),
        Arc::clone(&registry),
    );
    let err = connector.connect().unwrap_err();

    assert!(matches!(err, InterlinkError::ConnectionError { .. }));
    assert!(!connector.is_connected());
    assert!(connector.handle().is_none());
    assert_eq!(registry.len(), before);
}

#[test]
fn test_snapshot_survives_mutation_and_close() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("snap.db");
    let registry = Arc::new(HandleRegistry::new());
    let connector = Connector::new(
        path.to_string_lossy(),
        Arc::new(SqliteDriver::new().create_if_missing(true)),
        Arc::clone(&registry),
    );
    connector.connect().unwrap();
    connector.execute("CREATE TABLE items (name TEXT, qty INTEGER)", &[]).unwrap();
    connector
        .execute("INSERT INTO items VALUES (?1, ?2)", &[Value::from("bolt"), Value::Integer(3)])
        .unwrap();

    let result = connector.query("SELECT name, qty FROM items", &[]).unwrap();

    connector.execute("UPDATE items SET qty = 99", &[]).unwrap();
    connector
        .execute("INSERT INTO items VALUES ('nut', NULL)", &[])
        .unwrap();
    connector.close().unwrap();

    assert_eq!(result.row_count(), 1);
    assert_eq!(result.column_count(), 2);
    assert_eq!(result.value_at(0, 0).unwrap(), "bolt");
    assert_eq!(result.value_at(0, 1).unwrap(), "3");
}

#[test]
fn test_foreign_caller_uses_only_handles() {
    let registry = Arc::new(HandleRegistry::new());
    let connector = memory_connector(&registry);
    let conn_handle = connector.connect().unwrap().get();

    // A foreign caller holds nothing but integers.
    let conn = registry
        .resolve_raw(conn_handle)
        .and_then(|r| match r {
            interlink::Resource::Connection(c) => Ok(c),
            other => panic!("unexpected {}", other.kind()),
        })
        .unwrap();
    let result_handle = conn
        .query("SELECT 'a' AS k UNION ALL SELECT 'b'", &[])
        .unwrap()
        .into_handle(&registry)
        .get();

    let result = registry
        .resolve_result(interlink::Handle::from_raw(result_handle).unwrap())
        .unwrap();
    assert_eq!(result.row_count(), 2);
    assert_eq!(result.value_at(1, 0).unwrap(), "b");

    registry.release_raw(result_handle).unwrap();
    assert!(matches!(
        registry.release_raw(result_handle),
        Err(InterlinkError::InvalidHandle { .. })
    ));
    // The caller's own Arc keeps the data readable after release.
    assert_eq!(result.value_at(0, 0).unwrap(), "a");

    connector.close().unwrap();
    assert!(registry.resolve_raw(conn_handle).is_err());
}

#[test]
fn test_concurrent_queries_on_one_connector() {
    let registry = Arc::new(HandleRegistry::new());
    let connector = Arc::new(memory_connector(&registry));
    connector.connect().unwrap();
    let store = UserStore::new(connector.connection_ref());
    store.ensure_schema().unwrap();
    store.create("alice", "alice@example.com").unwrap();

    let workers: Vec<_> = (0..10)
        .map(|_| {
            let connector = Arc::clone(&connector);
            thread::spawn(move || {
                let result = connector
                    .query("SELECT id, username, email FROM users", &[])
                    .unwrap();
                result.value_at(0, 1).unwrap().to_string()
            })
        })
        .collect();

    for worker in workers {
        assert_eq!(worker.join().unwrap(), "alice");
    }
    connector.close().unwrap();
}

#[test]
fn test_independent_connectors_in_parallel() {
    let registry = Arc::new(HandleRegistry::new());
    let workers: Vec<_> = (0..4)
        .map(|i| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let connector = memory_connector(&registry);
                let handle = connector.connect().unwrap();
                let result = connector.query("SELECT ?1", &[Value::Integer(i)]).unwrap();
                assert_eq!(result.value_at(0, 0).unwrap(), i.to_string());
                connector.close().unwrap();
                handle
            })
        })
        .collect();

    let mut handles: Vec<_> = workers.into_iter().map(|w| w.join().unwrap()).collect();
    handles.sort();
    handles.dedup();
    assert_eq!(handles.len(), 4);
    assert!(registry.is_empty());
}

#[test]
fn test_registry_shutdown_closes_connectors() {
    let registry = Arc::new(HandleRegistry::new());
    let connector = memory_connector(&registry);
    connector.connect().unwrap();
    User::new(1, "alice", "alice@example.com").to_handle(&registry);

    assert_eq!(registry.shutdown(), 2);
    assert!(!connector.is_connected());
    connector.close().unwrap();
}

#[test]
fn test_cross_runtime_stub() {
    let err = UnimplementedRuntime
        .invoke("other-runtime", "anyFunc", &[])
        .unwrap_err();
    assert!(matches!(err, InterlinkError::NotImplemented { .. }));
    assert!(call_java_method("Users", "find", &[Value::Integer(1)]).is_err());
}
