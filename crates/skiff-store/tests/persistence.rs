//! Store behavior across instances sharing one directory.

use serde::{Deserialize, Serialize};
use skiff_store::{ResponseStore, StoreError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Payload {
    status: u16,
    body:   String,
}

#[test]
fn entries_survive_across_store_instances() {
    let dir = tempfile::tempdir().unwrap();
    let payload = Payload {
        status: 200,
        body: r#"{"ok":true}"#.to_string(),
    };

    let writer = ResponseStore::open(dir.path()).unwrap();
    writer.store("api.test/users", payload.clone(), 300).unwrap();

    let reader = ResponseStore::new(dir.path());
    let entry = reader.lookup::<Payload>("api.test/users").unwrap();
    assert_eq!(entry.payload, payload);
}

#[test]
fn delete_then_lookup_misses() {
    let dir = tempfile::tempdir().unwrap();
    let store = ResponseStore::open(dir.path()).unwrap();

    store.store("api.test/users", 42u32, 300).unwrap();
    store.clear("api.test/users").unwrap();

    assert!(store.lookup::<u32>("api.test/users").is_none());
    assert!(matches!(
        store.clear("api.test/users"),
        Err(StoreError::Delete(_))
    ));
}
