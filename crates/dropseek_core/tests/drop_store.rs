use dropseek_core::model::drop::{expiry_cutoff, DROP_TTL_MS};
use dropseek_core::{Coordinate, DropDraft, DropStore, NewDrop, SqliteDropStore};

const HOUR_MS: i64 = 60 * 60 * 1000;
const T0: i64 = 1_700_000_000_000;

fn record(name: &str, created_at_ms: i64) -> NewDrop {
    DropDraft::new(name, "meet by the fountain")
        .into_record(Some(Coordinate::new(48.8584, 2.2945)), created_at_ms)
        .unwrap()
}

#[tokio::test]
async fn insert_assigns_ids_and_list_keeps_insertion_order() {
    let store = SqliteDropStore::open_in_memory().unwrap();

    let first = store.insert(&record("first", T0)).await.unwrap();
    let second = store.insert(&record("second", T0 - HOUR_MS)).await.unwrap();
    assert_ne!(first, second);

    let drops = store.list_all().await.unwrap();
    let names: Vec<&str> = drops.iter().map(|drop| drop.name.as_str()).collect();
    assert_eq!(names, ["first", "second"]);
    assert_eq!(drops[0].id, first);
    assert_eq!(drops[0].author, "Anonymous");
    assert_eq!(drops[0].created_at_ms, T0);
}

#[tokio::test]
async fn password_round_trips_and_empty_reads_as_none() {
    let store = SqliteDropStore::open_in_memory().unwrap();
    let locked = DropDraft::new("locked", "secret")
        .with_password("Open Sesame")
        .into_record(Some(Coordinate::new(0.0, 0.0)), T0)
        .unwrap();
    let mut blank = record("blank", T0);
    blank.password = Some(String::new());

    store.insert(&locked).await.unwrap();
    store.insert(&blank).await.unwrap();

    let drops = store.list_all().await.unwrap();
    assert_eq!(drops[0].password.as_deref(), Some("Open Sesame"));
    assert!(drops[0].is_locked());
    assert_eq!(drops[1].password, None);
}

#[tokio::test]
async fn delete_by_id_is_idempotent() {
    let store = SqliteDropStore::open_in_memory().unwrap();
    let id = store.insert(&record("once", T0)).await.unwrap();

    store.delete_by_id(id).await.unwrap();
    store.delete_by_id(id).await.unwrap();
    assert!(store.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_created_before_removes_only_older_drops() {
    let store = SqliteDropStore::open_in_memory().unwrap();
    store.insert(&record("old", T0)).await.unwrap();
    store.insert(&record("young", T0 + 2 * HOUR_MS)).await.unwrap();

    // 23 hours later nothing has expired.
    let removed = store
        .delete_created_before(expiry_cutoff(T0 + 23 * HOUR_MS))
        .await
        .unwrap();
    assert_eq!(removed, 0);

    // Exactly 24 hours is not yet past the lifetime.
    let removed = store
        .delete_created_before(expiry_cutoff(T0 + DROP_TTL_MS))
        .await
        .unwrap();
    assert_eq!(removed, 0);

    let removed = store
        .delete_created_before(expiry_cutoff(T0 + DROP_TTL_MS + 1_000))
        .await
        .unwrap();
    assert_eq!(removed, 1);

    let remaining = store.list_all().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].name, "young");

    let removed = store.delete_created_before(0).await.unwrap();
    assert_eq!(removed, 0);
}

#[tokio::test]
async fn file_store_is_shared_between_handles() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("drops.db");

    let writer = SqliteDropStore::open(&path).unwrap();
    let id = writer.insert(&record("shared", T0)).await.unwrap();

    let reader = SqliteDropStore::open(&path).unwrap();
    let drops = reader.list_all().await.unwrap();
    assert_eq!(drops.len(), 1);
    assert_eq!(drops[0].id, id);
    assert_eq!(drops[0].location, Coordinate::new(48.8584, 2.2945));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_clones_serialize_on_one_connection() {
    let store = SqliteDropStore::open_in_memory().unwrap();

    let mut handles = Vec::new();
    for index in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .insert(&record(&format!("drop-{index}"), T0 + index))
                .await
                .unwrap()
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(store.list_all().await.unwrap().len(), 8);
}
