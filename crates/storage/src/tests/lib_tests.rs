use super::*;

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn put_then_get_round_trips_per_screen() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage
        .put("orders", "filters_open", "true")
        .await
        .expect("put");
    storage
        .put("returns", "filters_open", "false")
        .await
        .expect("put");

    assert_eq!(
        storage.get("orders", "filters_open").await.expect("get"),
        Some("true".to_string())
    );
    assert_eq!(
        storage.get("returns", "filters_open").await.expect("get"),
        Some("false".to_string())
    );
    assert_eq!(storage.get("orders", "columns").await.expect("get"), None);
}

#[tokio::test]
async fn put_overwrites_existing_value() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.put("orders", "columns", "[\"id\"]").await.expect("put");
    storage
        .put("orders", "columns", "[\"id\",\"total\"]")
        .await
        .expect("overwrite");

    let listed = storage.list("orders").await.expect("list");
    assert_eq!(
        listed,
        vec![("columns".to_string(), "[\"id\",\"total\"]".to_string())]
    );
}

#[tokio::test]
async fn remove_deletes_only_the_named_key() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.put("orders", "a", "1").await.expect("put");
    storage.put("orders", "b", "2").await.expect("put");
    storage.remove("orders", "a").await.expect("remove");

    assert_eq!(storage.get("orders", "a").await.expect("get"), None);
    assert_eq!(
        storage.get("orders", "b").await.expect("get"),
        Some("2".to_string())
    );
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("nested").join("prefs.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );
}

#[tokio::test]
async fn memory_preferences_scope_keys_by_screen() {
    let prefs = MemoryPreferences::new();
    prefs.put("orders", "k", "v").await.expect("put");
    prefs.put("customers", "k", "w").await.expect("put");

    assert_eq!(
        prefs.list("orders").await.expect("list"),
        vec![("k".to_string(), "v".to_string())]
    );
    prefs.remove("orders", "k").await.expect("remove");
    assert_eq!(prefs.get("orders", "k").await.expect("get"), None);
    assert_eq!(
        prefs.get("customers", "k").await.expect("get"),
        Some("w".to_string())
    );
}

#[test]
fn sqlite_path_ignores_memory_urls() {
    assert_eq!(sqlite_path("sqlite::memory:"), None);
    assert_eq!(
        sqlite_path("sqlite://./data/prefs.db?mode=rwc"),
        Some(PathBuf::from("./data/prefs.db"))
    );
}
