use storage::{PreferenceStore, Storage};

#[tokio::test]
async fn preferences_survive_reopening_the_database() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("prefs.db");
    let url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    {
        let storage = Storage::new(&url).await.expect("open");
        storage
            .put("layout-items", "filters_open", "true")
            .await
            .expect("put");
        storage.pool().close().await;
    }

    let reopened = Storage::new(&url).await.expect("reopen");
    assert_eq!(
        reopened
            .get("layout-items", "filters_open")
            .await
            .expect("get"),
        Some("true".to_string())
    );
}
