use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tokio::sync::RwLock;

/// Device-local key-value storage for per-screen UI preferences.
///
/// Nothing stored here is authoritative; losing it only resets the screen to
/// its defaults.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn get(&self, screen: &str, key: &str) -> Result<Option<String>>;
    async fn put(&self, screen: &str, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, screen: &str, key: &str) -> Result<()>;
    async fn list(&self, screen: &str) -> Result<Vec<(String, String)>>;
}

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }
}

#[async_trait]
impl PreferenceStore for Storage {
    async fn get(&self, screen: &str, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM ui_preferences WHERE screen = ? AND pref_key = ?")
            .bind(screen)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to read preference {screen}/{key}"))?;
        row.map(|r| r.try_get::<String, _>("value"))
            .transpose()
            .map_err(Into::into)
    }

    async fn put(&self, screen: &str, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO ui_preferences (screen, pref_key, value, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(screen, pref_key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(screen)
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to write preference {screen}/{key}"))?;
        Ok(())
    }

    async fn remove(&self, screen: &str, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM ui_preferences WHERE screen = ? AND pref_key = ?")
            .bind(screen)
            .bind(key)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete preference {screen}/{key}"))?;
        Ok(())
    }

    async fn list(&self, screen: &str) -> Result<Vec<(String, String)>> {
        let rows = sqlx::query(
            "SELECT pref_key, value FROM ui_preferences WHERE screen = ? ORDER BY pref_key",
        )
        .bind(screen)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("failed to list preferences for {screen}"))?;

        rows.into_iter()
            .map(|row| Ok((row.try_get("pref_key")?, row.try_get("value")?)))
            .collect()
    }
}

/// Process-local store, for tests and for running without a preferences file.
#[derive(Default)]
pub struct MemoryPreferences {
    entries: RwLock<BTreeMap<(String, String), String>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PreferenceStore for MemoryPreferences {
    async fn get(&self, screen: &str, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().await;
        Ok(entries.get(&(screen.to_string(), key.to_string())).cloned())
    }

    async fn put(&self, screen: &str, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .await
            .insert((screen.to_string(), key.to_string()), value.to_string());
        Ok(())
    }

    async fn remove(&self, screen: &str, key: &str) -> Result<()> {
        self.entries
            .write()
            .await
            .remove(&(screen.to_string(), key.to_string()));
        Ok(())
    }

    async fn list(&self, screen: &str) -> Result<Vec<(String, String)>> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|((s, _), _)| s == screen)
            .map(|((_, k), v)| (k.clone(), v.clone()))
            .collect())
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
