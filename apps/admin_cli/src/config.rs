use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use client_core::{ClientConfig, ClientError, DebouncePolicy};
use serde::Deserialize;

pub const SETTINGS_FILE: &str = "admin.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub api_url: String,
    pub api_token: Option<String>,
    pub preferences_db: String,
    pub debounce_ms: u64,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8000/api/".into(),
            api_token: None,
            preferences_db: "sqlite://./data/admin_preferences.db".into(),
            debounce_ms: 300,
            request_timeout_secs: 30,
        }
    }
}

impl Settings {
    pub fn client_config(&self) -> Result<ClientConfig, ClientError> {
        let mut config = ClientConfig::new(&self.api_url)?
            .with_timeout(Duration::from_secs(self.request_timeout_secs.max(1)));
        if let Some(token) = &self.api_token {
            config = config.with_token(token.clone());
        }
        Ok(config)
    }

    pub fn debounce_policy(&self) -> DebouncePolicy {
        DebouncePolicy::with_delay(Duration::from_millis(self.debounce_ms))
    }
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

/// File values first, then environment overrides; unparseable numbers are ignored.
pub fn load_settings_from<F>(path: &Path, env: F) -> Settings
where
    F: Fn(&str) -> Option<String>,
{
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            if let Some(v) = file_cfg.get("api_url") {
                settings.api_url = v.clone();
            }
            if let Some(v) = file_cfg.get("api_token") {
                settings.api_token = Some(v.clone());
            }
            if let Some(v) = file_cfg.get("preferences_db") {
                settings.preferences_db = v.clone();
            }
            if let Some(v) = file_cfg.get("debounce_ms").and_then(|v| v.parse().ok()) {
                settings.debounce_ms = v;
            }
            if let Some(v) = file_cfg
                .get("request_timeout_secs")
                .and_then(|v| v.parse().ok())
            {
                settings.request_timeout_secs = v;
            }
        }
    }

    if let Some(v) = env("ADMIN_API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = env("APP__API_URL") {
        settings.api_url = v;
    }

    if let Some(v) = env("ADMIN_API_TOKEN") {
        settings.api_token = Some(v);
    }

    if let Some(v) = env("APP__PREFERENCES_DB") {
        settings.preferences_db = v;
    }

    if let Some(v) = env("APP__DEBOUNCE_MS").and_then(|v| v.parse().ok()) {
        settings.debounce_ms = v;
    }
    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
        settings.request_timeout_secs = v;
    }

    settings
}

pub fn prepare_preferences_url(raw_url: &str) -> anyhow::Result<String> {
    let url = normalize_preferences_url(raw_url);
    if let Some(parent) = sqlite_path(&url).as_deref().and_then(Path::parent) {
        fs::create_dir_all(parent).with_context(|| {
            format!(
                "failed to create parent directory '{}' for preferences url '{url}'",
                parent.display()
            )
        })?;
    }
    Ok(url)
}

fn normalize_preferences_url(raw_url: &str) -> String {
    let raw_url = raw_url.trim();

    if raw_url.is_empty() {
        return Settings::default().preferences_db;
    }

    if raw_url.starts_with("sqlite::memory:") || raw_url.contains("://") {
        return raw_url.to_string();
    }

    if let Some(path) = raw_url.strip_prefix("sqlite:") {
        return format!("sqlite://{}", path.replace('\\', "/"));
    }

    format!("sqlite://{}", raw_url.replace('\\', "/"))
}

fn sqlite_path(url: &str) -> Option<PathBuf> {
    let path = url.strip_prefix("sqlite://")?.split('?').next()?;
    if path.is_empty() {
        return None;
    }
    Some(PathBuf::from(path))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
