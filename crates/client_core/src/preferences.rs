//! Per-screen UI preferences kept on the device.

use serde::{Deserialize, Serialize};
use shared::domain::DEFAULT_PER_PAGE;
use storage::PreferenceStore;
use tracing::warn;

const PREFERENCES_KEY: &str = "screen_preferences";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenPreferences {
    pub filters_open: bool,
    /// Visible columns in display order; empty means the screen's defaults.
    pub columns: Vec<String>,
    pub per_page: Option<u32>,
}

impl ScreenPreferences {
    /// Missing, unreadable or corrupt preferences fall back to defaults.
    pub async fn load(store: &dyn PreferenceStore, screen: &str) -> Self {
        let raw = match store.get(screen, PREFERENCES_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Self::default(),
            Err(err) => {
                warn!(screen, error = %err, "failed to read screen preferences; using defaults");
                return Self::default();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|err| {
            warn!(screen, error = %err, "discarding corrupt screen preferences");
            Self::default()
        })
    }

    pub async fn save(&self, store: &dyn PreferenceStore, screen: &str) -> anyhow::Result<()> {
        let raw = serde_json::to_string(self)?;
        store.put(screen, PREFERENCES_KEY, &raw).await
    }

    pub async fn reset(store: &dyn PreferenceStore, screen: &str) -> anyhow::Result<()> {
        store.remove(screen, PREFERENCES_KEY).await
    }

    pub fn effective_per_page(&self) -> u32 {
        self.per_page
            .filter(|per_page| *per_page > 0)
            .unwrap_or(DEFAULT_PER_PAGE)
    }
}

#[cfg(test)]
#[path = "tests/preferences_tests.rs"]
mod tests;
