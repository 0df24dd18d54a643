use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

use crate::feed::{ListenerConfig, SimulatedFeedConfig};
use crate::scoring::ScoringRates;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeedSettings {
    pub data_path: String,
    pub inactivity_timeout_ms: u64,
    pub reconnect_attempts: u32,
    pub reconnect_initial_backoff_ms: u64,
    pub reconnect_max_backoff_ms: u64,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            data_path: "waste/live".into(),
            inactivity_timeout_ms: 5_000,
            reconnect_attempts: 0,
            reconnect_initial_backoff_ms: 1_000,
            reconnect_max_backoff_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulationSettings {
    pub sample_interval_ms: u64,
    pub samples_per_measurement: u32,
    pub quiet_period_ms: u64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            sample_interval_ms: 1_000,
            samples_per_measurement: 4,
            quiet_period_ms: 8_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppSettings {
    pub scoring: ScoringRates,
    pub feed: FeedSettings,
    pub simulation: SimulationSettings,
    /// Submit finalized readings without waiting for a human to confirm,
    /// whenever the feed label resolves a category.
    pub auto_submit: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            scoring: ScoringRates::default(),
            feed: FeedSettings::default(),
            simulation: SimulationSettings::default(),
            auto_submit: true,
        }
    }
}

impl AppSettings {
    pub fn listener_config(&self) -> ListenerConfig {
        ListenerConfig {
            data_path: self.feed.data_path.clone(),
            inactivity_timeout: Duration::from_millis(self.feed.inactivity_timeout_ms),
            reconnect_attempts: self.feed.reconnect_attempts,
            reconnect_initial_backoff: Duration::from_millis(self.feed.reconnect_initial_backoff_ms),
            reconnect_max_backoff: Duration::from_millis(self.feed.reconnect_max_backoff_ms),
        }
    }

    pub fn simulated_feed_config(&self) -> SimulatedFeedConfig {
        SimulatedFeedConfig {
            sample_interval: Duration::from_millis(self.simulation.sample_interval_ms),
            samples_per_measurement: self.simulation.samples_per_measurement,
            quiet_period: Duration::from_millis(self.simulation.quiet_period_ms),
        }
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<AppSettings>,
}

impl SettingsStore {
    /// Missing or unreadable settings fall back to defaults.
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log::warn!("Ignoring malformed settings in {}: {err}", path.display());
                AppSettings::default()
            })
        } else {
            AppSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn get(&self) -> AppSettings {
        self.read().clone()
    }

    pub fn update(&self, apply: impl FnOnce(&mut AppSettings)) -> Result<()> {
        let mut guard = self.write();
        apply(&mut *guard);
        self.persist(&guard)
    }

    fn persist(&self, data: &AppSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    fn read(&self) -> RwLockReadGuard<'_, AppSettings> {
        match self.data.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, AppSettings> {
        match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        let settings = store.get();
        assert_eq!(settings, AppSettings::default());
        assert_eq!(settings.listener_config().inactivity_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"scoring": {"wetRate": 1, "dryRate": 1}, "autoSubmit": false}"#).unwrap();

        let settings = SettingsStore::new(path).unwrap().get();
        assert_eq!(settings.scoring, ScoringRates { wet_rate: 1.0, dry_rate: 1.0 });
        assert!(!settings.auto_submit);
        assert_eq!(settings.feed, FeedSettings::default());
    }

    #[test]
    fn test_update_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::new(path.clone()).unwrap();
        store
            .update(|settings| settings.feed.inactivity_timeout_ms = 2_000)
            .unwrap();

        let reopened = SettingsStore::new(path).unwrap();
        assert_eq!(reopened.get().feed.inactivity_timeout_ms, 2_000);
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{not json").unwrap();
        assert_eq!(SettingsStore::new(path).unwrap().get(), AppSettings::default());
    }
}
