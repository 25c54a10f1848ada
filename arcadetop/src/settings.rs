//! Dashboard settings persisted in the key-value store.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::api::DEFAULT_STATUS_TIMEOUT;
use crate::connector::ConnectorConfig;
use crate::error::StoreError;
use crate::history::DEFAULT_CAPACITY;
use crate::store::KvStore;

pub const SETTINGS_KEY: &str = "gameDashboardSettings";

// Bounds of the refresh-rate control.
pub const MIN_REFRESH_MS: u64 = 500;
pub const MAX_REFRESH_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub refresh_rate: u64,
    pub auto_refresh: bool,
    pub dark_mode: bool,
    pub reconnect_delay_ms: u64,
    pub max_reconnect_attempts: u32,
    pub status_timeout_ms: u64,
    pub history_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            refresh_rate: 2000,
            auto_refresh: true,
            dark_mode: false,
            reconnect_delay_ms: 3000,
            max_reconnect_attempts: 5,
            status_timeout_ms: DEFAULT_STATUS_TIMEOUT.as_millis() as u64,
            history_capacity: DEFAULT_CAPACITY,
        }
    }
}

impl Settings {
    pub fn load(store: &KvStore) -> Self {
        let mut s: Settings = store.get(SETTINGS_KEY).unwrap_or_default();
        if s.refresh_rate == 0 {
            s.refresh_rate = Settings::default().refresh_rate;
        }
        s.refresh_rate = s.refresh_rate.clamp(MIN_REFRESH_MS, MAX_REFRESH_MS);
        s
    }

    pub fn save(&self, store: &mut KvStore) -> Result<(), StoreError> {
        store.set(SETTINGS_KEY, self)
    }

    pub fn reset(store: &mut KvStore) -> Result<Self, StoreError> {
        store.remove(SETTINGS_KEY)?;
        Ok(Self::default())
    }

    pub fn connector_config(&self) -> ConnectorConfig {
        ConnectorConfig {
            reconnect_delay: Duration::from_millis(self.reconnect_delay_ms),
            max_reconnect_attempts: self.max_reconnect_attempts.max(1),
            poll_interval: Duration::from_millis(self.refresh_rate),
            poll_enabled: self.auto_refresh,
        }
    }

    pub fn status_timeout(&self) -> Duration {
        Duration::from_millis(self.status_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn partial_settings_fill_defaults() {
        let td = tempfile::tempdir().unwrap();
        let mut kv = KvStore::open(td.path().join("store.json"));
        kv.set(SETTINGS_KEY, &json!({"refreshRate": 4000, "darkMode": true}))
            .unwrap();
        let s = Settings::load(&kv);
        assert_eq!(s.refresh_rate, 4000);
        assert!(s.dark_mode);
        assert!(s.auto_refresh);
        assert_eq!(s.max_reconnect_attempts, 5);
        assert_eq!(s.history_capacity, 100);
    }

    #[test]
    fn refresh_rate_is_clamped() {
        let td = tempfile::tempdir().unwrap();
        let mut kv = KvStore::open(td.path().join("store.json"));
        kv.set(SETTINGS_KEY, &json!({"refreshRate": 5})).unwrap();
        assert_eq!(Settings::load(&kv).refresh_rate, MIN_REFRESH_MS);
        kv.set(SETTINGS_KEY, &json!({"refreshRate": 0})).unwrap();
        assert_eq!(Settings::load(&kv).refresh_rate, 2000);
    }

    #[test]
    fn save_then_reset() {
        let td = tempfile::tempdir().unwrap();
        let mut kv = KvStore::open(td.path().join("store.json"));
        let s = Settings {
            auto_refresh: false,
            ..Settings::default()
        };
        s.save(&mut kv).unwrap();
        assert_eq!(Settings::load(&kv), s);
        assert_eq!(Settings::reset(&mut kv).unwrap(), Settings::default());
        assert_eq!(Settings::load(&kv), Settings::default());
    }

    #[test]
    fn connector_config_follows_settings() {
        let cfg = Settings::default().connector_config();
        assert_eq!(cfg.reconnect_delay, Duration::from_millis(3000));
        assert_eq!(cfg.max_reconnect_attempts, 5);
        assert_eq!(cfg.poll_interval, Duration::from_millis(2000));
        assert!(cfg.poll_enabled);
    }
}
