//! Local key-value store: one JSON object on disk, addressed by string keys.
//! Stored under the XDG config dir next to the profiles file.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::{fs, path::PathBuf};
use tracing::warn;

use crate::error::StoreError;
use crate::profiles::config_dir;

pub fn store_path() -> PathBuf {
    config_dir().join("store.json")
}

#[derive(Debug)]
pub struct KvStore {
    path: PathBuf,
    entries: Map<String, Value>,
}

impl KvStore {
    /// Open the default store. A missing or unreadable file starts empty.
    pub fn open_default() -> Self {
        Self::open(store_path())
    }

    pub fn open(path: PathBuf) -> Self {
        let entries = match fs::read_to_string(&path) {
            Ok(s) => match serde_json::from_str::<Map<String, Value>>(&s) {
                Ok(m) => m,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "ignoring corrupt store");
                    Map::new()
                }
            },
            Err(_) => Map::new(),
        };
        Self { path, entries }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let v = self.entries.get(key)?;
        match serde_json::from_value(v.clone()) {
            Ok(t) => Some(t),
            Err(e) => {
                warn!(key, error = %e, "stored value has unexpected shape");
                None
            }
        }
    }

    pub fn get_raw(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), StoreError> {
        self.entries
            .insert(key.to_string(), serde_json::to_value(value)?);
        self.flush()
    }

    pub fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }

    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.entries.clear();
        self.flush()
    }

    fn flush(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(&self.entries)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}
