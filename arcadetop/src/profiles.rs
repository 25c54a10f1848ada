//! Device profiles: load/save simple JSON mapping of profile name -> { url, ws }
//! Stored under XDG config dir: $XDG_CONFIG_HOME/arcadetop/profiles.json (fallback ~/.config/arcadetop/profiles.json)

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, path::PathBuf};
use url::Url;

use crate::error::StoreError;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ProfileEntry {
    /// Device base URL, e.g. http://192.168.4.1
    pub url: String,
    /// Live feed override when the socket is not at {url}/ws
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ws: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProfilesFile {
    #[serde(default)]
    pub profiles: BTreeMap<String, ProfileEntry>,
    #[serde(default)]
    pub version: u32,
}

pub fn config_dir() -> PathBuf {
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
        PathBuf::from(xdg).join("arcadetop")
    } else {
        dirs_next::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("arcadetop")
    }
}

pub fn profiles_path() -> PathBuf {
    config_dir().join("profiles.json")
}

pub fn load_profiles() -> ProfilesFile {
    let path = profiles_path();
    match fs::read_to_string(&path) {
        Ok(s) => serde_json::from_str(&s).unwrap_or_default(),
        Err(_) => ProfilesFile::default(),
    }
}

pub fn save_profiles(p: &ProfilesFile) -> Result<(), StoreError> {
    let path = profiles_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_vec_pretty(p)?;
    fs::write(path, data)?;
    Ok(())
}

#[derive(Debug, PartialEq)]
pub enum ResolveProfile {
    /// Use the provided runtime inputs (not persisted). (url, ws)
    Direct(String, Option<String>),
    /// Loaded from existing profile entry (url, ws)
    Loaded(String, Option<String>),
    /// Should prompt user to select among profile names
    PromptSelect(Vec<String>),
    /// Should prompt user to create a new profile (name)
    PromptCreate(String),
    /// No profile could be resolved (e.g., missing arguments)
    None,
}

pub struct ProfileRequest {
    pub profile_name: Option<String>,
    pub url: Option<String>,
    pub ws: Option<String>,
}

impl ProfileRequest {
    pub fn resolve(self, pf: &ProfilesFile) -> ResolveProfile {
        match (self.url, self.profile_name) {
            // Explicit URL wins (maybe later saved by caller)
            (Some(u), _) => ResolveProfile::Direct(u, self.ws),
            // Only profile name given -> try load
            (None, Some(name)) => match pf.profiles.get(&name) {
                Some(entry) => ResolveProfile::Loaded(entry.url.clone(), entry.ws.clone()),
                None => ResolveProfile::PromptCreate(name),
            },
            // Nothing provided -> maybe prompt select if profiles exist
            (None, None) => {
                if pf.profiles.is_empty() {
                    ResolveProfile::None
                } else {
                    ResolveProfile::PromptSelect(pf.profiles.keys().cloned().collect())
                }
            }
        }
    }
}

/// Where to reach a device: the REST base and the live feed socket.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoints {
    pub api: Url,
    pub feed: Url,
}

impl Endpoints {
    /// `http://host[:port]` gives `ws://host[:port]/ws`; `https` gives `wss`.
    /// A bare `host[:port]` is treated as `http`.
    pub fn resolve(url: &str, ws: Option<&str>) -> Result<Self, String> {
        let with_scheme = if url.contains("://") {
            url.to_string()
        } else {
            format!("http://{url}")
        };
        let api = Url::parse(&with_scheme).map_err(|e| format!("invalid device url '{url}': {e}"))?;
        let ws_scheme = match api.scheme() {
            "http" => "ws",
            "https" => "wss",
            other => return Err(format!("unsupported scheme '{other}' in '{url}'")),
        };
        let feed = match ws {
            Some(w) => Url::parse(w).map_err(|e| format!("invalid ws url '{w}': {e}"))?,
            None => {
                let mut f = api.clone();
                f.set_scheme(ws_scheme)
                    .map_err(|_| format!("cannot derive ws url from '{url}'"))?;
                f.set_path("/ws");
                f.set_query(None);
                f
            }
        };
        if !matches!(feed.scheme(), "ws" | "wss") {
            return Err(format!("live feed url must be ws:// or wss://, got '{feed}'"));
        }
        Ok(Self { api, feed })
    }
}
