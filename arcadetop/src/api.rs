//! HTTP client for the device's REST endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::connector::Poller;
use crate::error::FeedError;
use crate::types::{ControlRequest, HighScores, Inbound, StatusResponse, TelemetrySnapshot};

pub const DEFAULT_STATUS_TIMEOUT: Duration = Duration::from_millis(5000);

#[derive(Clone)]
pub struct ApiClient {
    base: Url,
    http: Client,
    status_timeout: Duration,
}

impl ApiClient {
    pub fn new(base: Url) -> Self {
        Self::with_timeout(base, DEFAULT_STATUS_TIMEOUT)
    }

    pub fn with_timeout(base: Url, status_timeout: Duration) -> Self {
        Self {
            base,
            http: Client::new(),
            status_timeout,
        }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> Result<Url, FeedError> {
        self.base
            .join(path)
            .map_err(|e| FeedError::Request(format!("bad url {path}: {e}")))
    }

    async fn get_json(&self, path: &str) -> Result<Value, FeedError> {
        let resp = self.http.get(self.url(path)?).send().await?;
        if !resp.status().is_success() {
            return Err(FeedError::Request(format!("{path} returned {}", resp.status())));
        }
        Ok(resp.json::<Value>().await?)
    }

    /// Whether the device reports its console link as up. Any failure,
    /// including the timeout, reads as disconnected.
    pub async fn status(&self) -> bool {
        let url = match self.url("/api/status") {
            Ok(u) => u,
            Err(e) => {
                warn!(error = %e, "status check failed");
                return false;
            }
        };
        let req = self.http.get(url).timeout(self.status_timeout).send();
        match req.await {
            Ok(resp) if resp.status().is_success() => match resp.json::<StatusResponse>().await {
                Ok(st) => st.arduino_connected,
                Err(e) => {
                    warn!(error = %e, "status body unreadable");
                    false
                }
            },
            Ok(resp) => {
                warn!(status = %resp.status(), "status check rejected");
                false
            }
            Err(e) if e.is_timeout() => {
                let e = FeedError::Timeout(self.status_timeout.as_millis() as u64);
                warn!(error = %e, "status check timed out");
                false
            }
            Err(e) => {
                warn!(error = %e, "status check failed");
                false
            }
        }
    }

    pub async fn game_data(&self) -> Result<TelemetrySnapshot, FeedError> {
        TelemetrySnapshot::from_payload(self.get_json("/api/gamedata").await?)
    }

    pub async fn high_scores(&self) -> Result<HighScores, FeedError> {
        let v = self.get_json("/api/highscores").await?;
        Ok(serde_json::from_value(v)?)
    }

    pub async fn control(&self, action: &str) -> Result<(), FeedError> {
        let resp = self
            .http
            .post(self.url("/api/control")?)
            .json(&ControlRequest { action })
            .send()
            .await?;
        if resp.status().is_success() {
            debug!(action, "control sent");
            Ok(())
        } else {
            Err(FeedError::Request(format!(
                "control {action} returned {}",
                resp.status()
            )))
        }
    }
}

#[async_trait]
impl Poller for ApiClient {
    async fn poll(&self) -> Result<Vec<Inbound>, FeedError> {
        let mut out = vec![Inbound::GameData(self.game_data().await?)];
        // A score failure still delivers the game data.
        match self.high_scores().await {
            Ok(hs) => out.push(Inbound::HighScores(hs)),
            Err(e) => warn!(error = %e, "high score poll failed"),
        }
        Ok(out)
    }
}
