//! Types that mirror the device's JSON schema, in both directions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::FeedError;

/// One time-stamped telemetry reading. Keys are whatever the producer sent.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySnapshot {
    captured_at: DateTime<Utc>,
    fields: Map<String, Value>,
}

impl TelemetrySnapshot {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self::at(Utc::now(), fields)
    }

    pub fn at(captured_at: DateTime<Utc>, fields: Map<String, Value>) -> Self {
        Self {
            captured_at,
            fields,
        }
    }

    /// Build from a payload; anything but a JSON object (or null) is malformed.
    pub fn from_payload(payload: Value) -> Result<Self, FeedError> {
        match payload {
            Value::Object(fields) => Ok(Self::new(fields)),
            Value::Null => Ok(Self::new(Map::new())),
            other => Err(FeedError::Malformed(format!(
                "expected an object payload, got {other}"
            ))),
        }
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.fields.get(key).and_then(Value::as_f64)
    }

    pub fn number_or_zero(&self, key: &str) -> f64 {
        self.number(key).unwrap_or(0.0)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        self.fields.get(key).and_then(Value::as_bool)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighScore {
    pub player: String,
    pub game: String,
    pub score: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HighScores {
    pub scores: Vec<HighScore>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SystemStatus {
    pub wifi_signal: Option<i64>,
    pub uptime: Option<u64>,
    pub free_memory: Option<u64>,
    pub arduino_connected: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameState {
    pub current_game: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatusResponse {
    pub arduino_connected: bool,
}

/// Inbound frame, classified by its `type` tag.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    GameData(TelemetrySnapshot),
    HighScores(HighScores),
    SystemStatus(SystemStatus),
    GameState(GameState),
    /// A tag this client does not know yet.
    Unknown(String),
}

impl Inbound {
    /// Parse a `{ "type": ..., "payload": ... }` text frame.
    pub fn parse(raw: &str) -> Result<Self, FeedError> {
        let value: Value = serde_json::from_str(raw)?;
        let Value::Object(mut frame) = value else {
            return Err(FeedError::Malformed("frame is not a JSON object".into()));
        };
        let kind = match frame.get("type").and_then(Value::as_str) {
            Some(k) => k.to_string(),
            None => return Err(FeedError::Malformed("frame has no type tag".into())),
        };
        let payload = frame.remove("payload").unwrap_or(Value::Null);
        Self::classify(&kind, payload)
    }

    pub fn classify(kind: &str, payload: Value) -> Result<Self, FeedError> {
        // Absent payloads read as empty objects so every field falls back.
        let payload = match payload {
            Value::Null => Value::Object(Map::new()),
            p => p,
        };
        Ok(match kind {
            "gameData" => Inbound::GameData(TelemetrySnapshot::from_payload(payload)?),
            "highScores" => Inbound::HighScores(serde_json::from_value(payload)?),
            "systemStatus" => Inbound::SystemStatus(serde_json::from_value(payload)?),
            "gameState" => Inbound::GameState(serde_json::from_value(payload)?),
            other => Inbound::Unknown(other.to_string()),
        })
    }

    pub fn kind(&self) -> &str {
        match self {
            Inbound::GameData(_) => "gameData",
            Inbound::HighScores(_) => "highScores",
            Inbound::SystemStatus(_) => "systemStatus",
            Inbound::GameState(_) => "gameState",
            Inbound::Unknown(k) => k,
        }
    }
}

/// Display model of the latest `gameData`, with the device's defaults filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct GameData {
    pub ufo_score: i64,
    pub ufo_level: i64,
    pub ufo_lives: i64,
    pub ufo_kills: i64,
    pub snake_score: i64,
    pub snake_length: i64,
    pub snake_speed: i64,
    pub snake_food: i64,
    pub flappy_score: i64,
    pub flappy_high: i64,
    pub pong_score: i64,
    pub pong_high: i64,
    pub current_game: String,
    pub wifi_signal: i64,
    pub uptime_ms: u64,
    pub free_memory: u64,
    pub arduino_connected: bool,
}

impl Default for GameData {
    fn default() -> Self {
        Self {
            ufo_score: 0,
            ufo_level: 1,
            ufo_lives: 5,
            ufo_kills: 0,
            snake_score: 0,
            snake_length: 2,
            snake_speed: 1,
            snake_food: 0,
            flappy_score: 0,
            flappy_high: 0,
            pong_score: 0,
            pong_high: 0,
            current_game: "menu".into(),
            wifi_signal: 0,
            uptime_ms: 0,
            free_memory: 0,
            arduino_connected: false,
        }
    }
}

// Zero and absent both fall back, as the firmware reports 0 before a game starts.
fn or_default(v: Option<f64>, default: i64) -> i64 {
    match v {
        Some(x) if x != 0.0 && x.is_finite() => x as i64,
        _ => default,
    }
}

impl GameData {
    pub fn from_snapshot(s: &TelemetrySnapshot) -> Self {
        let d = GameData::default();
        Self {
            ufo_score: or_default(s.number("ufoScore"), d.ufo_score),
            ufo_level: or_default(s.number("ufoLevel"), d.ufo_level),
            ufo_lives: or_default(s.number("ufoLives"), d.ufo_lives),
            ufo_kills: or_default(s.number("ufoKills"), d.ufo_kills),
            snake_score: or_default(s.number("snakeScore"), d.snake_score),
            snake_length: or_default(s.number("snakeLength"), d.snake_length),
            snake_speed: or_default(s.number("snakeSpeed"), d.snake_speed),
            snake_food: or_default(s.number("snakeFood"), d.snake_food),
            flappy_score: or_default(s.number("flappyScore"), d.flappy_score),
            flappy_high: or_default(s.number("flappyHigh"), d.flappy_high),
            pong_score: or_default(s.number("pongScore"), d.pong_score),
            pong_high: or_default(s.number("pongHigh"), d.pong_high),
            current_game: s
                .text("currentGame")
                .filter(|g| !g.is_empty())
                .unwrap_or("menu")
                .to_string(),
            wifi_signal: or_default(s.number("wifiSignal"), 0),
            uptime_ms: or_default(s.number("uptime"), 0).max(0) as u64,
            free_memory: or_default(s.number("freeMemory"), 0).max(0) as u64,
            arduino_connected: s.flag("arduinoConnected").unwrap_or(false),
        }
    }

    /// Merge the fields a `systemStatus` frame actually carried.
    pub fn apply_status(&mut self, st: &SystemStatus) {
        if let Some(v) = st.wifi_signal {
            self.wifi_signal = v;
        }
        if let Some(v) = st.uptime {
            self.uptime_ms = v;
        }
        if let Some(v) = st.free_memory {
            self.free_memory = v;
        }
        if let Some(v) = st.arduino_connected {
            self.arduino_connected = v;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LedMode {
    #[default]
    Solid,
    Blink,
    Fade,
    Rainbow,
    Game,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedCommand {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub brightness: u8,
    pub mode: LedMode,
    pub is_on: bool,
    pub game_sync: bool,
}

/// Outbound text frames. Serialized with the tag inline:
/// `{"type":"LED_CONTROL","r":255,...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Outbound {
    #[serde(rename = "LED_CONTROL")]
    LedControl(LedCommand),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlRequest<'a> {
    pub action: &'a str,
}
