//! Usage analytics: per-game sample counts that survive restarts, plus the
//! summary numbers shown under the charts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::StoreError;
use crate::store::KvStore;
use crate::types::HighScore;

pub const ANALYTICS_KEY: &str = "analytics";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UsageStats {
    /// gameData samples seen while each game was running
    pub samples_by_game: BTreeMap<String, u64>,
    pub sessions: u64,
}

impl UsageStats {
    pub fn load(store: &KvStore) -> Self {
        store.get(ANALYTICS_KEY).unwrap_or_default()
    }

    pub fn save(&self, store: &mut KvStore) -> Result<(), StoreError> {
        store.set(ANALYTICS_KEY, self)
    }

    pub fn record(&mut self, game: &str) {
        *self.samples_by_game.entry(game.to_string()).or_insert(0) += 1;
    }

    /// Share of samples per game, in whole percent, largest first.
    pub fn distribution(&self) -> Vec<(String, u64)> {
        let total: u64 = self.samples_by_game.values().sum();
        if total == 0 {
            return Vec::new();
        }
        let mut out: Vec<(String, u64)> = self
            .samples_by_game
            .iter()
            .map(|(g, n)| (g.clone(), ((*n as f64 / total as f64) * 100.0).round() as u64))
            .collect();
        out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        out
    }
}

pub fn best_score(scores: &[HighScore]) -> u64 {
    scores.iter().map(|s| s.score).max().unwrap_or(0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoreFilter {
    #[default]
    All,
    Ufo,
    Snake,
    Flappy,
    Pong,
}

impl ScoreFilter {
    pub fn next(self) -> Self {
        match self {
            ScoreFilter::All => ScoreFilter::Ufo,
            ScoreFilter::Ufo => ScoreFilter::Snake,
            ScoreFilter::Snake => ScoreFilter::Flappy,
            ScoreFilter::Flappy => ScoreFilter::Pong,
            ScoreFilter::Pong => ScoreFilter::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScoreFilter::All => "all",
            ScoreFilter::Ufo => "ufo",
            ScoreFilter::Snake => "snake",
            ScoreFilter::Flappy => "flappy",
            ScoreFilter::Pong => "pong",
        }
    }

    fn matches(self, game: &str) -> bool {
        self == ScoreFilter::All || game.to_lowercase().contains(self.label())
    }
}

/// Filtered, highest first, at most `limit` entries.
pub fn leaderboard(scores: &[HighScore], filter: ScoreFilter, limit: usize) -> Vec<&HighScore> {
    let mut rows: Vec<&HighScore> = scores.iter().filter(|s| filter.matches(&s.game)).collect();
    rows.sort_by(|a, b| b.score.cmp(&a.score));
    rows.truncate(limit);
    rows
}
