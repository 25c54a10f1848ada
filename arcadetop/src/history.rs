//! Bounded telemetry history feeding the charts.

use std::collections::{vec_deque, VecDeque};

use crate::types::TelemetrySnapshot;

pub const DEFAULT_CAPACITY: usize = 100;

pub fn push_capped<T>(dq: &mut VecDeque<T>, v: T, cap: usize) {
    dq.push_back(v);
    while dq.len() > cap {
        dq.pop_front();
    }
}

/// Most recent snapshots, oldest first. Overflow evicts from the front.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    entries: VecDeque<TelemetrySnapshot>,
    cap: usize,
}

impl HistoryBuffer {
    pub fn new(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            entries: VecDeque::with_capacity(cap),
            cap,
        }
    }

    pub fn append(&mut self, snapshot: TelemetrySnapshot) {
        push_capped(&mut self.entries, snapshot, self.cap);
    }

    /// The newest `n` entries (or fewer), oldest first.
    pub fn recent(&self, n: usize) -> vec_deque::Iter<'_, TelemetrySnapshot> {
        let start = self.entries.len().saturating_sub(n);
        self.entries.range(start..)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn latest(&self) -> Option<&TelemetrySnapshot> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// Largest value of any of `keys` across `recent(n)`; absent fields count as 0.
    pub fn max_field(&self, n: usize, keys: &[&str]) -> f64 {
        self.recent(n)
            .flat_map(|s| keys.iter().map(move |k| s.number_or_zero(k)))
            .fold(0.0_f64, f64::max)
    }

    /// One field across `recent(n)` as sparkline points (absent and negative as 0).
    pub fn series(&self, n: usize, key: &str) -> Vec<u64> {
        self.recent(n)
            .map(|s| s.number_or_zero(key).max(0.0).round() as u64)
            .collect()
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
