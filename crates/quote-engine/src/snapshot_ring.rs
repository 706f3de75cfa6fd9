//! Bounded per-instrument ring of recent ticks. Pure observability: never on
//! the trading hot path. `VecDeque` trim-on-push mirrors the age-trimmed
//! history buffers elsewhere in the source crate (price/fill history in the
//! risk module), except this ring trims by count, not age.

use std::collections::{HashMap, VecDeque};

use crate::interfaces::Tick;

pub const MAX_LEN: usize = 100;

#[derive(Default)]
struct Ring {
    ticks: VecDeque<Tick>,
}

impl Ring {
    fn push(&mut self, tick: Tick) {
        if self.ticks.len() >= MAX_LEN {
            self.ticks.pop_front();
        }
        self.ticks.push_back(tick);
    }

    fn tail(&self, n: usize) -> Vec<Tick> {
        let skip = self.ticks.len().saturating_sub(n);
        self.ticks.iter().skip(skip).copied().collect()
    }

    fn latest(&self) -> Option<Tick> {
        self.ticks.back().copied()
    }
}

#[derive(Default)]
pub struct SnapshotRing {
    rings: HashMap<String, Ring>,
}

impl SnapshotRing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, instrument: &str, tick: Tick) {
        self.rings.entry(instrument.to_string()).or_default().push(tick);
    }

    pub fn tail(&self, instrument: &str, n: usize) -> Vec<Tick> {
        self.rings.get(instrument).map(|r| r.tail(n)).unwrap_or_default()
    }

    pub fn latest(&self, instrument: &str) -> Option<Tick> {
        self.rings.get(instrument).and_then(|r| r.latest())
    }

    pub fn len(&self, instrument: &str) -> usize {
        self.rings.get(instrument).map(|r| r.ticks.len()).unwrap_or(0)
    }
}
