//! Per-instrument "latest tick" store. Written by the oracle feed, read by
//! the cadence loop. `std::sync::RwLock` gives cheap concurrent reads from
//! the cadence loop against upserts from the feed callback, matching the
//! source crate's preference for a plain lock over an actor for hot-path
//! shared state.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::interfaces::Tick;

#[derive(Default)]
pub struct PriceBook {
    latest: RwLock<HashMap<String, Tick>>,
}

impl PriceBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, instrument: &str, tick: Tick) {
        let mut guard = self.latest.write().expect("price book lock poisoned");
        guard.insert(instrument.to_string(), tick);
    }

    pub fn latest(&self, instrument: &str) -> Option<Tick> {
        let guard = self.latest.read().expect("price book lock poisoned");
        guard.get(instrument).copied()
    }

    pub fn iter_latest(&self) -> Vec<(String, Tick)> {
        let guard = self.latest.read().expect("price book lock poisoned");
        guard.iter().map(|(k, v)| (k.clone(), *v)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick(price: f64) -> Tick {
        Tick { price, confidence: 1.0, timestamp_ms: 0 }
    }

    #[test]
    fn upsert_then_latest_roundtrips() {
        let book = PriceBook::new();
        book.upsert("BTCUSD", tick(50000.0));
        assert_eq!(book.latest("BTCUSD").unwrap().price, 50000.0);
    }

    #[test]
    fn latest_overwrites_previous() {
        let book = PriceBook::new();
        book.upsert("BTCUSD", tick(50000.0));
        book.upsert("BTCUSD", tick(50100.0));
        assert_eq!(book.latest("BTCUSD").unwrap().price, 50100.0);
    }

    #[test]
    fn missing_instrument_is_none() {
        let book = PriceBook::new();
        assert!(book.latest("ETHUSD").is_none());
    }

    #[test]
    fn iter_latest_covers_all_instruments() {
        let book = PriceBook::new();
        book.upsert("BTCUSD", tick(1.0));
        book.upsert("ETHUSD", tick(2.0));
        let mut symbols: Vec<_> = book.iter_latest().into_iter().map(|(s, _)| s).collect();
        symbols.sort();
        assert_eq!(symbols, vec!["BTCUSD".to_string(), "ETHUSD".to_string()]);
    }
}
