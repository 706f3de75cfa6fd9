//! Per-instrument state: the live bid/ask slots, inventory derived from
//! positions, and the in-flight locks that keep placement and cancellation
//! single-flight per instrument.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub const SYNTHETIC_ID_PREFIX: &str = "position-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Bid,
    Ask,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    New,
    PartiallyFilled,
    Filled,
    Canceled,
    Expired,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Canceled | OrderStatus::Expired)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: String,
    pub instrument: String,
    pub side: Side,
    pub price: f64,
    pub quantity: f64,
    pub filled_qty: f64,
    pub status: OrderStatus,
    pub created_ms: i64,
}

impl Order {
    pub fn is_synthetic(&self) -> bool {
        self.id.starts_with(SYNTHETIC_ID_PREFIX)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Long,
    Short,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Inventory {
    pub instrument: String,
    pub direction: Direction,
    pub quantity: f64,
    pub entry_price: f64,
    pub observed_ms: i64,
}

/// Static per-instrument configuration, built once from config + product
/// catalog lookup at startup.
#[derive(Debug, Clone)]
pub struct InstrumentConfig {
    pub instrument: String,
    pub order_size: f64,
    pub spread_bp: i64,
    pub max_deviation_pct: f64,
    pub tick_size: f64,
    pub min_qty: f64,
    pub max_qty: f64,
    pub product_id: String,
}

/// Ephemeral per-cadence projection of where quotes should sit.
#[derive(Debug, Clone, Copy)]
pub struct MarketProjection {
    pub mid: f64,
    pub bid_proj: f64,
    pub ask_proj: f64,
    pub max_dev_abs: f64,
    pub computed_ms: i64,
}

/// Authoritative per-instrument slot holder. Created lazily on first
/// reference and never removed for the life of the process.
#[derive(Debug, Default)]
pub struct InstrumentState {
    pub bid: Option<Order>,
    pub ask: Option<Order>,
    pub long_inv: Option<Inventory>,
    pub short_inv: Option<Inventory>,
    pub placing_lock: bool,
    pub canceling_bid_lock: bool,
    pub canceling_ask_lock: bool,
}

impl InstrumentState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot(&self, side: Side) -> &Option<Order> {
        match side {
            Side::Bid => &self.bid,
            Side::Ask => &self.ask,
        }
    }

    pub fn slot_mut(&mut self, side: Side) -> &mut Option<Order> {
        match side {
            Side::Bid => &mut self.bid,
            Side::Ask => &mut self.ask,
        }
    }

    pub fn canceling_lock(&self, side: Side) -> bool {
        match side {
            Side::Bid => self.canceling_bid_lock,
            Side::Ask => self.canceling_ask_lock,
        }
    }

    pub fn set_canceling_lock(&mut self, side: Side, value: bool) {
        match side {
            Side::Bid => self.canceling_bid_lock = value,
            Side::Ask => self.canceling_ask_lock = value,
        }
    }

    /// Locate the slot holding `order_id` and apply a status transition. A
    /// terminal status clears the slot; anything else just updates the
    /// status field. No-op if the id is not held by either slot.
    pub fn apply_status(&mut self, order_id: &str, new_status: OrderStatus) {
        for side in [Side::Bid, Side::Ask] {
            let occupied = matches!(self.slot(side), Some(o) if o.id == order_id);
            if !occupied {
                continue;
            }
            if new_status.is_terminal() {
                *self.slot_mut(side) = None;
            } else if let Some(order) = self.slot_mut(side) {
                order.status = new_status;
            }
            return;
        }
    }

    /// Install a freshly placed order. Precondition: the slot is empty.
    pub fn install_placed(&mut self, side: Side, order: Order) {
        debug_assert!(self.slot(side).is_none(), "slot already occupied");
        *self.slot_mut(side) = Some(order);
    }

    pub fn clear(&mut self, side: Side) {
        *self.slot_mut(side) = None;
    }

    /// If both sides are present and Filled, clear both — including
    /// synthetic position-derived orders. This is the only "completed
    /// cycle" bookkeeping and intentionally drops synthetic fills, freeing
    /// the inventory side to quote again.
    pub fn paired_fill_cleanup(&mut self) {
        let both_filled = matches!(&self.bid, Some(o) if o.status == OrderStatus::Filled)
            && matches!(&self.ask, Some(o) if o.status == OrderStatus::Filled);
        if both_filled {
            self.bid = None;
            self.ask = None;
        }
    }
}

/// All per-instrument state, keyed by instrument symbol.
#[derive(Debug, Default)]
pub struct StateTable {
    states: HashMap<String, InstrumentState>,
}

impl StateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_insert(&mut self, instrument: &str) -> &mut InstrumentState {
        self.states
            .entry(instrument.to_string())
            .or_insert_with(InstrumentState::new)
    }

    pub fn get(&self, instrument: &str) -> Option<&InstrumentState> {
        self.states.get(instrument)
    }

    pub fn get_mut(&mut self, instrument: &str) -> Option<&mut InstrumentState> {
        self.states.get_mut(instrument)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &InstrumentState)> {
        self.states.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut InstrumentState)> {
        self.states.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(id: &str, side: Side, status: OrderStatus) -> Order {
        Order {
            id: id.to_string(),
            instrument: "BTCUSD".to_string(),
            side,
            price: 100.0,
            quantity: 1.0,
            filled_qty: 0.0,
            status,
            created_ms: 0,
        }
    }

    #[test]
    fn apply_status_terminal_clears_slot() {
        let mut state = InstrumentState::new();
        state.install_placed(Side::Bid, order("B1", Side::Bid, OrderStatus::New));
        state.apply_status("B1", OrderStatus::Canceled);
        assert!(state.bid.is_none());
    }

    #[test]
    fn apply_status_non_terminal_updates_field() {
        let mut state = InstrumentState::new();
        state.install_placed(Side::Bid, order("B1", Side::Bid, OrderStatus::New));
        state.apply_status("B1", OrderStatus::PartiallyFilled);
        assert_eq!(state.bid.as_ref().unwrap().status, OrderStatus::PartiallyFilled);
    }

    #[test]
    fn apply_status_unknown_id_is_noop() {
        let mut state = InstrumentState::new();
        state.install_placed(Side::Bid, order("B1", Side::Bid, OrderStatus::New));
        state.apply_status("unknown", OrderStatus::Canceled);
        assert!(state.bid.is_some());
    }

    #[test]
    fn paired_fill_cleanup_requires_both_filled() {
        let mut state = InstrumentState::new();
        state.install_placed(Side::Bid, order("B1", Side::Bid, OrderStatus::Filled));
        state.install_placed(Side::Ask, order("A1", Side::Ask, OrderStatus::New));
        state.paired_fill_cleanup();
        assert!(state.bid.is_some());
        assert!(state.ask.is_some());

        state.ask.as_mut().unwrap().status = OrderStatus::Filled;
        state.paired_fill_cleanup();
        assert!(state.bid.is_none());
        assert!(state.ask.is_none());
    }

    #[test]
    fn paired_fill_cleanup_drops_synthetic_orders() {
        let mut state = InstrumentState::new();
        let synthetic = order("position-bid-BTCUSD_PERP", Side::Bid, OrderStatus::Filled);
        state.install_placed(Side::Bid, synthetic);
        state.install_placed(Side::Ask, order("A1", Side::Ask, OrderStatus::Filled));
        state.paired_fill_cleanup();
        assert!(state.bid.is_none());
        assert!(state.ask.is_none());
    }

    #[test]
    fn state_table_creates_lazily_and_persists() {
        let mut table = StateTable::new();
        table.get_or_insert("BTCUSD").placing_lock = true;
        assert!(table.get("BTCUSD").unwrap().placing_lock);
    }
}
