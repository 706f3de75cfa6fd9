//! Deviation-based risk evaluation. Pure function of instrument state and
//! market projection; no history, no I/O. Grounded in the source crate's
//! risk module for its struct-output shape, though the triggers here are
//! plain price-deviation checks rather than velocity/depth/fill-rate
//! circuit breakers.

use crate::quote_math::dev;
use crate::state::{InstrumentState, MarketProjection, OrderStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RiskDecision {
    pub cancel_bid: bool,
    pub cancel_ask: bool,
    /// Surfaced for future policy; the engine does not act on this today.
    pub close_inventory: bool,
}

pub struct RiskEvaluator;

impl RiskEvaluator {
    pub fn assess(state: &InstrumentState, projection: &MarketProjection) -> RiskDecision {
        let cancel_bid = match &state.bid {
            Some(order) if order.status == OrderStatus::New => {
                dev(order.price, projection.mid) > projection.max_dev_abs
            }
            _ => false,
        };

        let cancel_ask = match &state.ask {
            Some(order) if order.status == OrderStatus::New => {
                dev(order.price, projection.mid) > projection.max_dev_abs
            }
            _ => false,
        };

        let long_beyond = state
            .long_inv
            .as_ref()
            .is_some_and(|inv| dev(inv.entry_price, projection.mid) > projection.max_dev_abs);
        let short_beyond = state
            .short_inv
            .as_ref()
            .is_some_and(|inv| dev(inv.entry_price, projection.mid) > projection.max_dev_abs);

        RiskDecision {
            cancel_bid,
            cancel_ask,
            close_inventory: long_beyond || short_beyond,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Direction, Inventory, Order, Side};

    fn projection(mid: f64, max_dev_abs: f64) -> MarketProjection {
        MarketProjection {
            mid,
            bid_proj: mid,
            ask_proj: mid,
            max_dev_abs,
            computed_ms: 0,
        }
    }

    fn order(side: Side, price: f64, status: OrderStatus) -> Order {
        Order {
            id: "X".to_string(),
            instrument: "BTCUSD".to_string(),
            side,
            price,
            quantity: 1.0,
            filled_qty: 0.0,
            status,
            created_ms: 0,
        }
    }

    #[test]
    fn cancels_bid_when_deviation_exceeds_threshold() {
        let mut state = InstrumentState::new();
        state.bid = Some(order(Side::Bid, 49950.0, OrderStatus::New));
        let decision = RiskEvaluator::assess(&state, &projection(53000.0, 2650.0));
        assert!(decision.cancel_bid);
        assert!(!decision.cancel_ask);
    }

    #[test]
    fn equality_at_threshold_does_not_trigger() {
        let mut state = InstrumentState::new();
        state.bid = Some(order(Side::Bid, 100.0, OrderStatus::New));
        // dev == max_dev_abs exactly: boundary is strict >.
        let decision = RiskEvaluator::assess(&state, &projection(110.0, 10.0));
        assert!(!decision.cancel_bid);
    }

    #[test]
    fn non_new_status_is_never_canceled_on_deviation() {
        let mut state = InstrumentState::new();
        state.bid = Some(order(Side::Bid, 0.0, OrderStatus::PartiallyFilled));
        let decision = RiskEvaluator::assess(&state, &projection(1_000_000.0, 1.0));
        assert!(!decision.cancel_bid);
    }

    #[test]
    fn close_inventory_flags_without_acting() {
        let mut state = InstrumentState::new();
        state.long_inv = Some(Inventory {
            instrument: "BTCUSD".to_string(),
            direction: Direction::Long,
            quantity: 1.0,
            entry_price: 45000.0,
            observed_ms: 0,
        });
        let decision = RiskEvaluator::assess(&state, &projection(53000.0, 100.0));
        assert!(decision.close_inventory);
        assert!(!decision.cancel_bid && !decision.cancel_ask);
    }

    #[test]
    fn empty_state_never_cancels() {
        let state = InstrumentState::new();
        let decision = RiskEvaluator::assess(&state, &projection(100.0, 1.0));
        assert_eq!(decision, RiskDecision::default());
    }
}
