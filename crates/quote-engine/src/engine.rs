//! The orchestrator: periodic cadence, per-instrument single-flight,
//! cancel-on-deviation, place-when-missing, event-driven reconciliation,
//! cancel-all on shutdown. Grounded in the source crate's `strategy.rs`
//! (the `tokio::select!` cadence loop, the trait-based executor for
//! testability) and `task.rs` (bounded-deadline shutdown sequencing),
//! collapsed from a multi-tier quote ladder down to the single
//! bid/ask-per-instrument model this system requires.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::interfaces::{
    CancelOrdersRequest, EventStream, ExchangeAdapter, OracleFeed, OrderStatusEvent,
    PlaceOrderRequest,
};
use crate::price_book::PriceBook;
use crate::quote_math::{ask_target, bid_target, dev, max_dev_abs, risk_ask_projection, risk_bid_projection, round_to_tick};
use crate::risk::RiskEvaluator;
use crate::snapshot_ring::SnapshotRing;
use crate::state::{Direction, Inventory, InstrumentConfig, MarketProjection, Order, OrderStatus, Side, StateTable, SYNTHETIC_ID_PREFIX};

/// GTD expiration window for placed orders.
const ORDER_TTL_SEC: i64 = 5 * 60;
/// Bound on how long shutdown waits for the bulk cancel before giving up.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

pub struct QuotingEngine {
    instruments: Vec<InstrumentConfig>,
    subaccount_id: String,
    refresh_cycle_ms: u64,
    adapter: Arc<dyn ExchangeAdapter>,
    feed: Arc<dyn OracleFeed>,
    events: Arc<dyn EventStream>,
    price_book: Arc<PriceBook>,
    snapshots: Mutex<SnapshotRing>,
    states: Mutex<StateTable>,
    /// Cancel-in-flight keys: (instrument, side, order_id).
    canceling_keys: Mutex<HashSet<(String, Side, String)>>,
    shutdown: CancellationToken,
}

impl QuotingEngine {
    pub fn new(
        config: &Config,
        instruments: Vec<InstrumentConfig>,
        adapter: Arc<dyn ExchangeAdapter>,
        feed: Arc<dyn OracleFeed>,
        events: Arc<dyn EventStream>,
    ) -> Self {
        Self {
            instruments,
            subaccount_id: config.ethereal_subaccount_id.clone(),
            refresh_cycle_ms: config.quote_refresh_cycle_ms,
            adapter,
            feed,
            events,
            price_book: Arc::new(PriceBook::new()),
            snapshots: Mutex::new(SnapshotRing::new()),
            states: Mutex::new(StateTable::new()),
            canceling_keys: Mutex::new(HashSet::new()),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn shutdown_handle(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    fn config_for(&self, instrument: &str) -> Option<&InstrumentConfig> {
        self.instruments.iter().find(|c| c.instrument == instrument)
    }

    /// Boot sequence: position warmup, subscribe to events and ticks, start
    /// the cadence timer, run until shutdown is signaled.
    pub async fn run(self: Arc<Self>) -> anyhow::Result<()> {
        self.position_warmup().await;
        self.subscribe_events().await?;
        self.subscribe_ticks().await?;

        let mut interval = tokio::time::interval(Duration::from_millis(self.refresh_cycle_ms));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("quoting engine shutdown signaled");
                    break;
                }
                _ = interval.tick() => {
                    self.cadence_tick().await;
                }
            }
        }

        self.shutdown_sequence().await;
        Ok(())
    }

    async fn position_warmup(&self) {
        let product_ids: Vec<String> = self.instruments.iter().map(|c| c.product_id.clone()).collect();
        let positions = match self.adapter.positions(&self.subaccount_id, &product_ids).await {
            Ok(positions) => positions,
            Err(err) => {
                error!(error = %err, "position warmup failed");
                return;
            }
        };

        let mut states = self.states.lock().await;
        for position in positions {
            let Some(config) = self
                .instruments
                .iter()
                .find(|c| c.product_id == position.product_id)
            else {
                continue;
            };
            let instrument = config.instrument.clone();
            let state = states.get_or_insert(&instrument);
            let observed_ms = now_ms();

            if position.quantity > 0.0 {
                state.long_inv = Some(Inventory {
                    instrument: instrument.clone(),
                    direction: Direction::Long,
                    quantity: position.quantity,
                    entry_price: position.entry_price,
                    observed_ms,
                });
                state.bid = Some(Order {
                    id: format!("{SYNTHETIC_ID_PREFIX}bid-{}", position.product_id),
                    instrument,
                    side: Side::Bid,
                    price: position.entry_price,
                    quantity: position.quantity,
                    filled_qty: position.quantity,
                    status: OrderStatus::Filled,
                    created_ms: observed_ms,
                });
            } else if position.quantity < 0.0 {
                state.short_inv = Some(Inventory {
                    instrument: instrument.clone(),
                    direction: Direction::Short,
                    quantity: -position.quantity,
                    entry_price: position.entry_price,
                    observed_ms,
                });
                state.ask = Some(Order {
                    id: format!("{SYNTHETIC_ID_PREFIX}ask-{}", position.product_id),
                    instrument,
                    side: Side::Ask,
                    price: position.entry_price,
                    quantity: -position.quantity,
                    filled_qty: -position.quantity,
                    status: OrderStatus::Filled,
                    created_ms: observed_ms,
                });
            }
        }
    }

    async fn subscribe_events(self: &Arc<Self>) -> anyhow::Result<()> {
        self.events.connect().await?;
        let engine = Arc::clone(self);
        self.events
            .subscribe_order_updates(
                &self.subaccount_id,
                Box::new(move |event: OrderStatusEvent| {
                    let engine = Arc::clone(&engine);
                    tokio::spawn(async move {
                        engine.reconcile(event).await;
                    });
                }),
            )
            .await?;
        // Fills are informational; subscribed for parity with the source
        // contract but never acted upon.
        self.events
            .subscribe_order_fills(&self.subaccount_id, Box::new(|_value| {}))
            .await?;
        Ok(())
    }

    async fn subscribe_ticks(self: &Arc<Self>) -> anyhow::Result<()> {
        self.feed.connect().await?;
        let price_book = Arc::clone(&self.price_book);
        let instruments: Vec<String> = self.instruments.iter().map(|c| c.instrument.clone()).collect();
        self.feed
            .subscribe(
                instruments,
                Box::new(move |instrument, tick| {
                    price_book.upsert(&instrument, tick);
                }),
            )
            .await?;
        Ok(())
    }

    async fn cadence_tick(&self) {
        let mut placed = 0u32;
        let mut canceled = 0u32;

        for (instrument, tick) in self.price_book.iter_latest() {
            let Some(config) = self.config_for(&instrument) else {
                debug!(instrument, "tick received for unconfigured instrument");
                continue;
            };

            {
                let mut snapshots = self.snapshots.lock().await;
                snapshots.push(&instrument, tick);
            }

            let projection = MarketProjection {
                mid: tick.price,
                bid_proj: risk_bid_projection(tick.price, config.spread_bp as f64),
                ask_proj: risk_ask_projection(tick.price, config.spread_bp as f64),
                max_dev_abs: max_dev_abs(tick.price, config.max_deviation_pct),
                computed_ms: now_ms(),
            };

            let decision = {
                let mut states = self.states.lock().await;
                let state = states.get_or_insert(&instrument);
                RiskEvaluator::assess(state, &projection)
            };

            if decision.close_inventory {
                debug!(instrument, "inventory beyond deviation threshold (no action taken)");
            }

            if decision.cancel_bid {
                if self.cancel_side(&instrument, Side::Bid).await {
                    canceled += 1;
                }
            }
            if decision.cancel_ask {
                if self.cancel_side(&instrument, Side::Ask).await {
                    canceled += 1;
                }
            }

            placed += self.place_missing(config, tick.price).await;

            {
                let mut states = self.states.lock().await;
                if let Some(state) = states.get_mut(&instrument) {
                    state.paired_fill_cleanup();
                }
            }
        }

        info!(placed, canceled, "cadence tick complete");
    }

    /// Placement pass for one instrument: whole-instrument lock, fill
    /// whichever of bid/ask is empty.
    async fn place_missing(&self, config: &InstrumentConfig, mid: f64) -> u32 {
        {
            let mut states = self.states.lock().await;
            let state = states.get_or_insert(&config.instrument);
            if state.placing_lock {
                debug!(instrument = %config.instrument, "placement already in flight, skipping");
                return 0;
            }
            state.placing_lock = true;
        }

        let mut placed = 0u32;
        for side in [Side::Bid, Side::Ask] {
            let empty = {
                let states = self.states.lock().await;
                states
                    .get(&config.instrument)
                    .map(|s| s.slot(side).is_none())
                    .unwrap_or(true)
            };
            if !empty {
                continue;
            }

            let price = match side {
                Side::Bid => round_to_tick(bid_target(mid, config.spread_bp as f64), config.tick_size),
                Side::Ask => round_to_tick(ask_target(mid, config.spread_bp as f64), config.tick_size),
            };

            let request = PlaceOrderRequest {
                instrument: config.instrument.clone(),
                side,
                price,
                quantity: config.order_size,
                expires_at_sec: now_ms() / 1000 + ORDER_TTL_SEC,
            };

            match self.adapter.place(request).await {
                Ok(response) => {
                    if let Some(order_id) = response.order_id {
                        let order = Order {
                            id: order_id,
                            instrument: config.instrument.clone(),
                            side,
                            price,
                            quantity: config.order_size,
                            filled_qty: 0.0,
                            status: OrderStatus::New,
                            created_ms: now_ms(),
                        };
                        let mut states = self.states.lock().await;
                        let state = states.get_or_insert(&config.instrument);
                        if state.slot(side).is_none() {
                            state.install_placed(side, order);
                            placed += 1;
                        }
                    } else {
                        warn!(instrument = %config.instrument, ?side, "place response had no order id");
                    }
                }
                Err(err) => {
                    warn!(instrument = %config.instrument, ?side, error = %err, "placement failed");
                }
            }
        }

        let mut states = self.states.lock().await;
        if let Some(state) = states.get_mut(&config.instrument) {
            state.placing_lock = false;
        }
        placed
    }

    async fn cancel_side(&self, instrument: &str, side: Side) -> bool {
        let order_id = {
            let states = self.states.lock().await;
            match states.get(instrument).and_then(|s| s.slot(side).clone()) {
                Some(order) => order.id,
                None => return false,
            }
        };

        {
            let mut states = self.states.lock().await;
            let state = states.get_or_insert(instrument);
            if state.canceling_lock(side) {
                debug!(instrument, ?side, "cancel already in flight, skipping");
                return false;
            }
            state.set_canceling_lock(side, true);
        }

        let key = (instrument.to_string(), side, order_id.clone());
        {
            let mut keys = self.canceling_keys.lock().await;
            if keys.contains(&key) {
                let mut states = self.states.lock().await;
                if let Some(state) = states.get_mut(instrument) {
                    state.set_canceling_lock(side, false);
                }
                return false;
            }
            keys.insert(key.clone());
        }

        let result = self
            .adapter
            .cancel(CancelOrdersRequest {
                order_ids: vec![order_id],
                subaccount: self.subaccount_id.clone(),
            })
            .await;

        let canceled = match result {
            Ok(()) => {
                let mut states = self.states.lock().await;
                if let Some(state) = states.get_mut(instrument) {
                    state.clear(side);
                }
                true
            }
            Err(err) => {
                warn!(instrument, ?side, error = %err, "cancel on deviation failed");
                false
            }
        };

        {
            let mut keys = self.canceling_keys.lock().await;
            keys.remove(&key);
        }
        {
            let mut states = self.states.lock().await;
            if let Some(state) = states.get_mut(instrument) {
                state.set_canceling_lock(side, false);
            }
        }

        canceled
    }

    /// Event-driven reconciliation: scan instruments for the matching order
    /// id and apply the status. Only the first match acts, since ids are
    /// globally unique.
    async fn reconcile(&self, event: OrderStatusEvent) {
        let mut states = self.states.lock().await;
        for (instrument, state) in states.iter_mut() {
            let holds_id = matches!(&state.bid, Some(o) if o.id == event.order_id)
                || matches!(&state.ask, Some(o) if o.id == event.order_id);
            if holds_id {
                state.apply_status(&event.order_id, event.status);
                debug!(instrument, order_id = %event.order_id, ?event.status, "reconciled order status");
                return;
            }
        }
        debug!(order_id = %event.order_id, "reconciliation miss: unknown order id");
    }

    async fn shutdown_sequence(&self) {
        let live_ids: Vec<String> = {
            let mut states = self.states.lock().await;
            let mut ids = Vec::new();
            for (_, state) in states.iter_mut() {
                state.placing_lock = false;
                state.canceling_bid_lock = false;
                state.canceling_ask_lock = false;
                for order in [&state.bid, &state.ask].into_iter().flatten() {
                    if !order.is_synthetic()
                        && matches!(order.status, OrderStatus::New)
                    {
                        ids.push(order.id.clone());
                    }
                }
            }
            ids
        };

        if self.subaccount_id.is_empty() {
            error!("subaccount not configured; skipping shutdown bulk cancel");
        } else if !live_ids.is_empty() {
            let cancel = self.adapter.cancel(CancelOrdersRequest {
                order_ids: live_ids,
                subaccount: self.subaccount_id.clone(),
            });
            match tokio::time::timeout(SHUTDOWN_TIMEOUT, cancel).await {
                Ok(Ok(())) => info!("shutdown bulk cancel succeeded"),
                Ok(Err(err)) => error!(error = %err, "shutdown bulk cancel failed"),
                Err(_) => error!("shutdown bulk cancel timed out"),
            }
        }

        {
            let mut states = self.states.lock().await;
            for (_, state) in states.iter_mut() {
                state.bid = None;
                state.ask = None;
            }
        }

        if let Err(err) = self.feed.disconnect().await {
            error!(error = %err, "oracle feed disconnect failed");
        }
        if let Err(err) = self.events.disconnect().await {
            error!(error = %err, "event stream disconnect failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::interfaces::{PlaceOrderResponse, Tick};

    #[derive(Default)]
    struct MockAdapter {
        placed: Mutex<Vec<PlaceOrderRequest>>,
        canceled: Mutex<Vec<CancelOrdersRequest>>,
        positions: Mutex<Vec<crate::interfaces::ExchangePosition>>,
        next_order_id: AtomicU32,
    }

    impl ExchangeAdapter for MockAdapter {
        fn place(&self, req: PlaceOrderRequest) -> BoxFuture<'_, anyhow::Result<PlaceOrderResponse>> {
            Box::pin(async move {
                let id = self.next_order_id.fetch_add(1, Ordering::SeqCst);
                let order_id = format!("{}{}", if req.side == Side::Bid { "B" } else { "A" }, id);
                self.placed.lock().await.push(req);
                Ok(PlaceOrderResponse { order_id: Some(order_id) })
            })
        }

        fn cancel(&self, req: CancelOrdersRequest) -> BoxFuture<'_, anyhow::Result<()>> {
            Box::pin(async move {
                self.canceled.lock().await.push(req);
                Ok(())
            })
        }

        fn positions(
            &self,
            _subaccount_id: &str,
            _product_ids: &[String],
        ) -> BoxFuture<'_, anyhow::Result<Vec<crate::interfaces::ExchangePosition>>> {
            Box::pin(async move { Ok(self.positions.lock().await.clone()) })
        }
    }

    struct NoopFeed;
    impl OracleFeed for NoopFeed {
        fn connect(&self) -> BoxFuture<'_, anyhow::Result<()>> {
            Box::pin(async { Ok(()) })
        }
        fn disconnect(&self) -> BoxFuture<'_, anyhow::Result<()>> {
            Box::pin(async { Ok(()) })
        }
        fn subscribe(
            &self,
            _instruments: Vec<String>,
            _on_tick: Box<dyn Fn(String, Tick) + Send + Sync>,
        ) -> BoxFuture<'_, anyhow::Result<()>> {
            Box::pin(async { Ok(()) })
        }
    }

    struct NoopEvents;
    impl EventStream for NoopEvents {
        fn connect(&self) -> BoxFuture<'_, anyhow::Result<()>> {
            Box::pin(async { Ok(()) })
        }
        fn disconnect(&self) -> BoxFuture<'_, anyhow::Result<()>> {
            Box::pin(async { Ok(()) })
        }
        fn subscribe_order_updates(
            &self,
            _subaccount_id: &str,
            _on_event: Box<dyn Fn(OrderStatusEvent) + Send + Sync>,
        ) -> BoxFuture<'_, anyhow::Result<()>> {
            Box::pin(async { Ok(()) })
        }
        fn subscribe_order_fills(
            &self,
            _subaccount_id: &str,
            _on_fill: Box<dyn Fn(serde_json::Value) + Send + Sync>,
        ) -> BoxFuture<'_, anyhow::Result<()>> {
            Box::pin(async { Ok(()) })
        }
    }

    type BoxFuture<'a, T> = std::pin::Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

    fn test_config() -> Config {
        Config {
            quote_refresh_cycle_ms: 5000,
            tickers: vec!["BTCUSD".to_string()],
            spread_width_bp: 10,
            max_price_deviation_pct: 5.0,
            ethereal_subaccount_id: "sub-1".to_string(),
            ethereal_timeout_ms: 10_000,
        }
    }

    fn btc_config() -> InstrumentConfig {
        InstrumentConfig {
            instrument: "BTCUSD".to_string(),
            order_size: 0.001,
            spread_bp: 10,
            max_deviation_pct: 5.0,
            tick_size: 1.0,
            min_qty: 0.0001,
            max_qty: 100.0,
            product_id: "BTCUSD_PERP".to_string(),
        }
    }

    fn test_engine(adapter: MockAdapter) -> (Arc<QuotingEngine>, Arc<MockAdapter>) {
        let adapter = Arc::new(adapter);
        let engine = Arc::new(QuotingEngine::new(
            &test_config(),
            vec![btc_config()],
            adapter.clone(),
            Arc::new(NoopFeed),
            Arc::new(NoopEvents),
        ));
        (engine, adapter)
    }

    /// Scenario 1: cold start, no positions.
    #[tokio::test]
    async fn cold_start_places_bid_and_ask_at_full_spread() {
        let (engine, _adapter) = test_engine(MockAdapter::default());
        engine.price_book.upsert("BTCUSD", Tick { price: 50000.0, confidence: 5.0, timestamp_ms: 0 });

        engine.cadence_tick().await;

        let states = engine.states.lock().await;
        let state = states.get("BTCUSD").unwrap();
        assert_eq!(state.bid.as_ref().unwrap().price, 49950.0);
        assert_eq!(state.ask.as_ref().unwrap().price, 50050.0);
        assert_eq!(state.bid.as_ref().unwrap().quantity, 0.001);
    }

    /// Scenario 2: deviation cancel, then re-placement on the next cadence.
    #[tokio::test]
    async fn deviation_cancel_then_replace_at_new_mid() {
        let (engine, _adapter) = test_engine(MockAdapter::default());

        engine.price_book.upsert("BTCUSD", Tick { price: 50000.0, confidence: 5.0, timestamp_ms: 0 });
        engine.cadence_tick().await;
        {
            let states = engine.states.lock().await;
            assert_eq!(states.get("BTCUSD").unwrap().bid.as_ref().unwrap().price, 49950.0);
        }

        engine.price_book.upsert("BTCUSD", Tick { price: 53000.0, confidence: 5.0, timestamp_ms: 1 });
        engine.cadence_tick().await;

        let states = engine.states.lock().await;
        let bid = states.get("BTCUSD").unwrap().bid.as_ref().unwrap();
        assert_eq!(bid.price, 52947.0);
    }

    /// Scenario 3: fill reconciliation blocks re-placement on the filled side.
    #[tokio::test]
    async fn fill_reconciliation_blocks_replacement() {
        let (engine, _adapter) = test_engine(MockAdapter::default());
        engine.price_book.upsert("BTCUSD", Tick { price: 50000.0, confidence: 5.0, timestamp_ms: 0 });
        engine.cadence_tick().await;

        let bid_id = {
            let states = engine.states.lock().await;
            states.get("BTCUSD").unwrap().bid.as_ref().unwrap().id.clone()
        };

        engine
            .reconcile(OrderStatusEvent { order_id: bid_id.clone(), status: OrderStatus::Filled })
            .await;

        engine.cadence_tick().await;

        let states = engine.states.lock().await;
        let state = states.get("BTCUSD").unwrap();
        assert_eq!(state.bid.as_ref().unwrap().id, bid_id);
        assert_eq!(state.bid.as_ref().unwrap().status, OrderStatus::Filled);
        assert!(state.ask.is_some());
    }

    /// Scenario 4: paired-fill cleanup clears both slots one cadence after
    /// both sides fill, then the following cadence places fresh orders.
    #[tokio::test]
    async fn paired_fill_cleanup_clears_then_next_cadence_replaces() {
        let (engine, _adapter) = test_engine(MockAdapter::default());
        engine.price_book.upsert("BTCUSD", Tick { price: 50000.0, confidence: 5.0, timestamp_ms: 0 });
        engine.cadence_tick().await;

        let (bid_id, ask_id) = {
            let states = engine.states.lock().await;
            let state = states.get("BTCUSD").unwrap();
            (state.bid.as_ref().unwrap().id.clone(), state.ask.as_ref().unwrap().id.clone())
        };
        engine.reconcile(OrderStatusEvent { order_id: bid_id, status: OrderStatus::Filled }).await;
        engine.reconcile(OrderStatusEvent { order_id: ask_id, status: OrderStatus::Filled }).await;

        // The cadence that observes both-filled clears the slots...
        engine.cadence_tick().await;
        {
            let states = engine.states.lock().await;
            let state = states.get("BTCUSD").unwrap();
            assert!(state.bid.is_none());
            assert!(state.ask.is_none());
        }

        // ...and the following cadence places fresh orders.
        engine.cadence_tick().await;
        let states = engine.states.lock().await;
        let state = states.get("BTCUSD").unwrap();
        assert!(state.bid.is_some());
        assert!(state.ask.is_some());
    }

    /// Scenario 5: position warmup seeds a synthetic filled order that
    /// shutdown must not cancel.
    #[tokio::test]
    async fn position_warmup_seeds_synthetic_order_excluded_from_shutdown() {
        let adapter = MockAdapter::default();
        adapter.positions.lock().await.push(crate::interfaces::ExchangePosition {
            product_id: "BTCUSD_PERP".to_string(),
            quantity: 0.005,
            entry_price: 45000.0,
        });
        let (engine, adapter) = test_engine(adapter);

        engine.position_warmup().await;

        {
            let states = engine.states.lock().await;
            let state = states.get("BTCUSD").unwrap();
            let bid = state.bid.as_ref().unwrap();
            assert_eq!(bid.id, "position-bid-BTCUSD_PERP");
            assert_eq!(bid.status, OrderStatus::Filled);
            assert_eq!(bid.price, 45000.0);
            assert!(state.long_inv.is_some());
        }

        engine.shutdown_sequence().await;
        assert!(adapter.canceled.lock().await.is_empty());
    }

    /// Scenario 6: shutdown bulk-cancels exactly the live (non-synthetic)
    /// order ids across all instruments, then clears all slots.
    #[tokio::test]
    async fn shutdown_cancels_live_orders_and_clears_all_slots() {
        let (engine, adapter) = test_engine(MockAdapter::default());
        {
            let mut states = engine.states.lock().await;
            let btc = states.get_or_insert("BTCUSD");
            btc.bid = Some(Order {
                id: "B1".to_string(),
                instrument: "BTCUSD".to_string(),
                side: Side::Bid,
                price: 100.0,
                quantity: 1.0,
                filled_qty: 0.0,
                status: OrderStatus::New,
                created_ms: 0,
            });
            btc.ask = Some(Order {
                id: "A1".to_string(),
                instrument: "BTCUSD".to_string(),
                side: Side::Ask,
                price: 110.0,
                quantity: 1.0,
                filled_qty: 0.0,
                status: OrderStatus::New,
                created_ms: 0,
            });
            let eth = states.get_or_insert("ETHUSD");
            eth.ask = Some(Order {
                id: "position-ask-ETHUSD_PERP".to_string(),
                instrument: "ETHUSD".to_string(),
                side: Side::Ask,
                price: 2000.0,
                quantity: 1.0,
                filled_qty: 1.0,
                status: OrderStatus::Filled,
                created_ms: 0,
            });
        }

        engine.shutdown_sequence().await;

        let canceled_calls = adapter.canceled.lock().await;
        assert_eq!(canceled_calls.len(), 1);
        let mut ids = canceled_calls[0].order_ids.clone();
        ids.sort();
        assert_eq!(ids, vec!["A1".to_string(), "B1".to_string()]);
        assert_eq!(canceled_calls[0].subaccount, "sub-1");

        let states = engine.states.lock().await;
        assert!(states.get("BTCUSD").unwrap().bid.is_none());
        assert!(states.get("BTCUSD").unwrap().ask.is_none());
        assert!(states.get("ETHUSD").unwrap().ask.is_none());
    }

}
