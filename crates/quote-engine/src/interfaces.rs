//! External collaborators the engine consumes: oracle ticks, the exchange
//! adapter, and the order-status event stream. The engine depends only on
//! these traits; concrete implementations live in `ethereal-adapter` and are
//! wired together in `live.rs`.

use std::future::Future;
use std::pin::Pin;

use crate::state::Side;

/// A normalized price observation for one instrument.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    pub price: f64,
    pub confidence: f64,
    pub timestamp_ms: i64,
}

/// Request to place a single limit order.
#[derive(Debug, Clone)]
pub struct PlaceOrderRequest {
    pub instrument: String,
    pub side: Side,
    pub price: f64,
    pub quantity: f64,
    /// Unix seconds at which the exchange should expire the order.
    pub expires_at_sec: i64,
}

/// Exchange response to a successful `place` call.
#[derive(Debug, Clone)]
pub struct PlaceOrderResponse {
    pub order_id: Option<String>,
}

/// Bulk cancel request: one network call, many ids.
#[derive(Debug, Clone)]
pub struct CancelOrdersRequest {
    pub order_ids: Vec<String>,
    pub subaccount: String,
}

/// An open position as reported by the exchange.
#[derive(Debug, Clone)]
pub struct ExchangePosition {
    pub product_id: String,
    /// Signed: positive long, negative short.
    pub quantity: f64,
    pub entry_price: f64,
}

/// A status transition delivered by the event stream.
#[derive(Debug, Clone)]
pub struct OrderStatusEvent {
    pub order_id: String,
    pub status: crate::state::OrderStatus,
}

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Adapter boundary for submitting and canceling orders and reading positions.
///
/// All calls carry the configured adapter timeout and are treated as a
/// single attempt: a timeout or transport error is surfaced to the caller
/// as an error, never retried inside the engine.
pub trait ExchangeAdapter: Send + Sync {
    fn place(&self, req: PlaceOrderRequest) -> BoxFuture<'_, anyhow::Result<PlaceOrderResponse>>;

    fn cancel(&self, req: CancelOrdersRequest) -> BoxFuture<'_, anyhow::Result<()>>;

    fn positions(
        &self,
        subaccount_id: &str,
        product_ids: &[String],
    ) -> BoxFuture<'_, anyhow::Result<Vec<ExchangePosition>>>;
}

/// Oracle price feed the engine subscribes to at boot.
pub trait OracleFeed: Send + Sync {
    fn connect(&self) -> BoxFuture<'_, anyhow::Result<()>>;

    fn disconnect(&self) -> BoxFuture<'_, anyhow::Result<()>>;

    /// Subscribe to ticks for the given instruments. `on_tick` is invoked
    /// from the feed's own task context and must not block on exchange
    /// calls; it only mutates in-memory state (PriceBook upsert).
    fn subscribe(
        &self,
        instruments: Vec<String>,
        on_tick: Box<dyn Fn(String, Tick) + Send + Sync>,
    ) -> BoxFuture<'_, anyhow::Result<()>>;
}

/// Order-status event stream the engine subscribes to at boot.
pub trait EventStream: Send + Sync {
    fn connect(&self) -> BoxFuture<'_, anyhow::Result<()>>;

    fn disconnect(&self) -> BoxFuture<'_, anyhow::Result<()>>;

    fn subscribe_order_updates(
        &self,
        subaccount_id: &str,
        on_event: Box<dyn Fn(OrderStatusEvent) + Send + Sync>,
    ) -> BoxFuture<'_, anyhow::Result<()>>;

    /// Fills are informational; the core treats status events as
    /// authoritative and does not act on this stream, but it is still
    /// subscribed at boot per the source contract.
    fn subscribe_order_fills(
        &self,
        subaccount_id: &str,
        on_fill: Box<dyn Fn(serde_json::Value) + Send + Sync>,
    ) -> BoxFuture<'_, anyhow::Result<()>>;
}
