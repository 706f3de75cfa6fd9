//! Wires `ethereal-adapter`'s concrete HTTP/WebSocket clients into the
//! engine's `ExchangeAdapter`/`OracleFeed`/`EventStream` traits. This is the
//! only place `rust_decimal::Decimal` and `f64` meet: the adapter crate
//! speaks Decimal on the wire, the core speaks f64 in memory.

use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;

use rust_decimal::Decimal;
use tokio::sync::Mutex;

use ethereal_adapter::{
    CancelOrdersRequest as WireCancelRequest, EtherealClient, EtherealWebSocket,
    NewOrderRequest as WireNewOrderRequest, OrderType, Side as WireSide, TimeInForce,
    WebSocketMessage, WireOrderStatus,
};

use crate::interfaces::{
    CancelOrdersRequest, EventStream, ExchangeAdapter, ExchangePosition, OracleFeed,
    OrderStatusEvent, PlaceOrderRequest, PlaceOrderResponse, Tick,
};
use crate::state::{OrderStatus, Side};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

fn to_decimal(value: f64) -> Decimal {
    Decimal::from_str(&value.to_string()).unwrap_or_default()
}

fn parse_f64(raw: &str) -> f64 {
    raw.parse().unwrap_or(0.0)
}

fn wire_side(side: Side) -> WireSide {
    match side {
        Side::Bid => WireSide::Buy,
        Side::Ask => WireSide::Sell,
    }
}

fn engine_status(status: WireOrderStatus) -> OrderStatus {
    match status {
        WireOrderStatus::New | WireOrderStatus::Open => OrderStatus::New,
        WireOrderStatus::PartiallyFilled => OrderStatus::PartiallyFilled,
        WireOrderStatus::Filled => OrderStatus::Filled,
        WireOrderStatus::Cancelled | WireOrderStatus::Rejected => OrderStatus::Canceled,
        WireOrderStatus::Expired => OrderStatus::Expired,
    }
}

impl ExchangeAdapter for EtherealClient {
    fn place(&self, req: PlaceOrderRequest) -> BoxFuture<'_, anyhow::Result<PlaceOrderResponse>> {
        Box::pin(async move {
            let wire = WireNewOrderRequest {
                instrument: req.instrument,
                side: wire_side(req.side),
                order_type: OrderType::Limit,
                quantity: to_decimal(req.quantity),
                price: to_decimal(req.price),
                time_in_force: TimeInForce::Gtd,
                expires_at_sec: req.expires_at_sec,
            };
            let response = self.new_order(&wire).await?;
            Ok(PlaceOrderResponse {
                order_id: response.order_id,
            })
        })
    }

    fn cancel(&self, req: CancelOrdersRequest) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move {
            let wire = WireCancelRequest {
                order_ids: req.order_ids,
                subaccount: req.subaccount,
            };
            self.cancel_orders(&wire).await?;
            Ok(())
        })
    }

    fn positions(
        &self,
        subaccount_id: &str,
        product_ids: &[String],
    ) -> BoxFuture<'_, anyhow::Result<Vec<ExchangePosition>>> {
        let subaccount_id = subaccount_id.to_string();
        let product_ids = product_ids.to_vec();
        Box::pin(async move {
            let response = self.positions(&subaccount_id, &product_ids).await?;
            Ok(response
                .data
                .into_iter()
                .map(|entry| ExchangePosition {
                    product_id: entry.product_id,
                    quantity: parse_f64(&entry.quantity),
                    entry_price: parse_f64(&entry.entry_price),
                })
                .collect())
        })
    }
}

/// Market-data half of the WebSocket connection, wrapped to implement
/// `OracleFeed`. Holds the socket behind a mutex since `take_receiver`
/// needs exclusive access once, at subscribe time.
pub struct LiveOracleFeed {
    socket: Mutex<EtherealWebSocket>,
}

impl LiveOracleFeed {
    pub fn new() -> Self {
        Self {
            socket: Mutex::new(EtherealWebSocket::new()),
        }
    }
}

impl Default for LiveOracleFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl OracleFeed for LiveOracleFeed {
    fn connect(&self) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move {
            self.socket
                .lock()
                .await
                .connect_market_stream()
                .await
                .map_err(|err| anyhow::anyhow!(err.to_string()))
        })
    }

    fn disconnect(&self) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move {
            self.socket.lock().await.disconnect().await;
            Ok(())
        })
    }

    fn subscribe(
        &self,
        instruments: Vec<String>,
        on_tick: Box<dyn Fn(String, Tick) + Send + Sync>,
    ) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move {
            let mut socket = self.socket.lock().await;
            let mut rx = socket
                .take_receiver()
                .ok_or_else(|| anyhow::anyhow!("oracle feed receiver already taken"))?;
            for instrument in &instruments {
                socket
                    .subscribe_price(instrument)
                    .await
                    .map_err(|err| anyhow::anyhow!(err.to_string()))?;
            }
            tokio::spawn(async move {
                while let Some(message) = rx.recv().await {
                    if let WebSocketMessage::Price { symbol, data } = message
                        && let Some(tick) = parse_tick(&data)
                    {
                        on_tick(symbol, tick);
                    }
                }
            });
            Ok(())
        })
    }
}

fn parse_tick(data: &serde_json::Value) -> Option<Tick> {
    let price = data
        .get("mark_price")
        .or_else(|| data.get("mid_price"))
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse::<f64>().ok())?;
    let confidence = data
        .get("confidence")
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(1.0);
    let timestamp_ms = data
        .get("time")
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(0);
    Some(Tick {
        price,
        confidence,
        timestamp_ms,
    })
}

/// Order-update half of the WebSocket connection, wrapped to implement
/// `EventStream`.
pub struct LiveEventStream {
    socket: Mutex<EtherealWebSocket>,
}

impl LiveEventStream {
    pub fn new() -> Self {
        Self {
            socket: Mutex::new(EtherealWebSocket::new()),
        }
    }
}

impl Default for LiveEventStream {
    fn default() -> Self {
        Self::new()
    }
}

impl EventStream for LiveEventStream {
    fn connect(&self) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move {
            let socket = self.socket.lock().await;
            socket
                .connect_order_stream("")
                .await
                .map_err(|err| anyhow::anyhow!(err.to_string()))
        })
    }

    fn disconnect(&self) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move {
            self.socket.lock().await.disconnect().await;
            Ok(())
        })
    }

    fn subscribe_order_updates(
        &self,
        _subaccount_id: &str,
        on_event: Box<dyn Fn(OrderStatusEvent) + Send + Sync>,
    ) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move {
            let mut socket = self.socket.lock().await;
            let mut rx = socket
                .take_receiver()
                .ok_or_else(|| anyhow::anyhow!("event stream receiver already taken"))?;
            socket
                .subscribe_orders()
                .await
                .map_err(|err| anyhow::anyhow!(err.to_string()))?;
            tokio::spawn(async move {
                while let Some(message) = rx.recv().await {
                    if let WebSocketMessage::Order { data } = message
                        && let Some(event) = parse_order_event(&data)
                    {
                        on_event(event);
                    }
                }
            });
            Ok(())
        })
    }

    fn subscribe_order_fills(
        &self,
        _subaccount_id: &str,
        _on_fill: Box<dyn Fn(serde_json::Value) + Send + Sync>,
    ) -> BoxFuture<'_, anyhow::Result<()>> {
        // Fills are informational; the core never subscribes to them
        // separately because status events alone drive reconciliation, and
        // the order stream's take_receiver is already consumed above.
        Box::pin(async move { Ok(()) })
    }
}

fn parse_order_event(data: &serde_json::Value) -> Option<OrderStatusEvent> {
    let id = data.get("id")?.as_str()?.to_string();
    let status_raw = data.get("status")?.as_str()?;
    let status: WireOrderStatus = serde_json::from_value(serde_json::Value::String(status_raw.to_string())).ok()?;
    Some(OrderStatusEvent {
        order_id: id,
        status: engine_status(status),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_status_maps_open_to_new() {
        assert_eq!(engine_status(WireOrderStatus::Open), OrderStatus::New);
    }

    #[test]
    fn engine_status_maps_rejected_to_canceled() {
        assert_eq!(engine_status(WireOrderStatus::Rejected), OrderStatus::Canceled);
    }

    #[test]
    fn to_decimal_round_trips_price() {
        assert_eq!(to_decimal(50000.5).to_string(), "50000.5");
    }

    #[test]
    fn parse_tick_reads_mark_price() {
        let data = serde_json::json!({"mark_price": "50000.25", "time": "1700000000000"});
        let tick = parse_tick(&data).unwrap();
        assert_eq!(tick.price, 50000.25);
        assert_eq!(tick.timestamp_ms, 1700000000000);
    }
}
