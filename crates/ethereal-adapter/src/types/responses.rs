/*
[INPUT]:  API schema definitions and serde requirements
[OUTPUT]: Typed Rust response structs with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API schema changes or new types added
*/

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceOrderResponse {
    #[serde(rename = "orderId", default)]
    pub order_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelOrdersResponse {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionEntry {
    #[serde(rename = "productId")]
    pub product_id: String,
    /// Signed decimal string: positive long, negative short.
    pub quantity: String,
    #[serde(rename = "entryPrice")]
    pub entry_price: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionsResponse {
    pub data: Vec<PositionEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolInfoResponse {
    pub symbol: String,
    #[serde(rename = "tickSize", with = "rust_decimal::serde::str")]
    pub tick_size: rust_decimal::Decimal,
    #[serde(rename = "minQty", with = "rust_decimal::serde::str")]
    pub min_qty: rust_decimal::Decimal,
    #[serde(rename = "maxQty", with = "rust_decimal::serde::str")]
    pub max_qty: rust_decimal::Decimal,
    #[serde(rename = "productId")]
    pub product_id: String,
}
