/*
[INPUT]:  Order requests with body signature headers
[OUTPUT]: Order responses and confirmation
[POS]:    HTTP layer - trading endpoints (require body signature)
[UPDATE]: When adding new trading endpoints or changing order flow
*/

use reqwest::Method;

use crate::http::client::EtherealClient;
use crate::http::error::{Result, ensure_success};
use crate::http::signature::{
    HEADER_REQUEST_ID, HEADER_REQUEST_SIGNATURE, HEADER_REQUEST_TIMESTAMP, HEADER_REQUEST_VERSION,
    RequestSigner,
};
use crate::types::{CancelOrdersRequest, CancelOrdersResponse, NewOrderRequest, PlaceOrderResponse};

impl EtherealClient {
    /// Place a new order.
    ///
    /// POST /api/new_order, body-signed.
    pub async fn new_order(&self, req: &NewOrderRequest) -> Result<PlaceOrderResponse> {
        let payload = serde_json::to_string(req)?;
        let response = self
            .signed_post("/api/new_order", &payload)
            .await?
            .json::<PlaceOrderResponse>()
            .await?;
        Ok(response)
    }

    /// Cancel one or more orders.
    ///
    /// POST /api/cancel_orders, body-signed.
    pub async fn cancel_orders(&self, req: &CancelOrdersRequest) -> Result<CancelOrdersResponse> {
        let payload = serde_json::to_string(req)?;
        let response = self
            .signed_post("/api/cancel_orders", &payload)
            .await?
            .json::<CancelOrdersResponse>()
            .await?;
        Ok(response)
    }

    async fn signed_post(&self, endpoint: &str, payload: &str) -> Result<reqwest::Response> {
        let timestamp = RequestSigner::timestamp_millis();
        let sig = self.signer().sign_payload(payload, timestamp);
        let response = self
            .request(Method::POST, endpoint)?
            .header(HEADER_REQUEST_VERSION, &sig.version)
            .header(HEADER_REQUEST_ID, &sig.request_id)
            .header(HEADER_REQUEST_TIMESTAMP, sig.timestamp.to_string())
            .header(HEADER_REQUEST_SIGNATURE, &sig.signature)
            .header("content-type", "application/json")
            .body(payload.to_string())
            .send()
            .await?;
        ensure_success(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Ed25519Signer;
    use crate::http::client::ClientConfig;
    use crate::http::signature::RequestSigner;
    use crate::types::{OrderType, Side, TimeInForce};
    use rust_decimal::Decimal;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_client(base_url: String) -> EtherealClient {
        let signer = RequestSigner::new(Ed25519Signer::generate());
        EtherealClient::with_config(
            ClientConfig {
                base_url,
                ..ClientConfig::default()
            },
            signer,
            "sub-1",
        )
        .unwrap()
    }

    #[tokio::test]
    async fn cancel_orders_rejects_on_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/cancel_orders"))
            .respond_with(ResponseTemplate::new(400).set_body_string("unknown order id"))
            .mount(&server)
            .await;

        let client = make_client(server.uri());
        let req = CancelOrdersRequest {
            subaccount: "sub-1".to_string(),
            order_ids: vec!["abc".to_string()],
        };

        let err = client.cancel_orders(&req).await.unwrap_err();
        match err {
            crate::http::error::EtherealError::Api { code, .. } => assert_eq!(code, 400),
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn new_order_parses_success_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/new_order"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"orderId": "order-1"})),
            )
            .mount(&server)
            .await;

        let client = make_client(server.uri());
        let req = NewOrderRequest {
            instrument: "BTCUSD_PERP".to_string(),
            side: Side::Buy,
            order_type: OrderType::Limit,
            quantity: Decimal::new(1, 2),
            price: Decimal::new(50000, 0),
            time_in_force: TimeInForce::Gtd,
            expires_at_sec: 0,
        };

        let resp = client.new_order(&req).await.unwrap();
        assert_eq!(resp.order_id.as_deref(), Some("order-1"));
    }
}
