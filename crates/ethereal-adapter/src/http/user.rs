/*
[INPUT]:  Subaccount id and product id filters
[OUTPUT]: User position data
[POS]:    HTTP layer - user data endpoints
[UPDATE]: When adding new user endpoints or changing query parameters
*/

use reqwest::Method;

use crate::http::client::EtherealClient;
use crate::http::error::{Result, ensure_success};
use crate::types::PositionsResponse;

impl EtherealClient {
    /// Query positions for a subaccount, optionally restricted to a set of
    /// product ids.
    ///
    /// GET /api/positions?subaccount={subaccount}&productId={id}&productId={id}...
    pub async fn positions(
        &self,
        subaccount_id: &str,
        product_ids: &[String],
    ) -> Result<PositionsResponse> {
        let mut endpoint = format!("/api/positions?subaccount={subaccount_id}");
        for id in product_ids {
            endpoint.push_str("&productId=");
            endpoint.push_str(id);
        }
        let response = self.request(Method::GET, &endpoint)?.send().await?;
        let response = ensure_success(response).await?.json::<PositionsResponse>().await?;
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Ed25519Signer;
    use crate::http::client::ClientConfig;
    use crate::http::signature::RequestSigner;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_positions_parses_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/positions"))
            .and(query_param("subaccount", "sub-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    {"productId": "BTCUSD_PERP", "quantity": "0.05", "entryPrice": "50000"}
                ]
            })))
            .mount(&server)
            .await;

        let signer = RequestSigner::new(Ed25519Signer::generate());
        let client = EtherealClient::with_config(
            ClientConfig {
                base_url: server.uri(),
                ..ClientConfig::default()
            },
            signer,
            "sub-1",
        )
        .unwrap();

        let positions = client.positions("sub-1", &[]).await.unwrap();
        assert_eq!(positions.data.len(), 1);
        assert_eq!(positions.data[0].quantity, "0.05");
    }
}
