/*
[INPUT]:  Symbol identifiers
[OUTPUT]: Product catalog entries (tick size, quantity bounds, product id)
[POS]:    HTTP layer - public market data endpoints (no auth required)
[UPDATE]: When adding new public endpoints or changing response format
*/

use reqwest::Method;

use crate::http::client::EtherealClient;
use crate::http::error::{Result, ensure_success};
use crate::types::SymbolInfoResponse;

impl EtherealClient {
    /// Query product catalog information for a symbol.
    ///
    /// GET /api/symbols/{symbol}
    ///
    /// Used once at startup to resolve each configured instrument to its
    /// venue product id and tick/quantity bounds; the core itself never
    /// calls this.
    pub async fn query_symbol_info(&self, symbol: &str) -> Result<SymbolInfoResponse> {
        let endpoint = format!("/api/symbols/{symbol}");
        let response = self.request(Method::GET, &endpoint)?.send().await?;
        let response = ensure_success(response).await?.json::<SymbolInfoResponse>().await?;
        Ok(response)
    }
}
