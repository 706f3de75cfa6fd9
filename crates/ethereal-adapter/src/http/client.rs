/*
[INPUT]:  HTTP configuration (base URL, timeouts, signer)
[OUTPUT]: Configured reqwest client ready for API calls
[POS]:    HTTP layer - core client implementation
[UPDATE]: When adding connection options or changing client behavior
*/

use reqwest::{Client, Method, RequestBuilder, Url};
use std::time::Duration;

use crate::http::RequestSigner;

/// Default base URL for the Ethereal perpetuals API.
pub const DEFAULT_BASE_URL: &str = "https://api.ethereal.trade";

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Main HTTP client for the Ethereal API.
#[derive(Debug)]
pub struct EtherealClient {
    http_client: Client,
    base_url: Url,
    signer: RequestSigner,
    subaccount: String,
}

impl EtherealClient {
    /// Create a new client with custom configuration, a request signer and
    /// the subaccount used for trading requests.
    pub fn with_config(
        config: ClientConfig,
        signer: RequestSigner,
        subaccount: impl Into<String>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            http_client,
            base_url: Url::parse(&config.base_url)?,
            signer,
            subaccount: subaccount.into(),
        })
    }

    pub fn subaccount(&self) -> &str {
        &self.subaccount
    }

    pub(crate) fn signer(&self) -> &RequestSigner {
        &self.signer
    }

    fn url(&self, endpoint: &str) -> Result<Url, url::ParseError> {
        self.base_url.join(endpoint)
    }

    /// Build a request builder for the given endpoint and method.
    pub(crate) fn request(
        &self,
        method: Method,
        endpoint: &str,
    ) -> Result<RequestBuilder, url::ParseError> {
        let url = self.url(endpoint)?;
        Ok(self.http_client.request(method, url))
    }
}
