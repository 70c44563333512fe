//! api::http
//!
//! HTTP implementation of [`AutomationApi`] using reqwest.
//!
//! # Design
//!
//! Every call is a single request/response with a fixed per-request
//! timeout taken from configuration. Requests carry the API key in the
//! `X-Api-Key` header, and JSON bodies are sent with
//! `Content-Type: application/json`.
//!
//! Status codes >= 400 become [`ApiError::Rejected`] with the raw body, so the
//! server's own message reaches the user unchanged. Nothing is retried.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use sorting_operator::api::{AutomationApi, HttpClient};
//!
//! let client = HttpClient::new("http://localhost:8080", "secret", Duration::from_secs(30))?;
//! let config = client.sign_config().await?;
//! println!("{} nodes", config.nodes.len());
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::traits::{ApiError, AutomationApi};
use super::wire::{
    HoldBatchResult, HoldRequestBody, OperationRequest, PhysicalOperation, Priority,
    ReservationFilter,
};
use crate::core::config::Config;
use crate::core::types::{HoldId, InventoryRecord, ItemType, SignConfig, Stats};

/// Header carrying the API key on every request.
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Longest response body echoed into debug logs.
const LOGGED_BODY_LIMIT: usize = 1000;

/// reqwest-backed automation server client.
pub struct HttpClient {
    client: Client,
    base_url: String,
    api_key: HeaderValue,
}

// Custom Debug to avoid exposing the API key
impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl HttpClient {
    /// Create a client for the server at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Transport` if the key is not a valid header value
    /// or the underlying HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let mut api_key = HeaderValue::from_str(api_key)
            .map_err(|_| ApiError::Transport("API key is not a valid header value".into()))?;
        api_key.set_sensitive(true);

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    /// Create a client from loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(config.base_url(), &config.api_key(), config.timeout())
    }

    /// The server base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, self.api_key.clone());
        headers
    }

    /// Send one request and return the raw body of a successful response.
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<Vec<u8>, ApiError> {
        let url = self.url(path);
        debug!(method = method.as_str(), url = url.as_str(), "sending request");

        let mut request = self.client.request(method, &url).headers(self.headers());
        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .body(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Transport(format!("failed to read response: {}", e)))?;

        debug!(status = status.as_u16(), len = bytes.len(), "received response");
        if bytes.len() <= LOGGED_BODY_LIMIT {
            debug!(body = %String::from_utf8_lossy(&bytes), "response body");
        }

        if status.is_client_error() || status.is_server_error() {
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        Ok(bytes.to_vec())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        what: &'static str,
    ) -> Result<T, ApiError> {
        let bytes = self.send(Method::GET, path, None).await?;
        decode(&bytes, what)
    }
}

fn encode<T: Serialize + ?Sized>(body: &T) -> Result<Vec<u8>, ApiError> {
    serde_json::to_vec(body)
        .map_err(|e| ApiError::Transport(format!("failed to marshal request body: {}", e)))
}

fn decode<T: DeserializeOwned>(bytes: &[u8], what: &'static str) -> Result<T, ApiError> {
    serde_json::from_slice(bytes).map_err(|e| ApiError::Decode {
        what,
        message: e.to_string(),
    })
}

#[async_trait]
impl AutomationApi for HttpClient {
    async fn item_metadata(&self) -> Result<Vec<ItemType>, ApiError> {
        self.get_json("/data/items", "item metadata").await
    }

    async fn inventory_listing(&self) -> Result<Vec<InventoryRecord>, ApiError> {
        self.get_json("/automation/inventory_listing", "inventory listing")
            .await
    }

    async fn sign_config(&self) -> Result<SignConfig, ApiError> {
        self.get_json("/automation/sign_config", "sign config").await
    }

    async fn create_holds(
        &self,
        requests: &[ReservationFilter],
    ) -> Result<HoldBatchResult, ApiError> {
        let body = encode(&HoldRequestBody { requests })?;
        let bytes = self
            .send(Method::POST, "/automation/holds", Some(body))
            .await?;
        decode(&bytes, "hold response")
    }

    async fn release_holds(&self, ids: &[HoldId]) -> Result<(), ApiError> {
        let body = encode(ids)?;
        self.send(Method::DELETE, "/automation/holds", Some(body))
            .await?;
        Ok(())
    }

    async fn execute_operation(
        &self,
        operation: &PhysicalOperation,
        priority: Priority,
    ) -> Result<(), ApiError> {
        let body = encode(&OperationRequest {
            kind: operation,
            priority,
        })?;
        self.send(Method::POST, "/automation/operations", Some(body))
            .await?;
        Ok(())
    }

    async fn stats(&self) -> Result<Stats, ApiError> {
        self.get_json("/admin/stats", "stats").await
    }
}
