//! Exchange rate provider clients
//!
//! Defines the `RateProvider` trait used by the rate store, an HTTP client for
//! exchangerate.host-style JSON APIs, and an always-failing offline provider.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::{CurrencyCode, RateTable};

/// Default endpoint for latest rates
pub const DEFAULT_BASE_URL: &str = "https://api.exchangerate.host/latest";

/// Errors that can occur when fetching rates from a provider
#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Provider answered with a non-success HTTP status
    #[error("Provider returned HTTP status {0}")]
    HttpStatus(StatusCode),

    /// Provider answered but flagged the request as unsuccessful
    #[error("Provider reported an error: {0}")]
    Unsuccessful(String),

    /// Response had no `rates` field or no usable rate in it
    #[error("Response contained no usable rates")]
    MissingRates,

    /// Network access is disabled
    #[error("Rate provider is offline")]
    Offline,
}

/// Source of live exchange rates
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Short name used in log messages
    fn name(&self) -> &str;

    /// Fetch the latest rates relative to `base`
    async fn fetch_rates(&self, base: &CurrencyCode) -> Result<RateTable, ProviderError>;
}

/// Response body of the rates endpoint
#[derive(Debug, Deserialize)]
struct ApiResponse {
    /// Missing indicator counts as failure
    #[serde(default)]
    success: bool,
    /// Error descriptor, either a string or an object
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    rates: Option<RateTable>,
}

/// Client for fetching rates over HTTP
#[derive(Debug, Clone)]
pub struct HttpRateProvider {
    client: Client,
    /// Endpoint URL (allows override for testing or self-hosted mirrors)
    base_url: String,
    /// Optional access key sent as `access_key`
    api_key: Option<String>,
}

impl Default for HttpRateProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpRateProvider {
    /// Create a provider for the default endpoint
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    /// Create a provider with a custom HTTP client (e.g., one with a timeout)
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
        }
    }

    /// Use a different endpoint URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Send an access key with every request
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl RateProvider for HttpRateProvider {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_rates(&self, base: &CurrencyCode) -> Result<RateTable, ProviderError> {
        let mut request = self
            .client
            .get(&self.base_url)
            .query(&[("base", base.as_str())]);
        if let Some(ref key) = self.api_key {
            request = request.query(&[("access_key", key.as_str())]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::HttpStatus(status));
        }

        let text = response.text().await?;
        parse_response(&text)
    }
}

/// Parse a rates response body into a RateTable
pub fn parse_response(body: &str) -> Result<RateTable, ProviderError> {
    let response: ApiResponse = serde_json::from_str(body)?;

    if !response.success {
        let reason = response
            .error
            .as_ref()
            .map(describe_error)
            .unwrap_or_else(|| "request was not successful".to_string());
        return Err(ProviderError::Unsuccessful(reason));
    }

    response
        .rates
        .filter(|rates| !rates.is_empty())
        .ok_or(ProviderError::MissingRates)
}

/// Extracts a human-readable message from an error descriptor
fn describe_error(error: &Value) -> String {
    match error {
        Value::String(message) => message.clone(),
        Value::Object(fields) => ["info", "message", "type"]
            .iter()
            .find_map(|key| fields.get(*key).and_then(Value::as_str))
            .map(str::to_string)
            .or_else(|| fields.get("code").map(|code| format!("code {}", code)))
            .unwrap_or_else(|| error.to_string()),
        other => other.to_string(),
    }
}

/// Provider used when network access is disabled; every fetch fails
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineProvider;

#[async_trait]
impl RateProvider for OfflineProvider {
    fn name(&self) -> &str {
        "offline"
    }

    async fn fetch_rates(&self, _base: &CurrencyCode) -> Result<RateTable, ProviderError> {
        Err(ProviderError::Offline)
    }
}
