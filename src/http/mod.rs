//! HTTP transport for the client API
//!
//! The tokenization layer talks to the gateway exclusively through the [`HttpClient`]
//! trait, which keeps transport details (TLS, pooling, timeouts) out of the
//! orchestration code and lets tests substitute a spy.
//!
//! [`BraintreeHttpClient`] is the production implementation. It resolves paths against
//! the client API root, signs every request for the configured [`Authorization`], and
//! maps non-success statuses onto the [`BraintreeError`] taxonomy via [`parse_response`].
//!
//! # Examples
//!
//! ```no_run
//! use rust_braintree::http::{BraintreeHttpClient, HttpClient, HttpClientConfig};
//! use rust_braintree::types::Authorization;
//! use std::time::Duration;
//!
//! # async fn example() -> rust_braintree::Result<()> {
//! let authorization = Authorization::from_string("sandbox_abc123_merchant_id")?;
//! let config = HttpClientConfig::new().with_timeout(Duration::from_secs(30));
//! let client = BraintreeHttpClient::new(authorization, config)?;
//!
//! let body = client.get("v1/configuration").await?;
//! println!("{}", body);
//! # Ok(())
//! # }
//! ```

use crate::types::{Authorization, ErrorWithResponse};
use crate::{BraintreeError, Result};
use async_trait::async_trait;
use http::StatusCode;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use url::Url;


/// Header carrying a tokenization key
pub const CLIENT_KEY_HEADER: &str = "Client-Key";

/// Body field / query parameter carrying a client token fingerprint
pub const AUTHORIZATION_FINGERPRINT_KEY: &str = "authorizationFingerprint";

/// Minimal transport needed by the tokenization layer
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Issue a GET and return the success body
    async fn get(&self, path: &str) -> Result<String>;

    /// Issue a POST with a JSON body and return the success body
    async fn post(&self, path: &str, body: String) -> Result<String>;
}

/// Map an HTTP status onto the error taxonomy, passing success bodies through
pub fn parse_response(status: StatusCode, body: String) -> Result<String> {
    match status.as_u16() {
        200 | 201 | 202 => Ok(body),
        401 => Err(BraintreeError::Authentication(error_message(&body))),
        403 => Err(BraintreeError::Authorization(error_message(&body))),
        422 => Err(BraintreeError::Validation(ErrorWithResponse::from_json(
            422, &body,
        ))),
        426 => Err(BraintreeError::UpgradeRequired(
            "The version of this client is no longer supported".to_string(),
        )),
        429 => Err(BraintreeError::RateLimit(
            "You are being rate-limited. Please try again in a few minutes.".to_string(),
        )),
        500 => Err(BraintreeError::Server(body)),
        503 => Err(BraintreeError::DownForMaintenance(body)),
        code => Err(BraintreeError::unexpected(format!(
            "Unexpected response status {}: {}",
            code, body
        ))),
    }
}

/// `error.message` of a gateway error body, or the body itself
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

/// Transport configuration for [`BraintreeHttpClient`]
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Client API root; defaults to the one derived from the authorization
    pub base_url: Option<String>,
    /// Request timeout
    pub timeout: Option<Duration>,
    /// User agent sent with every request
    pub user_agent: String,
}

impl HttpClientConfig {
    pub fn new() -> Self {
        Self {
            base_url: None,
            timeout: None,
            user_agent: format!("braintree/rust/{}", crate::VERSION),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(url) = &self.base_url {
            if url.is_empty() {
                return Err(BraintreeError::config("Base URL cannot be empty"));
            }

            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(BraintreeError::config(
                    "Base URL must start with http:// or https://",
                ));
            }
        }

        Ok(())
    }

    /// Override the client API root
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// reqwest-backed [`HttpClient`] that signs requests for an [`Authorization`]
#[derive(Clone)]
pub struct BraintreeHttpClient {
    base_url: String,
    authorization: Authorization,
    user_agent: String,
    client: Client,
}

impl std::fmt::Debug for BraintreeHttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BraintreeHttpClient")
            .field("base_url", &self.base_url)
            .field("authorization", &self.authorization)
            .finish()
    }
}

impl BraintreeHttpClient {
    /// Create a new client
    pub fn new(authorization: Authorization, config: HttpClientConfig) -> Result<Self> {
        config.validate()?;

        let mut client_builder = Client::builder();

        if let Some(timeout) = config.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        let client = client_builder
            .build()
            .map_err(|e| BraintreeError::config(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = config
            .base_url
            .unwrap_or_else(|| authorization.base_url());

        Ok(Self {
            base_url,
            authorization,
            user_agent: config.user_agent,
            client,
        })
    }

    /// Client API root requests are resolved against
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn authorization(&self) -> &Authorization {
        &self.authorization
    }

    /// Absolute URLs pass through, anything else is joined onto the base URL
    fn resolve(&self, path: &str) -> Result<Url> {
        let url = if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!(
                "{}/{}",
                self.base_url.trim_end_matches('/'),
                path.trim_start_matches('/')
            )
        };

        Url::parse(&url).map_err(|e| BraintreeError::config(format!("Invalid URL {}: {}", url, e)))
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let request = self
            .client
            .request(method, url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .header(reqwest::header::ACCEPT, "application/json");

        match &self.authorization {
            Authorization::TokenizationKey(key) => request.header(CLIENT_KEY_HEADER, key.key()),
            Authorization::ClientToken(_) => request,
        }
    }

    /// Insert the fingerprint into a JSON object body; other bodies are sent unchanged
    fn sign_body(&self, body: String) -> String {
        let Authorization::ClientToken(token) = &self.authorization else {
            return body;
        };

        match serde_json::from_str::<Value>(&body) {
            Ok(Value::Object(mut object)) => {
                object.insert(
                    AUTHORIZATION_FINGERPRINT_KEY.to_string(),
                    Value::String(token.authorization_fingerprint().to_string()),
                );
                Value::Object(object).to_string()
            }
            _ => body,
        }
    }

    async fn execute(&self, path: &str, request: reqwest::RequestBuilder) -> Result<String> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!("Request to {} failed with status: {}", path, status);
        } else {
            tracing::debug!("Request to {} succeeded with status: {}", path, status);
        }

        parse_response(status, body)
    }
}

#[async_trait]
impl HttpClient for BraintreeHttpClient {
    async fn get(&self, path: &str) -> Result<String> {
        let mut url = self.resolve(path)?;
        if let Authorization::ClientToken(token) = &self.authorization {
            url.query_pairs_mut().append_pair(
                AUTHORIZATION_FINGERPRINT_KEY,
                token.authorization_fingerprint(),
            );
        }

        tracing::debug!("GET {}", path);
        let request = self.request(reqwest::Method::GET, url);
        self.execute(path, request).await
    }

    async fn post(&self, path: &str, body: String) -> Result<String> {
        let url = self.resolve(path)?;
        let body = self.sign_body(body);

        tracing::debug!("POST {}", path);
        let request = self
            .request(reqwest::Method::POST, url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body);
        self.execute(path, request).await
    }
}
