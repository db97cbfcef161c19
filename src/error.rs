//! Error types for the Braintree client
//!
//! Every asynchronous tokenization path resolves to a [`BraintreeError`]. Errors derived
//! from an HTTP response keep their status code so callers can tell a validation failure
//! (`422`) apart from a permission problem (`403`) or a gateway outage (`5xx`).

use crate::types::ErrorWithResponse;
use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, BraintreeError>;

/// Message reported when a tokenization key is used against a client-token-only endpoint
pub const TOKENIZATION_KEY_NOT_ALLOWED: &str = "Tokenization key authorization not allowed for this endpoint. Please use an authentication method with upgraded permissions";

/// Error taxonomy for the Braintree client
#[derive(Debug, Error)]
pub enum BraintreeError {
    /// The gateway rejected the request payload (HTTP 422)
    #[error("{0}")]
    Validation(ErrorWithResponse),

    /// The authorization in use lacks permission for the operation (HTTP 403 or local check)
    #[error("{0}")]
    Authorization(String),

    /// The authorization was not accepted by the gateway (HTTP 401)
    #[error("{0}")]
    Authentication(String),

    /// The caller supplied an unusable argument, such as a malformed authorization string
    #[error("{0}")]
    InvalidArgument(String),

    /// The gateway answered with something this client cannot interpret
    #[error("{0}")]
    Unexpected(String),

    /// This client version is no longer supported by the gateway (HTTP 426)
    #[error("{0}")]
    UpgradeRequired(String),

    /// Too many requests (HTTP 429)
    #[error("{0}")]
    RateLimit(String),

    /// The gateway failed internally (HTTP 500)
    #[error("{0}")]
    Server(String),

    /// The gateway is down for maintenance (HTTP 503)
    #[error("{0}")]
    DownForMaintenance(String),

    /// Client-side configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport failure (connectivity, timeout, TLS)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Base64 decoding error
    #[error("Base64 error: {0}")]
    Base64(#[from] base64::DecodeError),
}

impl BraintreeError {
    /// Create an authorization error
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization(message.into())
    }

    /// Create an authentication error
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication(message.into())
    }

    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create an unexpected error
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// The error raised when a tokenization key calls a client-token-only endpoint
    pub fn tokenization_key_not_allowed() -> Self {
        Self::Authorization(TOKENIZATION_KEY_NOT_ALLOWED.to_string())
    }

    /// HTTP status code the error was derived from, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Validation(error) => Some(error.status_code()),
            Self::Authentication(_) => Some(401),
            Self::UpgradeRequired(_) => Some(426),
            Self::RateLimit(_) => Some(429),
            Self::Server(_) => Some(500),
            Self::DownForMaintenance(_) => Some(503),
            Self::Http(error) => error.status().map(|status| status.as_u16()),
            _ => None,
        }
    }

    /// The validation error tree, if this is a validation failure
    pub fn as_validation(&self) -> Option<&ErrorWithResponse> {
        match self {
            Self::Validation(error) => Some(error),
            _ => None,
        }
    }

    /// Whether the error was produced without reaching the gateway's business logic
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_))
    }
}

impl From<ErrorWithResponse> for BraintreeError {
    fn from(error: ErrorWithResponse) -> Self {
        Self::Validation(error)
    }
}
