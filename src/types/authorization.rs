//! Authorization credentials
//!
//! The gateway accepts two credentials. A [`TokenizationKey`] is a static, low-privilege
//! key that may create nonces but never read existing ones. A [`ClientToken`] is minted
//! by the merchant's server per customer session and may do both.

use crate::{BraintreeError, Result};
use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Path of the configuration endpoint relative to the client API root
pub const CONFIGURATION_PATH: &str = "v1/configuration";

/// Gateway environment a tokenization key belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Environment {
    Development,
    Sandbox,
    Production,
}

impl Environment {
    /// Environment identifier as it appears in a tokenization key
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Sandbox => "sandbox",
            Environment::Production => "production",
        }
    }

    /// Gateway root URL for this environment
    pub fn base_url(&self) -> &'static str {
        match self {
            Environment::Development => "http://localhost:3000/",
            Environment::Sandbox => "https://api.sandbox.braintreegateway.com/",
            Environment::Production => "https://api.braintreegateway.com/",
        }
    }
}

impl FromStr for Environment {
    type Err = BraintreeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "development" => Ok(Environment::Development),
            "sandbox" => Ok(Environment::Sandbox),
            "production" => Ok(Environment::Production),
            _ => Err(BraintreeError::invalid_argument(
                "Tokenization Key contained invalid environment",
            )),
        }
    }
}

/// Static merchant key of the form `<environment>_<id>_<merchantId>`
#[derive(Clone, PartialEq, Eq)]
pub struct TokenizationKey {
    key: String,
    environment: Environment,
    merchant_id: String,
}

impl TokenizationKey {
    /// Whether `value` has the shape of a tokenization key
    pub fn matches(value: &str) -> bool {
        let parts: Vec<&str> = value.splitn(3, '_').collect();
        if parts.len() != 3 || parts.iter().any(|part| part.is_empty()) {
            return false;
        }

        let word = |part: &str| part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        word(parts[0]) && parts[1].chars().all(|c| c.is_ascii_alphanumeric()) && word(parts[2])
    }

    /// The full key, sent as the `Client-Key` header
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Environment encoded in the key
    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Merchant the key belongs to
    pub fn merchant_id(&self) -> &str {
        &self.merchant_id
    }

    /// Client API root for this merchant
    pub fn base_url(&self) -> String {
        format!(
            "{}merchants/{}/client_api/",
            self.environment.base_url(),
            self.merchant_id
        )
    }
}

impl FromStr for TokenizationKey {
    type Err = BraintreeError;

    fn from_str(s: &str) -> Result<Self> {
        if !Self::matches(s) {
            return Err(BraintreeError::invalid_argument(
                "Tokenization Key is not in the expected format",
            ));
        }

        let mut parts = s.splitn(3, '_');
        let environment = parts.next().unwrap_or_default().parse()?;
        let merchant_id = parts.nth(1).unwrap_or_default().to_string();

        Ok(Self {
            key: s.to_string(),
            environment,
            merchant_id,
        })
    }
}

impl fmt::Debug for TokenizationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenizationKey")
            .field("environment", &self.environment)
            .field("merchant_id", &self.merchant_id)
            .field("key", &"<redacted>")
            .finish()
    }
}

#[derive(Deserialize)]
struct RawClientToken {
    #[serde(rename = "authorizationFingerprint")]
    authorization_fingerprint: String,
    #[serde(rename = "configUrl")]
    config_url: String,
    #[serde(rename = "clientApiUrl", default)]
    client_api_url: Option<String>,
}

/// Server-minted, base64 encoded JSON credential
#[derive(Clone, PartialEq, Eq)]
pub struct ClientToken {
    raw: String,
    authorization_fingerprint: String,
    config_url: String,
    client_api_url: Option<String>,
    customer_id: Option<String>,
}

impl ClientToken {
    /// Fingerprint attached to every request made with this token
    pub fn authorization_fingerprint(&self) -> &str {
        &self.authorization_fingerprint
    }

    /// Customer the token was minted for, if any
    pub fn customer_id(&self) -> Option<&str> {
        self.customer_id.as_deref()
    }

    /// URL of the configuration endpoint
    pub fn config_url(&self) -> &str {
        &self.config_url
    }

    /// Client API root, taken from the token or derived from the configuration URL
    pub fn base_url(&self) -> String {
        match &self.client_api_url {
            Some(url) => format!("{}/", url.trim_end_matches('/')),
            None => self
                .config_url
                .strip_suffix(CONFIGURATION_PATH)
                .unwrap_or(&self.config_url)
                .to_string(),
        }
    }

    /// The token exactly as supplied by the caller
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for ClientToken {
    type Err = BraintreeError;

    fn from_str(s: &str) -> Result<Self> {
        let decoded = general_purpose::STANDARD.decode(s.trim())?;
        let token: RawClientToken = serde_json::from_slice(&decoded)?;

        if token.authorization_fingerprint.is_empty() {
            return Err(BraintreeError::invalid_argument(
                "Client token is missing an authorization fingerprint",
            ));
        }

        let customer_id = customer_id_from_fingerprint(&token.authorization_fingerprint);

        Ok(Self {
            raw: s.to_string(),
            authorization_fingerprint: token.authorization_fingerprint,
            config_url: token.config_url,
            client_api_url: token.client_api_url,
            customer_id,
        })
    }
}

impl fmt::Debug for ClientToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientToken")
            .field("config_url", &self.config_url)
            .field("customer_id", &self.customer_id)
            .field("authorization_fingerprint", &"<redacted>")
            .finish()
    }
}

/// Fingerprints look like `<hash>|created_at=...&customer_id=...`
fn customer_id_from_fingerprint(fingerprint: &str) -> Option<String> {
    let (_, params) = fingerprint.split_once('|')?;
    url::form_urlencoded::parse(params.as_bytes())
        .find(|(key, _)| key == "customer_id")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// Credential used to authenticate against the client API
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    ClientToken(ClientToken),
    TokenizationKey(TokenizationKey),
}

impl Authorization {
    /// Parse a caller supplied authorization string.
    ///
    /// Strings shaped like a tokenization key are parsed as one, anything else as a
    /// client token.
    pub fn from_string(value: &str) -> Result<Self> {
        let value = value.trim();
        if value.is_empty() {
            return Err(BraintreeError::invalid_argument(
                "Authorization provided is invalid: empty string",
            ));
        }

        let parsed = if TokenizationKey::matches(value) {
            value.parse().map(Authorization::TokenizationKey)
        } else {
            value.parse().map(Authorization::ClientToken)
        };

        parsed.map_err(|e| {
            BraintreeError::invalid_argument(format!("Authorization provided is invalid: {}", e))
        })
    }

    /// URL of the configuration endpoint for this credential
    pub fn config_url(&self) -> String {
        match self {
            Authorization::ClientToken(token) => token.config_url().to_string(),
            Authorization::TokenizationKey(key) => {
                format!("{}{}", key.base_url(), CONFIGURATION_PATH)
            }
        }
    }

    /// Client API root for this credential
    pub fn base_url(&self) -> String {
        match self {
            Authorization::ClientToken(token) => token.base_url(),
            Authorization::TokenizationKey(key) => key.base_url(),
        }
    }

    /// Whether the credential may read a customer's vaulted payment methods
    pub fn can_fetch_payment_methods(&self) -> bool {
        matches!(self, Authorization::ClientToken(_))
    }

    /// Whether this is a tokenization key
    pub fn is_tokenization_key(&self) -> bool {
        matches!(self, Authorization::TokenizationKey(_))
    }
}

impl FromStr for Authorization {
    type Err = BraintreeError;

    fn from_str(s: &str) -> Result<Self> {
        Authorization::from_string(s)
    }
}
