//! Payment method builders
//!
//! A builder holds the raw instrument data a customer entered and knows how to serialize
//! itself into a tokenization request. Builders are plain values: once handed to the
//! tokenization client they are only read.

use super::constants::{meta, paths, response_keys};
use super::nonce::PaymentMethodType;
use crate::Result;
use serde::Serialize;
use serde_json::{json, Map, Value};

/// The `_meta` object attached to every tokenization request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metadata {
    /// Per-session correlation id
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub integration: String,
    pub source: String,
    pub platform: String,
    #[serde(rename = "sdkVersion")]
    pub sdk_version: String,
}

impl Metadata {
    /// Create metadata with the default integration and source
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            integration: meta::INTEGRATION.to_string(),
            source: meta::SOURCE.to_string(),
            platform: meta::PLATFORM.to_string(),
            sdk_version: crate::VERSION.to_string(),
        }
    }

    /// Set the integration type (e.g. "custom", "dropin")
    pub fn with_integration(mut self, integration: impl Into<String>) -> Self {
        self.integration = integration.into();
        self
    }

    /// Set the source of the payment data (e.g. "form", "paypal-browser")
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
struct ValidateOptions {
    validate: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
struct BillingAddress {
    #[serde(rename = "postalCode")]
    postal_code: String,
}

/// Credit or debit card
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CardBuilder {
    #[serde(skip_serializing_if = "Option::is_none")]
    number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cvv: Option<String>,
    #[serde(rename = "expirationMonth", skip_serializing_if = "Option::is_none")]
    expiration_month: Option<String>,
    #[serde(rename = "expirationYear", skip_serializing_if = "Option::is_none")]
    expiration_year: Option<String>,
    #[serde(rename = "expirationDate", skip_serializing_if = "Option::is_none")]
    expiration_date: Option<String>,
    #[serde(rename = "cardholderName", skip_serializing_if = "Option::is_none")]
    cardholder_name: Option<String>,
    #[serde(rename = "billingAddress", skip_serializing_if = "Option::is_none")]
    billing_address: Option<BillingAddress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<ValidateOptions>,
}

impl CardBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.number = Some(number.into());
        self
    }

    pub fn with_cvv(mut self, cvv: impl Into<String>) -> Self {
        self.cvv = Some(cvv.into());
        self
    }

    pub fn with_expiration_month(mut self, month: impl Into<String>) -> Self {
        self.expiration_month = Some(month.into());
        self
    }

    pub fn with_expiration_year(mut self, year: impl Into<String>) -> Self {
        self.expiration_year = Some(year.into());
        self
    }

    /// Expiration as a single `MM/YY` or `MM/YYYY` string
    pub fn with_expiration_date(mut self, date: impl Into<String>) -> Self {
        self.expiration_date = Some(date.into());
        self
    }

    pub fn with_cardholder_name(mut self, name: impl Into<String>) -> Self {
        self.cardholder_name = Some(name.into());
        self
    }

    pub fn with_postal_code(mut self, postal_code: impl Into<String>) -> Self {
        self.billing_address = Some(BillingAddress {
            postal_code: postal_code.into(),
        });
        self
    }

    /// Ask the gateway to verify the card with the issuer before vaulting it
    pub fn with_validate(mut self, validate: bool) -> Self {
        self.options = Some(ValidateOptions { validate });
        self
    }

    pub fn number(&self) -> Option<&str> {
        self.number.as_deref()
    }
}

/// PayPal account authorized through a one-touch flow
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PayPalAccountBuilder {
    /// Response of the PayPal one-touch flow, forwarded verbatim
    #[serde(flatten)]
    one_touch_core_data: Map<String, Value>,
    #[serde(rename = "correlationId", skip_serializing_if = "Option::is_none")]
    client_metadata_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    intent: Option<String>,
    options: ValidateOptions,
    #[serde(skip)]
    merchant_account_id: Option<String>,
}

impl PayPalAccountBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the one-touch response. Non-object values are ignored.
    pub fn with_one_touch_core_data(mut self, data: Value) -> Self {
        match data {
            Value::Object(map) => self.one_touch_core_data = map,
            other => tracing::warn!("Ignoring non-object one-touch data: {}", other),
        }
        self
    }

    pub fn with_client_metadata_id(mut self, id: impl Into<String>) -> Self {
        self.client_metadata_id = Some(id.into());
        self
    }

    /// Payment intent, "authorize" or "sale"
    pub fn with_intent(mut self, intent: impl Into<String>) -> Self {
        self.intent = Some(intent.into());
        self
    }

    pub fn with_merchant_account_id(mut self, id: impl Into<String>) -> Self {
        self.merchant_account_id = Some(id.into());
        self
    }

    pub fn with_validate(mut self, validate: bool) -> Self {
        self.options = ValidateOptions { validate };
        self
    }
}

/// Card provisioned through Android Pay
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AndroidPayCardBuilder {
    #[serde(rename = "googleTransactionId", skip_serializing_if = "Option::is_none")]
    google_transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(rename = "cardNetwork", skip_serializing_if = "Option::is_none")]
    card_network: Option<String>,
}

impl AndroidPayCardBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_google_transaction_id(mut self, id: impl Into<String>) -> Self {
        self.google_transaction_id = Some(id.into());
        self
    }

    /// Encrypted payment token issued by the wallet
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_card_network(mut self, network: impl Into<String>) -> Self {
        self.card_network = Some(network.into());
        self
    }
}

/// Any instrument that can be tokenized
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentMethodBuilder {
    Card(CardBuilder),
    PayPalAccount(PayPalAccountBuilder),
    AndroidPayCard(AndroidPayCardBuilder),
}

impl PaymentMethodBuilder {
    /// Nonce variant the gateway is expected to return
    pub fn payment_type(&self) -> PaymentMethodType {
        match self {
            Self::Card(_) => PaymentMethodType::Card,
            Self::PayPalAccount(_) => PaymentMethodType::PayPalAccount,
            Self::AndroidPayCard(_) => PaymentMethodType::AndroidPayCard,
        }
    }

    /// Tokenization endpoint
    pub fn api_path(&self) -> &'static str {
        match self {
            Self::Card(_) => paths::CREDIT_CARDS,
            Self::PayPalAccount(_) => paths::PAYPAL_ACCOUNTS,
            Self::AndroidPayCard(_) => paths::ANDROID_PAY_CARDS,
        }
    }

    /// Key of the nonce array in the tokenization response
    pub fn response_key(&self) -> &'static str {
        match self {
            Self::Card(_) => response_keys::CREDIT_CARDS,
            Self::PayPalAccount(_) => response_keys::PAYPAL_ACCOUNTS,
            Self::AndroidPayCard(_) => response_keys::ANDROID_PAY_CARDS,
        }
    }

    /// Prefix of the analytics events recorded for this instrument
    pub fn analytics_type(&self) -> &'static str {
        match self {
            Self::Card(_) => "card",
            Self::PayPalAccount(_) => "paypal",
            Self::AndroidPayCard(_) => "android-pay",
        }
    }

    /// Request payload, including `_meta`
    pub fn build_payload(&self, metadata: &Metadata) -> Result<Value> {
        let mut payload = match self {
            Self::Card(card) => json!({ "creditCard": card }),
            Self::PayPalAccount(paypal) => {
                let mut payload = json!({ "paypalAccount": paypal });
                if let Some(id) = &paypal.merchant_account_id {
                    payload["merchant_account_id"] = Value::String(id.clone());
                }
                payload
            }
            Self::AndroidPayCard(android_pay) => json!({ "androidPayCard": android_pay }),
        };

        payload["_meta"] = serde_json::to_value(metadata)?;
        Ok(payload)
    }

    /// Serialized request body
    pub fn to_json(&self, metadata: &Metadata) -> Result<String> {
        Ok(serde_json::to_string(&self.build_payload(metadata)?)?)
    }
}

impl From<CardBuilder> for PaymentMethodBuilder {
    fn from(builder: CardBuilder) -> Self {
        Self::Card(builder)
    }
}

impl From<PayPalAccountBuilder> for PaymentMethodBuilder {
    fn from(builder: PayPalAccountBuilder) -> Self {
        Self::PayPalAccount(builder)
    }
}

impl From<AndroidPayCardBuilder> for PaymentMethodBuilder {
    fn from(builder: AndroidPayCardBuilder) -> Self {
        Self::AndroidPayCard(builder)
    }
}
