//! Shared fixtures and collaborator spies for unit tests

use crate::analytics::SessionIdProvider;
use crate::http::{parse_response, HttpClient};
use crate::types::{Authorization, Configuration};
use crate::Result;
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use http::StatusCode;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

pub(crate) const TOKENIZATION_KEY: &str = "sandbox_fjajdkd_integration_merchant_id";

pub(crate) const CLIENT_TOKEN_FINGERPRINT: &str =
    "a1b2c3|created_at=2016-01-01T00:00:00&customer_id=customer-123&public_key=pk";

pub(crate) fn client_token() -> String {
    let token = json!({
        "configUrl": "https://api.sandbox.braintreegateway.com/merchants/integration_merchant_id/client_api/v1/configuration",
        "authorizationFingerprint": CLIENT_TOKEN_FINGERPRINT
    });
    general_purpose::STANDARD.encode(token.to_string())
}

pub(crate) fn tokenization_key_authorization() -> Authorization {
    Authorization::from_string(TOKENIZATION_KEY).unwrap()
}

pub(crate) fn client_token_authorization() -> Authorization {
    Authorization::from_string(&client_token()).unwrap()
}

pub(crate) fn configuration(analytics_enabled: bool) -> Configuration {
    let configuration = Configuration::new("https://api.example.com/client_api");
    if analytics_enabled {
        configuration.with_analytics_url("https://client-analytics.example.com")
    } else {
        configuration
    }
}

pub(crate) fn visa_credit_card_response() -> String {
    json!({
        "creditCards": [{
            "type": "CreditCard",
            "nonce": "123456-12345-12345-a-adfa",
            "description": "ending in ••11",
            "default": false,
            "isLocked": false,
            "securityQuestions": [],
            "details": { "cardType": "Visa", "lastTwo": "11", "lastFour": "1111" }
        }]
    })
    .to_string()
}

pub(crate) fn paypal_account_response() -> String {
    json!({
        "paypalAccounts": [{
            "type": "PayPalAccount",
            "nonce": "aaaaaa-bbbbbbb-109934023-1",
            "description": "PayPal",
            "default": false,
            "details": { "email": "paypalaccount@example.com" }
        }]
    })
    .to_string()
}

pub(crate) fn get_payment_methods_response() -> String {
    json!({
        "paymentMethods": [
            {
                "type": "CreditCard",
                "nonce": "123456-12345-12345-a-adfa",
                "description": "ending in ••11",
                "default": true,
                "details": { "cardType": "Visa", "lastTwo": "11" }
            },
            {
                "type": "PayPalAccount",
                "nonce": "aaaaaa-bbbbbbb-109934023-1",
                "description": "with email paypal@applicationest.com",
                "default": false,
                "details": { "email": "paypal@applicationest.com" }
            },
            {
                "type": "AndroidPayCard",
                "nonce": "fake-android-pay-nonce",
                "description": "Android Pay",
                "default": false,
                "details": { "cardType": "Visa", "lastTwo": "11" }
            }
        ]
    })
    .to_string()
}

pub(crate) fn credit_card_error_response() -> String {
    json!({
        "error": { "message": "Credit card is invalid" },
        "fieldErrors": [{
            "field": "creditCard",
            "fieldErrors": [
                {
                    "field": "base",
                    "message": "Credit card must include number, payment_method_nonce, or venmo_sdk_payment_method_code",
                    "code": "81813"
                },
                { "field": "expirationYear", "message": "Expiration year is invalid", "code": "81713" },
                { "field": "number", "message": "Credit card number is required", "code": "81714" }
            ]
        }]
    })
    .to_string()
}

/// A request observed by [`MockHttpClient`]
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecordedRequest {
    pub method: &'static str,
    pub path: String,
    pub body: Option<String>,
}

impl RecordedRequest {
    pub fn json_body(&self) -> Value {
        self.body
            .as_deref()
            .and_then(|body| serde_json::from_str(body).ok())
            .unwrap_or(Value::Null)
    }
}

type Responder = Box<dyn Fn(&RecordedRequest) -> Result<String> + Send + Sync>;

/// [`HttpClient`] spy that records every call and answers from a closure
pub(crate) struct MockHttpClient {
    responder: Responder,
    calls: Mutex<Vec<RecordedRequest>>,
}

impl MockHttpClient {
    pub fn new(responder: impl Fn(&RecordedRequest) -> Result<String> + Send + Sync + 'static) -> Self {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answer every request with `status` and `body`, classified like a real response
    pub fn responding(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let status = StatusCode::from_u16(status).unwrap();
        Self::new(move |_| parse_response(status, body.clone()))
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn calls(&self) -> Vec<RecordedRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn respond(&self, request: RecordedRequest) -> Result<String> {
        let result = (self.responder)(&request);
        self.calls.lock().unwrap().push(request);
        result
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn get(&self, path: &str) -> Result<String> {
        self.respond(RecordedRequest {
            method: "GET",
            path: path.to_string(),
            body: None,
        })
    }

    async fn post(&self, path: &str, body: String) -> Result<String> {
        self.respond(RecordedRequest {
            method: "POST",
            path: path.to_string(),
            body: Some(body),
        })
    }
}

/// Session id provider returning a fixed id
pub(crate) struct FixedSessionId(pub &'static str);

impl SessionIdProvider for FixedSessionId {
    fn session_id(&self) -> String {
        self.0.to_string()
    }
}
