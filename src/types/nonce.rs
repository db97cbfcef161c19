//! Payment method nonces
//!
//! A nonce is the gateway's opaque, single-use reference to a tokenized instrument.
//! Records are decoded by their `type` discriminator into a closed set of variants.
//!
//! List responses are decoded per item: a record that cannot be decoded is logged and
//! skipped while the remaining records are still returned in their original order.

use super::constants::response_keys;
use crate::{BraintreeError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Discriminator of a payment method record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentMethodType {
    Card,
    PayPalAccount,
    AndroidPayCard,
}

impl PaymentMethodType {
    /// Value of the `type` field on the wire
    pub fn type_tag(&self) -> &'static str {
        match self {
            PaymentMethodType::Card => "CreditCard",
            PaymentMethodType::PayPalAccount => "PayPalAccount",
            PaymentMethodType::AndroidPayCard => "AndroidPayCard",
        }
    }

    pub fn from_type_tag(tag: &str) -> Option<Self> {
        match tag {
            "CreditCard" => Some(PaymentMethodType::Card),
            "PayPalAccount" => Some(PaymentMethodType::PayPalAccount),
            "AndroidPayCard" => Some(PaymentMethodType::AndroidPayCard),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentMethodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_tag())
    }
}

/// Card brand and masked digits
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDetails {
    #[serde(rename = "cardType", default)]
    pub card_type: String,
    #[serde(rename = "lastTwo", default)]
    pub last_two: String,
    #[serde(rename = "lastFour", default, skip_serializing_if = "Option::is_none")]
    pub last_four: Option<String>,
}

/// Nonce for a credit or debit card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardNonce {
    nonce: String,
    #[serde(default)]
    description: String,
    #[serde(rename = "default", default)]
    is_default: bool,
    #[serde(default)]
    details: CardDetails,
}

impl CardNonce {
    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Card brand, e.g. "Visa"
    pub fn card_type(&self) -> &str {
        &self.details.card_type
    }

    pub fn last_two(&self) -> &str {
        &self.details.last_two
    }

    pub fn last_four(&self) -> Option<&str> {
        self.details.last_four.as_deref()
    }
}

/// Account details of a PayPal nonce
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PayPalDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "payerInfo", default, skip_serializing_if = "Option::is_none")]
    pub payer_info: Option<Value>,
}

/// Nonce for a PayPal account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayPalAccountNonce {
    nonce: String,
    #[serde(default)]
    description: String,
    #[serde(rename = "default", default)]
    is_default: bool,
    #[serde(default)]
    details: PayPalDetails,
}

impl PayPalAccountNonce {
    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn email(&self) -> Option<&str> {
        self.details.email.as_deref()
    }

    pub fn payer_info(&self) -> Option<&Value> {
        self.details.payer_info.as_ref()
    }
}

/// Nonce for a card provisioned through Android Pay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AndroidPayCardNonce {
    nonce: String,
    #[serde(default)]
    description: String,
    #[serde(rename = "default", default)]
    is_default: bool,
    #[serde(default)]
    details: CardDetails,
}

impl AndroidPayCardNonce {
    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn card_type(&self) -> &str {
        &self.details.card_type
    }

    pub fn last_two(&self) -> &str {
        &self.details.last_two
    }
}

/// Any nonce the gateway can issue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PaymentMethodNonce {
    #[serde(rename = "CreditCard")]
    Card(CardNonce),
    #[serde(rename = "PayPalAccount")]
    PayPalAccount(PayPalAccountNonce),
    #[serde(rename = "AndroidPayCard")]
    AndroidPayCard(AndroidPayCardNonce),
}

impl PaymentMethodNonce {
    /// Decode a record using its `type` discriminator
    pub fn from_value(value: Value) -> Result<Self> {
        let tag = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| BraintreeError::unexpected("Payment method record has no type"))?;

        let payment_type = PaymentMethodType::from_type_tag(tag).ok_or_else(|| {
            BraintreeError::unexpected(format!("Unknown payment method type: {}", tag))
        })?;

        Self::from_value_as(payment_type, value)
    }

    /// Decode a record as a known variant, ignoring any `type` field
    pub fn from_value_as(payment_type: PaymentMethodType, value: Value) -> Result<Self> {
        let decoded = match payment_type {
            PaymentMethodType::Card => serde_json::from_value(value).map(Self::Card),
            PaymentMethodType::PayPalAccount => {
                serde_json::from_value(value).map(Self::PayPalAccount)
            }
            PaymentMethodType::AndroidPayCard => {
                serde_json::from_value(value).map(Self::AndroidPayCard)
            }
        };

        let nonce = decoded.map_err(|e| {
            BraintreeError::unexpected(format!(
                "Unable to decode {} record: {}",
                payment_type, e
            ))
        })?;

        if nonce.nonce().is_empty() {
            return Err(BraintreeError::unexpected(format!(
                "{} record has an empty nonce",
                payment_type
            )));
        }

        Ok(nonce)
    }

    pub fn payment_type(&self) -> PaymentMethodType {
        match self {
            Self::Card(_) => PaymentMethodType::Card,
            Self::PayPalAccount(_) => PaymentMethodType::PayPalAccount,
            Self::AndroidPayCard(_) => PaymentMethodType::AndroidPayCard,
        }
    }

    /// The nonce string to send to the merchant's server
    pub fn nonce(&self) -> &str {
        match self {
            Self::Card(n) => n.nonce(),
            Self::PayPalAccount(n) => n.nonce(),
            Self::AndroidPayCard(n) => n.nonce(),
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Self::Card(n) => n.description(),
            Self::PayPalAccount(n) => n.description(),
            Self::AndroidPayCard(n) => n.description(),
        }
    }

    /// Short display label: the card brand, "PayPal" or "Android Pay"
    pub fn type_label(&self) -> &str {
        match self {
            Self::Card(n) if n.card_type().is_empty() => "Unknown",
            Self::Card(n) => n.card_type(),
            Self::PayPalAccount(_) => "PayPal",
            Self::AndroidPayCard(_) => "Android Pay",
        }
    }

    /// Whether this is the customer's default payment method
    pub fn is_default(&self) -> bool {
        match self {
            Self::Card(n) => n.is_default,
            Self::PayPalAccount(n) => n.is_default,
            Self::AndroidPayCard(n) => n.is_default,
        }
    }

    pub fn as_card(&self) -> Option<&CardNonce> {
        match self {
            Self::Card(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_paypal_account(&self) -> Option<&PayPalAccountNonce> {
        match self {
            Self::PayPalAccount(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_android_pay_card(&self) -> Option<&AndroidPayCardNonce> {
        match self {
            Self::AndroidPayCard(n) => Some(n),
            _ => None,
        }
    }
}

/// Decode every record, keeping successes in order and collecting failures separately
pub fn decode_records(
    records: Vec<Value>,
) -> (Vec<PaymentMethodNonce>, Vec<(usize, BraintreeError)>) {
    let mut nonces = Vec::with_capacity(records.len());
    let mut failures = Vec::new();

    for (index, record) in records.into_iter().enumerate() {
        match PaymentMethodNonce::from_value(record) {
            Ok(nonce) => nonces.push(nonce),
            Err(e) => failures.push((index, e)),
        }
    }

    (nonces, failures)
}

/// Parse a payment method list response.
///
/// Accepts `{"paymentMethods": [...]}` or a bare array. Only a malformed envelope is an
/// error; undecodable records are skipped.
pub fn parse_payment_methods(body: &str) -> Result<Vec<PaymentMethodNonce>> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| BraintreeError::unexpected(format!("Malformed payment methods response: {}", e)))?;

    let records = match value {
        Value::Array(records) => records,
        Value::Object(mut object) => match object.remove(response_keys::PAYMENT_METHODS) {
            Some(Value::Array(records)) => records,
            _ => {
                return Err(BraintreeError::unexpected(
                    "Payment methods response is missing the paymentMethods array",
                ))
            }
        },
        _ => {
            return Err(BraintreeError::unexpected(
                "Payment methods response is not a JSON object or array",
            ))
        }
    };

    let (nonces, failures) = decode_records(records);
    for (index, error) in &failures {
        tracing::warn!("Skipping payment method record {}: {}", index, error);
    }

    Ok(nonces)
}

/// Parse a tokenization response, taking the first record under `response_key`.
///
/// Records without a `type` field are decoded as `expected`.
pub fn parse_tokenization_response(
    body: &str,
    response_key: &str,
    expected: PaymentMethodType,
) -> Result<PaymentMethodNonce> {
    let mut value: Value = serde_json::from_str(body)
        .map_err(|e| BraintreeError::unexpected(format!("Malformed tokenization response: {}", e)))?;

    let record = match value.get_mut(response_key).map(Value::take) {
        Some(Value::Array(records)) => records.into_iter().next(),
        _ => None,
    }
    .ok_or_else(|| {
        BraintreeError::unexpected(format!(
            "Tokenization response did not contain any {}",
            response_key
        ))
    })?;

    let nonce = if record.get("type").is_some() {
        PaymentMethodNonce::from_value(record)?
    } else {
        PaymentMethodNonce::from_value_as(expected, record)?
    };

    if nonce.payment_type() != expected {
        return Err(BraintreeError::unexpected(format!(
            "Expected a {} nonce but the gateway returned a {}",
            expected,
            nonce.payment_type()
        )));
    }

    Ok(nonce)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn card_record() -> Value {
        json!({
            "type": "CreditCard",
            "nonce": "123456-12345-12345-a-adfa",
            "description": "ending in ••11",
            "default": true,
            "details": { "cardType": "Visa", "lastTwo": "11", "lastFour": "1111" }
        })
    }

    fn paypal_record() -> Value {
        json!({
            "type": "PayPalAccount",
            "nonce": "aaaaaa-bbbbbbb-109934023-1",
            "description": "with email paypal@example.com",
            "default": false,
            "details": { "email": "paypal@example.com" }
        })
    }

    fn android_pay_record() -> Value {
        json!({
            "type": "AndroidPayCard",
            "nonce": "fake-android-pay-nonce",
            "description": "Android Pay",
            "details": { "cardType": "Visa", "lastTwo": "11" }
        })
    }

    #[test]
    fn test_decodes_card() {
        let nonce = PaymentMethodNonce::from_value(card_record()).unwrap();
        let card = nonce.as_card().unwrap();

        assert_eq!(card.last_two(), "11");
        assert_eq!(card.last_four(), Some("1111"));
        assert_eq!(nonce.type_label(), "Visa");
        assert_eq!(nonce.nonce(), "123456-12345-12345-a-adfa");
        assert_eq!(nonce.description(), "ending in ••11");
        assert!(nonce.is_default());
    }

    #[test]
    fn test_decodes_heterogeneous_list_in_order() {
        let body = json!({
            "paymentMethods": [card_record(), paypal_record(), android_pay_record()]
        })
        .to_string();

        let nonces = parse_payment_methods(&body).unwrap();

        assert_eq!(nonces.len(), 3);
        assert_eq!(nonces[0].as_card().unwrap().last_two(), "11");
        assert_eq!(nonces[1].type_label(), "PayPal");
        assert_eq!(
            nonces[1].as_paypal_account().unwrap().email(),
            Some("paypal@example.com")
        );
        assert_eq!(nonces[2].as_android_pay_card().unwrap().last_two(), "11");
        assert_eq!(nonces[2].type_label(), "Android Pay");
    }

    #[test]
    fn test_bare_array_and_empty_list() {
        let body = json!([paypal_record()]).to_string();
        assert_eq!(parse_payment_methods(&body).unwrap().len(), 1);

        let empty = json!({ "paymentMethods": [] }).to_string();
        assert!(parse_payment_methods(&empty).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_type_is_descriptive_error() {
        let error = PaymentMethodNonce::from_value(json!({
            "type": "BitcoinWallet",
            "nonce": "abc"
        }))
        .unwrap_err();

        assert!(matches!(error, BraintreeError::Unexpected(_)));
        assert_eq!(error.to_string(), "Unknown payment method type: BitcoinWallet");
    }

    #[test]
    fn test_list_skips_undecodable_records() {
        let records = vec![
            card_record(),
            json!({ "type": "BitcoinWallet", "nonce": "abc" }),
            json!({ "nonce": "no-type" }),
            android_pay_record(),
        ];

        let (nonces, failures) = decode_records(records);

        assert_eq!(nonces.len(), 2);
        assert_eq!(nonces[0].payment_type(), PaymentMethodType::Card);
        assert_eq!(nonces[1].payment_type(), PaymentMethodType::AndroidPayCard);
        assert_eq!(
            failures.iter().map(|(i, _)| *i).collect::<Vec<_>>(),
            vec![1, 2]
        );
    }

    #[test]
    fn test_malformed_envelope_is_an_error() {
        assert!(parse_payment_methods("").is_err());
        assert!(parse_payment_methods(r#"{"other": []}"#).is_err());
        assert!(parse_payment_methods("42").is_err());
    }

    #[test]
    fn test_empty_nonce_is_rejected() {
        let error = PaymentMethodNonce::from_value(json!({
            "type": "CreditCard",
            "nonce": ""
        }))
        .unwrap_err();
        assert!(error.to_string().contains("empty nonce"));
    }

    #[test]
    fn test_tokenization_response_falls_back_to_expected_type() {
        let body = json!({
            "paypalAccounts": [{
                "nonce": "fake-paypal-nonce",
                "description": "PayPal",
                "details": { "email": "jane@example.com" }
            }]
        })
        .to_string();

        let nonce =
            parse_tokenization_response(&body, "paypalAccounts", PaymentMethodType::PayPalAccount)
                .unwrap();

        assert_eq!(nonce.type_label(), "PayPal");
        assert_eq!(nonce.nonce(), "fake-paypal-nonce");
    }

    #[test]
    fn test_tokenization_response_rejects_mismatched_type() {
        let body = json!({ "creditCards": [paypal_record()] }).to_string();

        let error =
            parse_tokenization_response(&body, "creditCards", PaymentMethodType::Card).unwrap_err();

        assert!(matches!(error, BraintreeError::Unexpected(_)));
        assert_eq!(
            error.to_string(),
            "Expected a CreditCard nonce but the gateway returned a PayPalAccount"
        );
    }

    #[test]
    fn test_tokenization_response_without_records() {
        let error = parse_tokenization_response(
            r#"{"creditCards": []}"#,
            "creditCards",
            PaymentMethodType::Card,
        )
        .unwrap_err();
        assert!(matches!(error, BraintreeError::Unexpected(_)));

        let error =
            parse_tokenization_response("<html>", "creditCards", PaymentMethodType::Card)
                .unwrap_err();
        assert!(error.to_string().starts_with("Malformed tokenization response"));
    }

    #[test]
    fn test_serializes_with_type_tag() {
        let nonce = PaymentMethodNonce::from_value(card_record()).unwrap();
        let value = serde_json::to_value(&nonce).unwrap();
        assert_eq!(value["type"], "CreditCard");
        assert_eq!(value["details"]["lastTwo"], "11");
    }
}
