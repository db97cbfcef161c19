//! Core types for the Braintree client
//!
//! This module defines the values that flow through a tokenization: the credential used
//! to authorize requests, the merchant configuration, the builders that describe raw
//! payment instruments, the nonces the gateway returns, and the validation error tree.
//!
//! # Architecture
//!
//! - [`authorization`] - Client token and tokenization key parsing
//! - [`configuration`] - Merchant configuration snapshot
//! - [`builder`] - Payment method builders and request `_meta`
//! - [`nonce`] - Payment method nonces and response decoding
//! - [`error_response`] - Gateway validation errors (`422`)
//! - [`constants`] - Client API paths and wire constants
//!
//! # Examples
//!
//! ## Building a card tokenization payload
//!
//! ```
//! use rust_braintree::types::{CardBuilder, Metadata, PaymentMethodBuilder};
//!
//! # fn example() -> rust_braintree::Result<()> {
//! let builder: PaymentMethodBuilder = CardBuilder::new()
//!     .with_number("4111111111111111")
//!     .with_expiration_date("08/20")
//!     .into();
//!
//! let body = builder.to_json(&Metadata::new("session-id"))?;
//! assert!(body.contains("\"sessionId\":\"session-id\""));
//! # Ok(())
//! # }
//! ```
//!
//! ## Decoding a vaulted payment method list
//!
//! ```
//! use rust_braintree::types::parse_payment_methods;
//!
//! # fn example() -> rust_braintree::Result<()> {
//! let body = r#"{"paymentMethods": [
//!     {"type": "PayPalAccount", "nonce": "fake-nonce", "details": {"email": "jane@example.com"}}
//! ]}"#;
//!
//! let nonces = parse_payment_methods(body)?;
//! assert_eq!(nonces[0].type_label(), "PayPal");
//! # Ok(())
//! # }
//! ```
//!
//! ## Inspecting a validation error
//!
//! ```
//! use rust_braintree::types::ErrorWithResponse;
//!
//! let error = ErrorWithResponse::from_json(422, r#"{
//!     "error": {"message": "Credit card is invalid"},
//!     "fieldErrors": [{"field": "creditCard", "fieldErrors": [
//!         {"field": "number", "message": "Credit card number is required"}
//!     ]}]
//! }"#);
//!
//! let number = error.error_for("creditCard").and_then(|e| e.error_for("number"));
//! assert_eq!(number.and_then(|e| e.message()), Some("Credit card number is required"));
//! ```

pub mod authorization;
pub mod builder;
pub mod configuration;
pub mod constants;
pub mod error_response;
pub mod nonce;

// Re-export commonly used types
pub use authorization::{Authorization, ClientToken, Environment, TokenizationKey};
pub use builder::{
    AndroidPayCardBuilder, CardBuilder, Metadata, PayPalAccountBuilder, PaymentMethodBuilder,
};
pub use configuration::{Configuration, Feature};
pub use error_response::{ErrorWithResponse, FieldError};
pub use nonce::{
    parse_payment_methods, parse_tokenization_response, AndroidPayCardNonce, CardDetails,
    CardNonce, PayPalAccountNonce, PayPalDetails, PaymentMethodNonce, PaymentMethodType,
};
