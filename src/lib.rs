//! # Braintree client for Rust
//!
//! A client-side SDK that turns raw payment instrument data into single-use nonces a
//! merchant's server can charge.
//!
//! ## Features
//!
//! - **Tokenization**: cards, PayPal accounts and Android Pay cards
//! - **Vaulted payment methods**: list a customer's existing nonces with a client token
//! - **Event hub**: per-capability listeners with buffering of events raised while nobody listens
//! - **Validation errors**: the gateway's nested field error tree, addressable by field name
//! - **Analytics**: outcome events gated by the merchant configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rust_braintree::{SessionBuilder, types::CardBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = SessionBuilder::new("sandbox_abcdef_merchant_id")?
//!         .connect()
//!         .await?;
//!
//!     session.add_nonce_created_listener(|nonce| {
//!         println!("{}: {}", nonce.type_label(), nonce.nonce());
//!     });
//!     session.add_error_listener(|error| {
//!         if let Some(validation) = error.as_validation() {
//!             let number = validation.error_for_path(&["creditCard", "number"]);
//!             eprintln!("{:?}", number.and_then(|e| e.message()));
//!         }
//!     });
//!
//!     session.tokenize(
//!         CardBuilder::new()
//!             .with_number("4111111111111111")
//!             .with_expiration_date("08/20"),
//!     );
//!
//!     session.close().await;
//!     Ok(())
//! }
//! ```

pub mod analytics;
pub mod config_provider;
pub mod error;
pub mod http;
pub mod hub;
pub mod session;
pub mod tokenization;
pub mod types;

#[cfg(test)]
mod test_support;

// Re-exports for convenience
pub use analytics::{AnalyticsSink, SessionIdProvider};
pub use config_provider::{ConfigurationProvider, RemoteConfigurationProvider};
pub use error::{BraintreeError, Result, TOKENIZATION_KEY_NOT_ALLOWED};
pub use crate::http::{BraintreeHttpClient, HttpClient, HttpClientConfig};
pub use hub::{Capability, EventHub, ListenerId};
pub use session::{Session, SessionBuilder};
pub use tokenization::TokenizationClient;
pub use types::*;

/// Current version of the library, sent as `_meta.sdkVersion`
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
