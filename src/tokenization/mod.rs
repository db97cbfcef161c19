//! Tokenization orchestration
//!
//! [`TokenizationClient`] turns a [`PaymentMethodBuilder`] into a [`PaymentMethodNonce`]
//! by posting the builder's payload to the client API, and lists the nonces already vaulted
//! for a customer.
//!
//! Every call resolves to exactly one `Result`. Transport failures, error statuses and
//! undecodable bodies all come back as a [`BraintreeError`]; nothing panics past this
//! boundary. Each tokenization records exactly one analytics event for its outcome.
//!
//! # Examples
//!
//! ```no_run
//! use rust_braintree::analytics::{Analytics, UuidSessionId};
//! use rust_braintree::http::{BraintreeHttpClient, HttpClientConfig};
//! use rust_braintree::tokenization::TokenizationClient;
//! use rust_braintree::types::{Authorization, CardBuilder};
//! use std::sync::Arc;
//!
//! # async fn example() -> rust_braintree::Result<()> {
//! let authorization = Authorization::from_string("sandbox_abcdef_merchant_id")?;
//! let http = BraintreeHttpClient::new(authorization.clone(), HttpClientConfig::default())?;
//!
//! let client = TokenizationClient::new(
//!     Arc::new(http),
//!     authorization,
//!     Arc::new(UuidSessionId::new()),
//!     Analytics::disabled(),
//! );
//!
//! let card = CardBuilder::new()
//!     .with_number("4111111111111111")
//!     .with_expiration_date("08/20");
//!
//! let nonce = client.tokenize(&card.into()).await?;
//! println!("Tokenized {}: {}", nonce.type_label(), nonce.nonce());
//! # Ok(())
//! # }
//! ```

use crate::analytics::{Analytics, SessionIdProvider};
use crate::http::HttpClient;
use crate::types::constants::{analytics as events, paths};
use crate::types::{
    parse_payment_methods, parse_tokenization_response, Authorization, Metadata,
    PaymentMethodBuilder, PaymentMethodNonce,
};
use crate::{BraintreeError, Result};
use std::sync::Arc;


/// Orchestrates tokenization requests for one authorization
#[derive(Clone)]
pub struct TokenizationClient {
    http: Arc<dyn HttpClient>,
    authorization: Authorization,
    session_id: Arc<dyn SessionIdProvider>,
    analytics: Analytics,
}

impl std::fmt::Debug for TokenizationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenizationClient")
            .field("authorization", &self.authorization)
            .field("analytics", &self.analytics)
            .finish()
    }
}

impl TokenizationClient {
    pub fn new(
        http: Arc<dyn HttpClient>,
        authorization: Authorization,
        session_id: Arc<dyn SessionIdProvider>,
        analytics: Analytics,
    ) -> Self {
        Self {
            http,
            authorization,
            session_id,
            analytics,
        }
    }

    pub fn authorization(&self) -> &Authorization {
        &self.authorization
    }

    pub fn analytics(&self) -> &Analytics {
        &self.analytics
    }

    /// Correlation id sent in `_meta`
    pub fn session_id(&self) -> String {
        self.session_id.session_id()
    }

    /// Tokenize a payment method.
    ///
    /// Records `<type>.nonce-received` or `<type>.nonce-failed` exactly once.
    pub async fn tokenize(&self, builder: &PaymentMethodBuilder) -> Result<PaymentMethodNonce> {
        let result = self.send_tokenization(builder).await;

        match &result {
            Ok(nonce) => {
                tracing::debug!("Tokenized {} into a {} nonce", builder.analytics_type(), nonce.payment_type());
                self.analytics
                    .record(&events::nonce_received(builder.analytics_type()));
            }
            Err(e) => {
                tracing::debug!("Tokenizing {} failed: {}", builder.analytics_type(), e);
                self.analytics
                    .record(&events::nonce_failed(builder.analytics_type()));
            }
        }

        result
    }

    async fn send_tokenization(&self, builder: &PaymentMethodBuilder) -> Result<PaymentMethodNonce> {
        let metadata = Metadata::new(self.session_id());
        let body = builder.to_json(&metadata)?;

        let response = self.http.post(builder.api_path(), body).await?;

        parse_tokenization_response(&response, builder.response_key(), builder.payment_type())
    }

    /// List the customer's vaulted payment methods.
    ///
    /// Not available under a tokenization key: that fails with an authorization error
    /// before any request is made.
    pub async fn fetch_existing_nonces(&self, default_first: bool) -> Result<Vec<PaymentMethodNonce>> {
        if !self.authorization.can_fetch_payment_methods() {
            tracing::debug!("Refusing to list payment methods with a tokenization key");
            return Err(BraintreeError::tokenization_key_not_allowed());
        }

        let path = paths::payment_methods(default_first, &self.session_id());
        let response = self.http.get(&path).await?;

        parse_payment_methods(&response)
    }
}
