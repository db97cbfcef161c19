//! Client sessions
//!
//! A [`Session`] is the handle a host application holds while it accepts payment details.
//! It owns the merchant [`Configuration`], a [`TokenizationClient`] and an [`EventHub`].
//!
//! Requests run on background tasks. Their terminal events are sent to one dispatcher task
//! per session, which raises them on the hub one at a time. Listener registration can
//! therefore race freely with in-flight requests: an event raised while no listener is
//! registered is buffered for the next one.
//!
//! # Examples
//!
//! ```no_run
//! use rust_braintree::session::SessionBuilder;
//! use rust_braintree::types::CardBuilder;
//!
//! # async fn example() -> rust_braintree::Result<()> {
//! let session = SessionBuilder::new("sandbox_abcdef_merchant_id")?
//!     .connect()
//!     .await?;
//!
//! session.add_nonce_created_listener(|nonce| {
//!     println!("Send {} to your server", nonce.nonce());
//! });
//! session.add_error_listener(|error| {
//!     eprintln!("Tokenization failed: {}", error);
//! });
//!
//! session.tokenize(
//!     CardBuilder::new()
//!         .with_number("4111111111111111")
//!         .with_expiration_date("08/20"),
//! );
//!
//! session.close().await;
//! # Ok(())
//! # }
//! ```

use crate::analytics::{Analytics, AnalyticsSink, SessionIdProvider, TracingAnalyticsSink, UuidSessionId};
use crate::config_provider::{ConfigurationProvider, RemoteConfigurationProvider};
use crate::http::{BraintreeHttpClient, HttpClient, HttpClientConfig};
use crate::hub::{Capability, EventHub, HubEvent, ListenerId};
use crate::tokenization::TokenizationClient;
use crate::types::{Authorization, Configuration, PaymentMethodBuilder, PaymentMethodNonce};
use crate::{BraintreeError, Result};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[cfg(test)]
mod tests;

/// Builder for [`Session`]
pub struct SessionBuilder {
    authorization: Authorization,
    http: Option<Arc<dyn HttpClient>>,
    http_config: HttpClientConfig,
    analytics_sink: Arc<dyn AnalyticsSink>,
    session_id: Arc<dyn SessionIdProvider>,
    configuration: Option<Configuration>,
    configuration_provider: Option<Arc<dyn ConfigurationProvider>>,
}

impl std::fmt::Debug for SessionBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionBuilder")
            .field("authorization", &self.authorization)
            .field("http_config", &self.http_config)
            .field("configuration", &self.configuration)
            .finish()
    }
}

impl SessionBuilder {
    /// Start building a session for a client token or tokenization key.
    ///
    /// Fails immediately if the string is neither.
    pub fn new(authorization: &str) -> Result<Self> {
        Ok(Self::from_authorization(Authorization::from_string(authorization)?))
    }

    pub fn from_authorization(authorization: Authorization) -> Self {
        Self {
            authorization,
            http: None,
            http_config: HttpClientConfig::default(),
            analytics_sink: Arc::new(TracingAnalyticsSink),
            session_id: Arc::new(UuidSessionId::new()),
            configuration: None,
            configuration_provider: None,
        }
    }

    /// Use `http` for every request instead of the built-in reqwest client
    pub fn with_http_client(mut self, http: Arc<dyn HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    /// Transport settings for the built-in client
    pub fn with_http_config(mut self, config: HttpClientConfig) -> Self {
        self.http_config = config;
        self
    }

    pub fn with_analytics_sink(mut self, sink: Arc<dyn AnalyticsSink>) -> Self {
        self.analytics_sink = sink;
        self
    }

    pub fn with_session_id_provider(mut self, provider: Arc<dyn SessionIdProvider>) -> Self {
        self.session_id = provider;
        self
    }

    /// Use an already fetched configuration
    pub fn with_configuration(mut self, configuration: Configuration) -> Self {
        self.configuration = Some(configuration);
        self
    }

    /// Source used by [`connect`](Self::connect) when no configuration was supplied
    pub fn with_configuration_provider(mut self, provider: Arc<dyn ConfigurationProvider>) -> Self {
        self.configuration_provider = Some(provider);
        self
    }

    fn bootstrap_http(&self) -> Result<Arc<dyn HttpClient>> {
        let http: Arc<dyn HttpClient> = match &self.http {
            Some(http) => http.clone(),
            None => Arc::new(BraintreeHttpClient::new(
                self.authorization.clone(),
                self.http_config.clone(),
            )?),
        };
        Ok(http)
    }

    /// Fetch the configuration if needed, then build the session
    pub async fn connect(mut self) -> Result<Session> {
        if self.configuration.is_none() {
            let provider: Arc<dyn ConfigurationProvider> = match &self.configuration_provider {
                Some(provider) => provider.clone(),
                None => Arc::new(RemoteConfigurationProvider::new(self.bootstrap_http()?)),
            };

            tracing::debug!("Fetching configuration from {}", self.authorization.config_url());
            self.configuration = Some(provider.fetch(&self.authorization).await?);
        }

        self.build()
    }

    /// Build the session from a supplied configuration.
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> Result<Session> {
        let configuration = self.configuration.clone().ok_or_else(|| {
            BraintreeError::config("A configuration is required; use connect() to fetch one")
        })?;

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| BraintreeError::config(format!("Session requires a tokio runtime: {}", e)))?;

        let http: Arc<dyn HttpClient> = match &self.http {
            Some(http) => http.clone(),
            None => {
                let mut config = self.http_config.clone();
                if config.base_url.is_none() && !configuration.client_api_url().is_empty() {
                    config = config.with_base_url(configuration.client_api_url());
                }
                Arc::new(BraintreeHttpClient::new(self.authorization.clone(), config)?)
            }
        };

        let analytics = Analytics::new(self.analytics_sink, configuration.analytics_enabled());
        let client = TokenizationClient::new(http, self.authorization, self.session_id, analytics);

        let hub = Arc::new(EventHub::new());
        let (events, receiver) = mpsc::unbounded_channel();
        let dispatcher = runtime.spawn(dispatch_events(hub.clone(), receiver));

        tracing::info!(
            "Session {} started (analytics {})",
            client.session_id(),
            if client.analytics().is_enabled() { "enabled" } else { "disabled" }
        );

        Ok(Session {
            hub,
            client,
            configuration,
            runtime,
            events,
            dispatcher,
        })
    }
}

async fn dispatch_events(hub: Arc<EventHub>, mut receiver: mpsc::UnboundedReceiver<HubEvent>) {
    while let Some(event) = receiver.recv().await {
        let capability = event.capability();
        if !hub.dispatch(event) {
            tracing::debug!("Buffered {} event until a listener registers", capability);
        }
    }
    tracing::debug!("Event dispatcher stopped");
}

/// A live client session
pub struct Session {
    hub: Arc<EventHub>,
    client: TokenizationClient,
    configuration: Configuration,
    runtime: tokio::runtime::Handle,
    events: mpsc::UnboundedSender<HubEvent>,
    dispatcher: JoinHandle<()>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("client", &self.client)
            .field("configuration", &self.configuration)
            .field("hub", &self.hub)
            .finish()
    }
}

impl Session {
    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn authorization(&self) -> &Authorization {
        self.client.authorization()
    }

    pub fn session_id(&self) -> String {
        self.client.session_id()
    }

    /// The session's listener registry
    pub fn hub(&self) -> &Arc<EventHub> {
        &self.hub
    }

    /// Tokenize a payment method in the background.
    ///
    /// Resolves to exactly one nonce-created or error event.
    pub fn tokenize(&self, builder: impl Into<PaymentMethodBuilder>) {
        let builder = builder.into();
        let client = self.client.clone();
        let events = self.events.clone();

        self.runtime.spawn(async move {
            let event = match client.tokenize(&builder).await {
                Ok(nonce) => HubEvent::NonceCreated(nonce),
                Err(e) => HubEvent::Error(Arc::new(e)),
            };
            send_event(&events, event);
        });
    }

    /// Fetch the customer's vaulted payment methods in the background.
    ///
    /// Resolves to exactly one nonces-updated or error event. Under a tokenization key the
    /// error is raised without making a request.
    pub fn fetch_existing_nonces(&self, default_first: bool) {
        let client = self.client.clone();
        let events = self.events.clone();

        self.runtime.spawn(async move {
            let event = match client.fetch_existing_nonces(default_first).await {
                Ok(nonces) => HubEvent::NoncesUpdated(nonces),
                Err(e) => HubEvent::Error(Arc::new(e)),
            };
            send_event(&events, event);
        });
    }

    pub fn add_nonce_created_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&PaymentMethodNonce) + Send + Sync + 'static,
    {
        self.hub.add_nonce_created_listener(listener)
    }

    pub fn add_error_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&BraintreeError) + Send + Sync + 'static,
    {
        self.hub.add_error_listener(listener)
    }

    pub fn add_nonces_updated_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&[PaymentMethodNonce]) + Send + Sync + 'static,
    {
        self.hub.add_nonces_updated_listener(listener)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.hub.remove_listener(id)
    }

    pub fn listener_count(&self, capability: Capability) -> usize {
        self.hub.listener_count(capability)
    }

    /// Record a custom analytics event, subject to the configuration's analytics flag
    pub fn send_analytics_event(&self, event: &str) {
        self.client.analytics().record(event);
    }

    /// Wait for in-flight requests to deliver their events, then stop the dispatcher
    pub async fn close(self) {
        let session_id = self.session_id();
        drop(self.events);

        if let Err(e) = self.dispatcher.await {
            tracing::error!("Event dispatcher for session {} failed: {}", session_id, e);
        }
        tracing::info!("Session {} closed", session_id);
    }
}

fn send_event(events: &mpsc::UnboundedSender<HubEvent>, event: HubEvent) {
    if let Err(e) = events.send(event) {
        tracing::warn!("Dropping {} event raised after the session closed", e.0.capability());
    }
}
