//! Configuration fetching
//!
//! A session needs the merchant's [`Configuration`] before it can tokenize anything.
//! [`RemoteConfigurationProvider`] fetches it from the gateway and keeps it in memory
//! for the lifetime of the provider, so repeated sessions for the same credential
//! share one round trip.

use crate::http::HttpClient;
use crate::types::{Authorization, Configuration};
use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Version of the configuration document requested from the gateway
pub const CONFIG_VERSION: &str = "3";

/// Source of merchant configuration
#[async_trait]
pub trait ConfigurationProvider: Send + Sync {
    async fn fetch(&self, authorization: &Authorization) -> Result<Configuration>;
}

/// Provider that fetches configuration over HTTP and caches it per configuration URL
#[derive(Clone)]
pub struct RemoteConfigurationProvider {
    http: Arc<dyn HttpClient>,
    cache: Arc<RwLock<HashMap<String, Configuration>>>,
}

impl RemoteConfigurationProvider {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self {
            http,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Forget every cached configuration
    pub async fn clear(&self) {
        self.cache.write().await.clear();
    }

    fn request_url(config_url: &str) -> String {
        let separator = if config_url.contains('?') { '&' } else { '?' };
        format!("{}{}configVersion={}", config_url, separator, CONFIG_VERSION)
    }
}

#[async_trait]
impl ConfigurationProvider for RemoteConfigurationProvider {
    async fn fetch(&self, authorization: &Authorization) -> Result<Configuration> {
        let config_url = authorization.config_url();

        if let Some(configuration) = self.cache.read().await.get(&config_url) {
            tracing::debug!("Using cached configuration for {}", config_url);
            return Ok(configuration.clone());
        }

        let body = self.http.get(&Self::request_url(&config_url)).await?;
        let configuration = Configuration::from_json(&body)?;

        self.cache
            .write()
            .await
            .insert(config_url, configuration.clone());

        Ok(configuration)
    }
}
