//! Merchant configuration snapshot

use crate::Result;
use serde::Deserialize;
use std::collections::BTreeSet;

/// Optional gateway features a merchant may have enabled
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Feature {
    PayPal,
    AndroidPay,
    Venmo,
    ThreeDSecure,
    CvvChallenge,
    PostalCodeChallenge,
}

impl Feature {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::PayPal => "paypal",
            Feature::AndroidPay => "android-pay",
            Feature::Venmo => "venmo",
            Feature::ThreeDSecure => "three-d-secure",
            Feature::CvvChallenge => "cvv",
            Feature::PostalCodeChallenge => "postal_code",
        }
    }
}

#[derive(Deserialize, Default)]
struct RawAnalytics {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Deserialize, Default)]
struct RawAndroidPay {
    #[serde(default)]
    enabled: bool,
}

#[derive(Deserialize)]
struct RawConfiguration {
    #[serde(rename = "clientApiUrl")]
    client_api_url: String,
    #[serde(default)]
    environment: Option<String>,
    #[serde(rename = "merchantId", default)]
    merchant_id: Option<String>,
    #[serde(default)]
    analytics: Option<RawAnalytics>,
    #[serde(rename = "paypalEnabled", default)]
    paypal_enabled: bool,
    #[serde(rename = "androidPay", default)]
    android_pay: Option<RawAndroidPay>,
    #[serde(default)]
    venmo: Option<String>,
    #[serde(rename = "threeDSecureEnabled", default)]
    three_d_secure_enabled: bool,
    #[serde(default)]
    challenges: Vec<String>,
}

/// Immutable snapshot of the merchant's client configuration.
///
/// Fetched once per session and shared read-only by everything the session owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    client_api_url: String,
    environment: Option<String>,
    merchant_id: Option<String>,
    analytics_url: Option<String>,
    features: BTreeSet<Feature>,
    raw: String,
}

impl Configuration {
    /// Parse the configuration document returned by the gateway
    pub fn from_json(body: &str) -> Result<Self> {
        let raw: RawConfiguration = serde_json::from_str(body)?;

        let mut features = BTreeSet::new();
        if raw.paypal_enabled {
            features.insert(Feature::PayPal);
        }
        if raw.android_pay.unwrap_or_default().enabled {
            features.insert(Feature::AndroidPay);
        }
        if raw.venmo.as_deref().is_some_and(|v| v != "off") {
            features.insert(Feature::Venmo);
        }
        if raw.three_d_secure_enabled {
            features.insert(Feature::ThreeDSecure);
        }
        for challenge in &raw.challenges {
            match challenge.as_str() {
                "cvv" => {
                    features.insert(Feature::CvvChallenge);
                }
                "postal_code" => {
                    features.insert(Feature::PostalCodeChallenge);
                }
                other => tracing::debug!("Ignoring unknown challenge '{}'", other),
            }
        }

        let analytics_url = raw
            .analytics
            .unwrap_or_default()
            .url
            .filter(|url| !url.is_empty());

        Ok(Self {
            client_api_url: raw.client_api_url,
            environment: raw.environment,
            merchant_id: raw.merchant_id,
            analytics_url,
            features,
            raw: body.to_string(),
        })
    }

    /// Build a configuration without a gateway round trip
    pub fn new(client_api_url: impl Into<String>) -> Self {
        Self {
            client_api_url: client_api_url.into(),
            environment: None,
            merchant_id: None,
            analytics_url: None,
            features: BTreeSet::new(),
            raw: String::new(),
        }
    }

    /// Enable analytics reporting to `url`
    pub fn with_analytics_url(mut self, url: impl Into<String>) -> Self {
        self.analytics_url = Some(url.into()).filter(|url: &String| !url.is_empty());
        self
    }

    /// Mark a feature as enabled
    pub fn with_feature(mut self, feature: Feature) -> Self {
        self.features.insert(feature);
        self
    }

    /// Base URL for client API requests
    pub fn client_api_url(&self) -> &str {
        &self.client_api_url
    }

    pub fn environment(&self) -> Option<&str> {
        self.environment.as_deref()
    }

    pub fn merchant_id(&self) -> Option<&str> {
        self.merchant_id.as_deref()
    }

    /// Analytics are enabled whenever the gateway hands out a collection URL
    pub fn analytics_enabled(&self) -> bool {
        self.analytics_url.is_some()
    }

    pub fn analytics_url(&self) -> Option<&str> {
        self.analytics_url.as_deref()
    }

    pub fn is_enabled(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }

    pub fn enabled_features(&self) -> &BTreeSet<Feature> {
        &self.features
    }

    /// The document this configuration was parsed from
    pub fn to_json(&self) -> &str {
        &self.raw
    }
}
