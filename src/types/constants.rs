//! Client API paths and wire constants

/// Client API endpoints, relative to the configuration's `clientApiUrl`
pub mod paths {
    /// Vaulted payment methods of the current customer
    pub const PAYMENT_METHODS: &str = "v1/payment_methods";
    /// Credit card tokenization
    pub const CREDIT_CARDS: &str = "v1/payment_methods/credit_cards";
    /// PayPal account tokenization
    pub const PAYPAL_ACCOUNTS: &str = "v1/payment_methods/paypal_accounts";
    /// Android Pay card tokenization
    pub const ANDROID_PAY_CARDS: &str = "v1/payment_methods/android_pay_cards";

    /// Build the payment method list path with its query string
    pub fn payment_methods(default_first: bool, session_id: &str) -> String {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("default_first", if default_first { "true" } else { "false" })
            .append_pair("session_id", session_id)
            .finish();
        format!("{}?{}", PAYMENT_METHODS, query)
    }
}

/// Keys of the JSON arrays in tokenization and list responses
pub mod response_keys {
    pub const CREDIT_CARDS: &str = "creditCards";
    pub const PAYPAL_ACCOUNTS: &str = "paypalAccounts";
    pub const ANDROID_PAY_CARDS: &str = "androidPayCards";
    pub const PAYMENT_METHODS: &str = "paymentMethods";
}

/// Defaults for the `_meta` object attached to tokenization requests
pub mod meta {
    pub const INTEGRATION: &str = "custom";
    pub const SOURCE: &str = "form";
    pub const PLATFORM: &str = "rust";
}

/// Analytics event names
pub mod analytics {
    /// Suffix of the event recorded when a nonce is received
    pub const NONCE_RECEIVED: &str = "nonce-received";
    /// Suffix of the event recorded when tokenization fails
    pub const NONCE_FAILED: &str = "nonce-failed";

    /// `<type>.nonce-received`
    pub fn nonce_received(payment_type: &str) -> String {
        format!("{}.{}", payment_type, NONCE_RECEIVED)
    }

    /// `<type>.nonce-failed`
    pub fn nonce_failed(payment_type: &str) -> String {
        format!("{}.{}", payment_type, NONCE_FAILED)
    }
}
