//! Stripe API configuration.

use secrecy::{ExposeSecret, SecretString};

use super::error::ConfigError;

const DEFAULT_API_BASE_URL: &str = "https://api.stripe.com";

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,

    /// Base URL for the Stripe API.
    api_base_url: String,
}

impl StripeConfig {
    /// Create a new Stripe configuration.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Reads `STRIPE_API_KEY`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key =
            std::env::var("STRIPE_API_KEY").map_err(|_| ConfigError::MissingEnv("STRIPE_API_KEY"))?;
        Ok(Self::new(api_key))
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// The secret API key.
    pub fn api_key(&self) -> &SecretString {
        &self.api_key
    }

    /// The API base URL.
    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    /// Check if using Stripe test mode.
    pub fn is_test_mode(&self) -> bool {
        self.api_key.expose_secret().starts_with("sk_test_")
    }

    /// Check if using Stripe live mode.
    pub fn is_live_mode(&self) -> bool {
        self.api_key.expose_secret().starts_with("sk_live_")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let key = self.api_key.expose_secret();
        if key.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        // Verify key prefix for safety
        if !key.starts_with("sk_") {
            return Err(ConfigError::InvalidApiKey);
        }
        Ok(())
    }
}
