//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading and validation
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingEnv(&'static str),

    #[error("Stripe API key is empty")]
    MissingApiKey,

    #[error("invalid Stripe API key format (expected sk_ prefix)")]
    InvalidApiKey,
}
