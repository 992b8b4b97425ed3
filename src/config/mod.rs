//! Provider configuration module
//!
//! Loads the Stripe client configuration from environment variables and
//! validates it before any client is constructed.

mod error;
mod stripe;

pub use error::ConfigError;
pub use stripe::StripeConfig;
