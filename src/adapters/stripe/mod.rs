//! Stripe coupon adapter.
//!
//! Implements the `CouponApi` port against the `/v1/coupons` endpoints,
//! plus an in-memory mock for tests.
//!
//! # Security
//!
//! - The API key is handled via `secrecy::SecretString` and sent as
//!   HTTP basic auth, matching Stripe's authentication scheme.

mod client;
mod mock_coupon_api;
mod types;

pub use client::StripeClient;
pub use mock_coupon_api::{MethodCall, MockCouponApi};
pub use types::{StripeAppliesTo, StripeCoupon, StripeDeleted, StripeErrorBody, StripeErrorEnvelope};
