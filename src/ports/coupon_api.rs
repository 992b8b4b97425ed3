//! Coupon API port for the remote payment service.
//!
//! Defines the contract the resource mapper consumes: create, fetch
//! (with relation expansion), update, and delete of a single coupon.
//! Implementations own transport, auth, and whatever retry policy they
//! choose; this crate never retries on top of them.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Port for the remote coupon endpoints.
///
/// Every operation is one blocking request/response exchange; the trait
/// holds no state, so a single implementation may serve concurrent
/// operations on different entities.
#[async_trait]
pub trait CouponApi: Send + Sync {
    /// Create a coupon. The server assigns the id.
    async fn create_coupon(&self, params: CouponCreateParams) -> Result<Coupon, ApiError>;

    /// Fetch a coupon by id. `expand` names relations the server should
    /// inline instead of returning only references (`applies_to`).
    async fn get_coupon(&self, id: &str, expand: &[&str]) -> Result<Coupon, ApiError>;

    /// Update the in-place-mutable fields of a coupon.
    async fn update_coupon(&self, id: &str, params: CouponUpdateParams) -> Result<Coupon, ApiError>;

    /// Delete a coupon. Deleting an unknown id surfaces whatever error
    /// the server defines.
    async fn delete_coupon(&self, id: &str) -> Result<CouponDeletion, ApiError>;
}

/// Outbound parameters for coupon creation.
///
/// All fields are optional; absent fields are omitted from the request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CouponCreateParams {
    /// Display name.
    pub name: Option<String>,

    /// Flat discount in the smallest currency unit.
    pub amount_off: Option<i64>,

    /// Three-letter ISO currency code for `amount_off`.
    pub currency: Option<String>,

    /// Percentage discount.
    pub percent_off: Option<f64>,

    /// Discount duration: once, forever or repeating.
    pub duration: Option<String>,

    /// Months the discount applies when duration is repeating.
    pub duration_in_months: Option<i64>,

    /// Total redemption cap across all customers.
    pub max_redemptions: Option<i64>,

    /// Last redeemable instant, in Unix epoch seconds.
    pub redeem_by: Option<i64>,

    /// Product ids the coupon is restricted to.
    pub applies_to: Option<Vec<String>>,

    /// Opaque key-value annotations.
    pub metadata: Option<BTreeMap<String, String>>,
}

/// Outbound parameters for coupon updates.
///
/// Only the in-place-mutable fields exist here. `metadata` is a full
/// replacement: `Some(map)` makes the server's set exactly `map`, so
/// keys absent from it are dropped; `None` leaves metadata untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CouponUpdateParams {
    /// New display name; `None` leaves the name untouched.
    pub name: Option<String>,

    /// Full replacement metadata set.
    pub metadata: Option<BTreeMap<String, String>>,
}

/// A coupon as returned by the remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    /// Server-assigned identifier.
    pub id: String,

    /// Display name.
    pub name: Option<String>,

    /// Flat discount in the smallest currency unit.
    pub amount_off: Option<i64>,

    /// Currency of `amount_off`.
    pub currency: Option<String>,

    /// Percentage discount.
    pub percent_off: Option<f64>,

    /// Discount duration: once, forever or repeating.
    pub duration: String,

    /// Months the discount applies when duration is repeating.
    pub duration_in_months: Option<i64>,

    /// Total redemption cap.
    pub max_redemptions: Option<i64>,

    /// Last redeemable instant, Unix epoch seconds. Absent or zero
    /// means no expiry.
    pub redeem_by: Option<i64>,

    /// How often the coupon has been applied (server-computed).
    pub times_redeemed: i64,

    /// Product ids the coupon is restricted to. `None` when the
    /// relation was not expanded or is unset.
    pub applies_to: Option<Vec<String>>,

    /// Opaque key-value annotations.
    pub metadata: BTreeMap<String, String>,

    /// Whether the coupon can still be applied (server-computed).
    pub valid: bool,
}

/// Confirmation of a coupon deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponDeletion {
    /// Id of the deleted coupon.
    pub id: String,

    /// Whether the server confirmed the deletion.
    pub deleted: bool,
}

/// Errors from remote API operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for categorization.
    pub code: ApiErrorCode,

    /// Human-readable message.
    pub message: String,

    /// Provider's own error code (if available).
    pub provider_code: Option<String>,

    /// Whether the operation could be retried. Informational: this
    /// crate never retries, the classification is for the caller.
    pub retryable: bool,
}

impl ApiError {
    /// Create a new API error.
    pub fn new(code: ApiErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
            retryable: code.is_retryable(),
        }
    }

    /// Attach the provider's own error code.
    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::NetworkError, message)
    }

    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::AuthenticationError, message)
    }

    /// Create a not found error.
    pub fn not_found(resource: &str) -> Self {
        Self::new(ApiErrorCode::NotFound, format!("{} not found", resource))
    }

    /// Create an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::InvalidRequest, message)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// API error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorCode {
    /// Network connectivity issue.
    NetworkError,

    /// API authentication failed.
    AuthenticationError,

    /// The server rejected the request parameters.
    InvalidRequest,

    /// Resource not found.
    NotFound,

    /// Rate limit exceeded.
    RateLimited,

    /// Other provider-side error.
    ProviderError,

    /// Unknown error.
    Unknown,
}

impl ApiErrorCode {
    /// Check if this error type is typically retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiErrorCode::NetworkError | ApiErrorCode::RateLimited)
    }
}

impl std::fmt::Display for ApiErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ApiErrorCode::NetworkError => "network_error",
            ApiErrorCode::AuthenticationError => "authentication_error",
            ApiErrorCode::InvalidRequest => "invalid_request",
            ApiErrorCode::NotFound => "not_found",
            ApiErrorCode::RateLimited => "rate_limited",
            ApiErrorCode::ProviderError => "provider_error",
            ApiErrorCode::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}
