//! Crate-level error type.
//!
//! Every provider operation returns [`ProviderError`]. The variants keep
//! the three failure families distinct: local validation (no network call
//! was made), remote API failures (surfaced verbatim, never retried
//! here), and state-handle failures (decode or aggregated write-back).

use thiserror::Error;

use crate::ports::ApiError;
use crate::schema::ValidationError;
use crate::state::{FieldErrors, StateError};

/// Errors returned by provider operations.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Desired state violated one or more schema constraints. Reported
    /// before any network call.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The remote API returned an error.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// One or more attributes could not be written back into the
    /// resource-data handle. Collected, not fail-fast.
    #[error("failed to persist attributes: {0}")]
    State(#[from] FieldErrors),

    /// Reading a typed attribute out of the handle failed.
    #[error("attribute decode failed: {0}")]
    Decode(#[from] StateError),

    /// The operation requires an id but the handle has none assigned.
    #[error("resource has no id assigned")]
    MissingId,

    /// The provider has no resource registered under this type name.
    #[error("unknown resource type `{0}`")]
    UnknownResource(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::ApiErrorCode;

    #[test]
    fn api_errors_pass_through_display() {
        let err: ProviderError = ApiError::new(ApiErrorCode::NotFound, "no such coupon").into();
        assert_eq!(err.to_string(), "not_found: no such coupon");
    }

    #[test]
    fn missing_id_display() {
        assert_eq!(
            ProviderError::MissingId.to_string(),
            "resource has no id assigned"
        );
    }

    #[test]
    fn unknown_resource_names_the_type() {
        let err = ProviderError::UnknownResource("stripe_webhook".to_string());
        assert!(err.to_string().contains("stripe_webhook"));
    }
}
