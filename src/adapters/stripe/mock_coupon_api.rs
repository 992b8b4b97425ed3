//! Mock coupon API for testing.
//!
//! Provides a configurable in-memory implementation of `CouponApi` for
//! unit and integration tests. Supports:
//! - A coupon "database" with server-side semantics (id assignment,
//!   expansion handling, full-replace metadata updates)
//! - Error injection
//! - Call tracking

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::ports::{
    ApiError, Coupon, CouponApi, CouponCreateParams, CouponDeletion, CouponUpdateParams,
};

/// Mock coupon API for testing.
///
/// # Example
///
/// ```ignore
/// let mock = MockCouponApi::new();
///
/// // Inject errors
/// mock.set_error(ApiError::not_found("coupon"));
///
/// // Use in tests
/// let result = mock.get_coupon("co_missing", &[]).await;
/// assert!(mock.was_called("get_coupon"));
/// ```
#[derive(Default)]
pub struct MockCouponApi {
    /// Inner state (thread-safe for async tests).
    inner: Arc<Mutex<MockState>>,
}

/// Internal mutable state.
#[derive(Default)]
struct MockState {
    /// Stored coupons by id.
    coupons: HashMap<String, Coupon>,

    /// Next coupon to return from `create_coupon`, overriding the
    /// synthesized one.
    next_coupon: Option<Coupon>,

    /// Error to return on the next call to any method.
    next_error: Option<ApiError>,

    /// Specific errors by method name.
    method_errors: HashMap<String, ApiError>,

    /// Track method calls for assertions.
    call_log: Vec<MethodCall>,
}

/// Recorded method call for assertions.
#[derive(Debug, Clone)]
pub struct MethodCall {
    pub method: String,
    pub args: Vec<String>,
}

impl MockCouponApi {
    /// Create a new mock with an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock pre-seeded with one coupon.
    pub fn with_coupon(coupon: Coupon) -> Self {
        let mock = Self::new();
        mock.insert_coupon(coupon);
        mock
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    /// Put a coupon into the "database".
    pub fn insert_coupon(&self, coupon: Coupon) {
        let id = coupon.id.clone();
        self.inner.lock().unwrap().coupons.insert(id, coupon);
    }

    /// Set the coupon to return on the next `create_coupon` call.
    pub fn set_next_coupon(&self, coupon: Coupon) {
        self.inner.lock().unwrap().next_coupon = Some(coupon);
    }

    /// Set an error to return on the next call to any method.
    pub fn set_error(&self, error: ApiError) {
        self.inner.lock().unwrap().next_error = Some(error);
    }

    /// Set an error for a specific method.
    pub fn set_method_error(&self, method: &str, error: ApiError) {
        self.inner
            .lock()
            .unwrap()
            .method_errors
            .insert(method.to_string(), error);
    }

    /// Clear all configured errors.
    pub fn clear_errors(&self) {
        let mut state = self.inner.lock().unwrap();
        state.next_error = None;
        state.method_errors.clear();
    }

    /// Fetch a stored coupon for assertions.
    pub fn stored(&self, id: &str) -> Option<Coupon> {
        self.inner.lock().unwrap().coupons.get(id).cloned()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Call Tracking
    // ════════════════════════════════════════════════════════════════════════════

    /// Get all recorded method calls.
    pub fn calls(&self) -> Vec<MethodCall> {
        self.inner.lock().unwrap().call_log.clone()
    }

    /// Check if a method was called.
    pub fn was_called(&self, method: &str) -> bool {
        self.inner
            .lock()
            .unwrap()
            .call_log
            .iter()
            .any(|c| c.method == method)
    }

    /// Get count of calls to a method.
    pub fn call_count(&self, method: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    /// Total calls across all methods.
    pub fn total_calls(&self) -> usize {
        self.inner.lock().unwrap().call_log.len()
    }

    /// Clear the call log.
    pub fn clear_calls(&self) {
        self.inner.lock().unwrap().call_log.clear();
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Internal Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn record_call(&self, method: &str, args: Vec<String>) {
        self.inner.lock().unwrap().call_log.push(MethodCall {
            method: method.to_string(),
            args,
        });
    }

    fn check_error(&self, method: &str) -> Result<(), ApiError> {
        let mut state = self.inner.lock().unwrap();

        // Check method-specific error first
        if let Some(error) = state.method_errors.get(method) {
            return Err(error.clone());
        }

        // Check global error (consumes it)
        if let Some(error) = state.next_error.take() {
            return Err(error);
        }

        Ok(())
    }

    fn mock_id() -> String {
        format!(
            "co_mock_{}",
            uuid::Uuid::new_v4().to_string().split('-').next().unwrap()
        )
    }
}

impl Clone for MockCouponApi {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl CouponApi for MockCouponApi {
    async fn create_coupon(&self, params: CouponCreateParams) -> Result<Coupon, ApiError> {
        self.record_call(
            "create_coupon",
            vec![format!("{:?}", params.name), format!("{:?}", params.duration)],
        );
        self.check_error("create_coupon")?;

        let mut state = self.inner.lock().unwrap();

        let coupon = state.next_coupon.take().unwrap_or_else(|| Coupon {
            id: Self::mock_id(),
            name: params.name,
            amount_off: params.amount_off,
            currency: params.currency,
            percent_off: params.percent_off,
            duration: params.duration.unwrap_or_else(|| "once".to_string()),
            duration_in_months: params.duration_in_months,
            max_redemptions: params.max_redemptions,
            redeem_by: params.redeem_by,
            times_redeemed: 0,
            applies_to: params.applies_to,
            metadata: params.metadata.unwrap_or_default(),
            valid: true,
        });

        state.coupons.insert(coupon.id.clone(), coupon.clone());
        Ok(coupon)
    }

    async fn get_coupon(&self, id: &str, expand: &[&str]) -> Result<Coupon, ApiError> {
        self.record_call(
            "get_coupon",
            vec![id.to_string(), format!("{:?}", expand)],
        );
        self.check_error("get_coupon")?;

        let state = self.inner.lock().unwrap();
        let mut coupon = state
            .coupons
            .get(id)
            .cloned()
            .ok_or_else(|| ApiError::not_found("coupon").with_provider_code("resource_missing"))?;

        // The relation is only inlined when expansion was requested.
        if !expand.contains(&"applies_to") {
            coupon.applies_to = None;
        }

        Ok(coupon)
    }

    async fn update_coupon(
        &self,
        id: &str,
        params: CouponUpdateParams,
    ) -> Result<Coupon, ApiError> {
        self.record_call(
            "update_coupon",
            vec![id.to_string(), format!("{:?}", params.name)],
        );
        self.check_error("update_coupon")?;

        let mut state = self.inner.lock().unwrap();
        let coupon = state
            .coupons
            .get_mut(id)
            .ok_or_else(|| ApiError::not_found("coupon").with_provider_code("resource_missing"))?;

        if let Some(name) = params.name {
            coupon.name = Some(name);
        }
        if let Some(metadata) = params.metadata {
            // Full replace: keys absent from the new map are dropped.
            coupon.metadata = metadata;
        }

        Ok(coupon.clone())
    }

    async fn delete_coupon(&self, id: &str) -> Result<CouponDeletion, ApiError> {
        self.record_call("delete_coupon", vec![id.to_string()]);
        self.check_error("delete_coupon")?;

        let mut state = self.inner.lock().unwrap();
        state
            .coupons
            .remove(id)
            .ok_or_else(|| ApiError::not_found("coupon").with_provider_code("resource_missing"))?;

        Ok(CouponDeletion {
            id: id.to_string(),
            deleted: true,
        })
    }
}
