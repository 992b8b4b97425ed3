//! Resource mappers and the provider registry.
//!
//! Each resource mapper owns one resource type: its static schema and
//! the Create/Read/Update/Delete operations over a resource-data
//! handle. The [`Provider`] bundles the registered mappers behind one
//! dispatch surface for the host.

mod coupon;

pub use coupon::{coupon_schema, CouponResource, COUPON_RESOURCE_TYPE};

use std::sync::Arc;

use crate::adapters::stripe::StripeClient;
use crate::config::{ConfigError, StripeConfig};
use crate::error::ProviderError;
use crate::ports::CouponApi;
use crate::schema::ResourceSchema;
use crate::state::ResourceData;

/// The provider: registered resource types plus the injected API
/// client handed to every operation.
#[derive(Clone)]
pub struct Provider {
    api: Arc<dyn CouponApi>,
    coupon: CouponResource,
}

impl Provider {
    /// Build a provider around an injected API implementation.
    pub fn new(api: Arc<dyn CouponApi>) -> Self {
        Self {
            api,
            coupon: CouponResource,
        }
    }

    /// Build a provider with a live Stripe client configured from the
    /// environment (`STRIPE_API_KEY`).
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = StripeConfig::from_env()?;
        config.validate()?;
        Ok(Self::new(Arc::new(StripeClient::new(config))))
    }

    /// Every registered resource type with its schema, for host
    /// plan/diff computation.
    pub fn resource_schemas(&self) -> Vec<(&'static str, &'static ResourceSchema)> {
        vec![(COUPON_RESOURCE_TYPE, coupon_schema())]
    }

    /// An empty handle bound to the named resource type's schema.
    pub fn new_resource_data(&self, resource_type: &str) -> Result<ResourceData, ProviderError> {
        match resource_type {
            COUPON_RESOURCE_TYPE => Ok(self.coupon.new_data()),
            other => Err(ProviderError::UnknownResource(other.to_string())),
        }
    }

    /// Create the resource described by `data`.
    pub async fn create(
        &self,
        resource_type: &str,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        match resource_type {
            COUPON_RESOURCE_TYPE => self.coupon.create(self.api.as_ref(), data).await,
            other => Err(ProviderError::UnknownResource(other.to_string())),
        }
    }

    /// Refresh `data` from server truth.
    pub async fn read(
        &self,
        resource_type: &str,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        match resource_type {
            COUPON_RESOURCE_TYPE => self.coupon.read(self.api.as_ref(), data).await,
            other => Err(ProviderError::UnknownResource(other.to_string())),
        }
    }

    /// Apply in-place changes from `data`.
    pub async fn update(
        &self,
        resource_type: &str,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        match resource_type {
            COUPON_RESOURCE_TYPE => self.coupon.update(self.api.as_ref(), data).await,
            other => Err(ProviderError::UnknownResource(other.to_string())),
        }
    }

    /// Destroy the resource and clear its id.
    pub async fn delete(
        &self,
        resource_type: &str,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        match resource_type {
            COUPON_RESOURCE_TYPE => self.coupon.delete(self.api.as_ref(), data).await,
            other => Err(ProviderError::UnknownResource(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::stripe::MockCouponApi;

    fn provider_with_mock() -> (Provider, MockCouponApi) {
        let mock = MockCouponApi::new();
        (Provider::new(Arc::new(mock.clone())), mock)
    }

    #[test]
    fn registry_exposes_coupon_schema() {
        let (provider, _mock) = provider_with_mock();
        let schemas = provider.resource_schemas();
        assert_eq!(schemas.len(), 1);
        assert_eq!(schemas[0].0, "stripe_coupon");
        assert!(schemas[0].1.attr("percent_off").is_some());
    }

    #[test]
    fn unknown_resource_type_rejected() {
        let (provider, _mock) = provider_with_mock();
        let err = provider.new_resource_data("stripe_price").unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(name) if name == "stripe_price"));
    }

    #[tokio::test]
    async fn dispatch_routes_to_coupon_mapper() {
        let (provider, mock) = provider_with_mock();
        let mut data = provider.new_resource_data("stripe_coupon").unwrap();
        data.set("percent_off", 15).unwrap();

        provider.create("stripe_coupon", &mut data).await.unwrap();

        assert!(mock.was_called("create_coupon"));
        assert!(data.id().is_some());
    }

    #[tokio::test]
    async fn dispatch_unknown_type_makes_no_call() {
        let (provider, mock) = provider_with_mock();
        let mut data = provider.new_resource_data("stripe_coupon").unwrap();

        let err = provider.create("stripe_webhook", &mut data).await.unwrap_err();

        assert!(matches!(err, ProviderError::UnknownResource(_)));
        assert_eq!(mock.total_calls(), 0);
    }
}
