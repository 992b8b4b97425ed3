//! Reqwest-backed implementation of the `CouponApi` port.
//!
//! Speaks Stripe's conventions: HTTP basic auth with the secret key as
//! username, form-encoded request bodies with bracketed nesting
//! (`metadata[key]`, `applies_to[products][0]`), and `expand[]` query
//! parameters for relation expansion. No retry or backoff - whatever
//! policy the caller wants sits above this client.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;

use crate::config::StripeConfig;
use crate::ports::{
    ApiError, ApiErrorCode, Coupon, CouponApi, CouponCreateParams, CouponDeletion,
    CouponUpdateParams,
};

use super::types::{StripeCoupon, StripeDeleted, StripeErrorEnvelope};

/// Stripe HTTP client for the coupon endpoints.
pub struct StripeClient {
    config: StripeConfig,
    http_client: reqwest::Client,
}

impl StripeClient {
    /// Create a new client with the given configuration.
    pub fn new(config: StripeConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    fn coupons_url(&self) -> String {
        format!("{}/v1/coupons", self.config.api_base_url())
    }

    fn coupon_url(&self, id: &str) -> String {
        format!("{}/v1/coupons/{}", self.config.api_base_url(), id)
    }

    fn api_key(&self) -> &str {
        self.config.api_key().expose_secret()
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, error = %body, "Stripe API request failed");
            return Err(api_error_from_response(status, &body));
        }

        response.json().await.map_err(|e| {
            ApiError::new(
                ApiErrorCode::ProviderError,
                format!("failed to parse Stripe response: {}", e),
            )
        })
    }
}

/// Map an HTTP status to the error code taxonomy.
fn error_code_for_status(status: reqwest::StatusCode) -> ApiErrorCode {
    use reqwest::StatusCode;

    match status {
        StatusCode::BAD_REQUEST | StatusCode::PAYMENT_REQUIRED => ApiErrorCode::InvalidRequest,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiErrorCode::AuthenticationError,
        StatusCode::NOT_FOUND => ApiErrorCode::NotFound,
        StatusCode::TOO_MANY_REQUESTS => ApiErrorCode::RateLimited,
        _ => ApiErrorCode::ProviderError,
    }
}

/// Build an `ApiError` from a failed response, preferring the message
/// and code out of Stripe's error envelope when the body parses.
fn api_error_from_response(status: reqwest::StatusCode, body: &str) -> ApiError {
    let code = error_code_for_status(status);

    match serde_json::from_str::<StripeErrorEnvelope>(body) {
        Ok(envelope) => {
            let message = envelope
                .error
                .message
                .unwrap_or_else(|| format!("Stripe API error (HTTP {})", status.as_u16()));
            let mut err = ApiError::new(code, message);
            if let Some(provider_code) = envelope.error.code {
                err = err.with_provider_code(provider_code);
            }
            err
        }
        Err(_) => ApiError::new(
            code,
            format!("Stripe API error (HTTP {}): {}", status.as_u16(), body),
        ),
    }
}

/// Encode creation params as Stripe form fields. Absent fields are
/// omitted entirely.
fn encode_create_params(params: &CouponCreateParams) -> Vec<(String, String)> {
    let mut form = Vec::new();

    if let Some(name) = &params.name {
        form.push(("name".to_string(), name.clone()));
    }
    if let Some(amount_off) = params.amount_off {
        form.push(("amount_off".to_string(), amount_off.to_string()));
    }
    if let Some(currency) = &params.currency {
        form.push(("currency".to_string(), currency.clone()));
    }
    if let Some(percent_off) = params.percent_off {
        form.push(("percent_off".to_string(), percent_off.to_string()));
    }
    if let Some(duration) = &params.duration {
        form.push(("duration".to_string(), duration.clone()));
    }
    if let Some(duration_in_months) = params.duration_in_months {
        form.push((
            "duration_in_months".to_string(),
            duration_in_months.to_string(),
        ));
    }
    if let Some(max_redemptions) = params.max_redemptions {
        form.push(("max_redemptions".to_string(), max_redemptions.to_string()));
    }
    if let Some(redeem_by) = params.redeem_by {
        form.push(("redeem_by".to_string(), redeem_by.to_string()));
    }
    if let Some(products) = &params.applies_to {
        for (index, product) in products.iter().enumerate() {
            form.push((format!("applies_to[products][{}]", index), product.clone()));
        }
    }
    if let Some(metadata) = &params.metadata {
        form.extend(encode_metadata(metadata));
    }

    form
}

/// Encode update params as Stripe form fields.
fn encode_update_params(params: &CouponUpdateParams) -> Vec<(String, String)> {
    let mut form = Vec::new();

    if let Some(name) = &params.name {
        form.push(("name".to_string(), name.clone()));
    }
    if let Some(metadata) = &params.metadata {
        form.extend(encode_metadata(metadata));
    }

    form
}

fn encode_metadata(
    metadata: &std::collections::BTreeMap<String, String>,
) -> Vec<(String, String)> {
    if metadata.is_empty() {
        // An empty value clears the whole metadata set.
        vec![("metadata".to_string(), String::new())]
    } else {
        metadata
            .iter()
            .map(|(key, value)| (format!("metadata[{}]", key), value.clone()))
            .collect()
    }
}

#[async_trait]
impl CouponApi for StripeClient {
    async fn create_coupon(&self, params: CouponCreateParams) -> Result<Coupon, ApiError> {
        let form = encode_create_params(&params);

        let response = self
            .http_client
            .post(self.coupons_url())
            .basic_auth(self.api_key(), Option::<&str>::None)
            .form(&form)
            .send()
            .await
            .map_err(|e| ApiError::network(e.to_string()))?;

        let coupon: StripeCoupon = Self::decode(response).await?;
        tracing::debug!(coupon_id = %coupon.id, "Stripe coupon created");
        Ok(coupon.into())
    }

    async fn get_coupon(&self, id: &str, expand: &[&str]) -> Result<Coupon, ApiError> {
        let query: Vec<(String, String)> = expand
            .iter()
            .map(|relation| ("expand[]".to_string(), relation.to_string()))
            .collect();

        let response = self
            .http_client
            .get(self.coupon_url(id))
            .basic_auth(self.api_key(), Option::<&str>::None)
            .query(&query)
            .send()
            .await
            .map_err(|e| ApiError::network(e.to_string()))?;

        let coupon: StripeCoupon = Self::decode(response).await?;
        Ok(coupon.into())
    }

    async fn update_coupon(
        &self,
        id: &str,
        params: CouponUpdateParams,
    ) -> Result<Coupon, ApiError> {
        let form = encode_update_params(&params);

        let response = self
            .http_client
            .post(self.coupon_url(id))
            .basic_auth(self.api_key(), Option::<&str>::None)
            .form(&form)
            .send()
            .await
            .map_err(|e| ApiError::network(e.to_string()))?;

        let coupon: StripeCoupon = Self::decode(response).await?;
        Ok(coupon.into())
    }

    async fn delete_coupon(&self, id: &str) -> Result<CouponDeletion, ApiError> {
        let response = self
            .http_client
            .delete(self.coupon_url(id))
            .basic_auth(self.api_key(), Option::<&str>::None)
            .send()
            .await
            .map_err(|e| ApiError::network(e.to_string()))?;

        let deleted: StripeDeleted = Self::decode(response).await?;
        Ok(deleted.into())
    }
}
