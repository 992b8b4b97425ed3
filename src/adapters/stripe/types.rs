//! Stripe-specific wire types for the coupon endpoints.
//!
//! These types represent Stripe API objects as they arrive in JSON
//! responses and map onto the port types for further processing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ports::{Coupon, CouponDeletion};

/// Stripe Coupon object as returned by the API.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeCoupon {
    /// Unique coupon identifier.
    pub id: String,

    /// Object type (always "coupon").
    pub object: String,

    /// Display name.
    pub name: Option<String>,

    /// Flat discount in the smallest currency unit.
    pub amount_off: Option<i64>,

    /// Currency of `amount_off`.
    pub currency: Option<String>,

    /// Percentage discount.
    pub percent_off: Option<f64>,

    /// Discount duration (once, forever, repeating).
    pub duration: String,

    /// Months the discount applies when duration is repeating.
    pub duration_in_months: Option<i64>,

    /// Total redemption cap.
    pub max_redemptions: Option<i64>,

    /// Last redeemable instant (Unix epoch seconds).
    pub redeem_by: Option<i64>,

    /// How often the coupon has been applied.
    #[serde(default)]
    pub times_redeemed: i64,

    /// Product restriction; present only when the relation is expanded.
    pub applies_to: Option<StripeAppliesTo>,

    /// Custom metadata.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,

    /// Whether the coupon can still be applied.
    #[serde(default)]
    pub valid: bool,

    /// Whether this is a live or test mode object.
    #[serde(default)]
    pub livemode: bool,

    /// Unix timestamp of creation.
    pub created: Option<i64>,
}

/// Product restriction container on a coupon.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StripeAppliesTo {
    /// List of product ids the coupon applies to.
    #[serde(default)]
    pub products: Vec<String>,
}

/// Deletion confirmation returned by DELETE endpoints.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeDeleted {
    /// Id of the deleted object.
    pub id: String,

    /// Whether the object was deleted.
    #[serde(default)]
    pub deleted: bool,
}

/// Error envelope wrapping every Stripe error response.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorEnvelope {
    /// The error payload.
    pub error: StripeErrorBody,
}

/// Stripe error payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StripeErrorBody {
    /// Error category (api_error, invalid_request_error, ...).
    #[serde(rename = "type", default)]
    pub error_type: String,

    /// Short machine-readable code (e.g. resource_missing).
    pub code: Option<String>,

    /// Human-readable message.
    pub message: Option<String>,

    /// Offending request parameter, if any.
    pub param: Option<String>,
}

impl From<StripeCoupon> for Coupon {
    fn from(coupon: StripeCoupon) -> Self {
        Coupon {
            id: coupon.id,
            name: coupon.name,
            amount_off: coupon.amount_off,
            currency: coupon.currency,
            percent_off: coupon.percent_off,
            duration: coupon.duration,
            duration_in_months: coupon.duration_in_months,
            max_redemptions: coupon.max_redemptions,
            redeem_by: coupon.redeem_by,
            times_redeemed: coupon.times_redeemed,
            applies_to: coupon.applies_to.map(|a| a.products),
            metadata: coupon.metadata,
            valid: coupon.valid,
        }
    }
}

impl From<StripeDeleted> for CouponDeletion {
    fn from(deleted: StripeDeleted) -> Self {
        CouponDeletion {
            id: deleted.id,
            deleted: deleted.deleted,
        }
    }
}
