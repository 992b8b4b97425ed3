//! The coupon resource mapper.
//!
//! Translates between the resource-data handle and the coupon API:
//! Create validates the desired state against the schema, builds the
//! outbound params, then reconciles with a full Read; Update only ships
//! the in-place-mutable fields; Delete clears the stored id. The API
//! client is an explicit dependency of every operation.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use once_cell::sync::Lazy;

use crate::error::ProviderError;
use crate::ports::{CouponApi, CouponCreateParams, CouponUpdateParams};
use crate::schema::{
    AttrSpec, AttrType, ConstraintViolation, Mutability, ResourceSchema, ValidationError,
};
use crate::state::{opt_value, string_list_value, string_map_value, FieldErrors, ResourceData};

/// Resource type name under which the coupon is registered.
pub const COUPON_RESOURCE_TYPE: &str = "stripe_coupon";

static COUPON_SCHEMA: Lazy<ResourceSchema> = Lazy::new(|| {
    ResourceSchema::new(
        COUPON_RESOURCE_TYPE,
        vec![
            AttrSpec::new("name", AttrType::String, Mutability::Mutable).describe(
                "Name of the coupon displayed to customers on for instance invoices or receipts.",
            ),
            AttrSpec::new("amount_off", AttrType::Int, Mutability::ForceNew)
                .conflicts_with("percent_off")
                .describe(
                    "Amount (in the currency specified) that will be taken off the subtotal of \
                     any invoices for this customer.",
                ),
            AttrSpec::new("currency", AttrType::String, Mutability::ForceNew)
                .requires_attr("amount_off")
                .describe(
                    "If amount_off has been set, the three-letter ISO code for the currency of \
                     the amount to take off.",
                ),
            AttrSpec::new("percent_off", AttrType::Float, Mutability::ForceNew)
                .conflicts_with("amount_off")
                .conflicts_with("currency")
                .describe(
                    "Percent that will be taken off the subtotal of any invoices for this \
                     customer for the duration of the coupon. For example, a coupon with \
                     percent_off of 50 will make a $100 invoice $50 instead.",
                ),
            AttrSpec::new("duration", AttrType::String, Mutability::ForceNew)
                .default_value("once")
                .one_of(&["once", "forever", "repeating"])
                .describe(
                    "One of forever, once, and repeating. Describes how long a customer who \
                     applies this coupon will get the discount.",
                ),
            AttrSpec::new("duration_in_months", AttrType::Int, Mutability::ForceNew)
                .requires_value("duration", "repeating")
                .describe(
                    "If duration is repeating, the number of months the coupon applies. Null if \
                     coupon duration is forever or once.",
                ),
            AttrSpec::new("max_redemptions", AttrType::Int, Mutability::ForceNew).describe(
                "Maximum number of times this coupon can be redeemed, in total, across all \
                 customers, before it is no longer valid.",
            ),
            AttrSpec::new("redeem_by", AttrType::String, Mutability::ForceNew)
                .rfc3339()
                .describe(
                    "Date after which the coupon can no longer be redeemed. Expected format is \
                     RFC3339.",
                ),
            AttrSpec::new("times_redeemed", AttrType::Int, Mutability::Computed)
                .describe("Number of times this coupon has been applied to a customer."),
            AttrSpec::new("applies_to", AttrType::StringList, Mutability::ForceNew)
                .describe("A list of product IDs this coupon applies to."),
            AttrSpec::new("metadata", AttrType::StringMap, Mutability::Mutable).describe(
                "Set of key-value pairs that you can attach to an object. This can be useful for \
                 storing additional information about the object in a structured format.",
            ),
            AttrSpec::new("valid", AttrType::Bool, Mutability::Computed).describe(
                "Taking account of the above properties, whether this coupon can still be \
                 applied to a customer.",
            ),
        ],
    )
});

/// The static coupon schema table.
pub fn coupon_schema() -> &'static ResourceSchema {
    &COUPON_SCHEMA
}

/// Desired coupon state, decoded once at the handle boundary.
#[derive(Debug, Clone, Default, PartialEq)]
struct CouponFields {
    name: Option<String>,
    amount_off: Option<i64>,
    currency: Option<String>,
    percent_off: Option<f64>,
    duration: Option<String>,
    duration_in_months: Option<i64>,
    max_redemptions: Option<i64>,
    redeem_by: Option<String>,
    applies_to: Option<Vec<String>>,
    metadata: Option<std::collections::BTreeMap<String, String>>,
}

impl CouponFields {
    fn decode(data: &ResourceData) -> Result<Self, crate::state::StateError> {
        Ok(Self {
            name: data.get_string("name")?,
            amount_off: data.get_i64("amount_off")?,
            currency: data.get_string("currency")?,
            percent_off: data.get_f64("percent_off")?,
            duration: data.get_string("duration")?,
            duration_in_months: data.get_i64("duration_in_months")?,
            max_redemptions: data.get_i64("max_redemptions")?,
            redeem_by: data.get_string("redeem_by")?,
            applies_to: data.get_string_list("applies_to")?,
            metadata: data.get_string_map("metadata")?,
        })
    }

    fn into_create_params(self) -> Result<CouponCreateParams, ValidationError> {
        let redeem_by = match self.redeem_by {
            Some(raw) => Some(parse_redeem_by(&raw)?),
            None => None,
        };

        Ok(CouponCreateParams {
            name: self.name,
            amount_off: self.amount_off,
            currency: self.currency,
            percent_off: self.percent_off,
            duration: self.duration,
            duration_in_months: self.duration_in_months,
            max_redemptions: self.max_redemptions,
            redeem_by,
            applies_to: self.applies_to,
            metadata: self.metadata,
        })
    }
}

/// RFC3339 string to Unix epoch seconds (whole-second truncation).
fn parse_redeem_by(raw: &str) -> Result<i64, ValidationError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|timestamp| timestamp.timestamp())
        .map_err(|_| {
            ValidationError::new(vec![ConstraintViolation::MalformedTimestamp {
                attr: "redeem_by",
                got: raw.to_string(),
            }])
        })
}

/// Epoch seconds to a UTC RFC3339 string. Values chrono cannot
/// represent are treated as absent.
fn format_redeem_by(epoch: i64) -> Option<String> {
    let formatted = Utc
        .timestamp_opt(epoch, 0)
        .single()
        .map(|timestamp| timestamp.to_rfc3339_opts(SecondsFormat::Secs, true));
    if formatted.is_none() {
        tracing::warn!(epoch, "server returned unrepresentable redeem_by timestamp");
    }
    formatted
}

/// CRUD operations for the `stripe_coupon` resource.
#[derive(Debug, Clone, Copy, Default)]
pub struct CouponResource;

impl CouponResource {
    /// The attribute table the host uses for plan/diff computation.
    pub fn schema(&self) -> &'static ResourceSchema {
        coupon_schema()
    }

    /// An empty handle bound to the coupon schema.
    pub fn new_data(&self) -> ResourceData {
        ResourceData::new(coupon_schema())
    }

    /// Create the coupon from the desired state in `data`.
    ///
    /// Validation runs first; no network call is made for invalid
    /// state. On success the server-assigned id lands in the handle and
    /// a full Read reconciles every attribute.
    pub async fn create(
        &self,
        api: &dyn CouponApi,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let schema = coupon_schema();
        schema.apply_defaults(data)?;
        schema.validate(data)?;

        let fields = CouponFields::decode(data)?;
        let params = fields.into_create_params()?;

        let coupon = api.create_coupon(params).await?;

        tracing::info!(coupon_id = %coupon.id, name = ?coupon.name, "created coupon");
        data.set_id(coupon.id.clone());
        data.set("valid", coupon.valid)?;
        data.set("times_redeemed", coupon.times_redeemed)?;

        self.read(api, data).await
    }

    /// Refresh the handle from server truth, expanding `applies_to`.
    ///
    /// A not-found error is surfaced as-is; the host decides whether
    /// that means the resource is gone.
    pub async fn read(
        &self,
        api: &dyn CouponApi,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let id = data.id().ok_or(ProviderError::MissingId)?.to_string();

        let coupon = api.get_coupon(&id, &["applies_to"]).await?;

        let redeem_by = coupon
            .redeem_by
            .filter(|epoch| *epoch != 0)
            .and_then(format_redeem_by);
        let applies_to = coupon.applies_to.clone().unwrap_or_default();

        let mut errors = FieldErrors::new();
        errors.record(data.set("name", opt_value(coupon.name.clone())));
        errors.record(data.set("amount_off", opt_value(coupon.amount_off)));
        errors.record(data.set("currency", opt_value(coupon.currency.clone())));
        errors.record(data.set("percent_off", opt_value(coupon.percent_off)));
        errors.record(data.set("duration", coupon.duration.clone()));
        errors.record(data.set("duration_in_months", opt_value(coupon.duration_in_months)));
        errors.record(data.set("max_redemptions", opt_value(coupon.max_redemptions)));
        errors.record(data.set("redeem_by", opt_value(redeem_by)));
        errors.record(data.set("times_redeemed", coupon.times_redeemed));
        errors.record(data.set("applies_to", string_list_value(applies_to)));
        errors.record(data.set("metadata", string_map_value(&coupon.metadata)));
        errors.record(data.set("valid", coupon.valid));
        errors.into_result()?;

        data.sync_prior();
        Ok(())
    }

    /// Apply in-place changes (name, metadata), then reconcile.
    ///
    /// Metadata is a full replacement: the request carries exactly the
    /// new map, so keys missing from it are dropped server-side.
    /// Force-new attributes are not checked here; their contract lives
    /// in the schema's mutability flags.
    pub async fn update(
        &self,
        api: &dyn CouponApi,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let id = data.id().ok_or(ProviderError::MissingId)?.to_string();

        let mut params = CouponUpdateParams::default();
        if data.has_change("name") {
            params.name = data.get_string("name")?;
        }
        if data.has_change("metadata") {
            params.metadata = Some(data.get_string_map("metadata")?.unwrap_or_default());
        }

        api.update_coupon(&id, params).await?;
        tracing::info!(coupon_id = %id, "updated coupon");

        self.read(api, data).await
    }

    /// Delete the coupon and clear the stored id.
    ///
    /// No idempotence on top of the API: deleting an id the server no
    /// longer knows surfaces the server's error.
    pub async fn delete(
        &self,
        api: &dyn CouponApi,
        data: &mut ResourceData,
    ) -> Result<(), ProviderError> {
        let id = data.id().ok_or(ProviderError::MissingId)?.to_string();

        api.delete_coupon(&id).await?;
        tracing::info!(coupon_id = %id, "deleted coupon");

        data.clear_id();
        Ok(())
    }
}
