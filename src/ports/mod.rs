//! Ports - Interfaces for external dependencies.
//!
//! Ports define the contracts between the resource mappers and the
//! outside world. Adapters implement these ports.
//!
//! - `CouponApi` - Port for the remote coupon endpoints

mod coupon_api;

pub use coupon_api::{
    ApiError, ApiErrorCode, Coupon, CouponApi, CouponCreateParams, CouponDeletion,
    CouponUpdateParams,
};
