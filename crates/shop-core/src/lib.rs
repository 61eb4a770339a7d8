//! Core types and rules for the shop backend.
//!
//! This crate provides the records persisted by the collection store and the
//! pure computations layered on them:
//!
//! - **Catalog**: `Product`, `ProductQuery`, `Page`
//! - **Coupons**: `Coupon`, `CouponType`, `CouponValidation`
//! - **Orders**: `Order`, `LineItem`, `OrderStatus`, total computation
//! - **Payments**: `PaymentIntentRecord`, order reference parsing
//! - **Uploads**: `UploadedFile`
//! - **Admins**: `Admin`, `AdminRole`, `AdminSession`
//!
//! # Money
//!
//! Amounts travel as decimal strings with no currency symbol (`"33.33"`), as
//! the WooCommerce wire format does. All arithmetic goes through
//! `rust_decimal::Decimal` and is rendered with exactly two decimals, rounding
//! half away from zero.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod admin;
pub mod coupon;
pub mod error;
pub mod money;
pub mod order;
pub mod payment;
pub mod product;
pub mod upload;

pub use admin::{Admin, AdminRole, AdminSession, NewAdmin};
pub use coupon::{evaluate_coupon, Coupon, CouponRejection, CouponType, CouponValidation, NewCoupon};
pub use error::{CoreError, Result};
pub use money::{format_money, parse_amount, round_money, strip_tax, to_minor_units, TAX_MULTIPLIER};
pub use order::{
    BillingAddress, CouponLine, LineItem, MetaData, NewOrder, Order, OrderStatus, OrderTracking,
    ShippingAddress, ShippingLine,
};
pub use payment::{ConfirmOutcome, PaymentIntentRecord, PAYMENT_SUCCEEDED};
pub use product::{
    NewProduct, Page, Product, ProductAttribute, ProductImage, ProductListItem, ProductPatch,
    ProductQuery,
};
pub use upload::{UploadResponse, UploadedFile};
