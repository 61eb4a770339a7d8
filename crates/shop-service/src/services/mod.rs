//! Business services layered over the collection store.
//!
//! Each service holds a shared `Arc<dyn CollectionStore>` and is cheap to
//! clone. Composition only goes downward: orders use the catalog and coupon
//! engine, payments use orders.

pub mod admins;
pub mod coupons;
pub mod orders;
pub mod payments;
pub mod products;
pub mod stats;
pub mod uploads;

pub use admins::AdminService;
pub use coupons::CouponEngine;
pub use orders::OrderEngine;
pub use payments::{PaymentBridge, PaymentProvider};
pub use products::ProductCatalog;
pub use uploads::{UploadInput, UploadService};

use crate::error::ApiError;

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, ApiError>;
