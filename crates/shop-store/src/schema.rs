//! Collection names.
//!
//! Each collection is persisted as `<data_dir>/<name>.json`.

/// Collection names used by the shop.
pub mod collections {
    /// Catalog products, keyed by numeric product ID.
    pub const PRODUCTS: &str = "products";

    /// Customer orders, keyed by UUID.
    pub const ORDERS: &str = "orders";

    /// Discount coupons, keyed by UUID. `code` is unique.
    pub const COUPONS: &str = "coupons";

    /// Uploaded file metadata, keyed by UUID.
    pub const UPLOADS: &str = "uploads";

    /// Admin accounts, keyed by UUID. `email` is unique.
    pub const ADMINS: &str = "admins";

    /// Payment intent mirrors, keyed by provider intent ID.
    pub const PAYMENT_INTENTS: &str = "payment_intents";
}

/// Returns all collection names.
#[must_use]
pub fn all_collections() -> Vec<&'static str> {
    vec![
        collections::PRODUCTS,
        collections::ORDERS,
        collections::COUPONS,
        collections::UPLOADS,
        collections::ADMINS,
        collections::PAYMENT_INTENTS,
    ]
}
