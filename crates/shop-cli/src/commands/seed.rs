//! Demo catalog seeding.
//!
//! Loads the bundled `seed/catalog.json`. Products that already exist (by
//! ID) and coupons whose code is taken are skipped, so the command can be
//! re-run safely.

use std::sync::Arc;

use serde::Deserialize;
use shop_core::{NewCoupon, NewProduct};
use shop_service::services::{CouponEngine, ProductCatalog};
use shop_service::ServiceConfig;
use shop_store::CollectionStore;

use super::CommandError;

const CATALOG_JSON: &str = include_str!("../../seed/catalog.json");

#[derive(Debug, Deserialize)]
struct SeedData {
    products: Vec<NewProduct>,
    coupons: Vec<NewCoupon>,
}

/// What a seed run changed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    /// Products inserted.
    pub products_created: usize,
    /// Coupons inserted.
    pub coupons_created: usize,
    /// Entries left alone because they already existed.
    pub skipped: usize,
}

/// Seed products and coupons into `store`.
pub async fn run(store: Arc<dyn CollectionStore>) -> Result<SeedSummary, CommandError> {
    let data: SeedData = serde_json::from_str(CATALOG_JSON)?;
    let config = ServiceConfig::from_env();
    let catalog = ProductCatalog::new(Arc::clone(&store), config.product_image_dir());
    let coupons = CouponEngine::new(store);

    let mut summary = SeedSummary::default();

    for product in data.products {
        if let Some(id) = product.id {
            if catalog.get(id).await?.is_some() {
                tracing::debug!(product_id = id, "Product exists, skipping");
                summary.skipped += 1;
                continue;
            }
        }
        catalog.create(product).await?;
        summary.products_created += 1;
    }

    for coupon in data.coupons {
        if coupons.find_by_code(&coupon.code).await?.is_some() {
            tracing::debug!(code = %coupon.code, "Coupon exists, skipping");
            summary.skipped += 1;
            continue;
        }
        coupons.create(coupon).await?;
        summary.coupons_created += 1;
    }

    Ok(summary)
}
