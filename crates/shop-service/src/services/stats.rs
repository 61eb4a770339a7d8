//! Dashboard statistics.

use std::collections::BTreeMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use shop_core::{format_money, money::parse_amount_or_zero, OrderStatus};
use shop_store::schema::collections::{COUPONS, ORDERS, PRODUCTS, UPLOADS};
use shop_store::{CollectionStore, FindOptions, Query};

use super::Result;

/// Collection totals and revenue.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopStats {
    /// Number of orders.
    pub total_orders: usize,
    /// Number of products.
    pub total_products: usize,
    /// Number of coupons.
    pub total_coupons: usize,
    /// Number of uploads.
    pub total_uploads: usize,
    /// Sum of `completed` and `processing` order totals.
    pub total_revenue: String,
    /// Order count per status.
    pub orders_by_status: BTreeMap<String, usize>,
}

/// Compute dashboard statistics from the raw collections.
///
/// Orders are read as raw records so one malformed order cannot hide the
/// dashboard.
pub async fn collect(store: &Arc<dyn CollectionStore>) -> Result<ShopStats> {
    let orders = store
        .find_many(ORDERS, &Query::all(), &FindOptions::default())
        .await?;

    let mut revenue = Decimal::ZERO;
    let mut orders_by_status = BTreeMap::new();
    for order in &orders {
        let Some(status) = order.get("status").and_then(|s| s.as_str()) else {
            continue;
        };
        *orders_by_status.entry(status.to_string()).or_insert(0) += 1;

        if status.parse::<OrderStatus>().is_ok_and(OrderStatus::is_revenue) {
            revenue += parse_amount_or_zero(order.get("total").and_then(|t| t.as_str()));
        }
    }

    Ok(ShopStats {
        total_orders: orders.len(),
        total_products: store.count(PRODUCTS, &Query::all()).await?,
        total_coupons: store.count(COUPONS, &Query::all()).await?,
        total_uploads: store.count(UPLOADS, &Query::all()).await?,
        total_revenue: format_money(revenue),
        orders_by_status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shop_store::MemoryStore;

    #[tokio::test]
    async fn revenue_counts_paid_statuses_only() {
        let store: Arc<dyn CollectionStore> = Arc::new(MemoryStore::new());
        for (status, total) in [
            ("completed", "10.00"),
            ("processing", "5.50"),
            ("pending", "100.00"),
            ("cancelled", "7.00"),
        ] {
            store
                .create(
                    ORDERS,
                    shop_store::encode(&json!({"status": status, "total": total})).unwrap(),
                )
                .await
                .unwrap();
        }

        let stats = collect(&store).await.unwrap();
        assert_eq!(stats.total_orders, 4);
        assert_eq!(stats.total_revenue, "15.50");
        assert_eq!(stats.orders_by_status["pending"], 1);
        assert_eq!(stats.total_products, 0);

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["totalRevenue"], "15.50");
        assert_eq!(json["ordersByStatus"]["completed"], 1);
    }
}
