//! Order creation, coupon application and status changes.

use std::sync::Arc;

use serde_json::{json, Value};
use shop_core::order::{
    generate_order_key, order_total, DEFAULT_PAYMENT_METHOD, DEFAULT_PAYMENT_METHOD_TITLE,
    ORDER_CURRENCY,
};
use shop_core::{
    format_money, parse_amount, BillingAddress, CouponLine, NewOrder, Order, OrderStatus,
    OrderTracking, Page, ShippingAddress, ShippingLine,
};
use shop_store::query::{timestamp, CREATED_AT_FIELD};
use shop_store::schema::collections::ORDERS;
use shop_store::{CollectionStore, FindOptions, Query, Record, SortKey};

use super::{CouponEngine, ProductCatalog, Result};
use crate::error::ApiError;

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn patch_of<const N: usize>(fields: [(&str, Value); N]) -> Record {
    fields
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

/// Order operations over the `orders` collection.
#[derive(Clone)]
pub struct OrderEngine {
    store: Arc<dyn CollectionStore>,
    catalog: ProductCatalog,
    coupons: CouponEngine,
}

impl OrderEngine {
    /// Create an order engine pricing lines from `catalog`.
    pub fn new(
        store: Arc<dyn CollectionStore>,
        catalog: ProductCatalog,
        coupons: CouponEngine,
    ) -> Self {
        Self {
            store,
            catalog,
            coupons,
        }
    }

    /// Create an order, pricing every line from the current catalog.
    ///
    /// Fails with `NotFound` before anything is written if a line references
    /// an unknown product.
    pub async fn create(&self, new: NewOrder) -> Result<Order> {
        if new.line_items.is_empty() {
            return Err(ApiError::BadRequest("Order must contain at least one line item".into()));
        }

        let mut line_items = new.line_items;
        for item in &mut line_items {
            if item.quantity == 0 {
                return Err(ApiError::BadRequest(format!(
                    "Invalid quantity for product {}",
                    item.product_id
                )));
            }
            let product = self.catalog.get(item.product_id).await?.ok_or_else(|| {
                ApiError::NotFound(format!("Product {} not found", item.product_id))
            })?;
            let unit_price = parse_amount(&product.price).map_err(|_| {
                ApiError::Internal(format!("Product {} has an invalid price", product.id))
            })?;
            item.price(new_id(), product.name, unit_price);
        }

        let coupon_lines = new.coupon_lines.unwrap_or_default();
        let discount_total = coupon_lines
            .first()
            .and_then(|line| line.discount.clone())
            .unwrap_or_else(|| "0".to_string());
        let shipping_lines = new
            .shipping_lines
            .filter(|lines| !lines.is_empty())
            .unwrap_or_else(|| vec![ShippingLine::colissimo(new_id())]);

        let now = timestamp();
        let order = Order {
            id: new_id(),
            order_key: generate_order_key(),
            status: new.status.unwrap_or(OrderStatus::Pending),
            currency: ORDER_CURRENCY.to_string(),
            date_created: now.clone(),
            date_modified: now,
            total: order_total(&line_items, &discount_total),
            total_tax: "0".to_string(),
            discount_total,
            payment_method: new
                .payment_method
                .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string()),
            payment_method_title: new
                .payment_method_title
                .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD_TITLE.to_string()),
            set_paid: new.set_paid.unwrap_or(false),
            billing: new.billing,
            shipping: new.shipping,
            line_items,
            shipping_lines,
            coupon_lines,
            tracking_number: None,
            created_at: None,
            updated_at: None,
        };

        let created = self.store.create(ORDERS, shop_store::encode(&order)?).await?;
        tracing::info!(
            order_id = %order.id,
            total = %order.total,
            items = order.line_items.len(),
            "Order created"
        );
        Ok(shop_store::decode(created)?)
    }

    /// Look up an order by ID.
    pub async fn get(&self, id: &str) -> Result<Option<Order>> {
        let record = self.store.find_by_id(ORDERS, &json!(id)).await?;
        Ok(record.map(shop_store::decode).transpose()?)
    }

    async fn patch(&self, id: &str, patch: Record) -> Result<Option<Order>> {
        let updated = self.store.update_one(ORDERS, &json!(id), patch).await?;
        Ok(updated.map(shop_store::decode).transpose()?)
    }

    /// Replace the billing and shipping addresses.
    pub async fn update_addresses(
        &self,
        id: &str,
        billing: &BillingAddress,
        shipping: &ShippingAddress,
    ) -> Result<Option<Order>> {
        let patch = patch_of([
            ("billing", json!(billing)),
            ("shipping", json!(shipping)),
            ("date_modified", json!(timestamp())),
        ]);
        self.patch(id, patch).await
    }

    /// Store coupon lines and recompute the total from the stored line
    /// totals minus the first line's discount.
    ///
    /// The discount is taken as given; callers validate it first.
    pub async fn apply_coupon(&self, id: &str, coupon_lines: Vec<CouponLine>) -> Result<Option<Order>> {
        let Some(order) = self.get(id).await? else {
            return Ok(None);
        };

        let discount = coupon_lines
            .first()
            .and_then(|line| line.discount.clone())
            .unwrap_or_else(|| "0".to_string());
        let total = order_total(&order.line_items, &discount);

        let patch = patch_of([
            ("coupon_lines", json!(coupon_lines)),
            ("discount_total", json!(discount)),
            ("total", json!(total)),
            ("date_modified", json!(timestamp())),
        ]);
        self.patch(id, patch).await
    }

    /// Validate a coupon code against an order and apply it.
    ///
    /// Rejects orders that already carry a coupon. On success the coupon's
    /// usage is incremented after the order is written.
    pub async fn redeem_coupon(&self, id: &str, code: &str) -> Result<Order> {
        let order = self
            .get(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Order not found".into()))?;

        if !order.coupon_lines.is_empty() {
            return Err(ApiError::CouponAlreadyApplied);
        }

        let email = Some(order.billing.email.as_str()).filter(|e| !e.is_empty());
        let validation = self.coupons.validate(code, order.subtotal(), email).await?;
        let discount = match (validation.valid, validation.discount) {
            (true, Some(discount)) => discount,
            _ => {
                return Err(ApiError::InvalidCoupon(
                    validation.message.unwrap_or_default(),
                ))
            }
        };

        let lines = vec![CouponLine {
            id: None,
            code: code.to_string(),
            discount: Some(format_money(discount)),
            discount_tax: Some("0".to_string()),
        }];
        let updated = self
            .apply_coupon(id, lines)
            .await?
            .ok_or_else(|| ApiError::NotFound("Order not found".into()))?;

        self.coupons.increment_usage(code, email).await?;
        tracing::info!(order_id = %id, code, total = %updated.total, "Coupon applied to order");
        Ok(updated)
    }

    /// Status and tracking for each known ID. Unknown IDs are omitted.
    pub async fn tracking(&self, ids: &[String]) -> Result<Vec<OrderTracking>> {
        let mut tracked = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(order) = self.get(id).await? {
                tracked.push(order.tracking());
            }
        }
        Ok(tracked)
    }

    /// Set an order's status. Any status may follow any other.
    pub async fn update_status(&self, id: &str, status: OrderStatus) -> Result<Option<Order>> {
        let patch = patch_of([
            ("status", json!(status)),
            ("date_modified", json!(timestamp())),
        ]);
        let updated = self.patch(id, patch).await?;
        if updated.is_some() {
            tracing::info!(order_id = %id, status = %status, "Order status updated");
        }
        Ok(updated)
    }

    /// A page of orders, newest first.
    pub async fn list(&self, page: usize, per_page: usize) -> Result<Page<Order>> {
        let page = page.max(1);
        let per_page = per_page.max(1);
        let total = self.count().await?;
        let records = self
            .store
            .find_many(
                ORDERS,
                &Query::all(),
                &FindOptions::sorted(vec![SortKey::desc(CREATED_AT_FIELD)]).page(page, per_page),
            )
            .await?;

        Ok(Page {
            data: shop_store::decode_all(records)?,
            total,
            page,
            per_page,
            total_pages: total.div_ceil(per_page),
        })
    }

    /// Number of orders.
    pub async fn count(&self) -> Result<usize> {
        Ok(self.store.count(ORDERS, &Query::all()).await?)
    }
}
