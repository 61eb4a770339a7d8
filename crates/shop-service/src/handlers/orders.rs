//! Storefront order handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use shop_core::{
    BillingAddress, CouponLine, NewOrder, Order, OrderStatus, OrderTracking, ShippingAddress,
};

use crate::error::ApiError;
use crate::state::AppState;

/// `?order-id=` query parameter.
#[derive(Debug, Deserialize)]
pub struct OrderIdQuery {
    /// Order ID, or a comma-separated list for tracking.
    #[serde(rename = "order-id")]
    pub order_id: Option<String>,
}

impl OrderIdQuery {
    fn required(&self) -> Result<&str, ApiError> {
        self.order_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ApiError::BadRequest("Order ID is required".into()))
    }
}

/// Create an order. Orders always start unpaid and pending.
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(mut body): Json<NewOrder>,
) -> Result<Json<Order>, ApiError> {
    body.set_paid = Some(false);
    body.status = Some(OrderStatus::Pending);

    let order = state.orders.create(body).await?;
    Ok(Json(order))
}

/// Billing and shipping replacement body.
#[derive(Debug, Deserialize)]
pub struct UpdateAddressRequest {
    /// New billing address.
    #[serde(default)]
    pub billing: BillingAddress,
    /// New shipping address.
    #[serde(default)]
    pub shipping: ShippingAddress,
}

/// Replace an order's addresses.
pub async fn update_billing_shipping(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OrderIdQuery>,
    Json(body): Json<UpdateAddressRequest>,
) -> Result<Json<Order>, ApiError> {
    let order_id = query.required()?;

    let order = state
        .orders
        .update_addresses(order_id, &body.billing, &body.shipping)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found".into()))?;

    tracing::debug!(order_id, "Order addresses updated");
    Ok(Json(order))
}

/// Coupon redemption body.
#[derive(Debug, Deserialize)]
pub struct ApplyCouponRequest {
    /// Requested coupons; only the first code is used.
    #[serde(default)]
    pub coupon_lines: Vec<CouponLine>,
}

/// Validate and apply a coupon to an order.
pub async fn apply_coupon(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OrderIdQuery>,
    Json(body): Json<ApplyCouponRequest>,
) -> Result<Json<Order>, ApiError> {
    let order_id = query.required()?;

    let code = body
        .coupon_lines
        .first()
        .map(|line| line.code.trim())
        .filter(|code| !code.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Coupon code is required".into()))?;

    let order = state.orders.redeem_coupon(order_id, code).await?;
    Ok(Json(order))
}

/// Status and tracking number for several orders.
pub async fn track_orders(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OrderIdQuery>,
) -> Result<Json<Vec<OrderTracking>>, ApiError> {
    let ids: Vec<String> = query
        .order_id
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect();

    if ids.is_empty() {
        return Err(ApiError::BadRequest("Order IDs are required".into()));
    }

    let tracking = state.orders.tracking(&ids).await?;
    Ok(Json(tracking))
}
