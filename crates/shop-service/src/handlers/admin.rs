//! Admin API handlers.
//!
//! Every handler takes [`AdminAuth`], so the routes answer 401 without a
//! valid session.

use std::sync::Arc;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use shop_core::{
    Coupon, NewCoupon, NewProduct, Order, OrderStatus, Page, Product, ProductPatch, ProductQuery,
    UploadedFile,
};

use super::uploads::read_file_field;
use crate::auth::AdminAuth;
use crate::error::ApiError;
use crate::services::stats::{self, ShopStats};
use crate::state::AppState;

fn default_page() -> usize {
    1
}

fn default_per_page() -> usize {
    20
}

/// Success acknowledgement.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    /// Always true.
    pub success: bool,
}

impl SuccessResponse {
    const OK: Self = Self { success: true };
}

fn product_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest("Invalid product ID".into()))
}

// ============================================================================
// Orders
// ============================================================================

/// Pagination query for admin lists.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    /// 1-based page number.
    #[serde(default = "default_page")]
    pub page: usize,
    /// Page size.
    #[serde(default = "default_per_page")]
    pub per_page: usize,
    /// Free-text search (products only).
    pub search: Option<String>,
}

/// Pagination block of the admin order list.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// 1-based page number.
    pub page: usize,
    /// Page size.
    pub per_page: usize,
    /// Number of orders.
    pub total: usize,
    /// Number of pages.
    pub total_pages: usize,
}

/// Admin order list.
#[derive(Debug, Serialize)]
pub struct OrderListResponse {
    /// Orders on this page, newest first.
    pub orders: Vec<Order>,
    /// Page information.
    pub pagination: Pagination,
}

/// List orders.
pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    _auth: AdminAuth,
    Query(query): Query<PageQuery>,
) -> Result<Json<OrderListResponse>, ApiError> {
    let page = state.orders.list(query.page, query.per_page).await?;

    Ok(Json(OrderListResponse {
        pagination: Pagination {
            page: page.page,
            per_page: page.per_page,
            total: page.total,
            total_pages: page.total_pages,
        },
        orders: page.data,
    }))
}

/// Get one order.
pub async fn get_order(
    State(state): State<Arc<AppState>>,
    _auth: AdminAuth,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    state
        .orders
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Order not found".into()))
}

/// Status change request.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    /// New status.
    pub status: Option<String>,
}

/// Change an order's status.
pub async fn update_order_status(
    State(state): State<Arc<AppState>>,
    auth: AdminAuth,
    Path(id): Path<String>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<Order>, ApiError> {
    let status: OrderStatus = body
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Status is required".into()))?
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid status".into()))?;

    let order = state
        .orders
        .update_status(&id, status)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order not found".into()))?;

    tracing::info!(order_id = %id, status = %status, admin = %auth.admin.email, "Order status changed");
    Ok(Json(order))
}

// ============================================================================
// Products
// ============================================================================

/// List products with totals.
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    _auth: AdminAuth,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<Product>>, ApiError> {
    let params = ProductQuery {
        page: query.page,
        per_page: query.per_page,
        search: query.search,
        ..ProductQuery::default()
    };
    Ok(Json(state.catalog.list(&params).await?))
}

/// Get one product.
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    _auth: AdminAuth,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    state
        .catalog
        .get(product_id(&id)?)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Product not found".into()))
}

/// Create a product.
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    auth: AdminAuth,
    Json(body): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let product = state.catalog.create(body).await?;
    tracing::info!(product_id = product.id, admin = %auth.admin.email, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// Update a product.
pub async fn update_product(
    State(state): State<Arc<AppState>>,
    _auth: AdminAuth,
    Path(id): Path<String>,
    Json(body): Json<ProductPatch>,
) -> Result<Json<Product>, ApiError> {
    state
        .catalog
        .update(product_id(&id)?, &body)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Product not found".into()))
}

/// Delete a product and its images.
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    auth: AdminAuth,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let id = product_id(&id)?;
    if !state.catalog.delete(id).await? {
        return Err(ApiError::NotFound("Product not found".into()));
    }
    tracing::info!(product_id = id, admin = %auth.admin.email, "Product deleted");
    Ok(Json(SuccessResponse::OK))
}

/// Image entry returned after an upload.
#[derive(Debug, Serialize)]
pub struct UploadedImage {
    /// Public URL.
    pub src: String,
    /// Client-side identifier (upload time in milliseconds).
    pub id: i64,
    /// Original file name.
    pub name: String,
    /// Alt text.
    pub alt: String,
}

/// Product image upload response.
#[derive(Debug, Serialize)]
pub struct UploadImageResponse {
    /// Always true.
    pub success: bool,
    /// Public URL.
    pub url: String,
    /// Image entry for the product form.
    pub image: UploadedImage,
}

/// Store a product image sent as the multipart field `image`.
///
/// The image is not attached to the product; the admin UI saves it with the
/// next product update.
pub async fn upload_product_image(
    State(state): State<Arc<AppState>>,
    _auth: AdminAuth,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<UploadImageResponse>, ApiError> {
    let id = product_id(&id)?;
    let input = read_file_field(&mut multipart, "image")
        .await?
        .ok_or_else(|| ApiError::BadRequest("No image file provided".into()))?;

    if input.bytes.len() > state.config.max_file_size {
        return Err(ApiError::PayloadTooLarge("File too large".into()));
    }
    if state.catalog.get(id).await?.is_none() {
        return Err(ApiError::NotFound("Product not found".into()));
    }

    let name = Some(input.original_name.as_str()).filter(|n| !n.is_empty());
    let url = state.catalog.save_image(id, name, &input.bytes).await?;

    Ok(Json(UploadImageResponse {
        success: true,
        image: UploadedImage {
            src: url.clone(),
            id: chrono::Utc::now().timestamp_millis(),
            name: input.original_name.clone(),
            alt: input.original_name,
        },
        url,
    }))
}

/// Image deletion request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteImageRequest {
    /// Public URL of the image.
    pub image_url: Option<String>,
}

/// Delete a product image file.
pub async fn delete_product_image(
    State(state): State<Arc<AppState>>,
    _auth: AdminAuth,
    Path(id): Path<String>,
    Json(body): Json<DeleteImageRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let id = product_id(&id)?;
    let url = body
        .image_url
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Image URL is required".into()))?;

    if !state.catalog.delete_image(&url).await? {
        return Err(ApiError::NotFound("Image not found".into()));
    }
    tracing::info!(product_id = id, url = %url, "Product image deleted");
    Ok(Json(SuccessResponse::OK))
}

// ============================================================================
// Coupons
// ============================================================================

/// List coupons, newest first.
pub async fn list_coupons(
    State(state): State<Arc<AppState>>,
    _auth: AdminAuth,
) -> Result<Json<Vec<Coupon>>, ApiError> {
    Ok(Json(state.coupons.list().await?))
}

/// Create a coupon.
pub async fn create_coupon(
    State(state): State<Arc<AppState>>,
    auth: AdminAuth,
    Json(body): Json<NewCoupon>,
) -> Result<(StatusCode, Json<Coupon>), ApiError> {
    let coupon = state.coupons.create(body).await?;
    tracing::info!(code = %coupon.code, admin = %auth.admin.email, "Coupon created");
    Ok((StatusCode::CREATED, Json(coupon)))
}

/// Delete a coupon.
pub async fn delete_coupon(
    State(state): State<Arc<AppState>>,
    _auth: AdminAuth,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    if !state.coupons.delete(&id).await? {
        return Err(ApiError::NotFound("Coupon not found".into()));
    }
    Ok(Json(SuccessResponse::OK))
}

// ============================================================================
// Uploads
// ============================================================================

/// Upload list filter.
#[derive(Debug, Deserialize)]
pub struct UploadsQuery {
    /// Only uploads from this client batch.
    pub time: Option<String>,
}

/// List customer uploads, newest first, or one batch in upload order.
pub async fn list_uploads(
    State(state): State<Arc<AppState>>,
    _auth: AdminAuth,
    Query(query): Query<UploadsQuery>,
) -> Result<Json<Vec<UploadedFile>>, ApiError> {
    let uploads = match query.time.as_deref().filter(|t| !t.is_empty()) {
        Some(time) => state.uploads.by_timestamp(time).await?,
        None => state.uploads.list().await?,
    };
    Ok(Json(uploads))
}

/// Delete a customer upload and its file.
pub async fn delete_upload(
    State(state): State<Arc<AppState>>,
    _auth: AdminAuth,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    if !state.uploads.delete(&id).await? {
        return Err(ApiError::NotFound("Upload not found".into()));
    }
    Ok(Json(SuccessResponse::OK))
}

// ============================================================================
// Stats
// ============================================================================

/// Dashboard statistics.
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    _auth: AdminAuth,
) -> Result<Json<ShopStats>, ApiError> {
    Ok(Json(stats::collect(&state.store).await?))
}
