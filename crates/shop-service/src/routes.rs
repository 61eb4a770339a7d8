//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, patch, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{admin, admin_auth, health, orders, payments, products, uploads};
use crate::state::AppState;

/// Storefront API prefix.
pub const API_PREFIX: &str = "/wp-json/linepicplus/v1";

/// Payments API prefix.
pub const PAYMENTS_PREFIX: &str = "/wp-json/linepicplus-payments/v1";

/// Room for multipart boundaries and headers on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Maximum concurrent file uploads.
const UPLOAD_MAX_CONCURRENT_REQUESTS: usize = 16;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Storefront (`/wp-json/linepicplus/v1`)
/// - `GET /health` - Health check
/// - `GET /products` - Product list
/// - `GET /product?id=` - One product
/// - `POST /orders` - Create order
/// - `POST /order-billing-shipping?order-id=` - Replace addresses
/// - `POST /order-coupon?order-id=` - Apply coupon
/// - `GET /track-orders?order-id=a,b` - Order tracking
/// - `POST /upload?time=&fileid=` - Customer image upload
///
/// ## Payments (`/wp-json/linepicplus-payments/v1`)
/// - `POST /create-intent` - Create payment intent
/// - `POST /confirm-intent` - Confirm payment intent
///
/// ## Admin session
/// - `POST /admin/login`, `POST /admin/logout`, `GET /admin/me`
///
/// ## Admin API (session required)
/// - Orders, products and product images, coupons, uploads, stats under
///   `/admin/api`
///
/// ## Static
/// - `GET /uploads/*` - Stored files
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let max_upload_bytes = state.config.max_file_size + MULTIPART_OVERHEAD_BYTES;
    let request_timeout_seconds = state.config.request_timeout_seconds;
    let upload_dir = state.config.upload_dir.clone();

    // Build CORS layer
    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    // Multipart routes carry whole files, so they get the file size limit
    // instead of the JSON body limit.
    let upload_routes = Router::new()
        .route(&format!("{API_PREFIX}/upload"), post(uploads::upload_file))
        .route(
            "/admin/api/products/:id/upload-image",
            post(admin::upload_product_image),
        )
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(ConcurrencyLimitLayer::new(UPLOAD_MAX_CONCURRENT_REQUESTS));

    let store_routes = Router::new()
        .route("/health", get(health::health))
        .route("/products", get(products::list_products))
        .route("/product", get(products::get_product))
        .route("/orders", post(orders::create_order))
        .route(
            "/order-billing-shipping",
            post(orders::update_billing_shipping),
        )
        .route("/order-coupon", post(orders::apply_coupon))
        .route("/track-orders", get(orders::track_orders));

    let payment_routes = Router::new()
        .route("/create-intent", post(payments::create_intent))
        .route("/confirm-intent", post(payments::confirm_intent));

    let admin_api_routes = Router::new()
        // Orders
        .route("/orders", get(admin::list_orders))
        .route("/orders/:id", get(admin::get_order))
        .route("/orders/:id/status", patch(admin::update_order_status))
        // Products
        .route(
            "/products",
            get(admin::list_products).post(admin::create_product),
        )
        .route(
            "/products/:id",
            get(admin::get_product)
                .put(admin::update_product)
                .delete(admin::delete_product),
        )
        .route("/products/:id/images", delete(admin::delete_product_image))
        // Coupons
        .route(
            "/coupons",
            get(admin::list_coupons).post(admin::create_coupon),
        )
        .route("/coupons/:id", delete(admin::delete_coupon))
        // Uploads
        .route("/uploads", get(admin::list_uploads))
        .route("/uploads/:id", delete(admin::delete_upload))
        // Stats
        .route("/stats", get(admin::get_stats));

    let json_routes = Router::new()
        .nest(API_PREFIX, store_routes)
        .nest(PAYMENTS_PREFIX, payment_routes)
        .route("/admin/login", post(admin_auth::login))
        .route("/admin/logout", post(admin_auth::logout))
        .route("/admin/me", get(admin_auth::me))
        .nest("/admin/api", admin_api_routes)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_bytes));

    Router::new()
        .merge(json_routes)
        .merge(upload_routes)
        .nest_service("/uploads", ServeDir::new(upload_dir))
        // Global middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(TimeoutLayer::new(Duration::from_secs(
                    request_timeout_seconds,
                ))),
        )
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
