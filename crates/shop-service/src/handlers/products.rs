//! Public catalog handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;

use shop_core::{parse_amount, Product, ProductListItem, ProductQuery};

use crate::error::ApiError;
use crate::state::AppState;

/// Total number of matching products.
pub const TOTAL_HEADER: &str = "x-wp-total";

/// Total number of pages.
pub const TOTAL_PAGES_HEADER: &str = "x-wp-totalpages";

fn default_page() -> usize {
    1
}

fn default_per_page() -> usize {
    10
}

/// Query parameters for the public product list.
#[derive(Debug, Deserialize)]
pub struct ListProductsQuery {
    /// 1-based page number.
    #[serde(default = "default_page")]
    pub page: usize,
    /// Page size.
    #[serde(default = "default_per_page")]
    pub per_page: usize,
    /// Free-text search.
    pub search: Option<String>,
    /// Minimum VAT-inclusive price.
    pub min_price: Option<String>,
    /// Maximum VAT-inclusive price.
    pub max_price: Option<String>,
}

fn price_bound(name: &str, value: Option<&str>) -> Result<Option<Decimal>, ApiError> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| {
            parse_amount(v.trim()).map_err(|_| ApiError::BadRequest(format!("Invalid {name}")))
        })
        .transpose()
}

impl ListProductsQuery {
    /// Convert to catalog listing parameters.
    pub fn to_product_query(&self) -> Result<ProductQuery, ApiError> {
        Ok(ProductQuery {
            page: self.page,
            per_page: self.per_page,
            search: self.search.clone(),
            min_price: price_bound("min_price", self.min_price.as_deref())?,
            max_price: price_bound("max_price", self.max_price.as_deref())?,
        })
    }
}

/// List products. Totals are reported in the `x-wp-total` and
/// `x-wp-totalpages` headers.
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListProductsQuery>,
) -> Result<([(&'static str, String); 2], Json<Vec<ProductListItem>>), ApiError> {
    let params = query.to_product_query()?;
    let page = state.catalog.list(&params).await?;

    tracing::debug!(
        total = page.total,
        page = page.page,
        search = ?params.search,
        "Listed products"
    );

    let items = page.data.iter().map(Product::to_list_item).collect();
    Ok((
        [
            (TOTAL_HEADER, page.total.to_string()),
            (TOTAL_PAGES_HEADER, page.total_pages.to_string()),
        ],
        Json(items),
    ))
}

/// Query parameters for a single product.
#[derive(Debug, Deserialize)]
pub struct ProductIdQuery {
    /// Product ID.
    pub id: Option<String>,
}

/// Parse a public product ID; zero and non-numeric values are rejected.
pub(crate) fn parse_product_id(raw: Option<&str>) -> Result<i64, ApiError> {
    raw.and_then(|id| id.trim().parse::<i64>().ok())
        .filter(|id| *id != 0)
        .ok_or_else(|| ApiError::BadRequest("Product ID is required".into()))
}

/// Get one product.
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProductIdQuery>,
) -> Result<Json<Product>, ApiError> {
    let id = parse_product_id(query.id.as_deref())?;

    state
        .catalog
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Product not found".into()))
}
