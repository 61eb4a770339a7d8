//! Health check handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use shop_store::schema::collections::PRODUCTS;
use shop_store::{CollectionStore, Query};

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Current server time.
    pub timestamp: String,
    /// Store status ("connected" or "error").
    pub database: String,
    /// Deployment environment.
    pub environment: String,
}

/// Health check endpoint.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let database = match state.store.count(PRODUCTS, &Query::all()).await {
        Ok(_) => "connected",
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not read the store");
            "error"
        }
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: shop_store::query::timestamp(),
        database: database.to_string(),
        environment: state.config.environment.clone(),
    })
}
