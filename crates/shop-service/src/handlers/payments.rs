//! Payment intent handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use shop_core::{parse_amount, ConfirmOutcome};

use crate::error::ApiError;
use crate::services::PaymentBridge;
use crate::state::AppState;

fn payments(state: &AppState) -> Result<&PaymentBridge, ApiError> {
    state
        .payments
        .as_ref()
        .ok_or_else(|| ApiError::ExternalService("Payments are not configured".into()))
}

/// Query parameters for intent creation.
#[derive(Debug, Deserialize)]
pub struct CreateIntentQuery {
    /// Amount in major units, e.g. `59.99`.
    pub amount: Option<String>,
    /// Statement description, `"<brand> - Command <order_id>"`.
    pub description: Option<String>,
    /// Order paid by this intent.
    #[serde(rename = "order-id")]
    pub order_id: Option<String>,
}

/// Payment intent as returned to the storefront.
#[derive(Debug, Serialize)]
pub struct CreateIntentResponse {
    /// Provider intent ID.
    pub id: String,
    /// Secret used by the browser to confirm the payment.
    pub client_secret: String,
    /// Amount in minor units.
    pub amount: i64,
    /// Currency code.
    pub currency: String,
    /// Provider status.
    pub status: String,
    /// Always `payment_intent`.
    pub object: &'static str,
}

/// Create a payment intent.
pub async fn create_intent(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CreateIntentQuery>,
) -> Result<Json<CreateIntentResponse>, ApiError> {
    let amount = query.amount.as_deref().filter(|a| !a.trim().is_empty());
    let description = query.description.as_deref().filter(|d| !d.is_empty());
    let (Some(amount), Some(description)) = (amount, description) else {
        return Err(ApiError::BadRequest(
            "Missing required parameters: amount and description".into(),
        ));
    };

    let amount =
        parse_amount(amount).map_err(|_| ApiError::BadRequest("Invalid amount".into()))?;
    let bridge = payments(&state)?;

    let order_id = query
        .order_id
        .filter(|id| !id.is_empty())
        .or_else(|| bridge.order_id_from_description(description));

    let intent = bridge.create_intent(amount, description, order_id).await?;

    Ok(Json(CreateIntentResponse {
        id: intent.id,
        client_secret: intent.client_secret,
        amount: intent.amount,
        currency: intent.currency,
        status: intent.status,
        object: "payment_intent",
    }))
}

/// Query parameters for intent confirmation.
#[derive(Debug, Deserialize)]
pub struct ConfirmIntentQuery {
    /// Provider intent ID.
    #[serde(rename = "intent-id")]
    pub intent_id: Option<String>,
}

/// Check an intent with the provider and move its order to `processing`
/// once paid.
pub async fn confirm_intent(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConfirmIntentQuery>,
) -> Result<Json<ConfirmOutcome>, ApiError> {
    let intent_id = query
        .intent_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Intent ID is required".into()))?;

    let outcome = payments(&state)?.confirm_intent(intent_id).await?;
    Ok(Json(outcome))
}
