//! Stripe API types.

use serde::Deserialize;
use std::collections::HashMap;

/// Stripe `PaymentIntent` object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentIntent {
    /// Payment intent ID.
    pub id: String,
    /// Object type (always "`payment_intent`").
    #[serde(default)]
    pub object: String,
    /// Amount in cents.
    #[serde(default)]
    pub amount: i64,
    /// Currency (e.g., "eur").
    #[serde(default)]
    pub currency: String,
    /// Status (`requires_payment_method`, succeeded, canceled, etc.).
    #[serde(default)]
    pub status: String,
    /// Secret handed to the browser to confirm the payment.
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Created timestamp (Unix).
    #[serde(default)]
    pub created: i64,
    /// Metadata.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Parameters for creating a payment intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateIntentParams {
    /// Amount in cents.
    pub amount: i64,
    /// Lower-case ISO currency code.
    pub currency: String,
    /// Free-text description shown in the dashboard.
    pub description: String,
    /// Order reference stored as `metadata[order_id]`.
    pub order_id: Option<String>,
}

/// Stripe error response.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorResponse {
    /// Error details.
    pub error: StripeErrorDetail,
}

/// Stripe error detail.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorDetail {
    /// Error type.
    #[serde(rename = "type")]
    pub error_type: String,
    /// Error message.
    #[serde(default)]
    pub message: String,
    /// Error code.
    #[serde(default)]
    pub code: Option<String>,
    /// Parameter that caused the error.
    #[serde(default)]
    pub param: Option<String>,
}
