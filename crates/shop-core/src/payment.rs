//! Payment intent mirror records.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Provider status of a captured payment.
pub const PAYMENT_SUCCEEDED: &str = "succeeded";

/// Order status reported when a paid order no longer exists.
pub const ORDER_DELETED: &str = "deleted";

/// Local mirror of a provider payment intent, keyed by the provider ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntentRecord {
    /// Provider intent ID.
    pub id: String,
    /// Secret handed to the browser to confirm the payment.
    pub client_secret: String,
    /// Amount in minor units.
    pub amount: i64,
    /// Lower-case ISO currency code.
    pub currency: String,
    /// Last known provider status.
    pub status: String,
    /// Free-text description sent to the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Order paid by this intent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    /// Provider metadata.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// Store creation timestamp.
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Store update timestamp.
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Result of confirming a payment intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmOutcome {
    /// Provider status.
    #[serde(rename = "paymentStatus")]
    pub payment_status: String,
    /// Provider intent ID.
    pub id: String,
    /// Amount in minor units.
    pub amount: i64,
    /// Lower-case ISO currency code.
    pub currency: String,
    /// Order ID, reported when the paid order is gone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    /// `"deleted"` when the paid order is gone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_status: Option<String>,
}

/// Extract the order ID from a `"<brand> - Command <order_id>"` description.
///
/// The description must split on single spaces into exactly four parts.
#[must_use]
pub fn order_id_from_description(description: &str, brand: &str) -> Option<String> {
    let parts: Vec<&str> = description.split(' ').collect();
    match parts.as_slice() {
        [first, _, "Command", order_id] if *first == brand && !order_id.is_empty() => {
            Some((*order_id).to_string())
        }
        _ => None,
    }
}
