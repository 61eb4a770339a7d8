//! Payment intent bridge between the payment provider and orders.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::json;
use shop_core::payment::{order_id_from_description, ORDER_DELETED};
use shop_core::{to_minor_units, ConfirmOutcome, OrderStatus, PaymentIntentRecord, PAYMENT_SUCCEEDED};
use shop_store::schema::collections::PAYMENT_INTENTS;
use shop_store::{CollectionStore, Record};

use super::{OrderEngine, Result};
use crate::error::ApiError;
use crate::stripe::{CreateIntentParams, PaymentIntent, StripeError};

/// A payment intent provider.
///
/// Implemented by [`crate::stripe::StripeClient`]; tests substitute an
/// in-process fake.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a payment intent.
    async fn create_intent(&self, params: &CreateIntentParams) -> std::result::Result<PaymentIntent, StripeError>;

    /// Fetch a payment intent by ID.
    async fn retrieve_intent(&self, id: &str) -> std::result::Result<PaymentIntent, StripeError>;
}

/// Creates payment intents and moves paid orders to `processing`.
#[derive(Clone)]
pub struct PaymentBridge {
    provider: Arc<dyn PaymentProvider>,
    store: Arc<dyn CollectionStore>,
    orders: OrderEngine,
    currency: String,
    brand: String,
}

impl PaymentBridge {
    /// Create a bridge charging in `currency`. `brand` is the first word of
    /// payment descriptions (`"<brand> - Command <order_id>"`).
    pub fn new(
        provider: Arc<dyn PaymentProvider>,
        store: Arc<dyn CollectionStore>,
        orders: OrderEngine,
        currency: impl Into<String>,
        brand: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            store,
            orders,
            currency: currency.into(),
            brand: brand.into(),
        }
    }

    /// Order ID encoded in a payment description, if it has the expected form.
    #[must_use]
    pub fn order_id_from_description(&self, description: &str) -> Option<String> {
        order_id_from_description(description, &self.brand)
    }

    /// Create a provider intent for `amount` (major units) and mirror it
    /// locally.
    pub async fn create_intent(
        &self,
        amount: Decimal,
        description: &str,
        order_id: Option<String>,
    ) -> Result<PaymentIntentRecord> {
        if amount <= Decimal::ZERO {
            return Err(ApiError::BadRequest("Amount must be positive".into()));
        }
        let cents = to_minor_units(amount)?;

        let params = CreateIntentParams {
            amount: cents,
            currency: self.currency.clone(),
            description: description.to_string(),
            order_id: order_id.clone(),
        };
        let intent = self.provider.create_intent(&params).await.map_err(|e| {
            tracing::error!(error = %e, amount = cents, "Failed to create payment intent");
            ApiError::Internal(format!("Failed to create payment intent: {e}"))
        })?;

        let record = PaymentIntentRecord {
            id: intent.id,
            client_secret: intent.client_secret.unwrap_or_default(),
            amount: intent.amount,
            currency: intent.currency,
            status: intent.status,
            description: Some(description.to_string()),
            order_id,
            metadata: intent.metadata,
            created_at: None,
            updated_at: None,
        };
        let created = self
            .store
            .create(PAYMENT_INTENTS, shop_store::encode(&record)?)
            .await?;

        tracing::info!(
            intent_id = %record.id,
            amount = record.amount,
            order_id = ?record.order_id,
            "Payment intent created"
        );
        Ok(shop_store::decode(created)?)
    }

    async fn local_record(&self, id: &str) -> Result<Option<PaymentIntentRecord>> {
        let record = self.store.find_by_id(PAYMENT_INTENTS, &json!(id)).await?;
        Ok(record.map(shop_store::decode).transpose()?)
    }

    /// Resolve the order an intent pays for: the mirror's `order_id`, then
    /// the mirror's description, then the provider's metadata and
    /// description.
    fn resolve_order_id(
        &self,
        local: Option<&PaymentIntentRecord>,
        intent: &PaymentIntent,
    ) -> Option<String> {
        local
            .and_then(|r| r.order_id.clone())
            .or_else(|| {
                local
                    .and_then(|r| r.description.as_deref())
                    .and_then(|d| self.order_id_from_description(d))
            })
            .or_else(|| intent.metadata.get("order_id").cloned())
            .or_else(|| {
                intent
                    .description
                    .as_deref()
                    .and_then(|d| self.order_id_from_description(d))
            })
            .filter(|id| !id.is_empty())
    }

    /// Re-read an intent from the provider, mirror its status and advance
    /// the paid order.
    ///
    /// Repeating the call for a succeeded intent returns the same outcome.
    pub async fn confirm_intent(&self, id: &str) -> Result<ConfirmOutcome> {
        let intent = self.provider.retrieve_intent(id).await.map_err(|e| {
            if e.is_invalid_request() {
                ApiError::NotFound("Payment intent not found".into())
            } else {
                e.into()
            }
        })?;

        let local = self.local_record(id).await?;
        if local.is_some() {
            let mut patch = Record::new();
            patch.insert("status".into(), json!(intent.status));
            self.store.update_one(PAYMENT_INTENTS, &json!(id), patch).await?;
        }

        let mut outcome = ConfirmOutcome {
            payment_status: intent.status.clone(),
            id: intent.id.clone(),
            amount: intent.amount,
            currency: intent.currency.clone(),
            order_id: None,
            order_status: None,
        };

        if intent.status != PAYMENT_SUCCEEDED {
            tracing::debug!(intent_id = %id, status = %intent.status, "Payment not yet succeeded");
            return Ok(outcome);
        }

        let Some(order_id) = self.resolve_order_id(local.as_ref(), &intent) else {
            tracing::warn!(intent_id = %id, "Succeeded payment has no order reference");
            return Ok(outcome);
        };
        outcome.order_id = Some(order_id.clone());

        let Some(order) = self.orders.get(&order_id).await? else {
            tracing::warn!(intent_id = %id, order_id = %order_id, "Paid order no longer exists");
            outcome.order_status = Some(ORDER_DELETED.to_string());
            return Ok(outcome);
        };

        let status = if order.status == OrderStatus::Pending {
            self.orders
                .update_status(&order_id, OrderStatus::Processing)
                .await?
                .map_or(OrderStatus::Processing, |o| o.status)
        } else {
            order.status
        };
        outcome.order_status = Some(status.to_string());

        tracing::info!(intent_id = %id, order_id = %order_id, status = %status, "Payment confirmed");
        Ok(outcome)
    }
}
