//! Stripe API client implementation.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::types::{CreateIntentParams, PaymentIntent, StripeErrorResponse};
use crate::services::payments::PaymentProvider;

/// Stripe error type reported for unknown object IDs and bad parameters.
pub const INVALID_REQUEST_ERROR: &str = "invalid_request_error";

/// Error type for Stripe operations.
#[derive(Debug, thiserror::Error)]
pub enum StripeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Stripe API returned an error.
    #[error("Stripe API error: {error_type} - {message}")]
    Api {
        /// Error type.
        error_type: String,
        /// Error message.
        message: String,
        /// Error code.
        code: Option<String>,
    },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl StripeError {
    /// Whether Stripe rejected the request itself (unknown ID, bad parameter).
    #[must_use]
    pub fn is_invalid_request(&self) -> bool {
        matches!(self, Self::Api { error_type, .. } if error_type == INVALID_REQUEST_ERROR)
    }
}

/// Stripe API client.
#[derive(Debug, Clone)]
pub struct StripeClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl StripeClient {
    /// Stripe API base URL.
    const BASE_URL: &'static str = "https://api.stripe.com/v1";

    /// Upper bound on one Stripe round trip.
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a new Stripe client.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Stripe secret API key (`sk_test_...` or `sk_live_...`)
    /// * `base_url` - Optional API base override (mock servers, proxies)
    ///
    /// # Errors
    ///
    /// Returns `StripeError::Configuration` if the key is empty or the HTTP
    /// client cannot be built.
    pub fn new(api_key: impl Into<String>, base_url: Option<String>) -> Result<Self, StripeError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(StripeError::Configuration("Stripe secret key is empty".into()));
        }

        let client = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StripeError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| Self::BASE_URL.to_string()),
        })
    }

    /// Create a payment intent with automatic payment methods enabled.
    pub async fn create_payment_intent(
        &self,
        params: &CreateIntentParams,
    ) -> Result<PaymentIntent, StripeError> {
        let mut form = vec![
            ("amount", params.amount.to_string()),
            ("currency", params.currency.clone()),
            ("description", params.description.clone()),
            ("automatic_payment_methods[enabled]", "true".to_string()),
        ];
        if let Some(order_id) = &params.order_id {
            form.push(("metadata[order_id]", order_id.clone()));
        }

        tracing::debug!(
            amount = params.amount,
            currency = %params.currency,
            order_id = ?params.order_id,
            "Creating Stripe payment intent"
        );

        let response = self
            .client
            .post(format!("{}/payment_intents", self.base_url))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .form(&form)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Get a single payment intent by ID.
    pub async fn get_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<PaymentIntent, StripeError> {
        let response = self
            .client
            .get(format!(
                "{}/payment_intents/{}",
                self.base_url, payment_intent_id
            ))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, StripeError> {
        let status = response.status();

        if status.is_success() {
            let body = response.text().await?;
            return Ok(serde_json::from_str(&body)?);
        }

        // Try to parse error response
        let error_body: Result<StripeErrorResponse, _> = response.json().await;

        match error_body {
            Ok(stripe_error) => Err(StripeError::Api {
                error_type: stripe_error.error.error_type,
                message: stripe_error.error.message,
                code: stripe_error.error.code,
            }),
            Err(_) => Err(StripeError::Api {
                error_type: "unknown".to_string(),
                message: format!("HTTP {status}"),
                code: None,
            }),
        }
    }
}

#[async_trait]
impl PaymentProvider for StripeClient {
    async fn create_intent(&self, params: &CreateIntentParams) -> Result<PaymentIntent, StripeError> {
        self.create_payment_intent(params).await
    }

    async fn retrieve_intent(&self, id: &str) -> Result<PaymentIntent, StripeError> {
        self.get_payment_intent(id).await
    }
}
