//! Stripe client tests against a mock Stripe API.

mod common;

use std::sync::Arc;

use axum_test::TestServer;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shop_service::stripe::CreateIntentParams;
use shop_service::{create_router, AppState, StripeClient, StripeError};
use shop_store::MemoryStore;

fn intent_json(id: &str, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "object": "payment_intent",
        "amount": 5999,
        "currency": "eur",
        "status": status,
        "client_secret": format!("{id}_secret_abc"),
        "created": 1_700_000_000,
        "metadata": {"order_id": "order-1"},
        "description": "Linepicplus - Command order-1"
    })
}

// ============================================================================
// Client
// ============================================================================

#[tokio::test]
async fn create_payment_intent_sends_form() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/payment_intents"))
        .and(header_exists("authorization"))
        .and(body_string_contains("amount=5999"))
        .and(body_string_contains("currency=eur"))
        .and(body_string_contains("automatic_payment_methods%5Benabled%5D=true"))
        .and(body_string_contains("metadata%5Border_id%5D=order-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(intent_json("pi_1", "requires_payment_method")))
        .expect(1)
        .mount(&mock)
        .await;

    let client = StripeClient::new("sk_test_123", Some(format!("{}/", mock.uri()))).unwrap();
    let intent = client
        .create_payment_intent(&CreateIntentParams {
            amount: 5999,
            currency: "eur".into(),
            description: "Linepicplus - Command order-1".into(),
            order_id: Some("order-1".into()),
        })
        .await
        .unwrap();

    assert_eq!(intent.id, "pi_1");
    assert_eq!(intent.amount, 5999);
    assert_eq!(intent.client_secret.as_deref(), Some("pi_1_secret_abc"));
    assert_eq!(intent.metadata["order_id"], "order-1");
}

#[tokio::test]
async fn missing_intent_is_invalid_request() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/payment_intents/pi_missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {
                "type": "invalid_request_error",
                "message": "No such payment_intent: 'pi_missing'",
                "code": "resource_missing"
            }
        })))
        .mount(&mock)
        .await;

    let client = StripeClient::new("sk_test_123", Some(mock.uri())).unwrap();
    let err = client.get_payment_intent("pi_missing").await.unwrap_err();

    assert!(err.is_invalid_request());
    assert!(matches!(err, StripeError::Api { code: Some(ref c), .. } if c == "resource_missing"));
}

#[tokio::test]
async fn unparseable_error_body() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/payment_intents/pi_1"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&mock)
        .await;

    let client = StripeClient::new("sk_test_123", Some(mock.uri())).unwrap();
    let err = client.get_payment_intent("pi_1").await.unwrap_err();

    assert!(!err.is_invalid_request());
    assert!(matches!(err, StripeError::Api { ref message, .. } if message.contains("500")));
}

// ============================================================================
// Service wired to the mock API
// ============================================================================

#[tokio::test]
async fn confirm_intent_through_stripe() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/payment_intents/pi_paid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(intent_json("pi_paid", "succeeded")))
        .mount(&mock)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let mut config = common::test_config(&temp_dir);
    config.stripe_secret_key = Some("sk_test_123".into());
    config.stripe_api_base = Some(mock.uri());

    let state = AppState::new(Arc::new(MemoryStore::new()), config);
    assert!(state.has_payments());
    let server = TestServer::new(create_router(state)).unwrap();

    let response = server
        .post(&format!("{}/confirm-intent", common::PAYMENTS))
        .add_query_param("intent-id", "pi_paid")
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["paymentStatus"], "succeeded");
    assert_eq!(body["order_id"], "order-1");
    assert_eq!(body["order_status"], "deleted");
}

#[tokio::test]
async fn payments_unavailable_without_key() {
    let temp_dir = TempDir::new().unwrap();
    let state = AppState::new(Arc::new(MemoryStore::new()), common::test_config(&temp_dir));
    assert!(!state.has_payments());
    let server = TestServer::new(create_router(state)).unwrap();

    let response = server
        .post(&format!("{}/create-intent", common::PAYMENTS))
        .add_query_param("amount", "10.00")
        .add_query_param("description", "Linepicplus - Command x")
        .await;

    assert_eq!(response.status_code(), 502);
}
