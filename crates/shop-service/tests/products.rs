//! Public catalog integration tests.

mod common;

use common::{TestHarness, API};

// ============================================================================
// Listing
// ============================================================================

#[tokio::test]
async fn list_reports_totals_in_headers() {
    let harness = TestHarness::new();
    for i in 1..=3 {
        harness.seed_product(&format!("Mug {i}"), "10.00").await;
    }

    let response = harness
        .server
        .get(&format!("{API}/products"))
        .add_query_param("per_page", 2)
        .await;

    response.assert_status_ok();
    assert_eq!(response.header("x-wp-total"), "3");
    assert_eq!(response.header("x-wp-totalpages"), "2");

    let body: serde_json::Value = response.json();
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["name"], "Mug 1");
    assert!(items[0]["images"].is_array());
}

#[tokio::test]
async fn max_price_is_tax_inclusive() {
    let harness = TestHarness::new();
    harness.seed_product("Troll Face", "33.33").await;

    // 33.33 excl. VAT is 39.996 incl. VAT.
    let response = harness
        .server
        .get(&format!("{API}/products"))
        .add_query_param("search", "troll")
        .add_query_param("max_price", "40.00")
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body.as_array().unwrap().len(), 1);

    let response = harness
        .server
        .get(&format!("{API}/products"))
        .add_query_param("search", "troll")
        .add_query_param("max_price", "39.00")
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert!(body.as_array().unwrap().is_empty());
    assert_eq!(response.header("x-wp-total"), "0");
}

#[tokio::test]
async fn search_matches_description_case_insensitively() {
    let harness = TestHarness::new();
    harness.seed_product("Poster", "15.00").await;
    harness.seed_product("Sticker", "2.00").await;

    let response = harness
        .server
        .get(&format!("{API}/products"))
        .add_query_param("search", "POSTER DESC")
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "Poster");
}

#[tokio::test]
async fn invalid_price_bound_is_rejected() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get(&format!("{API}/products"))
        .add_query_param("min_price", "cheap")
        .await;

    response.assert_status_bad_request();
}

// ============================================================================
// Single product
// ============================================================================

#[tokio::test]
async fn get_product_by_id() {
    let harness = TestHarness::new();
    let product = harness.seed_product("Troll Face", "33.33").await;

    let response = harness
        .server
        .get(&format!("{API}/product"))
        .add_query_param("id", product.id)
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["id"], product.id);
    assert_eq!(body["price"], "33.33");
    assert_eq!(body["regular_price"], "33.33");
}

#[tokio::test]
async fn get_product_requires_id() {
    let harness = TestHarness::new();

    harness
        .server
        .get(&format!("{API}/product"))
        .await
        .assert_status_bad_request();

    harness
        .server
        .get(&format!("{API}/product"))
        .add_query_param("id", 0)
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn get_missing_product_is_not_found() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get(&format!("{API}/product"))
        .add_query_param("id", 999)
        .await;

    response.assert_status_not_found();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["message"], "Product not found");
}
