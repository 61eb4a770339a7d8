//! Common test utilities for shop service integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum_test::TestServer;
use serde_json::json;
use tempfile::TempDir;

use shop_core::{NewAdmin, NewCoupon, NewProduct, Product};
use shop_service::services::{AdminService, CouponEngine, ProductCatalog};
use shop_service::stripe::client::INVALID_REQUEST_ERROR;
use shop_service::stripe::{CreateIntentParams, PaymentIntent, StripeError};
use shop_service::{create_router, AppState, PaymentProvider, ServiceConfig};
use shop_store::{CollectionStore, MemoryStore};

/// Storefront API prefix.
pub const API: &str = "/wp-json/linepicplus/v1";

/// Payments API prefix.
pub const PAYMENTS: &str = "/wp-json/linepicplus-payments/v1";

/// Admin account created by [`TestHarness::login_admin`].
pub const ADMIN_EMAIL: &str = "admin@linepicplus.test";

/// Password of the test admin.
pub const ADMIN_PASSWORD: &str = "correct horse battery staple";

/// In-process payment provider.
///
/// Intents start as `requires_payment_method`; [`FakePaymentProvider::succeed`]
/// marks one as paid. Unknown IDs fail like Stripe does.
#[derive(Default)]
pub struct FakePaymentProvider {
    intents: Mutex<HashMap<String, PaymentIntent>>,
    create_rejection: Mutex<Option<String>>,
}

impl FakePaymentProvider {
    /// Fail the next create with an `invalid_request_error` carrying `message`.
    pub fn reject_next_create(&self, message: &str) {
        *self.create_rejection.lock().unwrap() = Some(message.to_string());
    }

    /// Mark an intent as paid.
    pub fn succeed(&self, id: &str) {
        if let Some(intent) = self.intents.lock().unwrap().get_mut(id) {
            intent.status = "succeeded".into();
        }
    }

    /// Current state of an intent.
    pub fn retrieve(&self, id: &str) -> Option<PaymentIntent> {
        self.intents.lock().unwrap().get(id).cloned()
    }
}

#[async_trait]
impl PaymentProvider for FakePaymentProvider {
    async fn create_intent(&self, params: &CreateIntentParams) -> Result<PaymentIntent, StripeError> {
        if let Some(message) = self.create_rejection.lock().unwrap().take() {
            return Err(StripeError::Api {
                error_type: INVALID_REQUEST_ERROR.into(),
                message,
                code: Some("amount_too_small".into()),
            });
        }
        let mut intents = self.intents.lock().unwrap();
        let id = format!("pi_test_{}", intents.len() + 1);
        let mut metadata = HashMap::new();
        if let Some(order_id) = &params.order_id {
            metadata.insert("order_id".to_string(), order_id.clone());
        }
        let intent = PaymentIntent {
            id: id.clone(),
            object: "payment_intent".into(),
            amount: params.amount,
            currency: params.currency.clone(),
            status: "requires_payment_method".into(),
            client_secret: Some(format!("{id}_secret_test")),
            created: 1_700_000_000,
            metadata,
            description: Some(params.description.clone()),
        };
        intents.insert(id, intent.clone());
        Ok(intent)
    }

    async fn retrieve_intent(&self, id: &str) -> Result<PaymentIntent, StripeError> {
        self.intents
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| StripeError::Api {
                error_type: INVALID_REQUEST_ERROR.into(),
                message: format!("No such payment_intent: '{id}'"),
                code: Some("resource_missing".into()),
            })
    }
}

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Temporary directory for uploads (kept alive for test duration).
    pub _temp_dir: TempDir,
    /// The shared store.
    pub store: Arc<dyn CollectionStore>,
    /// Catalog, for seeding products.
    pub catalog: ProductCatalog,
    /// Coupon engine, for seeding coupons.
    pub coupons: CouponEngine,
    /// Admin accounts.
    pub admins: AdminService,
    /// The payment provider behind the payment routes.
    pub payments: Arc<FakePaymentProvider>,
}

/// Configuration pointing at a temporary upload directory.
pub fn test_config(temp_dir: &TempDir) -> ServiceConfig {
    ServiceConfig {
        listen_addr: "127.0.0.1:0".into(),
        data_dir: temp_dir.path().join("data").to_string_lossy().to_string(),
        upload_dir: temp_dir.path().join("uploads"),
        max_file_size: 64 * 1024,
        admin_session_secret: Some("test-session-secret".into()),
        environment: "test".into(),
        ..ServiceConfig::default()
    }
}

impl TestHarness {
    /// Create a new test harness with an empty in-memory store.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store: Arc<dyn CollectionStore> = Arc::new(MemoryStore::new());
        Self::with_store(temp_dir, store)
    }

    /// Create a harness over an existing store.
    pub fn with_store(temp_dir: TempDir, store: Arc<dyn CollectionStore>) -> Self {
        let config = test_config(&temp_dir);
        let payments = Arc::new(FakePaymentProvider::default());

        let state = AppState::new(Arc::clone(&store), config)
            .with_payment_provider(Arc::clone(&payments) as Arc<dyn PaymentProvider>);
        let catalog = state.catalog.clone();
        let coupons = state.coupons.clone();
        let admins = state.admins.clone();

        let router: Router = create_router(state);
        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            _temp_dir: temp_dir,
            store,
            catalog,
            coupons,
            admins,
            payments,
        }
    }

    /// Directory customer uploads are written to.
    pub fn upload_dir(&self) -> std::path::PathBuf {
        self._temp_dir.path().join("uploads")
    }

    /// Add a product to the catalog.
    pub async fn seed_product(&self, name: &str, price: &str) -> Product {
        self.catalog
            .create(NewProduct {
                name: name.into(),
                description: Some(format!("{name} description")),
                price: price.into(),
                ..NewProduct::default()
            })
            .await
            .expect("Failed to seed product")
    }

    /// Add an active percentage coupon.
    pub async fn seed_percent_coupon(&self, code: &str, percent: &str) {
        let coupon: NewCoupon = serde_json::from_value(json!({
            "code": code,
            "amount": percent,
            "type": "percent",
        }))
        .expect("valid coupon");
        self.coupons
            .create(coupon)
            .await
            .expect("Failed to seed coupon");
    }

    /// Create an order for `quantity` units of `product_id` and return its JSON.
    pub async fn create_order(&self, product_id: i64, quantity: u32) -> serde_json::Value {
        let response = self
            .server
            .post(&format!("{API}/orders"))
            .json(&json!({
                "billing": {"first_name": "Ada", "last_name": "Lovelace", "email": "ada@example.com"},
                "shipping": {"first_name": "Ada", "last_name": "Lovelace"},
                "line_items": [{"product_id": product_id, "quantity": quantity}]
            }))
            .await;
        response.assert_status_ok();
        response.json()
    }

    /// Create the test admin and return a session token.
    pub async fn login_admin(&self) -> String {
        self.admins
            .create(NewAdmin {
                email: ADMIN_EMAIL.into(),
                password: ADMIN_PASSWORD.into(),
                name: "Test Admin".into(),
                role: None,
            })
            .await
            .expect("Failed to create admin");

        let response = self
            .server
            .post("/admin/login")
            .json(&json!({"email": ADMIN_EMAIL, "password": ADMIN_PASSWORD}))
            .await;
        response.assert_status_ok();

        let cookie = response.header("set-cookie");
        let cookie = cookie.to_str().expect("cookie is ASCII");
        cookie
            .split(';')
            .next()
            .and_then(|pair| pair.strip_prefix("admin_session="))
            .expect("session cookie")
            .to_string()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
