//! Application state.

use std::sync::Arc;

use shop_store::CollectionStore;

use crate::config::ServiceConfig;
use crate::crypto;
use crate::services::{
    AdminService, CouponEngine, OrderEngine, PaymentBridge, PaymentProvider, ProductCatalog,
    UploadService,
};
use crate::stripe::StripeClient;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<dyn CollectionStore>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Product catalog.
    pub catalog: ProductCatalog,

    /// Coupon engine.
    pub coupons: CouponEngine,

    /// Order engine.
    pub orders: OrderEngine,

    /// Customer uploads.
    pub uploads: UploadService,

    /// Admin accounts and sessions.
    pub admins: AdminService,

    /// Payment bridge (optional).
    pub payments: Option<PaymentBridge>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Stripe is enabled when a secret key is configured. Without
    /// `admin_session_secret` a random secret is generated, so admin
    /// sessions do not survive a restart.
    #[must_use]
    pub fn new(store: Arc<dyn CollectionStore>, config: ServiceConfig) -> Self {
        let catalog = ProductCatalog::new(Arc::clone(&store), config.product_image_dir());
        let coupons = CouponEngine::new(Arc::clone(&store));
        let orders = OrderEngine::new(Arc::clone(&store), catalog.clone(), coupons.clone());
        let uploads = UploadService::new(
            Arc::clone(&store),
            config.upload_dir.clone(),
            config.max_file_size,
        );

        let session_secret = config.admin_session_secret.clone().unwrap_or_else(|| {
            tracing::warn!("ADMIN_SESSION_SECRET not set - admin sessions end on restart");
            crypto::random_secret(32)
        });
        let admins = AdminService::new(Arc::clone(&store), &session_secret);

        let mut state = Self {
            store,
            config,
            catalog,
            coupons,
            orders,
            uploads,
            admins,
            payments: None,
        };

        // Create Stripe client if configured
        let stripe = state
            .config
            .stripe_secret_key
            .clone()
            .map(|key| StripeClient::new(key, state.config.stripe_api_base.clone()));
        match stripe {
            Some(Ok(client)) => {
                tracing::info!("Stripe integration enabled");
                state = state.with_payment_provider(Arc::new(client));
            }
            Some(Err(e)) => {
                tracing::error!(error = %e, "Stripe client could not be created - payments disabled");
            }
            None => {
                tracing::warn!("Stripe not configured - payments will not be available");
            }
        }

        state
    }

    /// Route payments through `provider`.
    #[must_use]
    pub fn with_payment_provider(mut self, provider: Arc<dyn PaymentProvider>) -> Self {
        self.payments = Some(PaymentBridge::new(
            provider,
            Arc::clone(&self.store),
            self.orders.clone(),
            self.config.stripe_currency.clone(),
            self.config.brand_name.clone(),
        ));
        self
    }

    /// Check if payments are configured.
    #[must_use]
    pub fn has_payments(&self) -> bool {
        self.payments.is_some()
    }
}
