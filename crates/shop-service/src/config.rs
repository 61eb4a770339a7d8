//! Service configuration.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Which collection store backend to open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoreBackend {
    /// One JSON file per collection under `data_dir`.
    #[default]
    File,
    /// Non-durable in-process store.
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" | "filedb" => Ok(Self::File),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown store backend: {other}")),
        }
    }
}

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:3030").
    pub listen_addr: String,

    /// Directory holding the collection files (default: "./data").
    pub data_dir: String,

    /// Store backend (default: file).
    pub store_backend: StoreBackend,

    /// Directory for customer uploads and product images (default: "./uploads").
    pub upload_dir: PathBuf,

    /// Maximum size of one uploaded file in bytes.
    pub max_file_size: usize,

    /// Maximum request body size in bytes for non-upload routes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Stripe secret key (optional).
    pub stripe_secret_key: Option<String>,

    /// Stripe API base URL override (tests, proxies).
    pub stripe_api_base: Option<String>,

    /// Currency for payment intents (default: "eur").
    pub stripe_currency: String,

    /// Secret used to sign admin session tokens. A random secret is generated
    /// at start-up when absent, invalidating sessions on restart.
    pub admin_session_secret: Option<String>,

    /// Brand name expected in payment descriptions (default: "Linepicplus").
    pub brand_name: String,

    /// Deployment environment reported by the health check.
    pub environment: String,
}

/// Stripe secrets file structure.
#[derive(Debug, Deserialize)]
struct StripeSecrets {
    secret_key: String,
    #[serde(default)]
    api_base: Option<String>,
}

const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

impl ServiceConfig {
    /// Load configuration from environment variables and secrets files.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let (stripe_secret_key, stripe_api_base) = load_stripe_secrets();

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            data_dir: std::env::var("DATA_DIR").unwrap_or(defaults.data_dir),
            store_backend: std::env::var("STORE_BACKEND")
                .ok()
                .and_then(|s| {
                    s.parse()
                        .map_err(|e: String| tracing::warn!(error = %e, "Ignoring STORE_BACKEND"))
                        .ok()
                })
                .unwrap_or(defaults.store_backend),
            upload_dir: std::env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            max_file_size: env_parse("MAX_FILE_SIZE").unwrap_or(defaults.max_file_size),
            max_body_bytes: env_parse("MAX_BODY_BYTES").unwrap_or(defaults.max_body_bytes),
            request_timeout_seconds: env_parse("REQUEST_TIMEOUT_SECONDS")
                .unwrap_or(defaults.request_timeout_seconds),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            stripe_secret_key,
            stripe_api_base,
            stripe_currency: std::env::var("STRIPE_CURRENCY")
                .map(|c| c.to_lowercase())
                .unwrap_or(defaults.stripe_currency),
            admin_session_secret: std::env::var("ADMIN_SESSION_SECRET")
                .ok()
                .filter(|s| !s.is_empty()),
            brand_name: std::env::var("BRAND_NAME").unwrap_or(defaults.brand_name),
            environment: std::env::var("ENVIRONMENT")
                .or_else(|_| std::env::var("NODE_ENV"))
                .unwrap_or(defaults.environment),
        }
    }

    /// Directory holding product images.
    #[must_use]
    pub fn product_image_dir(&self) -> PathBuf {
        self.upload_dir.join("products")
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

/// Load Stripe secrets from file or environment.
fn load_stripe_secrets() -> (Option<String>, Option<String>) {
    let secret_paths = [".secrets/stripe.json", "../.secrets/stripe.json"];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<StripeSecrets>(path) {
            tracing::info!(path = %path, "Loaded Stripe secrets from file");
            return (
                Some(secrets.secret_key),
                secrets
                    .api_base
                    .or_else(|| std::env::var("STRIPE_API_BASE").ok()),
            );
        }
    }

    tracing::debug!("Stripe secrets file not found, using environment variables");
    (
        std::env::var("STRIPE_SECRET_KEY").ok().filter(|s| !s.is_empty()),
        std::env::var("STRIPE_API_BASE").ok().filter(|s| !s.is_empty()),
    )
}

/// Load secrets from a JSON file.
fn load_secrets_file<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, std::io::Error> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Secrets file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3030".into(),
            data_dir: "./data".into(),
            store_backend: StoreBackend::File,
            upload_dir: PathBuf::from("./uploads"),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_body_bytes: 10 * 1024 * 1024,
            request_timeout_seconds: 30,
            cors_origins: vec!["*".into()],
            stripe_secret_key: None,
            stripe_api_base: None,
            stripe_currency: "eur".into(),
            admin_session_secret: None,
            brand_name: "Linepicplus".into(),
            environment: "development".into(),
        }
    }
}
