//! Linepicplus shop HTTP API service.
//!
//! This crate provides the HTTP API for the shop backend, including:
//!
//! - WooCommerce-compatible storefront routes (catalog, orders, coupons,
//!   customer uploads)
//! - Stripe payment intents
//! - The admin API (orders, products, coupons, uploads, statistics)
//!
//! # Authentication
//!
//! Storefront and payment routes are public. Admin routes require a session
//! token issued by `POST /admin/login`, carried in the `admin_session`
//! cookie or the `x-admin-session` header.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Logout has nothing to await

pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod services;
pub mod state;
pub mod stripe;

pub use config::{ServiceConfig, StoreBackend};
pub use error::ApiError;
pub use routes::create_router;
pub use services::{PaymentProvider, UploadInput};
pub use state::AppState;
pub use stripe::{StripeClient, StripeError};
