//! Stripe integration for card payments.
//!
//! Only the payment intent endpoints are used:
//! - Create an intent for an order total
//! - Retrieve an intent to confirm its status

pub mod client;
pub mod types;

pub use client::StripeClient;
pub use client::StripeError;
pub use types::*;
