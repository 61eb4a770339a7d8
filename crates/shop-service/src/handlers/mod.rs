//! API handlers.

pub mod admin;
pub mod admin_auth;
pub mod health;
pub mod orders;
pub mod payments;
pub mod products;
pub mod uploads;
