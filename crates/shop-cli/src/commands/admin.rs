//! Admin account commands.
//!
//! # Usage
//!
//! ```bash
//! ADMIN_PASSWORD=changeme shop-cli admin create -e admin@example.com -n "Admin" -r super_admin
//! shop-cli admin list
//! ```

use std::sync::Arc;

use shop_core::{Admin, AdminRole, NewAdmin};
use shop_service::services::AdminService;
use shop_store::CollectionStore;

use super::CommandError;

// Accounts are only created and listed here; sessions are never signed.
fn service(store: Arc<dyn CollectionStore>) -> AdminService {
    AdminService::new(store, "")
}

/// Create a new admin account.
///
/// # Arguments
///
/// * `email` - Login email, lower-cased on storage
/// * `name` - Display name
/// * `role` - `super_admin` or `admin`
/// * `password` - Plain-text password, stored as an Argon2id hash
pub async fn create_user(
    store: Arc<dyn CollectionStore>,
    email: &str,
    name: &str,
    role: &str,
    password: &str,
) -> Result<Admin, CommandError> {
    let role: AdminRole = role
        .parse()
        .map_err(|_| CommandError::InvalidRole(role.to_owned()))?;

    // Basic email validation
    if !email.contains('@') || !email.contains('.') {
        return Err(CommandError::InvalidEmail(email.to_owned()));
    }

    tracing::info!("Creating admin user: {} ({})", email, role);
    let admin = service(store)
        .create(NewAdmin {
            email: email.to_owned(),
            password: password.to_owned(),
            name: name.to_owned(),
            role: Some(role),
        })
        .await?;

    tracing::info!("Admin user created with ID: {}", admin.id);
    Ok(admin)
}

/// Print every admin account.
pub async fn list_users(store: Arc<dyn CollectionStore>) -> Result<(), CommandError> {
    let admins = service(store).list().await?;
    if admins.is_empty() {
        println!("No admin accounts");
        return Ok(());
    }
    for admin in admins {
        println!(
            "{}\t{}\t{}\t{}",
            admin.id,
            admin.email,
            admin.role,
            admin.last_login.as_deref().unwrap_or("never")
        );
    }
    Ok(())
}
