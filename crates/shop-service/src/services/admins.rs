//! Admin accounts and session tokens.

use std::sync::Arc;

use serde_json::json;
use shop_core::{Admin, NewAdmin};
use shop_store::query::timestamp;
use shop_store::schema::collections::ADMINS;
use shop_store::{CollectionStore, FindOptions, Query, Record};

use super::Result;
use crate::crypto::{self, PasswordCheck};
use crate::error::ApiError;

/// Admin account operations over the `admins` collection.
#[derive(Clone)]
pub struct AdminService {
    store: Arc<dyn CollectionStore>,
    session_secret: Arc<str>,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl AdminService {
    /// Create an admin service signing sessions with `session_secret`.
    pub fn new(store: Arc<dyn CollectionStore>, session_secret: &str) -> Self {
        Self {
            store,
            session_secret: Arc::from(session_secret),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Admin>> {
        let record = self
            .store
            .find_one(ADMINS, &Query::eq("email", normalize_email(email)))
            .await?;
        Ok(record.map(shop_store::decode).transpose()?)
    }

    /// Create an admin account with an Argon2id password hash.
    pub async fn create(&self, new: NewAdmin) -> Result<Admin> {
        let email = normalize_email(&new.email);
        if email.is_empty() || new.password.is_empty() {
            return Err(ApiError::BadRequest("Email and password are required".into()));
        }
        if self.find_by_email(&email).await?.is_some() {
            return Err(ApiError::Conflict(format!("Admin {email} already exists")));
        }

        let password =
            crypto::hash_password(&new.password).map_err(|e| ApiError::Internal(e.to_string()))?;
        let admin = Admin {
            id: uuid::Uuid::new_v4().to_string(),
            email,
            password,
            name: new.name,
            role: new.role.unwrap_or_default(),
            last_login: None,
            created_at: None,
            updated_at: None,
        };
        let created = self.store.create(ADMINS, shop_store::encode(&admin)?).await?;

        tracing::info!(admin_id = %admin.id, email = %admin.email, role = %admin.role, "Admin created");
        Ok(shop_store::decode(created)?)
    }

    /// Check credentials. On success `lastLogin` is stamped and a legacy
    /// SHA-256 hash is replaced with Argon2id.
    pub async fn login(&self, email: &str, password: &str) -> Result<Option<Admin>> {
        let Some(admin) = self.find_by_email(email).await? else {
            tracing::debug!(email, "Login for unknown admin");
            return Ok(None);
        };

        let check = crypto::verify_password(password, &admin.password);
        if check == PasswordCheck::Invalid {
            tracing::warn!(admin_id = %admin.id, "Admin login failed");
            return Ok(None);
        }

        let mut patch = Record::new();
        patch.insert("lastLogin".into(), json!(timestamp()));
        if check == PasswordCheck::ValidLegacy {
            let upgraded =
                crypto::hash_password(password).map_err(|e| ApiError::Internal(e.to_string()))?;
            patch.insert("password".into(), json!(upgraded));
            tracing::info!(admin_id = %admin.id, "Upgraded legacy password hash");
        }

        let updated = self.store.update_one(ADMINS, &json!(admin.id), patch).await?;
        tracing::info!(admin_id = %admin.id, "Admin logged in");
        Ok(updated.map(shop_store::decode).transpose()?)
    }

    /// Look up an admin by ID.
    pub async fn get(&self, id: &str) -> Result<Option<Admin>> {
        let record = self.store.find_by_id(ADMINS, &json!(id)).await?;
        Ok(record.map(shop_store::decode).transpose()?)
    }

    /// All admin accounts.
    pub async fn list(&self) -> Result<Vec<Admin>> {
        let records = self
            .store
            .find_many(ADMINS, &Query::all(), &FindOptions::default())
            .await?;
        Ok(shop_store::decode_all(records)?)
    }

    /// Session token for an admin: `<id>.<hex hmac>`.
    pub fn issue_token(&self, admin_id: &str) -> Result<String> {
        let signature = crypto::hmac_sha256_hex(&self.session_secret, admin_id)
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        Ok(format!("{admin_id}.{signature}"))
    }

    /// Admin ID carried by a correctly signed token.
    #[must_use]
    pub fn verify_token(&self, token: &str) -> Option<String> {
        let (admin_id, signature) = token.rsplit_once('.')?;
        if admin_id.is_empty() {
            return None;
        }
        let expected = crypto::hmac_sha256_hex(&self.session_secret, admin_id).ok()?;
        crypto::constant_time_eq(&expected, signature).then(|| admin_id.to_string())
    }
}
