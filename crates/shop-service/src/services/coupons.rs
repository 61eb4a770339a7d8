//! Coupon lookup, validation and redemption bookkeeping.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::json;
use shop_core::{evaluate_coupon, Coupon, CouponValidation, NewCoupon};
use shop_store::schema::collections::COUPONS;
use shop_store::{CollectionStore, FindOptions, Query, Record, SortKey};

use super::Result;
use crate::error::ApiError;

/// Coupon operations over the `coupons` collection.
#[derive(Clone)]
pub struct CouponEngine {
    store: Arc<dyn CollectionStore>,
}

fn normalize(code: &str) -> String {
    code.trim().to_uppercase()
}

impl CouponEngine {
    /// Create a coupon engine.
    pub fn new(store: Arc<dyn CollectionStore>) -> Self {
        Self { store }
    }

    /// Look up a coupon by code, case-insensitively.
    pub async fn find_by_code(&self, code: &str) -> Result<Option<Coupon>> {
        let record = self
            .store
            .find_one(COUPONS, &Query::eq("code", normalize(code)))
            .await?;
        Ok(record.map(shop_store::decode).transpose()?)
    }

    /// Check a coupon against a cart subtotal and the customer's email.
    pub async fn validate(
        &self,
        code: &str,
        subtotal: Decimal,
        email: Option<&str>,
    ) -> Result<CouponValidation> {
        let coupon = self.find_by_code(code).await?;
        let validation = evaluate_coupon(coupon, subtotal, email, Utc::now());
        if !validation.valid {
            tracing::debug!(code, message = ?validation.message, "Coupon rejected");
        }
        Ok(validation)
    }

    /// Record one redemption: bump `usage_count` and remember the email.
    ///
    /// A plain read then write, not atomic with `validate` or with other
    /// increments: concurrent redemptions may both pass validation, and
    /// their increments can overwrite each other so `usage_count` ends up
    /// lower than the number of redemptions.
    pub async fn increment_usage(&self, code: &str, email: Option<&str>) -> Result<()> {
        let Some(mut coupon) = self.find_by_code(code).await? else {
            tracing::warn!(code, "Usage increment for unknown coupon");
            return Ok(());
        };

        coupon.usage_count += 1;
        if let Some(email) = email.filter(|e| !e.is_empty()) {
            coupon.used_by.push(email.to_string());
        }

        let mut patch = Record::new();
        patch.insert("usage_count".into(), json!(coupon.usage_count));
        patch.insert("used_by".into(), json!(coupon.used_by));
        self.store.update_one(COUPONS, &json!(coupon.id), patch).await?;

        tracing::info!(code = %coupon.code, usage_count = coupon.usage_count, "Coupon redeemed");
        Ok(())
    }

    /// Create a coupon. Codes are unique after upper-casing.
    pub async fn create(&self, new: NewCoupon) -> Result<Coupon> {
        if new.code.trim().is_empty() {
            return Err(ApiError::BadRequest("Coupon code is required".into()));
        }
        if self.find_by_code(&new.code).await?.is_some() {
            return Err(ApiError::Conflict(format!(
                "Coupon {} already exists",
                normalize(&new.code)
            )));
        }

        let coupon = Coupon::from_new(new, uuid::Uuid::new_v4().to_string());
        let created = self
            .store
            .create(COUPONS, shop_store::encode(&coupon)?)
            .await?;

        tracing::info!(code = %coupon.code, "Coupon created");
        Ok(shop_store::decode(created)?)
    }

    /// All coupons, newest first.
    pub async fn list(&self) -> Result<Vec<Coupon>> {
        let records = self
            .store
            .find_many(
                COUPONS,
                &Query::all(),
                &FindOptions::sorted(vec![SortKey::desc(shop_store::query::CREATED_AT_FIELD)]),
            )
            .await?;
        Ok(shop_store::decode_all(records)?)
    }

    /// Delete a coupon by ID.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.store.delete_one(COUPONS, &json!(id)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shop_core::{format_money, parse_amount, CouponType};
    use shop_store::MemoryStore;

    fn engine() -> CouponEngine {
        CouponEngine::new(Arc::new(MemoryStore::new()))
    }

    fn new_coupon(code: &str, discount_type: CouponType, amount: &str) -> NewCoupon {
        NewCoupon {
            code: code.into(),
            amount: amount.into(),
            discount_type,
            description: None,
            date_expires: None,
            usage_limit: None,
            usage_limit_per_user: None,
            individual_use: None,
            product_ids: None,
            excluded_product_ids: None,
            minimum_amount: None,
            maximum_amount: None,
            email_restrictions: None,
        }
    }

    #[tokio::test]
    async fn create_normalizes_and_rejects_duplicates() {
        let engine = engine();
        let coupon = engine
            .create(new_coupon(" welcome10 ", CouponType::Percent, "10"))
            .await
            .unwrap();
        assert_eq!(coupon.code, "WELCOME10");
        assert!(coupon.active);

        let dup = engine
            .create(new_coupon("Welcome10", CouponType::FixedCart, "5"))
            .await;
        assert!(matches!(dup, Err(ApiError::Conflict(_))));
    }

    #[tokio::test]
    async fn validate_by_any_case() {
        let engine = engine();
        engine
            .create(new_coupon("WELCOME10", CouponType::Percent, "10"))
            .await
            .unwrap();

        let validation = engine
            .validate("welcome10", parse_amount("66.66").unwrap(), None)
            .await
            .unwrap();
        assert!(validation.valid);
        assert_eq!(format_money(validation.discount.unwrap()), "6.67");

        let unknown = engine
            .validate("NOPE", parse_amount("66.66").unwrap(), None)
            .await
            .unwrap();
        assert!(!unknown.valid);
        assert_eq!(unknown.message.as_deref(), Some("Le code promo est invalide"));
    }

    #[tokio::test]
    async fn usage_increments_until_limit() {
        let engine = engine();
        engine
            .create(NewCoupon {
                usage_limit: Some(1),
                ..new_coupon("ONCE", CouponType::FixedCart, "5")
            })
            .await
            .unwrap();

        engine
            .increment_usage("ONCE", Some("client@example.com"))
            .await
            .unwrap();
        let coupon = engine.find_by_code("ONCE").await.unwrap().unwrap();
        assert_eq!(coupon.usage_count, 1);
        assert_eq!(coupon.used_by, vec!["client@example.com".to_string()]);

        let validation = engine
            .validate("ONCE", parse_amount("20").unwrap(), None)
            .await
            .unwrap();
        assert!(!validation.valid);

        // Unknown codes are ignored.
        engine.increment_usage("MISSING", None).await.unwrap();
    }

    #[tokio::test]
    async fn delete_coupon() {
        let engine = engine();
        let coupon = engine
            .create(new_coupon("BYE", CouponType::FixedCart, "5"))
            .await
            .unwrap();
        assert_eq!(engine.list().await.unwrap().len(), 1);
        assert!(engine.delete(&coupon.id).await.unwrap());
        assert!(!engine.delete(&coupon.id).await.unwrap());
        assert!(engine.list().await.unwrap().is_empty());
    }
}
