//! Coupon records and redemption rules.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::{parse_amount, parse_amount_or_zero};

/// How a coupon's `amount` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouponType {
    /// Flat amount off the cart.
    FixedCart,
    /// Percentage of the cart subtotal.
    Percent,
    /// Flat amount off eligible products. Never produces a discount.
    FixedProduct,
    /// Percentage off eligible products. Never produces a discount.
    PercentProduct,
}

/// A discount coupon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    /// Store ID.
    pub id: String,
    /// Upper-cased redemption code.
    pub code: String,
    /// Discount amount (flat or percentage, per `discount_type`).
    pub amount: String,
    /// Discount type.
    #[serde(rename = "type")]
    pub discount_type: CouponType,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Expiry date; the coupon is rejected once this instant has passed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_expires: Option<String>,
    /// Number of successful redemptions.
    #[serde(default)]
    pub usage_count: u32,
    /// Maximum redemptions; absent or zero means unlimited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_limit: Option<u32>,
    /// Per-customer limit (stored, not enforced).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_limit_per_user: Option<u32>,
    /// Whether the coupon excludes other coupons.
    #[serde(default)]
    pub individual_use: bool,
    /// Eligible products (stored, not enforced).
    #[serde(default)]
    pub product_ids: Vec<i64>,
    /// Excluded products (stored, not enforced).
    #[serde(default)]
    pub excluded_product_ids: Vec<i64>,
    /// Minimum order subtotal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_amount: Option<String>,
    /// Maximum order subtotal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_amount: Option<String>,
    /// Allowed billing emails; empty means anyone.
    #[serde(default)]
    pub email_restrictions: Vec<String>,
    /// Emails that redeemed the coupon, append-only.
    #[serde(default)]
    pub used_by: Vec<String>,
    /// Whether the coupon can be redeemed.
    #[serde(default)]
    pub active: bool,
    /// Creation timestamp.
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Last update timestamp.
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Coupon {
    /// Build an active, unused coupon from a creation request.
    #[must_use]
    pub fn from_new(new: NewCoupon, id: String) -> Self {
        Self {
            id,
            code: new.code.trim().to_uppercase(),
            amount: new.amount,
            discount_type: new.discount_type,
            description: new.description.unwrap_or_default(),
            date_expires: new.date_expires.filter(|d| !d.is_empty()),
            usage_count: 0,
            usage_limit: new.usage_limit,
            usage_limit_per_user: new.usage_limit_per_user,
            individual_use: new.individual_use.unwrap_or(false),
            product_ids: new.product_ids.unwrap_or_default(),
            excluded_product_ids: new.excluded_product_ids.unwrap_or_default(),
            minimum_amount: new.minimum_amount,
            maximum_amount: new.maximum_amount,
            email_restrictions: new.email_restrictions.unwrap_or_default(),
            used_by: Vec::new(),
            active: true,
            created_at: None,
            updated_at: None,
        }
    }

    /// Run every rule after existence, in order, and compute the discount.
    ///
    /// # Errors
    ///
    /// Returns the first failing rule.
    pub fn check(
        &self,
        subtotal: Decimal,
        email: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Decimal, CouponRejection> {
        if !self.active {
            return Err(CouponRejection::Inactive);
        }

        if let Some(expires) = self.date_expires.as_deref().and_then(parse_expiry) {
            if expires < now {
                return Err(CouponRejection::Expired);
            }
        }

        if let Some(limit) = self.usage_limit.filter(|l| *l > 0) {
            if self.usage_count >= limit {
                return Err(CouponRejection::UsageLimitReached);
            }
        }

        if let Some(email) = email.filter(|e| !e.is_empty()) {
            if !self.email_restrictions.is_empty()
                && !self.email_restrictions.iter().any(|allowed| allowed == email)
            {
                return Err(CouponRejection::EmailNotAllowed);
            }
        }

        if let Some((raw, minimum)) = bound(self.minimum_amount.as_deref()) {
            if subtotal < minimum {
                return Err(CouponRejection::BelowMinimum(raw.to_string()));
            }
        }

        if let Some((raw, maximum)) = bound(self.maximum_amount.as_deref()) {
            if subtotal > maximum {
                return Err(CouponRejection::AboveMaximum(raw.to_string()));
            }
        }

        Ok(self.discount_for(subtotal))
    }

    /// Discount for a subtotal, unrounded and unclamped.
    #[must_use]
    pub fn discount_for(&self, subtotal: Decimal) -> Decimal {
        let amount = parse_amount_or_zero(Some(&self.amount));
        match self.discount_type {
            CouponType::FixedCart => amount,
            CouponType::Percent => subtotal * amount / Decimal::ONE_HUNDRED,
            // Product-scoped types never discount.
            CouponType::FixedProduct | CouponType::PercentProduct => Decimal::ZERO,
        }
    }
}

/// Parse an optional decimal bound; empty or malformed bounds are ignored.
fn bound(raw: Option<&str>) -> Option<(&str, Decimal)> {
    let raw = raw.filter(|r| !r.trim().is_empty())?;
    parse_amount(raw).ok().map(|value| (raw, value))
}

/// Parse an expiry timestamp: RFC 3339, naive date-time (UTC) or plain date.
fn parse_expiry(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Coupon creation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCoupon {
    /// Redemption code (upper-cased on creation).
    pub code: String,
    /// Discount amount.
    pub amount: String,
    /// Discount type.
    #[serde(rename = "type")]
    pub discount_type: CouponType,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Expiry date.
    #[serde(default)]
    pub date_expires: Option<String>,
    /// Maximum redemptions.
    #[serde(default)]
    pub usage_limit: Option<u32>,
    /// Per-customer limit.
    #[serde(default)]
    pub usage_limit_per_user: Option<u32>,
    /// Exclusive coupon flag.
    #[serde(default)]
    pub individual_use: Option<bool>,
    /// Eligible products.
    #[serde(default)]
    pub product_ids: Option<Vec<i64>>,
    /// Excluded products.
    #[serde(default)]
    pub excluded_product_ids: Option<Vec<i64>>,
    /// Minimum order subtotal.
    #[serde(default)]
    pub minimum_amount: Option<String>,
    /// Maximum order subtotal.
    #[serde(default)]
    pub maximum_amount: Option<String>,
    /// Allowed billing emails.
    #[serde(default)]
    pub email_restrictions: Option<Vec<String>>,
}

/// Why a coupon cannot be redeemed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CouponRejection {
    /// No coupon with that code.
    #[error("Le code promo est invalide")]
    NotFound,
    /// The coupon is disabled.
    #[error("Le code promo est inactif")]
    Inactive,
    /// The expiry date has passed.
    #[error("Le code promo a expiré")]
    Expired,
    /// `usage_count` reached `usage_limit`.
    #[error("Le code promo a atteint sa limite d'utilisation")]
    UsageLimitReached,
    /// The billing email is not on the allow-list.
    #[error("Ce code promo n'est pas valide pour votre adresse email")]
    EmailNotAllowed,
    /// Subtotal below `minimum_amount`.
    #[error("Montant minimum requis: {0}€")]
    BelowMinimum(String),
    /// Subtotal above `maximum_amount`.
    #[error("Montant maximum autorisé: {0}€")]
    AboveMaximum(String),
}

/// Outcome of validating a coupon code against an order subtotal.
#[derive(Debug, Clone, Serialize)]
pub struct CouponValidation {
    /// Whether the coupon can be applied.
    pub valid: bool,
    /// Rejection message when invalid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Computed discount when valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<Decimal>,
    /// The coupon record when it exists and is valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon: Option<Coupon>,
}

impl CouponValidation {
    fn rejected(reason: &CouponRejection) -> Self {
        Self {
            valid: false,
            message: Some(reason.to_string()),
            discount: None,
            coupon: None,
        }
    }
}

/// Validate a looked-up coupon (or its absence) against an order subtotal.
#[must_use]
pub fn evaluate_coupon(
    coupon: Option<Coupon>,
    subtotal: Decimal,
    email: Option<&str>,
    now: DateTime<Utc>,
) -> CouponValidation {
    let Some(coupon) = coupon else {
        return CouponValidation::rejected(&CouponRejection::NotFound);
    };
    match coupon.check(subtotal, email, now) {
        Ok(discount) => CouponValidation {
            valid: true,
            message: None,
            discount: Some(discount),
            coupon: Some(coupon),
        },
        Err(reason) => CouponValidation::rejected(&reason),
    }
}
