//! Order records and total computation.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::money::{format_money, parse_amount_or_zero};

/// Order currency.
pub const ORDER_CURRENCY: &str = "EUR";

/// Default payment method.
pub const DEFAULT_PAYMENT_METHOD: &str = "stripe";

/// Default payment method title.
pub const DEFAULT_PAYMENT_METHOD_TITLE: &str = "Carte de paiement (Stripe)";

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    /// Created, awaiting payment.
    Pending,
    /// Paid, being prepared.
    Processing,
    /// Awaiting action.
    OnHold,
    /// Fulfilled.
    Completed,
    /// Cancelled by the shop or the customer.
    Cancelled,
    /// Refunded.
    Refunded,
    /// Payment failed.
    Failed,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 7] = [
        Self::Pending,
        Self::Processing,
        Self::OnHold,
        Self::Completed,
        Self::Cancelled,
        Self::Refunded,
        Self::Failed,
    ];

    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::OnHold => "on-hold",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
            Self::Failed => "failed",
        }
    }

    /// Whether the order counts towards revenue.
    #[must_use]
    pub const fn is_revenue(self) -> bool {
        matches!(self, Self::Completed | Self::Processing)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CoreError::InvalidStatus(s.to_string()))
    }
}

/// Billing address and contact details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingAddress {
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Street address.
    pub address_1: String,
    /// Address complement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_2: Option<String>,
    /// City.
    pub city: String,
    /// State or region.
    pub state: String,
    /// Postal code.
    pub postcode: String,
    /// ISO country code.
    pub country: String,
    /// Contact email.
    pub email: String,
    /// Contact phone.
    pub phone: String,
}

/// Shipping address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShippingAddress {
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Street address.
    pub address_1: String,
    /// Address complement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_2: Option<String>,
    /// City.
    pub city: String,
    /// State or region.
    pub state: String,
    /// Postal code.
    pub postcode: String,
    /// ISO country code.
    pub country: String,
}

/// Free-form line item metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaData {
    /// Metadata key.
    pub key: String,
    /// Arbitrary JSON value.
    pub value: serde_json::Value,
}

/// A product line on an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Line ID, assigned on order creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Ordered product.
    pub product_id: i64,
    /// Product name snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Quantity ordered.
    pub quantity: u32,
    /// Price × quantity, before discounts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<String>,
    /// Price × quantity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<String>,
    /// Customisation metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_data: Option<Vec<MetaData>>,
}

impl LineItem {
    /// Snapshot the product name and compute line totals from a unit price.
    pub fn price(&mut self, id: String, name: String, unit_price: Decimal) {
        let total = format_money(unit_price * Decimal::from(self.quantity));
        self.id = Some(id);
        self.name = Some(name);
        self.subtotal = Some(total.clone());
        self.total = Some(total);
    }

    /// Line total, zero when missing or malformed.
    #[must_use]
    pub fn total_amount(&self) -> Decimal {
        parse_amount_or_zero(self.total.as_deref())
    }
}

/// A shipping method line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingLine {
    /// Line ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Carrier method identifier.
    pub method_id: String,
    /// Carrier method label.
    pub method_title: String,
    /// Shipping cost.
    pub total: String,
}

impl ShippingLine {
    /// Free Colissimo delivery without signature.
    #[must_use]
    pub fn colissimo(id: String) -> Self {
        Self {
            id: Some(id),
            method_id: "lpc_nosign".to_string(),
            method_title: "Colissimo sans signature".to_string(),
            total: "0".to_string(),
        }
    }
}

/// A coupon applied to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponLine {
    /// Line ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Coupon code.
    pub code: String,
    /// Discount amount.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<String>,
    /// Tax part of the discount.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_tax: Option<String>,
}

/// A customer order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Order ID.
    pub id: String,
    /// WooCommerce order key.
    pub order_key: String,
    /// Lifecycle status.
    pub status: OrderStatus,
    /// ISO currency code.
    pub currency: String,
    /// Creation timestamp.
    pub date_created: String,
    /// Last modification timestamp.
    pub date_modified: String,
    /// Amount due after discounts.
    pub total: String,
    /// Tax included in `total`.
    pub total_tax: String,
    /// Applied discount.
    pub discount_total: String,
    /// Payment method identifier.
    pub payment_method: String,
    /// Payment method label.
    pub payment_method_title: String,
    /// Whether the order was marked paid on creation.
    pub set_paid: bool,
    /// Billing address.
    pub billing: BillingAddress,
    /// Shipping address.
    pub shipping: ShippingAddress,
    /// Product lines.
    pub line_items: Vec<LineItem>,
    /// Shipping methods.
    #[serde(default)]
    pub shipping_lines: Vec<ShippingLine>,
    /// Applied coupons (at most one).
    #[serde(default)]
    pub coupon_lines: Vec<CouponLine>,
    /// Carrier tracking number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    /// Store creation timestamp.
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Store update timestamp.
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Order {
    /// Sum of stored line totals, before any discount.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.line_items.iter().map(LineItem::total_amount).sum()
    }

    /// Tracking view of this order.
    #[must_use]
    pub fn tracking(&self) -> OrderTracking {
        OrderTracking {
            id: self.id.clone(),
            status: self.status,
            tracking: self.tracking_number.clone(),
        }
    }
}

/// Order total: Σ line totals − discount, rendered with two decimals.
#[must_use]
pub fn order_total(line_items: &[LineItem], discount: &str) -> String {
    let subtotal: Decimal = line_items.iter().map(LineItem::total_amount).sum();
    format_money(subtotal - parse_amount_or_zero(Some(discount)))
}

/// Generate a WooCommerce-style order key.
#[must_use]
pub fn generate_order_key() -> String {
    format!("wc_order_{}", uuid::Uuid::new_v4().simple())
}

/// Order creation request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewOrder {
    /// Payment method identifier.
    #[serde(default)]
    pub payment_method: Option<String>,
    /// Payment method label.
    #[serde(default)]
    pub payment_method_title: Option<String>,
    /// Whether the order was marked paid on creation.
    #[serde(default)]
    pub set_paid: Option<bool>,
    /// Lifecycle status.
    #[serde(default)]
    pub status: Option<OrderStatus>,
    /// Billing address.
    #[serde(default)]
    pub billing: BillingAddress,
    /// Shipping address.
    #[serde(default)]
    pub shipping: ShippingAddress,
    /// Product lines.
    pub line_items: Vec<LineItem>,
    /// Shipping methods.
    #[serde(default)]
    pub shipping_lines: Option<Vec<ShippingLine>>,
    /// Applied coupons (at most one).
    #[serde(default)]
    pub coupon_lines: Option<Vec<CouponLine>>,
}

/// Order status as exposed by the tracking endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTracking {
    /// Order ID.
    pub id: String,
    /// Lifecycle status.
    pub status: OrderStatus,
    /// Carrier tracking number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::parse_amount;

    fn line(product_id: i64, quantity: u32, price: &str) -> LineItem {
        let mut item = LineItem {
            id: None,
            product_id,
            name: None,
            quantity,
            subtotal: None,
            total: None,
            meta_data: None,
        };
        item.price("line-1".into(), "Troll Face".into(), parse_amount(price).unwrap());
        item
    }

    #[test]
    fn line_totals_are_rounded() {
        let item = line(1, 2, "33.33");
        assert_eq!(item.total.as_deref(), Some("66.66"));
        assert_eq!(item.subtotal.as_deref(), Some("66.66"));
        assert_eq!(item.name.as_deref(), Some("Troll Face"));

        let thirds = line(1, 3, "0.335");
        assert_eq!(thirds.total.as_deref(), Some("1.01"));
    }

    #[test]
    fn total_subtracts_discount() {
        let items = vec![line(1, 2, "33.33"), line(2, 1, "10")];
        assert_eq!(order_total(&items, "0"), "76.66");
        assert_eq!(order_total(&items, "6.67"), "69.99");
        assert_eq!(order_total(&items, "garbage"), "76.66");
    }

    #[test]
    fn total_is_idempotent() {
        let items = vec![line(1, 2, "33.33")];
        let first = order_total(&items, "6.67");
        assert_eq!(first, order_total(&items, "6.67"));
        assert_eq!(first, "59.99");
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert_eq!(
            serde_json::to_value(OrderStatus::OnHold).unwrap(),
            serde_json::json!("on-hold")
        );
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn order_key_shape() {
        let key = generate_order_key();
        assert!(key.starts_with("wc_order_"));
        let suffix = &key["wc_order_".len()..];
        assert_eq!(suffix.len(), 32);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn default_shipping_line() {
        let shipping = ShippingLine::colissimo("s-1".into());
        assert_eq!(shipping.method_id, "lpc_nosign");
        assert_eq!(shipping.total, "0");
    }
}
