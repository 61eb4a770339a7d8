//! Catalog records and listing rules.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::{parse_amount, strip_tax};

/// A product image reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    /// Image URL (absolute, or relative to the service root).
    pub src: String,
}

/// A product attribute such as size or color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductAttribute {
    /// Attribute ID (0 for custom attributes).
    #[serde(default)]
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Selectable options, in display order.
    #[serde(default)]
    pub options: Vec<String>,
    /// Display position.
    #[serde(default)]
    pub position: i64,
    /// Whether the attribute is shown on the product page.
    #[serde(default)]
    pub visible: bool,
    /// Whether the attribute is used for variations.
    #[serde(default)]
    pub variation: bool,
    /// Numeric mirror of `visible`.
    #[serde(default)]
    pub is_visible: i64,
    /// Numeric mirror of `variation`.
    #[serde(default)]
    pub is_variation: i64,
    /// Whether the attribute is a global taxonomy.
    #[serde(default)]
    pub is_taxonomy: i64,
    /// Options joined with `" | "`.
    #[serde(default)]
    pub value: String,
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Public numeric product ID.
    pub id: i64,
    /// Product name.
    pub name: String,
    /// HTML description.
    #[serde(default)]
    pub description: String,
    /// Current price, VAT-exclusive.
    pub price: String,
    /// Stock keeping unit.
    #[serde(default)]
    pub sku: String,
    /// Regular (non-sale) price, VAT-exclusive.
    #[serde(default)]
    pub regular_price: String,
    /// Attributes, in display order.
    #[serde(default)]
    pub attributes: Vec<ProductAttribute>,
    /// Images, in display order.
    #[serde(default)]
    pub images: Vec<ProductImage>,
    /// Creation timestamp (assigned by the store).
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Last update timestamp (assigned by the store).
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Product {
    /// Build a product from a creation request and the ID it will be stored under.
    #[must_use]
    pub fn from_new(new: NewProduct, id: i64) -> Self {
        let regular_price = new
            .regular_price
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| new.price.clone());
        Self {
            id,
            name: new.name,
            description: new.description.unwrap_or_default(),
            price: new.price,
            sku: new.sku.unwrap_or_default(),
            regular_price,
            attributes: new.attributes.unwrap_or_default(),
            images: new.images.unwrap_or_default(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Case-insensitive substring match on name or description.
    ///
    /// `needle` must already be lower-cased.
    #[must_use]
    pub fn matches_search(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
    }

    /// Check the stored price against VAT-inclusive bounds (both inclusive).
    ///
    /// A product whose price cannot be parsed never matches a bounded query.
    #[must_use]
    pub fn price_within(&self, min_inclusive: Option<Decimal>, max_inclusive: Option<Decimal>) -> bool {
        if min_inclusive.is_none() && max_inclusive.is_none() {
            return true;
        }
        let Ok(price) = parse_amount(&self.price) else {
            return false;
        };
        if let Some(min) = min_inclusive {
            if price < strip_tax(min) {
                return false;
            }
        }
        if let Some(max) = max_inclusive {
            if price > strip_tax(max) {
                return false;
            }
        }
        true
    }

    /// The list-view projection of this product.
    #[must_use]
    pub fn to_list_item(&self) -> ProductListItem {
        ProductListItem {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            price: self.price.clone(),
            images: self.images.iter().map(|img| img.src.clone()).collect(),
        }
    }
}

/// Product as returned by the public list endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductListItem {
    /// Product ID.
    pub id: i64,
    /// Product name.
    pub name: String,
    /// HTML description.
    pub description: String,
    /// VAT-exclusive price.
    pub price: String,
    /// Image URLs.
    pub images: Vec<String>,
}

/// Product creation request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProduct {
    /// Explicit ID (seeding); assigned as `max + 1` when absent.
    #[serde(default)]
    pub id: Option<i64>,
    /// Product name.
    pub name: String,
    /// HTML description.
    #[serde(default)]
    pub description: Option<String>,
    /// VAT-exclusive price.
    pub price: String,
    /// Stock keeping unit.
    #[serde(default)]
    pub sku: Option<String>,
    /// Regular price; defaults to `price`.
    #[serde(default)]
    pub regular_price: Option<String>,
    /// Attributes.
    #[serde(default)]
    pub attributes: Option<Vec<ProductAttribute>>,
    /// Images.
    #[serde(default)]
    pub images: Option<Vec<ProductImage>>,
}

/// Partial product update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductPatch {
    /// Product name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// HTML description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// VAT-exclusive price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    /// Stock keeping unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    /// Regular price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regular_price: Option<String>,
    /// Attributes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Vec<ProductAttribute>>,
    /// Images.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ProductImage>>,
}

/// Catalog listing parameters.
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    /// 1-based page number.
    pub page: usize,
    /// Page size.
    pub per_page: usize,
    /// Free-text search on name and description.
    pub search: Option<String>,
    /// Minimum price, VAT-inclusive.
    pub min_price: Option<Decimal>,
    /// Maximum price, VAT-inclusive.
    pub max_price: Option<Decimal>,
}

/// A page of results with totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page.
    pub data: Vec<T>,
    /// Number of matching items across all pages.
    pub total: usize,
    /// 1-based page number.
    pub page: usize,
    /// Page size.
    #[serde(rename = "perPage")]
    pub per_page: usize,
    /// Number of pages.
    #[serde(rename = "totalPages")]
    pub total_pages: usize,
}

impl<T> Page<T> {
    /// Slice `items` into the requested page.
    ///
    /// `page` and `per_page` are clamped to at least 1.
    #[must_use]
    pub fn paginate(items: Vec<T>, page: usize, per_page: usize) -> Self {
        let page = page.max(1);
        let per_page = per_page.max(1);
        let total = items.len();
        let total_pages = total.div_ceil(per_page);
        let skip = (page - 1).saturating_mul(per_page);
        let data = items.into_iter().skip(skip).take(per_page).collect();
        Self {
            data,
            total,
            page,
            per_page,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::parse_amount;

    fn product(name: &str, price: &str) -> Product {
        Product::from_new(
            NewProduct {
                name: name.into(),
                price: price.into(),
                description: Some("Black cotton T-shirt".into()),
                ..NewProduct::default()
            },
            1,
        )
    }

    #[test]
    fn defaults_on_create() {
        let p = product("Troll Face", "33.33");
        assert_eq!(p.regular_price, "33.33");
        assert!(p.sku.is_empty());
        assert!(p.attributes.is_empty());
    }

    #[test]
    fn search_is_case_insensitive() {
        let p = product("Troll Face", "33.33");
        assert!(p.matches_search("troll"));
        assert!(p.matches_search("cotton"));
        assert!(!p.matches_search("hoodie"));
    }

    #[test]
    fn price_bounds_are_vat_inclusive() {
        let p = product("Troll Face", "33.33");
        let forty = parse_amount("40.00").ok();
        let thirty_nine = parse_amount("39.00").ok();
        assert!(p.price_within(None, forty));
        assert!(!p.price_within(None, thirty_nine));
        assert!(p.price_within(thirty_nine, None));
        assert!(!p.price_within(forty, None));
        assert!(p.price_within(None, None));
    }

    #[test]
    fn unparseable_price_fails_bounded_query() {
        let p = product("Broken", "free");
        assert!(!p.price_within(None, parse_amount("10").ok()));
        assert!(p.price_within(None, None));
    }

    #[test]
    fn pagination_math() {
        let page = Page::paginate((1..=25).collect::<Vec<_>>(), 3, 10);
        assert_eq!(page.data, vec![21, 22, 23, 24, 25]);
        assert_eq!(page.total, 25);
        assert_eq!(page.total_pages, 3);

        let empty = Page::paginate(Vec::<i32>::new(), 1, 10);
        assert_eq!(empty.total_pages, 0);

        let past_end = Page::paginate(vec![1, 2], 5, 10);
        assert!(past_end.data.is_empty());
    }
}
