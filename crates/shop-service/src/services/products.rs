//! Product catalog and product images.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use serde_json::json;
use shop_core::{NewProduct, Page, Product, ProductPatch, ProductQuery};
use shop_store::schema::collections::PRODUCTS;
use shop_store::{CollectionStore, FindOptions, Query};

use super::uploads::{extension_for, sniff_image};
use super::Result;
use crate::error::ApiError;

/// URL prefix under which product images are served.
const IMAGE_URL_PREFIX: &str = "/uploads/products/";

/// Catalog operations over the `products` collection.
#[derive(Clone)]
pub struct ProductCatalog {
    store: Arc<dyn CollectionStore>,
    image_root: PathBuf,
}

impl ProductCatalog {
    /// Create a catalog storing images under `image_root`.
    pub fn new(store: Arc<dyn CollectionStore>, image_root: impl Into<PathBuf>) -> Self {
        Self {
            store,
            image_root: image_root.into(),
        }
    }

    async fn all(&self) -> Result<Vec<Product>> {
        let records = self
            .store
            .find_many(PRODUCTS, &Query::all(), &FindOptions::default())
            .await?;
        Ok(shop_store::decode_all(records)?)
    }

    /// Filter and paginate the catalog.
    pub async fn list(&self, params: &ProductQuery) -> Result<Page<Product>> {
        let needle = params
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let matching: Vec<Product> = self
            .all()
            .await?
            .into_iter()
            .filter(|p| needle.as_deref().map_or(true, |n| p.matches_search(n)))
            .filter(|p| p.price_within(params.min_price, params.max_price))
            .collect();

        Ok(Page::paginate(matching, params.page, params.per_page))
    }

    /// Look up a product by its public ID.
    pub async fn get(&self, id: i64) -> Result<Option<Product>> {
        let record = self.store.find_by_id(PRODUCTS, &json!(id)).await?;
        Ok(record.map(shop_store::decode).transpose()?)
    }

    /// Create a product. Without an explicit ID the next ID is `max + 1`.
    pub async fn create(&self, new: NewProduct) -> Result<Product> {
        let id = match new.id {
            Some(id) => id,
            None => self.all().await?.iter().map(|p| p.id).max().unwrap_or(0) + 1,
        };
        let product = Product::from_new(new, id);
        let created = self
            .store
            .create(PRODUCTS, shop_store::encode(&product)?)
            .await?;

        tracing::info!(product_id = id, name = %product.name, "Product created");
        Ok(shop_store::decode(created)?)
    }

    /// Shallow-merge `patch` into an existing product.
    pub async fn update(&self, id: i64, patch: &ProductPatch) -> Result<Option<Product>> {
        let updated = self
            .store
            .update_one(PRODUCTS, &json!(id), shop_store::encode(patch)?)
            .await?;
        Ok(updated.map(shop_store::decode).transpose()?)
    }

    /// Delete a product, then its image directory.
    ///
    /// Images are only touched once the record is gone. Failures removing
    /// the directory are logged.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let deleted = self.store.delete_one(PRODUCTS, &json!(id)).await?;

        let dir = self.image_dir(id);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => tracing::debug!(product_id = id, "Removed product image directory"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(product_id = id, error = %e, "Failed to remove product images");
            }
        }

        if deleted {
            tracing::info!(product_id = id, "Product deleted");
        }
        Ok(deleted)
    }

    fn image_dir(&self, product_id: i64) -> PathBuf {
        self.image_root.join(product_id.to_string())
    }

    /// Store an image for a product and return its public URL.
    pub async fn save_image(
        &self,
        product_id: i64,
        original_name: Option<&str>,
        bytes: &[u8],
    ) -> Result<String> {
        let format = sniff_image(bytes)?;
        let extension = extension_for(original_name, format);
        let filename = format!("{}{extension}", chrono::Utc::now().timestamp_millis());

        let dir = self.image_dir(product_id);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&filename), bytes).await?;

        tracing::info!(product_id, filename = %filename, size = bytes.len(), "Product image stored");
        Ok(format!("{IMAGE_URL_PREFIX}{product_id}/{filename}"))
    }

    /// Delete one product image by its public URL. Returns whether a file was
    /// removed.
    pub async fn delete_image(&self, url: &str) -> Result<bool> {
        let path = self.image_path(url)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Map a public image URL to a path under the image root.
    fn image_path(&self, url: &str) -> Result<PathBuf> {
        let relative = url
            .strip_prefix(IMAGE_URL_PREFIX)
            .ok_or_else(|| ApiError::BadRequest("Invalid image URL".into()))?;

        let relative = Path::new(relative);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(ApiError::BadRequest("Invalid image URL".into()));
        }
        Ok(self.image_root.join(relative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shop_core::parse_amount;
    use shop_store::{FileStore, MemoryStore};
    use tempfile::TempDir;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    fn catalog() -> (ProductCatalog, TempDir) {
        let dir = TempDir::new().unwrap();
        let catalog = ProductCatalog::new(Arc::new(MemoryStore::new()), dir.path().join("products"));
        (catalog, dir)
    }

    fn product(name: &str, price: &str) -> NewProduct {
        NewProduct {
            name: name.into(),
            price: price.into(),
            ..NewProduct::default()
        }
    }

    #[tokio::test]
    async fn ids_are_assigned_after_the_max() {
        let (catalog, _dir) = catalog();
        let seeded = catalog
            .create(NewProduct {
                id: Some(7),
                ..product("Troll Face", "33.33")
            })
            .await
            .unwrap();
        assert_eq!(seeded.id, 7);
        assert_eq!(seeded.regular_price, "33.33");

        let next = catalog.create(product("Mug", "12.00")).await.unwrap();
        assert_eq!(next.id, 8);

        let dup = catalog
            .create(NewProduct {
                id: Some(7),
                ..product("Again", "1")
            })
            .await;
        assert!(matches!(dup, Err(ApiError::Conflict(_))));
    }

    #[tokio::test]
    async fn list_filters_by_search_and_tax_inclusive_price() {
        let (catalog, _dir) = catalog();
        catalog.create(product("Troll Face", "33.33")).await.unwrap();
        catalog.create(product("Poster", "50.00")).await.unwrap();

        let query = |max: &str| ProductQuery {
            page: 1,
            per_page: 10,
            search: Some("TROLL".into()),
            min_price: None,
            max_price: Some(parse_amount(max).unwrap()),
        };

        let page = catalog.list(&query("40.00")).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.data[0].name, "Troll Face");

        let page = catalog.list(&query("39.00")).await.unwrap();
        assert_eq!(page.total, 0);
        assert_eq!(page.total_pages, 0);
    }

    #[tokio::test]
    async fn update_merges_and_missing_is_none() {
        let (catalog, _dir) = catalog();
        let created = catalog.create(product("Troll Face", "33.33")).await.unwrap();

        let patch = ProductPatch {
            price: Some("29.99".into()),
            ..ProductPatch::default()
        };
        let updated = catalog.update(created.id, &patch).await.unwrap().unwrap();
        assert_eq!(updated.price, "29.99");
        assert_eq!(updated.name, "Troll Face");

        assert!(catalog.update(999, &patch).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn images_live_under_the_product_directory() {
        let (catalog, dir) = catalog();
        let created = catalog.create(product("Troll Face", "33.33")).await.unwrap();

        let url = catalog
            .save_image(created.id, Some("face.PNG"), PNG)
            .await
            .unwrap();
        assert!(url.starts_with(&format!("/uploads/products/{}/", created.id)));
        assert!(url.ends_with(".png"));

        let not_image = catalog.save_image(created.id, Some("x.png"), b"hello").await;
        assert!(matches!(not_image, Err(ApiError::BadRequest(_))));

        assert!(catalog.delete(created.id).await.unwrap());
        assert!(!dir.path().join("products").join(created.id.to_string()).exists());
        assert!(!catalog.delete(created.id).await.unwrap());
    }

    #[tokio::test]
    async fn failed_delete_keeps_images() {
        let data = TempDir::new().unwrap();
        let images = TempDir::new().unwrap();
        let catalog = ProductCatalog::new(
            Arc::new(FileStore::open(data.path()).unwrap()),
            images.path(),
        );
        let created = catalog.create(product("Troll Face", "33.33")).await.unwrap();
        catalog.save_image(created.id, Some("face.png"), PNG).await.unwrap();

        std::fs::write(data.path().join("products.json"), "{not json").unwrap();

        let result = catalog.delete(created.id).await;
        assert!(matches!(result, Err(ApiError::Internal(_))));
        assert!(images.path().join(created.id.to_string()).exists());
    }

    #[tokio::test]
    async fn image_urls_cannot_escape_the_root() {
        let (catalog, _dir) = catalog();
        let escaped = catalog.delete_image("/uploads/products/../../etc/passwd").await;
        assert!(matches!(escaped, Err(ApiError::BadRequest(_))));
        let foreign = catalog.delete_image("/somewhere/else.png").await;
        assert!(matches!(foreign, Err(ApiError::BadRequest(_))));
        assert!(!catalog.delete_image("/uploads/products/1/missing.png").await.unwrap());
    }
}
