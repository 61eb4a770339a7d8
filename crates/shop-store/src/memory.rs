//! In-memory storage implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::query::{self, FindOptions, Query};
use crate::{CollectionStore, Record};

/// Non-durable storage with the same semantics as `FileStore`.
///
/// Mutations hold the write lock for the whole read-modify-write cycle.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Record>>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CollectionStore for MemoryStore {
    async fn find_one(&self, collection: &str, query: &Query) -> Result<Option<Record>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|records| records.iter().find(|r| query.matches(r)).cloned()))
    }

    async fn find_many(
        &self,
        collection: &str,
        query: &Query,
        options: &FindOptions,
    ) -> Result<Vec<Record>> {
        let matched: Vec<Record> = {
            let collections = self.collections.read().await;
            collections
                .get(collection)
                .map(|records| records.iter().filter(|r| query.matches(r)).cloned().collect())
                .unwrap_or_default()
        };
        Ok(query::apply_options(matched, options))
    }

    async fn count(&self, collection: &str, query: &Query) -> Result<usize> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map_or(0, |records| records.iter().filter(|r| query.matches(r)).count()))
    }

    async fn create(&self, collection: &str, record: Record) -> Result<Record> {
        let mut collections = self.collections.write().await;
        let records = collections.entry(collection.to_string()).or_default();
        query::insert(collection, records, record)
    }

    async fn update_one(
        &self,
        collection: &str,
        id: &Value,
        patch: Record,
    ) -> Result<Option<Record>> {
        let mut collections = self.collections.write().await;
        Ok(collections
            .get_mut(collection)
            .and_then(|records| query::update_by_id(records, id, &patch)))
    }

    async fn update_many(&self, collection: &str, query: &Query, patch: Record) -> Result<usize> {
        let mut collections = self.collections.write().await;
        Ok(collections
            .get_mut(collection)
            .map_or(0, |records| query::update_matching(records, query, &patch)))
    }

    async fn delete_one(&self, collection: &str, id: &Value) -> Result<bool> {
        let mut collections = self.collections.write().await;
        Ok(collections
            .get_mut(collection)
            .is_some_and(|records| query::remove_by_id(records, id)))
    }

    async fn delete_many(&self, collection: &str, query: &Query) -> Result<usize> {
        let mut collections = self.collections.write().await;
        Ok(collections
            .get_mut(collection)
            .map_or(0, |records| query::remove_matching(records, query)))
    }

    async fn clear(&self, collection: &str) -> Result<()> {
        self.collections.write().await.remove(collection);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::SortKey;
    use crate::StoreError;
    use serde_json::json;

    fn record(value: Value) -> Record {
        crate::encode(&value).unwrap()
    }

    #[tokio::test]
    async fn crud_cycle() {
        let store = MemoryStore::new();
        let created = store
            .create("admins", record(json!({"email": "admin@example.com"})))
            .await
            .unwrap();
        let id = created["id"].clone();

        assert_eq!(store.find_by_id("admins", &id).await.unwrap(), Some(created));

        let updated = store
            .update_one("admins", &id, record(json!({"name": "Admin"})))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated["email"], "admin@example.com");
        assert_eq!(updated["name"], "Admin");

        assert!(store.delete_one("admins", &id).await.unwrap());
        assert!(store.find_by_id("admins", &id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_collection_behaves_as_empty() {
        let store = MemoryStore::new();
        assert_eq!(store.count("nothing", &Query::all()).await.unwrap(), 0);
        assert!(store
            .update_one("nothing", &json!(1), Record::new())
            .await
            .unwrap()
            .is_none());
        assert_eq!(store.delete_many("nothing", &Query::all()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn sorted_page() {
        let store = MemoryStore::new();
        for id in [3, 1, 2] {
            store.create("products", record(json!({"id": id}))).await.unwrap();
        }
        let page = store
            .find_many(
                "products",
                &Query::all(),
                &FindOptions::sorted(vec![SortKey::desc("id")]).page(1, 2),
            )
            .await
            .unwrap();
        let ids: Vec<_> = page.iter().map(|r| r["id"].clone()).collect();
        assert_eq!(ids, vec![json!(3), json!(2)]);

        let dup = store.create("products", record(json!({"id": 2}))).await;
        assert!(matches!(dup, Err(StoreError::DuplicateId { .. })));
    }
}
