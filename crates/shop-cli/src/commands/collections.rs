//! Collection inspection.

use std::sync::Arc;

use shop_store::schema::all_collections;
use shop_store::{CollectionStore, Query};

use super::CommandError;

/// Record count for every known collection, in schema order.
pub async fn counts(
    store: &Arc<dyn CollectionStore>,
) -> Result<Vec<(&'static str, usize)>, CommandError> {
    let mut counts = Vec::new();
    for collection in all_collections() {
        counts.push((collection, store.count(collection, &Query::all()).await?));
    }
    Ok(counts)
}

/// Print record counts per collection.
pub async fn print_counts(store: Arc<dyn CollectionStore>) -> Result<(), CommandError> {
    for (collection, count) in counts(&store).await? {
        println!("{collection:<16} {count}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shop_store::schema::collections::{ORDERS, PRODUCTS};
    use shop_store::MemoryStore;

    #[tokio::test]
    async fn counts_every_collection() {
        let store: Arc<dyn CollectionStore> = Arc::new(MemoryStore::new());
        store
            .create(PRODUCTS, shop_store::encode(&json!({"id": 1, "name": "Tee"})).unwrap())
            .await
            .unwrap();

        let counts = counts(&store).await.unwrap();
        assert_eq!(counts.len(), all_collections().len());
        assert!(counts.contains(&(PRODUCTS, 1)));
        assert!(counts.contains(&(ORDERS, 0)));
    }
}
