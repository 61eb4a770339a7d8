//! Collection store for the shop backend.
//!
//! Records are schemaless JSON objects grouped into named collections. Every
//! record carries an `id` plus `createdAt`/`updatedAt` timestamps assigned by
//! the store.
//!
//! # Backends
//!
//! - [`FileStore`]: one pretty-printed JSON array per collection at
//!   `<data_dir>/<collection>.json`. Every mutation rewrites the whole file.
//! - [`MemoryStore`]: same semantics, no durability.
//!
//! Both backends serialize mutations per collection, so concurrent
//! read-modify-write cycles inside the store never lose updates. Sequences of
//! calls made by a caller are not atomic.
//!
//! # Example
//!
//! ```no_run
//! use shop_store::{CollectionStore, FileStore, Query};
//! use serde_json::json;
//!
//! # async fn demo() -> shop_store::Result<()> {
//! let store = FileStore::open("./data")?;
//! let record = shop_store::encode(&json!({"code": "WELCOME10"}))?;
//! let created = store.create("coupons", record).await?;
//! let found = store.find_one("coupons", &Query::eq("code", "WELCOME10")).await?;
//! assert_eq!(found.as_ref(), Some(&created));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod file;
mod lock;
pub mod memory;
pub mod query;
pub mod schema;

pub use error::{Result, StoreError};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use query::{FindOptions, Query, SortKey, SortOrder};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// A stored record: a JSON object.
pub type Record = serde_json::Map<String, Value>;

/// The storage trait defining all collection operations.
///
/// This trait abstracts the storage layer, allowing for different
/// implementations (JSON files, in-memory for testing).
#[async_trait]
pub trait CollectionStore: Send + Sync {
    // =========================================================================
    // Reads
    // =========================================================================

    /// First record matching `query`, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be read.
    async fn find_one(&self, collection: &str, query: &Query) -> Result<Option<Record>>;

    /// Every record matching `query`, with `options` applied.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be read.
    async fn find_many(
        &self,
        collection: &str,
        query: &Query,
        options: &FindOptions,
    ) -> Result<Vec<Record>>;

    /// The record whose `id` equals `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be read.
    async fn find_by_id(&self, collection: &str, id: &Value) -> Result<Option<Record>> {
        self.find_one(collection, &Query::eq(query::ID_FIELD, id.clone()))
            .await
    }

    /// Number of records matching `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be read.
    async fn count(&self, collection: &str, query: &Query) -> Result<usize>;

    // =========================================================================
    // Writes
    // =========================================================================

    /// Insert a record. A UUID `id` is assigned when absent; `createdAt` and
    /// `updatedAt` are always set to now.
    ///
    /// # Errors
    ///
    /// - `StoreError::DuplicateId` if the `id` is already taken.
    /// - I/O errors from persisting the collection.
    async fn create(&self, collection: &str, record: Record) -> Result<Record>;

    /// Shallow-merge `patch` into the record with `id`.
    ///
    /// `id` and `createdAt` never change. Returns `None` (and writes nothing)
    /// when no record has that `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be read or written.
    async fn update_one(&self, collection: &str, id: &Value, patch: Record)
        -> Result<Option<Record>>;

    /// Shallow-merge `patch` into every matching record. Returns the count.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be read or written.
    async fn update_many(&self, collection: &str, query: &Query, patch: Record) -> Result<usize>;

    /// Remove the record with `id`. Returns whether one was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be read or written.
    async fn delete_one(&self, collection: &str, id: &Value) -> Result<bool>;

    /// Remove every matching record. Returns the count.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be read or written.
    async fn delete_many(&self, collection: &str, query: &Query) -> Result<usize>;

    /// Remove every record in the collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be written.
    async fn clear(&self, collection: &str) -> Result<()>;
}

/// Convert a typed value into a record.
///
/// # Errors
///
/// Returns `StoreError::Serialization` if the value does not serialize to a
/// JSON object.
pub fn encode<T: Serialize>(value: &T) -> Result<Record> {
    match serde_json::to_value(value) {
        Ok(Value::Object(record)) => Ok(record),
        Ok(other) => Err(StoreError::Serialization(format!(
            "expected an object, got {other}"
        ))),
        Err(e) => Err(StoreError::Serialization(e.to_string())),
    }
}

/// Convert a record into a typed value.
///
/// # Errors
///
/// Returns `StoreError::Serialization` if the record does not match `T`.
pub fn decode<T: DeserializeOwned>(record: Record) -> Result<T> {
    serde_json::from_value(Value::Object(record)).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Convert a list of records into typed values.
///
/// # Errors
///
/// Returns `StoreError::Serialization` if any record does not match `T`.
pub fn decode_all<T: DeserializeOwned>(records: Vec<Record>) -> Result<Vec<T>> {
    records.into_iter().map(decode).collect()
}
