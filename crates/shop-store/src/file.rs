//! JSON file storage implementation.
//!
//! This module provides the `FileStore` implementation of the
//! `CollectionStore` trait.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{Result, StoreError};
use crate::lock::CollectionLocks;
use crate::query::{self, FindOptions, Query};
use crate::{CollectionStore, Record};

/// Storage backed by one JSON file per collection.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    locks: CollectionLocks,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        tracing::info!(path = %dir.display(), "Opened file store");
        Ok(Self {
            dir,
            locks: CollectionLocks::default(),
        })
    }

    /// Directory holding the collection files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, collection: &str) -> PathBuf {
        self.dir.join(format!("{collection}.json"))
    }

    /// Load a whole collection. A missing file is an empty collection.
    async fn read(&self, collection: &str) -> Result<Vec<Record>> {
        let bytes = match tokio::fs::read(self.path(collection)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_slice(&bytes).map_err(|source| {
            tracing::error!(collection, error = %source, "Collection file is corrupt");
            StoreError::Corrupt {
                collection: collection.to_string(),
                source,
            }
        })
    }

    /// Replace a whole collection: write a sibling temp file, then rename.
    async fn write(&self, collection: &str, records: &[Record]) -> Result<()> {
        let json = serde_json::to_vec_pretty(records)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let path = self.path(collection);
        let tmp = self.dir.join(format!("{collection}.json.tmp"));
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;

        tracing::debug!(collection, records = records.len(), "Wrote collection");
        Ok(())
    }
}

#[async_trait]
impl CollectionStore for FileStore {
    async fn find_one(&self, collection: &str, query: &Query) -> Result<Option<Record>> {
        let records = self.read(collection).await?;
        Ok(records.into_iter().find(|r| query.matches(r)))
    }

    async fn find_many(
        &self,
        collection: &str,
        query: &Query,
        options: &FindOptions,
    ) -> Result<Vec<Record>> {
        let mut records = self.read(collection).await?;
        records.retain(|r| query.matches(r));
        Ok(query::apply_options(records, options))
    }

    async fn count(&self, collection: &str, query: &Query) -> Result<usize> {
        let records = self.read(collection).await?;
        Ok(records.iter().filter(|r| query.matches(r)).count())
    }

    async fn create(&self, collection: &str, record: Record) -> Result<Record> {
        let _guard = self.locks.acquire(collection).await;
        let mut records = self.read(collection).await?;
        let created = query::insert(collection, &mut records, record)?;
        self.write(collection, &records).await?;
        Ok(created)
    }

    async fn update_one(
        &self,
        collection: &str,
        id: &Value,
        patch: Record,
    ) -> Result<Option<Record>> {
        let _guard = self.locks.acquire(collection).await;
        let mut records = self.read(collection).await?;
        let Some(updated) = query::update_by_id(&mut records, id, &patch) else {
            return Ok(None);
        };
        self.write(collection, &records).await?;
        Ok(Some(updated))
    }

    async fn update_many(&self, collection: &str, query: &Query, patch: Record) -> Result<usize> {
        let _guard = self.locks.acquire(collection).await;
        let mut records = self.read(collection).await?;
        let count = query::update_matching(&mut records, query, &patch);
        if count > 0 {
            self.write(collection, &records).await?;
        }
        Ok(count)
    }

    async fn delete_one(&self, collection: &str, id: &Value) -> Result<bool> {
        let _guard = self.locks.acquire(collection).await;
        let mut records = self.read(collection).await?;
        if !query::remove_by_id(&mut records, id) {
            return Ok(false);
        }
        self.write(collection, &records).await?;
        Ok(true)
    }

    async fn delete_many(&self, collection: &str, query: &Query) -> Result<usize> {
        let _guard = self.locks.acquire(collection).await;
        let mut records = self.read(collection).await?;
        let count = query::remove_matching(&mut records, query);
        if count > 0 {
            self.write(collection, &records).await?;
        }
        Ok(count)
    }

    async fn clear(&self, collection: &str) -> Result<()> {
        let _guard = self.locks.acquire(collection).await;
        self.write(collection, &[]).await
    }
}
