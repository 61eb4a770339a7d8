//! Error types for the collection store.

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing a collection file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A collection file exists but does not hold a JSON array of objects.
    #[error("collection {collection} is corrupt: {source}")]
    Corrupt {
        /// Collection name.
        collection: String,
        /// Parse failure.
        #[source]
        source: serde_json::Error,
    },

    /// Converting between a record and a typed value failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A record with the same ID already exists.
    #[error("duplicate id in {collection}: {id}")]
    DuplicateId {
        /// Collection name.
        collection: String,
        /// The conflicting ID.
        id: String,
    },
}
