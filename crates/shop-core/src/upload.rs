//! Uploaded file records.

use serde::{Deserialize, Serialize};

/// Metadata of a customer upload stored under the upload directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    /// Store ID.
    pub id: String,
    /// Stored file name, `<timestamp>_<file_id><ext>`.
    pub filename: String,
    /// Name of the file on the customer's machine.
    pub original_name: String,
    /// Declared MIME type.
    pub mimetype: String,
    /// Size in bytes.
    pub size: u64,
    /// Path on disk.
    pub path: String,
    /// Public URL.
    pub url: String,
    /// Client-supplied batch timestamp.
    pub timestamp: String,
    /// Client-supplied index within the batch.
    pub file_id: i64,
    /// Store creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Store update timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl UploadedFile {
    /// Stored file name for a batch timestamp, file index and extension (with dot).
    #[must_use]
    pub fn stored_name(timestamp: &str, file_id: i64, extension: &str) -> String {
        format!("{timestamp}_{file_id}{extension}")
    }

    /// Public URL of a stored file name.
    #[must_use]
    pub fn public_url(filename: &str) -> String {
        format!("/uploads/{filename}")
    }
}

/// Response body of the public upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Whether the file was stored.
    pub success: bool,
    /// Public URL of the stored file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    /// Store ID of the upload record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    /// Failure reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadResponse {
    /// Successful upload of `file`.
    #[must_use]
    pub fn stored(file: &UploadedFile) -> Self {
        Self {
            success: true,
            file_url: Some(file.url.clone()),
            file_id: Some(file.id.clone()),
            error: None,
        }
    }

    /// Failed upload.
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            file_url: None,
            file_id: None,
            error: Some(error.into()),
        }
    }
}
