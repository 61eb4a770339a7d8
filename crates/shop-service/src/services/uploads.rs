//! Customer file uploads.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::ImageFormat;
use serde_json::json;
use shop_core::UploadedFile;
use shop_store::schema::collections::UPLOADS;
use shop_store::{CollectionStore, FindOptions, Query, SortKey};

use super::Result;
use crate::error::ApiError;

/// Message returned when content sniffing rejects a file.
pub const INVALID_IMAGE: &str = "Invalid image file. Only JPEG, PNG, GIF, and WebP are allowed.";

/// File name fragments that are logged as suspicious.
const SUSPICIOUS_PATTERNS: [&str; 12] = [
    ".php", ".exe", ".sh", ".bat", ".cmd", ".com", ".pif", ".scr", ".vbs", ".jsp", ".asp", "..",
];

/// An uploaded file as received from the multipart body.
#[derive(Debug, Clone)]
pub struct UploadInput {
    /// File name supplied by the client.
    pub original_name: String,
    /// Declared content type.
    pub content_type: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

/// Detect the image format from magic bytes, accepting JPEG, PNG, GIF and
/// WebP only.
pub fn sniff_image(bytes: &[u8]) -> Result<ImageFormat> {
    match image::guess_format(bytes) {
        Ok(format @ (ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::Gif | ImageFormat::WebP)) => {
            Ok(format)
        }
        _ => Err(ApiError::BadRequest(INVALID_IMAGE.into())),
    }
}

/// Extension (with the leading dot) for a stored file, always one of the
/// sniffed format's extensions. The client's spelling is kept when it names
/// the same format (`.jpeg` stays `.jpeg`).
pub fn extension_for(original_name: Option<&str>, format: ImageFormat) -> String {
    let known = format.extensions_str();
    original_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .filter(|ext| known.contains(&ext.as_str()))
        .or_else(|| known.first().map(|ext| (*ext).to_string()))
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default()
}

fn is_suspicious(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.ends_with(".js") || SUSPICIOUS_PATTERNS.iter().any(|p| lower.contains(p))
}

fn valid_timestamp(time: &str) -> bool {
    !time.is_empty()
        && time
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Upload storage over the `uploads` collection and the upload directory.
#[derive(Clone)]
pub struct UploadService {
    store: Arc<dyn CollectionStore>,
    upload_dir: PathBuf,
    max_file_size: usize,
}

impl UploadService {
    /// Create an upload service writing into `upload_dir`.
    pub fn new(
        store: Arc<dyn CollectionStore>,
        upload_dir: impl Into<PathBuf>,
        max_file_size: usize,
    ) -> Self {
        Self {
            store,
            upload_dir: upload_dir.into(),
            max_file_size,
        }
    }

    /// Validate and store an uploaded image as `<time>_<file_id><ext>`.
    ///
    /// A name already held by another upload is a conflict. The file is
    /// removed again when its record cannot be stored.
    pub async fn save(&self, input: UploadInput, time: &str, file_id: i64) -> Result<UploadedFile> {
        if !valid_timestamp(time) {
            return Err(ApiError::BadRequest("Invalid time parameter".into()));
        }
        if is_suspicious(&input.original_name) {
            tracing::warn!(original_name = %input.original_name, "Suspicious upload file name");
        }
        if !input.content_type.starts_with("image/") {
            return Err(ApiError::BadRequest("Only image files are allowed".into()));
        }
        if input.bytes.len() > self.max_file_size {
            return Err(ApiError::PayloadTooLarge("File too large".into()));
        }
        let format = sniff_image(&input.bytes)?;

        let extension = extension_for(Some(&input.original_name), format);
        let filename = UploadedFile::stored_name(time, file_id, &extension);
        let path = self.upload_dir.join(&filename);

        if self
            .store
            .find_one(UPLOADS, &Query::eq("filename", filename.as_str()))
            .await?
            .is_some()
        {
            return Err(ApiError::Conflict(format!("File {filename} already exists")));
        }

        tokio::fs::create_dir_all(&self.upload_dir).await?;
        tokio::fs::write(&path, &input.bytes).await?;

        let file = UploadedFile {
            id: uuid::Uuid::new_v4().to_string(),
            url: UploadedFile::public_url(&filename),
            filename,
            original_name: input.original_name,
            mimetype: input.content_type,
            size: input.bytes.len() as u64,
            path: path.display().to_string(),
            timestamp: time.to_string(),
            file_id,
            created_at: None,
            updated_at: None,
        };
        let created = match self.store.create(UPLOADS, shop_store::encode(&file)?).await {
            Ok(created) => created,
            Err(e) => {
                if let Err(remove) = tokio::fs::remove_file(&path).await {
                    tracing::warn!(path = %file.path, error = %remove, "Failed to remove orphaned upload");
                }
                return Err(e.into());
            }
        };

        tracing::info!(
            upload_id = %file.id,
            filename = %file.filename,
            size = file.size,
            "File uploaded"
        );
        Ok(shop_store::decode(created)?)
    }

    /// Look up an upload by ID.
    pub async fn get(&self, id: &str) -> Result<Option<UploadedFile>> {
        let record = self.store.find_by_id(UPLOADS, &json!(id)).await?;
        Ok(record.map(shop_store::decode).transpose()?)
    }

    /// All uploads, newest first.
    pub async fn list(&self) -> Result<Vec<UploadedFile>> {
        let records = self
            .store
            .find_many(
                UPLOADS,
                &Query::all(),
                &FindOptions::sorted(vec![SortKey::desc(shop_store::query::CREATED_AT_FIELD)]),
            )
            .await?;
        Ok(shop_store::decode_all(records)?)
    }

    /// Uploads sharing a client timestamp, in upload order.
    pub async fn by_timestamp(&self, time: &str) -> Result<Vec<UploadedFile>> {
        let records = self
            .store
            .find_many(UPLOADS, &Query::eq("timestamp", time), &FindOptions::default())
            .await?;
        Ok(shop_store::decode_all(records)?)
    }

    /// Delete an upload. The file is removed best-effort, then the record.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let Some(file) = self.get(id).await? else {
            return Ok(false);
        };

        if let Err(e) = tokio::fs::remove_file(&file.path).await {
            tracing::warn!(upload_id = %id, path = %file.path, error = %e, "Failed to remove uploaded file");
        }

        Ok(self.store.delete_one(UPLOADS, &json!(id)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shop_store::{MemoryStore, Record};
    use tempfile::TempDir;

    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10, b'J', b'F', b'I', b'F', 0];
    const GIF: &[u8] = b"GIF89a\x01\x00\x01\x00";

    fn service(max: usize) -> (UploadService, TempDir) {
        let dir = TempDir::new().unwrap();
        let service = UploadService::new(Arc::new(MemoryStore::new()), dir.path(), max);
        (service, dir)
    }

    fn input(name: &str, content_type: &str, bytes: &[u8]) -> UploadInput {
        UploadInput {
            original_name: name.into(),
            content_type: content_type.into(),
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn sniffing() {
        assert_eq!(sniff_image(JPEG).unwrap(), ImageFormat::Jpeg);
        assert_eq!(sniff_image(GIF).unwrap(), ImageFormat::Gif);
        assert!(sniff_image(b"%PDF-1.7").is_err());
        assert!(sniff_image(b"").is_err());
    }

    #[test]
    fn extensions() {
        assert_eq!(extension_for(Some("Photo.JPG"), ImageFormat::Jpeg), ".jpg");
        assert_eq!(extension_for(Some("photo"), ImageFormat::Png), ".png");
        assert_eq!(extension_for(None, ImageFormat::Gif), ".gif");
        assert_eq!(extension_for(Some("scan.jpeg"), ImageFormat::Jpeg), ".jpeg");
        // The stored extension follows the content, not the client name.
        assert_eq!(extension_for(Some("x.html"), ImageFormat::Jpeg), ".jpg");
        assert_eq!(extension_for(Some("photo.png"), ImageFormat::Gif), ".gif");
    }

    #[test]
    fn suspicious_names() {
        assert!(is_suspicious("shell.php.jpg"));
        assert!(is_suspicious("../../etc/passwd"));
        assert!(is_suspicious("payload.js"));
        assert!(!is_suspicious("holiday.jpg"));
    }

    #[tokio::test]
    async fn save_list_delete() {
        let (service, dir) = service(1024);
        let file = service
            .save(input("photo.jpg", "image/jpeg", JPEG), "1700000000", 3)
            .await
            .unwrap();
        assert_eq!(file.filename, "1700000000_3.jpg");
        assert_eq!(file.url, "/uploads/1700000000_3.jpg");
        assert!(dir.path().join("1700000000_3.jpg").exists());

        assert_eq!(service.by_timestamp("1700000000").await.unwrap().len(), 1);
        assert_eq!(service.list().await.unwrap().len(), 1);

        assert!(service.delete(&file.id).await.unwrap());
        assert!(!dir.path().join("1700000000_3.jpg").exists());
        assert!(!service.delete(&file.id).await.unwrap());
    }

    #[tokio::test]
    async fn rejections() {
        let (service, _dir) = service(8);

        let bad_time = service.save(input("a.jpg", "image/jpeg", JPEG), "../x", 1).await;
        assert!(matches!(bad_time, Err(ApiError::BadRequest(_))));

        let not_image = service.save(input("a.txt", "text/plain", b"hi"), "t", 1).await;
        assert!(matches!(not_image, Err(ApiError::BadRequest(_))));

        let too_big = service.save(input("a.jpg", "image/jpeg", JPEG), "t", 1).await;
        assert!(matches!(too_big, Err(ApiError::PayloadTooLarge(_))));

        let disguised = service.save(input("a.jpg", "image/jpeg", b"<?php"), "t", 1).await;
        assert!(matches!(disguised, Err(ApiError::BadRequest(msg)) if msg == INVALID_IMAGE));
    }

    #[tokio::test]
    async fn same_name_is_a_conflict() {
        let (service, dir) = service(1024);
        let first = service
            .save(input("photo.jpg", "image/jpeg", JPEG), "batch", 1)
            .await
            .unwrap();

        let again = service
            .save(input("other.jpg", "image/jpeg", JPEG), "batch", 1)
            .await;
        assert!(matches!(again, Err(ApiError::Conflict(_))));
        assert_eq!(service.list().await.unwrap().len(), 1);

        assert!(service.delete(&first.id).await.unwrap());
        assert!(!dir.path().join("batch_1.jpg").exists());
    }

    /// Memory store whose inserts always fail.
    struct RejectingStore(MemoryStore);

    #[async_trait::async_trait]
    impl CollectionStore for RejectingStore {
        async fn find_one(&self, collection: &str, query: &Query) -> shop_store::Result<Option<Record>> {
            self.0.find_one(collection, query).await
        }
        async fn find_many(
            &self,
            collection: &str,
            query: &Query,
            options: &FindOptions,
        ) -> shop_store::Result<Vec<Record>> {
            self.0.find_many(collection, query, options).await
        }
        async fn count(&self, collection: &str, query: &Query) -> shop_store::Result<usize> {
            self.0.count(collection, query).await
        }
        async fn create(&self, _collection: &str, _record: Record) -> shop_store::Result<Record> {
            Err(std::io::Error::other("disk full").into())
        }
        async fn update_one(
            &self,
            collection: &str,
            id: &serde_json::Value,
            patch: Record,
        ) -> shop_store::Result<Option<Record>> {
            self.0.update_one(collection, id, patch).await
        }
        async fn update_many(&self, collection: &str, query: &Query, patch: Record) -> shop_store::Result<usize> {
            self.0.update_many(collection, query, patch).await
        }
        async fn delete_one(&self, collection: &str, id: &serde_json::Value) -> shop_store::Result<bool> {
            self.0.delete_one(collection, id).await
        }
        async fn delete_many(&self, collection: &str, query: &Query) -> shop_store::Result<usize> {
            self.0.delete_many(collection, query).await
        }
        async fn clear(&self, collection: &str) -> shop_store::Result<()> {
            self.0.clear(collection).await
        }
    }

    #[tokio::test]
    async fn failed_record_removes_the_file() {
        let dir = TempDir::new().unwrap();
        let service = UploadService::new(Arc::new(RejectingStore(MemoryStore::new())), dir.path(), 1024);

        let result = service
            .save(input("photo.jpg", "image/jpeg", JPEG), "1700000000", 3)
            .await;
        assert!(matches!(result, Err(ApiError::Internal(_))));
        assert!(!dir.path().join("1700000000_3.jpg").exists());
    }
}
