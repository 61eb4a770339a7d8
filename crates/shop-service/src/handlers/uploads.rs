//! Customer upload handler.

use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use shop_core::UploadResponse;

use crate::error::ApiError;
use crate::services::UploadInput;
use crate::state::AppState;

/// Read the first file field called `name` from a multipart body.
pub(crate) async fn read_file_field(
    multipart: &mut Multipart,
    name: &str,
) -> Result<Option<UploadInput>, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(name) {
            continue;
        }
        let original_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await?;

        return Ok(Some(UploadInput {
            original_name,
            content_type,
            bytes: bytes.to_vec(),
        }));
    }
    Ok(None)
}

/// Upload query parameters.
#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    /// Client timestamp used as the file name prefix.
    pub time: Option<String>,
    /// Client file number.
    pub fileid: Option<String>,
}

/// A failed upload, reported in the upload response shape.
#[derive(Debug)]
pub struct UploadFailure {
    status: StatusCode,
    body: UploadResponse,
}

fn failed(status: StatusCode, message: impl Into<String>) -> UploadFailure {
    UploadFailure {
        status,
        body: UploadResponse::failed(message),
    }
}

impl From<ApiError> for UploadFailure {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::BadRequest(msg) => failed(StatusCode::BAD_REQUEST, msg),
            ApiError::PayloadTooLarge(msg) => failed(StatusCode::PAYLOAD_TOO_LARGE, msg),
            ApiError::Conflict(msg) => failed(StatusCode::CONFLICT, msg),
            other => {
                tracing::error!(error = %other, "Upload failed");
                failed(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

impl IntoResponse for UploadFailure {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Store a customer image sent as the multipart field `file`.
///
/// Failures use the upload response shape, not the API error shape.
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UploadQuery>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, UploadFailure> {
    let Ok(mut multipart) = multipart else {
        return Err(failed(StatusCode::BAD_REQUEST, "No file provided"));
    };
    let input = read_file_field(&mut multipart, "file")
        .await?
        .ok_or_else(|| failed(StatusCode::BAD_REQUEST, "No file provided"))?;

    let time = query.time.as_deref().filter(|t| !t.is_empty());
    let file_id = query.fileid.as_deref().and_then(|id| id.trim().parse::<i64>().ok());
    let (Some(time), Some(file_id)) = (time, file_id) else {
        return Err(failed(
            StatusCode::BAD_REQUEST,
            "Missing required parameters: time and fileid",
        ));
    };

    let file = state.uploads.save(input, time, file_id).await?;
    Ok(Json(UploadResponse::stored(&file)))
}
