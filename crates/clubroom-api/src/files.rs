use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use clubroom_db::models::UploadedFileRow;
use clubroom_types::api::{Claims, UploadedFileInfo};

use crate::auth::{AppState, current_member, require_board};
use crate::error::ApiError;

/// 50 MB upload limit
const MAX_FILE_SIZE: usize = 50 * 1024 * 1024;

/// POST /uploaded — multipart form with a `file` field. The payload is read
/// to completion and stored as a blob alongside its declared metadata.
pub async fn upload_file(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let uploader = current_member(&state, &claims).await?;
    require_board(&uploader)?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::Validation("malformed multipart body".into()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let name = field
            .file_name()
            .unwrap_or("unnamed")
            .to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|_| ApiError::Validation("unreadable file field".into()))?;

        if bytes.is_empty() {
            return Err(ApiError::Validation("empty file".into()));
        }
        if bytes.len() > MAX_FILE_SIZE {
            return Err(ApiError::PayloadTooLarge);
        }

        let row = UploadedFileRow {
            id: Uuid::new_v4(),
            name,
            content_type,
            binary: bytes.to_vec(),
        };
        let response = UploadedFileInfo {
            id: row.id,
            name: row.name.clone(),
            content_type: row.content_type.clone(),
        };

        state
            .run_db(move |db| db.create_uploaded_file(&row))
            .await?;

        info!("file {} uploaded by {}", response.id, uploader.username);
        return Ok((StatusCode::CREATED, Json(response)));
    }

    Err(ApiError::Validation("missing file field".into()))
}

/// GET /uploaded/{uuid} — the blob itself, served under its original
/// filename and declared content type.
pub async fn download_file(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let file = state
        .run_db(move |db| db.get_uploaded_file(id))
        .await?
        .ok_or_else(|| ApiError::NotFound("no such file".into()))?;

    let disposition = format!("attachment; filename=\"{}\"", file.name.replace('"', ""));
    Ok((
        [
            (header::CONTENT_TYPE, file.content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.binary,
    ))
}

/// GET /uploaded-info/{uuid} — metadata only.
pub async fn file_info(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let file = state
        .run_db(move |db| db.get_uploaded_file(id))
        .await?
        .ok_or_else(|| ApiError::NotFound("no such file".into()))?;
    Ok(Json(UploadedFileInfo {
        id: file.id,
        name: file.name,
        content_type: file.content_type,
    }))
}

/// DELETE /uploaded/{uuid} — post associations degrade via cascade.
pub async fn delete_file(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let deleter = current_member(&state, &claims).await?;
    require_board(&deleter)?;

    let deleted = state
        .run_db(move |db| db.delete_uploaded_file(id))
        .await?;
    if !deleted {
        return Err(ApiError::NotFound("no such file".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}
