//! Image upload routes.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use domain::models::{DeleteImageRequest, ImageFolder, ImageUpload};
use tracing::debug;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AdminUser;
use crate::middleware::metrics::record_upload;

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(upload_image).delete(delete_image))
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(err.body_text())
    } else {
        ApiError::Validation(err.body_text())
    }
}

/// Multipart fields of an upload, as received.
#[derive(Debug, Default)]
struct UploadForm {
    file: Option<(String, Option<String>, Vec<u8>)>,
    folder: Option<String>,
    custom_name: Option<String>,
}

async fn read_form(multipart: &mut Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(multipart_error)?;
                form.file = Some((file_name, content_type, bytes.to_vec()));
            }
            Some("folder") => form.folder = Some(field.text().await.map_err(multipart_error)?),
            Some("customName") => {
                let name = field.text().await.map_err(multipart_error)?;
                form.custom_name = Some(name).filter(|n| !n.trim().is_empty());
            }
            _ => {}
        }
    }
    Ok(form)
}

/// Upload an image (multipart fields `file`, optional `folder` defaulting to
/// `gallery`, optional `customName`).
///
/// POST /api/v1/admin/uploads
pub async fn upload_image(
    State(state): State<AppState>,
    admin: AdminUser,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = read_form(&mut multipart).await?;

    let (file_name, content_type, bytes) = form
        .file
        .ok_or_else(|| ApiError::Validation("file: A file is required".to_string()))?;
    let folder = match form.folder.as_deref().map(str::trim) {
        None | Some("") => ImageFolder::Gallery,
        Some(raw) => raw.parse::<ImageFolder>().map_err(ApiError::Validation)?,
    };

    let max_bytes = state.config.uploads.max_bytes;
    if bytes.len() > max_bytes {
        record_upload("rejected", bytes.len());
        return Err(ApiError::PayloadTooLarge(format!(
            "File too large: {} bytes (max {})",
            bytes.len(),
            max_bytes
        )));
    }

    let upload = ImageUpload {
        bytes,
        content_type,
        file_name,
        folder,
        custom_name: form.custom_name,
    };
    let size = upload.bytes.len();

    match state
        .uploader
        .upload(upload, &admin.actor(), |progress| {
            debug!(progress, "Upload progress")
        })
        .await
    {
        Ok(uploaded) => {
            record_upload("stored", uploaded.size);
            Ok((StatusCode::CREATED, Json(uploaded)))
        }
        Err(e) => {
            record_upload("rejected", size);
            Err(e.into())
        }
    }
}

/// Delete an uploaded image by its public URL.
///
/// DELETE /api/v1/admin/uploads
pub async fn delete_image(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(request): Json<DeleteImageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    request.validate()?;
    state.uploader.delete_by_url(&request.url).await?;
    Ok(StatusCode::NO_CONTENT)
}
