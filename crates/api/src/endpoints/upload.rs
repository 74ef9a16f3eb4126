//! Multipart upload helpers.

use axum::extract::Multipart;
use fedblog_common::{AppError, AppResult};

/// Name of the multipart field carrying the file.
pub const IMAGE_FIELD: &str = "image";

/// A file read from a multipart body.
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub data: Vec<u8>,
}

/// Read the `image` field, skipping any other field.
pub async fn read_image(mut multipart: Multipart) -> AppResult<UploadedFile> {
    while let Some(field) = multipart.next_field().await.map_err(upload_failed)? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(String::from);
        let data = field.bytes().await.map_err(upload_failed)?;
        if data.is_empty() {
            break;
        }

        return Ok(UploadedFile {
            file_name,
            data: data.to_vec(),
        });
    }

    Err(AppError::BadRequest(
        "Il n'y a aucun fichier à télécharger".to_string(),
    ))
}

fn upload_failed(err: axum::extract::multipart::MultipartError) -> AppError {
    tracing::debug!(error = %err, "Malformed multipart body");
    AppError::BadRequest("Erreur durant l'upload".to_string())
}
