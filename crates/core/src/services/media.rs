//! Image uploads: avatars and post illustrations.
//!
//! Uploads are staged in the temporary storage, resized off the async
//! runtime, written to the public storage, then the staged copy is removed.

use std::io::Cursor;
use std::path::PathBuf;

use fedblog_common::storage::sanitize_file_name;
use fedblog_common::{AppError, AppResult, LocalStorage, StorageBackend};
use image::{DynamicImage, ImageFormat, imageops::FilterType};

/// Side of the square avatar, in pixels.
pub const AVATAR_SIZE: u32 = 500;

/// Width of post illustrations, in pixels.
pub const POST_IMAGE_WIDTH: u32 = 104;

const UPLOAD_FAILED: &str = "Erreur durant l'upload";

/// A stored avatar.
#[derive(Debug, Clone)]
pub struct AvatarUpload {
    /// Location on disk.
    pub path: PathBuf,
    /// Public URL, stored as the user's `pp`.
    pub url: String,
}

/// Media service for image handling.
#[derive(Clone)]
pub struct MediaService {
    public: LocalStorage,
    tmp: LocalStorage,
    api_url: String,
}

impl MediaService {
    /// Create a new media service.
    #[must_use]
    pub fn new(public: LocalStorage, tmp: LocalStorage, api_url: &str) -> Self {
        Self {
            public,
            tmp,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    /// Store a user's avatar as a 500x500 PNG.
    pub async fn upload_avatar(&self, user_id: &str, data: Vec<u8>) -> AppResult<AvatarUpload> {
        let file_name = format!("{user_id}.png");
        let png = self.stage_and_process(&file_name, data, resize_avatar).await?;

        let stored = self.public.put(&format!("users/{file_name}"), &png).await?;
        tracing::info!(user_id = %user_id, size = stored.size, "Avatar stored");

        Ok(AvatarUpload {
            path: stored.path,
            url: format!("{}/public/users/{file_name}", self.api_url),
        })
    }

    /// Remove a user's avatar file.
    pub async fn delete_avatar(&self, user_id: &str) -> AppResult<()> {
        self.public.delete(&format!("users/{user_id}.png")).await
    }

    /// Store a post illustration under its client-supplied name.
    ///
    /// Returns the stored file name.
    pub async fn upload_post_image(&self, client_name: &str, data: Vec<u8>) -> AppResult<String> {
        let file_name = sanitize_file_name(client_name)
            .ok_or_else(|| AppError::BadRequest("Nom de fichier invalide".to_string()))?;

        let format = ImageFormat::from_path(&file_name).ok();
        let resized = self
            .stage_and_process(&file_name, data, move |bytes| resize_post_image(bytes, format))
            .await?;

        self.public
            .put(&format!("posts/{file_name}"), &resized)
            .await?;
        tracing::info!(file = %file_name, "Post image stored");

        Ok(file_name)
    }

    /// Read an avatar by user id (without extension).
    pub async fn user_image(&self, name: &str) -> AppResult<Option<Vec<u8>>> {
        match sanitize_file_name(name) {
            Some(clean) if clean == name => self.public.get(&format!("users/{name}.png")).await,
            _ => Ok(None),
        }
    }

    /// Read a post illustration by file name.
    pub async fn post_image(&self, name: &str) -> AppResult<Option<Vec<u8>>> {
        match sanitize_file_name(name) {
            Some(clean) if clean == name => self.public.get(&format!("posts/{name}")).await,
            _ => Ok(None),
        }
    }

    async fn stage_and_process<F>(
        &self,
        file_name: &str,
        data: Vec<u8>,
        process: F,
    ) -> AppResult<Vec<u8>>
    where
        F: FnOnce(&[u8]) -> AppResult<Vec<u8>> + Send + 'static,
    {
        self.tmp.put(file_name, &data).await?;
        drop(data);

        let result = async {
            let staged = self
                .tmp
                .get(file_name)
                .await?
                .ok_or_else(|| AppError::Storage("Staged upload disappeared".to_string()))?;

            tokio::task::spawn_blocking(move || process(&staged))
                .await
                .map_err(|e| AppError::Internal(format!("Image task failed: {e}")))?
        }
        .await;

        self.tmp.delete(file_name).await?;
        result
    }
}

/// Crop and scale an image to the avatar square, encoded as PNG.
pub fn resize_avatar(data: &[u8]) -> AppResult<Vec<u8>> {
    let img = decode(data)?;
    let resized = img.resize_to_fill(AVATAR_SIZE, AVATAR_SIZE, FilterType::Lanczos3);
    encode(&resized, ImageFormat::Png)
}

/// Scale an image to the post illustration width, keeping its aspect ratio.
///
/// The output keeps `format` when given, else the input's own format.
pub fn resize_post_image(data: &[u8], format: Option<ImageFormat>) -> AppResult<Vec<u8>> {
    let format = match format {
        Some(format) => format,
        None => image::guess_format(data).map_err(|_| upload_failed())?,
    };
    let img = decode(data)?;
    let resized = img.resize(POST_IMAGE_WIDTH, u32::MAX, FilterType::Lanczos3);
    encode(&resized, format)
}

fn decode(data: &[u8]) -> AppResult<DynamicImage> {
    image::load_from_memory(data).map_err(|e| {
        tracing::debug!(error = %e, "Failed to decode upload");
        upload_failed()
    })
}

fn encode(img: &DynamicImage, format: ImageFormat) -> AppResult<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    let img = if format == ImageFormat::Jpeg {
        DynamicImage::ImageRgb8(img.to_rgb8())
    } else {
        img.clone()
    };
    img.write_to(&mut out, format).map_err(|e| {
        tracing::debug!(error = %e, "Failed to encode upload");
        upload_failed()
    })?;
    Ok(out.into_inner())
}

fn upload_failed() -> AppError {
    AppError::BadRequest(UPLOAD_FAILED.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::{GenericImageView, RgbImage};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::new(width, height));
        encode(&img, ImageFormat::Png).unwrap()
    }

    fn scratch_service() -> (MediaService, PathBuf) {
        let root = std::env::temp_dir().join(format!("fedblog-media-{}", ulid::Ulid::new()));
        let service = MediaService::new(
            LocalStorage::new(root.join("public"), "https://blog.example/public".to_string()),
            LocalStorage::new(root.join("tmp"), String::new()),
            "https://blog.example/",
        );
        (service, root)
    }

    #[test]
    fn test_resize_avatar_is_square_png() {
        let out = resize_avatar(&png(800, 300)).unwrap();
        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Png);
        let img = image::load_from_memory(&out).unwrap();
        assert_eq!(img.dimensions(), (AVATAR_SIZE, AVATAR_SIZE));
    }

    #[test]
    fn test_resize_post_image_keeps_ratio() {
        let out = resize_post_image(&png(208, 100), None).unwrap();
        let img = image::load_from_memory(&out).unwrap();
        assert_eq!(img.dimensions(), (104, 50));
    }

    #[test]
    fn test_garbage_is_upload_error() {
        let err = resize_avatar(b"definitely not an image").unwrap_err();
        assert_eq!(err.public_message(), UPLOAD_FAILED);
    }

    #[tokio::test]
    async fn test_upload_avatar_stores_png_and_clears_tmp() {
        let (media, root) = scratch_service();

        let upload = media.upload_avatar("user1", png(40, 40)).await.unwrap();
        assert_eq!(upload.url, "https://blog.example/public/users/user1.png");
        assert!(upload.path.ends_with("users/user1.png"));
        assert!(media.user_image("user1").await.unwrap().is_some());
        assert!(!root.join("tmp/user1.png").exists());

        media.delete_avatar("user1").await.unwrap();
        assert!(media.user_image("user1").await.unwrap().is_none());

        let _ = tokio::fs::remove_dir_all(root).await;
    }

    #[tokio::test]
    async fn test_upload_post_image_uses_client_name() {
        let (media, root) = scratch_service();

        let name = media
            .upload_post_image("../../cover.png", png(300, 150))
            .await
            .unwrap();
        assert_eq!(name, "cover.png");

        let stored = media.post_image("cover.png").await.unwrap().unwrap();
        let img = image::load_from_memory(&stored).unwrap();
        assert_eq!(img.width(), POST_IMAGE_WIDTH);

        assert!(media.post_image("../cover.png").await.unwrap().is_none());

        let _ = tokio::fs::remove_dir_all(root).await;
    }

    #[tokio::test]
    async fn test_failed_upload_still_clears_tmp() {
        let (media, root) = scratch_service();

        let result = media.upload_avatar("user2", b"nope".to_vec()).await;
        assert!(result.is_err());
        assert!(!root.join("tmp/user2.png").exists());

        let _ = tokio::fs::remove_dir_all(root).await;
    }
}
