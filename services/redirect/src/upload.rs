//! Multipart upload handling
//!
//! Reads the `image` and `redirectUrl` fields of a form submission. The
//! image is streamed straight into the uploads area as it arrives.

use axum::extract::Multipart;
use axum::extract::multipart::{Field, MultipartError};
use common::error::{StorageError, StorageResult};
use common::storage::PublicStorage;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Form field carrying the image file
pub const IMAGE_FIELD: &str = "image";
/// Form field carrying the redirect target
pub const REDIRECT_URL_FIELD: &str = "redirectUrl";

/// Extensions kept on stored uploads; anything else is stored without one
///
/// Uploads are served from the service's own origin, so markup types such
/// as `html` or `svg` must never reach disk under an active extension.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp", "ico", "avif"];

/// Errors raised while reading an upload
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Failed to read multipart body: {0}")]
    Multipart(#[from] MultipartError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Unexpected additional 'image' field")]
    DuplicateImage,
}

/// An uploaded image persisted in the uploads area
#[derive(Debug, Clone)]
pub struct StoredImage {
    pub path: PathBuf,
    pub filename: String,
    pub size: u64,
}

/// Fields read from a form submission; presence is checked by the caller
#[derive(Debug, Default)]
pub struct UploadForm {
    pub image: Option<StoredImage>,
    pub redirect_url: Option<String>,
}

/// Read the whole form, storing the image as it streams in
pub async fn receive(
    mut multipart: Multipart,
    storage: &PublicStorage,
) -> Result<UploadForm, UploadError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(|s| s.to_string());

        match name.as_deref() {
            Some(IMAGE_FIELD) => {
                if form.image.is_some() {
                    return Err(UploadError::DuplicateImage);
                }
                form.image = Some(store_image(field, storage).await?);
            }
            Some(REDIRECT_URL_FIELD) => {
                form.redirect_url = Some(field.text().await?);
            }
            other => {
                debug!("Ignoring form field {:?}", other);
            }
        }
    }

    Ok(form)
}

async fn store_image(
    mut field: Field<'_>,
    storage: &PublicStorage,
) -> Result<StoredImage, UploadError> {
    let extension = upload_extension(field.file_name());
    let mut artifact = storage.create_upload(&extension).await?;
    let mut size = 0u64;

    while let Some(chunk) = field.chunk().await? {
        write_chunk(&mut artifact.file, &artifact.path, &chunk).await?;
        size += chunk.len() as u64;
    }

    artifact
        .file
        .flush()
        .await
        .map_err(|e| StorageError::io(&artifact.path, e))?;

    debug!(
        "Stored {} byte upload at {}",
        size,
        artifact.path.display()
    );

    Ok(StoredImage {
        path: artifact.path,
        filename: artifact.filename,
        size,
    })
}

async fn write_chunk(
    file: &mut tokio::fs::File,
    path: &Path,
    chunk: &[u8],
) -> StorageResult<()> {
    file.write_all(chunk)
        .await
        .map_err(|e| StorageError::io(path, e))
}

/// Extension (with leading dot, lowercased) to keep from the client's file name
///
/// Only the final path component is considered and only known raster image
/// extensions survive; anything else yields an empty string.
pub fn upload_extension(original_name: Option<&str>) -> String {
    let Some(name) = original_name else {
        return String::new();
    };

    // Clients may send Windows-style paths
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);

    let extension = Path::new(base)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension {
        Some(ext) if IMAGE_EXTENSIONS.contains(&ext.as_str()) => format!(".{}", ext),
        _ => String::new(),
    }
}
