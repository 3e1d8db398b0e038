use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use uuid::Uuid;

const SUPPORTED_FORMATS: [&str; 5] = ["png", "jpeg", "jpg", "gif", "webp"];
const IMAGE_DIRECTORY: &str = "recipes";

/// An uploaded picture decoded from a `data:image/<format>;base64,` URI.
pub struct RecipeImage {
    extension: String,
    bytes: Vec<u8>,
}

impl TryFrom<String> for RecipeImage {
    type Error = InvalidImage;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        let (header, payload) = value
            .trim()
            .strip_prefix("data:image/")
            .and_then(|rest| rest.split_once(";base64,"))
            .ok_or(InvalidImage::NotADataUri)?;
        let extension = header.to_lowercase();
        if !SUPPORTED_FORMATS.contains(&extension.as_str()) {
            return Err(InvalidImage::UnsupportedFormat(extension));
        }
        let bytes = STANDARD
            .decode(payload)
            .map_err(|_| InvalidImage::InvalidEncoding)?;
        if bytes.is_empty() {
            return Err(InvalidImage::Empty);
        }
        Ok(Self { extension, bytes })
    }
}

impl RecipeImage {
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Writes the image under `media_root` and returns its path relative
    /// to it.
    #[tracing::instrument(name = "Storing recipe image", skip(self))]
    pub async fn store(
        &self,
        media_root: &Path,
    ) -> Result<String, std::io::Error> {
        let relative_path = format!(
            "{}/{}.{}",
            IMAGE_DIRECTORY,
            Uuid::now_v7(),
            self.extension
        );
        let path = media_root.join(&relative_path);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &self.bytes).await?;
        Ok(relative_path)
    }
}

impl std::fmt::Debug for RecipeImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecipeImage")
            .field("extension", &self.extension)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// Removes a stored image. A failure is logged and otherwise ignored.
#[tracing::instrument(name = "Discarding recipe image")]
pub async fn discard_image(media_root: &Path, relative_path: &str) {
    if let Err(e) = tokio::fs::remove_file(media_root.join(relative_path)).await
    {
        tracing::warn!(error = %e, "Could not remove a recipe image.");
    }
}

pub fn media_url(base_url: &str, relative_path: &str) -> String {
    format!("{}/media/{}", base_url.trim_end_matches('/'), relative_path)
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum InvalidImage {
    #[error("Image must be a base64 encoded data URI.")]
    NotADataUri,
    #[error("Image format {0} is not supported.")]
    UnsupportedFormat(String),
    #[error("Image is not valid base64.")]
    InvalidEncoding,
    #[error("Image is empty.")]
    Empty,
}
