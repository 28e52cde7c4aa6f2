use anyhow::Result;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use uuid::Uuid;

/// Public image storage on local disk.
///
/// Images live at `{dir}/properties/{property_id}/{sha256}.{ext}`. The key
/// (path relative to `dir`) is content-addressed, so re-uploading the same
/// bytes for a listing lands on the same file.
pub struct ImageStorage {
    dir: PathBuf,
}

impl ImageStorage {
    pub async fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Image storage directory: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn root(&self) -> &Path {
        &self.dir
    }

    fn property_dir(&self, property_id: Uuid) -> PathBuf {
        self.dir.join("properties").join(property_id.to_string())
    }

    /// Write an image and return its storage key.
    pub async fn save_property_image(
        &self,
        property_id: Uuid,
        extension: &str,
        data: &[u8],
    ) -> Result<String> {
        let mut hasher = Sha256::new();
        hasher.update(data);
        let file_name = format!("{}.{}", hex::encode(hasher.finalize()), extension);

        let dir = self.property_dir(property_id);
        fs::create_dir_all(&dir).await?;

        let mut file = fs::File::create(dir.join(&file_name)).await?;
        file.write_all(data).await?;
        file.flush().await?;

        Ok(format!("properties/{}/{}", property_id, file_name))
    }

    /// Remove every stored image of a listing. Missing directories are fine.
    pub async fn delete_property_images(&self, property_id: Uuid) -> Result<()> {
        match fs::remove_dir_all(self.property_dir(property_id)).await {
            Ok(()) => {
                info!("Deleted images for property {}", property_id);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                warn!("Failed to delete images for property {}: {}", property_id, e);
                Err(e.into())
            }
        }
    }
}

/// File extension for an accepted image content type.
pub fn image_extension(content_type: &str) -> Option<&'static str> {
    let mime = content_type.split(';').next()?.trim().to_ascii_lowercase();
    match mime.as_str() {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "image/avif" => Some("avif"),
        _ => None,
    }
}
