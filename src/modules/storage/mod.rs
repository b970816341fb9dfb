//! Storage module for header images
//!
//! Provides the `ImageStore` abstraction with Cloudinary and MinIO/S3
//! backends, the upload policy, and the best-effort cleanup used by the
//! catalogue services.

mod cloudinary_client;
mod image_store;
mod images;
mod minio_client;
mod policy;

use std::sync::Arc;

pub use cloudinary_client::CloudinaryClient;
pub use image_store::{ImageStore, ImageTransformation, ImageUpload, StorageError, StoredImage};
pub use images::{AppliedImage, ImageCleanupSummary, ImageManager, PreparedImage};
pub use minio_client::MinIOClient;
pub use policy::{CheckedImage, ImagePolicy, ALLOWED_IMAGE_TYPES, DEFAULT_MAX_IMAGE_BYTES};

use crate::core::config::{ImageStoreConfig, ImageStoreProvider};

/// Builds the configured image store backend.
pub async fn connect(config: &ImageStoreConfig) -> Result<Arc<dyn ImageStore>, StorageError> {
    match config.provider {
        ImageStoreProvider::Cloudinary => {
            Ok(Arc::new(CloudinaryClient::new(config.cloudinary.clone())?))
        }
        ImageStoreProvider::S3 => {
            let client = MinIOClient::new(config.s3.clone())?;
            client.ensure_bucket_exists().await;
            tracing::info!("S3 image store ready, bucket: {}", client.bucket_name());
            Ok(Arc::new(client))
        }
    }
}
