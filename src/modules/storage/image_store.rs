use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Image upload failed: {0}")]
    Upload(String),

    #[error("Image delete failed: {0}")]
    Delete(String),

    #[error("Image store misconfigured: {0}")]
    Config(String),

    #[error("Image store request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Resize/quality options applied when an image is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageTransformation {
    pub max_width: u32,
    pub max_height: u32,
    pub auto_quality: bool,
}

impl ImageTransformation {
    /// Fixed transformation for header images: fit inside 1920x1080, auto quality
    pub const HEADER: Self = Self {
        max_width: 1920,
        max_height: 1080,
        auto_quality: true,
    };

    /// Cloudinary transformation string, e.g. `c_limit,w_1920,h_1080,q_auto`
    pub fn to_cloudinary(&self) -> String {
        let mut parts = vec![
            "c_limit".to_string(),
            format!("w_{}", self.max_width),
            format!("h_{}", self.max_height),
        ];
        if self.auto_quality {
            parts.push("q_auto".to_string());
        }
        parts.join(",")
    }
}

/// An image ready to be sent to the store
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Folder below the store's root, e.g. `districts`
    pub folder: String,
    pub content_type: String,
    pub extension: &'static str,
    pub data: Vec<u8>,
    pub transformation: ImageTransformation,
}

/// Where a stored image ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// HTTPS URL persisted on the document
    pub secure_url: String,
    /// Store-specific identifier used for deletion
    pub public_id: String,
}

/// External object storage for uploaded header images.
///
/// Documents only keep the URL; the public id needed for deletion is
/// derived back from that URL, so `public_id_from_url` returns `None` for
/// URLs this store does not host.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn upload(&self, upload: ImageUpload) -> Result<StoredImage, StorageError>;

    async fn destroy(&self, public_id: &str) -> Result<(), StorageError>;

    fn public_id_from_url(&self, url: &str) -> Option<String>;

    fn provider(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_transformation_string() {
        assert_eq!(
            ImageTransformation::HEADER.to_cloudinary(),
            "c_limit,w_1920,h_1080,q_auto"
        );

        let plain = ImageTransformation {
            auto_quality: false,
            ..ImageTransformation::HEADER
        };
        assert_eq!(plain.to_cloudinary(), "c_limit,w_1920,h_1080");
    }
}
