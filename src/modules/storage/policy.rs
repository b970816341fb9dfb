use crate::core::error::AppError;
use crate::shared::form::UploadedFile;

/// Allowed MIME types for header images
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

/// Default maximum image size in bytes (50MB)
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 50 * 1024 * 1024;

/// Type and size limits checked before anything is sent to the image store
#[derive(Debug, Clone, Copy)]
pub struct ImagePolicy {
    pub max_bytes: usize,
}

impl Default for ImagePolicy {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}

/// A file that passed the policy, with its effective MIME type
#[derive(Debug, Clone)]
pub struct CheckedImage {
    pub content_type: &'static str,
    pub extension: &'static str,
    pub data: Vec<u8>,
}

impl ImagePolicy {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    /// Validates type, then size.
    ///
    /// The type is sniffed from the leading bytes when recognisable, falling
    /// back to the declared part content type.
    pub fn check(&self, file: UploadedFile) -> Result<CheckedImage, AppError> {
        let sniffed = infer::get(&file.data).map(|kind| kind.mime_type());
        let effective = sniffed.unwrap_or(file.content_type.as_str());

        let content_type = ALLOWED_IMAGE_TYPES
            .iter()
            .copied()
            .find(|allowed| *allowed == effective)
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "File type '{}' is not allowed. Allowed types: {}",
                    effective,
                    ALLOWED_IMAGE_TYPES.join(", ")
                ))
            })?;

        if file.data.len() > self.max_bytes {
            return Err(AppError::Validation(format!(
                "File too large. Maximum size is {} bytes ({} MB)",
                self.max_bytes,
                self.max_bytes / 1024 / 1024
            )));
        }

        Ok(CheckedImage {
            content_type,
            extension: extension_for(content_type),
            data: file.data,
        })
    }
}

/// File extension for an allowed image type
pub fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];
    const PDF_MAGIC: &[u8] = b"%PDF-1.7\n";

    fn file(content_type: &str, data: &[u8]) -> UploadedFile {
        UploadedFile {
            file_name: "upload".to_string(),
            content_type: content_type.to_string(),
            data: data.to_vec(),
        }
    }

    #[test]
    fn test_accepts_sniffed_png_even_when_mislabelled() {
        let checked = ImagePolicy::default()
            .check(file("application/octet-stream", PNG_MAGIC))
            .unwrap();
        assert_eq!(checked.content_type, "image/png");
        assert_eq!(checked.extension, "png");
    }

    #[test]
    fn test_rejects_disguised_pdf() {
        let err = ImagePolicy::default()
            .check(file("image/jpeg", PDF_MAGIC))
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("application/pdf")));
    }

    #[test]
    fn test_falls_back_to_declared_type() {
        let checked = ImagePolicy::default()
            .check(file("image/webp", b"not-sniffable"))
            .unwrap();
        assert_eq!(checked.content_type, "image/webp");

        assert!(ImagePolicy::default()
            .check(file("image/gif", b"not-sniffable"))
            .is_err());
    }

    #[test]
    fn test_rejects_oversized() {
        let policy = ImagePolicy::new(8);
        let err = policy.check(file("image/png", PNG_MAGIC)).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("too large")));
    }
}
