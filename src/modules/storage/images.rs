use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use crate::core::error::{AppError, Result};
use crate::modules::storage::image_store::{ImageStore, ImageTransformation, ImageUpload};
use crate::modules::storage::policy::{CheckedImage, ImagePolicy};
use crate::shared::form::ImageInput;

/// Tally of best-effort image deletions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageCleanupSummary {
    /// Images hosted by our store that a delete was issued for
    pub attempted: u32,
    pub deleted: u32,
    /// Deletes that failed and were logged; the images are orphaned
    pub failed: u32,
    /// URLs not hosted by our store, left alone
    pub skipped: u32,
}

/// Header image change that passed validation but has not touched the store yet
#[derive(Debug)]
pub enum PreparedImage {
    Keep,
    Upload(CheckedImage),
    Url(String),
}

/// Header image stored by `apply`, pending the row write
#[derive(Debug)]
pub struct AppliedImage {
    /// URL to persist on the row
    pub url: Option<String>,
    replaced: Option<String>,
    uploaded: Option<String>,
}

/// Applies header image changes against the image store.
///
/// Validation (`prepare`) and storage I/O (`apply`) are separate steps so
/// callers can run their own conflict checks in between and never upload
/// for a request that is about to be rejected.
pub struct ImageManager {
    store: Arc<dyn ImageStore>,
    policy: ImagePolicy,
}

impl ImageManager {
    pub fn new(store: Arc<dyn ImageStore>, policy: ImagePolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> ImagePolicy {
        self.policy
    }

    /// Checks an uploaded file against the policy. No store calls.
    pub fn prepare(&self, input: ImageInput) -> Result<PreparedImage> {
        match input {
            ImageInput::Keep => Ok(PreparedImage::Keep),
            ImageInput::Url(url) => Ok(PreparedImage::Url(url)),
            ImageInput::Upload(file) => Ok(PreparedImage::Upload(self.policy.check(file)?)),
        }
    }

    /// Stores the new image (if any) and returns the header URL to persist.
    ///
    /// Nothing is deleted here. Once the row write settles, hand the result
    /// to `commit` (drops the replaced image) or `rollback` (drops the fresh
    /// upload), so a failed write never leaves the row pointing at a
    /// destroyed image.
    pub async fn apply(
        &self,
        prepared: PreparedImage,
        current: Option<&str>,
        folder: &str,
    ) -> Result<AppliedImage> {
        let replaced = |new: &str| current.filter(|old| *old != new).map(str::to_string);

        match prepared {
            PreparedImage::Keep => Ok(AppliedImage {
                url: current.map(str::to_string),
                replaced: None,
                uploaded: None,
            }),
            PreparedImage::Url(url) => Ok(AppliedImage {
                replaced: replaced(&url),
                url: Some(url),
                uploaded: None,
            }),
            PreparedImage::Upload(image) => {
                let stored = self
                    .store
                    .upload(ImageUpload {
                        folder: folder.to_string(),
                        content_type: image.content_type.to_string(),
                        extension: image.extension,
                        data: image.data,
                        transformation: ImageTransformation::HEADER,
                    })
                    .await
                    .map_err(|e| AppError::ExternalServiceError(e.to_string()))?;

                info!(
                    "Uploaded header image to {}: {}",
                    self.store.provider(),
                    stored.public_id
                );

                Ok(AppliedImage {
                    replaced: replaced(&stored.secure_url),
                    url: Some(stored.secure_url.clone()),
                    uploaded: Some(stored.secure_url),
                })
            }
        }
    }

    /// The row now points at `applied.url`; the image it replaced goes, best-effort.
    pub async fn commit(&self, applied: AppliedImage) {
        if let Some(old) = applied.replaced {
            self.discard(&old).await;
        }
    }

    /// The row write failed; the row still points at the previous image, so
    /// only the fresh upload goes.
    pub async fn rollback(&self, applied: AppliedImage) {
        if let Some(new) = applied.uploaded {
            warn!("Discarding header image uploaded for a failed write: {}", new);
            self.discard(&new).await;
        }
    }

    /// Deletes an image if our store hosts it. Failures are logged and counted, never returned.
    pub async fn delete_best_effort(&self, url: &str, summary: &mut ImageCleanupSummary) {
        let Some(public_id) = self.store.public_id_from_url(url) else {
            debug!("Skipping image not hosted by {}: {}", self.store.provider(), url);
            summary.skipped += 1;
            return;
        };

        summary.attempted += 1;
        match self.store.destroy(&public_id).await {
            Ok(()) => {
                debug!("Deleted image {}", public_id);
                summary.deleted += 1;
            }
            Err(e) => {
                warn!("Failed to delete image {} ({}): {}", public_id, url, e);
                summary.failed += 1;
            }
        }
    }

    async fn discard(&self, url: &str) {
        let mut summary = ImageCleanupSummary::default();
        self.delete_best_effort(url, &mut summary).await;
    }
}
