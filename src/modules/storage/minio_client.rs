//! MinIO/S3-compatible image store
//!
//! Used for self-hosted deployments. Objects are written under the public
//! prefix and served straight from the bucket, so the upload transformation
//! is not applied here; images are stored as uploaded.
//!
//! The bucket must allow anonymous reads on the public prefix, e.g.
//! `mc anonymous set download <alias>/<bucket>/<prefix>`.

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::config::S3Config;
use crate::modules::storage::image_store::{ImageStore, ImageUpload, StorageError, StoredImage};

/// MinIO/S3-compatible storage client
pub struct MinIOClient {
    bucket: Box<Bucket>,
    region: Region,
    credentials: Credentials,
    endpoint: String,
    public_endpoint: String,
    public_prefix: String,
}

impl MinIOClient {
    /// Create a new MinIO client from configuration
    pub fn new(config: S3Config) -> Result<Self, StorageError> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::Config(format!("Failed to create S3 credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let mut bucket = Bucket::new(&config.bucket, region.clone(), credentials.clone())
            .map_err(|e| StorageError::Config(format!("Failed to create S3 bucket handle: {}", e)))?;

        // MinIO wants http://endpoint/bucket rather than http://bucket.endpoint
        bucket.set_path_style();

        Ok(Self {
            bucket,
            region,
            credentials,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            public_endpoint: config.public_endpoint.trim_end_matches('/').to_string(),
            public_prefix: config.public_prefix.trim_matches('/').to_string(),
        })
    }

    /// Ensure the bucket exists, create if not
    pub async fn ensure_bucket_exists(&self) {
        let created = Bucket::create_with_path_style(
            &self.bucket.name(),
            self.region.clone(),
            self.credentials.clone(),
            BucketConfiguration::default(),
        )
        .await;

        match created {
            Ok(_) => info!("Bucket '{}' created successfully", self.bucket.name()),
            Err(e) => {
                let error_str = e.to_string();
                if error_str.contains("BucketAlreadyOwnedByYou")
                    || error_str.contains("BucketAlreadyExists")
                    || error_str.contains("already own it")
                {
                    debug!("Bucket '{}' already exists", self.bucket.name());
                } else {
                    warn!(
                        "Could not create bucket '{}': {}. Assuming it exists.",
                        self.bucket.name(),
                        e
                    );
                }
            }
        }
    }

    pub fn bucket_name(&self) -> String {
        self.bucket.name()
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.public_endpoint, self.bucket.name(), key)
    }

    /// Object key for a URL on either endpoint, restricted to the public prefix
    fn key_from_url(&self, url: &str) -> Option<String> {
        let bucket = self.bucket.name();
        [&self.public_endpoint, &self.endpoint]
            .iter()
            .find_map(|endpoint| url.strip_prefix(&format!("{}/{}/", endpoint, bucket)))
            .map(|key| key.split(['?', '#']).next().unwrap_or(key))
            .filter(|key| key.starts_with(&format!("{}/", self.public_prefix)))
            .and_then(|key| urlencoding::decode(key).ok())
            .map(|key| key.into_owned())
    }
}

#[async_trait]
impl ImageStore for MinIOClient {
    async fn upload(&self, upload: ImageUpload) -> Result<StoredImage, StorageError> {
        let key = format!(
            "{}/{}/{}.{}",
            self.public_prefix,
            upload.folder,
            Uuid::new_v4(),
            upload.extension
        );

        debug!(
            "Storing {} without server-side transformation ({}x{} limit requested)",
            key, upload.transformation.max_width, upload.transformation.max_height
        );

        self.bucket
            .put_object_with_content_type(&key, &upload.data, &upload.content_type)
            .await
            .map_err(|e| StorageError::Upload(format!("'{}': {}", key, e)))?;

        Ok(StoredImage {
            secure_url: self.object_url(&key),
            public_id: key,
        })
    }

    async fn destroy(&self, public_id: &str) -> Result<(), StorageError> {
        self.bucket
            .delete_object(public_id)
            .await
            .map_err(|e| StorageError::Delete(format!("'{}': {}", public_id, e)))?;

        debug!(
            "Deleted object '{}' from bucket '{}'",
            public_id,
            self.bucket.name()
        );
        Ok(())
    }

    fn public_id_from_url(&self, url: &str) -> Option<String> {
        self.key_from_url(url)
    }

    fn provider(&self) -> &'static str {
        "s3"
    }
}
