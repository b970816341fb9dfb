//! Cloudinary image store
//!
//! Talks to the signed REST upload API directly with `reqwest`. Requests are
//! signed with SHA-256, which must be selected as the signature algorithm in
//! the Cloudinary account settings.

use async_trait::async_trait;
use chrono::Utc;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::debug;
use uuid::Uuid;

use crate::core::config::CloudinaryConfig;
use crate::modules::storage::image_store::{ImageStore, ImageUpload, StorageError, StoredImage};

lazy_static! {
    /// A transformation path segment such as `c_limit,w_1920,h_1080`
    static ref TRANSFORMATION_SEGMENT: Regex =
        Regex::new(r"^[a-z]{1,3}_[^,/]+(?:,[a-z]{1,3}_[^,/]+)*$").unwrap();

    /// A version path segment such as `v1712345678`
    static ref VERSION_SEGMENT: Regex = Regex::new(r"^v\d+$").unwrap();
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

pub struct CloudinaryClient {
    config: CloudinaryConfig,
    http_client: Client,
}

impl CloudinaryClient {
    pub fn new(config: CloudinaryConfig) -> Result<Self, StorageError> {
        if config.cloud_name.is_empty() || config.api_key.is_empty() || config.api_secret.is_empty()
        {
            return Err(StorageError::Config(
                "cloud name, API key and API secret are required".to_string(),
            ));
        }

        Ok(Self {
            config,
            http_client: Client::new(),
        })
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/{}/image/{}",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.cloud_name,
            action
        )
    }

    /// Signs `params` the way the upload API expects: sorted `key=value`
    /// pairs joined by `&`, secret appended, hex digest.
    fn sign(&self, params: &[(&str, String)]) -> String {
        let mut sorted: Vec<&(&str, String)> = params.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(b.0));

        let to_sign = sorted
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        hex::encode(Sha256::digest(
            format!("{}{}", to_sign, self.config.api_secret).as_bytes(),
        ))
    }

    fn signed_form(&self, params: Vec<(&'static str, String)>) -> Form {
        let signature = self.sign(&params);
        params
            .into_iter()
            .fold(Form::new(), |form, (k, v)| form.text(k, v))
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256")
    }

    async fn error_message(response: reqwest::Response) -> String {
        let status = response.status();
        match response.json::<ErrorResponse>().await {
            Ok(body) => format!("{} - {}", status, body.error.message),
            Err(_) => status.to_string(),
        }
    }
}

#[async_trait]
impl ImageStore for CloudinaryClient {
    async fn upload(&self, upload: ImageUpload) -> Result<StoredImage, StorageError> {
        let folder = format!("{}/{}", self.config.root_folder, upload.folder);
        let params = vec![
            ("folder", folder),
            ("public_id", Uuid::new_v4().to_string()),
            ("timestamp", Utc::now().timestamp().to_string()),
            ("transformation", upload.transformation.to_cloudinary()),
        ];

        let file = Part::bytes(upload.data)
            .file_name(format!("upload.{}", upload.extension))
            .mime_str(&upload.content_type)?;
        let form = self.signed_form(params).part("file", file);

        let response = self
            .http_client
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StorageError::Upload(Self::error_message(response).await));
        }

        let body: UploadResponse = response.json().await?;
        debug!("Cloudinary stored {}", body.public_id);

        Ok(StoredImage {
            secure_url: body.secure_url,
            public_id: body.public_id,
        })
    }

    async fn destroy(&self, public_id: &str) -> Result<(), StorageError> {
        let params = vec![
            ("public_id", public_id.to_string()),
            ("timestamp", Utc::now().timestamp().to_string()),
        ];

        let response = self
            .http_client
            .post(self.endpoint("destroy"))
            .multipart(self.signed_form(params))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StorageError::Delete(Self::error_message(response).await));
        }

        let body: DestroyResponse = response.json().await?;
        match body.result.as_str() {
            "ok" | "not found" => Ok(()),
            other => Err(StorageError::Delete(format!(
                "unexpected result '{}' for {}",
                other, public_id
            ))),
        }
    }

    /// `https://res.cloudinary.com/<cloud>/image/upload/[<transformations>/][v<version>/]<public_id>.<ext>`
    fn public_id_from_url(&self, url: &str) -> Option<String> {
        public_id_from_url(&self.config.cloud_name, url)
    }

    fn provider(&self) -> &'static str {
        "cloudinary"
    }
}

fn public_id_from_url(cloud_name: &str, url: &str) -> Option<String> {
    let marker = format!("res.cloudinary.com/{}/image/upload/", cloud_name);
    let start = url.find(&marker)? + marker.len();
    let path = url[start..].split(['?', '#']).next()?;
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let rest = match segments.iter().position(|s| VERSION_SEGMENT.is_match(s)) {
        Some(version) => &segments[version + 1..],
        None => {
            let skip = segments
                .iter()
                .take_while(|s| TRANSFORMATION_SEGMENT.is_match(s))
                .count();
            &segments[skip..]
        }
    };

    let joined = rest.join("/");
    let stem = match joined.rsplit_once('.') {
        Some((stem, ext)) if !ext.contains('/') => stem,
        _ => joined.as_str(),
    };

    urlencoding::decode(stem)
        .ok()
        .map(|id| id.into_owned())
        .filter(|id| !id.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> CloudinaryClient {
        CloudinaryClient::new(CloudinaryConfig {
            cloud_name: "demo".to_string(),
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
            api_base_url: "https://api.cloudinary.com/v1_1".to_string(),
            root_folder: "district-atlas".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_public_id_with_version() {
        assert_eq!(
            client().public_id_from_url(
                "https://res.cloudinary.com/demo/image/upload/v1712345678/district-atlas/districts/abc-123.jpg"
            ),
            Some("district-atlas/districts/abc-123".to_string())
        );
    }

    #[test]
    fn test_public_id_with_transformation_and_version() {
        assert_eq!(
            client().public_id_from_url(
                "https://res.cloudinary.com/demo/image/upload/c_limit,w_1920,h_1080,q_auto/v17/folder/My%20Photo.webp?_a=1"
            ),
            Some("folder/My Photo".to_string())
        );
    }

    #[test]
    fn test_public_id_without_version() {
        assert_eq!(
            client().public_id_from_url("https://res.cloudinary.com/demo/image/upload/q_auto/sample.png"),
            Some("sample".to_string())
        );
    }

    #[test]
    fn test_foreign_urls_are_not_ours() {
        let client = client();
        assert_eq!(
            client.public_id_from_url("https://res.cloudinary.com/other/image/upload/v1/a.jpg"),
            None
        );
        assert_eq!(client.public_id_from_url("https://example.org/a.jpg"), None);
    }

    #[test]
    fn test_signature_is_order_independent() {
        let client = client();
        let a = client.sign(&[("timestamp", "1".to_string()), ("folder", "x".to_string())]);
        let b = client.sign(&[("folder", "x".to_string()), ("timestamp", "1".to_string())]);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_requires_credentials() {
        let result = CloudinaryClient::new(CloudinaryConfig {
            cloud_name: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            api_base_url: String::new(),
            root_folder: String::new(),
        });
        assert!(matches!(result, Err(StorageError::Config(_))));
    }
}
