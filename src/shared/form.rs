//! Multipart form helpers shared by the admin create/update endpoints.
//!
//! The admin forms post scalars as text parts, tag lists as comma-separated
//! strings, embedded lists as JSON strings, and the header image either as a
//! file part or as a URL (`uploadMethod=url` + `headerImageUrl`).

use std::collections::HashMap;
use std::str::FromStr;

use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::core::error::{AppError, Result};
use crate::shared::types::Coordinates;

/// Multipart part name carrying the header image file
pub const HEADER_IMAGE_FIELD: &str = "headerImage";

/// A file part read fully into memory
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// How the caller wants the header image changed
#[derive(Debug, Clone, Default)]
pub enum ImageInput {
    /// Leave the stored image untouched
    #[default]
    Keep,
    /// Upload a new file to the image store
    Upload(UploadedFile),
    /// Point at an externally supplied URL
    Url(String),
}

impl ImageInput {
    /// Image input for JSON payloads, which can only carry a URL.
    pub fn from_url(url: Option<String>) -> Self {
        match url {
            Some(url) if !url.trim().is_empty() => ImageInput::Url(url.trim().to_string()),
            _ => ImageInput::Keep,
        }
    }
}

/// Text and file parts collected from a multipart body
#[derive(Debug, Default)]
pub struct FormFields {
    text: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::BadRequest(format!("Failed to read multipart data: {}", e.body_text()))
    }
}

impl FormFields {
    /// Drains the multipart stream. Parts with a filename are kept as files,
    /// everything else as text; empty file parts are dropped.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self> {
        let mut form = FormFields::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let Some(name) = field.name().map(str::to_string) else {
                debug!("Ignoring unnamed multipart field");
                continue;
            };

            if let Some(file_name) = field.file_name().map(str::to_string) {
                let content_type = field
                    .content_type()
                    .map(str::to_string)
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let data = field.bytes().await.map_err(multipart_error)?;

                if data.is_empty() {
                    debug!("Ignoring empty file part: {}", name);
                    continue;
                }

                form.files.insert(
                    name,
                    UploadedFile {
                        file_name,
                        content_type,
                        data: data.to_vec(),
                    },
                );
            } else {
                let value = field.text().await.map_err(multipart_error)?;
                form.text.insert(name, value);
            }
        }

        Ok(form)
    }

    pub fn insert_text(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.text.insert(key.into(), value.into());
    }

    pub fn insert_file(&mut self, key: impl Into<String>, file: UploadedFile) {
        self.files.insert(key.into(), file);
    }

    /// Trimmed text value; blank values count as absent.
    pub fn text(&self, key: &str) -> Option<String> {
        self.text
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// Parses a scalar field, 400 on malformed input.
    pub fn parse<T: FromStr>(&self, key: &str) -> Result<Option<T>> {
        self.text(key)
            .map(|raw| {
                raw.parse::<T>()
                    .map_err(|_| AppError::BadRequest(format!("Invalid value for '{}'", key)))
            })
            .transpose()
    }

    /// Comma-separated tag list. A part that is present but blank clears the list.
    pub fn csv(&self, key: &str) -> Option<Vec<String>> {
        self.text.get(key).map(|raw| split_csv(raw))
    }

    /// JSON-encoded field such as `touristPlaces`.
    pub fn json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.text(key)
            .map(|raw| {
                serde_json::from_str::<T>(&raw)
                    .map_err(|e| AppError::BadRequest(format!("Invalid JSON in '{}': {}", key, e)))
            })
            .transpose()
    }

    /// `coordinates[lat]` / `coordinates[lng]`; both or neither.
    pub fn coordinates(&self) -> Result<Option<Coordinates>> {
        let lat = self.parse::<f64>("coordinates[lat]")?;
        let lng = self.parse::<f64>("coordinates[lng]")?;
        match (lat, lng) {
            (Some(lat), Some(lng)) => Ok(Some(Coordinates { lat, lng })),
            (None, None) => Ok(None),
            _ => Err(AppError::BadRequest(
                "Both coordinates[lat] and coordinates[lng] are required".to_string(),
            )),
        }
    }

    /// Resolves the header image fields.
    ///
    /// `uploadMethod` defaults to `file`. With `file` and no file part the
    /// image is kept; with `url` and a blank `headerImageUrl` likewise.
    pub fn header_image(&mut self) -> Result<ImageInput> {
        let method = self.text("uploadMethod");
        match method.as_deref() {
            None | Some("file") => Ok(self
                .files
                .remove(HEADER_IMAGE_FIELD)
                .map(ImageInput::Upload)
                .unwrap_or_default()),
            Some("url") => Ok(ImageInput::from_url(self.text("headerImageUrl"))),
            Some(other) => Err(AppError::BadRequest(format!(
                "Unsupported uploadMethod '{}', expected 'file' or 'url'",
                other
            ))),
        }
    }
}

fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
