use lazy_static::lazy_static;
use regex::Regex;
use uuid::Uuid;

use crate::core::error::AppError;

lazy_static! {
    /// Regex for validating slugs
    /// Must be lowercase alphanumeric with single hyphens between words
    /// - Valid: "purba-medinipur", "block2", "south-24-parganas"
    /// - Invalid: "-slug", "slug-", "slug--name", "Slug", "slug_name"
    pub static ref SLUG_REGEX: Regex = Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap();
}

/// Parses a path id, rejecting anything that is not a UUID with a 400.
pub fn parse_id(raw: &str, entity: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::BadRequest(format!("Invalid {} ID: '{}'", entity, raw)))
}

/// Derives a slug from a display name.
pub fn slug_from_name(name: &str) -> String {
    slug::slugify(name)
}
