use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::shared::types::Coordinates;
use crate::shared::validation::{slug_from_name, SLUG_REGEX};

/// Review state of a gram panchayat entry
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type,
)]
#[sqlx(type_name = "gram_panchayat_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GramPanchayatStatus {
    #[default]
    Draft,
    Pending,
    Verified,
}

impl FromStr for GramPanchayatStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "pending" => Ok(Self::Pending),
            "verified" => Ok(Self::Verified),
            other => Err(format!("Unknown gram panchayat status '{}'", other)),
        }
    }
}

impl fmt::Display for GramPanchayatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Pending => write!(f, "pending"),
            Self::Verified => write!(f, "verified"),
        }
    }
}

/// Database model for gram panchayat
#[derive(Debug, Clone, FromRow)]
pub struct GramPanchayat {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub district_id: Uuid,
    pub block: Option<String>,
    pub establishment_year: Option<i32>,
    pub historical_background: Option<String>,
    pub local_art: Option<String>,
    pub local_cuisine: Option<String>,
    pub traditions: Option<String>,
    pub population: Option<i64>,
    pub area: Option<f64>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub header_image: Option<String>,
    pub status: GramPanchayatStatus,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GramPanchayat {
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_columns(self.lat, self.lng)
    }

    pub fn to_fields(&self) -> GramPanchayatFields {
        GramPanchayatFields {
            name: self.name.clone(),
            slug: self.slug.clone(),
            district_id: self.district_id,
            block: self.block.clone(),
            establishment_year: self.establishment_year,
            historical_background: self.historical_background.clone(),
            local_art: self.local_art.clone(),
            local_cuisine: self.local_cuisine.clone(),
            traditions: self.traditions.clone(),
            population: self.population,
            area: self.area,
            coordinates: self.coordinates(),
            header_image: self.header_image.clone(),
            status: self.status,
        }
    }
}

/// Validated document written by insert and update
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct GramPanchayatFields {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[validate(
        length(min = 1, max = 120, message = "Slug must be 1-120 characters"),
        regex(
            path = *SLUG_REGEX,
            message = "Slug must be lowercase alphanumeric words separated by single hyphens"
        )
    )]
    pub slug: String,
    pub district_id: Uuid,
    #[validate(length(max = 100, message = "Block must not exceed 100 characters"))]
    pub block: Option<String>,
    #[validate(range(min = 1000, max = 2100, message = "Establishment year must be between 1000 and 2100"))]
    pub establishment_year: Option<i32>,
    #[validate(length(max = 20000))]
    pub historical_background: Option<String>,
    #[validate(length(max = 20000))]
    pub local_art: Option<String>,
    #[validate(length(max = 20000))]
    pub local_cuisine: Option<String>,
    #[validate(length(max = 20000))]
    pub traditions: Option<String>,
    #[validate(range(min = 0, message = "Population must not be negative"))]
    pub population: Option<i64>,
    #[validate(range(min = 0.0, message = "Area must not be negative"))]
    pub area: Option<f64>,
    #[validate(nested)]
    pub coordinates: Option<Coordinates>,
    pub header_image: Option<String>,
    pub status: GramPanchayatStatus,
}

impl GramPanchayatFields {
    pub fn new(name: &str, district_id: Uuid) -> Self {
        let name = name.trim();
        Self {
            name: name.to_string(),
            slug: slug_from_name(name),
            district_id,
            block: None,
            establishment_year: None,
            historical_background: None,
            local_art: None,
            local_cuisine: None,
            traditions: None,
            population: None,
            area: None,
            coordinates: None,
            header_image: None,
            status: GramPanchayatStatus::default(),
        }
    }
}
