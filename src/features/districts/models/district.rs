use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::shared::types::Coordinates;
use crate::shared::validation::{slug_from_name, SLUG_REGEX};

/// Publication state of a district
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type,
)]
#[sqlx(type_name = "district_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DistrictStatus {
    Active,
    #[default]
    Draft,
}

impl FromStr for DistrictStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "draft" => Ok(Self::Draft),
            other => Err(format!("Unknown district status '{}'", other)),
        }
    }
}

impl fmt::Display for DistrictStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Draft => write!(f, "draft"),
        }
    }
}

/// Place of interest embedded in a district
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TouristPlace {
    #[validate(length(min = 1, max = 200, message = "Tourist place name must be 1-200 characters"))]
    pub name: String,
    #[validate(length(max = 5000, message = "Description must not exceed 5000 characters"))]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 100))]
    pub category: Option<String>,
    /// Image URLs
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub location: Option<Coordinates>,
}

/// Notable person associated with a district
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FamousPersonality {
    #[validate(length(min = 1, max = 200, message = "Personality name must be 1-200 characters"))]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 200))]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    /// Portrait URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Database model for district
#[derive(Debug, Clone, FromRow)]
pub struct District {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub formation_year: Option<i32>,
    pub area: Option<f64>,
    pub population: Option<i64>,
    pub history_and_culture: Option<String>,
    pub status: DistrictStatus,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub major_rivers: Vec<String>,
    pub hills: Vec<String>,
    pub natural_spots: Vec<String>,
    pub tourist_places: Json<Vec<TouristPlace>>,
    pub famous_personalities: Json<Vec<FamousPersonality>>,
    pub header_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl District {
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_columns(self.lat, self.lng)
    }

    /// Writable copy of the stored document, used as the base for merges
    pub fn to_fields(&self) -> DistrictFields {
        DistrictFields {
            name: self.name.clone(),
            slug: self.slug.clone(),
            formation_year: self.formation_year,
            area: self.area,
            population: self.population,
            history_and_culture: self.history_and_culture.clone(),
            status: self.status,
            coordinates: self.coordinates(),
            major_rivers: self.major_rivers.clone(),
            hills: self.hills.clone(),
            natural_spots: self.natural_spots.clone(),
            tourist_places: self.tourist_places.0.clone(),
            famous_personalities: self.famous_personalities.0.clone(),
            header_image: self.header_image.clone(),
        }
    }

    /// Every image URL embedded in tourist places, in document order
    pub fn tourist_place_images(&self) -> impl Iterator<Item = &str> {
        self.tourist_places
            .iter()
            .flat_map(|place| place.images.iter())
            .map(String::as_str)
            .filter(|url| !url.trim().is_empty())
    }

    /// Portrait URLs of famous personalities that have one
    pub fn personality_images(&self) -> impl Iterator<Item = &str> {
        self.famous_personalities
            .iter()
            .filter_map(|person| person.image.as_deref())
            .filter(|url| !url.trim().is_empty())
    }
}

/// Validated document written by insert and update
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct DistrictFields {
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
    #[validate(range(min = 1000, max = 2100, message = "Formation year must be between 1000 and 2100"))]
    pub formation_year: Option<i32>,
    #[validate(range(min = 0.0, message = "Area must not be negative"))]
    pub area: Option<f64>,
    #[validate(range(min = 0, message = "Population must not be negative"))]
    pub population: Option<i64>,
    #[validate(length(max = 20000, message = "History and culture must not exceed 20000 characters"))]
    pub history_and_culture: Option<String>,
    pub status: DistrictStatus,
    #[validate(nested)]
    pub coordinates: Option<Coordinates>,
    pub major_rivers: Vec<String>,
    pub hills: Vec<String>,
    pub natural_spots: Vec<String>,
    #[validate(nested)]
    pub tourist_places: Vec<TouristPlace>,
    #[validate(nested)]
    pub famous_personalities: Vec<FamousPersonality>,
    pub header_image: Option<String>,
}

impl DistrictFields {
    /// Fresh draft document; the slug is derived from the name.
    pub fn named(name: &str) -> Self {
        let name = name.trim();
        Self {
            name: name.to_string(),
            slug: slug_from_name(name),
            formation_year: None,
            area: None,
            population: None,
            history_and_culture: None,
            status: DistrictStatus::default(),
            coordinates: None,
            major_rivers: Vec::new(),
            hills: Vec::new(),
            natural_spots: Vec::new(),
            tourist_places: Vec::new(),
            famous_personalities: Vec::new(),
            header_image: None,
        }
    }
}
