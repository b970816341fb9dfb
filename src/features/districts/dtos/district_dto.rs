use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::core::extractor::JsonOrMultipart;
use crate::features::districts::models::{
    District, DistrictFields, DistrictStatus, FamousPersonality, TouristPlace,
};
use crate::features::gram_panchayats::dtos::GramPanchayatSummaryDto;
use crate::modules::storage::ImageCleanupSummary;
use crate::shared::form::{FormFields, ImageInput};
use crate::shared::types::{Coordinates, Pagination};

// =============================================================================
// REQUEST DTOs
// =============================================================================

/// Query params for listing districts
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListDistrictsQuery {
    /// Page number (1-indexed)
    #[param(minimum = 1)]
    pub page: Option<i64>,
    /// Items per page
    #[param(minimum = 1, maximum = 100)]
    pub page_size: Option<i64>,
    pub status: Option<DistrictStatus>,
    /// Case-insensitive partial match on the name
    pub search: Option<String>,
}

impl ListDistrictsQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.page_size)
    }
}

/// Partial district update; absent fields keep their stored value.
///
/// Also the intermediate form of a multipart create, see [`CreateDistrictDto`].
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDistrictDto {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub formation_year: Option<i32>,
    pub area: Option<f64>,
    pub population: Option<i64>,
    pub history_and_culture: Option<String>,
    pub status: Option<DistrictStatus>,
    pub coordinates: Option<Coordinates>,
    pub major_rivers: Option<Vec<String>>,
    pub hills: Option<Vec<String>>,
    pub natural_spots: Option<Vec<String>>,
    pub tourist_places: Option<Vec<TouristPlace>>,
    pub famous_personalities: Option<Vec<FamousPersonality>>,
    /// Header image URL; replaces the stored one when it differs
    pub header_image: Option<String>,
}

/// New district. Only `name` is required; the slug defaults to one derived from it.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDistrictDto {
    pub name: String,
    pub slug: Option<String>,
    pub formation_year: Option<i32>,
    pub area: Option<f64>,
    pub population: Option<i64>,
    pub history_and_culture: Option<String>,
    pub status: Option<DistrictStatus>,
    pub coordinates: Option<Coordinates>,
    pub major_rivers: Option<Vec<String>>,
    pub hills: Option<Vec<String>>,
    pub natural_spots: Option<Vec<String>>,
    pub tourist_places: Option<Vec<TouristPlace>>,
    pub famous_personalities: Option<Vec<FamousPersonality>>,
    pub header_image: Option<String>,
}

impl UpdateDistrictDto {
    /// Reads the multipart field contract. The header image is resolved
    /// separately by [`FormFields::header_image`].
    pub fn from_form(form: &FormFields) -> Result<Self> {
        Ok(Self {
            name: form.text("name"),
            slug: form.text("slug"),
            formation_year: form.parse("formationYear")?,
            area: form.parse("area")?,
            population: form.parse("population")?,
            history_and_culture: form.text("historyAndCulture"),
            status: form.parse("status")?,
            coordinates: form.coordinates()?,
            major_rivers: form.csv("majorRivers"),
            hills: form.csv("hills"),
            natural_spots: form.csv("naturalSpots"),
            tourist_places: form.json("touristPlaces")?,
            famous_personalities: form.json("famousPersonalities")?,
            header_image: None,
        })
    }

    /// Splits a JSON or multipart body into field changes and the header image change.
    pub async fn from_body(body: JsonOrMultipart<Self>) -> Result<(Self, ImageInput)> {
        match body {
            JsonOrMultipart::Json(mut dto) => {
                let image = ImageInput::from_url(dto.header_image.take());
                Ok((dto, image))
            }
            JsonOrMultipart::Multipart(multipart) => {
                let mut form = FormFields::from_multipart(multipart).await?;
                let image = form.header_image()?;
                Ok((Self::from_form(&form)?, image))
            }
        }
    }

    /// Overwrites only the fields present in this update.
    ///
    /// The header image is not touched here; it goes through the image manager.
    pub fn merge_into(self, fields: &mut DistrictFields) {
        if let Some(name) = self.name {
            fields.name = name.trim().to_string();
        }
        if let Some(slug) = self.slug {
            fields.slug = slug.trim().to_string();
        }
        if let Some(year) = self.formation_year {
            fields.formation_year = Some(year);
        }
        if let Some(area) = self.area {
            fields.area = Some(area);
        }
        if let Some(population) = self.population {
            fields.population = Some(population);
        }
        if let Some(text) = self.history_and_culture {
            fields.history_and_culture = Some(text);
        }
        if let Some(status) = self.status {
            fields.status = status;
        }
        if let Some(coordinates) = self.coordinates {
            fields.coordinates = Some(coordinates);
        }
        if let Some(rivers) = self.major_rivers {
            fields.major_rivers = clean_tags(rivers);
        }
        if let Some(hills) = self.hills {
            fields.hills = clean_tags(hills);
        }
        if let Some(spots) = self.natural_spots {
            fields.natural_spots = clean_tags(spots);
        }
        if let Some(places) = self.tourist_places {
            fields.tourist_places = places;
        }
        if let Some(people) = self.famous_personalities {
            fields.famous_personalities = people;
        }
    }
}

impl CreateDistrictDto {
    pub async fn from_body(body: JsonOrMultipart<Self>) -> Result<(Self, ImageInput)> {
        match body {
            JsonOrMultipart::Json(mut dto) => {
                let image = ImageInput::from_url(dto.header_image.take());
                Ok((dto, image))
            }
            JsonOrMultipart::Multipart(multipart) => {
                let mut form = FormFields::from_multipart(multipart).await?;
                let image = form.header_image()?;
                let dto = Self::try_from(UpdateDistrictDto::from_form(&form)?)?;
                Ok((dto, image))
            }
        }
    }

    /// Complete document for insertion, before validation.
    pub fn into_fields(self) -> DistrictFields {
        let mut fields = DistrictFields::named(&self.name);
        UpdateDistrictDto::from(self).merge_into(&mut fields);
        fields
    }
}

impl TryFrom<UpdateDistrictDto> for CreateDistrictDto {
    type Error = AppError;

    fn try_from(dto: UpdateDistrictDto) -> Result<Self> {
        let name = dto
            .name
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| AppError::Validation("name: District name is required".to_string()))?;

        Ok(Self {
            name,
            slug: dto.slug,
            formation_year: dto.formation_year,
            area: dto.area,
            population: dto.population,
            history_and_culture: dto.history_and_culture,
            status: dto.status,
            coordinates: dto.coordinates,
            major_rivers: dto.major_rivers,
            hills: dto.hills,
            natural_spots: dto.natural_spots,
            tourist_places: dto.tourist_places,
            famous_personalities: dto.famous_personalities,
            header_image: dto.header_image,
        })
    }
}

impl From<CreateDistrictDto> for UpdateDistrictDto {
    fn from(dto: CreateDistrictDto) -> Self {
        Self {
            // Name already seeded the document, re-applying it would be a no-op
            name: None,
            slug: dto.slug,
            formation_year: dto.formation_year,
            area: dto.area,
            population: dto.population,
            history_and_culture: dto.history_and_culture,
            status: dto.status,
            coordinates: dto.coordinates,
            major_rivers: dto.major_rivers,
            hills: dto.hills,
            natural_spots: dto.natural_spots,
            tourist_places: dto.tourist_places,
            famous_personalities: dto.famous_personalities,
            header_image: dto.header_image,
        }
    }
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}

// =============================================================================
// RESPONSE DTOs
// =============================================================================

/// Response DTO for district
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DistrictResponseDto {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub formation_year: Option<i32>,
    pub area: Option<f64>,
    pub population: Option<i64>,
    pub history_and_culture: Option<String>,
    pub status: DistrictStatus,
    pub coordinates: Option<Coordinates>,
    pub major_rivers: Vec<String>,
    pub hills: Vec<String>,
    pub natural_spots: Vec<String>,
    pub tourist_places: Vec<TouristPlace>,
    pub famous_personalities: Vec<FamousPersonality>,
    pub header_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<District> for DistrictResponseDto {
    fn from(d: District) -> Self {
        let coordinates = d.coordinates();
        Self {
            id: d.id,
            name: d.name,
            slug: d.slug,
            formation_year: d.formation_year,
            area: d.area,
            population: d.population,
            history_and_culture: d.history_and_culture,
            status: d.status,
            coordinates,
            major_rivers: d.major_rivers,
            hills: d.hills,
            natural_spots: d.natural_spots,
            tourist_places: d.tourist_places.0,
            famous_personalities: d.famous_personalities.0,
            header_image: d.header_image,
            created_at: d.created_at,
            updated_at: d.updated_at,
        }
    }
}

/// District populated with a summary of its gram panchayats
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DistrictDetailDto {
    #[serde(flatten)]
    pub district: DistrictResponseDto,
    pub gram_panchayats: Vec<GramPanchayatSummaryDto>,
}

/// Light projection for map markers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DistrictMapPointDto {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub coordinates: Coordinates,
    pub header_image: Option<String>,
    pub population: Option<i64>,
    pub gram_panchayat_count: i64,
}

impl DistrictMapPointDto {
    /// None for districts without coordinates
    pub fn from_district(d: District, gram_panchayat_count: i64) -> Option<Self> {
        let coordinates = d.coordinates()?;
        Some(Self {
            id: d.id,
            name: d.name,
            slug: d.slug,
            coordinates,
            header_image: d.header_image,
            population: d.population,
            gram_panchayat_count,
        })
    }
}

/// Parent district reference embedded in gram panchayat responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DistrictRefDto {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

impl From<&District> for DistrictRefDto {
    fn from(d: &District) -> Self {
        Self {
            id: d.id,
            name: d.name.clone(),
            slug: d.slug.clone(),
        }
    }
}

/// Outcome of a cascading district delete
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DistrictDeletionSummary {
    pub district_id: Uuid,
    pub district_name: String,
    pub gram_panchayats_deleted: u64,
    pub images: ImageCleanupSummary,
}
