use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::core::extractor::JsonOrMultipart;
use crate::features::districts::dtos::DistrictRefDto;
use crate::features::gram_panchayats::models::{
    GramPanchayat, GramPanchayatFields, GramPanchayatStatus,
};
use crate::modules::storage::ImageCleanupSummary;
use crate::shared::form::{FormFields, ImageInput};
use crate::shared::types::{Coordinates, Pagination};

// =============================================================================
// REQUEST DTOs
// =============================================================================

/// Query params for listing gram panchayats
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListGramPanchayatsQuery {
    #[param(minimum = 1)]
    pub page: Option<i64>,
    #[param(minimum = 1, maximum = 100)]
    pub page_size: Option<i64>,
    /// Only panchayats of this district
    pub district_id: Option<Uuid>,
    pub status: Option<GramPanchayatStatus>,
    pub search: Option<String>,
}

impl ListGramPanchayatsQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.page_size)
    }
}

/// Partial gram panchayat update; absent fields keep their stored value
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGramPanchayatDto {
    pub name: Option<String>,
    pub slug: Option<String>,
    /// Parent district id; moving requires the target district to exist
    pub district: Option<Uuid>,
    pub block: Option<String>,
    pub establishment_year: Option<i32>,
    pub historical_background: Option<String>,
    pub local_art: Option<String>,
    pub local_cuisine: Option<String>,
    pub traditions: Option<String>,
    pub population: Option<i64>,
    pub area: Option<f64>,
    pub coordinates: Option<Coordinates>,
    pub status: Option<GramPanchayatStatus>,
    pub header_image: Option<String>,
}

/// New gram panchayat under an existing district
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateGramPanchayatDto {
    pub name: String,
    pub district: Uuid,
    pub slug: Option<String>,
    pub block: Option<String>,
    pub establishment_year: Option<i32>,
    pub historical_background: Option<String>,
    pub local_art: Option<String>,
    pub local_cuisine: Option<String>,
    pub traditions: Option<String>,
    pub population: Option<i64>,
    pub area: Option<f64>,
    pub coordinates: Option<Coordinates>,
    pub status: Option<GramPanchayatStatus>,
    pub header_image: Option<String>,
}

impl UpdateGramPanchayatDto {
    pub fn from_form(form: &FormFields) -> Result<Self> {
        Ok(Self {
            name: form.text("name"),
            slug: form.text("slug"),
            district: form.parse("district")?,
            block: form.text("block"),
            establishment_year: form.parse("establishmentYear")?,
            historical_background: form.text("historicalBackground"),
            local_art: form.text("localArt"),
            local_cuisine: form.text("localCuisine"),
            traditions: form.text("traditions"),
            population: form.parse("population")?,
            area: form.parse("area")?,
            coordinates: form.coordinates()?,
            status: form.parse("status")?,
            header_image: None,
        })
    }

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

    pub fn merge_into(self, fields: &mut GramPanchayatFields) {
        if let Some(name) = self.name {
            fields.name = name.trim().to_string();
        }
        if let Some(slug) = self.slug {
            fields.slug = slug.trim().to_string();
        }
        if let Some(district) = self.district {
            fields.district_id = district;
        }
        if let Some(block) = self.block {
            fields.block = Some(block);
        }
        if let Some(year) = self.establishment_year {
            fields.establishment_year = Some(year);
        }
        if let Some(text) = self.historical_background {
            fields.historical_background = Some(text);
        }
        if let Some(text) = self.local_art {
            fields.local_art = Some(text);
        }
        if let Some(text) = self.local_cuisine {
            fields.local_cuisine = Some(text);
        }
        if let Some(text) = self.traditions {
            fields.traditions = Some(text);
        }
        if let Some(population) = self.population {
            fields.population = Some(population);
        }
        if let Some(area) = self.area {
            fields.area = Some(area);
        }
        if let Some(coordinates) = self.coordinates {
            fields.coordinates = Some(coordinates);
        }
        if let Some(status) = self.status {
            fields.status = status;
        }
    }
}

impl CreateGramPanchayatDto {
    pub async fn from_body(body: JsonOrMultipart<Self>) -> Result<(Self, ImageInput)> {
        match body {
            JsonOrMultipart::Json(mut dto) => {
                let image = ImageInput::from_url(dto.header_image.take());
                Ok((dto, image))
            }
            JsonOrMultipart::Multipart(multipart) => {
                let mut form = FormFields::from_multipart(multipart).await?;
                let image = form.header_image()?;
                let dto = Self::try_from(UpdateGramPanchayatDto::from_form(&form)?)?;
                Ok((dto, image))
            }
        }
    }

    pub fn into_fields(self) -> GramPanchayatFields {
        let mut fields = GramPanchayatFields::new(&self.name, self.district);
        UpdateGramPanchayatDto::from(self).merge_into(&mut fields);
        fields
    }
}

impl TryFrom<UpdateGramPanchayatDto> for CreateGramPanchayatDto {
    type Error = AppError;

    fn try_from(dto: UpdateGramPanchayatDto) -> Result<Self> {
        let name = dto
            .name
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| {
                AppError::Validation("name: Gram panchayat name is required".to_string())
            })?;
        let district = dto
            .district
            .ok_or_else(|| AppError::Validation("district: District is required".to_string()))?;

        Ok(Self {
            name,
            district,
            slug: dto.slug,
            block: dto.block,
            establishment_year: dto.establishment_year,
            historical_background: dto.historical_background,
            local_art: dto.local_art,
            local_cuisine: dto.local_cuisine,
            traditions: dto.traditions,
            population: dto.population,
            area: dto.area,
            coordinates: dto.coordinates,
            status: dto.status,
            header_image: dto.header_image,
        })
    }
}

impl From<CreateGramPanchayatDto> for UpdateGramPanchayatDto {
    fn from(dto: CreateGramPanchayatDto) -> Self {
        Self {
            name: None,
            slug: dto.slug,
            district: None,
            block: dto.block,
            establishment_year: dto.establishment_year,
            historical_background: dto.historical_background,
            local_art: dto.local_art,
            local_cuisine: dto.local_cuisine,
            traditions: dto.traditions,
            population: dto.population,
            area: dto.area,
            coordinates: dto.coordinates,
            status: dto.status,
            header_image: dto.header_image,
        }
    }
}

// =============================================================================
// RESPONSE DTOs
// =============================================================================

/// Response DTO for gram panchayat, populated with its district
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GramPanchayatResponseDto {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub district: DistrictRefDto,
    pub block: Option<String>,
    pub establishment_year: Option<i32>,
    pub historical_background: Option<String>,
    pub local_art: Option<String>,
    pub local_cuisine: Option<String>,
    pub traditions: Option<String>,
    pub population: Option<i64>,
    pub area: Option<f64>,
    pub coordinates: Option<Coordinates>,
    pub header_image: Option<String>,
    pub status: GramPanchayatStatus,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GramPanchayatResponseDto {
    pub fn new(gp: GramPanchayat, district: DistrictRefDto) -> Self {
        let coordinates = gp.coordinates();
        Self {
            id: gp.id,
            name: gp.name,
            slug: gp.slug,
            district,
            block: gp.block,
            establishment_year: gp.establishment_year,
            historical_background: gp.historical_background,
            local_art: gp.local_art,
            local_cuisine: gp.local_cuisine,
            traditions: gp.traditions,
            population: gp.population,
            area: gp.area,
            coordinates,
            header_image: gp.header_image,
            status: gp.status,
            created_by: gp.created_by,
            created_at: gp.created_at,
            updated_at: gp.updated_at,
        }
    }
}

/// Gram panchayat entry listed on a district detail page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GramPanchayatSummaryDto {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub block: Option<String>,
    pub status: GramPanchayatStatus,
    pub coordinates: Option<Coordinates>,
    pub header_image: Option<String>,
}

impl From<GramPanchayat> for GramPanchayatSummaryDto {
    fn from(gp: GramPanchayat) -> Self {
        let coordinates = gp.coordinates();
        Self {
            id: gp.id,
            name: gp.name,
            slug: gp.slug,
            block: gp.block,
            status: gp.status,
            coordinates,
            header_image: gp.header_image,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GramPanchayatDeletionSummary {
    pub gram_panchayat_id: Uuid,
    pub gram_panchayat_name: String,
    pub images: ImageCleanupSummary,
}
