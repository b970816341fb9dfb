use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::districts::dtos::{
    CreateDistrictDto, DistrictDeletionSummary, DistrictDetailDto, DistrictMapPointDto,
    DistrictResponseDto, ListDistrictsQuery, UpdateDistrictDto,
};
use crate::features::districts::models::{District, DistrictFields};
use crate::features::districts::repositories::{DistrictFilter, DistrictRepository};
use crate::features::gram_panchayats::dtos::GramPanchayatSummaryDto;
use crate::features::gram_panchayats::repositories::GramPanchayatRepository;
use crate::modules::storage::{ImageCleanupSummary, ImageManager};
use crate::shared::constants::DISTRICT_IMAGE_FOLDER;
use crate::shared::form::ImageInput;

/// District catalogue: reads, admin writes and the cascading delete
pub struct DistrictService {
    districts: Arc<dyn DistrictRepository>,
    gram_panchayats: Arc<dyn GramPanchayatRepository>,
    images: Arc<ImageManager>,
}

impl DistrictService {
    pub fn new(
        districts: Arc<dyn DistrictRepository>,
        gram_panchayats: Arc<dyn GramPanchayatRepository>,
        images: Arc<ImageManager>,
    ) -> Self {
        Self {
            districts,
            gram_panchayats,
            images,
        }
    }

    pub async fn list(&self, query: &ListDistrictsQuery) -> Result<(Vec<DistrictResponseDto>, i64)> {
        let filter = DistrictFilter {
            status: query.status,
            search: query
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        };

        let (districts, total) = self.districts.list(&filter, query.pagination()).await?;
        Ok((districts.into_iter().map(Into::into).collect(), total))
    }

    /// Active districts with coordinates, with their panchayat counts
    pub async fn map_points(&self) -> Result<Vec<DistrictMapPointDto>> {
        let districts = self.districts.list_mappable().await?;
        let ids: Vec<Uuid> = districts.iter().map(|d| d.id).collect();
        let counts = self.gram_panchayats.count_by_districts(&ids).await?;

        Ok(districts
            .into_iter()
            .filter_map(|d| {
                let count = counts.get(&d.id).copied().unwrap_or(0);
                DistrictMapPointDto::from_district(d, count)
            })
            .collect())
    }

    /// Loads the stored district or fails with 404
    pub async fn find(&self, id: Uuid) -> Result<District> {
        self.districts
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("District with id '{}' not found", id)))
    }

    pub async fn get(&self, id: Uuid) -> Result<DistrictDetailDto> {
        let district = self.find(id).await?;
        self.populate(district).await
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<DistrictDetailDto> {
        let district = self
            .districts
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("District '{}' not found", slug)))?;
        self.populate(district).await
    }

    pub async fn create(&self, dto: CreateDistrictDto, image: ImageInput) -> Result<DistrictDetailDto> {
        let prepared = self.images.prepare(image)?;

        let mut fields = dto.into_fields();
        fields.validate()?;
        self.ensure_unique(&fields, None).await?;

        let image = self
            .images
            .apply(prepared, None, DISTRICT_IMAGE_FOLDER)
            .await?;
        fields.header_image = image.url.clone();

        let district = match self.districts.insert(&fields).await {
            Ok(district) => district,
            Err(e) => {
                self.images.rollback(image).await;
                return Err(e);
            }
        };
        info!("District created: id={}, slug={}", district.id, district.slug);

        self.populate(district).await
    }

    /// Merges `patch` over the stored district.
    ///
    /// Order: image policy check, merge, validation, uniqueness, then image
    /// storage and the write. Anything rejected before the image step leaves
    /// both the database and the image store untouched.
    pub async fn update(
        &self,
        existing: District,
        patch: UpdateDistrictDto,
        image: ImageInput,
    ) -> Result<DistrictDetailDto> {
        let prepared = self.images.prepare(image)?;

        let mut fields = existing.to_fields();
        patch.merge_into(&mut fields);
        fields.validate()?;
        self.ensure_unique(&fields, Some(existing.id)).await?;

        let image = self
            .images
            .apply(
                prepared,
                existing.header_image.as_deref(),
                DISTRICT_IMAGE_FOLDER,
            )
            .await?;
        fields.header_image = image.url.clone();

        let district = match self.districts.update(existing.id, &fields).await {
            Ok(district) => district,
            Err(e) => {
                self.images.rollback(image).await;
                return Err(e);
            }
        };
        self.images.commit(image).await;
        info!("District updated: id={}, slug={}", district.id, district.slug);

        self.populate(district).await
    }

    /// Deletes a district with its gram panchayats and every hosted image it references.
    ///
    /// Image deletion is best-effort; the database rows are removed regardless.
    pub async fn delete(&self, id: Uuid) -> Result<DistrictDeletionSummary> {
        let district = self.find(id).await?;
        let mut images = ImageCleanupSummary::default();

        let gram_panchayats = self.gram_panchayats.list_by_district(id).await?;
        for gp in &gram_panchayats {
            if let Some(url) = gp.header_image.as_deref() {
                self.images.delete_best_effort(url, &mut images).await;
            }
        }
        let gram_panchayats_deleted = self.gram_panchayats.delete_by_district(id).await?;
        if gram_panchayats_deleted != gram_panchayats.len() as u64 {
            warn!(
                "District {}: found {} gram panchayats but deleted {}",
                id,
                gram_panchayats.len(),
                gram_panchayats_deleted
            );
        }

        for url in district.tourist_place_images() {
            self.images.delete_best_effort(url, &mut images).await;
        }
        for url in district.personality_images() {
            self.images.delete_best_effort(url, &mut images).await;
        }
        if let Some(url) = district.header_image.as_deref() {
            self.images.delete_best_effort(url, &mut images).await;
        }

        if !self.districts.delete(id).await? {
            return Err(AppError::NotFound(format!(
                "District with id '{}' not found",
                id
            )));
        }

        info!(
            "District deleted: id={}, gram_panchayats={}, images deleted={}/{} (skipped {})",
            id, gram_panchayats_deleted, images.deleted, images.attempted, images.skipped
        );

        Ok(DistrictDeletionSummary {
            district_id: district.id,
            district_name: district.name,
            gram_panchayats_deleted,
            images,
        })
    }

    async fn ensure_unique(&self, fields: &DistrictFields, exclude: Option<Uuid>) -> Result<()> {
        if self.districts.slug_taken(&fields.slug, exclude).await? {
            return Err(AppError::Conflict(format!(
                "A district with slug '{}' already exists",
                fields.slug
            )));
        }
        if self.districts.name_taken(&fields.name, exclude).await? {
            return Err(AppError::Conflict(format!(
                "A district named '{}' already exists",
                fields.name
            )));
        }
        Ok(())
    }

    async fn populate(&self, district: District) -> Result<DistrictDetailDto> {
        let gram_panchayats = self
            .gram_panchayats
            .list_by_district(district.id)
            .await?
            .into_iter()
            .map(GramPanchayatSummaryDto::from)
            .collect();

        Ok(DistrictDetailDto {
            district: district.into(),
            gram_panchayats,
        })
    }
}
