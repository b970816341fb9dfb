use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::auth::AuthenticatedUser;
use crate::features::districts::dtos::DistrictRefDto;
use crate::features::districts::repositories::DistrictRepository;
use crate::features::gram_panchayats::dtos::{
    CreateGramPanchayatDto, GramPanchayatDeletionSummary, GramPanchayatResponseDto,
    ListGramPanchayatsQuery, UpdateGramPanchayatDto,
};
use crate::features::gram_panchayats::models::{GramPanchayat, GramPanchayatFields};
use crate::features::gram_panchayats::repositories::{
    GramPanchayatFilter, GramPanchayatRepository,
};
use crate::modules::storage::{ImageCleanupSummary, ImageManager};
use crate::shared::constants::GRAM_PANCHAYAT_IMAGE_FOLDER;
use crate::shared::form::ImageInput;

pub struct GramPanchayatService {
    gram_panchayats: Arc<dyn GramPanchayatRepository>,
    districts: Arc<dyn DistrictRepository>,
    images: Arc<ImageManager>,
}

impl GramPanchayatService {
    pub fn new(
        gram_panchayats: Arc<dyn GramPanchayatRepository>,
        districts: Arc<dyn DistrictRepository>,
        images: Arc<ImageManager>,
    ) -> Self {
        Self {
            gram_panchayats,
            districts,
            images,
        }
    }

    pub async fn list(
        &self,
        query: &ListGramPanchayatsQuery,
    ) -> Result<(Vec<GramPanchayatResponseDto>, i64)> {
        let filter = GramPanchayatFilter {
            district_id: query.district_id,
            status: query.status,
            search: query
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        };

        let (rows, total) = self
            .gram_panchayats
            .list(&filter, query.pagination())
            .await?;

        let mut district_ids: Vec<Uuid> = rows.iter().map(|gp| gp.district_id).collect();
        district_ids.sort_unstable();
        district_ids.dedup();
        let refs: HashMap<Uuid, DistrictRefDto> = self
            .districts
            .find_by_ids(&district_ids)
            .await?
            .iter()
            .map(|d| (d.id, DistrictRefDto::from(d)))
            .collect();

        let mut items = Vec::with_capacity(rows.len());
        for gp in rows {
            match refs.get(&gp.district_id) {
                Some(district) => items.push(GramPanchayatResponseDto::new(gp, district.clone())),
                None => warn!(
                    "Gram panchayat {} references missing district {}",
                    gp.id, gp.district_id
                ),
            }
        }

        Ok((items, total))
    }

    pub async fn find(&self, id: Uuid) -> Result<GramPanchayat> {
        self.gram_panchayats
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Gram panchayat with id '{}' not found", id)))
    }

    pub async fn get(&self, id: Uuid) -> Result<GramPanchayatResponseDto> {
        let gp = self.find(id).await?;
        self.populate(gp).await
    }

    pub async fn create(
        &self,
        user: &AuthenticatedUser,
        dto: CreateGramPanchayatDto,
        image: ImageInput,
    ) -> Result<GramPanchayatResponseDto> {
        let prepared = self.images.prepare(image)?;

        let mut fields = dto.into_fields();
        fields.validate()?;
        let district = self.district_ref(fields.district_id).await?;
        self.ensure_unique(&fields, None).await?;

        let image = self
            .images
            .apply(prepared, None, GRAM_PANCHAYAT_IMAGE_FOLDER)
            .await?;
        fields.header_image = image.url.clone();

        let gp = match self.gram_panchayats.insert(&fields, &user.sub).await {
            Ok(gp) => gp,
            Err(e) => {
                self.images.rollback(image).await;
                return Err(e);
            }
        };
        info!(
            "Gram panchayat created: id={}, slug={}, district={}, by={}",
            gp.id, gp.slug, gp.district_id, user.sub
        );

        Ok(GramPanchayatResponseDto::new(gp, district))
    }

    /// Merges `patch` over the stored panchayat, in the same order as district updates.
    pub async fn update(
        &self,
        existing: GramPanchayat,
        patch: UpdateGramPanchayatDto,
        image: ImageInput,
    ) -> Result<GramPanchayatResponseDto> {
        let prepared = self.images.prepare(image)?;

        let mut fields = existing.to_fields();
        patch.merge_into(&mut fields);
        fields.validate()?;
        let district = self.district_ref(fields.district_id).await?;
        self.ensure_unique(&fields, Some(existing.id)).await?;

        let image = self
            .images
            .apply(
                prepared,
                existing.header_image.as_deref(),
                GRAM_PANCHAYAT_IMAGE_FOLDER,
            )
            .await?;
        fields.header_image = image.url.clone();

        let gp = match self.gram_panchayats.update(existing.id, &fields).await {
            Ok(gp) => gp,
            Err(e) => {
                self.images.rollback(image).await;
                return Err(e);
            }
        };
        self.images.commit(image).await;
        info!("Gram panchayat updated: id={}, slug={}", gp.id, gp.slug);

        Ok(GramPanchayatResponseDto::new(gp, district))
    }

    pub async fn delete(&self, id: Uuid) -> Result<GramPanchayatDeletionSummary> {
        let gp = self.find(id).await?;
        let mut images = ImageCleanupSummary::default();

        if let Some(url) = gp.header_image.as_deref() {
            self.images.delete_best_effort(url, &mut images).await;
        }

        if !self.gram_panchayats.delete(id).await? {
            return Err(AppError::NotFound(format!(
                "Gram panchayat with id '{}' not found",
                id
            )));
        }
        info!("Gram panchayat deleted: id={}, slug={}", gp.id, gp.slug);

        Ok(GramPanchayatDeletionSummary {
            gram_panchayat_id: gp.id,
            gram_panchayat_name: gp.name,
            images,
        })
    }

    async fn district_ref(&self, district_id: Uuid) -> Result<DistrictRefDto> {
        self.districts
            .find_by_id(district_id)
            .await?
            .map(|d| DistrictRefDto::from(&d))
            .ok_or_else(|| {
                AppError::NotFound(format!("District with id '{}' not found", district_id))
            })
    }

    async fn ensure_unique(&self, fields: &GramPanchayatFields, exclude: Option<Uuid>) -> Result<()> {
        if self.gram_panchayats.slug_taken(&fields.slug, exclude).await? {
            return Err(AppError::Conflict(format!(
                "A gram panchayat with slug '{}' already exists",
                fields.slug
            )));
        }
        Ok(())
    }

    async fn populate(&self, gp: GramPanchayat) -> Result<GramPanchayatResponseDto> {
        let district = self.district_ref(gp.district_id).await?;
        Ok(GramPanchayatResponseDto::new(gp, district))
    }
}
