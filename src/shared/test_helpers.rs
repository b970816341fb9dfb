//! In-memory collaborators for service and router tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
    Router,
};
use chrono::Utc;
use fake::faker::address::en::CityName;
use fake::Fake;
use sqlx::types::Json;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::districts::models::{District, DistrictFields, DistrictStatus};
use crate::features::districts::repositories::{DistrictFilter, DistrictRepository};
use crate::features::gram_panchayats::models::{GramPanchayat, GramPanchayatFields};
use crate::features::gram_panchayats::repositories::{
    GramPanchayatFilter, GramPanchayatRepository,
};
use crate::modules::storage::{ImageStore, ImageUpload, StorageError, StoredImage};
use crate::shared::types::{Coordinates, Pagination};

// =============================================================================
// AUTH
// =============================================================================

pub fn create_admin_user() -> AuthenticatedUser {
    AuthenticatedUser {
        sub: "test-admin-sub".to_string(),
        roles: vec!["admin".to_string()],
    }
}

pub fn create_viewer_user() -> AuthenticatedUser {
    AuthenticatedUser {
        sub: "test-viewer-sub".to_string(),
        roles: vec!["viewer".to_string()],
    }
}

async fn inject_user_middleware(
    State(user): State<AuthenticatedUser>,
    mut request: Request,
    next: Next,
) -> Response {
    request.extensions_mut().insert(user);
    next.run(request).await
}

/// Layers a middleware that authenticates every request as `user`
pub fn with_user(router: Router, user: AuthenticatedUser) -> Router {
    router.layer(axum::middleware::from_fn_with_state(
        user,
        inject_user_middleware,
    ))
}

pub fn with_admin_auth(router: Router) -> Router {
    with_user(router, create_admin_user())
}

// =============================================================================
// IMAGES
// =============================================================================

/// Smallest byte sequence `infer` recognises as PNG
pub fn png_bytes() -> Vec<u8> {
    vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D]
}

/// Image store that records calls instead of talking to a provider
#[derive(Default)]
pub struct RecordingImageStore {
    uploads: Mutex<Vec<ImageUpload>>,
    destroyed: Mutex<Vec<String>>,
    failing_destroys: Mutex<HashSet<String>>,
    fail_uploads: Mutex<bool>,
}

impl RecordingImageStore {
    pub const BASE_URL: &'static str = "https://images.test/atlas/";

    pub fn hosted_url(&self, public_id: &str) -> String {
        format!("{}{}.jpg", Self::BASE_URL, public_id)
    }

    pub fn uploads(&self) -> Vec<ImageUpload> {
        self.uploads.lock().unwrap().clone()
    }

    /// Public ids that were destroyed successfully
    pub fn destroyed(&self) -> Vec<String> {
        self.destroyed.lock().unwrap().clone()
    }

    pub fn fail_destroy(&self, public_id: &str) {
        self.failing_destroys
            .lock()
            .unwrap()
            .insert(public_id.to_string());
    }

    pub fn fail_uploads(&self) {
        *self.fail_uploads.lock().unwrap() = true;
    }
}

#[async_trait]
impl ImageStore for RecordingImageStore {
    async fn upload(&self, upload: ImageUpload) -> std::result::Result<StoredImage, StorageError> {
        if *self.fail_uploads.lock().unwrap() {
            return Err(StorageError::Upload("provider unavailable".to_string()));
        }
        let public_id = format!("{}/{}", upload.folder, Uuid::new_v4());
        let secure_url = self.hosted_url(&public_id);
        self.uploads.lock().unwrap().push(upload);
        Ok(StoredImage {
            secure_url,
            public_id,
        })
    }

    async fn destroy(&self, public_id: &str) -> std::result::Result<(), StorageError> {
        if self.failing_destroys.lock().unwrap().contains(public_id) {
            return Err(StorageError::Delete(format!("refused {}", public_id)));
        }
        self.destroyed.lock().unwrap().push(public_id.to_string());
        Ok(())
    }

    fn public_id_from_url(&self, url: &str) -> Option<String> {
        let path = url.strip_prefix(Self::BASE_URL)?;
        let public_id = path.rsplit_once('.').map_or(path, |(stem, _)| stem);
        Some(public_id.to_string())
    }

    fn provider(&self) -> &'static str {
        "recording"
    }
}

// =============================================================================
// FIXTURES
// =============================================================================

/// Unique, valid district document with a fake name
pub fn fake_district_fields() -> DistrictFields {
    let city: String = CityName().fake();
    let suffix = Uuid::new_v4().simple().to_string();
    let mut fields = DistrictFields::named(&format!("{} {}", city, &suffix[..6]));
    fields.area = Some((100.0..9000.0).fake());
    fields.population = Some((10_000..5_000_000).fake());
    fields.coordinates = Some(Coordinates {
        lat: (21.5..27.0).fake(),
        lng: (86.0..89.5).fake(),
    });
    fields
}

pub fn fake_gram_panchayat_fields(district_id: Uuid) -> GramPanchayatFields {
    let city: String = CityName().fake();
    let suffix = Uuid::new_v4().simple().to_string();
    let mut fields = GramPanchayatFields::new(&format!("{} {}", city, &suffix[..6]), district_id);
    fields.population = Some((500..50_000).fake());
    fields
}

// =============================================================================
// REPOSITORIES
// =============================================================================

fn page_of<T: Clone>(items: &[T], page: Pagination) -> Vec<T> {
    items
        .iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .cloned()
        .collect()
}

fn matches_search(name: &str, search: Option<&str>) -> bool {
    search.map_or(true, |s| name.to_lowercase().contains(&s.to_lowercase()))
}

#[derive(Default)]
pub struct InMemoryDistrictRepository {
    rows: Mutex<Vec<District>>,
}

impl InMemoryDistrictRepository {
    pub fn all(&self) -> Vec<District> {
        self.rows.lock().unwrap().clone()
    }

    fn sorted(&self) -> Vec<District> {
        let mut rows = self.all();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        rows
    }
}

fn district_from_fields(id: Uuid, fields: &DistrictFields, created_at: chrono::DateTime<Utc>) -> District {
    District {
        id,
        name: fields.name.clone(),
        slug: fields.slug.clone(),
        formation_year: fields.formation_year,
        area: fields.area,
        population: fields.population,
        history_and_culture: fields.history_and_culture.clone(),
        status: fields.status,
        lat: fields.coordinates.map(|c| c.lat),
        lng: fields.coordinates.map(|c| c.lng),
        major_rivers: fields.major_rivers.clone(),
        hills: fields.hills.clone(),
        natural_spots: fields.natural_spots.clone(),
        tourist_places: Json(fields.tourist_places.clone()),
        famous_personalities: Json(fields.famous_personalities.clone()),
        header_image: fields.header_image.clone(),
        created_at,
        updated_at: Utc::now(),
    }
}

#[async_trait]
impl DistrictRepository for InMemoryDistrictRepository {
    async fn list(&self, filter: &DistrictFilter, page: Pagination) -> Result<(Vec<District>, i64)> {
        let matching: Vec<District> = self
            .sorted()
            .into_iter()
            .filter(|d| filter.status.map_or(true, |s| d.status == s))
            .filter(|d| matches_search(&d.name, filter.search.as_deref()))
            .collect();
        Ok((page_of(&matching, page), matching.len() as i64))
    }

    async fn list_mappable(&self) -> Result<Vec<District>> {
        Ok(self
            .sorted()
            .into_iter()
            .filter(|d| {
                d.status == DistrictStatus::Active
                    && d.coordinates().is_some()
            })
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<District>> {
        Ok(self.all().into_iter().find(|d| d.id == id))
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<District>> {
        Ok(self.all().into_iter().filter(|d| ids.contains(&d.id)).collect())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<District>> {
        Ok(self.all().into_iter().find(|d| d.slug == slug))
    }

    async fn slug_taken(&self, slug: &str, exclude: Option<Uuid>) -> Result<bool> {
        Ok(self
            .all()
            .iter()
            .any(|d| d.slug == slug && Some(d.id) != exclude))
    }

    async fn name_taken(&self, name: &str, exclude: Option<Uuid>) -> Result<bool> {
        Ok(self
            .all()
            .iter()
            .any(|d| d.name.eq_ignore_ascii_case(name) && Some(d.id) != exclude))
    }

    async fn insert(&self, fields: &DistrictFields) -> Result<District> {
        let district = district_from_fields(Uuid::new_v4(), fields, Utc::now());
        self.rows.lock().unwrap().push(district.clone());
        Ok(district)
    }

    async fn update(&self, id: Uuid, fields: &DistrictFields) -> Result<District> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| AppError::NotFound(format!("District with id '{}' not found", id)))?;
        *row = district_from_fields(id, fields, row.created_at);
        Ok(row.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|d| d.id != id);
        Ok(rows.len() < before)
    }
}

#[derive(Default)]
pub struct InMemoryGramPanchayatRepository {
    rows: Mutex<Vec<GramPanchayat>>,
}

impl InMemoryGramPanchayatRepository {
    pub fn all(&self) -> Vec<GramPanchayat> {
        self.rows.lock().unwrap().clone()
    }
}

fn gram_panchayat_from_fields(
    id: Uuid,
    fields: &GramPanchayatFields,
    created_by: &str,
    created_at: chrono::DateTime<Utc>,
) -> GramPanchayat {
    GramPanchayat {
        id,
        name: fields.name.clone(),
        slug: fields.slug.clone(),
        district_id: fields.district_id,
        block: fields.block.clone(),
        establishment_year: fields.establishment_year,
        historical_background: fields.historical_background.clone(),
        local_art: fields.local_art.clone(),
        local_cuisine: fields.local_cuisine.clone(),
        traditions: fields.traditions.clone(),
        population: fields.population,
        area: fields.area,
        lat: fields.coordinates.map(|c| c.lat),
        lng: fields.coordinates.map(|c| c.lng),
        header_image: fields.header_image.clone(),
        status: fields.status,
        created_by: created_by.to_string(),
        created_at,
        updated_at: Utc::now(),
    }
}

#[async_trait]
impl GramPanchayatRepository for InMemoryGramPanchayatRepository {
    async fn list(
        &self,
        filter: &GramPanchayatFilter,
        page: Pagination,
    ) -> Result<(Vec<GramPanchayat>, i64)> {
        let mut matching: Vec<GramPanchayat> = self
            .all()
            .into_iter()
            .filter(|gp| filter.district_id.map_or(true, |id| gp.district_id == id))
            .filter(|gp| filter.status.map_or(true, |s| gp.status == s))
            .filter(|gp| matches_search(&gp.name, filter.search.as_deref()))
            .collect();
        matching.sort_by(|a, b| a.name.cmp(&b.name));
        Ok((page_of(&matching, page), matching.len() as i64))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<GramPanchayat>> {
        Ok(self.all().into_iter().find(|gp| gp.id == id))
    }

    async fn list_by_district(&self, district_id: Uuid) -> Result<Vec<GramPanchayat>> {
        let mut rows: Vec<GramPanchayat> = self
            .all()
            .into_iter()
            .filter(|gp| gp.district_id == district_id)
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn count_by_districts(&self, district_ids: &[Uuid]) -> Result<HashMap<Uuid, i64>> {
        let mut counts = HashMap::new();
        for gp in self.all() {
            if district_ids.contains(&gp.district_id) {
                *counts.entry(gp.district_id).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    async fn slug_taken(&self, slug: &str, exclude: Option<Uuid>) -> Result<bool> {
        Ok(self
            .all()
            .iter()
            .any(|gp| gp.slug == slug && Some(gp.id) != exclude))
    }

    async fn insert(&self, fields: &GramPanchayatFields, created_by: &str) -> Result<GramPanchayat> {
        let row = gram_panchayat_from_fields(Uuid::new_v4(), fields, created_by, Utc::now());
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn update(&self, id: Uuid, fields: &GramPanchayatFields) -> Result<GramPanchayat> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows.iter_mut().find(|gp| gp.id == id).ok_or_else(|| {
            AppError::NotFound(format!("Gram panchayat with id '{}' not found", id))
        })?;
        *row = gram_panchayat_from_fields(id, fields, &row.created_by.clone(), row.created_at);
        Ok(row.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|gp| gp.id != id);
        Ok(rows.len() < before)
    }

    async fn delete_by_district(&self, district_id: Uuid) -> Result<u64> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|gp| gp.district_id != district_id);
        Ok((before - rows.len()) as u64)
    }
}

/// Shared handles for wiring services in tests
pub struct TestStores {
    pub districts: Arc<InMemoryDistrictRepository>,
    pub gram_panchayats: Arc<InMemoryGramPanchayatRepository>,
    pub images: Arc<RecordingImageStore>,
}

impl Default for TestStores {
    fn default() -> Self {
        Self {
            districts: Arc::new(InMemoryDistrictRepository::default()),
            gram_panchayats: Arc::new(InMemoryGramPanchayatRepository::default()),
            images: Arc::new(RecordingImageStore::default()),
        }
    }
}
