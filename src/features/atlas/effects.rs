use std::time::Instant;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::features::atlas::state::{AtlasAction, AtlasState, Collection};
use crate::features::districts::dtos::{DistrictMapPointDto, DistrictResponseDto};
use crate::shared::constants::MAX_PAGE_SIZE;
use crate::shared::types::ApiResponse;

#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Api(String),
}

/// One page of the district list and the total across all pages
#[derive(Debug, Default)]
pub struct DistrictPage {
    pub items: Vec<DistrictResponseDto>,
    pub total: i64,
}

/// Read side of the public API as seen by the atlas
#[async_trait]
pub trait AtlasApi: Send + Sync {
    /// `page` is 1-indexed, pages hold `MAX_PAGE_SIZE` districts
    async fn district_page(&self, page: i64) -> Result<DistrictPage, AtlasError>;

    async fn map_points(&self) -> Result<Vec<DistrictMapPointDto>, AtlasError>;

    /// Every district, paging until the reported total is collected
    async fn list_districts(&self) -> Result<Vec<DistrictResponseDto>, AtlasError> {
        let mut districts = Vec::new();
        let mut page = 1;
        loop {
            let DistrictPage { items, total } = self.district_page(page).await?;
            let exhausted = items.is_empty();
            districts.extend(items);
            if exhausted || districts.len() as i64 >= total {
                return Ok(districts);
            }
            page += 1;
        }
    }
}

/// `AtlasApi` over HTTP against a running backend
pub struct HttpAtlasApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAtlasApi {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetches `path` and unwraps the envelope into `data` and `meta.total`
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<(T, Option<i64>), AtlasError> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await?;
        let status = response.status();
        let body: ApiResponse<T> = response.json().await?;

        if !body.success {
            return Err(AtlasError::Api(
                body.message.unwrap_or_else(|| format!("HTTP {}", status)),
            ));
        }
        let total = body.meta.map(|meta| meta.total);
        body.data
            .map(|data| (data, total))
            .ok_or_else(|| AtlasError::Api(format!("Empty response from {}", path)))
    }
}

#[async_trait]
impl AtlasApi for HttpAtlasApi {
    async fn district_page(&self, page: i64) -> Result<DistrictPage, AtlasError> {
        let (items, total): (Vec<DistrictResponseDto>, _) = self
            .get(&format!(
                "/api/districts?page={}&pageSize={}",
                page, MAX_PAGE_SIZE
            ))
            .await?;
        Ok(DistrictPage {
            total: total.unwrap_or(items.len() as i64),
            items,
        })
    }

    async fn map_points(&self) -> Result<Vec<DistrictMapPointDto>, AtlasError> {
        let (points, _) = self.get("/api/districts/map").await?;
        Ok(points)
    }
}

/// Runs fetches and feeds their outcome back into `AtlasState`.
///
/// Collections still inside the freshness window are not refetched, so
/// remounting a view is free.
pub struct AtlasEffects<A: AtlasApi> {
    api: A,
}

impl<A: AtlasApi> AtlasEffects<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub async fn load_districts(&self, state: &mut AtlasState) {
        if !self.begin(state, Collection::Districts) {
            return;
        }
        let action = match self.api.list_districts().await {
            Ok(items) => AtlasAction::DistrictsLoaded {
                items,
                at: Instant::now(),
            },
            Err(e) => failed(Collection::Districts, e),
        };
        state.apply(action);
    }

    pub async fn load_map_points(&self, state: &mut AtlasState) {
        if !self.begin(state, Collection::MapPoints) {
            return;
        }
        let action = match self.api.map_points().await {
            Ok(items) => AtlasAction::MapPointsLoaded {
                items,
                at: Instant::now(),
            },
            Err(e) => failed(Collection::MapPoints, e),
        };
        state.apply(action);
    }

    fn begin(&self, state: &mut AtlasState, collection: Collection) -> bool {
        if !state.needs_fetch(collection, Instant::now()) {
            debug!("Serving {} from state", collection.label());
            return false;
        }
        state.apply(AtlasAction::FetchStarted(collection));
        true
    }
}

fn failed(collection: Collection, e: AtlasError) -> AtlasAction {
    warn!("Failed to load {}: {}", collection.label(), e);
    AtlasAction::FetchFailed {
        collection,
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    use crate::features::districts::models::DistrictStatus;
    use crate::shared::types::Coordinates;

    #[derive(Default)]
    struct CountingApi {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl AtlasApi for CountingApi {
        async fn district_page(&self, _page: i64) -> Result<DistrictPage, AtlasError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(DistrictPage::default())
        }

        async fn map_points(&self) -> Result<Vec<DistrictMapPointDto>, AtlasError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AtlasError::Api("Database error occurred".to_string()));
            }
            Ok(vec![DistrictMapPointDto {
                id: Uuid::new_v4(),
                name: "Purulia".to_string(),
                slug: "purulia".to_string(),
                coordinates: Coordinates {
                    lat: 23.33,
                    lng: 86.36,
                },
                header_image: None,
                population: Some(2_930_115),
                gram_panchayat_count: 170,
            }])
        }
    }

    #[tokio::test]
    async fn test_remount_within_window_does_not_refetch() {
        let effects = AtlasEffects::new(CountingApi::default());
        let mut state = AtlasState::default();

        effects.load_map_points(&mut state).await;
        effects.load_map_points(&mut state).await;

        assert_eq!(effects.api.calls.load(Ordering::SeqCst), 1);
        assert_eq!(state.map_point_items().len(), 1);
        assert!(!state.loading_map_points);
    }

    #[tokio::test]
    async fn test_collections_are_cached_independently() {
        let effects = AtlasEffects::new(CountingApi::default());
        let mut state = AtlasState::default();

        effects.load_map_points(&mut state).await;
        effects.load_districts(&mut state).await;

        assert_eq!(effects.api.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failure_surfaces_as_toast_and_allows_retry() {
        let effects = AtlasEffects::new(CountingApi {
            fail: true,
            ..Default::default()
        });
        let mut state = AtlasState::default();

        effects.load_map_points(&mut state).await;
        assert_eq!(state.toasts.len(), 1);
        assert!(state.map_points.is_none());

        effects.load_map_points(&mut state).await;
        assert_eq!(effects.api.calls.load(Ordering::SeqCst), 2);
    }

    /// Serves `total` districts in pages of `MAX_PAGE_SIZE`
    struct PagedApi {
        total: usize,
        pages_served: AtomicUsize,
    }

    fn district(n: usize) -> DistrictResponseDto {
        let now = chrono::Utc::now();
        DistrictResponseDto {
            id: Uuid::new_v4(),
            name: format!("District {}", n),
            slug: format!("district-{}", n),
            formation_year: None,
            area: None,
            population: None,
            history_and_culture: None,
            status: DistrictStatus::Active,
            coordinates: None,
            major_rivers: vec![],
            hills: vec![],
            natural_spots: vec![],
            tourist_places: vec![],
            famous_personalities: vec![],
            header_image: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[async_trait]
    impl AtlasApi for PagedApi {
        async fn district_page(&self, page: i64) -> Result<DistrictPage, AtlasError> {
            self.pages_served.fetch_add(1, Ordering::SeqCst);
            let size = MAX_PAGE_SIZE as usize;
            let start = (page as usize - 1) * size;
            let end = (start + size).min(self.total);
            Ok(DistrictPage {
                items: (start..end).map(district).collect(),
                total: self.total as i64,
            })
        }

        async fn map_points(&self) -> Result<Vec<DistrictMapPointDto>, AtlasError> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn test_district_list_follows_pages_to_total() {
        let api = PagedApi {
            total: 230,
            pages_served: AtomicUsize::new(0),
        };

        let districts = api.list_districts().await.unwrap();

        assert_eq!(districts.len(), 230);
        assert_eq!(districts[229].slug, "district-229");
        assert_eq!(api.pages_served.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_empty_district_list_is_one_request() {
        let api = PagedApi {
            total: 0,
            pages_served: AtomicUsize::new(0),
        };

        assert!(api.list_districts().await.unwrap().is_empty());
        assert_eq!(api.pages_served.load(Ordering::SeqCst), 1);
    }
}
