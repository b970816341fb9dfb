use std::time::{Duration, Instant};

use crate::features::districts::dtos::{DistrictMapPointDto, DistrictResponseDto};

/// A collection fetched within this window is served from state
pub const FRESHNESS_WINDOW: Duration = Duration::from_secs(5 * 60);

/// Collections the atlas keeps in memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Districts,
    MapPoints,
}

impl Collection {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Districts => "districts",
            Self::MapPoints => "map points",
        }
    }
}

/// Fetched items stamped with the time they arrived
#[derive(Debug, Clone, PartialEq)]
pub struct Cached<T> {
    pub items: Vec<T>,
    pub fetched_at: Instant,
}

impl<T> Cached<T> {
    pub fn is_fresh(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.fetched_at) < FRESHNESS_WINDOW
    }
}

/// Error notification shown to the visitor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AtlasAction {
    FetchStarted(Collection),
    DistrictsLoaded {
        items: Vec<DistrictResponseDto>,
        at: Instant,
    },
    MapPointsLoaded {
        items: Vec<DistrictMapPointDto>,
        at: Instant,
    },
    FetchFailed {
        collection: Collection,
        message: String,
    },
    /// Open the detail panel for a district slug
    SelectDistrict(String),
    ClearSelection,
    DismissToast(u64),
    /// Drop a collection so the next mount refetches it
    Invalidate(Collection),
}

/// Client-side store for the public map and listing views
#[derive(Debug, Default)]
pub struct AtlasState {
    pub districts: Option<Cached<DistrictResponseDto>>,
    pub map_points: Option<Cached<DistrictMapPointDto>>,
    pub loading_districts: bool,
    pub loading_map_points: bool,
    /// Slug of the district shown in the detail panel
    pub selected: Option<String>,
    pub toasts: Vec<Toast>,
    next_toast_id: u64,
}

impl AtlasState {
    /// Pure reducer
    pub fn apply(&mut self, action: AtlasAction) {
        match action {
            AtlasAction::FetchStarted(collection) => *self.loading_mut(collection) = true,
            AtlasAction::DistrictsLoaded { items, at } => {
                self.districts = Some(Cached {
                    items,
                    fetched_at: at,
                });
                self.loading_districts = false;
            }
            AtlasAction::MapPointsLoaded { items, at } => {
                self.map_points = Some(Cached {
                    items,
                    fetched_at: at,
                });
                self.loading_map_points = false;
            }
            AtlasAction::FetchFailed {
                collection,
                message,
            } => {
                *self.loading_mut(collection) = false;
                self.next_toast_id += 1;
                self.toasts.push(Toast {
                    id: self.next_toast_id,
                    message: format!("Could not load {}: {}", collection.label(), message),
                });
            }
            AtlasAction::SelectDistrict(slug) => self.selected = Some(slug),
            AtlasAction::ClearSelection => self.selected = None,
            AtlasAction::DismissToast(id) => self.toasts.retain(|t| t.id != id),
            AtlasAction::Invalidate(Collection::Districts) => self.districts = None,
            AtlasAction::Invalidate(Collection::MapPoints) => self.map_points = None,
        }
    }

    /// True unless a fetch is in flight or the cached copy is still fresh
    pub fn needs_fetch(&self, collection: Collection, now: Instant) -> bool {
        let (loading, fresh) = match collection {
            Collection::Districts => (
                self.loading_districts,
                self.districts.as_ref().is_some_and(|c| c.is_fresh(now)),
            ),
            Collection::MapPoints => (
                self.loading_map_points,
                self.map_points.as_ref().is_some_and(|c| c.is_fresh(now)),
            ),
        };
        !loading && !fresh
    }

    pub fn map_point_items(&self) -> &[DistrictMapPointDto] {
        self.map_points
            .as_ref()
            .map(|c| c.items.as_slice())
            .unwrap_or_default()
    }

    fn loading_mut(&mut self, collection: Collection) -> &mut bool {
        match collection {
            Collection::Districts => &mut self.loading_districts,
            Collection::MapPoints => &mut self.loading_map_points,
        }
    }
}
