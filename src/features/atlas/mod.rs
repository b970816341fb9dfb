//! Client-side controller library for the public district map and listing.
//!
//! Rendering is left to the host; this module owns the state, data fetching,
//! map library loading and marker lifecycle.
//!
//! - [`state`]: `AtlasState` and its pure reducer
//! - [`effects`]: fetches through [`AtlasApi`] with a 5 minute freshness window
//! - [`loader`]: one-time injection of the mapping library's CDN assets
//! - [`map_controller`]: map instance, markers and the marker click state machine
//! - [`popup`]: marker popup markup and the `districtSelect` event

pub mod effects;
pub mod loader;
pub mod map_controller;
pub mod popup;
pub mod state;

pub use effects::{AtlasApi, AtlasEffects, AtlasError, DistrictPage, HttpAtlasApi};
pub use loader::{AssetInjector, ExternalAsset, ExternalAssetLoader};
pub use map_controller::{ClickState, MapBackend, MapController};
pub use state::{AtlasAction, AtlasState, Collection};
