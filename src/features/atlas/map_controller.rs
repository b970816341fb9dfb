use uuid::Uuid;

use crate::features::atlas::popup::{popup_html, DISTRICT_SELECT_EVENT};
use crate::features::atlas::state::AtlasAction;
use crate::features::districts::dtos::DistrictMapPointDto;
use crate::shared::types::Coordinates;

/// Initial view: centred on West Bengal
pub const DEFAULT_CENTER: Coordinates = Coordinates {
    lat: 23.8,
    lng: 87.9,
};
pub const DEFAULT_ZOOM: u8 = 7;
/// Zoom used when panning to a clicked marker
pub const MARKER_ZOOM: u8 = 10;

/// Operations the controller needs from the mapping library binding
pub trait MapBackend {
    fn create_map(&mut self, center: Coordinates, zoom: u8);
    fn remove_map(&mut self);
    fn add_marker(&mut self, id: Uuid, at: Coordinates, popup_html: &str);
    fn clear_markers(&mut self);
    fn fly_to(&mut self, at: Coordinates, zoom: u8);
    fn add_event_listener(&mut self, event: &str);
    fn remove_event_listener(&mut self, event: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClickState {
    #[default]
    Idle,
    PannedToMarker(Uuid),
}

/// Owns the map instance and its markers for one mounted view.
///
/// A first click on a marker pans to it; clicking the same marker again
/// opens its detail panel. Rebuilding the markers resets this.
pub struct MapController<B: MapBackend> {
    backend: B,
    map_ready: bool,
    listening: bool,
    markers: Vec<DistrictMapPointDto>,
    click_state: ClickState,
}

impl<B: MapBackend> MapController<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            map_ready: false,
            listening: false,
            markers: Vec::new(),
            click_state: ClickState::Idle,
        }
    }

    /// Creates the map on first call and attaches the `districtSelect` listener.
    pub fn mount(&mut self) {
        if !self.map_ready {
            self.backend.create_map(DEFAULT_CENTER, DEFAULT_ZOOM);
            self.map_ready = true;
        }
        if !self.listening {
            self.backend.add_event_listener(DISTRICT_SELECT_EVENT);
            self.listening = true;
        }
    }

    /// Rebuilds every marker when `points` differs from what is shown.
    ///
    /// Returns true if the markers were rebuilt.
    pub fn sync_markers(&mut self, points: &[DistrictMapPointDto]) -> bool {
        if !self.map_ready || self.markers.as_slice() == points {
            return false;
        }

        self.backend.clear_markers();
        for point in points {
            self.backend
                .add_marker(point.id, point.coordinates, &popup_html(point));
        }
        self.markers = points.to_vec();
        self.click_state = ClickState::Idle;
        true
    }

    /// Marker click; returns the action to dispatch when the detail panel should open.
    pub fn click_marker(&mut self, id: Uuid) -> Option<AtlasAction> {
        let marker = self.markers.iter().find(|m| m.id == id)?;

        match self.click_state {
            ClickState::PannedToMarker(current) if current == id => {
                Some(AtlasAction::SelectDistrict(marker.slug.clone()))
            }
            _ => {
                self.backend.fly_to(marker.coordinates, MARKER_ZOOM);
                self.click_state = ClickState::PannedToMarker(id);
                None
            }
        }
    }

    /// `districtSelect` fired from a popup button
    pub fn on_district_select(&self, slug: &str) -> Option<AtlasAction> {
        if !self.listening || slug.is_empty() {
            return None;
        }
        Some(AtlasAction::SelectDistrict(slug.to_string()))
    }

    pub fn click_state(&self) -> ClickState {
        self.click_state
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    /// Detaches the listener and drops the map with its markers.
    pub fn teardown(&mut self) {
        if self.listening {
            self.backend.remove_event_listener(DISTRICT_SELECT_EVENT);
            self.listening = false;
        }
        if self.map_ready {
            self.backend.clear_markers();
            self.backend.remove_map();
            self.map_ready = false;
        }
        self.markers.clear();
        self.click_state = ClickState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        CreateMap,
        RemoveMap,
        AddMarker(Uuid),
        ClearMarkers,
        FlyTo(Coordinates),
        Listen(String),
        Unlisten(String),
    }

    #[derive(Default)]
    struct RecordingBackend {
        calls: Vec<Call>,
    }

    impl RecordingBackend {
        fn count(&self, f: impl Fn(&Call) -> bool) -> usize {
            self.calls.iter().filter(|c| f(c)).count()
        }

        fn fly_targets(&self) -> Vec<Coordinates> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    Call::FlyTo(at) => Some(*at),
                    _ => None,
                })
                .collect()
        }
    }

    impl MapBackend for RecordingBackend {
        fn create_map(&mut self, _center: Coordinates, _zoom: u8) {
            self.calls.push(Call::CreateMap);
        }
        fn remove_map(&mut self) {
            self.calls.push(Call::RemoveMap);
        }
        fn add_marker(&mut self, id: Uuid, _at: Coordinates, _popup_html: &str) {
            self.calls.push(Call::AddMarker(id));
        }
        fn clear_markers(&mut self) {
            self.calls.push(Call::ClearMarkers);
        }
        fn fly_to(&mut self, at: Coordinates, _zoom: u8) {
            self.calls.push(Call::FlyTo(at));
        }
        fn add_event_listener(&mut self, event: &str) {
            self.calls.push(Call::Listen(event.to_string()));
        }
        fn remove_event_listener(&mut self, event: &str) {
            self.calls.push(Call::Unlisten(event.to_string()));
        }
    }

    fn point(slug: &str, lat: f64) -> DistrictMapPointDto {
        DistrictMapPointDto {
            id: Uuid::new_v4(),
            name: slug.to_string(),
            slug: slug.to_string(),
            coordinates: Coordinates { lat, lng: 88.0 },
            header_image: None,
            population: None,
            gram_panchayat_count: 0,
        }
    }

    fn mounted(points: &[DistrictMapPointDto]) -> MapController<RecordingBackend> {
        let mut controller = MapController::new(RecordingBackend::default());
        controller.mount();
        controller.sync_markers(points);
        controller
    }

    #[test]
    fn test_click_sequence_a_b_a_pans_each_time() {
        let (a, b) = (point("a", 22.0), point("b", 24.0));
        let mut controller = mounted(&[a.clone(), b.clone()]);

        assert_eq!(controller.click_marker(a.id), None);
        assert_eq!(controller.click_marker(b.id), None);
        assert_eq!(controller.click_marker(a.id), None);

        assert_eq!(
            controller.backend.fly_targets(),
            vec![a.coordinates, b.coordinates, a.coordinates]
        );
        assert_eq!(controller.click_state(), ClickState::PannedToMarker(a.id));
    }

    #[test]
    fn test_click_sequence_a_a_pans_then_opens() {
        let a = point("a", 22.0);
        let mut controller = mounted(&[a.clone()]);

        assert_eq!(controller.click_marker(a.id), None);
        assert_eq!(
            controller.click_marker(a.id),
            Some(AtlasAction::SelectDistrict("a".to_string()))
        );
        assert_eq!(controller.backend.fly_targets(), vec![a.coordinates]);
        assert_eq!(controller.click_state(), ClickState::PannedToMarker(a.id));
    }

    #[test]
    fn test_map_created_once_and_unchanged_list_is_noop() {
        let points = vec![point("a", 22.0), point("b", 24.0)];
        let mut controller = mounted(&points);

        controller.mount();
        assert!(!controller.sync_markers(&points));
        assert!(controller.sync_markers(&points[..1]));

        let backend = &controller.backend;
        assert_eq!(backend.count(|c| *c == Call::CreateMap), 1);
        assert_eq!(backend.count(|c| *c == Call::ClearMarkers), 2);
        assert_eq!(backend.count(|c| matches!(c, Call::AddMarker(_))), 3);
        assert_eq!(controller.marker_count(), 1);
    }

    #[test]
    fn test_rebuild_resets_click_state() {
        let a = point("a", 22.0);
        let mut controller = mounted(&[a.clone()]);
        controller.click_marker(a.id);

        controller.sync_markers(&[a.clone(), point("b", 24.0)]);

        assert_eq!(controller.click_state(), ClickState::Idle);
        assert_eq!(controller.click_marker(a.id), None);
    }

    #[test]
    fn test_unknown_marker_is_ignored() {
        let mut controller = mounted(&[point("a", 22.0)]);
        assert_eq!(controller.click_marker(Uuid::new_v4()), None);
        assert!(controller.backend.fly_targets().is_empty());
    }

    #[test]
    fn test_teardown_detaches_listener_and_clears_markers() {
        let a = point("a", 22.0);
        let mut controller = mounted(&[a.clone()]);
        assert!(controller.on_district_select("a").is_some());
        controller.click_marker(a.id);

        controller.teardown();

        let backend = &controller.backend;
        assert_eq!(
            backend.count(|c| *c == Call::Unlisten(DISTRICT_SELECT_EVENT.to_string())),
            1
        );
        assert_eq!(backend.count(|c| *c == Call::RemoveMap), 1);
        assert_eq!(controller.marker_count(), 0);
        assert_eq!(controller.click_state(), ClickState::Idle);
        assert!(controller.on_district_select("a").is_none());
        assert!(!controller.sync_markers(&[a]));
    }
}
