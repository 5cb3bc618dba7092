use serde::Serialize;

use super::token::MapTokenSource;
use crate::types::{Community, GeoPoint, TrustLevel};

/// Geographic centre of the contiguous United States.
pub const DEFAULT_CENTER: GeoPoint = GeoPoint::new(39.8283, -98.5795);
pub const DEFAULT_ZOOM: f64 = 4.0;
pub const USER_ZOOM: f64 = 12.0;

const DESCRIPTION_PREVIEW_CHARS: usize = 120;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Popup {
    pub name: String,
    pub location: String,
    pub trust_level: TrustLevel,
    pub member_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub community_id: String,
    pub position: GeoPoint,
    pub popup: Popup,
}

impl Marker {
    #[must_use]
    pub fn for_community(community: &Community) -> Self {
        Self {
            community_id: community.id.clone(),
            position: GeoPoint::new(community.location_lat, community.location_lng),
            popup: Popup {
                name: community.name.clone(),
                location: community.location_label(),
                trust_level: community.trust_level,
                member_count: community.member_count,
            },
        }
    }
}

/// One marker per community, in the order given.
#[must_use]
pub fn markers_for(communities: &[Community]) -> Vec<Marker> {
    communities.iter().map(Marker::for_community).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Control {
    Navigation,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Camera {
    pub center: GeoPoint,
    pub zoom: f64,
}

/// A live map canvas. Replaced wholesale whenever its inputs change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapInstance {
    pub generation: u64,
    pub token: String,
    pub camera: Camera,
    pub controls: Vec<Control>,
    pub markers: Vec<Marker>,
    pub user_marker: Option<GeoPoint>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MapState {
    Loading,
    Unavailable { reason: String },
    Ready(MapInstance),
}

pub trait GeolocationProvider {
    /// The device position, or `None` when it cannot be determined.
    fn current_position(&self) -> Option<GeoPoint>;
}

impl GeolocationProvider for Option<GeoPoint> {
    fn current_position(&self) -> Option<GeoPoint> {
        *self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailCard {
    pub community_id: String,
    pub name: String,
    pub location: String,
    pub schedule: String,
    pub trust_level: TrustLevel,
    pub member_count: i64,
    pub description: String,
}

type SelectCallback = Box<dyn FnMut(&Community) + Send>;

pub struct MapView {
    state: MapState,
    token: Option<String>,
    communities: Vec<Community>,
    user_location: Option<GeoPoint>,
    selected: Option<String>,
    locating: bool,
    generation: u64,
    teardowns: u64,
    default_zoom: f64,
    on_select: Option<SelectCallback>,
}

impl MapView {
    pub fn new(communities: Vec<Community>) -> Self {
        Self {
            state: MapState::Loading,
            token: None,
            communities,
            user_location: None,
            selected: None,
            locating: false,
            generation: 0,
            teardowns: 0,
            default_zoom: DEFAULT_ZOOM,
            on_select: None,
        }
    }

    #[must_use]
    pub fn with_default_zoom(mut self, zoom: f64) -> Self {
        self.default_zoom = zoom;
        self
    }

    /// Registers the parent's selection handler.
    pub fn on_select(&mut self, callback: impl FnMut(&Community) + Send + 'static) {
        self.on_select = Some(Box::new(callback));
    }

    #[must_use]
    pub fn state(&self) -> &MapState {
        &self.state
    }

    #[must_use]
    pub fn instance(&self) -> Option<&MapInstance> {
        match &self.state {
            MapState::Ready(instance) => Some(instance),
            _ => None,
        }
    }

    /// How many map instances have been torn down so far.
    #[must_use]
    pub fn teardowns(&self) -> u64 {
        self.teardowns
    }

    #[must_use]
    pub fn is_locating(&self) -> bool {
        self.locating
    }

    #[must_use]
    pub fn user_location(&self) -> Option<GeoPoint> {
        self.user_location
    }

    /// Token fetch followed by a geolocation lookup, as on first display.
    pub fn mount(&mut self, tokens: &dyn MapTokenSource, geolocation: &dyn GeolocationProvider) {
        self.load_token(tokens);
        self.locate(geolocation);
    }

    pub fn load_token(&mut self, source: &dyn MapTokenSource) -> &MapState {
        match source.fetch_token() {
            Ok(token) if !token.trim().is_empty() => {
                self.token = Some(token);
                self.rebuild();
            }
            Ok(_) => self.fail("map token is empty".to_string()),
            Err(e) => self.fail(e.to_string()),
        }
        &self.state
    }

    /// Drops everything derived from the previous token and fetches a new one.
    pub fn retry(&mut self, source: &dyn MapTokenSource) -> &MapState {
        self.teardown();
        self.token = None;
        self.state = MapState::Loading;
        self.load_token(source)
    }

    pub fn set_communities(&mut self, communities: Vec<Community>) {
        self.communities = communities;
        if self
            .selected
            .as_ref()
            .is_some_and(|id| !self.communities.iter().any(|c| &c.id == id))
        {
            self.selected = None;
        }
        self.rebuild();
    }

    pub fn set_user_location(&mut self, position: GeoPoint) {
        self.user_location = Some(position);
        self.rebuild();
    }

    /// Marks a lookup as in flight. Returns false if one already is.
    pub fn begin_locate(&mut self) -> bool {
        if self.locating {
            return false;
        }
        self.locating = true;
        true
    }

    pub fn finish_locate(&mut self, position: Option<GeoPoint>) {
        self.locating = false;
        match position {
            Some(position) => self.set_user_location(position),
            None => tracing::debug!("Geolocation unavailable"),
        }
    }

    /// The "find me" control.
    pub fn locate(&mut self, provider: &dyn GeolocationProvider) -> Option<GeoPoint> {
        if !self.begin_locate() {
            return None;
        }
        let position = provider.current_position();
        self.finish_locate(position);
        position
    }

    /// Selects a community and notifies the parent. Returns false for unknown ids.
    pub fn select(&mut self, community_id: &str) -> bool {
        let Some(community) = self.communities.iter().find(|c| c.id == community_id) else {
            return false;
        };
        self.selected = Some(community.id.clone());
        if let Some(callback) = self.on_select.as_mut() {
            callback(community);
        }
        true
    }

    #[must_use]
    pub fn selected(&self) -> Option<&Community> {
        let id = self.selected.as_ref()?;
        self.communities.iter().find(|c| &c.id == id)
    }

    #[must_use]
    pub fn detail_card(&self) -> Option<DetailCard> {
        let community = self.selected()?;
        Some(DetailCard {
            community_id: community.id.clone(),
            name: community.name.clone(),
            location: community.location_label(),
            schedule: format!("{}s at {}", community.meeting_day, community.meeting_time),
            trust_level: community.trust_level,
            member_count: community.member_count,
            description: truncate(&community.description, DESCRIPTION_PREVIEW_CHARS),
        })
    }

    fn fail(&mut self, reason: String) {
        tracing::warn!("Map unavailable: {reason}");
        self.teardown();
        self.state = MapState::Unavailable { reason };
    }

    fn teardown(&mut self) {
        if let MapState::Ready(instance) = &self.state {
            tracing::debug!("Removing map instance {}", instance.generation);
            self.teardowns += 1;
            self.state = MapState::Loading;
        }
    }

    fn rebuild(&mut self) {
        let Some(token) = self.token.clone() else {
            return;
        };
        self.teardown();

        self.generation += 1;
        let camera = match self.user_location {
            Some(center) => Camera {
                center,
                zoom: USER_ZOOM,
            },
            None => Camera {
                center: DEFAULT_CENTER,
                zoom: self.default_zoom,
            },
        };

        let instance = MapInstance {
            generation: self.generation,
            token,
            camera,
            controls: vec![Control::Navigation],
            markers: markers_for(&self.communities),
            user_marker: self.user_location,
        };
        tracing::debug!(
            "Built map instance {} with {} markers",
            instance.generation,
            instance.markers.len()
        );
        self.state = MapState::Ready(instance);
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars).collect();
    format!("{}...", head.trim_end())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use chrono::Utc;

    use super::*;
    use crate::error::{Error, Result};
    use crate::map::token::TokenResponse;

    fn community(id: &str, lat: f64, lng: f64) -> Community {
        let now = Utc::now();
        Community {
            id: id.to_string(),
            name: format!("Community {id}"),
            description: "We share a meal and read together.".to_string(),
            meeting_day: "Sunday".to_string(),
            meeting_time: "10:00 AM".to_string(),
            trust_level: TrustLevel::Verified,
            member_count: 12,
            location_city: "Denver".to_string(),
            location_state: "CO".to_string(),
            location_lat: lat,
            location_lng: lng,
            tags: Vec::new(),
            leader_id: "leader".to_string(),
            contact_info: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn ok_token() -> Result<String> {
        Ok("pk.test".to_string())
    }

    #[test]
    fn test_one_marker_per_community_at_its_coordinates() {
        let communities = vec![
            community("a", 39.7392, -104.9903),
            community("b", 40.0150, -105.2705),
            community("c", 0.0, 0.0),
        ];
        let mut view = MapView::new(communities.clone());
        view.load_token(&ok_token);

        let instance = view.instance().unwrap();
        assert_eq!(instance.markers.len(), communities.len());
        for (marker, c) in instance.markers.iter().zip(&communities) {
            assert_eq!(marker.community_id, c.id);
            assert_eq!(marker.position, GeoPoint::new(c.location_lat, c.location_lng));
            assert_eq!(marker.popup.location, "Denver, CO");
            assert_eq!(marker.popup.member_count, 12);
        }
        assert_eq!(instance.camera.center, DEFAULT_CENTER);
        assert_eq!(instance.controls, vec![Control::Navigation]);
    }

    #[test]
    fn test_response_without_token_never_shows_map() {
        let source = || TokenResponse::default().into_token();
        let mut view = MapView::new(vec![community("a", 1.0, 1.0)]);

        assert!(matches!(
            view.load_token(&source),
            MapState::Unavailable { .. }
        ));
        assert!(view.instance().is_none());
    }

    #[test]
    fn test_blank_token_from_source_is_unavailable() {
        let blank = || -> Result<String> { Ok("  ".into()) };
        let mut view = MapView::new(vec![community("a", 1.0, 1.0)]);

        assert!(matches!(
            view.load_token(&blank),
            MapState::Unavailable { reason } if reason.contains("empty")
        ));
        assert!(view.instance().is_none());

        view.set_communities(vec![community("b", 2.0, 2.0)]);
        assert!(view.instance().is_none());
    }

    #[test]
    fn test_retry_recovers_after_failure() {
        let mut view = MapView::new(vec![community("a", 1.0, 1.0)]);
        let failing = || -> Result<String> { Err(Error::TokenUnavailable("offline".into())) };

        view.load_token(&failing);
        assert!(matches!(view.state(), MapState::Unavailable { reason } if reason.contains("offline")));

        view.retry(&ok_token);
        assert!(view.instance().is_some());
    }

    #[test]
    fn test_rebuild_tears_down_previous_instance() {
        let mut view = MapView::new(vec![community("a", 1.0, 1.0)]);
        view.load_token(&ok_token);
        assert_eq!(view.teardowns(), 0);

        view.set_communities(vec![community("a", 1.0, 1.0), community("b", 2.0, 2.0)]);
        assert_eq!(view.teardowns(), 1);
        assert_eq!(view.instance().unwrap().generation, 2);
        assert_eq!(view.instance().unwrap().markers.len(), 2);
    }

    #[test]
    fn test_changes_before_token_do_not_build() {
        let mut view = MapView::new(Vec::new());
        view.set_communities(vec![community("a", 1.0, 1.0)]);
        view.set_user_location(GeoPoint::new(10.0, 10.0));
        assert_eq!(view.state(), &MapState::Loading);
        assert_eq!(view.teardowns(), 0);
    }

    #[test]
    fn test_user_location_adds_marker_and_recenters() {
        let here = GeoPoint::new(39.7392, -104.9903);
        let mut view = MapView::new(vec![community("a", 1.0, 1.0)]);
        view.mount(&ok_token, &Some(here));

        let instance = view.instance().unwrap();
        assert_eq!(instance.user_marker, Some(here));
        assert_eq!(instance.camera.center, here);
        assert_eq!(instance.camera.zoom, USER_ZOOM);
        assert_eq!(instance.markers.len(), 1);
        assert!(!view.is_locating());
    }

    #[test]
    fn test_locate_is_disabled_while_in_flight() {
        let mut view = MapView::new(Vec::new());
        assert!(view.begin_locate());
        assert!(view.is_locating());
        assert!(!view.begin_locate());
        assert_eq!(view.locate(&Some(GeoPoint::new(1.0, 1.0))), None);

        view.finish_locate(None);
        assert!(!view.is_locating());
        assert!(view.user_location().is_none());
    }

    #[test]
    fn test_select_notifies_parent_and_builds_card() {
        let mut long = community("a", 1.0, 1.0);
        long.description = "x".repeat(200);
        let mut view = MapView::new(vec![long]);

        let picked = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&picked);
        view.on_select(move |c| sink.lock().unwrap().push(c.id.clone()));

        assert!(!view.select("missing"));
        assert!(view.select("a"));
        assert_eq!(*picked.lock().unwrap(), vec!["a".to_string()]);

        let card = view.detail_card().unwrap();
        assert_eq!(card.schedule, "Sundays at 10:00 AM");
        assert_eq!(card.description.chars().count(), 123);
        assert!(card.description.ends_with("..."));

        view.set_communities(Vec::new());
        assert!(view.detail_card().is_none());
    }

    #[test]
    fn test_short_description_is_untouched() {
        assert_eq!(truncate("short", 120), "short");
    }
}
