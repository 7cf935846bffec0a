//! Station map rendering
//!
//! [`MapRenderer`] owns the map state: it initializes the view once, then on every
//! refresh removes all markers and hover listeners it placed before and places one marker
//! per station that has coordinates, colored by AQI severity. The drawing itself is
//! delegated to a [`MapSurface`], which stands in for the mapping library.
//!
//! Refreshes are not re-entrant; every mutating method takes `&mut self`.

pub mod svg;

use maud::html;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::Result;
use crate::aqi;
use crate::config::MapConfig;
use crate::models::{Coordinates, StationRecord};

pub use svg::SvgMapSurface;

/// Handle of a marker placed on a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MarkerId(pub u64);

/// Handle of a registered pointer listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ListenerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PointerEvent {
    Enter,
    Leave,
}

/// Initial view of the map
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapViewOptions {
    pub center: Coordinates,
    pub zoom: u8,
    pub tile_url: String,
    pub attribution: String,
}

impl From<&MapConfig> for MapViewOptions {
    fn from(config: &MapConfig) -> Self {
        Self {
            center: Coordinates {
                latitude: config.center_latitude,
                longitude: config.center_longitude,
            },
            zoom: config.zoom,
            tile_url: config.tile_url.clone(),
            attribution: config.attribution.clone(),
        }
    }
}

/// Circle marker appearance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerStyle {
    pub radius: u32,
    pub fill_color: &'static str,
    pub stroke_color: &'static str,
    pub weight: u32,
    pub opacity: f32,
    pub fill_opacity: f32,
}

impl MarkerStyle {
    #[must_use]
    pub fn for_aqi(aqi: Option<i64>, radius: u32) -> Self {
        Self {
            radius,
            fill_color: aqi::classify(aqi).color,
            stroke_color: "#000",
            weight: 1,
            opacity: 1.0,
            fill_opacity: 0.8,
        }
    }
}

/// Everything a surface needs to draw one station marker
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerSpec {
    pub station: String,
    pub position: Coordinates,
    pub style: MarkerStyle,
    pub popup_html: String,
    /// Plain-text summary for surfaces without rich popups
    pub tooltip: String,
}

impl MarkerSpec {
    /// Build the marker for a station; `None` when it lacks usable coordinates
    #[must_use]
    pub fn for_station(station: &StationRecord, radius: u32) -> Option<Self> {
        let position = station.coordinates()?;
        Some(Self {
            station: station.name.clone(),
            position,
            style: MarkerStyle::for_aqi(station.aqi, radius),
            popup_html: popup_html(station),
            tooltip: tooltip(station),
        })
    }
}

/// Hover popup: name, status, AQI and PM2.5
#[must_use]
pub fn popup_html(station: &StationRecord) -> String {
    let aqi = station
        .aqi
        .map_or_else(|| "N/A".to_string(), |value| value.to_string());
    let pm25 = station
        .pm25
        .map_or_else(|| "N/A".to_string(), |value| format!("{value:.2} µg/m³"));

    html! {
        b { (station.name) } br;
        "Air quality: " b { (station.status) } br;
        "AQI: " (aqi) br;
        "PM2.5: " (pm25)
    }
    .into_string()
}

fn tooltip(station: &StationRecord) -> String {
    let category = aqi::classify(station.aqi);
    match station.aqi {
        Some(value) => format!("{}: AQI {} ({})", station.name, value, category.severity),
        None => format!("{}: AQI N/A", station.name),
    }
}

/// The mapping library as seen by the renderer
pub trait MapSurface {
    /// Whether the container element for the map exists
    fn has_container(&self) -> bool;

    fn init_view(&mut self, options: &MapViewOptions) -> Result<()>;

    fn add_marker(&mut self, marker: &MarkerSpec) -> MarkerId;

    fn remove_marker(&mut self, id: MarkerId);

    /// Register interest in a pointer event on a marker. The surface reports matching
    /// events back through [`MapRenderer::dispatch`].
    fn listen(&mut self, id: MarkerId, event: PointerEvent) -> ListenerId;

    fn unlisten(&mut self, listener: ListenerId);

    fn open_popup(&mut self, id: MarkerId, html: &str);

    fn close_popup(&mut self, id: MarkerId);
}

/// A registered listener; must be disposed against the surface it came from
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a subscription must be disposed to release its listener"]
pub struct Subscription {
    listener: ListenerId,
    marker: MarkerId,
    event: PointerEvent,
}

impl Subscription {
    pub fn register<S: MapSurface + ?Sized>(
        surface: &mut S,
        marker: MarkerId,
        event: PointerEvent,
    ) -> Self {
        Self {
            listener: surface.listen(marker, event),
            marker,
            event,
        }
    }

    #[must_use]
    pub fn event(&self) -> PointerEvent {
        self.event
    }

    #[must_use]
    pub fn marker(&self) -> MarkerId {
        self.marker
    }

    pub fn dispose<S: MapSurface + ?Sized>(self, surface: &mut S) {
        surface.unlisten(self.listener);
    }
}

#[derive(Debug)]
struct PlacedMarker {
    id: MarkerId,
    station: String,
    popup_html: String,
    subscriptions: Vec<Subscription>,
}

/// Counts from one refresh
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RenderSummary {
    pub placed: usize,
    /// Stations without usable coordinates
    pub skipped: usize,
}

pub struct MapRenderer<S: MapSurface> {
    surface: S,
    options: MapViewOptions,
    marker_radius: u32,
    initialized: bool,
    placed: Vec<PlacedMarker>,
}

impl<S: MapSurface> MapRenderer<S> {
    pub fn new(surface: S, config: &MapConfig) -> Self {
        Self {
            surface,
            options: MapViewOptions::from(config),
            marker_radius: config.marker_radius,
            initialized: false,
            placed: Vec::new(),
        }
    }

    /// Initialize the view. Only the first successful call touches the surface.
    ///
    /// Returns `false` (after a warning) when the map container is missing.
    pub fn init(&mut self) -> Result<bool> {
        if self.initialized {
            return Ok(true);
        }
        if !self.surface.has_container() {
            warn!("Map container not found, skipping map initialization");
            return Ok(false);
        }
        self.surface.init_view(&self.options)?;
        self.initialized = true;
        info!(
            "Map initialized at {} zoom {}",
            self.options.center.format(),
            self.options.zoom
        );
        Ok(true)
    }

    /// Replace all markers with one per station that has coordinates
    pub fn render(&mut self, stations: &[StationRecord]) -> Result<RenderSummary> {
        if !self.init()? {
            return Ok(RenderSummary::default());
        }

        self.clear_markers();

        let mut summary = RenderSummary::default();
        for station in stations {
            let Some(spec) = MarkerSpec::for_station(station, self.marker_radius) else {
                debug!("Station '{}' has no coordinates, not mapped", station.name);
                summary.skipped += 1;
                continue;
            };

            let id = self.surface.add_marker(&spec);
            let subscriptions = vec![
                Subscription::register(&mut self.surface, id, PointerEvent::Enter),
                Subscription::register(&mut self.surface, id, PointerEvent::Leave),
            ];
            self.placed.push(PlacedMarker {
                id,
                station: spec.station,
                popup_html: spec.popup_html,
                subscriptions,
            });
            summary.placed += 1;
        }

        debug!(
            "Placed {} markers, skipped {} stations",
            summary.placed, summary.skipped
        );
        Ok(summary)
    }

    /// Handle a pointer event reported by the surface
    pub fn dispatch(&mut self, id: MarkerId, event: PointerEvent) {
        let Some(marker) = self.placed.iter().find(|marker| marker.id == id) else {
            debug!("Pointer event for unknown marker {:?}", id);
            return;
        };
        if !marker.subscriptions.iter().any(|s| s.event() == event) {
            return;
        }
        match event {
            PointerEvent::Enter => self.surface.open_popup(id, &marker.popup_html),
            PointerEvent::Leave => self.surface.close_popup(id),
        }
    }

    /// Remove every marker and listener; the view itself stays initialized
    pub fn teardown(&mut self) {
        self.clear_markers();
    }

    fn clear_markers(&mut self) {
        for marker in self.placed.drain(..) {
            for subscription in marker.subscriptions {
                subscription.dispose(&mut self.surface);
            }
            self.surface.remove_marker(marker.id);
        }
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    #[must_use]
    pub fn marker_count(&self) -> usize {
        self.placed.len()
    }

    /// Marker id placed for a station, if any
    #[must_use]
    pub fn marker_for(&self, station: &str) -> Option<MarkerId> {
        self.placed
            .iter()
            .find(|marker| marker.station == station)
            .map(|marker| marker.id)
    }

    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn into_surface(mut self) -> S {
        self.clear_markers();
        let Self { surface, .. } = self;
        surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer() -> MapRenderer<SvgMapSurface> {
        MapRenderer::new(SvgMapSurface::new(800, 600), &MapConfig::default())
    }

    fn sample() -> Vec<StationRecord> {
        vec![
            StationRecord::new("A").with_coordinates(1.0, 1.0).with_aqi(30),
            StationRecord::new("B").with_aqi(999),
        ]
    }

    #[test]
    fn test_only_stations_with_coordinates_get_markers() {
        let mut map = renderer();
        let summary = map.render(&sample()).unwrap();

        assert_eq!(summary, RenderSummary { placed: 1, skipped: 1 });
        let markers = map.surface().markers();
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].station, "A");
        assert_eq!(markers[0].style.fill_color, "#00e400");
    }

    #[test]
    fn test_view_is_initialized_once() {
        let mut map = renderer();
        map.render(&sample()).unwrap();
        map.render(&sample()).unwrap();
        map.render(&[]).unwrap();
        assert_eq!(map.surface().init_count(), 1);
        assert_eq!(map.marker_count(), 0);
    }

    #[test]
    fn test_refresh_replaces_markers_and_listeners() {
        let mut map = renderer();
        map.render(&sample()).unwrap();
        let first = map.marker_for("A").unwrap();

        let refreshed = vec![
            StationRecord::new("C").with_coordinates(2.0, 2.0).with_aqi(180),
            StationRecord::new("D").with_coordinates(3.0, 3.0),
        ];
        map.render(&refreshed).unwrap();

        assert_eq!(map.marker_count(), 2);
        assert!(map.marker_for("A").is_none());
        assert!(!map.surface().has_marker(first));
        assert!(map.surface().listeners_for(first).is_empty());
        assert_eq!(map.surface().markers().len(), 2);
        assert_eq!(map.surface().listener_count(), 4);
    }

    #[test]
    fn test_hover_opens_and_closes_popup() {
        let mut map = renderer();
        map.render(&sample()).unwrap();
        let id = map.marker_for("A").unwrap();
        assert_eq!(
            map.surface().listeners_for(id),
            [PointerEvent::Enter, PointerEvent::Leave]
        );

        map.dispatch(id, PointerEvent::Enter);
        let popup = map.surface().open_popup_html(id).unwrap();
        assert!(popup.contains("<b>A</b>"));
        assert!(popup.contains("AQI: 30"));
        assert!(popup.contains("PM2.5: N/A"));

        map.dispatch(id, PointerEvent::Leave);
        assert!(map.surface().open_popup_html(id).is_none());
    }

    #[test]
    fn test_missing_container_is_a_no_op() {
        let mut map = MapRenderer::new(SvgMapSurface::detached(), &MapConfig::default());
        let summary = map.render(&sample()).unwrap();
        assert_eq!(summary, RenderSummary::default());
        assert!(!map.is_initialized());
        assert_eq!(map.surface().init_count(), 0);
    }

    #[test]
    fn test_teardown_releases_everything() {
        let mut map = renderer();
        map.render(&sample()).unwrap();
        map.teardown();
        assert_eq!(map.marker_count(), 0);
        assert_eq!(map.surface().listener_count(), 0);
        assert!(map.surface().markers().is_empty());
        assert!(map.is_initialized());
    }

    #[test]
    fn test_popup_formats_pm25_and_escapes_names() {
        let station = StationRecord::new("<Station & Co>")
            .with_coordinates(0.0, 0.0)
            .with_aqi(75)
            .with_pm25(12.346);
        let popup = popup_html(&station);
        assert!(popup.contains("&lt;Station &amp; Co&gt;"));
        assert!(popup.contains("PM2.5: 12.35 µg/m³"));
        assert!(popup.contains("<b>Moderate</b>"));
    }
}
