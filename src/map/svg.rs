//! SVG map surface
//!
//! Draws markers onto a Web Mercator canvas centered on the configured view. Hover
//! popups become SVG `<title>` tooltips; popups opened through the renderer are drawn as
//! labels. The surface also keeps its marker and listener tables inspectable, which the
//! tests rely on.

use maud::html;
use std::collections::BTreeMap;
use std::f64::consts::PI;

use super::{ListenerId, MapSurface, MapViewOptions, MarkerId, MarkerSpec, PointerEvent};
use crate::models::Coordinates;
use crate::{AqiwatchError, Result};

/// Web Mercator latitude limit
const MAX_LATITUDE: f64 = 85.051_128_78;
const TILE_SIZE: f64 = 256.0;

pub struct SvgMapSurface {
    width: u32,
    height: u32,
    container: bool,
    view: Option<MapViewOptions>,
    init_count: usize,
    next_id: u64,
    markers: BTreeMap<MarkerId, MarkerSpec>,
    listeners: BTreeMap<ListenerId, (MarkerId, PointerEvent)>,
    popups: BTreeMap<MarkerId, String>,
}

impl SvgMapSurface {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            container: true,
            view: None,
            init_count: 0,
            next_id: 0,
            markers: BTreeMap::new(),
            listeners: BTreeMap::new(),
            popups: BTreeMap::new(),
        }
    }

    /// A surface whose container is missing
    #[must_use]
    pub fn detached() -> Self {
        Self {
            container: false,
            ..Self::new(0, 0)
        }
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    #[must_use]
    pub fn init_count(&self) -> usize {
        self.init_count
    }

    #[must_use]
    pub fn markers(&self) -> Vec<&MarkerSpec> {
        self.markers.values().collect()
    }

    #[must_use]
    pub fn has_marker(&self, id: MarkerId) -> bool {
        self.markers.contains_key(&id)
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Listeners registered on one marker
    #[must_use]
    pub fn listeners_for(&self, id: MarkerId) -> Vec<PointerEvent> {
        self.listeners
            .values()
            .filter(|(marker, _)| *marker == id)
            .map(|(_, event)| *event)
            .collect()
    }

    #[must_use]
    pub fn open_popup_html(&self, id: MarkerId) -> Option<&str> {
        self.popups.get(&id).map(String::as_str)
    }

    /// Pixel position of a coordinate on the canvas
    #[must_use]
    pub fn to_screen(&self, position: Coordinates, view: &MapViewOptions) -> (f64, f64) {
        let (x, y) = project(position, view.zoom);
        let (center_x, center_y) = project(view.center, view.zoom);
        (
            x - center_x + f64::from(self.width) / 2.0,
            y - center_y + f64::from(self.height) / 2.0,
        )
    }

    /// Render the current view as a standalone SVG document
    pub fn to_svg(&self) -> Result<String> {
        let view = self
            .view
            .as_ref()
            .ok_or_else(|| AqiwatchError::render("map view has not been initialized"))?;
        let attribution = view.attribution.replace("&copy;", "©");

        let markup = html! {
            svg xmlns="http://www.w3.org/2000/svg"
                width=(self.width)
                height=(self.height)
                viewBox=(format!("0 0 {} {}", self.width, self.height)) {
                rect width="100%" height="100%" fill="#e8f1f5" {}
                @for marker in self.markers.values() {
                    @let (x, y) = self.to_screen(marker.position, view);
                    g class="station" data-station=(marker.station) {
                        circle
                            cx=(format!("{x:.1}"))
                            cy=(format!("{y:.1}"))
                            r=(marker.style.radius)
                            fill=(marker.style.fill_color)
                            stroke=(marker.style.stroke_color)
                            stroke-width=(marker.style.weight)
                            opacity=(marker.style.opacity)
                            fill-opacity=(marker.style.fill_opacity) {
                            title { (marker.tooltip) }
                        }
                    }
                }
                @for (id, _) in &self.popups {
                    @if let Some(marker) = self.markers.get(id) {
                        @let (x, y) = self.to_screen(marker.position, view);
                        text class="popup"
                            x=(format!("{:.1}", x + f64::from(marker.style.radius) + 2.0))
                            y=(format!("{y:.1}"))
                            font-size="12" {
                            (marker.tooltip)
                        }
                    }
                }
                text x="4" y=(self.height.saturating_sub(4)) font-size="10" fill="#555" {
                    (attribution)
                }
            }
        };

        Ok(markup.into_string())
    }
}

/// Web Mercator world pixel coordinates at a zoom level
fn project(position: Coordinates, zoom: u8) -> (f64, f64) {
    let world = TILE_SIZE * 2_f64.powi(i32::from(zoom));
    let x = (position.longitude + 180.0) / 360.0 * world;
    let latitude = position
        .latitude
        .clamp(-MAX_LATITUDE, MAX_LATITUDE)
        .to_radians();
    let y = (1.0 - (latitude.tan() + 1.0 / latitude.cos()).ln() / PI) / 2.0 * world;
    (x, y)
}

impl MapSurface for SvgMapSurface {
    fn has_container(&self) -> bool {
        self.container
    }

    fn init_view(&mut self, options: &MapViewOptions) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(AqiwatchError::render("map canvas has zero size"));
        }
        self.view = Some(options.clone());
        self.init_count += 1;
        Ok(())
    }

    fn add_marker(&mut self, marker: &MarkerSpec) -> MarkerId {
        let id = MarkerId(self.next());
        self.markers.insert(id, marker.clone());
        id
    }

    fn remove_marker(&mut self, id: MarkerId) {
        self.popups.remove(&id);
        self.markers.remove(&id);
    }

    fn listen(&mut self, id: MarkerId, event: PointerEvent) -> ListenerId {
        let listener = ListenerId(self.next());
        self.listeners.insert(listener, (id, event));
        listener
    }

    fn unlisten(&mut self, listener: ListenerId) {
        self.listeners.remove(&listener);
    }

    fn open_popup(&mut self, id: MarkerId, html: &str) {
        if self.markers.contains_key(&id) {
            self.popups.insert(id, html.to_string());
        }
    }

    fn close_popup(&mut self, id: MarkerId) {
        self.popups.remove(&id);
    }
}
