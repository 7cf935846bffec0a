//! Station detail view
//!
//! Looks a station up by name and turns it into a [`DetailState`] for the modal: all
//! pollutant and weather readings plus the recommendation for its AQI. Unknown names
//! produce [`DetailState::NotFound`] instead of an error.

use chrono::{DateTime, Utc};
use maud::html;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::aqi::{self, Severity};
use crate::models::{Coordinates, StationRecord};
use crate::repository::StationRepository;

/// One labeled measurement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub label: &'static str,
    pub value: Option<f64>,
    pub unit: &'static str,
}

impl Reading {
    fn new(label: &'static str, value: Option<f64>, unit: &'static str) -> Self {
        Self { label, value, unit }
    }

    #[must_use]
    pub fn display(&self) -> String {
        match self.value {
            Some(value) if self.unit.is_empty() => format!("{value:.1}"),
            Some(value) => format!("{value:.1} {}", self.unit),
            None => "N/A".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationDetail {
    pub name: String,
    pub status: String,
    pub aqi: Option<i64>,
    pub severity: Severity,
    pub color: &'static str,
    pub recommendation: &'static str,
    /// AQI recomputed from the raw pollutant readings, when they allow it
    pub computed_aqi: Option<f64>,
    pub coordinates: Option<Coordinates>,
    pub last_update: String,
    pub pollutants: Vec<Reading>,
    pub weather: Vec<Reading>,
}

impl StationDetail {
    #[must_use]
    pub fn from_record(station: &StationRecord) -> Self {
        let category = aqi::classify(station.aqi);
        Self {
            name: station.name.clone(),
            status: station.status.clone(),
            aqi: station.aqi,
            severity: category.severity,
            color: category.color,
            recommendation: category.recommendation,
            computed_aqi: aqi::aqi_from_readings(&station.readings()),
            coordinates: station.coordinates(),
            last_update: station.last_update.clone(),
            pollutants: vec![
                Reading::new("PM2.5", station.pm25, "µg/m³"),
                Reading::new("PM10", station.pm10, "µg/m³"),
                Reading::new("NO₂", station.no2, "ppm"),
                Reading::new("O₃", station.o3, "ppm"),
                Reading::new("SO₂", station.so2, "ppm"),
                Reading::new("CO", station.co, "ppm"),
            ],
            weather: vec![
                Reading::new("Temperature", station.temperature, "°C"),
                Reading::new("Humidity", station.humidity, "%"),
                Reading::new("Pressure", station.pressure, "hPa"),
            ],
        }
    }
}

/// What the detail modal should show
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DetailState {
    Found(StationDetail),
    NotFound { name: String },
}

impl DetailState {
    #[must_use]
    pub fn lookup(name: &str, station: Option<&StationRecord>) -> Self {
        match station {
            Some(station) => DetailState::Found(StationDetail::from_record(station)),
            None => DetailState::NotFound {
                name: name.to_string(),
            },
        }
    }

    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, DetailState::Found(_))
    }

    /// Modal body as an HTML fragment
    #[must_use]
    pub fn to_html(&self) -> String {
        let markup = match self {
            DetailState::NotFound { name } => html! {
                div class="station-detail not-found" {
                    h5 { "Station not found" }
                    p { "No data is available for \"" (name) "\"." }
                }
            },
            DetailState::Found(detail) => {
                let aqi = detail
                    .aqi
                    .map_or_else(|| "N/A".to_string(), |value| value.to_string());
                html! {
                    div class="station-detail" {
                        h5 { (detail.name) }
                        p {
                            span class="badge" style=(format!("background-color: {}", detail.color)) {
                                "AQI " (aqi)
                            }
                            " " (detail.status)
                        }
                        h6 { "Pollutants" }
                        table class="readings" {
                            @for reading in &detail.pollutants {
                                tr { th { (reading.label) } td { (reading.display()) } }
                            }
                        }
                        h6 { "Weather" }
                        table class="readings" {
                            @for reading in &detail.weather {
                                tr { th { (reading.label) } td { (reading.display()) } }
                            }
                        }
                        p class="recommendation" { (detail.recommendation) }
                        p class="last-update" { "Last update: " (detail.last_update) }
                    }
                }
            }
        };
        markup.into_string()
    }
}

/// The modal framework as seen by the presenter
pub trait DetailView {
    fn has_container(&self) -> bool;

    fn present(&mut self, state: &DetailState);
}

/// Keeps the last presented fragment as HTML
#[derive(Debug, Clone)]
pub struct HtmlDetailView {
    container: bool,
    html: Option<String>,
}

impl Default for HtmlDetailView {
    fn default() -> Self {
        Self {
            container: true,
            html: None,
        }
    }
}

impl HtmlDetailView {
    #[must_use]
    pub fn detached() -> Self {
        Self {
            container: false,
            html: None,
        }
    }

    #[must_use]
    pub fn html(&self) -> Option<&str> {
        self.html.as_deref()
    }
}

impl DetailView for HtmlDetailView {
    fn has_container(&self) -> bool {
        self.container
    }

    fn present(&mut self, state: &DetailState) {
        self.html = Some(state.to_html());
    }
}

/// Acknowledgement of a "generate report" action; no document is produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRequest {
    pub station: String,
    pub requested_at: DateTime<Utc>,
    pub message: String,
}

pub struct StationDetailPresenter<V: DetailView> {
    repository: Arc<StationRepository>,
    view: V,
}

impl<V: DetailView> StationDetailPresenter<V> {
    pub fn new(repository: Arc<StationRepository>, view: V) -> Self {
        Self { repository, view }
    }

    /// Present the detail view for a station
    pub fn show(&mut self, name: &str) -> DetailState {
        let station = self.repository.get(name);
        let state = DetailState::lookup(name, station.as_ref());

        if !state.is_found() {
            info!("Detail requested for unknown station '{}'", name);
        }

        if self.view.has_container() {
            self.view.present(&state);
        } else {
            warn!("Detail container not found, not presenting '{}'", name);
        }

        state
    }

    /// Acknowledge a report request for a known station
    pub fn generate_report(&self, name: &str) -> Option<ReportRequest> {
        let station = self.repository.get(name)?;
        info!("Report requested for '{}'", station.name);
        Some(ReportRequest {
            message: format!("Report for {} has been queued", station.name),
            station: station.name,
            requested_at: Utc::now(),
        })
    }

    #[must_use]
    pub fn view(&self) -> &V {
        &self.view
    }
}
