//! `aqiwatch` - Air-quality monitoring dashboard
//!
//! This library fetches station telemetry, classifies it on the AQI scale and
//! renders it as map markers, dashboard charts and station detail views.

pub mod api;
pub mod aqi;
pub mod config;
pub mod dashboard;
pub mod detail;
pub mod error;
pub mod filter;
pub mod logging;
pub mod map;
pub mod models;
pub mod repository;
pub mod telemetry;
pub mod web;

// Re-export core types for public API
pub use aqi::{AqiCategory, Severity, classify};
pub use config::AqiwatchConfig;
pub use dashboard::{DashboardMetrics, DashboardRenderer, JsonChartSurface};
pub use detail::{DetailState, HtmlDetailView, StationDetailPresenter};
pub use error::AqiwatchError;
pub use filter::{Parameter, StationFilter};
pub use map::{MapRenderer, SvgMapSurface};
pub use models::{ChartSeries, Coordinates, StationRecord};
pub use repository::{LoadOutcome, Snapshot, StationRepository};
pub use telemetry::{HttpTelemetrySource, SeedTelemetrySource, TelemetrySource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, AqiwatchError>;
