//! Data models for aqiwatch
//!
//! - Station: canonical station records and telemetry ingestion
//! - Series: labeled numeric series for chart widgets

pub mod series;
pub mod station;

pub use series::ChartSeries;
pub use station::{Coordinates, StationRecord, WireStation, derive_status, normalize};
