//! AQI classification
//!
//! Maps an Air Quality Index value onto one of the six US EPA severity tiers, with the
//! display color and health recommendation used by the map markers and detail views.

pub mod pollutants;

pub use pollutants::{PollutantReadings, aqi_from_readings};

use serde::{Deserialize, Serialize};

/// Severity tier of an AQI value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Unknown,
    Good,
    Moderate,
    UnhealthyForSensitiveGroups,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

/// Shared wording tiers; several severities recommend the same thing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advice {
    NoData,
    Safe,
    SensitiveCaution,
    GeneralCaution,
    AvoidExposure,
}

/// Result of classifying an AQI value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AqiCategory {
    pub severity: Severity,
    /// Hex color used to fill markers and badges
    pub color: &'static str,
    pub recommendation: &'static str,
}

pub const UNKNOWN_COLOR: &str = "#9e9e9e";

/// Upper bound (inclusive) of each tier in ascending order; anything above the
/// last bound is hazardous.
const BREAKPOINTS: [(i64, Severity); 5] = [
    (50, Severity::Good),
    (100, Severity::Moderate),
    (150, Severity::UnhealthyForSensitiveGroups),
    (200, Severity::Unhealthy),
    (300, Severity::VeryUnhealthy),
];

impl Severity {
    /// All tiers in ascending order, unknown first
    pub const ALL: [Severity; 7] = [
        Severity::Unknown,
        Severity::Good,
        Severity::Moderate,
        Severity::UnhealthyForSensitiveGroups,
        Severity::Unhealthy,
        Severity::VeryUnhealthy,
        Severity::Hazardous,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Severity::Unknown => "unknown",
            Severity::Good => "good",
            Severity::Moderate => "moderate",
            Severity::UnhealthyForSensitiveGroups => "unhealthy for sensitive groups",
            Severity::Unhealthy => "unhealthy",
            Severity::VeryUnhealthy => "very unhealthy",
            Severity::Hazardous => "hazardous",
        }
    }

    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            Severity::Unknown => UNKNOWN_COLOR,
            Severity::Good => "#00e400",
            Severity::Moderate => "#ffff00",
            Severity::UnhealthyForSensitiveGroups => "#ff7e00",
            Severity::Unhealthy => "#ff0000",
            Severity::VeryUnhealthy => "#8f3f97",
            Severity::Hazardous => "#7e0023",
        }
    }

    #[must_use]
    pub fn advice(self) -> Advice {
        match self {
            Severity::Unknown => Advice::NoData,
            Severity::Good | Severity::Moderate => Advice::Safe,
            Severity::UnhealthyForSensitiveGroups => Advice::SensitiveCaution,
            Severity::Unhealthy => Advice::GeneralCaution,
            Severity::VeryUnhealthy | Severity::Hazardous => Advice::AvoidExposure,
        }
    }
}

impl Advice {
    #[must_use]
    pub fn text(self) -> &'static str {
        match self {
            Advice::NoData => "No data available",
            Advice::Safe => "Air quality is acceptable. Outdoor activities are safe.",
            Advice::SensitiveCaution => {
                "Sensitive groups (children, elderly, people with respiratory conditions) should reduce prolonged outdoor exertion."
            }
            Advice::GeneralCaution => {
                "Everyone should limit prolonged outdoor exertion; sensitive groups should stay indoors."
            }
            Advice::AvoidExposure => {
                "Avoid outdoor exposure. Keep windows closed and use air filtration if available."
            }
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Map an AQI value to its severity tier.
///
/// Missing and negative values are malformed source data and classify as
/// [`Severity::Unknown`]; nothing is extrapolated below zero.
#[must_use]
pub fn severity(aqi: Option<i64>) -> Severity {
    match aqi {
        Some(value) if value >= 0 => BREAKPOINTS
            .iter()
            .find(|(upper, _)| value <= *upper)
            .map_or(Severity::Hazardous, |(_, severity)| *severity),
        _ => Severity::Unknown,
    }
}

/// Classify an AQI value into severity, display color and recommendation
#[must_use]
pub fn classify(aqi: Option<i64>) -> AqiCategory {
    let severity = severity(aqi);
    AqiCategory {
        severity,
        color: severity.color(),
        recommendation: severity.advice().text(),
    }
}
