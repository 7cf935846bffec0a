//! Region and parameter selection for the station views

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::AqiwatchError;
use crate::models::StationRecord;

/// Reading shown as a station's headline value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parameter {
    #[default]
    Aqi,
    Pm25,
    Pm10,
    No2,
    O3,
}

impl Parameter {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Parameter::Aqi => "AQI",
            Parameter::Pm25 => "PM2.5",
            Parameter::Pm10 => "PM10",
            Parameter::No2 => "NO₂",
            Parameter::O3 => "O₃",
        }
    }

    #[must_use]
    pub fn unit(self) -> &'static str {
        match self {
            Parameter::Aqi => "",
            Parameter::Pm25 | Parameter::Pm10 => "µg/m³",
            Parameter::No2 | Parameter::O3 => "ppm",
        }
    }

    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn value(self, station: &StationRecord) -> Option<f64> {
        match self {
            Parameter::Aqi => station.aqi.map(|aqi| aqi as f64),
            Parameter::Pm25 => station.pm25,
            Parameter::Pm10 => station.pm10,
            Parameter::No2 => station.no2,
            Parameter::O3 => station.o3,
        }
    }
}

impl FromStr for Parameter {
    type Err = AqiwatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['.', '_'], "").as_str() {
            "aqi" => Ok(Parameter::Aqi),
            "pm25" => Ok(Parameter::Pm25),
            "pm10" => Ok(Parameter::Pm10),
            "no2" => Ok(Parameter::No2),
            "o3" => Ok(Parameter::O3),
            other => Err(AqiwatchError::config(format!(
                "Unknown parameter '{other}'. Expected one of: aqi, pm25, pm10, no2, o3"
            ))),
        }
    }
}

/// Current values of the region and parameter selects
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StationFilter {
    /// Case-insensitive substring of the station name; `None` or empty matches all
    pub region: Option<String>,
    #[serde(default)]
    pub parameter: Parameter,
}

impl StationFilter {
    #[must_use]
    pub fn matches(&self, station: &StationRecord) -> bool {
        match self.region.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(region) => station
                .name
                .to_lowercase()
                .contains(&region.to_lowercase()),
        }
    }

    /// Stations inside the selected region, in their original order
    #[must_use]
    pub fn apply(&self, stations: &[StationRecord]) -> Vec<StationRecord> {
        stations
            .iter()
            .filter(|station| self.matches(station))
            .cloned()
            .collect()
    }

    /// Headline value of a station for the selected parameter, formatted for display
    #[must_use]
    pub fn headline(&self, station: &StationRecord) -> String {
        match self.parameter.value(station) {
            None => format!("{}: N/A", self.parameter.label()),
            Some(value) if self.parameter == Parameter::Aqi => {
                format!("{}: {value:.0}", self.parameter.label())
            }
            Some(value) => format!(
                "{}: {value:.2} {}",
                self.parameter.label(),
                self.parameter.unit()
            ),
        }
    }
}
