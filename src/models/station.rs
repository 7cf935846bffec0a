//! Station model and telemetry ingestion
//!
//! The telemetry endpoint is inconsistent about field names (`location` vs `name`) and
//! sends AQI as a float. Everything is normalized here into [`StationRecord`], the only
//! station type the rest of the crate sees.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::aqi::PollutantReadings;

/// Geographic position of a station
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinates {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

impl Coordinates {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Format as coordinates string
    #[must_use]
    pub fn format(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Canonical station record, immutable once ingested
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct StationRecord {
    /// Unique station name
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Air Quality Index; negative values are kept and classify as unknown
    pub aqi: Option<i64>,
    /// PM2.5 in µg/m³
    pub pm25: Option<f64>,
    /// PM10 in µg/m³
    pub pm10: Option<f64>,
    pub no2: Option<f64>,
    pub o3: Option<f64>,
    pub so2: Option<f64>,
    pub co: Option<f64>,
    /// Temperature in Celsius
    pub temperature: Option<f64>,
    /// Relative humidity in percent
    pub humidity: Option<f64>,
    /// Pressure in hPa
    pub pressure: Option<f64>,
    /// Display string for the last measurement time
    pub last_update: String,
    pub status: String,
    pub source: Option<String>,
}

impl StationRecord {
    /// Create a station with only a name; the status is derived from the missing AQI
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: derive_status(None).to_string(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    /// Set the AQI and re-derive the status label
    #[must_use]
    pub fn with_aqi(mut self, aqi: i64) -> Self {
        self.aqi = Some(aqi);
        self.status = derive_status(self.aqi).to_string();
        self
    }

    #[must_use]
    pub fn with_pm25(mut self, pm25: f64) -> Self {
        self.pm25 = Some(pm25);
        self
    }

    /// Both coordinates, if present and inside the valid lat/lng range
    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        let coordinates = Coordinates {
            latitude: self.latitude?,
            longitude: self.longitude?,
        };
        coordinates.is_valid().then_some(coordinates)
    }

    #[must_use]
    pub fn readings(&self) -> PollutantReadings {
        PollutantReadings {
            pm25: self.pm25,
            pm10: self.pm10,
            no2: self.no2,
            o3: self.o3,
            temperature: self.temperature,
            humidity: self.humidity,
        }
    }
}

/// Coarse three-level label used when the endpoint does not send a status
#[must_use]
pub fn derive_status(aqi: Option<i64>) -> &'static str {
    match aqi {
        Some(value) if value > 100 => "Unhealthy",
        Some(value) if value > 50 => "Moderate",
        _ => "Good",
    }
}

/// Station object as sent by the telemetry endpoint
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct WireStation {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub longitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub aqi: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub pm25: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub pm10: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub no2: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub o3: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub so2: Option<f64>,
    #[serde(default, alias = "co2", deserialize_with = "lenient_number")]
    pub co: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub temperature: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub humidity: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub pressure: Option<f64>,
    #[serde(default, alias = "lastUpdate", alias = "timestamp")]
    pub last_update: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

/// Accept a JSON number or numeric string; anything else becomes `None` so one bad
/// reading never rejects the whole station array
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let number = match &value {
        Value::Null => return Ok(None),
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|number| number.is_finite());

    if number.is_none() {
        warn!("Ignoring non-numeric telemetry value {}", value);
    }
    Ok(number)
}

impl WireStation {
    /// Canonical name: `name` wins over `location` when both are sent
    fn canonical_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .or(self.location.as_deref())
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// Normalize into a [`StationRecord`]; `None` when the station has no usable name
    #[must_use]
    pub fn into_record(self) -> Option<StationRecord> {
        let name = self.canonical_name()?.to_string();
        #[allow(clippy::cast_possible_truncation)]
        let aqi = self
            .aqi
            .filter(|value| value.is_finite())
            .map(|value| value.round() as i64);
        let status = self
            .status
            .filter(|status| !status.trim().is_empty())
            .unwrap_or_else(|| derive_status(aqi).to_string());

        Some(StationRecord {
            name,
            latitude: self.latitude,
            longitude: self.longitude,
            aqi,
            pm25: self.pm25,
            pm10: self.pm10,
            no2: self.no2,
            o3: self.o3,
            so2: self.so2,
            co: self.co,
            temperature: self.temperature,
            humidity: self.humidity,
            pressure: self.pressure,
            last_update: self.last_update.unwrap_or_else(|| "N/A".to_string()),
            status,
            source: self.source,
        })
    }
}

/// Normalize a batch of wire stations.
///
/// Nameless entries are dropped and, for duplicate names, the first entry is kept
/// (the endpoint orders newest first).
#[must_use]
pub fn normalize(stations: Vec<WireStation>) -> Vec<StationRecord> {
    let mut seen = std::collections::HashSet::new();
    let mut records = Vec::with_capacity(stations.len());

    for station in stations {
        let Some(record) = station.into_record() else {
            warn!("Dropping telemetry entry without a station name");
            continue;
        };
        if seen.insert(record.name.clone()) {
            records.push(record);
        } else {
            warn!("Dropping duplicate telemetry entry for '{}'", record.name);
        }
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Vec<StationRecord> {
        normalize(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_location_field_is_normalized_to_name() {
        let records = parse(
            r#"[{"location": "Manaus", "latitude": -3.119, "longitude": -60.0217, "aqi": 42.6, "pm25": 10.2, "status": "Boa"}]"#,
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Manaus");
        assert_eq!(records[0].aqi, Some(43));
        assert_eq!(records[0].status, "Boa");
    }

    #[test]
    fn test_name_wins_over_location() {
        let records = parse(r#"[{"name": "Belém Centro", "location": "Belém"}]"#);
        assert_eq!(records[0].name, "Belém Centro");
    }

    #[test]
    fn test_missing_status_is_derived() {
        let records = parse(
            r#"[{"name": "A", "aqi": 30}, {"name": "B", "aqi": 75}, {"name": "C", "aqi": 101}, {"name": "D"}]"#,
        );
        let statuses: Vec<_> = records.iter().map(|r| r.status.as_str()).collect();
        assert_eq!(statuses, ["Good", "Moderate", "Unhealthy", "Good"]);
    }

    #[test]
    fn test_nameless_and_duplicate_entries_are_dropped() {
        let records = parse(
            r#"[{"name": "A", "aqi": 10}, {"latitude": 1.0}, {"location": "  "}, {"location": "A", "aqi": 99}]"#,
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].aqi, Some(10));
    }

    #[test]
    fn test_coordinates_require_both_values() {
        let full = StationRecord::new("A").with_coordinates(1.0, 1.0);
        assert!(full.coordinates().is_some());

        let mut half = StationRecord::new("B");
        half.latitude = Some(1.0);
        assert!(half.coordinates().is_none());

        let out_of_range = StationRecord::new("C").with_coordinates(95.0, 10.0);
        assert!(out_of_range.coordinates().is_none());
    }

    #[test]
    fn test_non_numeric_values_become_unknown() {
        let records = parse(
            r#"[{"name": "A", "aqi": "N/A", "latitude": "1.5", "longitude": 1.0, "pm25": true},
                {"name": "B", "aqi": 30, "latitude": "north", "longitude": null},
                {"name": "C", "aqi": " 42 "}]"#,
        );
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].aqi, None);
        assert_eq!(records[0].status, "Good");
        assert_eq!(records[0].pm25, None);
        assert_eq!(records[0].latitude, Some(1.5));
        assert!(records[0].coordinates().is_some());

        assert_eq!(records[1].aqi, Some(30));
        assert!(records[1].coordinates().is_none());

        assert_eq!(records[2].aqi, Some(42));
    }

    #[test]
    fn test_with_aqi_rederives_status() {
        let station = StationRecord::new("A").with_aqi(150);
        assert_eq!(station.status, "Unhealthy");
    }
}
