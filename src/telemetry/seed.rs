//! Static seed stations

use async_trait::async_trait;

use super::TelemetrySource;
use crate::Result;
use crate::models::StationRecord;

/// Serves a fixed station list
#[derive(Debug, Clone)]
pub struct SeedTelemetrySource {
    stations: Vec<StationRecord>,
}

impl Default for SeedTelemetrySource {
    fn default() -> Self {
        Self::new()
    }
}

impl SeedTelemetrySource {
    /// Seed with the built-in Amazon basin station set
    #[must_use]
    pub fn new() -> Self {
        Self {
            stations: seed_stations(),
        }
    }

    #[must_use]
    pub fn with_stations(stations: Vec<StationRecord>) -> Self {
        Self { stations }
    }
}

#[async_trait]
impl TelemetrySource for SeedTelemetrySource {
    async fn fetch(&self) -> Result<Vec<StationRecord>> {
        Ok(self.stations.clone())
    }

    fn describe(&self) -> String {
        format!("seed({} stations)", self.stations.len())
    }
}

fn station(
    name: &str,
    (latitude, longitude): (f64, f64),
    aqi: i64,
    (pm25, pm10, no2, o3): (f64, f64, f64, f64),
    (temperature, humidity): (f64, f64),
    last_update: &str,
) -> StationRecord {
    let mut record = StationRecord::new(name)
        .with_coordinates(latitude, longitude)
        .with_aqi(aqi)
        .with_pm25(pm25);
    record.pm10 = Some(pm10);
    record.no2 = Some(no2);
    record.o3 = Some(o3);
    record.temperature = Some(temperature);
    record.humidity = Some(humidity);
    record.last_update = last_update.to_string();
    record.source = Some("seed".to_string());
    record
}

/// Built-in stations
#[must_use]
pub fn seed_stations() -> Vec<StationRecord> {
    let mut offline = StationRecord::new("Tefé - Offline Sensor");
    offline.last_update = "N/A".to_string();
    offline.source = Some("seed".to_string());

    vec![
        station(
            "Manaus - Centro",
            (-3.1190, -60.0217),
            42,
            (10.2, 28.0, 18.0, 0.031),
            (31.5, 78.0),
            "2024-09-12 14:00",
        ),
        station(
            "Belém - Nazaré",
            (-1.4558, -48.4902),
            68,
            (21.4, 45.0, 22.0, 0.048),
            (30.1, 82.0),
            "2024-09-12 14:00",
        ),
        station(
            "Porto Velho - Industrial",
            (-8.7612, -63.9005),
            158,
            (68.3, 120.0, 35.0, 0.062),
            (34.2, 41.0),
            "2024-09-12 13:45",
        ),
        station(
            "Rio Branco - Bosque",
            (-9.9754, -67.8249),
            212,
            (162.0, 190.0, 28.0, 0.071),
            (33.8, 38.0),
            "2024-09-12 13:30",
        ),
        station(
            "Santarém - Orla",
            (-2.4430, -54.7081),
            115,
            (42.1, 70.0, 15.0, 0.052),
            (32.0, 70.0),
            "2024-09-12 14:00",
        ),
        offline,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seed_fetch_returns_all_stations() {
        let source = SeedTelemetrySource::new();
        let stations = source.fetch().await.unwrap();
        assert_eq!(stations.len(), seed_stations().len());
        assert_eq!(source.describe(), "seed(6 stations)");
    }

    #[test]
    fn test_seed_names_are_unique() {
        let stations = seed_stations();
        let names: std::collections::HashSet<_> = stations.iter().map(|s| &s.name).collect();
        assert_eq!(names.len(), stations.len());
    }

    #[test]
    fn test_seed_contains_unmapped_station() {
        let unmapped = seed_stations()
            .into_iter()
            .filter(|s| s.coordinates().is_none())
            .count();
        assert_eq!(unmapped, 1);
    }
}
