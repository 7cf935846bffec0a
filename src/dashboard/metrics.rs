//! Headline numbers for the dashboard cards

use serde::Serialize;
use std::collections::BTreeMap;

use crate::aqi::{self, Severity};
use crate::models::StationRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorstStation {
    pub name: String,
    pub aqi: i64,
    pub severity: Severity,
}

/// PM2.5 above this is outside the safe range, in µg/m³
pub const PM25_ALERT_THRESHOLD: f64 = 35.0;
/// AQI above this is unhealthy
pub const AQI_ALERT_THRESHOLD: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Warning,
    Danger,
}

/// Stations over a safety threshold
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub level: AlertLevel,
    pub message: String,
    pub stations: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReadingStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl ReadingStats {
    /// `None` when there are no finite values
    #[must_use]
    pub fn from_values<I: IntoIterator<Item = f64>>(values: I) -> Option<Self> {
        let values: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
        if values.is_empty() {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        Some(Self {
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            mean,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardMetrics {
    pub station_count: usize,
    /// Stations that can be placed on the map
    pub mapped_count: usize,
    /// Mean AQI over stations that report a valid one
    pub average_aqi: Option<f64>,
    pub worst: Option<WorstStation>,
    pub by_severity: BTreeMap<Severity, usize>,
    pub pm25: Option<ReadingStats>,
    pub alerts: Vec<Alert>,
}

impl DashboardMetrics {
    #[must_use]
    pub fn from_stations(stations: &[StationRecord]) -> Self {
        let valid: Vec<(&StationRecord, i64)> = stations
            .iter()
            .filter_map(|station| {
                station
                    .aqi
                    .filter(|aqi| *aqi >= 0)
                    .map(|aqi| (station, aqi))
            })
            .collect();

        #[allow(clippy::cast_precision_loss)]
        let average_aqi = (!valid.is_empty())
            .then(|| valid.iter().map(|(_, aqi)| *aqi as f64).sum::<f64>() / valid.len() as f64);

        // First station wins ties so the result is stable across refreshes
        let worst = valid
            .iter()
            .fold(None::<(&StationRecord, i64)>, |worst, &(station, aqi)| match worst {
                Some((_, current)) if current >= aqi => worst,
                _ => Some((station, aqi)),
            })
            .map(|(station, aqi)| WorstStation {
                name: station.name.clone(),
                aqi,
                severity: aqi::severity(Some(aqi)),
            });

        let mut by_severity = BTreeMap::new();
        for station in stations {
            *by_severity.entry(aqi::severity(station.aqi)).or_insert(0) += 1;
        }

        Self {
            station_count: stations.len(),
            mapped_count: stations
                .iter()
                .filter(|station| station.coordinates().is_some())
                .count(),
            average_aqi,
            worst,
            by_severity,
            pm25: ReadingStats::from_values(stations.iter().filter_map(|station| station.pm25)),
            alerts: alerts(stations),
        }
    }
}

fn alerts(stations: &[StationRecord]) -> Vec<Alert> {
    let high_pm25: Vec<String> = stations
        .iter()
        .filter(|station| station.pm25.is_some_and(|pm25| pm25 > PM25_ALERT_THRESHOLD))
        .map(|station| station.name.clone())
        .collect();
    let high_aqi: Vec<String> = stations
        .iter()
        .filter(|station| station.aqi.is_some_and(|aqi| aqi > AQI_ALERT_THRESHOLD))
        .map(|station| station.name.clone())
        .collect();

    let mut alerts = Vec::new();
    if !high_pm25.is_empty() {
        alerts.push(Alert {
            level: AlertLevel::Warning,
            message: format!(
                "{} stations with PM2.5 above the safe limit ({PM25_ALERT_THRESHOLD} µg/m³)",
                high_pm25.len()
            ),
            stations: high_pm25,
        });
    }
    if !high_aqi.is_empty() {
        alerts.push(Alert {
            level: AlertLevel::Danger,
            message: format!(
                "{} stations with AQI above {AQI_ALERT_THRESHOLD} (unhealthy)",
                high_aqi.len()
            ),
            stations: high_aqi,
        });
    }
    alerts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_over_mixed_stations() {
        let stations = vec![
            StationRecord::new("A").with_coordinates(1.0, 1.0).with_aqi(40),
            StationRecord::new("B").with_coordinates(2.0, 2.0).with_aqi(160),
            StationRecord::new("C").with_aqi(160),
            StationRecord::new("D"),
        ];
        let metrics = DashboardMetrics::from_stations(&stations);

        assert_eq!(metrics.station_count, 4);
        assert_eq!(metrics.mapped_count, 2);
        assert_eq!(metrics.average_aqi, Some(120.0));
        let worst = metrics.worst.unwrap();
        assert_eq!(worst.name, "B");
        assert_eq!(worst.severity, Severity::Unhealthy);
        assert_eq!(metrics.by_severity[&Severity::Unhealthy], 2);
        assert_eq!(metrics.by_severity[&Severity::Unknown], 1);
    }

    #[test]
    fn test_alerts_and_pm25_stats() {
        let stations = vec![
            StationRecord::new("Clean").with_aqi(30).with_pm25(8.0),
            StationRecord::new("Smoky").with_aqi(160).with_pm25(68.0),
            StationRecord::new("Dusty").with_aqi(90).with_pm25(40.0),
            StationRecord::new("Edge").with_aqi(100).with_pm25(35.0),
        ];
        let metrics = DashboardMetrics::from_stations(&stations);

        let pm25 = metrics.pm25.unwrap();
        assert_eq!(pm25.min, 8.0);
        assert_eq!(pm25.max, 68.0);
        assert_eq!(pm25.mean, 37.75);

        assert_eq!(metrics.alerts.len(), 2);
        assert_eq!(metrics.alerts[0].level, AlertLevel::Warning);
        assert_eq!(metrics.alerts[0].stations, ["Smoky", "Dusty"]);
        assert!(metrics.alerts[0].message.starts_with("2 stations"));
        assert_eq!(metrics.alerts[1].level, AlertLevel::Danger);
        assert_eq!(metrics.alerts[1].stations, ["Smoky"]);
    }

    #[test]
    fn test_no_alerts_for_clean_air() {
        let metrics =
            DashboardMetrics::from_stations(&[StationRecord::new("A").with_aqi(20).with_pm25(5.0)]);
        assert!(metrics.alerts.is_empty());
        let value = serde_json::to_value(&metrics).unwrap();
        assert_eq!(value["pm25"]["max"], 5.0);
    }

    #[test]
    fn test_metrics_without_aqi() {
        let metrics = DashboardMetrics::from_stations(&[StationRecord::new("A")]);
        assert_eq!(metrics.average_aqi, None);
        assert!(metrics.pm25.is_none());
        assert!(metrics.worst.is_none());
    }

    #[test]
    fn test_metrics_serialize_severity_keys() {
        let metrics =
            DashboardMetrics::from_stations(&[StationRecord::new("A").with_aqi(10)]);
        let value = serde_json::to_value(&metrics).unwrap();
        assert_eq!(value["by_severity"]["good"], 1);
    }
}
