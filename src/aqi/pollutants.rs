//! AQI computation from raw pollutant concentrations
//!
//! Each pollutant is converted to a sub-index by linear interpolation over the US EPA
//! breakpoint table; the station AQI is the worst sub-index.

use serde::{Deserialize, Serialize};

/// (concentration low, concentration high, index low, index high)
type Breakpoint = (f64, f64, f64, f64);

/// PM2.5 in µg/m³
const PM25_BREAKPOINTS: [Breakpoint; 6] = [
    (0.0, 12.0, 0.0, 50.0),
    (12.1, 35.4, 51.0, 100.0),
    (35.5, 55.4, 101.0, 150.0),
    (55.5, 150.4, 151.0, 200.0),
    (150.5, 250.4, 201.0, 300.0),
    (250.5, 500.4, 301.0, 500.0),
];

/// PM10 in µg/m³
const PM10_BREAKPOINTS: [Breakpoint; 6] = [
    (0.0, 54.0, 0.0, 50.0),
    (55.0, 154.0, 51.0, 100.0),
    (155.0, 254.0, 101.0, 150.0),
    (255.0, 354.0, 151.0, 200.0),
    (355.0, 424.0, 201.0, 300.0),
    (425.0, 604.0, 301.0, 500.0),
];

/// NO2 in ppm
const NO2_BREAKPOINTS: [Breakpoint; 6] = [
    (0.0, 0.053, 0.0, 50.0),
    (0.054, 0.100, 51.0, 100.0),
    (0.101, 0.360, 101.0, 150.0),
    (0.361, 0.649, 151.0, 200.0),
    (0.650, 1.249, 201.0, 300.0),
    (1.250, 2.049, 301.0, 500.0),
];

/// O3 in ppm
const O3_BREAKPOINTS: [Breakpoint; 6] = [
    (0.0, 0.059, 0.0, 50.0),
    (0.060, 0.075, 51.0, 100.0),
    (0.076, 0.095, 101.0, 150.0),
    (0.096, 0.115, 151.0, 200.0),
    (0.116, 0.374, 201.0, 300.0),
    (0.375, 0.604, 301.0, 500.0),
];

/// Raw measurements available for one station
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PollutantReadings {
    pub pm25: Option<f64>,
    pub pm10: Option<f64>,
    pub no2: Option<f64>,
    pub o3: Option<f64>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
}

/// Index reported for concentrations beyond the last band
const MAX_INDEX: f64 = 500.0;

fn sub_index(concentration: f64, table: &[Breakpoint]) -> Option<f64> {
    if !concentration.is_finite() || concentration < 0.0 {
        return None;
    }
    let position = table
        .iter()
        .rposition(|(low, _, _, _)| *low <= concentration)?;
    let (low, high, index_low, index_high) = table[position];

    if concentration <= high {
        Some((index_high - index_low) / (high - low) * (concentration - low) + index_low)
    } else if position + 1 < table.len() {
        // Between two bands: the lower band's top index
        Some(index_high)
    } else {
        Some(MAX_INDEX)
    }
}

pub fn pm25_index(concentration: f64) -> Option<f64> {
    sub_index(concentration, &PM25_BREAKPOINTS)
}

pub fn pm10_index(concentration: f64) -> Option<f64> {
    sub_index(concentration, &PM10_BREAKPOINTS)
}

/// NO2 sub-index. Values above 1 are assumed to be ppb and converted to ppm.
pub fn no2_index(concentration: f64) -> Option<f64> {
    let ppm = if concentration > 1.0 {
        concentration / 1000.0
    } else {
        concentration
    };
    sub_index(ppm, &NO2_BREAKPOINTS)
}

pub fn o3_index(concentration: f64) -> Option<f64> {
    sub_index(concentration, &O3_BREAKPOINTS)
}

/// Rough index from weather alone, used only when no pollutant was measured
fn weather_proxy(temperature: Option<f64>, humidity: Option<f64>) -> Option<f64> {
    if temperature.is_none() && humidity.is_none() {
        return None;
    }
    let mut index = 50.0;
    if let Some(t) = temperature.filter(|t| *t > 30.0) {
        index += (t - 30.0) * 2.0;
    }
    if humidity.is_some_and(|h| !(30.0..=80.0).contains(&h)) {
        index += 10.0;
    }
    Some(f64::min(index, 100.0))
}

/// Compute the station AQI from its readings.
///
/// Returns the highest pollutant sub-index; falls back to a weather proxy when no
/// pollutant is present and to `None` when there is nothing to go on.
#[must_use]
pub fn aqi_from_readings(readings: &PollutantReadings) -> Option<f64> {
    let components = [
        readings.pm25.and_then(pm25_index),
        readings.pm10.and_then(pm10_index),
        readings.no2.and_then(no2_index),
        readings.o3.and_then(o3_index),
    ];

    let worst = components.into_iter().flatten().reduce(f64::max);
    let any_pollutant = readings.pm25.is_some()
        || readings.pm10.is_some()
        || readings.no2.is_some()
        || readings.o3.is_some();

    match worst {
        Some(index) => Some(index),
        None if !any_pollutant => weather_proxy(readings.temperature, readings.humidity),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 0.01
    }

    #[rstest]
    #[case(0.0, 0.0)]
    #[case(12.0, 50.0)]
    #[case(35.4, 100.0)]
    #[case(55.5, 151.0)]
    fn test_pm25_breakpoints(#[case] concentration: f64, #[case] expected: f64) {
        let index = pm25_index(concentration).unwrap();
        assert!(approx(index, expected), "{concentration} -> {index}");
    }

    #[test]
    fn test_concentration_between_bands_keeps_lower_band() {
        assert_eq!(pm25_index(12.05), Some(50.0));
        assert_eq!(pm10_index(154.5), Some(100.0));
        assert_eq!(o3_index(0.0595), Some(50.0));
    }

    #[test]
    fn test_concentration_above_table_saturates() {
        assert_eq!(pm25_index(600.0), Some(500.0));
        assert_eq!(pm10_index(10_000.0), Some(500.0));
        assert_eq!(no2_index(2500.0), Some(500.0));
    }

    #[test]
    fn test_hazardous_pollutant_dominates_clean_one() {
        let readings = PollutantReadings {
            pm25: Some(600.0),
            pm10: Some(20.0),
            ..Default::default()
        };
        assert_eq!(aqi_from_readings(&readings), Some(500.0));
    }

    #[test]
    fn test_negative_or_non_finite_concentration_contributes_nothing() {
        assert_eq!(pm10_index(-1.0), None);
        assert_eq!(pm25_index(f64::NAN), None);
    }

    #[test]
    fn test_no2_ppb_is_converted() {
        let from_ppb = no2_index(53.0).unwrap();
        let from_ppm = no2_index(0.053).unwrap();
        assert!(approx(from_ppb, from_ppm));
        assert!(approx(from_ppm, 50.0));
    }

    #[test]
    fn test_worst_sub_index_wins() {
        let readings = PollutantReadings {
            pm25: Some(10.0),
            pm10: Some(200.0),
            o3: Some(0.03),
            ..Default::default()
        };
        let aqi = aqi_from_readings(&readings).unwrap();
        assert!(approx(aqi, pm10_index(200.0).unwrap()));
        assert!(aqi > 100.0);
    }

    #[test]
    fn test_weather_proxy_when_no_pollutants() {
        let hot_and_dry = PollutantReadings {
            temperature: Some(35.0),
            humidity: Some(20.0),
            ..Default::default()
        };
        assert_eq!(aqi_from_readings(&hot_and_dry), Some(70.0));

        let scorching = PollutantReadings {
            temperature: Some(60.0),
            ..Default::default()
        };
        assert_eq!(aqi_from_readings(&scorching), Some(100.0));
    }

    #[test]
    fn test_nothing_usable_is_none() {
        assert_eq!(aqi_from_readings(&PollutantReadings::default()), None);

        let unusable_pollutant = PollutantReadings {
            pm25: Some(-3.0),
            temperature: Some(25.0),
            ..Default::default()
        };
        assert_eq!(aqi_from_readings(&unusable_pollutant), None);
    }
}
