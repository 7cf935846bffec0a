//! Labeled numeric series fed to chart widgets

use serde::{Deserialize, Serialize};

/// Pre-computed chart input: one value per label
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChartSeries {
    /// Dataset label shown in legends and tooltips
    pub name: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartSeries {
    /// Build a series from parallel label and value lists.
    ///
    /// Extra labels or values beyond the shorter list are ignored.
    #[must_use]
    pub fn new<L, S>(name: impl Into<String>, labels: L, values: Vec<f64>) -> Self
    where
        L: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        let mut values = values;
        let len = labels.len().min(values.len());
        labels.truncate(len);
        values.truncate(len);
        Self {
            name: name.into(),
            labels,
            values,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Weekday AQI trend used when no live history is available
    #[must_use]
    pub fn mock_trend() -> Self {
        Self::new(
            "AQI",
            ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"],
            vec![65.0, 59.0, 80.0, 81.0, 56.0, 55.0, 68.0],
        )
    }

    /// Pollutant share breakdown used when no live data is available
    #[must_use]
    pub fn mock_pollutants() -> Self {
        Self::new(
            "Pollutants",
            ["PM2.5", "PM10", "NO₂", "O₃", "CO₂"],
            vec![30.0, 25.0, 20.0, 15.0, 10.0],
        )
    }
}
