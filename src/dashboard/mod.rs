//! Dashboard chart widgets
//!
//! Builds Chart.js-compatible configurations for the AQI trend line and the pollutant
//! doughnut and hands them to a [`ChartSurface`]. Series arrive pre-computed; nothing is
//! aggregated here.

pub mod metrics;

use serde::Serialize;
use serde_json::{Value, json};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

use crate::Result;
use crate::models::ChartSeries;

pub use metrics::{Alert, AlertLevel, DashboardMetrics, ReadingStats, WorstStation};

pub const TREND_CANVAS: &str = "trendChart";
pub const POLLUTANT_CANVAS: &str = "pollutantChart";

const TREND_LINE_COLOR: &str = "#198754";
const TREND_FILL_COLOR: &str = "rgba(25, 135, 84, 0.1)";
const POLLUTANT_PALETTE: [&str; 5] = ["#ff6b6b", "#4ecdc4", "#45b7d1", "#96ceb4", "#feca57"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Doughnut,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Paint {
    Single(String),
    PerPoint(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub data: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    pub background_color: Paint,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tension: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

/// One chart widget in Chart.js configuration shape
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartConfig {
    #[serde(rename = "type")]
    pub kind: ChartKind,
    pub data: ChartData,
    pub options: Value,
}

impl ChartConfig {
    /// AQI trend as a filled, smoothed line
    #[must_use]
    pub fn trend(series: &ChartSeries) -> Self {
        Self {
            kind: ChartKind::Line,
            data: ChartData {
                labels: series.labels.clone(),
                datasets: vec![Dataset {
                    label: Some(series.name.clone()),
                    data: series.values.clone(),
                    border_color: Some(TREND_LINE_COLOR.to_string()),
                    background_color: Paint::Single(TREND_FILL_COLOR.to_string()),
                    tension: Some(0.4),
                    fill: Some(true),
                }],
            },
            options: json!({
                "responsive": true,
                "plugins": { "legend": { "display": false } },
                "scales": { "y": { "beginAtZero": false } }
            }),
        }
    }

    /// Pollutant breakdown as a doughnut; the palette repeats for long series
    #[must_use]
    pub fn pollutants(series: &ChartSeries) -> Self {
        let colors = POLLUTANT_PALETTE
            .iter()
            .cycle()
            .take(series.len())
            .map(|color| (*color).to_string())
            .collect();
        Self {
            kind: ChartKind::Doughnut,
            data: ChartData {
                labels: series.labels.clone(),
                datasets: vec![Dataset {
                    label: None,
                    data: series.values.clone(),
                    border_color: None,
                    background_color: Paint::PerPoint(colors),
                    tension: None,
                    fill: None,
                }],
            },
            options: json!({
                "responsive": true,
                "plugins": { "legend": { "position": "bottom" } }
            }),
        }
    }
}

/// The charting library as seen by the renderer
pub trait ChartSurface {
    fn has_canvas(&self, canvas_id: &str) -> bool;

    fn draw(&mut self, canvas_id: &str, config: &ChartConfig) -> Result<()>;
}

/// Collects chart configurations by canvas id, ready to be serialized for a page
#[derive(Debug, Clone)]
pub struct JsonChartSurface {
    canvases: BTreeSet<String>,
    charts: BTreeMap<String, ChartConfig>,
}

impl Default for JsonChartSurface {
    fn default() -> Self {
        Self::with_canvases([TREND_CANVAS, POLLUTANT_CANVAS])
    }
}

impl JsonChartSurface {
    pub fn with_canvases<I, S>(canvases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            canvases: canvases.into_iter().map(Into::into).collect(),
            charts: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn chart(&self, canvas_id: &str) -> Option<&ChartConfig> {
        self.charts.get(canvas_id)
    }

    #[must_use]
    pub fn charts(&self) -> &BTreeMap<String, ChartConfig> {
        &self.charts
    }
}

impl ChartSurface for JsonChartSurface {
    fn has_canvas(&self, canvas_id: &str) -> bool {
        self.canvases.contains(canvas_id)
    }

    fn draw(&mut self, canvas_id: &str, config: &ChartConfig) -> Result<()> {
        self.charts.insert(canvas_id.to_string(), config.clone());
        Ok(())
    }
}

pub struct DashboardRenderer<C: ChartSurface> {
    surface: C,
}

impl<C: ChartSurface> DashboardRenderer<C> {
    pub fn new(surface: C) -> Self {
        Self { surface }
    }

    /// Draw the AQI trend line. Returns `false` when the canvas is missing.
    pub fn render_trend(&mut self, series: &ChartSeries) -> Result<bool> {
        self.render(TREND_CANVAS, &ChartConfig::trend(series))
    }

    /// Draw the pollutant doughnut. Returns `false` when the canvas is missing.
    pub fn render_pollutants(&mut self, series: &ChartSeries) -> Result<bool> {
        self.render(POLLUTANT_CANVAS, &ChartConfig::pollutants(series))
    }

    fn render(&mut self, canvas_id: &str, config: &ChartConfig) -> Result<bool> {
        if !self.surface.has_canvas(canvas_id) {
            warn!("Chart canvas '{}' not found, skipping", canvas_id);
            return Ok(false);
        }
        self.surface.draw(canvas_id, config)?;
        debug!(
            "Drew {:?} chart on '{}' with {} points",
            config.kind,
            canvas_id,
            config.data.labels.len()
        );
        Ok(true)
    }

    #[must_use]
    pub fn surface(&self) -> &C {
        &self.surface
    }

    pub fn into_surface(self) -> C {
        self.surface
    }
}
