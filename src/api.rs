//! HTTP API serving station telemetry and rendered views

use axum::{
    Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Json},
    routing::get,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::error;

use crate::config::MapConfig;
use crate::dashboard::{ChartConfig, DashboardMetrics, DashboardRenderer, JsonChartSurface};
use crate::detail::DetailState;
use crate::filter::StationFilter;
use crate::map::{MapRenderer, SvgMapSurface};
use crate::models::{ChartSeries, StationRecord};
use crate::repository::StationRepository;

const MAP_WIDTH: u32 = 960;
const MAP_HEIGHT: u32 = 640;

#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<StationRepository>,
    pub map: MapConfig,
}

#[derive(Serialize)]
pub struct DashboardResponse {
    pub charts: BTreeMap<String, ChartConfig>,
    pub metrics: DashboardMetrics,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/air-quality-data", get(get_stations))
        .route("/stations/{name}", get(get_station))
        .route("/dashboard", get(get_dashboard))
        .route("/map.svg", get(get_map))
        .with_state(state)
}

async fn get_stations(
    State(state): State<AppState>,
    Query(filter): Query<StationFilter>,
) -> Json<Vec<StationRecord>> {
    let snapshot = state.repository.snapshot();
    Json(filter.apply(snapshot.stations()))
}

async fn get_station(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> (StatusCode, Json<DetailState>) {
    let station = state.repository.get(&name);
    let detail = DetailState::lookup(&name, station.as_ref());
    let status = if detail.is_found() {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    };
    (status, Json(detail))
}

async fn get_dashboard(
    State(state): State<AppState>,
) -> Result<Json<DashboardResponse>, StatusCode> {
    let mut dashboard = DashboardRenderer::new(JsonChartSurface::default());
    dashboard
        .render_trend(&ChartSeries::mock_trend())
        .and_then(|_| dashboard.render_pollutants(&ChartSeries::mock_pollutants()))
        .map_err(|e| {
            error!("Failed to build dashboard charts: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    let snapshot = state.repository.snapshot();
    Ok(Json(DashboardResponse {
        charts: dashboard.into_surface().charts().clone(),
        metrics: DashboardMetrics::from_stations(snapshot.stations()),
    }))
}

async fn get_map(
    State(state): State<AppState>,
    Query(filter): Query<StationFilter>,
) -> Result<impl IntoResponse, StatusCode> {
    let snapshot = state.repository.snapshot();
    let stations = filter.apply(snapshot.stations());

    let mut map = MapRenderer::new(SvgMapSurface::new(MAP_WIDTH, MAP_HEIGHT), &state.map);
    let svg = map
        .render(&stations)
        .and_then(|_| map.surface().to_svg())
        .map_err(|e| {
            error!("Failed to render station map: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::SeedTelemetrySource;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use std::time::Duration;
    use tower::ServiceExt;

    async fn app() -> Router {
        let repository = Arc::new(StationRepository::new(
            Arc::new(SeedTelemetrySource::new()),
            Duration::from_secs(5),
        ));
        repository.load().await.unwrap();
        router(AppState {
            repository,
            map: MapConfig::default(),
        })
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_air_quality_data_lists_stations() {
        let (status, body) = get(app().await, "/air-quality-data").await;
        assert_eq!(status, StatusCode::OK);
        let stations: Vec<Value> = serde_json::from_slice(&body).unwrap();
        assert_eq!(stations.len(), 6);
        assert_eq!(stations[0]["name"], "Manaus - Centro");
        assert_eq!(stations[0]["status"], "Good");
    }

    #[tokio::test]
    async fn test_air_quality_data_region_filter() {
        let (_, body) = get(app().await, "/air-quality-data?region=bel%C3%A9m").await;
        let stations: Vec<Value> = serde_json::from_slice(&body).unwrap();
        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0]["name"], "Belém - Nazaré");
    }

    #[tokio::test]
    async fn test_station_detail_and_not_found() {
        let (status, body) = get(app().await, "/stations/Manaus%20-%20Centro").await;
        assert_eq!(status, StatusCode::OK);
        let detail: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(detail["state"], "found");
        assert_eq!(detail["severity"], "good");

        let (status, body) = get(app().await, "/stations/Unknown%20Station").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let detail: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(detail["state"], "not_found");
    }

    #[tokio::test]
    async fn test_dashboard_contains_charts_and_metrics() {
        let (status, body) = get(app().await, "/dashboard").await;
        assert_eq!(status, StatusCode::OK);
        let dashboard: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(dashboard["charts"]["trendChart"]["type"], "line");
        assert_eq!(dashboard["charts"]["pollutantChart"]["type"], "doughnut");
        assert_eq!(dashboard["metrics"]["station_count"], 6);
        assert_eq!(dashboard["metrics"]["mapped_count"], 5);
        assert_eq!(dashboard["metrics"]["worst"]["name"], "Rio Branco - Bosque");

        let alerts = dashboard["metrics"]["alerts"].as_array().unwrap();
        let danger = alerts.iter().find(|alert| alert["level"] == "danger").unwrap();
        assert_eq!(danger["stations"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_map_svg() {
        let (status, body) = get(app().await, "/map.svg").await;
        assert_eq!(status, StatusCode::OK);
        let svg = String::from_utf8(body).unwrap();
        assert_eq!(svg.matches("<circle").count(), 5);
        assert!(svg.contains(r##"fill="#8f3f97""##));
    }
}
