//! HTTP telemetry client

use async_trait::async_trait;
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

use super::TelemetrySource;
use crate::config::TelemetryConfig;
use crate::models::{StationRecord, WireStation, normalize};
use crate::{AqiwatchError, Result};

/// Fetches the station array from `GET {endpoint}`
pub struct HttpTelemetrySource {
    client: ClientWithMiddleware,
    endpoint: String,
}

impl HttpTelemetrySource {
    /// Create a client with the configured per-request timeout and retry budget
    pub fn new(config: &TelemetryConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("aqiwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AqiwatchError::config(format!("Failed to create HTTP client: {e}")))?;

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let client = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Decode a response body into normalized station records
pub fn decode_stations(body: &[u8]) -> Result<Vec<StationRecord>> {
    let wire: Vec<WireStation> = serde_json::from_slice(body)
        .map_err(|e| AqiwatchError::decode(format!("expected a station array: {e}")))?;
    Ok(normalize(wire))
}

#[async_trait]
impl TelemetrySource for HttpTelemetrySource {
    #[instrument(name = "fetch_telemetry", skip(self), fields(endpoint = %self.endpoint))]
    async fn fetch(&self) -> Result<Vec<StationRecord>> {
        let start_time = Instant::now();
        debug!("Requesting station telemetry");

        let response = self.client.get(&self.endpoint).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Telemetry endpoint answered {}", status);
            return Err(AqiwatchError::status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AqiwatchError::network(format!("Failed to read response body: {e}")))?;
        let stations = decode_stations(&body)?;

        info!(
            "Retrieved {} stations in {:.3}s",
            stations.len(),
            start_time.elapsed().as_secs_f64()
        );

        Ok(stations)
    }

    fn describe(&self) -> String {
        format!("http({})", self.endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, http::StatusCode, routing::get};
    use tokio::net::TcpListener;

    #[test]
    fn test_decode_stations_normalizes() {
        let body = br#"[{"location": "Manaus", "latitude": -3.1, "longitude": -60.0, "aqi": 55.0}]"#;
        let stations = decode_stations(body).unwrap();
        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0].name, "Manaus");
        assert_eq!(stations[0].status, "Moderate");
    }

    #[test]
    fn test_decode_rejects_non_array() {
        let err = decode_stations(br#"{"error": "login required"}"#).unwrap_err();
        assert!(matches!(err, AqiwatchError::Decode { .. }));
    }

    #[test]
    fn test_decode_keeps_stations_with_non_numeric_aqi() {
        let body = br#"[{"name":"A","aqi":"N/A","latitude":1.0,"longitude":1.0},{"name":"B","aqi":30}]"#;
        let stations = decode_stations(body).unwrap();
        assert_eq!(stations.len(), 2);
        assert_eq!(stations[0].aqi, None);
        assert!(stations[0].coordinates().is_some());
        assert_eq!(stations[1].aqi, Some(30));
    }

    async fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        format!("http://{addr}/api/air-quality-data")
    }

    fn source_for(endpoint: String) -> HttpTelemetrySource {
        HttpTelemetrySource::new(&TelemetryConfig {
            endpoint,
            timeout_seconds: 5,
            max_retries: 0,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_decodes_endpoint_response() {
        let router = Router::new().route(
            "/api/air-quality-data",
            get(|| async { r#"[{"location":"Manaus","aqi":42.4},{"name":"Belém","aqi":"--"}]"# }),
        );
        let stations = source_for(serve(router).await).fetch().await.unwrap();
        assert_eq!(stations.len(), 2);
        assert_eq!(stations[0].aqi, Some(42));
        assert_eq!(stations[1].aqi, None);
    }

    #[tokio::test]
    async fn test_fetch_maps_error_status() {
        let router = Router::new().route(
            "/api/air-quality-data",
            get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
        );
        let err = source_for(serve(router).await).fetch().await.unwrap_err();
        assert!(err.is_fetch_failure());
        assert!(matches!(err, AqiwatchError::Status { status: 503 }));
    }

    #[tokio::test]
    async fn test_fetch_maps_refused_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let source = source_for(format!("http://{addr}/api/air-quality-data"));
        let err = source.fetch().await.unwrap_err();
        assert!(err.is_fetch_failure());
        assert!(matches!(err, AqiwatchError::Network { .. }));
    }

    #[test]
    fn test_client_creation() {
        let source = HttpTelemetrySource::new(&TelemetryConfig::default()).unwrap();
        assert_eq!(
            source.endpoint(),
            "http://localhost:8080/api/air-quality-data"
        );
        assert!(source.describe().starts_with("http("));
    }
}
