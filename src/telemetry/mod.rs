//! Telemetry sources
//!
//! A [`TelemetrySource`] produces the full, normalized station list in one call. The
//! HTTP source talks to the configured endpoint; the seed source serves a fixed set of
//! stations for the demo server and tests.

pub mod http;
pub mod seed;

use async_trait::async_trait;

use crate::Result;
use crate::models::StationRecord;

pub use http::HttpTelemetrySource;
pub use seed::SeedTelemetrySource;

#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Fetch every station currently reported by the source
    async fn fetch(&self) -> Result<Vec<StationRecord>>;

    /// Short human-readable description for logs
    fn describe(&self) -> String;
}
