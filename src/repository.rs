//! In-memory station repository
//!
//! Holds the station set from the last successful load. Loads are tagged with a
//! monotonically increasing request id; a response is only applied if its id is still
//! the latest issued, so a slow stale response can never overwrite newer data. The
//! station set is swapped as one `Arc`, so readers see either the old or the new set.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::models::StationRecord;
use crate::telemetry::TelemetrySource;
use crate::{AqiwatchError, Result};

/// Immutable view of the stations applied by one load
#[derive(Debug, Default)]
pub struct Snapshot {
    request_id: u64,
    stations: Vec<StationRecord>,
    index: HashMap<String, usize>,
    loaded_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    fn new(request_id: u64, stations: Vec<StationRecord>) -> Self {
        let index = stations
            .iter()
            .enumerate()
            .map(|(position, station)| (station.name.clone(), position))
            .collect();
        Self {
            request_id,
            stations,
            index,
            loaded_at: Some(Utc::now()),
        }
    }

    /// Id of the load that produced this snapshot; 0 before the first load
    #[must_use]
    pub fn request_id(&self) -> u64 {
        self.request_id
    }

    #[must_use]
    pub fn stations(&self) -> &[StationRecord] {
        &self.stations
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&StationRecord> {
        self.index.get(name).map(|&position| &self.stations[position])
    }

    #[must_use]
    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}

/// What happened to a completed fetch
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    /// The response was the latest request and is now the current data
    Applied(Arc<Snapshot>),
    /// A newer load was issued while this one was in flight; the response was dropped
    Superseded { request_id: u64, latest: u64 },
}

impl LoadOutcome {
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, LoadOutcome::Applied(_))
    }
}

pub struct StationRepository {
    source: Arc<dyn TelemetrySource>,
    timeout: Duration,
    latest_issued: AtomicU64,
    current: RwLock<Arc<Snapshot>>,
}

impl StationRepository {
    pub fn new(source: Arc<dyn TelemetrySource>, timeout: Duration) -> Self {
        Self {
            source,
            timeout,
            latest_issued: AtomicU64::new(0),
            current: RwLock::new(Arc::new(Snapshot::default())),
        }
    }

    /// Fetch from the source and, if still the latest request, replace the station set.
    ///
    /// On failure (transport, status, malformed body or timeout) the previous data is
    /// left untouched and the error is returned.
    #[instrument(name = "load_stations", skip(self), fields(source = %self.source.describe()))]
    pub async fn load(&self) -> Result<LoadOutcome> {
        let request_id = self.latest_issued.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Issued station load #{}", request_id);

        let stations = match tokio::time::timeout(self.timeout, self.source.fetch()).await {
            Ok(result) => result,
            Err(_) => Err(AqiwatchError::timeout(self.timeout)),
        }
        .inspect_err(|e| warn!("Station load #{} failed: {}", request_id, e))?;

        let mut current = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let latest = self.latest_issued.load(Ordering::SeqCst);
        if latest != request_id {
            debug!(
                "Discarding stale response #{} (latest is #{})",
                request_id, latest
            );
            return Ok(LoadOutcome::Superseded { request_id, latest });
        }

        let snapshot = Arc::new(Snapshot::new(request_id, stations));
        *current = Arc::clone(&snapshot);
        info!(
            "Applied station load #{} with {} stations",
            request_id,
            snapshot.len()
        );

        Ok(LoadOutcome::Applied(snapshot))
    }

    /// Current station set
    #[must_use]
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Look up a station by its canonical name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<StationRecord> {
        self.snapshot().get(name).cloned()
    }
}
