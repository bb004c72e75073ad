//! Last-known coordinates persisted between app launches

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::KeyValueStore;
use crate::error::CacheResult;
use crate::metrics::FeedMetrics;
use crate::models::Coordinates;

/// Fixed key the coordinates are stored under
pub const LAST_KNOWN_LOCATION_KEY: &str = "lastKnownLocation";

/// Stored form of the coordinates
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedLocation {
    pub latitude: f64,
    pub longitude: f64,
    /// Absent in entries written before timestamps were recorded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached_at: Option<DateTime<Utc>>,
}

impl CachedLocation {
    pub fn new(coordinates: Coordinates) -> Self {
        Self {
            latitude: coordinates.latitude,
            longitude: coordinates.longitude,
            cached_at: Some(Utc::now()),
        }
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    /// Entries without a timestamp count as expired once a max age applies
    pub fn is_expired(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        match self.cached_at {
            Some(cached_at) => match chrono::Duration::from_std(max_age) {
                Ok(max_age) => now.signed_duration_since(cached_at) > max_age,
                Err(_) => false,
            },
            None => true,
        }
    }
}

/// Coordinates cache over any [`KeyValueStore`]
#[derive(Clone)]
pub struct LocationCache {
    store: Arc<dyn KeyValueStore>,
    max_age: Option<Duration>,
    metrics: FeedMetrics,
}

impl LocationCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            max_age: None,
            metrics: FeedMetrics::new(),
        }
    }

    pub fn with_max_age(mut self, max_age: Option<Duration>) -> Self {
        self.max_age = max_age;
        self
    }

    /// Read the cached coordinates
    ///
    /// Every failure mode is reported as a miss so the caller falls through
    /// to asking the device.
    pub async fn load(&self) -> Option<Coordinates> {
        let raw = match self.store.get_raw(LAST_KNOWN_LOCATION_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("Location cache miss");
                self.metrics.record_cache_miss("empty");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Location cache read failed");
                self.metrics.record_cache_miss("read_error");
                return None;
            }
        };

        let cached = match serde_json::from_str::<CachedLocation>(&raw) {
            Ok(cached) => cached,
            Err(e) => {
                warn!(error = %e, "Location cache entry is not valid JSON");
                self.metrics.record_cache_miss("parse_error");
                return None;
            }
        };

        let coordinates = cached.coordinates();
        if !coordinates.is_valid() {
            warn!(
                latitude = coordinates.latitude,
                longitude = coordinates.longitude,
                "Location cache entry out of range"
            );
            self.metrics.record_cache_miss("invalid");
            return None;
        }

        if let Some(max_age) = self.max_age {
            if cached.is_expired(max_age, Utc::now()) {
                debug!(max_age_secs = max_age.as_secs(), "Location cache entry expired");
                self.metrics.record_cache_miss("expired");
                return None;
            }
        }

        debug!(
            latitude = coordinates.latitude,
            longitude = coordinates.longitude,
            "Location cache hit"
        );
        self.metrics.record_cache_hit();
        Some(coordinates)
    }

    pub async fn save(&self, coordinates: Coordinates) -> CacheResult<()> {
        let data = serde_json::to_string(&CachedLocation::new(coordinates))?;
        self.store.set_raw(LAST_KNOWN_LOCATION_KEY, data).await?;
        debug!(
            latitude = coordinates.latitude,
            longitude = coordinates.longitude,
            "Location cached"
        );
        Ok(())
    }

    pub async fn clear(&self) -> CacheResult<()> {
        self.store.remove(LAST_KNOWN_LOCATION_KEY).await
    }
}
