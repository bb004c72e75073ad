//! Nearby product feed
//!
//! Client-side core of the nearby-product discovery screen:
//! - Location acquisition with a cached last-known position
//! - Paginated fetch-and-append against the Products API
//! - Search/category filtering with replace semantics and debounced input
//! - Generation tagging so superseded responses are never applied
//!
//! Collaborators (Products API, location service, key-value store) are
//! injected into [`NearbyFeedController`] as trait objects.

mod error;
mod metrics;

pub mod api;
pub mod cache;
pub mod config;
pub mod controller;
pub mod location;
pub mod models;
pub mod state;

pub use api::{HttpProductsApi, NearbyRequest, ProductsApi};
pub use cache::{FileStore, KeyValueStore, LocationCache, MemoryStore, LAST_KNOWN_LOCATION_KEY};
pub use config::FeedConfig;
pub use controller::{FeedSnapshot, FetchOutcome, NearbyFeedController};
pub use error::{CacheError, CacheResult, FeedError, FeedResult, LocationError};
pub use location::{Accuracy, FixedLocationProvider, LocationProvider, PermissionStatus};
pub use metrics::FeedMetrics;
pub use models::{Coordinates, FeedQuery, NearbyPage, PaginationInfo, Product};
pub use state::{LocationEvent, LocationFailure, LocationState};
