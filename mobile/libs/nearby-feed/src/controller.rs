//! Nearby feed controller
//!
//! Owns the geolocated product list a feed screen renders: where the
//! coordinates come from, which page is loaded, which filter is active and
//! which requests are in flight.
//!
//! Every request is tagged with the generation current when it was issued.
//! Replace fetches (initial, refresh, filter change, location update) advance
//! the generation, so a response that arrives after a newer replace was issued
//! is dropped instead of being applied over the newer list.
//!
//! State sits behind a synchronous mutex that is only held between awaits, so
//! overlapping calls on one task interleave exactly at their I/O points.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::api::{NearbyRequest, ProductsApi};
use crate::cache::LocationCache;
use crate::config::FeedConfig;
use crate::location::{Accuracy, LocationProvider, PermissionStatus};
use crate::metrics::FeedMetrics;
use crate::models::{Coordinates, FeedQuery, PaginationInfo, Product};
use crate::state::{LocationEvent, LocationFailure, LocationState};

/// What a controller operation ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A response was applied to the list
    Applied,
    /// A newer request superseded this one; its response was dropped
    Discarded,
    /// The request failed; the list was left as it was
    Failed,
    /// No coordinates could be obtained, so nothing was fetched
    LocationUnavailable,
    /// Guards or preconditions made the call a no-op
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchKind {
    Initial,
    Refresh,
    Filter,
    Location,
    LoadMore,
}

impl FetchKind {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Refresh => "refresh",
            Self::Filter => "filter",
            Self::Location => "location",
            Self::LoadMore => "load_more",
        }
    }
}

/// Read-only view of the feed for rendering
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSnapshot {
    pub location_state: LocationState,
    pub coordinates: Option<Coordinates>,
    pub products: Vec<Product>,
    pub pagination: Option<PaginationInfo>,
    pub query: FeedQuery,
    /// A page-1 fetch is in flight
    pub loading: bool,
    /// The in-flight page-1 fetch was started by `refresh()`
    pub refreshing: bool,
    pub loading_more: bool,
    pub initial_fetch_done: bool,
    pub last_fetch_error: Option<String>,
}

impl FeedSnapshot {
    pub fn has_more(&self) -> bool {
        self.pagination.map(|p| p.has_more()).unwrap_or(false)
    }

    pub fn location_error(&self) -> Option<LocationFailure> {
        match self.location_state {
            LocationState::LocationError(reason) => Some(reason),
            _ => None,
        }
    }
}

#[derive(Default)]
struct FeedState {
    location_state: LocationState,
    coordinates: Option<Coordinates>,
    products: Vec<Product>,
    pagination: Option<PaginationInfo>,
    query: FeedQuery,
    /// Page-1 request that produced the displayed list; load-more pages follow it
    list_request: Option<NearbyRequest>,
    generation: u64,
    loading: bool,
    refreshing: bool,
    loading_more: bool,
    initial_fetch_done: bool,
    last_fetch_error: Option<String>,
}

impl FeedState {
    fn apply(&mut self, event: LocationEvent) -> bool {
        match self.location_state.on(event) {
            Ok(next) => {
                debug!(from = ?self.location_state, to = ?next, ?event, "Location state transition");
                self.location_state = next;
                true
            }
            Err(e) => {
                warn!(error = %e, "Rejected location state transition");
                false
            }
        }
    }
}

pub struct NearbyFeedController {
    api: Arc<dyn ProductsApi>,
    location: Arc<dyn LocationProvider>,
    cache: LocationCache,
    radius_km: f64,
    page_limit: u32,
    search_debounce: std::time::Duration,
    state: Mutex<FeedState>,
    search_ticket: AtomicU64,
    metrics: FeedMetrics,
}

impl NearbyFeedController {
    pub fn new(
        api: Arc<dyn ProductsApi>,
        location: Arc<dyn LocationProvider>,
        cache: LocationCache,
        config: &FeedConfig,
    ) -> Self {
        Self {
            api,
            location,
            cache,
            radius_km: config.search_radius_km,
            page_limit: config.page_limit,
            search_debounce: config.search_debounce,
            state: Mutex::new(FeedState::default()),
            search_ticket: AtomicU64::new(0),
            metrics: FeedMetrics::new(),
        }
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        let state = self.state.lock();
        FeedSnapshot {
            location_state: state.location_state,
            coordinates: state.coordinates,
            products: state.products.clone(),
            pagination: state.pagination,
            query: state.query.clone(),
            loading: state.loading,
            refreshing: state.refreshing,
            loading_more: state.loading_more,
            initial_fetch_done: state.initial_fetch_done,
            last_fetch_error: state.last_fetch_error.clone(),
        }
    }

    /// Resolve coordinates (cache first, then device) and load page 1
    ///
    /// Only the first call does anything.
    pub async fn initialize(&self) -> FetchOutcome {
        {
            let mut state = self.state.lock();
            if !state.apply(LocationEvent::BeginInitialize) {
                return FetchOutcome::Skipped;
            }
        }

        match self.cache.load().await {
            Some(coordinates) => {
                let mut state = self.state.lock();
                state.apply(LocationEvent::CacheHit);
                state.coordinates = Some(coordinates);
                state.apply(LocationEvent::CoordinatesReady);
                info!(
                    latitude = coordinates.latitude,
                    longitude = coordinates.longitude,
                    "Using cached location"
                );
            }
            None => {
                {
                    let mut state = self.state.lock();
                    state.apply(LocationEvent::CacheMiss);
                }
                if self.acquire_position().await.is_none() {
                    return FetchOutcome::LocationUnavailable;
                }
            }
        }

        self.replace_fetch(FetchKind::Initial).await
    }

    /// Re-acquire the device position, cache it and reload page 1
    ///
    /// Only valid once the location machine has settled.
    pub async fn update_location(&self) -> FetchOutcome {
        {
            let mut state = self.state.lock();
            if !state.apply(LocationEvent::UserRetry) {
                return FetchOutcome::Skipped;
            }
        }

        if self.acquire_position().await.is_none() {
            return FetchOutcome::LocationUnavailable;
        }
        self.replace_fetch(FetchKind::Location).await
    }

    /// Change the filter; `None` leaves that part of the query as it is
    ///
    /// Before the initial fetch completes the new query is only recorded.
    pub async fn set_filter(
        &self,
        search_text: Option<String>,
        category: Option<String>,
    ) -> FetchOutcome {
        {
            let mut state = self.state.lock();
            let mut next = state.query.clone();
            if let Some(search_text) = search_text {
                next.search_text = Some(search_text);
            }
            if let Some(category) = category {
                next.category = Some(category);
            }

            let unchanged = next.same_request(&state.query);
            state.query = next;
            if unchanged {
                return FetchOutcome::Skipped;
            }
            if !state.initial_fetch_done {
                debug!("Initial fetch pending, filter recorded without fetching");
                return FetchOutcome::Skipped;
            }
        }

        self.replace_fetch(FetchKind::Filter).await
    }

    /// Debounced search input: only the last text typed within the quiet
    /// period is applied
    pub async fn set_search_text_debounced(&self, text: impl Into<String>) -> FetchOutcome {
        let text = text.into();
        let ticket = self.search_ticket.fetch_add(1, Ordering::SeqCst) + 1;

        tokio::time::sleep(self.search_debounce).await;

        if self.search_ticket.load(Ordering::SeqCst) != ticket {
            debug!(search = %text, "Search input superseded");
            return FetchOutcome::Skipped;
        }
        self.set_filter(Some(text), None).await
    }

    /// Reload page 1 with the current filter
    ///
    /// No-op while any page-1 fetch is already in flight.
    pub async fn refresh(&self) -> FetchOutcome {
        self.replace_fetch(FetchKind::Refresh).await
    }

    /// Append the next page
    pub async fn load_more(&self) -> FetchOutcome {
        let (generation, request) = {
            let mut state = self.state.lock();
            if state.loading_more || state.loading || state.products.is_empty() {
                return FetchOutcome::Skipped;
            }
            let pagination = match state.pagination {
                Some(pagination) if pagination.page < pagination.pages => pagination,
                _ => return FetchOutcome::Skipped,
            };
            let mut request = match &state.list_request {
                Some(request) => request.clone(),
                None => return FetchOutcome::Skipped,
            };
            request.page = pagination.page + 1;
            state.loading_more = true;
            (state.generation, request)
        };

        debug!(page = request.page, generation, "Loading more products");
        let result = self.api.fetch_nearby(&request).await;

        let mut state = self.state.lock();
        if state.generation != generation {
            debug!(
                page = request.page,
                generation,
                current = state.generation,
                "Dropping superseded load-more response"
            );
            self.metrics.record_stale_discard(FetchKind::LoadMore.as_str());
            return FetchOutcome::Discarded;
        }
        state.loading_more = false;

        match result {
            Ok(page) => {
                info!(
                    page = page.pagination.page,
                    pages = page.pagination.pages,
                    received = page.products.len(),
                    "Appended nearby products"
                );
                state.products.extend(page.products);
                state.pagination = Some(page.pagination);
                state.last_fetch_error = None;
                self.metrics.record_fetch(FetchKind::LoadMore.as_str(), "ok");
                FetchOutcome::Applied
            }
            Err(e) => {
                warn!(error = %e, page = request.page, "Load more failed");
                state.last_fetch_error = Some(e.to_string());
                self.metrics.record_fetch(FetchKind::LoadMore.as_str(), "error");
                FetchOutcome::Failed
            }
        }
    }

    /// Permission prompt plus position query; expects `RequestingPermission`
    async fn acquire_position(&self) -> Option<Coordinates> {
        match self.location.request_permission().await {
            Ok(PermissionStatus::Granted) => {
                let mut state = self.state.lock();
                state.apply(LocationEvent::PermissionGranted);
                state.apply(LocationEvent::BeginLocate);
            }
            Ok(PermissionStatus::Denied) => {
                warn!("Location permission denied");
                let mut state = self.state.lock();
                state.apply(LocationEvent::PermissionDenied);
                state.apply(LocationEvent::Fail);
                self.metrics
                    .record_location_failure(LocationFailure::PermissionDenied.as_str());
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Location permission request failed");
                let reason = LocationFailure::from(&e);
                let mut state = self.state.lock();
                state.apply(LocationEvent::PermissionFailed(reason));
                self.metrics.record_location_failure(reason.as_str());
                return None;
            }
        }

        let position = match self.location.current_position(Accuracy::Balanced).await {
            Ok(position) if position.is_valid() => position,
            Ok(position) => {
                warn!(
                    latitude = position.latitude,
                    longitude = position.longitude,
                    "Device reported an out-of-range position"
                );
                self.fail_position(LocationFailure::Unavailable);
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Could not get current position");
                self.fail_position(LocationFailure::from(&e));
                return None;
            }
        };

        if let Err(e) = self.cache.save(position).await {
            warn!(error = %e, "Failed to cache location");
        }

        let mut state = self.state.lock();
        state.coordinates = Some(position);
        state.apply(LocationEvent::PositionAcquired);
        info!(
            latitude = position.latitude,
            longitude = position.longitude,
            "Location resolved"
        );
        Some(position)
    }

    fn fail_position(&self, reason: LocationFailure) {
        let mut state = self.state.lock();
        state.apply(LocationEvent::PositionFailed(reason));
        self.metrics.record_location_failure(reason.as_str());
    }

    /// Fetch page 1 and replace the list with it
    ///
    /// A filter set while no list had been loaded yet is only recorded; if
    /// one landed while this fetch was in flight it is applied right after.
    async fn replace_fetch(&self, kind: FetchKind) -> FetchOutcome {
        let (outcome, filter_pending) = self.fetch_first_page(kind).await;
        if filter_pending {
            debug!(kind = kind.as_str(), "Filter changed during fetch, refetching");
            return self.fetch_first_page(FetchKind::Filter).await.0;
        }
        outcome
    }

    /// Returns the outcome and whether the query moved on while in flight
    async fn fetch_first_page(&self, kind: FetchKind) -> (FetchOutcome, bool) {
        let (generation, request, issued_query) = {
            let mut state = self.state.lock();
            // Refresh shares the page-1 guard; other kinds supersede instead
            if kind == FetchKind::Refresh && state.loading {
                return (FetchOutcome::Skipped, false);
            }
            let coordinates = match state.coordinates {
                Some(coordinates) => coordinates,
                None => return (FetchOutcome::Skipped, false),
            };

            state.generation += 1;
            state.loading = true;
            state.refreshing = kind == FetchKind::Refresh;
            // Any load-more in flight now belongs to an older generation
            state.loading_more = false;

            let request = NearbyRequest::new(
                coordinates,
                self.radius_km,
                1,
                self.page_limit,
                &state.query,
            );
            (state.generation, request, state.query.clone())
        };

        debug!(kind = kind.as_str(), generation, "Fetching first page");
        let result = self.api.fetch_nearby(&request).await;

        let mut state = self.state.lock();
        if state.generation != generation {
            debug!(
                kind = kind.as_str(),
                generation,
                current = state.generation,
                "Dropping superseded response"
            );
            self.metrics.record_stale_discard(kind.as_str());
            return (FetchOutcome::Discarded, false);
        }
        state.loading = false;
        state.refreshing = false;
        state.initial_fetch_done = true;
        let filter_pending = !state.query.same_request(&issued_query);

        let outcome = match result {
            Ok(page) => {
                info!(
                    kind = kind.as_str(),
                    total = page.pagination.total,
                    pages = page.pagination.pages,
                    received = page.products.len(),
                    "Loaded nearby products"
                );
                state.products = page.products;
                state.pagination = Some(page.pagination);
                state.list_request = Some(request);
                state.last_fetch_error = None;
                self.metrics.record_fetch(kind.as_str(), "ok");
                FetchOutcome::Applied
            }
            Err(e) => {
                warn!(kind = kind.as_str(), error = %e, "Failed to fetch nearby products");
                state.last_fetch_error = Some(e.to_string());
                self.metrics.record_fetch(kind.as_str(), "error");
                FetchOutcome::Failed
            }
        };
        (outcome, filter_pending)
    }
}
