//! Shared fixtures for controller tests
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use mockall::mock;
use nearby_feed::{
    Accuracy, Coordinates, FeedConfig, FeedError, FeedResult, LocationCache, LocationError,
    LocationProvider, MemoryStore, NearbyFeedController, NearbyPage, NearbyRequest,
    PaginationInfo, PermissionStatus, Product, ProductsApi,
};
use parking_lot::Mutex;
use tokio::sync::{oneshot, Notify};

mock! {
    pub Location {}

    #[async_trait::async_trait]
    impl LocationProvider for Location {
        async fn request_permission(&self) -> Result<PermissionStatus, LocationError>;
        async fn current_position(&self, accuracy: Accuracy) -> Result<Coordinates, LocationError>;
    }
}

enum Reply {
    Ready(FeedResult<NearbyPage>),
    Gated(oneshot::Receiver<FeedResult<NearbyPage>>),
}

/// Products API fake answering calls from a queue of scripted replies
///
/// Gated replies hold the call open until the test sends the response, which
/// is how in-flight overlap is arranged.
#[derive(Default)]
pub struct ScriptedApi {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<NearbyRequest>>,
    called: Notify,
}

impl ScriptedApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_ok(&self, page: NearbyPage) {
        self.replies.lock().push_back(Reply::Ready(Ok(page)));
    }

    pub fn push_err(&self, error: FeedError) {
        self.replies.lock().push_back(Reply::Ready(Err(error)));
    }

    /// Queue a reply that resolves once the returned sender is used
    pub fn push_gated(&self) -> oneshot::Sender<FeedResult<NearbyPage>> {
        let (tx, rx) = oneshot::channel();
        self.replies.lock().push_back(Reply::Gated(rx));
        tx
    }

    pub fn requests(&self) -> Vec<NearbyRequest> {
        self.requests.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Resolves once at least `n` calls have been made
    pub async fn wait_for_calls(&self, n: usize) {
        loop {
            let notified = self.called.notified();
            if self.call_count() >= n {
                return;
            }
            notified.await;
        }
    }
}

#[async_trait::async_trait]
impl ProductsApi for ScriptedApi {
    async fn fetch_nearby(&self, request: &NearbyRequest) -> FeedResult<NearbyPage> {
        self.requests.lock().push(request.clone());
        let reply = self.replies.lock().pop_front();
        self.called.notify_waiters();

        match reply {
            Some(Reply::Ready(result)) => result,
            Some(Reply::Gated(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(FeedError::Network("gate dropped".to_string()))),
            None => Err(FeedError::Network("no scripted reply".to_string())),
        }
    }
}

pub fn product(id: &str) -> Product {
    Product {
        id: id.to_string(),
        name: format!("Product {}", id),
        price: 100.0,
        merchant_name: "Corner Store".to_string(),
        distance: Some(0.5),
        images: vec![],
        category: "Food".to_string(),
        description: String::new(),
    }
}

pub fn page(page: u32, pages: u32, total: u64, ids: &[&str]) -> NearbyPage {
    NearbyPage {
        products: ids.iter().map(|id| product(id)).collect(),
        pagination: PaginationInfo {
            total,
            pages,
            page,
            limit: 10,
        },
    }
}

pub fn ids(products: &[Product]) -> Vec<String> {
    products.iter().map(|p| p.id.clone()).collect()
}

pub fn location_granting(position: Coordinates) -> MockLocation {
    let mut location = MockLocation::new();
    location
        .expect_request_permission()
        .returning(|| Ok(PermissionStatus::Granted));
    location
        .expect_current_position()
        .returning(move |_| Ok(position));
    location
}

/// Location service that must never be consulted
pub fn location_unused() -> MockLocation {
    let mut location = MockLocation::new();
    location.expect_request_permission().times(0);
    location.expect_current_position().times(0);
    location
}

pub async fn store_with_cached(coordinates: Coordinates) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    LocationCache::new(store.clone())
        .save(coordinates)
        .await
        .expect("memory store write");
    store
}

pub fn controller(
    api: Arc<ScriptedApi>,
    location: MockLocation,
    store: Arc<MemoryStore>,
) -> NearbyFeedController {
    NearbyFeedController::new(
        api,
        Arc::new(location),
        LocationCache::new(store),
        &FeedConfig::default(),
    )
}
