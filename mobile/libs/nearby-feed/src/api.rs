//! Products API client
//!
//! The nearby endpoint is owned by the backend; this module only knows its
//! query string and response shape:
//! `GET /api/products/nearby?lat&lng&radius&page&limit[&search][&category]`
//! → `{products, pagination}`.

use reqwest::Client;
use tracing::{debug, warn};

use crate::config::FeedConfig;
use crate::error::{FeedError, FeedResult};
use crate::models::{Coordinates, FeedQuery, NearbyPage};

/// Parameters of one nearby-products page request
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyRequest {
    pub coordinates: Coordinates,
    pub radius_km: f64,
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
    pub category: Option<String>,
}

impl NearbyRequest {
    pub fn new(
        coordinates: Coordinates,
        radius_km: f64,
        page: u32,
        limit: u32,
        query: &FeedQuery,
    ) -> Self {
        Self {
            coordinates,
            radius_km,
            page,
            limit,
            search: query.search_param().map(str::to_string),
            category: query.category_param().map(str::to_string),
        }
    }

    /// Query string pairs in the order the endpoint documents them
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("lat", self.coordinates.latitude.to_string()),
            ("lng", self.coordinates.longitude.to_string()),
            ("radius", self.radius_km.to_string()),
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        if let Some(category) = &self.category {
            pairs.push(("category", category.clone()));
        }
        pairs
    }
}

#[async_trait::async_trait]
pub trait ProductsApi: Send + Sync {
    async fn fetch_nearby(&self, request: &NearbyRequest) -> FeedResult<NearbyPage>;
}

/// reqwest-backed [`ProductsApi`]
pub struct HttpProductsApi {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpProductsApi {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn from_config(config: &FeedConfig) -> FeedResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| FeedError::InvalidConfig(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: config.api_token.clone(),
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn nearby_url(&self) -> String {
        format!("{}/api/products/nearby", self.base_url)
    }
}

#[async_trait::async_trait]
impl ProductsApi for HttpProductsApi {
    async fn fetch_nearby(&self, request: &NearbyRequest) -> FeedResult<NearbyPage> {
        let url = self.nearby_url();
        debug!(
            url = %url,
            page = request.page,
            limit = request.limit,
            search = ?request.search,
            category = ?request.category,
            "Fetching nearby products"
        );

        let mut req = self.client.get(&url).query(&request.query_pairs());
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let response = req
            .send()
            .await
            .map_err(|e| FeedError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            warn!(status = status.as_u16(), "Products API returned an error");
            return Err(FeedError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<NearbyPage>()
            .await
            .map_err(|e| FeedError::Decode(e.to_string()))
    }
}
