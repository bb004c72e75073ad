use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{FeedError, FeedResult};

#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Base URL of the backend hosting `/api/products/nearby`
    pub api_base_url: String,
    /// Bearer token forwarded to the Products API
    pub api_token: Option<String>,
    /// Fixed search radius sent with every nearby query
    pub search_radius_km: f64,
    /// Page size requested from the API
    pub page_limit: u32,
    /// Quiet period before a typed search is applied
    pub search_debounce: Duration,
    /// Per-request timeout; `None` keeps the HTTP client default
    pub request_timeout: Option<Duration>,
    /// Maximum age of cached coordinates; `None` never expires them
    pub location_cache_max_age: Option<Duration>,
    /// Where the file-backed cache lives
    pub location_cache_path: PathBuf,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            api_token: None,
            search_radius_km: default_search_radius_km(),
            page_limit: default_page_limit(),
            search_debounce: Duration::from_millis(default_search_debounce_ms()),
            request_timeout: None,
            location_cache_max_age: None,
            location_cache_path: PathBuf::from(default_location_cache_path()),
        }
    }
}

impl FeedConfig {
    pub fn from_env() -> FeedResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> FeedResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let config = FeedConfig {
            api_base_url: var("PRODUCTS_API_URL").unwrap_or_else(default_api_base_url),
            api_token: var("PRODUCTS_API_TOKEN"),
            search_radius_km: parse_var("FEED_SEARCH_RADIUS_KM", var("FEED_SEARCH_RADIUS_KM"))?
                .unwrap_or_else(default_search_radius_km),
            page_limit: parse_var("FEED_PAGE_LIMIT", var("FEED_PAGE_LIMIT"))?
                .unwrap_or_else(default_page_limit),
            search_debounce: Duration::from_millis(
                parse_var("FEED_SEARCH_DEBOUNCE_MS", var("FEED_SEARCH_DEBOUNCE_MS"))?
                    .unwrap_or_else(default_search_debounce_ms),
            ),
            request_timeout: parse_var("FEED_HTTP_TIMEOUT_SECS", var("FEED_HTTP_TIMEOUT_SECS"))?
                .map(Duration::from_secs),
            location_cache_max_age: parse_var(
                "LOCATION_CACHE_MAX_AGE_SECS",
                var("LOCATION_CACHE_MAX_AGE_SECS"),
            )?
            .map(Duration::from_secs),
            location_cache_path: var("LOCATION_CACHE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(default_location_cache_path())),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> FeedResult<()> {
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://")
        {
            return Err(FeedError::InvalidConfig(format!(
                "PRODUCTS_API_URL must be an http(s) URL, got {}",
                self.api_base_url
            )));
        }
        if !(self.search_radius_km.is_finite() && self.search_radius_km > 0.0) {
            return Err(FeedError::InvalidConfig(
                "FEED_SEARCH_RADIUS_KM must be a positive number".to_string(),
            ));
        }
        if self.page_limit == 0 {
            return Err(FeedError::InvalidConfig(
                "FEED_PAGE_LIMIT must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(key: &str, raw: Option<String>) -> FeedResult<Option<T>> {
    raw.map(|value| {
        value
            .trim()
            .parse::<T>()
            .map_err(|_| FeedError::InvalidConfig(format!("{} has invalid value {:?}", key, value)))
    })
    .transpose()
}

fn default_api_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_search_radius_km() -> f64 {
    10.0
}

fn default_page_limit() -> u32 {
    10
}

fn default_search_debounce_ms() -> u64 {
    500
}

fn default_location_cache_path() -> String {
    ".nearby-feed/cache.json".to_string()
}
