//! Feed data model shared by the API client, cache and controller

use serde::{Deserialize, Serialize};

/// Category label the app uses for "no category filter"
pub const ALL_CATEGORIES: &str = "All";

/// A point on the globe in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Finite and inside the WGS84 latitude/longitude ranges
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Product snapshot as returned by the nearby endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub merchant_name: String,
    /// Distance from the query point in kilometres
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
}

/// Server-reported pagination cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationInfo {
    pub total: u64,
    pub pages: u32,
    pub page: u32,
    pub limit: u32,
}

impl PaginationInfo {
    pub fn has_more(&self) -> bool {
        self.page < self.pages
    }
}

/// One page of the nearby endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyPage {
    #[serde(default)]
    pub products: Vec<Product>,
    pub pagination: PaginationInfo,
}

/// User-controlled filter over the feed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedQuery {
    pub search_text: Option<String>,
    pub category: Option<String>,
}

impl FeedQuery {
    pub fn new(search_text: Option<String>, category: Option<String>) -> Self {
        Self {
            search_text,
            category,
        }
    }

    /// Search term to send, if any
    pub fn search_param(&self) -> Option<&str> {
        self.search_text
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Category to send, if any
    pub fn category_param(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case(ALL_CATEGORIES))
    }

    /// True when both queries would hit the API with the same parameters
    pub fn same_request(&self, other: &FeedQuery) -> bool {
        self.search_param() == other.search_param()
            && self.category_param() == other.category_param()
    }
}
