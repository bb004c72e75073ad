use anyhow::{bail, Context, Result};
use nearby_feed::{Coordinates, FeedConfig};

/// How the run should drive the feed, on top of the library config
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub feed: FeedConfig,
    /// Position reported by the stand-in location service; unset means denied
    pub device_position: Option<Coordinates>,
    pub search: Option<String>,
    pub category: Option<String>,
    /// Total pages to load, first page included
    pub pages: u32,
    /// Re-acquire the position after start-up instead of trusting the cache
    pub update_location: bool,
    pub json_logs: bool,
}

impl CliConfig {
    pub fn from_env() -> Result<Self> {
        let feed = FeedConfig::from_env().context("Invalid feed configuration")?;

        let latitude = optional_var("FEED_DEVICE_LAT")?;
        let longitude = optional_var("FEED_DEVICE_LNG")?;
        let device_position = match (latitude, longitude) {
            (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng)),
            (None, None) => None,
            _ => bail!("FEED_DEVICE_LAT and FEED_DEVICE_LNG must be set together"),
        };

        Ok(CliConfig {
            feed,
            device_position,
            search: string_var("FEED_SEARCH"),
            category: string_var("FEED_CATEGORY"),
            pages: optional_var("FEED_PAGES")?.unwrap_or(1).max(1),
            update_location: optional_var("FEED_UPDATE_LOCATION")?.unwrap_or(false),
            json_logs: std::env::var("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        })
    }
}

fn string_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn optional_var<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    string_var(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("{} has invalid value {:?}", key, raw))
        })
        .transpose()
}
