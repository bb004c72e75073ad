mod config;

use std::sync::Arc;

use anyhow::Result;
use nearby_feed::{
    FeedSnapshot, FetchOutcome, FileStore, FixedLocationProvider, HttpProductsApi,
    LocationCache, NearbyFeedController,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::CliConfig;

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,nearby_feed=debug".into());

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_line_number(true)
                    .with_file(true)
                    .with_target(true),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }
}

fn print_feed(snapshot: &FeedSnapshot) {
    if let Some(reason) = snapshot.location_error() {
        println!("Location unavailable ({})", reason.as_str());
    }
    if let Some(error) = &snapshot.last_fetch_error {
        println!("Last fetch failed: {}", error);
    }

    for (index, product) in snapshot.products.iter().enumerate() {
        let distance = product
            .distance
            .map(|d| format!("{:.1} km", d))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>3}. {} | {} | {:.2} | {} | {}",
            index + 1,
            product.name,
            product.merchant_name,
            product.price,
            product.category,
            distance
        );
    }

    if let Some(pagination) = snapshot.pagination {
        println!(
            "page {}/{} ({} products total)",
            pagination.page, pagination.pages, pagination.total
        );
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = CliConfig::from_env()?;
    init_logging(config.json_logs);

    info!("Starting feed-cli v{}", env!("CARGO_PKG_VERSION"));
    info!(
        api = %config.feed.api_base_url,
        radius_km = config.feed.search_radius_km,
        limit = config.feed.page_limit,
        cache = %config.feed.location_cache_path.display(),
        "Feed configuration loaded"
    );

    let api = HttpProductsApi::from_config(&config.feed)?;
    let store = FileStore::new(config.feed.location_cache_path.clone());
    let cache =
        LocationCache::new(Arc::new(store)).with_max_age(config.feed.location_cache_max_age);
    let location = FixedLocationProvider::new(config.device_position);

    let feed = NearbyFeedController::new(Arc::new(api), Arc::new(location), cache, &config.feed);

    if config.search.is_some() || config.category.is_some() {
        feed.set_filter(config.search.clone(), config.category.clone())
            .await;
    }

    let outcome = feed.initialize().await;
    info!(?outcome, "Feed initialized");

    if config.update_location {
        let outcome = feed.update_location().await;
        info!(?outcome, "Location updated");
    }

    for _ in 1..config.pages {
        match feed.load_more().await {
            FetchOutcome::Applied => {}
            FetchOutcome::Skipped => break,
            outcome => {
                warn!(?outcome, "Stopped loading more pages");
                break;
            }
        }
    }

    print_feed(&feed.snapshot());
    Ok(())
}
