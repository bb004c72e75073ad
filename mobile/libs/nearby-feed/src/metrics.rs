//! Feed metrics for observability

use prometheus::{CounterVec, IntCounter, Opts, Registry};
use std::sync::OnceLock;

static METRICS: OnceLock<FeedMetricsInner> = OnceLock::new();

struct FeedMetricsInner {
    fetches: CounterVec,
    stale_discards: CounterVec,
    location_cache_hits: IntCounter,
    location_cache_misses: CounterVec,
    location_failures: CounterVec,
}

impl FeedMetricsInner {
    fn new() -> Self {
        Self {
            fetches: CounterVec::new(
                Opts::new(
                    "nearby_feed_fetches_total",
                    "Nearby product page fetches",
                ),
                &["kind", "outcome"],
            )
            .expect("valid metric definition"),
            stale_discards: CounterVec::new(
                Opts::new(
                    "nearby_feed_stale_responses_total",
                    "Responses discarded because a newer request superseded them",
                ),
                &["kind"],
            )
            .expect("valid metric definition"),
            location_cache_hits: IntCounter::new(
                "nearby_feed_location_cache_hits_total",
                "Cached coordinates used",
            )
            .expect("valid metric definition"),
            location_cache_misses: CounterVec::new(
                Opts::new(
                    "nearby_feed_location_cache_misses_total",
                    "Cached coordinates unavailable",
                ),
                &["reason"],
            )
            .expect("valid metric definition"),
            location_failures: CounterVec::new(
                Opts::new(
                    "nearby_feed_location_failures_total",
                    "Location acquisitions that ended in an error state",
                ),
                &["reason"],
            )
            .expect("valid metric definition"),
        }
    }

    fn register(&self, registry: &Registry) -> Result<(), prometheus::Error> {
        registry.register(Box::new(self.fetches.clone()))?;
        registry.register(Box::new(self.stale_discards.clone()))?;
        registry.register(Box::new(self.location_cache_hits.clone()))?;
        registry.register(Box::new(self.location_cache_misses.clone()))?;
        registry.register(Box::new(self.location_failures.clone()))?;
        Ok(())
    }
}

fn get_metrics() -> &'static FeedMetricsInner {
    METRICS.get_or_init(FeedMetricsInner::new)
}

/// Feed metrics wrapper
#[derive(Clone, Default)]
pub struct FeedMetrics;

impl FeedMetrics {
    pub fn new() -> Self {
        Self
    }

    /// Register metrics with a Prometheus registry
    pub fn register(registry: &Registry) -> Result<(), prometheus::Error> {
        get_metrics().register(registry)
    }

    pub fn record_fetch(&self, kind: &str, outcome: &str) {
        get_metrics()
            .fetches
            .with_label_values(&[kind, outcome])
            .inc();
    }

    pub fn record_stale_discard(&self, kind: &str) {
        get_metrics().stale_discards.with_label_values(&[kind]).inc();
    }

    pub fn record_cache_hit(&self) {
        get_metrics().location_cache_hits.inc();
    }

    pub fn record_cache_miss(&self, reason: &str) {
        get_metrics()
            .location_cache_misses
            .with_label_values(&[reason])
            .inc();
    }

    pub fn record_location_failure(&self, reason: &str) {
        get_metrics()
            .location_failures
            .with_label_values(&[reason])
            .inc();
    }
}
