use std::sync::Once;

use metrics::{Unit, describe_counter};
use thiserror::Error;
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

static METRIC_DESCRIPTIONS: Once = Once::new();

#[derive(Debug, Error)]
#[error("failed to install tracing subscriber: {0}")]
pub struct TelemetryError(String);

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), TelemetryError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| TelemetryError(err.to_string()))
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "chiaro_docs_cache_hit_total",
            Unit::Count,
            "Total number of render-cache hits."
        );
        describe_counter!(
            "chiaro_docs_cache_miss_total",
            Unit::Count,
            "Total number of render-cache misses."
        );
        describe_counter!(
            "chiaro_docs_cache_evict_total",
            Unit::Count,
            "Total number of entries evicted by push-driven invalidation."
        );
        describe_counter!(
            "chiaro_docs_cache_flush_total",
            Unit::Count,
            "Total number of full cache flushes."
        );
        describe_counter!(
            "chiaro_docs_render_failure_total",
            Unit::Count,
            "Total number of render pipeline failures."
        );
    });
}
