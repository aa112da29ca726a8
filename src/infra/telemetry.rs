use std::sync::Once;

use metrics::{Unit, describe_counter, describe_gauge, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
///
/// Logs go to stderr so that command output on stdout stays machine readable.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "quire_cache_hit_total",
            Unit::Count,
            "Total number of cache hits, labelled by cache."
        );
        describe_counter!(
            "quire_cache_miss_total",
            Unit::Count,
            "Total number of cache misses, including expired entries."
        );
        describe_counter!(
            "quire_cache_evict_total",
            Unit::Count,
            "Total number of cache evictions due to capacity."
        );
        describe_counter!(
            "quire_cache_expired_total",
            Unit::Count,
            "Total number of entries dropped after their TTL elapsed."
        );
        describe_counter!(
            "quire_loader_skipped_total",
            Unit::Count,
            "Total number of content files skipped because they could not be parsed."
        );
        describe_gauge!(
            "quire_loader_records",
            Unit::Count,
            "Number of records produced by the most recent load, labelled by kind."
        );
        describe_histogram!(
            "quire_loader_load_ms",
            Unit::Milliseconds,
            "Full content load latency in milliseconds."
        );
    });
}
