//! Logging initialization.
//!
//! Configures `tracing-subscriber` from the `[general]` section of
//! `ScanRelayConfig`. `RUST_LOG`, when set, replaces the configured level.

use anyhow::Result;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use scanrelay_core::config::GeneralConfig;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize the global tracing subscriber.
///
/// Must be called once per process, before any work starts.
///
/// * `"json"` - one JSON object per line with the current span flattened in
/// * `"pretty"` - human-readable multi-line output for local runs
pub fn init_tracing(config: &GeneralConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(format_layer(&config.log_format)?)
        .with(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing subscriber: {}", e))
}

fn format_layer(format: &str) -> Result<BoxedLayer> {
    match format {
        "json" => Ok(fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_span_list(false)
            .boxed()),
        "pretty" => Ok(fmt::layer().pretty().with_target(false).boxed()),
        other => Err(anyhow::anyhow!(
            "unknown log format '{}', expected 'json' or 'pretty'",
            other
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_formats_build_a_layer() {
        assert!(format_layer("json").is_ok());
        assert!(format_layer("pretty").is_ok());
    }

    #[test]
    fn unknown_format_is_rejected() {
        let err = format_layer("xml").err().unwrap();
        assert!(err.to_string().contains("xml"));
    }
}
