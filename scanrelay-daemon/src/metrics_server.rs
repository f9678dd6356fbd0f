//! Prometheus metrics HTTP server.
//!
//! Uses the built-in HTTP listener from `metrics-exporter-prometheus`.
//! Every worker process serves its own endpoint; the port comes from the
//! config or `--metrics-port`, falling back to a per-stage default.

use std::net::SocketAddr;

use anyhow::Result;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};

use scanrelay_core::config::MetricsConfig;
use scanrelay_core::metrics::{TOOL_DURATION_BUCKETS, TOOL_EXECUTION_DURATION_SECONDS};

/// Resolve the listener address for this process.
///
/// # Errors
///
/// - `listen_addr` is not an IP address
pub fn listen_addr(config: &MetricsConfig, default_port: u16) -> Result<SocketAddr> {
    let port = config.port.unwrap_or(default_port);
    format!("{}:{}", config.listen_addr, port)
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid metrics listen address: {}", e))
}

/// Install the global metrics recorder and start the HTTP listener.
///
/// Returns the bound address, or `None` when metrics are disabled.
///
/// # Errors
///
/// - Invalid listen address
/// - Global recorder is already installed
pub fn install_metrics_recorder(
    config: &MetricsConfig,
    default_port: u16,
) -> Result<Option<SocketAddr>> {
    if !config.enabled {
        tracing::info!("metrics server disabled");
        return Ok(None);
    }

    let addr = listen_addr(config, default_port)?;

    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(TOOL_EXECUTION_DURATION_SECONDS.to_owned()),
            &TOOL_DURATION_BUCKETS,
        )
        .map_err(|e| anyhow::anyhow!("invalid histogram buckets: {}", e))?
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("failed to install metrics recorder: {}", e))?;

    scanrelay_core::metrics::describe_all();

    tracing::info!(listen_addr = %addr, "Prometheus metrics endpoint active");
    Ok(Some(addr))
}
