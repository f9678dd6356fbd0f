//! CLI argument definitions for the `scanrelay` binary.
//!
//! Each pipeline stage runs as its own process, selected by subcommand.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use scanrelay_core::message::NextAction;

/// Queue-driven container image scanning workers.
#[derive(Parser, Debug)]
#[command(name = "scanrelay")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to a scanrelay.toml configuration file.
    ///
    /// Without it, built-in defaults plus environment variables are used.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Override the Prometheus listener port of this process.
    #[arg(long, global = true)]
    pub metrics_port: Option<u16>,

    /// Validate configuration and exit without connecting to the queue store.
    #[arg(long, global = true)]
    pub validate: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Pull images from `topull` into tarballs for scanning.
    Pull,
    /// Scan tarballs from `toscan` for vulnerabilities.
    Scan,
    /// Generate CycloneDX SBOMs for tarballs from `tosbom`.
    Sbom,
    /// Measure per-architecture uncompressed sizes for images from `getsize`.
    Size,
    /// Deliver results from `topush` to the webhook.
    Push,
    /// Publish queue lengths as Prometheus gauges.
    QueueExporter,
    /// Enqueue an image for processing.
    Enqueue(EnqueueArgs),
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct EnqueueArgs {
    /// Image reference, e.g. registry.example.com/busybox:latest
    pub image: String,

    /// Work to perform after the pull (scan, sbom).
    #[arg(long, default_value = "scan")]
    pub action: NextAction,

    /// Queue a multi-architecture size query instead of a pull.
    #[arg(long)]
    pub size: bool,
}

impl Command {
    /// Name used for logging, metrics labels and error handling.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pull => "pull",
            Self::Scan => "scan",
            Self::Sbom => "sbom",
            Self::Size => "size",
            Self::Push => "push",
            Self::QueueExporter => "queue-exporter",
            Self::Enqueue(_) => "enqueue",
        }
    }

    /// Prometheus port used when neither config nor flags set one.
    ///
    /// `enqueue` is a one-shot command and never serves metrics.
    pub fn default_metrics_port(&self) -> Option<u16> {
        match self {
            Self::Scan => Some(8081),
            Self::Pull => Some(8082),
            Self::Push => Some(8083),
            Self::Size => Some(8084),
            Self::Sbom => Some(8085),
            Self::QueueExporter => Some(8086),
            Self::Enqueue(_) => None,
        }
    }
}
