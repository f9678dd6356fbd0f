//! Process bootstrap and stage wiring.
//!
//! Startup order for a worker process:
//!
//! 1. Load `scanrelay.toml` (optional), apply environment overrides, then CLI
//!    overrides, then validate
//! 2. Initialize logging and the metrics endpoint
//! 3. Create the image and report directories
//! 4. Connect to the queue store (with retries)
//! 5. Run the stage engine until SIGTERM / SIGINT

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use scanrelay_core::config::{PathsConfig, ScanRelayConfig};
use scanrelay_core::notifier::{ErrorNotifier, NoopNotifier};
use scanrelay_queue::{ClaimRelease, QueueStore, RedisQueue};
use scanrelay_worker::{
    Engine, ErrorHandler, ProcessRunner, PullStage, PushStage, ScanStage, SizeStage, Stage,
    WebhookSink, WorkerContext,
};

use crate::cli::{Cli, Command};
use crate::exporter::{EXPORT_INTERVAL, run_exporter};

/// Load and validate configuration for `cli`.
///
/// Precedence: CLI flags > environment variables > config file > defaults.
/// The push stage additionally requires a webhook URL.
pub async fn load_config(cli: &Cli) -> Result<ScanRelayConfig> {
    let mut config = match &cli.config {
        Some(path) => ScanRelayConfig::from_file(path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?,
        None => ScanRelayConfig::default(),
    };
    config.apply_env_overrides();

    if let Some(level) = &cli.log_level {
        config.general.log_level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.general.log_format = format.clone();
    }
    if let Some(port) = cli.metrics_port {
        config.metrics.port = Some(port);
    }

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;
    if cli.command == Command::Push {
        config
            .require_webhook()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;
    }
    Ok(config)
}

/// Create the working directories if they do not exist yet.
pub async fn prepare_directories(paths: &PathsConfig) -> Result<()> {
    for dir in [&paths.images_dir, &paths.reports_dir] {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| anyhow::anyhow!("failed to create {}: {}", dir.display(), e))?;
    }
    Ok(())
}

/// Queue-side settings shared by every stage engine of one process.
pub struct StageRuntime<Q> {
    store: Arc<Q>,
    host: String,
    release: ClaimRelease,
    retry_interval: Duration,
    notifier: Arc<dyn ErrorNotifier>,
}

impl<Q: QueueStore> StageRuntime<Q> {
    pub fn new(store: Arc<Q>, config: &ScanRelayConfig) -> Result<Self> {
        let release = config
            .queue
            .claim_release
            .parse::<ClaimRelease>()
            .map_err(|e| anyhow::anyhow!("{}", e))?;
        Ok(Self {
            store,
            host: config.host_identity(),
            release,
            retry_interval: Duration::from_secs(config.queue.retry_interval_secs),
            notifier: Arc::new(NoopNotifier),
        })
    }

    /// Replace the error notifier (defaults to a no-op).
    pub fn with_notifier(mut self, notifier: Arc<dyn ErrorNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn store(&self) -> &Arc<Q> {
        &self.store
    }

    /// Build the engine for `stage` without running it.
    pub fn engine<S: Stage>(&self, stage: S) -> Engine<Q, S> {
        let handler = ErrorHandler::new(stage.name(), Arc::clone(&self.notifier));
        Engine::new(Arc::clone(&self.store), stage, &self.host, handler)
            .with_claim_release(self.release)
            .with_retry_interval(self.retry_interval)
    }

    /// Run `stage` until `shutdown` fires.
    pub async fn serve<S: Stage>(&self, stage: S, shutdown: CancellationToken) {
        self.engine(stage).run(shutdown).await;
    }

    /// Run the worker selected by `command` until `shutdown` fires.
    ///
    /// # Errors
    ///
    /// - `enqueue` is not a worker
    /// - The push stage cannot build its webhook client
    pub async fn run_command(
        &self,
        command: &Command,
        config: Arc<ScanRelayConfig>,
        shutdown: CancellationToken,
    ) -> Result<()> {
        let ctx = WorkerContext::new(Arc::new(ProcessRunner), Arc::clone(&config));

        match command {
            Command::Pull => self.serve(PullStage::new(ctx), shutdown).await,
            Command::Scan => self.serve(ScanStage::vulnerabilities(ctx), shutdown).await,
            Command::Sbom => self.serve(ScanStage::sbom(ctx), shutdown).await,
            Command::Size => self.serve(SizeStage::new(ctx), shutdown).await,
            Command::Push => {
                let url = config
                    .require_webhook()
                    .map_err(|e| anyhow::anyhow!("{}", e))?;
                let sink = WebhookSink::new(url, Duration::from_secs(config.push.timeout_secs))?;
                tracing::info!(webhook = %sink.url(), "webhook sink ready");
                self.serve(PushStage::new(sink), shutdown).await;
            }
            Command::QueueExporter => {
                run_exporter(
                    Arc::clone(&self.store),
                    self.host.clone(),
                    config.queue.exported_queues.clone(),
                    EXPORT_INTERVAL,
                    shutdown,
                )
                .await;
            }
            Command::Enqueue(_) => {
                return Err(anyhow::anyhow!("enqueue is not a long-running worker"));
            }
        }
        Ok(())
    }
}

/// Connect to the configured Redis store, retrying per `[queue]`.
pub async fn connect_store(config: &ScanRelayConfig) -> Result<Arc<RedisQueue>> {
    let store = RedisQueue::from_config(&config.queue)
        .await
        .map_err(|e| anyhow::anyhow!("failed to connect to queue store: {}", e))?;
    tracing::info!(url = %store.url(), "connected to queue store");
    Ok(Arc::new(store))
}

/// Return a token that is cancelled on the first SIGTERM or SIGINT.
pub fn shutdown_token() -> Result<CancellationToken> {
    let token = CancellationToken::new();
    let signals = ShutdownSignals::install()?;
    let trigger = token.clone();
    tokio::spawn(async move {
        let signal = signals.wait().await;
        tracing::info!(signal, "shutdown signal received, finishing current item");
        trigger.cancel();
    });
    Ok(token)
}

#[cfg(unix)]
struct ShutdownSignals {
    sigterm: tokio::signal::unix::Signal,
    sigint: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl ShutdownSignals {
    fn install() -> Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        let sigterm = signal(SignalKind::terminate())
            .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
        let sigint = signal(SignalKind::interrupt())
            .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;
        Ok(Self { sigterm, sigint })
    }

    async fn wait(mut self) -> &'static str {
        tokio::select! {
            _ = self.sigterm.recv() => "SIGTERM",
            _ = self.sigint.recv() => "SIGINT",
        }
    }
}

#[cfg(not(unix))]
struct ShutdownSignals;

#[cfg(not(unix))]
impl ShutdownSignals {
    fn install() -> Result<Self> {
        Ok(Self)
    }

    async fn wait(self) -> &'static str {
        let _ = tokio::signal::ctrl_c().await;
        "ctrl-c"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanrelay_queue::MemoryQueue;

    fn config() -> ScanRelayConfig {
        let mut config = ScanRelayConfig::default();
        config.general.host_id = Some("node-7".to_owned());
        config.queue.claim_release = "remove-value".to_owned();
        config
    }

    #[test]
    fn engine_uses_host_scoped_claim_list() {
        let runtime = StageRuntime::new(Arc::new(MemoryQueue::new()), &config()).unwrap();
        let ctx = WorkerContext::new(Arc::new(ProcessRunner), Arc::new(config()));
        let engine = runtime.engine(SizeStage::new(ctx));

        assert_eq!(runtime.host(), "node-7");
        assert_eq!(engine.claim_list().name(), "processing_getsize_node-7");
        assert_eq!(engine.handler().stage(), "size");
    }

    #[test]
    fn unknown_claim_release_is_rejected() {
        let mut config = config();
        config.queue.claim_release = "forget".to_owned();
        assert!(StageRuntime::new(Arc::new(MemoryQueue::new()), &config).is_err());
    }

    #[tokio::test]
    async fn cancelled_worker_returns_immediately() {
        let runtime = StageRuntime::new(Arc::new(MemoryQueue::new()), &config()).unwrap();
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        tokio::time::timeout(
            Duration::from_secs(2),
            runtime.run_command(&Command::Pull, Arc::new(config()), shutdown),
        )
        .await
        .expect("worker should stop")
        .unwrap();
    }

    #[tokio::test]
    async fn enqueue_is_not_a_worker() {
        let runtime = StageRuntime::new(Arc::new(MemoryQueue::new()), &config()).unwrap();
        let command = Command::Enqueue(crate::cli::EnqueueArgs {
            image: "alpine".to_owned(),
            action: scanrelay_core::message::NextAction::Scan,
            size: false,
        });
        let result = runtime
            .run_command(&command, Arc::new(config()), CancellationToken::new())
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn prepare_directories_creates_both_paths() {
        let root = tempfile::tempdir().unwrap();
        let paths = PathsConfig {
            images_dir: root.path().join("a/images"),
            reports_dir: root.path().join("b/reports"),
        };
        prepare_directories(&paths).await.unwrap();
        assert!(paths.images_dir.is_dir());
        assert!(paths.reports_dir.is_dir());
    }
}
