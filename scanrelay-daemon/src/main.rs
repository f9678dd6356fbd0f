use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use scanrelay_daemon::cli::{Cli, Command};
use scanrelay_daemon::enqueue::enqueue;
use scanrelay_daemon::logging::init_tracing;
use scanrelay_daemon::metrics_server::install_metrics_recorder;
use scanrelay_daemon::runtime::{
    StageRuntime, connect_store, load_config, prepare_directories, shutdown_token,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli).await?;

    if cli.validate {
        println!("configuration is valid");
        return Ok(());
    }

    init_tracing(&config.general)?;
    tracing::info!(
        command = cli.command.name(),
        version = env!("CARGO_PKG_VERSION"),
        "scanrelay starting"
    );

    // one-shot command
    if let Command::Enqueue(args) = &cli.command {
        let store = connect_store(&config).await?;
        let queue = enqueue(store.as_ref(), &args.image, args.action, args.size).await?;
        println!("{} -> {}", args.image, queue);
        return Ok(());
    }

    if let Some(port) = cli.command.default_metrics_port() {
        install_metrics_recorder(&config.metrics, port)?;
    }
    if matches!(
        cli.command,
        Command::Pull | Command::Scan | Command::Sbom | Command::Size
    ) {
        prepare_directories(&config.paths).await?;
    }

    let store = connect_store(&config).await?;
    let runtime = StageRuntime::new(store, &config)?;
    let shutdown = shutdown_token()?;

    runtime
        .run_command(&cli.command, Arc::new(config), shutdown)
        .await?;

    tracing::info!(command = cli.command.name(), "scanrelay shut down");
    Ok(())
}
