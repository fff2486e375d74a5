#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod args;

use anyhow::Context;
use args::Args;
use clap::Parser;
use inferencia_config::Config;
use inferencia_server::Server;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::load(&args.config)
        .with_context(|| format!("failed to load configuration from {}", args.config.display()))?;

    let _telemetry_guard = inferencia_telemetry::init(&config.log, config.telemetry.as_ref())?;

    tracing::info!(
        config_path = %args.config.display(),
        backends = config.backends.len(),
        "starting inferencia"
    );

    let mut server = Server::new(&config)?;
    if let Some(listen) = args.listen {
        server = server.with_listen_address(listen);
    }

    let shutdown = CancellationToken::new();
    let shutdown_clone = shutdown.clone();

    tokio::spawn(async move {
        match shutdown_signal().await {
            Ok(()) => shutdown_clone.cancel(),
            Err(e) => tracing::error!(error = %e, "failed to listen for shutdown signals"),
        }
    });

    server.serve(shutdown).await?;

    tracing::info!("inferencia stopped");
    Ok(())
}

/// Wait for a shutdown signal (`SIGINT` or `SIGTERM`)
async fn shutdown_signal() -> std::io::Result<()> {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
        tokio::select! {
            result = ctrl_c => result?,
            _ = terminate.recv() => {}
        }
    }

    #[cfg(not(unix))]
    ctrl_c.await?;

    tracing::info!("shutdown signal received");
    Ok(())
}
