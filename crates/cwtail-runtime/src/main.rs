//! cwtail: tail many CloudWatch Logs groups at once.
//!
//! Event lines go to stdout; status lines and diagnostics go to stderr.

use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use cwtail_cloudwatch::CloudWatchBackend;
use cwtail_engine::{Announcer, LineFormatter, Orchestrator, Palette};
use tokio_util::sync::CancellationToken;

mod cli;
mod config;
mod context;

/// Upper bound on waiting for a stdout write still held by a blocking thread.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(250);

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run(args));
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    result
}

async fn run(args: cli::Cli) -> anyhow::Result<()> {
    let filter = std::env::var("CWTAIL_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let tail_config = config::tail_config(&args, chrono::Utc::now())?;
    let formatter = LineFormatter::new(
        config::display_options(&args),
        Palette::new(context::stdout_color(args.color)),
    );
    let announcer = Arc::new(
        Announcer::stderr(Palette::new(context::stderr_color(args.color)))
            .with_spinner(std::io::stderr().is_terminal()),
    );

    let backend =
        Arc::new(CloudWatchBackend::from_env(args.region.clone(), args.profile.clone()).await);

    let cancel = CancellationToken::new();
    watch_signals(cancel.clone())?;

    Orchestrator::new(backend, tail_config, formatter, announcer)
        .run(tokio::io::stdout(), cancel)
        .await?;
    Ok(())
}

/// Cancel the session on the first termination signal.
#[cfg(unix)]
fn watch_signals(cancel: CancellationToken) -> anyhow::Result<()> {
    use anyhow::Context;
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt()).context("failed to register SIGINT handler")?;
    let mut sigterm =
        signal(SignalKind::terminate()).context("failed to register SIGTERM handler")?;
    let mut sighup = signal(SignalKind::hangup()).context("failed to register SIGHUP handler")?;
    let mut sigquit = signal(SignalKind::quit()).context("failed to register SIGQUIT handler")?;

    tokio::spawn(async move {
        let name = tokio::select! {
            _ = sigint.recv() => "SIGINT",
            _ = sigterm.recv() => "SIGTERM",
            _ = sighup.recv() => "SIGHUP",
            _ = sigquit.recv() => "SIGQUIT",
        };
        tracing::info!("received {name}, shutting down");
        cancel.cancel();
    });
    Ok(())
}

#[cfg(not(unix))]
fn watch_signals(cancel: CancellationToken) -> anyhow::Result<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received ctrl-c, shutting down");
            cancel.cancel();
        }
    });
    Ok(())
}
