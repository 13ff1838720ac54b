// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! filerd: file-serving broker and its workers.
//!
//! `filerd` (or `filerd broker`) binds the front and back ends and starts the
//! worker pool. `filerd worker` runs a single worker; the pool launches these
//! in process mode.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use filer_daemon::lifecycle::{self, Config};
use filer_daemon::pool::{RestartPolicy, WorkerMode};
use filer_daemon::worker::Worker;
use filer_daemon::{env, telemetry};

#[derive(Debug, Parser)]
#[command(
    name = "filerd",
    version,
    about = "File-serving message broker",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    broker: BrokerArgs,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the broker and its worker pool (default)
    Broker(BrokerArgs),
    /// Run one worker connected to a broker back end
    Worker(WorkerArgs),
}

#[derive(Debug, Clone, Default, Args)]
struct BrokerArgs {
    /// Client-facing address [env: FILERD_FRONTEND]
    #[arg(long)]
    frontend: Option<SocketAddr>,
    /// Worker-facing address [env: FILERD_BACKEND]
    #[arg(long)]
    backend: Option<SocketAddr>,
    /// Number of workers [env: FILERD_WORKERS]
    #[arg(long, short = 'w')]
    workers: Option<usize>,
    /// How workers run: process or thread [env: FILERD_WORKER_MODE]
    #[arg(long)]
    worker_mode: Option<WorkerMode>,
    /// Restart exited workers: never or always [env: FILERD_RESTART]
    #[arg(long)]
    restart: Option<RestartPolicy>,
}

impl BrokerArgs {
    /// Apply command-line overrides on top of the environment.
    fn apply(&self, mut config: Config) -> Config {
        if let Some(addr) = self.frontend {
            config.frontend = addr;
        }
        if let Some(addr) = self.backend {
            config.backend = addr;
        }
        if let Some(n) = self.workers.filter(|n| *n > 0) {
            config.workers = n;
        }
        if let Some(mode) = self.worker_mode {
            config.worker_mode = mode;
        }
        if let Some(restart) = self.restart {
            config.restart = restart;
        }
        config
    }
}

#[derive(Debug, Clone, Args)]
struct WorkerArgs {
    /// Broker back-end address [env: FILERD_BACKEND]
    #[arg(long)]
    backend: Option<SocketAddr>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Err(e) = telemetry::init(&env::log_filter()) {
        eprintln!("filerd: {}", e);
    }

    // Each process is one single-threaded event loop
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build runtime")?;
    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> Result<()> {
    let shutdown = CancellationToken::new();
    tokio::spawn(cancel_on_ctrl_c(shutdown.clone()));

    match cli.command {
        Some(Command::Worker(args)) => {
            let backend = match args.backend {
                Some(addr) => addr,
                None => env::backend_addr()?,
            };
            Worker::new().run(backend, shutdown).await.context("worker stopped")?;
        }
        Some(Command::Broker(args)) => serve(&args, shutdown).await?,
        None => serve(&cli.broker, shutdown).await?,
    }
    Ok(())
}

async fn serve(args: &BrokerArgs, shutdown: CancellationToken) -> Result<()> {
    let config = args.apply(Config::load()?);
    let daemon = lifecycle::startup(&config, shutdown).await?;
    info!(frontend = %daemon.frontend_addr(), "Broker ready");
    daemon.run().await;
    Ok(())
}

async fn cancel_on_ctrl_c(shutdown: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("Interrupt received, shutting down");
            shutdown.cancel();
        }
        Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
