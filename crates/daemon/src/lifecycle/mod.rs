// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: configuration, startup, shutdown.

mod startup;
pub use startup::startup;

use std::net::SocketAddr;

use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::broker::Broker;
use crate::env;
use crate::pool::{PoolError, PoolHandle, PoolStatus, RestartPolicy, WorkerMode};
use crate::socket::DealerStats;

/// Daemon configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Client-facing address
    pub frontend: SocketAddr,
    /// Worker-facing address
    pub backend: SocketAddr,
    /// Number of worker units
    pub workers: usize,
    pub worker_mode: WorkerMode,
    pub restart: RestartPolicy,
}

impl Config {
    /// Load configuration from `FILERD_*` environment variables, falling back
    /// to the default loopback ports and one worker per processing unit.
    pub fn load() -> Result<Self, LifecycleError> {
        Ok(Self {
            frontend: env::frontend_addr()?,
            backend: env::backend_addr()?,
            workers: env::worker_count()?,
            worker_mode: env::worker_mode()?,
            restart: env::restart_policy()?,
        })
    }
}

/// A started daemon: both endpoints bound, workers spawned.
pub struct Daemon {
    broker: Broker,
    pool: PoolHandle,
    shutdown: CancellationToken,
    frontend: SocketAddr,
    backend: SocketAddr,
}

impl Daemon {
    /// Bound front-end address (resolves port 0)
    pub fn frontend_addr(&self) -> SocketAddr {
        self.frontend
    }

    /// Bound back-end address (resolves port 0)
    pub fn backend_addr(&self) -> SocketAddr {
        self.backend
    }

    pub fn backend_stats(&self) -> watch::Receiver<DealerStats> {
        self.broker.backend_stats()
    }

    pub fn pool_status(&self) -> watch::Receiver<PoolStatus> {
        self.pool.watch_status()
    }

    /// Token that stops the daemon when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Relay until shutdown, then wait for the workers to stop.
    pub async fn run(self) {
        let Self { broker, pool, shutdown, .. } = self;
        broker.run(shutdown.clone()).await;
        // The relay only returns early if a socket closed; stop the pool too
        shutdown.cancel();
        pool.join().await;
        info!("daemon stopped");
    }
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Failed to bind {0}: {1}")]
    BindFailed(SocketAddr, #[source] std::io::Error),

    #[error("Invalid {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },

    #[error("Worker pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
