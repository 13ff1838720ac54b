// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::broker::Broker;
use crate::pool::{ProcessSpawner, Spawner, ThreadSpawner, WorkerMode, WorkerPool};
use crate::socket::{DealerSocket, RouterSocket};

use super::{Config, Daemon, LifecycleError};

/// Bind both endpoints, then start the worker pool against the bound back end.
pub async fn startup(config: &Config, shutdown: CancellationToken) -> Result<Daemon, LifecycleError> {
    // 1. Bind endpoints; they stay bound for the life of the daemon
    let frontend = TcpListener::bind(config.frontend)
        .await
        .map_err(|e| LifecycleError::BindFailed(config.frontend, e))?;
    let backend = TcpListener::bind(config.backend)
        .await
        .map_err(|e| LifecycleError::BindFailed(config.backend, e))?;
    let broker = Broker::new(RouterSocket::from_listener(frontend)?, DealerSocket::from_listener(backend)?);
    let (frontend, backend) = (broker.frontend_addr(), broker.backend_addr());

    // 2. Spawn workers against the address actually bound
    let spawner: Arc<dyn Spawner> = match config.worker_mode {
        WorkerMode::Process => Arc::new(ProcessSpawner::current_exe(backend)?),
        WorkerMode::Thread => Arc::new(ThreadSpawner::new(backend)),
    };
    let pool = WorkerPool::new(spawner, config.workers, config.restart).start(shutdown.clone())?;

    info!(
        %frontend,
        %backend,
        workers = config.workers,
        mode = %config.worker_mode,
        "daemon started"
    );
    Ok(Daemon { broker, pool, shutdown, frontend, backend })
}
