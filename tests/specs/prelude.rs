// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared harness: an in-process daemon with thread-mode workers.

use std::net::SocketAddr;
use std::time::Duration;

pub use filer_core::{ErrorKind, Reply};
pub use filer_daemon::Client;
use filer_daemon::{startup, Config, RestartPolicy, WorkerMode};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const TIMEOUT: Duration = Duration::from_secs(10);

pub struct Daemon {
    pub frontend: SocketAddr,
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Daemon {
    /// Start a daemon on ephemeral ports and wait until `workers` workers joined.
    pub async fn start(workers: usize) -> Self {
        let config = Config {
            frontend: "127.0.0.1:0".parse().unwrap(),
            backend: "127.0.0.1:0".parse().unwrap(),
            workers,
            worker_mode: WorkerMode::Thread,
            restart: RestartPolicy::Never,
        };
        let shutdown = CancellationToken::new();
        let daemon = startup(&config, shutdown.clone()).await.expect("daemon startup");
        let frontend = daemon.frontend_addr();
        let mut stats = daemon.backend_stats();
        let task = tokio::spawn(daemon.run());
        tokio::time::timeout(TIMEOUT, stats.wait_for(|s| s.workers == workers))
            .await
            .expect("workers did not join")
            .expect("dealer closed");
        Self { frontend, shutdown, task: Some(task) }
    }

    pub async fn client(&self) -> Client {
        Client::connect(self.frontend).await.unwrap()
    }

    pub async fn stop(mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.take() {
            tokio::time::timeout(TIMEOUT, task).await.expect("daemon did not stop").unwrap();
        }
    }
}

impl Drop for Daemon {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Unwrap a content reply.
pub fn content(reply: Reply) -> filer_core::FileResponse {
    match reply {
        Reply::Content(response) => response,
        Reply::Error(e) => panic!("expected content, got error {:?}", e),
    }
}
