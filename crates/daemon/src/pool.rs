// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker pool supervision.
//!
//! The pool starts a fixed number of worker units, each connecting to the
//! broker's back end on its own. A supervisor task per unit waits for the unit
//! to exit and logs the capacity left behind. With [`RestartPolicy::Always`]
//! the unit is respawned; with [`RestartPolicy::Never`] the capacity is gone
//! for the life of the pool.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::Stdio;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::worker::Worker;

/// How each worker unit runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WorkerMode {
    /// Child process running `filerd worker`
    #[default]
    Process,
    /// OS thread with its own single-threaded runtime
    Thread,
}

filer_core::simple_display! {
    WorkerMode {
        Process => "process",
        Thread => "thread",
    }
}

impl FromStr for WorkerMode {
    type Err = PoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "process" => Ok(Self::Process),
            "thread" => Ok(Self::Thread),
            _ => Err(PoolError::UnknownMode(s.to_string())),
        }
    }
}

/// What happens when a worker unit exits while the pool is running
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RestartPolicy {
    /// Capacity is permanently reduced
    #[default]
    Never,
    /// Respawn the unit after a short delay
    Always,
}

filer_core::simple_display! {
    RestartPolicy {
        Never => "never",
        Always => "always",
    }
}

impl FromStr for RestartPolicy {
    type Err = PoolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "never" => Ok(Self::Never),
            "always" => Ok(Self::Always),
            _ => Err(PoolError::UnknownRestartPolicy(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("Failed to spawn worker: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Unknown worker mode {0:?} (expected process or thread)")]
    UnknownMode(String),

    #[error("Unknown restart policy {0:?} (expected never or always)")]
    UnknownRestartPolicy(String),
}

/// One available processing unit per worker.
pub fn default_pool_size() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

/// A running worker unit.
pub struct WorkerUnit {
    /// OS process id, for process units
    pub pid: Option<u32>,
    /// Resolves with a description of why the unit stopped
    pub exited: oneshot::Receiver<String>,
}

/// Starts worker units. A unit must stop once `shutdown` is cancelled.
pub trait Spawner: Send + Sync + 'static {
    fn spawn(&self, index: usize, shutdown: CancellationToken) -> Result<WorkerUnit, PoolError>;
}

/// Runs each worker as a child process of `program`.
#[derive(Debug, Clone)]
pub struct ProcessSpawner {
    program: PathBuf,
    backend: SocketAddr,
}

impl ProcessSpawner {
    pub fn new(program: impl Into<PathBuf>, backend: SocketAddr) -> Self {
        Self { program: program.into(), backend }
    }

    /// Spawn copies of the running executable.
    pub fn current_exe(backend: SocketAddr) -> Result<Self, PoolError> {
        Ok(Self::new(std::env::current_exe().map_err(PoolError::Spawn)?, backend))
    }
}

impl Spawner for ProcessSpawner {
    fn spawn(&self, index: usize, shutdown: CancellationToken) -> Result<WorkerUnit, PoolError> {
        let mut child = tokio::process::Command::new(&self.program)
            .arg("worker")
            .arg("--backend")
            .arg(self.backend.to_string())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(PoolError::Spawn)?;
        let pid = child.id();
        debug!(index, ?pid, "worker process spawned");

        // Reaper: report the exit, or kill the child on shutdown
        let (tx, exited) = oneshot::channel();
        tokio::spawn(async move {
            let reason = tokio::select! {
                status = child.wait() => match status {
                    Ok(status) => status.to_string(),
                    Err(e) => format!("wait failed: {}", e),
                },
                _ = shutdown.cancelled() => {
                    if let Err(e) = child.kill().await {
                        warn!(?pid, "Failed to kill worker process: {}", e);
                    }
                    "shut down".to_string()
                }
            };
            let _ = tx.send(reason);
        });

        Ok(WorkerUnit { pid, exited })
    }
}

/// Runs each worker on a dedicated OS thread inside this process.
#[derive(Debug, Clone)]
pub struct ThreadSpawner {
    backend: SocketAddr,
}

impl ThreadSpawner {
    pub fn new(backend: SocketAddr) -> Self {
        Self { backend }
    }
}

impl Spawner for ThreadSpawner {
    fn spawn(&self, index: usize, shutdown: CancellationToken) -> Result<WorkerUnit, PoolError> {
        let backend = self.backend;
        let (tx, exited) = oneshot::channel();
        std::thread::Builder::new()
            .name(format!("filer-worker-{}", index))
            .spawn(move || {
                let reason = match tokio::runtime::Builder::new_current_thread().enable_all().build()
                {
                    Ok(rt) => match rt.block_on(Worker::new().run(backend, shutdown)) {
                        Ok(()) => "shut down".to_string(),
                        Err(e) => e.to_string(),
                    },
                    Err(e) => format!("failed to build runtime: {}", e),
                };
                let _ = tx.send(reason);
            })
            .map_err(PoolError::Spawn)?;
        Ok(WorkerUnit { pid: None, exited })
    }
}

/// Capacity counters, published after every change
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStatus {
    /// Configured pool size
    pub target: usize,
    /// Units currently running
    pub live: usize,
    /// Units that exited while the pool was running
    pub exited: usize,
    /// Units respawned under [`RestartPolicy::Always`]
    pub restarted: usize,
}

const DEFAULT_RESTART_DELAY: Duration = Duration::from_millis(500);

pub struct WorkerPool {
    spawner: Arc<dyn Spawner>,
    size: usize,
    restart: RestartPolicy,
    restart_delay: Duration,
}

impl WorkerPool {
    pub fn new(spawner: Arc<dyn Spawner>, size: usize, restart: RestartPolicy) -> Self {
        Self { spawner, size, restart, restart_delay: DEFAULT_RESTART_DELAY }
    }

    pub fn with_restart_delay(mut self, delay: Duration) -> Self {
        self.restart_delay = delay;
        self
    }

    /// Spawn every unit and supervise them until `shutdown` is cancelled.
    ///
    /// If any unit fails to spawn, the units already started are stopped.
    pub fn start(self, shutdown: CancellationToken) -> Result<PoolHandle, PoolError> {
        let shutdown = shutdown.child_token();
        let (status_tx, status) = watch::channel(PoolStatus { target: self.size, ..Default::default() });
        let status_tx = Arc::new(status_tx);

        let mut units = Vec::with_capacity(self.size);
        for index in 0..self.size {
            match self.spawner.spawn(index, shutdown.clone()) {
                Ok(unit) => units.push(unit),
                Err(e) => {
                    shutdown.cancel();
                    return Err(e);
                }
            }
        }
        status_tx.send_modify(|s| s.live = units.len());
        info!(workers = self.size, restart = %self.restart, "worker pool started");

        let tasks = units
            .into_iter()
            .enumerate()
            .map(|(index, unit)| {
                tokio::spawn(supervise(Supervisor {
                    index,
                    spawner: Arc::clone(&self.spawner),
                    restart: self.restart,
                    restart_delay: self.restart_delay,
                    shutdown: shutdown.clone(),
                    status: Arc::clone(&status_tx),
                    unit,
                }))
            })
            .collect();

        Ok(PoolHandle { status, tasks })
    }
}

pub struct PoolHandle {
    status: watch::Receiver<PoolStatus>,
    tasks: Vec<JoinHandle<()>>,
}

impl PoolHandle {
    pub fn status(&self) -> PoolStatus {
        *self.status.borrow()
    }

    pub fn watch_status(&self) -> watch::Receiver<PoolStatus> {
        self.status.clone()
    }

    /// Wait until every supervisor has stopped: after shutdown, or once all
    /// units exited without restart.
    pub async fn join(self) {
        for task in self.tasks {
            if let Err(e) = task.await {
                error!("Pool supervisor failed: {}", e);
            }
        }
    }
}

struct Supervisor {
    index: usize,
    spawner: Arc<dyn Spawner>,
    restart: RestartPolicy,
    restart_delay: Duration,
    shutdown: CancellationToken,
    status: Arc<watch::Sender<PoolStatus>>,
    unit: WorkerUnit,
}

fn unit_label(index: usize, pid: Option<u32>) -> String {
    match pid {
        Some(pid) => pid.to_string(),
        None => format!("#{}", index),
    }
}

async fn supervise(mut sup: Supervisor) {
    loop {
        let label = unit_label(sup.index, sup.unit.pid);
        let reason = tokio::select! {
            reason = &mut sup.unit.exited => reason.unwrap_or_else(|_| "exit not reported".to_string()),
            _ = sup.shutdown.cancelled() => {
                // Units stop themselves on cancellation; wait for it
                let _ = (&mut sup.unit.exited).await;
                debug!(worker = %label, "worker stopped");
                return;
            }
        };
        if sup.shutdown.is_cancelled() {
            return;
        }

        sup.status.send_modify(|s| {
            s.live = s.live.saturating_sub(1);
            s.exited += 1;
        });
        let PoolStatus { target, live, .. } = *sup.status.borrow();
        warn!("Worker {} exited ({}); {} of {} workers remain", label, reason, live, target);

        if sup.restart == RestartPolicy::Never {
            return;
        }
        tokio::select! {
            _ = sup.shutdown.cancelled() => return,
            _ = tokio::time::sleep(sup.restart_delay) => {}
        }
        match sup.spawner.spawn(sup.index, sup.shutdown.clone()) {
            Ok(unit) => {
                sup.unit = unit;
                sup.status.send_modify(|s| {
                    s.live += 1;
                    s.restarted += 1;
                });
                info!(worker = %unit_label(sup.index, sup.unit.pid), "Worker restarted");
            }
            Err(e) => {
                error!("Failed to restart worker {}: {}", label, e);
                return;
            }
        }
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
