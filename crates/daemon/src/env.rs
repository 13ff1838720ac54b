// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::net::SocketAddr;
use std::time::Duration;

use crate::lifecycle::LifecycleError;
use crate::pool::{default_pool_size, RestartPolicy, WorkerMode};

/// Client-facing front end
pub const DEFAULT_FRONTEND: &str = "127.0.0.1:60401";
/// Worker-facing back end
pub const DEFAULT_BACKEND: &str = "127.0.0.1:60402";
/// Change-notification fan-out
pub const DEFAULT_NOTIFY: &str = "127.0.0.1:60400";

fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn addr(name: &'static str, default: &str) -> Result<SocketAddr, LifecycleError> {
    let raw = var(name).unwrap_or_else(|| default.to_string());
    raw.parse().map_err(|_| LifecycleError::InvalidEnv { name, value: raw })
}

/// Front-end address: FILERD_FRONTEND > 127.0.0.1:60401
pub fn frontend_addr() -> Result<SocketAddr, LifecycleError> {
    addr("FILERD_FRONTEND", DEFAULT_FRONTEND)
}

/// Back-end address: FILERD_BACKEND > 127.0.0.1:60402
pub fn backend_addr() -> Result<SocketAddr, LifecycleError> {
    addr("FILERD_BACKEND", DEFAULT_BACKEND)
}

/// Notification address: FILERD_NOTIFY > 127.0.0.1:60400
pub fn notify_addr() -> Result<SocketAddr, LifecycleError> {
    addr("FILERD_NOTIFY", DEFAULT_NOTIFY)
}

/// Pool size: FILERD_WORKERS (at least 1) > available parallelism
pub fn worker_count() -> Result<usize, LifecycleError> {
    match var("FILERD_WORKERS") {
        None => Ok(default_pool_size()),
        Some(raw) => match raw.parse::<usize>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(LifecycleError::InvalidEnv { name: "FILERD_WORKERS", value: raw }),
        },
    }
}

/// Spawn mode: FILERD_WORKER_MODE > process
pub fn worker_mode() -> Result<WorkerMode, LifecycleError> {
    var("FILERD_WORKER_MODE").map_or(Ok(WorkerMode::default()), |raw| Ok(raw.parse()?))
}

/// Restart policy: FILERD_RESTART > never
pub fn restart_policy() -> Result<RestartPolicy, LifecycleError> {
    var("FILERD_RESTART").map_or(Ok(RestartPolicy::default()), |raw| Ok(raw.parse()?))
}

/// Log filter directives: FILERD_LOG > RUST_LOG > info
pub fn log_filter() -> String {
    var("FILERD_LOG").or_else(|| var("RUST_LOG")).unwrap_or_else(|| "info".to_string())
}

/// Client request timeout (default 5s, configurable via `FILER_TIMEOUT_MS`)
pub fn request_timeout() -> Duration {
    var("FILER_TIMEOUT_MS")
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
