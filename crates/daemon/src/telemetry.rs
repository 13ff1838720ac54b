// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log subscriber setup for the daemon and its worker processes.

use std::io::{self, IsTerminal};

use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Invalid log filter {0:?}: {1}")]
    Filter(String, String),

    #[error("Failed to install log subscriber: {0}")]
    Install(String),
}

/// Install a stderr fmt subscriber filtered by `filter` (EnvFilter directives).
///
/// Only the first call installs anything; later calls return an error that
/// callers may ignore.
pub fn init(filter: &str) -> Result<(), TelemetryError> {
    let env_filter =
        EnvFilter::try_new(filter).map_err(|e| TelemetryError::Filter(filter.to_string(), e.to_string()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .try_init()
        .map_err(|e| TelemetryError::Install(e.to_string()))
}
