// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! filer daemon library
//!
//! The broker, its sockets and worker pool, plus the client-side pieces
//! (request client, notification subscriber) used by the CLI.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod broker;
pub mod client;
pub mod env;
pub mod lifecycle;
pub mod notify;
pub mod pool;
pub mod socket;
pub mod telemetry;
pub mod worker;

pub use broker::Broker;
pub use client::{Client, ClientError};
pub use lifecycle::{startup, Config, Daemon, LifecycleError};
pub use notify::{SubscribeError, Subscriber};
pub use pool::{RestartPolicy, WorkerMode, WorkerPool};
pub use worker::Worker;
