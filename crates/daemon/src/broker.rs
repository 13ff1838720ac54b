// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Frame relay between the client-facing and worker-facing sockets.
//!
//! The broker never looks inside a frame. Client identities are added and
//! removed by the router socket; worker selection belongs to the dealer.

use std::net::SocketAddr;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::socket::{DealerSocket, DealerStats, RouteError, RouterSocket};

pub struct Broker {
    frontend: RouterSocket,
    backend: DealerSocket,
}

impl Broker {
    pub fn new(frontend: RouterSocket, backend: DealerSocket) -> Self {
        Self { frontend, backend }
    }

    pub fn frontend_addr(&self) -> SocketAddr {
        self.frontend.local_addr()
    }

    pub fn backend_addr(&self) -> SocketAddr {
        self.backend.local_addr()
    }

    pub fn backend_stats(&self) -> watch::Receiver<DealerStats> {
        self.backend.watch_stats()
    }

    /// Relay frames in both directions until `shutdown` is cancelled.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(
            frontend = %self.frontend.local_addr(),
            backend = %self.backend.local_addr(),
            "broker relaying"
        );

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,

                inbound = self.frontend.recv() => {
                    let Some(frame) = inbound else {
                        error!("Front end closed");
                        break;
                    };
                    trace!(segments = frame.len(), "client -> worker");
                    if let Err(e) = self.backend.send(frame) {
                        error!("Relay to back end failed: {}", e);
                    }
                }

                reply = self.backend.recv() => {
                    let Some(frame) = reply else {
                        error!("Back end closed");
                        break;
                    };
                    trace!(segments = frame.len(), "worker -> client");
                    match self.frontend.send(frame) {
                        Ok(()) => {}
                        Err(RouteError::NoRoute(peer)) => {
                            debug!(%peer, "Dropping reply for disconnected client")
                        }
                        Err(e) => warn!("Dropping reply: {}", e),
                    }
                }
            }
        }

        info!("broker stopped");
    }
}

#[cfg(test)]
#[path = "broker_tests.rs"]
mod tests;
