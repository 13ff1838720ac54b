// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Change-notification subscriber.
//!
//! An external watcher broadcasts one JSON line per changed file on a
//! fan-out address. Subscribers are passive: nothing is acknowledged, and a
//! notification broadcast twice is delivered twice.

#[cfg(any(test, feature = "test-support"))]
mod publisher;
#[cfg(any(test, feature = "test-support"))]
pub use publisher::Publisher;

use futures_util::StreamExt;
use thiserror::Error;
use tokio::io::AsyncRead;
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use filer_core::Notification;
use filer_wire::{LdjCodec, LdjError, LdjEvent};

#[derive(Debug, Error)]
pub enum SubscribeError {
    #[error("Failed to connect to notification channel: {0}")]
    Connect(#[source] std::io::Error),

    #[error("Notification stream error: {0}")]
    Stream(#[from] LdjError),
}

pub struct Subscriber<R = TcpStream> {
    lines: FramedRead<R, LdjCodec>,
    filter: String,
}

impl Subscriber<TcpStream> {
    /// Subscribe to notifications whose file path starts with `filter`.
    /// An empty filter receives everything.
    pub async fn connect(addr: impl ToSocketAddrs, filter: impl Into<String>) -> Result<Self, SubscribeError> {
        let stream = TcpStream::connect(addr).await.map_err(SubscribeError::Connect)?;
        Ok(Self::from_reader(stream, filter))
    }
}

impl<R: AsyncRead + Unpin> Subscriber<R> {
    pub fn from_reader(reader: R, filter: impl Into<String>) -> Self {
        Self { lines: FramedRead::new(reader, LdjCodec::new()), filter: filter.into() }
    }

    /// Next matching notification, or `None` once the publisher hangs up.
    ///
    /// Lines that are not notifications are logged and skipped.
    pub async fn recv(&mut self) -> Result<Option<Notification>, SubscribeError> {
        while let Some(event) = self.lines.next().await {
            match event? {
                LdjEvent::Message(value) => match Notification::from_value(value) {
                    Ok(n) if n.matches(&self.filter) => return Ok(Some(n)),
                    Ok(n) => trace!(file = %n.file, "filtered out"),
                    Err(e) => warn!("Skipping malformed notification: {}", e),
                },
                LdjEvent::Invalid { line, error } => {
                    warn!(line = %line, "Skipping invalid notification line: {}", error)
                }
                LdjEvent::Truncated { tail } => {
                    debug!(bytes = tail.len(), "Notification stream ended mid-line")
                }
            }
        }
        Ok(None)
    }

    /// Log every matching notification until the stream ends or `shutdown`
    /// is cancelled.
    pub async fn run(mut self, shutdown: CancellationToken) -> Result<(), SubscribeError> {
        loop {
            let next = tokio::select! {
                _ = shutdown.cancelled() => return Ok(()),
                next = self.recv() => next?,
            };
            match next {
                Some(notification) => info!("{}", notification),
                None => {
                    info!("Notification channel closed");
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
