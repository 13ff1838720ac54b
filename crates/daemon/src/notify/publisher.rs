// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fan-out notification publisher, standing in for the external file watcher.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error};

use filer_core::Notification;

const BACKLOG: usize = 1024;

/// Broadcasts every published line to all connected subscribers.
pub struct Publisher {
    local_addr: SocketAddr,
    lines: broadcast::Sender<Bytes>,
    subscribers: watch::Receiver<usize>,
    accept_task: JoinHandle<()>,
}

impl Publisher {
    pub async fn bind(addr: impl ToSocketAddrs) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        let (lines, _) = broadcast::channel(BACKLOG);
        let (count_tx, subscribers) = watch::channel(0);
        let accept_task = tokio::spawn(accept_loop(listener, lines.clone(), Arc::new(count_tx)));
        Ok(Self { local_addr, lines, subscribers, accept_task })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Send `notification` to every subscriber; returns how many were connected.
    pub fn publish(&self, notification: &Notification) -> usize {
        match serde_json::to_vec(notification) {
            Ok(json) => self.publish_raw(&json),
            Err(e) => {
                error!("Failed to encode notification: {}", e);
                0
            }
        }
    }

    /// Send one line verbatim (a newline is appended).
    pub fn publish_raw(&self, line: &[u8]) -> usize {
        let mut buf = BytesMut::with_capacity(line.len() + 1);
        buf.put_slice(line);
        buf.put_u8(b'\n');
        self.lines.send(buf.freeze()).unwrap_or(0)
    }

    /// Wait until at least `n` subscribers are connected.
    pub async fn wait_for_subscribers(&self, n: usize) {
        let mut subscribers = self.subscribers.clone();
        let _ = subscribers.wait_for(|count| *count >= n).await;
    }
}

impl Drop for Publisher {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

async fn accept_loop(listener: TcpListener, lines: broadcast::Sender<Bytes>, count: Arc<watch::Sender<usize>>) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                debug!(%addr, "subscriber connected");
                // Subscribe before counting so a publish after the count is seen
                let rx = lines.subscribe();
                count.send_modify(|n| *n += 1);
                tokio::spawn(serve_subscriber(stream, rx, Arc::clone(&count)));
            }
            Err(e) => error!("Publisher accept error: {}", e),
        }
    }
}

async fn serve_subscriber(
    mut stream: TcpStream,
    mut rx: broadcast::Receiver<Bytes>,
    count: Arc<watch::Sender<usize>>,
) {
    loop {
        match rx.recv().await {
            Ok(line) => {
                if stream.write_all(&line).await.is_err() {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => debug!(missed = n, "subscriber lagged"),
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
    count.send_modify(|n| *n = n.saturating_sub(1));
}
