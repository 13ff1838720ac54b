// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker-facing dealer socket.
//!
//! Workers connect and announce themselves with a READY handshake. Each
//! outbound frame goes to the worker that has been idle longest; a worker
//! holding a request is skipped until it replies. Frames with no idle worker
//! wait in arrival order.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use filer_wire::Frame;

use super::{next_frame, split_connection};

/// The dealer's dispatch task is gone
#[derive(Debug, Error)]
#[error("Dealer socket closed")]
pub struct DealerClosed;

/// Snapshot of back-end capacity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DealerStats {
    /// Workers that completed the handshake and are still connected
    pub workers: usize,
    /// Workers with no outstanding request
    pub idle: usize,
    /// Frames waiting for an idle worker
    pub pending: usize,
}

type WorkerKey = u64;

#[derive(Debug)]
pub(crate) enum DealerEvent {
    Joined { key: WorkerKey, pid: u32, tx: mpsc::UnboundedSender<Frame> },
    Reply { key: WorkerKey, frame: Frame },
    Left { key: WorkerKey },
    Dispatch(Frame),
}

struct WorkerSlot {
    pid: u32,
    tx: mpsc::UnboundedSender<Frame>,
    busy: bool,
}

/// Queueing state for one dealer, driven one event at a time.
pub(crate) struct Dispatcher {
    workers: HashMap<WorkerKey, WorkerSlot>,
    idle: VecDeque<WorkerKey>,
    pending: VecDeque<Frame>,
    replies: mpsc::UnboundedSender<Frame>,
}

impl Dispatcher {
    pub(crate) fn new(replies: mpsc::UnboundedSender<Frame>) -> Self {
        Self {
            workers: HashMap::new(),
            idle: VecDeque::new(),
            pending: VecDeque::new(),
            replies,
        }
    }

    pub(crate) fn stats(&self) -> DealerStats {
        DealerStats {
            workers: self.workers.len(),
            idle: self.idle.len(),
            pending: self.pending.len(),
        }
    }

    pub(crate) fn handle(&mut self, event: DealerEvent) {
        match event {
            DealerEvent::Joined { key, pid, tx } => {
                info!("Worker {} is online", pid);
                self.workers.insert(key, WorkerSlot { pid, tx, busy: false });
                self.idle.push_back(key);
            }
            DealerEvent::Reply { key, frame } => {
                let Some(slot) = self.workers.get_mut(&key) else {
                    return;
                };
                if !slot.busy {
                    warn!(pid = slot.pid, "Dropping unsolicited frame from idle worker");
                    return;
                }
                slot.busy = false;
                self.idle.push_back(key);
                if self.replies.send(frame).is_err() {
                    debug!("Reply dropped: dealer owner is gone");
                }
            }
            DealerEvent::Left { key } => self.remove(key),
            DealerEvent::Dispatch(frame) => self.pending.push_back(frame),
        }
        self.drain();
    }

    fn remove(&mut self, key: WorkerKey) {
        let Some(slot) = self.workers.remove(&key) else {
            return;
        };
        self.idle.retain(|k| *k != key);
        if slot.busy {
            warn!(pid = slot.pid, "Worker disconnected with a request in flight; request lost");
        }
        info!(pid = slot.pid, remaining = self.workers.len(), "Worker went offline");
    }

    /// Hand pending frames to idle workers, oldest of each first.
    fn drain(&mut self) {
        while !self.pending.is_empty() {
            let Some(key) = self.idle.pop_front() else {
                break;
            };
            let Some(slot) = self.workers.get_mut(&key) else {
                continue;
            };
            let Some(frame) = self.pending.pop_front() else {
                break;
            };
            match slot.tx.send(frame) {
                Ok(()) => slot.busy = true,
                Err(mpsc::error::SendError(frame)) => {
                    // Connection writer already gone; requeue and forget the worker
                    self.pending.push_front(frame);
                    self.remove(key);
                }
            }
        }
    }
}

/// Accepts worker connections and fair-queues frames across them.
pub struct DealerSocket {
    local_addr: SocketAddr,
    events: mpsc::UnboundedSender<DealerEvent>,
    replies: mpsc::UnboundedReceiver<Frame>,
    stats: watch::Receiver<DealerStats>,
    tasks: Vec<JoinHandle<()>>,
}

impl DealerSocket {
    pub async fn bind(addr: impl ToSocketAddrs) -> std::io::Result<Self> {
        Self::from_listener(TcpListener::bind(addr).await?)
    }

    pub fn from_listener(listener: TcpListener) -> std::io::Result<Self> {
        let local_addr = listener.local_addr()?;
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (replies_tx, replies) = mpsc::unbounded_channel();
        let (stats_tx, stats) = watch::channel(DealerStats::default());

        let dispatcher = Dispatcher::new(replies_tx);
        let tasks = vec![
            tokio::spawn(run_dispatcher(dispatcher, events_rx, stats_tx)),
            tokio::spawn(accept_loop(listener, events_tx.clone())),
        ];
        Ok(Self { local_addr, events: events_tx, replies, stats, tasks })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Queue a frame for the next idle worker.
    pub fn send(&self, frame: Frame) -> Result<(), DealerClosed> {
        self.events.send(DealerEvent::Dispatch(frame)).map_err(|_| DealerClosed)
    }

    /// Next reply from any worker.
    pub async fn recv(&mut self) -> Option<Frame> {
        self.replies.recv().await
    }

    pub fn stats(&self) -> DealerStats {
        *self.stats.borrow()
    }

    /// Watch channel that updates after every dispatcher event.
    pub fn watch_stats(&self) -> watch::Receiver<DealerStats> {
        self.stats.clone()
    }
}

impl Drop for DealerSocket {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

async fn run_dispatcher(
    mut dispatcher: Dispatcher,
    mut events: mpsc::UnboundedReceiver<DealerEvent>,
    stats: watch::Sender<DealerStats>,
) {
    while let Some(event) = events.recv().await {
        dispatcher.handle(event);
        stats.send_replace(dispatcher.stats());
    }
}

async fn accept_loop(listener: TcpListener, events: mpsc::UnboundedSender<DealerEvent>) {
    let mut next_key: WorkerKey = 0;
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                debug!(%addr, "worker connection");
                next_key += 1;
                tokio::spawn(serve_worker(stream, next_key, events.clone()));
            }
            Err(e) => error!("Dealer accept error: {}", e),
        }
    }
}

async fn serve_worker(stream: TcpStream, key: WorkerKey, events: mpsc::UnboundedSender<DealerEvent>) {
    let (mut reader, tx, _writer) = split_connection(stream);

    let pid = match next_frame(&mut reader).await {
        Some(frame) => match frame.as_ready() {
            Some(pid) => pid,
            None => {
                warn!(segments = frame.len(), "Worker did not start with READY; closing");
                return;
            }
        },
        None => return,
    };

    if events.send(DealerEvent::Joined { key, pid, tx }).is_err() {
        return;
    }
    while let Some(frame) = next_frame(&mut reader).await {
        if events.send(DealerEvent::Reply { key, frame }).is_err() {
            return;
        }
    }
    let _ = events.send(DealerEvent::Left { key });
}

#[cfg(test)]
#[path = "dealer_tests.rs"]
mod tests;
