// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-reading worker.
//!
//! A worker connects to the broker's back end, announces its pid, then serves
//! one request at a time: parse `{ "path": ... }`, read the file, reply with
//! its contents. Every request gets exactly one reply; failures become error
//! replies rather than ending the worker.
//!
//! Paths are used as given. There is no sandboxing: any file readable by the
//! worker process can be requested.

use std::time::Duration;

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

use filer_core::{Clock, ErrorKind, FileRequest, FileResponse, Reply, SystemClock};
use filer_wire::{Frame, FrameCodec, ProtocolError};

/// Per-request lifecycle, for tracing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    RequestReceived,
    ReadingFile,
    ResponseSent,
}

filer_core::simple_display! {
    WorkerState {
        Idle => "idle",
        RequestReceived => "request_received",
        ReadingFile => "reading_file",
        ResponseSent => "response_sent",
    }
}

/// Errors that end a worker's connection to the broker
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Failed to connect to back end: {0}")]
    Connect(std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Back end closed the connection")]
    Disconnected,
}

const CONNECT_ATTEMPTS: u32 = 50;
const CONNECT_BACKOFF: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct Worker<C: Clock = SystemClock> {
    clock: C,
    pid: u32,
}

impl Worker<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for Worker<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> Worker<C> {
    pub fn with_clock(clock: C) -> Self {
        Self { clock, pid: std::process::id() }
    }

    /// Report `pid` instead of this process's id.
    pub fn with_pid(mut self, pid: u32) -> Self {
        self.pid = pid;
        self
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Serve one request payload.
    pub async fn handle(&self, payload: &[u8]) -> Reply {
        trace!(state = %WorkerState::RequestReceived);
        let request = match FileRequest::from_slice(payload) {
            Ok(request) => request,
            Err(e) => {
                info!(pid = self.pid, "received malformed request");
                return self.error(ErrorKind::MalformedRequest, e.to_string(), None);
            }
        };
        info!("{} received request for: {}", self.pid, request.path);

        trace!(state = %WorkerState::ReadingFile, path = %request.path);
        match tokio::fs::read(&request.path).await {
            Ok(bytes) => Reply::Content(FileResponse {
                content: String::from_utf8_lossy(&bytes).into_owned(),
                timestamp: self.clock.epoch_ms(),
                pid: self.pid,
            }),
            Err(e) => {
                debug!(path = %request.path, "read failed: {}", e);
                self.error(ErrorKind::from_io(&e), e.to_string(), Some(request.path))
            }
        }
    }

    /// Serve one frame from the back end, echoing its routing envelope.
    ///
    /// Requests sent without a delimiter are answered without one.
    pub async fn serve_frame(&self, frame: Frame) -> Frame {
        let envelope = frame.into_envelope();
        let reply = match envelope.payload.as_slice() {
            [body] => self.handle(body).await,
            other => self.error(
                ErrorKind::MalformedRequest,
                format!("expected 1 payload segment, got {}", other.len()),
                None,
            ),
        };
        info!("{} sending response", self.pid);
        let body = self.encode(&reply);
        envelope.reply(vec![body])
    }

    /// Connect to the back end and serve requests until `shutdown` is
    /// cancelled or the connection drops.
    pub async fn run(
        &self,
        backend: impl ToSocketAddrs + Clone,
        shutdown: CancellationToken,
    ) -> Result<(), WorkerError> {
        let stream = tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            stream = connect_with_retry(backend) => stream?,
        };
        let mut framed = Framed::new(stream, FrameCodec);
        framed.send(Frame::ready(self.pid)).await?;
        debug!(pid = self.pid, "worker ready");

        loop {
            trace!(state = %WorkerState::Idle);
            let frame = tokio::select! {
                _ = shutdown.cancelled() => return Ok(()),
                next = framed.next() => match next {
                    Some(frame) => frame?,
                    None => return Err(WorkerError::Disconnected),
                },
            };
            let reply = self.serve_frame(frame).await;
            framed.send(reply).await?;
            trace!(state = %WorkerState::ResponseSent);
        }
    }

    fn error(&self, kind: ErrorKind, message: String, path: Option<String>) -> Reply {
        Reply::error(kind, message, path, self.clock.epoch_ms(), self.pid)
    }

    fn encode(&self, reply: &Reply) -> Bytes {
        match reply.to_vec() {
            Ok(bytes) => Bytes::from(bytes),
            Err(e) => {
                error!("Failed to encode reply: {}", e);
                Bytes::from(format!(
                    r#"{{"error":{{"kind":"io","message":"failed to encode reply"}},"timestamp":{},"pid":{}}}"#,
                    self.clock.epoch_ms(),
                    self.pid
                ))
            }
        }
    }
}

async fn connect_with_retry(addr: impl ToSocketAddrs + Clone) -> Result<TcpStream, WorkerError> {
    let mut attempt = 1;
    loop {
        match TcpStream::connect(addr.clone()).await {
            Ok(stream) => return Ok(stream),
            Err(e) if attempt < CONNECT_ATTEMPTS => {
                debug!(attempt, "back end not reachable yet: {}", e);
                attempt += 1;
                tokio::time::sleep(CONNECT_BACKOFF).await;
            }
            Err(e) => return Err(WorkerError::Connect(e)),
        }
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
