// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client-facing router socket.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use filer_wire::{Frame, Identity};

use super::{next_frame, split_connection};

type Routes = Arc<Mutex<HashMap<Identity, mpsc::UnboundedSender<Frame>>>>;

/// Errors routing an outbound frame to a client
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("Frame has no routing identity")]
    MissingIdentity,

    /// The client disconnected before its reply arrived
    #[error("No route to peer {0}")]
    NoRoute(Identity),
}

/// Accepts many client connections and addresses each by a random identity.
///
/// Inbound frames come out of [`recv`](Self::recv) with the sender's identity
/// prepended. [`send`](Self::send) pops the leading identity and delivers the
/// rest of the frame to that client.
pub struct RouterSocket {
    local_addr: SocketAddr,
    inbound: mpsc::UnboundedReceiver<Frame>,
    routes: Routes,
    accept_task: JoinHandle<()>,
}

impl RouterSocket {
    pub async fn bind(addr: impl ToSocketAddrs) -> std::io::Result<Self> {
        Self::from_listener(TcpListener::bind(addr).await?)
    }

    pub fn from_listener(listener: TcpListener) -> std::io::Result<Self> {
        let local_addr = listener.local_addr()?;
        let (tx, inbound) = mpsc::unbounded_channel();
        let routes = Routes::default();
        let accept_task = tokio::spawn(accept_loop(listener, tx, Arc::clone(&routes)));
        Ok(Self { local_addr, inbound, routes, accept_task })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Number of currently connected clients.
    pub fn peer_count(&self) -> usize {
        self.routes.lock().len()
    }

    /// Next frame from any client, identity first.
    pub async fn recv(&mut self) -> Option<Frame> {
        self.inbound.recv().await
    }

    /// Deliver a frame to the client named by its first segment.
    pub fn send(&self, mut frame: Frame) -> Result<(), RouteError> {
        let identity = frame
            .pop_front()
            .and_then(Identity::from_segment)
            .ok_or(RouteError::MissingIdentity)?;
        let route = self.routes.lock().get(&identity).cloned();
        match route {
            Some(tx) => tx.send(frame).map_err(|_| RouteError::NoRoute(identity)),
            None => Err(RouteError::NoRoute(identity)),
        }
    }
}

impl Drop for RouterSocket {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

async fn accept_loop(listener: TcpListener, inbound: mpsc::UnboundedSender<Frame>, routes: Routes) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let identity = Identity::random();
                debug!(peer = %identity, %addr, "client connected");
                tokio::spawn(serve_client(stream, identity, inbound.clone(), Arc::clone(&routes)));
            }
            Err(e) => error!("Router accept error: {}", e),
        }
    }
}

async fn serve_client(
    stream: TcpStream,
    identity: Identity,
    inbound: mpsc::UnboundedSender<Frame>,
    routes: Routes,
) {
    let (mut reader, tx, _writer) = split_connection(stream);
    routes.lock().insert(identity.clone(), tx);

    while let Some(mut frame) = next_frame(&mut reader).await {
        frame.push_front(identity.as_bytes().clone());
        if inbound.send(frame).is_err() {
            break;
        }
    }

    // Dropping the route lets the writer flush anything queued, then exit
    routes.lock().remove(&identity);
    debug!(peer = %identity, "client disconnected");
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
