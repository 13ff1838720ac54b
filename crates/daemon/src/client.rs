// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request/reply client for the broker's front end.

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::debug;

use filer_core::{FileRequest, MessageError, Reply};
use filer_wire::{Frame, FrameCodec, ProtocolError};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Failed to connect to broker: {0}")]
    Connect(#[source] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Invalid message: {0}")]
    Message(#[from] MessageError),

    #[error("Unexpected reply frame with {0} payload segments")]
    UnexpectedFrame(usize),
}

/// One connection to the front end, one outstanding request at a time.
pub struct Client {
    reader: FramedRead<OwnedReadHalf, FrameCodec>,
    writer: FramedWrite<OwnedWriteHalf, FrameCodec>,
}

impl Client {
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr).await.map_err(ClientError::Connect)?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            reader: FramedRead::new(reader, FrameCodec),
            writer: FramedWrite::new(writer, FrameCodec),
        })
    }

    /// Send a request and wait for its reply.
    pub async fn request(&mut self, request: &FileRequest) -> Result<Reply, ClientError> {
        let payload = self.request_raw(Bytes::from(request.to_vec()?)).await?;
        Ok(Reply::from_slice(&payload)?)
    }

    /// Request the contents of `path`.
    pub async fn get(&mut self, path: impl Into<String>) -> Result<Reply, ClientError> {
        self.request(&FileRequest::new(path)).await
    }

    /// Send one payload segment as-is and return the single reply segment.
    pub async fn request_raw(&mut self, payload: Bytes) -> Result<Bytes, ClientError> {
        self.writer.send(Frame::request(payload)).await?;
        let frame = match self.reader.next().await {
            Some(frame) => frame?,
            None => return Err(ProtocolError::ConnectionClosed.into()),
        };
        let (_, mut payload) = frame.decode();
        debug!(segments = payload.len(), "reply received");
        match payload.len() {
            1 => Ok(payload.remove(0)),
            n => Err(ClientError::UnexpectedFrame(n)),
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
