// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Addressed sockets the broker relays between.
//!
//! - [`RouterSocket`]: many clients; tags each inbound frame with the
//!   sender's identity and routes outbound frames by their leading identity.
//! - [`DealerSocket`]: many workers; hands each outbound frame to the next
//!   idle worker in rotation and surfaces worker replies.
//!
//! Both run their connection handling in spawned tasks so the owner only
//! sees whole frames through `send`/`recv`.

mod dealer;
mod router;

pub use dealer::{DealerClosed, DealerSocket, DealerStats};
pub use router::{RouteError, RouterSocket};

use futures_util::{SinkExt, StreamExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::debug;

use filer_wire::{Frame, FrameCodec};

pub(crate) type FrameReader = FramedRead<OwnedReadHalf, FrameCodec>;

/// Split a connection into a frame stream and a queue feeding a writer task.
///
/// The writer task ends when the queue's senders are dropped or a write fails.
pub(crate) fn split_connection(
    stream: TcpStream,
) -> (FrameReader, mpsc::UnboundedSender<Frame>, JoinHandle<()>) {
    let (reader, writer) = stream.into_split();
    let reader = FramedRead::new(reader, FrameCodec);
    let (tx, rx) = mpsc::unbounded_channel();
    let write_task = tokio::spawn(write_frames(FramedWrite::new(writer, FrameCodec), rx));
    (reader, tx, write_task)
}

async fn write_frames(
    mut writer: FramedWrite<OwnedWriteHalf, FrameCodec>,
    mut rx: mpsc::UnboundedReceiver<Frame>,
) {
    while let Some(frame) = rx.recv().await {
        if let Err(e) = writer.send(frame).await {
            debug!("Write failed, closing connection: {}", e);
            break;
        }
    }
}

/// Next frame from a connection, treating protocol errors as disconnects.
pub(crate) async fn next_frame(reader: &mut FrameReader) -> Option<Frame> {
    match reader.next().await? {
        Ok(frame) => Some(frame),
        Err(e) => {
            debug!("Dropping connection after protocol error: {}", e);
            None
        }
    }
}
