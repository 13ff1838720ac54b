// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Length-prefixed framing of multipart frames over a byte stream.
//!
//! Wire format (all integers big-endian):
//!
//! ```text
//! u32 segment count
//! repeated: u32 segment length, segment bytes
//! ```

use bytes::{Buf, BufMut, BytesMut};
use thiserror::Error;
use tokio_util::codec::{Decoder, Encoder};

use crate::frame::Frame;

/// Maximum number of segments accepted in one frame
pub const MAX_SEGMENTS: usize = 1024;

/// Maximum total segment bytes accepted in one frame (16 MiB)
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

const HEADER_LEN: usize = 4;

/// Errors that can occur reading or writing frames
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Frame has {0} segments (max {MAX_SEGMENTS})")]
    TooManySegments(usize),

    #[error("Frame too large: {0} bytes (max {MAX_FRAME_LEN})")]
    FrameTooLarge(usize),

    #[error("Connection closed")]
    ConnectionClosed,
}

/// Codec for [`Frame`]s. Stateless; one instance per connection direction.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameCodec;

impl FrameCodec {
    pub fn new() -> Self {
        Self
    }
}

fn read_len(buf: &[u8], offset: usize) -> Option<usize> {
    let header = buf.get(offset..offset + HEADER_LEN)?;
    let mut len = [0u8; HEADER_LEN];
    len.copy_from_slice(header);
    Some(u32::from_be_bytes(len) as usize)
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, ProtocolError> {
        let Some(count) = read_len(src, 0) else {
            return Ok(None);
        };
        if count > MAX_SEGMENTS {
            return Err(ProtocolError::TooManySegments(count));
        }

        // Walk the segment headers without consuming anything until the
        // whole frame is buffered.
        let mut offset = HEADER_LEN;
        let mut body = 0usize;
        for _ in 0..count {
            let Some(len) = read_len(src, offset) else {
                src.reserve(offset + HEADER_LEN - src.len());
                return Ok(None);
            };
            body += len;
            if body > MAX_FRAME_LEN {
                return Err(ProtocolError::FrameTooLarge(body));
            }
            offset += HEADER_LEN + len;
            if src.len() < offset {
                src.reserve(offset - src.len());
                return Ok(None);
            }
        }

        let mut buf = src.split_to(offset).freeze();
        buf.advance(HEADER_LEN);
        let mut segments = Vec::with_capacity(count);
        for _ in 0..count {
            let len = buf.get_u32() as usize;
            segments.push(buf.split_to(len));
        }
        Ok(Some(Frame::new(segments)))
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = ProtocolError;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<(), ProtocolError> {
        let count = frame.len();
        if count > MAX_SEGMENTS {
            return Err(ProtocolError::TooManySegments(count));
        }
        let body = frame.byte_len();
        if body > MAX_FRAME_LEN {
            return Err(ProtocolError::FrameTooLarge(body));
        }

        dst.reserve(HEADER_LEN * (count + 1) + body);
        dst.put_u32(count as u32);
        for segment in frame.into_segments() {
            dst.put_u32(segment.len() as u32);
            dst.extend_from_slice(&segment);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
