// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Line-delimited JSON (LDJ) decoding over arbitrarily chunked streams.
//!
//! Each record is one JSON document followed by `\n`. Chunks may split a
//! record anywhere, including inside a multi-byte UTF-8 sequence; the
//! unterminated tail is buffered until the rest arrives.
//!
//! Failure policy:
//! - A complete line that is not valid JSON yields [`LdjEvent::Invalid`] and
//!   decoding continues with the next line.
//! - Whitespace-only lines are skipped.
//! - An unterminated tail at end of stream yields [`LdjEvent::Truncated`].
//!
//! No line length limit is enforced unless one is configured with
//! [`LdjCodec::with_max_line_length`]. Without it, a peer that never sends a
//! newline grows the buffer without bound.

use bytes::{BufMut, BytesMut};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::io::AsyncRead;
use tokio_util::codec::{Decoder, Encoder, FramedRead};

/// One decoded line
#[derive(Debug, Clone, PartialEq)]
pub enum LdjEvent {
    /// A line parsed as JSON
    Message(Value),
    /// A complete line that failed to parse
    Invalid { line: String, error: String },
    /// Bytes left without a terminating newline when the stream ended
    Truncated { tail: String },
}

impl LdjEvent {
    /// The parsed value, if this is a message event.
    pub fn into_message(self) -> Option<Value> {
        match self {
            Self::Message(value) => Some(value),
            _ => None,
        }
    }
}

/// Errors that end an LDJ stream
#[derive(Debug, Error)]
pub enum LdjError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Line exceeds {limit} bytes without a newline")]
    LineTooLong { limit: usize },

    #[error("Failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Codec turning a byte stream into [`LdjEvent`]s, and values into lines.
#[derive(Debug, Clone, Default)]
pub struct LdjCodec {
    /// Buffer offset already scanned for a newline
    next_index: usize,
    max_line_length: Option<usize>,
}

impl LdjCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the stream with [`LdjError::LineTooLong`] once a line exceeds `limit` bytes.
    pub fn with_max_line_length(limit: usize) -> Self {
        Self { next_index: 0, max_line_length: Some(limit) }
    }

    fn check_limit(&self, len: usize) -> Result<(), LdjError> {
        match self.max_line_length {
            Some(limit) if len > limit => Err(LdjError::LineTooLong { limit }),
            _ => Ok(()),
        }
    }
}

fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(u8::is_ascii_whitespace)
}

fn parse_line(line: &[u8]) -> LdjEvent {
    match serde_json::from_slice(line) {
        Ok(value) => LdjEvent::Message(value),
        Err(e) => LdjEvent::Invalid {
            line: String::from_utf8_lossy(line).into_owned(),
            error: e.to_string(),
        },
    }
}

impl Decoder for LdjCodec {
    type Item = LdjEvent;
    type Error = LdjError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<LdjEvent>, LdjError> {
        loop {
            let unscanned = src.get(self.next_index..).unwrap_or_default();
            let Some(pos) = unscanned.iter().position(|b| *b == b'\n') else {
                self.next_index = src.len();
                self.check_limit(src.len())?;
                return Ok(None);
            };

            let newline = self.next_index + pos;
            self.next_index = 0;
            self.check_limit(newline)?;

            let mut line = src.split_to(newline + 1);
            line.truncate(newline);
            if is_blank(&line) {
                continue;
            }
            return Ok(Some(parse_line(&line)));
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<LdjEvent>, LdjError> {
        if let Some(event) = self.decode(src)? {
            return Ok(Some(event));
        }
        self.next_index = 0;
        let tail = src.split();
        if is_blank(&tail) {
            return Ok(None);
        }
        Ok(Some(LdjEvent::Truncated { tail: String::from_utf8_lossy(&tail).into_owned() }))
    }
}

impl<T: Serialize> Encoder<T> for LdjCodec {
    type Error = LdjError;

    fn encode(&mut self, item: T, dst: &mut BytesMut) -> Result<(), LdjError> {
        serde_json::to_writer((&mut *dst).writer(), &item)?;
        dst.put_u8(b'\n');
        Ok(())
    }
}

/// Wrap an async reader as a stream of [`LdjEvent`]s.
pub fn ldj_stream<R: AsyncRead>(reader: R) -> FramedRead<R, LdjCodec> {
    FramedRead::new(reader, LdjCodec::new())
}

/// Push-style decoder for callers that receive chunks themselves.
///
/// Owns the buffer for exactly one source stream. There is no reset: when the
/// stream ends call [`LineDecoder::finish`], which consumes the decoder.
#[derive(Debug, Default)]
pub struct LineDecoder {
    codec: LdjCodec,
    buffer: BytesMut,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_codec(codec: LdjCodec) -> Self {
        Self { codec, buffer: BytesMut::new() }
    }

    /// Append a chunk and return every event completed by it, in line order.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<LdjEvent>, LdjError> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(event) = self.codec.decode(&mut self.buffer)? {
            events.push(event);
        }
        Ok(events)
    }

    /// Bytes of the current unterminated line.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// End of stream: surface whatever is left in the buffer.
    pub fn finish(mut self) -> Result<Vec<LdjEvent>, LdjError> {
        let mut events = Vec::new();
        while let Some(event) = self.codec.decode_eof(&mut self.buffer)? {
            events.push(event);
        }
        Ok(events)
    }
}

#[cfg(test)]
#[path = "ldj_tests.rs"]
mod tests;
