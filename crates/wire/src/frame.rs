// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Multipart frames and routing identities.
//!
//! A frame is an ordered list of opaque byte segments. Routing hops prepend
//! identity segments, separated from the payload by one empty delimiter
//! segment:
//!
//! ```text
//! [identity..] [""] [payload..]
//! ```
//!
//! Identity segments are never empty, so the first empty segment is always
//! the delimiter.

use bytes::Bytes;

/// First segment of the handshake a worker sends when it connects.
pub const READY: &[u8] = b"\x01READY";

/// One logical message as an ordered sequence of byte segments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    segments: Vec<Bytes>,
}

impl Frame {
    pub fn new(segments: Vec<Bytes>) -> Self {
        Self { segments }
    }

    /// Build an envelope: identity segments, delimiter, payload segments.
    pub fn encode(identity: Vec<Bytes>, payload: Vec<Bytes>) -> Self {
        let mut segments = Vec::with_capacity(identity.len() + 1 + payload.len());
        segments.extend(identity);
        segments.push(Bytes::new());
        segments.extend(payload);
        Self { segments }
    }

    /// Split an envelope back into `(identity, payload)`.
    ///
    /// A frame with no delimiter has no identity; every segment is payload.
    pub fn decode(self) -> (Vec<Bytes>, Vec<Bytes>) {
        let mut segments = self.segments;
        match segments.iter().position(Bytes::is_empty) {
            Some(delimiter) => {
                let payload = segments.split_off(delimiter + 1);
                segments.truncate(delimiter);
                (segments, payload)
            }
            None => (Vec::new(), segments),
        }
    }

    /// Split a frame that crossed exactly one router hop.
    ///
    /// With a delimiter this matches [`Frame::decode`]. Without one, the
    /// leading segment is the identity the router prepended and the rest is
    /// the sender's bare payload.
    pub fn into_envelope(self) -> Envelope {
        if self.segments.iter().any(Bytes::is_empty) {
            let (identity, payload) = self.decode();
            return Envelope { identity, payload, delimited: true };
        }
        let mut identity = self.segments;
        let payload = if identity.is_empty() { Vec::new() } else { identity.split_off(1) };
        Envelope { identity, payload, delimited: false }
    }

    /// A client request: empty envelope plus a single payload segment.
    pub fn request(payload: impl Into<Bytes>) -> Self {
        Self::encode(Vec::new(), vec![payload.into()])
    }

    /// Worker handshake announcing its process id.
    pub fn ready(pid: u32) -> Self {
        Self::new(vec![Bytes::from_static(READY), Bytes::from(pid.to_string())])
    }

    /// The pid carried by a worker handshake, if this frame is one.
    pub fn as_ready(&self) -> Option<u32> {
        match self.segments.as_slice() {
            [tag, pid] if &tag[..] == READY => std::str::from_utf8(pid).ok()?.parse().ok(),
            _ => None,
        }
    }

    pub fn push_front(&mut self, segment: Bytes) {
        self.segments.insert(0, segment);
    }

    pub fn pop_front(&mut self) -> Option<Bytes> {
        if self.segments.is_empty() {
            None
        } else {
            Some(self.segments.remove(0))
        }
    }

    pub fn segments(&self) -> &[Bytes] {
        &self.segments
    }

    pub fn into_segments(self) -> Vec<Bytes> {
        self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Total payload bytes across all segments (excluding wire headers).
    pub fn byte_len(&self) -> usize {
        self.segments.iter().map(Bytes::len).sum()
    }
}

impl From<Vec<Bytes>> for Frame {
    fn from(segments: Vec<Bytes>) -> Self {
        Self::new(segments)
    }
}

/// Routing identity and payload of a frame received behind a router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub identity: Vec<Bytes>,
    pub payload: Vec<Bytes>,
    /// Whether the sender separated identity and payload with a delimiter
    pub delimited: bool,
}

impl Envelope {
    /// Build the reply in the layout the request arrived in, so a bare
    /// request gets a bare reply.
    pub fn reply(self, payload: Vec<Bytes>) -> Frame {
        if self.delimited {
            return Frame::encode(self.identity, payload);
        }
        let mut segments = self.identity;
        segments.extend(payload);
        Frame::new(segments)
    }
}

/// Opaque token a router assigns to each connected peer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(Bytes);

impl Identity {
    /// A fresh random identity (16 bytes, never empty).
    pub fn random() -> Self {
        Self(Bytes::copy_from_slice(uuid::Uuid::new_v4().as_bytes()))
    }

    /// Wrap a segment taken from a frame. Returns `None` for the empty delimiter.
    pub fn from_segment(segment: Bytes) -> Option<Self> {
        if segment.is_empty() {
            None
        } else {
            Some(Self(segment))
        }
    }

    pub fn as_bytes(&self) -> &Bytes {
        &self.0
    }

    pub fn into_segment(self) -> Bytes {
        self.0
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in self.0.iter().take(4) {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "frame_tests.rs"]
mod tests;
