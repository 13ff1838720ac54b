// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire protocol for the filer broker.
//!
//! - Frames: multipart messages with routing envelopes, carried as
//!   `u32` segment count + length-prefixed segments.
//! - LDJ: newline-delimited JSON streams used for notifications.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod codec;
mod frame;
mod ldj;

pub use codec::{FrameCodec, ProtocolError, MAX_FRAME_LEN, MAX_SEGMENTS};
pub use frame::{Envelope, Frame, Identity, READY};
pub use ldj::{ldj_stream, LdjCodec, LdjError, LdjEvent, LineDecoder};

#[cfg(test)]
mod property_tests;
