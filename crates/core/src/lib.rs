// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! filer-core: message types and shared primitives for the filer broker

pub mod macros;

pub mod clock;
pub mod message;

pub use clock::{Clock, FakeClock, SystemClock};
pub use message::{
    ErrorDetail, ErrorKind, ErrorResponse, FileRequest, FileResponse, MessageError, Notification,
    Reply,
};
