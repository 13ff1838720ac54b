// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `filer decode`: normalize a newline-delimited JSON stream

use std::io::Write;

use anyhow::Result;
use clap::Args;
use futures_util::StreamExt;
use tokio::io::AsyncRead;
use tokio_util::codec::FramedRead;

use filer_wire::{LdjCodec, LdjEvent};

use crate::color;
use crate::exit_error::ExitError;

#[derive(Args)]
pub struct DecodeArgs {
    /// Fail once a line grows past this many bytes
    #[arg(long)]
    pub max_line: Option<usize>,
    /// Exit with status 1 if any line is not valid JSON
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct DecodeSummary {
    pub messages: usize,
    pub invalid: usize,
    pub truncated: bool,
}

pub async fn handle(args: DecodeArgs) -> Result<()> {
    let codec = match args.max_line {
        Some(limit) => LdjCodec::with_max_line_length(limit),
        None => LdjCodec::new(),
    };
    let summary = decode(tokio::io::stdin(), codec, &mut std::io::stdout().lock(), &mut std::io::stderr()).await?;
    if args.strict && (summary.invalid > 0 || summary.truncated) {
        return Err(ExitError::new(1, "").into());
    }
    Ok(())
}

/// Write each JSON document in `reader` to `out` as one compact line.
/// Problems are reported to `diag` with their 1-based record number.
pub async fn decode<R: AsyncRead + Unpin>(
    reader: R,
    codec: LdjCodec,
    out: &mut impl Write,
    diag: &mut impl Write,
) -> Result<DecodeSummary> {
    let mut events = FramedRead::new(reader, codec);
    let mut summary = DecodeSummary::default();
    let mut record = 0;

    while let Some(event) = events.next().await {
        record += 1;
        match event? {
            LdjEvent::Message(value) => {
                writeln!(out, "{}", value)?;
                summary.messages += 1;
            }
            LdjEvent::Invalid { line, error } => {
                writeln!(diag, "{} record {}: {}: {}", color::error("invalid"), record, error, line)?;
                summary.invalid += 1;
            }
            LdjEvent::Truncated { tail } => {
                writeln!(diag, "{} {} bytes without trailing newline", color::error("truncated"), tail.len())?;
                summary.truncated = true;
            }
        }
    }
    out.flush()?;
    Ok(summary)
}

#[cfg(test)]
#[path = "decode_tests.rs"]
mod tests;
