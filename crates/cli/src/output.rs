// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use clap::ValueEnum;
use filer_core::{Notification, Reply};

use crate::color;
use crate::exit_error::ExitError;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Write a reply: file content verbatim, or the reply as one JSON line.
///
/// Error replies become an [`ExitError`] whose code reflects the error kind.
pub fn write_reply(out: &mut impl Write, reply: &Reply, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string(reply)?)?,
        OutputFormat::Text => {
            if let Reply::Content(response) = reply {
                out.write_all(response.content.as_bytes())?;
            }
        }
    }
    out.flush()?;

    match reply {
        Reply::Content(_) => Ok(()),
        Reply::Error(e) => {
            let message = match format {
                // The JSON line already carries the details
                OutputFormat::Json => String::new(),
                OutputFormat::Text => format!(
                    "{} {}: {}",
                    color::error("error:"),
                    e.error.kind,
                    e.error.message
                ),
            };
            Err(ExitError::for_reply(e.error.kind, message).into())
        }
    }
}

/// Write one notification line.
pub fn write_notification(
    out: &mut impl Write,
    notification: &Notification,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string(notification)?)?,
        OutputFormat::Text => {
            let at = notification.changed_at_text();
            writeln!(
                out,
                "File \"{}\" changed at {}",
                color::header(&notification.file),
                color::context(&at)
            )?
        }
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
