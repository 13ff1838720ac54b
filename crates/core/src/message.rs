// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON payloads carried inside frames.
//!
//! Each type decodes through a failing path so malformed input is caught at
//! the component boundary instead of deep inside a handler.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors decoding or encoding a message payload
#[derive(Debug, Error)]
pub enum MessageError {
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// Request for the contents of a file, sent by clients to workers.
///
/// Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRequest {
    pub path: String,
}

impl FileRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, MessageError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn to_vec(&self) -> Result<Vec<u8>, MessageError> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Successful reply: the file's text plus who produced it and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileResponse {
    /// Raw file bytes decoded as text (invalid UTF-8 replaced)
    pub content: String,
    /// Wall-clock epoch milliseconds at reply time
    pub timestamp: u64,
    /// Process identifier of the worker that served the request
    pub pid: u32,
}

/// Classification of a failed request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Payload missing or not a JSON `{ "path": ... }` object
    MalformedRequest,
    NotFound,
    PermissionDenied,
    /// Any other read failure
    Io,
}

crate::simple_display! {
    ErrorKind {
        MalformedRequest => "malformed_request",
        NotFound => "not_found",
        PermissionDenied => "permission_denied",
        Io => "io",
    }
}

impl ErrorKind {
    /// Map a filesystem error onto the reply taxonomy.
    pub fn from_io(err: &std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound,
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            _ => Self::Io,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub kind: ErrorKind,
    pub message: String,
}

/// Failed reply. Carries the same `timestamp`/`pid` as a successful one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
    /// Requested path, when the request could be parsed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub timestamp: u64,
    pub pid: u32,
}

/// Everything a worker can send back for one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reply {
    Content(FileResponse),
    Error(ErrorResponse),
}

impl Reply {
    pub fn error(
        kind: ErrorKind,
        message: impl Into<String>,
        path: Option<String>,
        timestamp: u64,
        pid: u32,
    ) -> Self {
        Self::Error(ErrorResponse {
            error: ErrorDetail { kind, message: message.into() },
            path,
            timestamp,
            pid,
        })
    }

    pub fn pid(&self) -> u32 {
        match self {
            Self::Content(r) => r.pid,
            Self::Error(e) => e.pid,
        }
    }

    pub fn timestamp(&self) -> u64 {
        match self {
            Self::Content(r) => r.timestamp,
            Self::Error(e) => e.timestamp,
        }
    }

    /// The error kind, if this is an error reply.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Content(_) => None,
            Self::Error(e) => Some(e.error.kind),
        }
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, MessageError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn to_vec(&self) -> Result<Vec<u8>, MessageError> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// File-change notification broadcast by an external watcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub file: String,
    /// Epoch milliseconds of the change
    pub timestamp: u64,
}

impl Notification {
    pub fn new(file: impl Into<String>, timestamp: u64) -> Self {
        Self { file: file.into(), timestamp }
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, MessageError> {
        Ok(serde_json::from_value(value)?)
    }

    /// The change time in the local timezone, if the timestamp is representable.
    pub fn changed_at(&self) -> Option<DateTime<Local>> {
        let ms = i64::try_from(self.timestamp).ok()?;
        DateTime::from_timestamp_millis(ms).map(|t| t.with_timezone(&Local))
    }

    /// Human-readable change time: local RFC 2822, or raw milliseconds when
    /// the timestamp is out of range.
    pub fn changed_at_text(&self) -> String {
        match self.changed_at() {
            Some(at) => at.to_rfc2822(),
            None => format!("{}ms", self.timestamp),
        }
    }

    /// Subscription filter: empty matches everything, otherwise a path prefix.
    pub fn matches(&self, filter: &str) -> bool {
        self.file.starts_with(filter)
    }
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "File \"{}\" changed at {}", self.file, self.changed_at_text())
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
