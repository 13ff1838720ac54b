// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn request_ignores_unknown_fields() {
    let request = FileRequest::from_slice(br#"{"path":"/tmp/a.txt","extra":true}"#).unwrap();
    assert_eq!(request, FileRequest::new("/tmp/a.txt"));
}

#[yare::parameterized(
    not_json     = { b"not json".as_slice() },
    missing_path = { br#"{"file":"/tmp/a"}"#.as_slice() },
    wrong_type   = { br#"{"path":42}"#.as_slice() },
    empty        = { b"".as_slice() },
)]
fn malformed_requests_fail_to_decode(bytes: &[u8]) {
    assert!(FileRequest::from_slice(bytes).is_err());
}

#[test]
fn content_reply_has_wire_shape() {
    let reply = Reply::Content(FileResponse { content: "hello".into(), timestamp: 5, pid: 7 });
    let value: serde_json::Value = serde_json::from_slice(&reply.to_vec().unwrap()).unwrap();
    assert_eq!(value, serde_json::json!({ "content": "hello", "timestamp": 5, "pid": 7 }));
}

#[test]
fn error_reply_has_wire_shape() {
    let reply = Reply::error(ErrorKind::NotFound, "no such file", Some("/nope".into()), 5, 7);
    let value: serde_json::Value = serde_json::from_slice(&reply.to_vec().unwrap()).unwrap();
    assert_eq!(
        value,
        serde_json::json!({
            "error": { "kind": "not_found", "message": "no such file" },
            "path": "/nope",
            "timestamp": 5,
            "pid": 7
        })
    );
}

#[test]
fn error_reply_omits_missing_path() {
    let reply = Reply::error(ErrorKind::MalformedRequest, "bad", None, 1, 2);
    let json = String::from_utf8(reply.to_vec().unwrap()).unwrap();
    assert!(!json.contains("path"), "unexpected path in {}", json);
}

#[test]
fn reply_decodes_both_variants() {
    let ok = Reply::from_slice(br#"{"content":"x","timestamp":1,"pid":2}"#).unwrap();
    assert!(matches!(ok, Reply::Content(_)));
    assert_eq!(ok.error_kind(), None);

    let err =
        Reply::from_slice(br#"{"error":{"kind":"io","message":"m"},"timestamp":1,"pid":2}"#)
            .unwrap();
    assert_eq!(err.error_kind(), Some(ErrorKind::Io));
    assert_eq!(err.pid(), 2);
    assert_eq!(err.timestamp(), 1);
}

#[yare::parameterized(
    not_found   = { std::io::ErrorKind::NotFound,         ErrorKind::NotFound },
    denied      = { std::io::ErrorKind::PermissionDenied, ErrorKind::PermissionDenied },
    other       = { std::io::ErrorKind::InvalidData,      ErrorKind::Io },
)]
fn error_kind_from_io(kind: std::io::ErrorKind, expected: ErrorKind) {
    let err = std::io::Error::new(kind, "boom");
    assert_eq!(ErrorKind::from_io(&err), expected);
}

#[yare::parameterized(
    malformed = { ErrorKind::MalformedRequest, "malformed_request" },
    not_found = { ErrorKind::NotFound,         "not_found" },
    denied    = { ErrorKind::PermissionDenied, "permission_denied" },
    io        = { ErrorKind::Io,               "io" },
)]
fn error_kind_display_matches_serde(kind: ErrorKind, expected: &str) {
    assert_eq!(kind.to_string(), expected);
    assert_eq!(serde_json::to_string(&kind).unwrap(), format!("\"{}\"", expected));
}

#[test]
fn notification_decodes_from_value() {
    let value = serde_json::json!({ "file": "target.txt", "timestamp": 1_358_175_758_495u64 });
    let notification = Notification::from_value(value).unwrap();
    assert_eq!(notification, Notification::new("target.txt", 1_358_175_758_495));
    assert!(notification.changed_at().is_some());
}

#[test]
fn notification_display_names_file() {
    let notification = Notification::new("target.txt", 0);
    let text = notification.to_string();
    assert!(text.starts_with("File \"target.txt\" changed at "), "{}", text);
}

#[test]
fn notification_with_unrepresentable_time_falls_back_to_millis() {
    let notification = Notification::new("a", u64::MAX);
    assert!(notification.changed_at().is_none());
    assert_eq!(notification.changed_at_text(), format!("{}ms", u64::MAX));
    assert!(notification.to_string().ends_with("ms"));
}

#[test]
fn notification_display_uses_changed_at_text() {
    let notification = Notification::new("target.txt", 1_358_175_758_495);
    let expected = format!("File \"target.txt\" changed at {}", notification.changed_at_text());
    assert_eq!(notification.to_string(), expected);
    assert!(!notification.changed_at_text().ends_with("ms"));
}

#[yare::parameterized(
    empty_matches_all = { "",          true },
    prefix            = { "/var/",     true },
    exact             = { "/var/log",  true },
    other             = { "/tmp",      false },
)]
fn notification_filter(filter: &str, expected: bool) {
    assert_eq!(Notification::new("/var/log", 0).matches(filter), expected);
}
