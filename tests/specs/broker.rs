// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use bytes::Bytes;
use filer_wire::{Frame, FrameCodec};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;

use crate::prelude::*;

#[tokio::test]
async fn request_for_existing_file_returns_content() {
    let daemon = Daemon::start(1).await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sample.txt");
    std::fs::write(&path, "hello").unwrap();

    let reply = daemon.client().await.get(path.to_str().unwrap()).await.unwrap();
    let response = content(reply);
    assert_eq!(response.content, "hello");
    assert!(response.timestamp > 0);
    assert_eq!(response.pid, std::process::id());
    daemon.stop().await;
}

#[tokio::test]
async fn content_matches_file_bytes_for_every_worker() {
    let daemon = Daemon::start(3).await;
    let dir = tempfile::tempdir().unwrap();
    let bodies = vec![
        String::new(),
        "one line\n".to_string(),
        "multi\nline\r\ntext".to_string(),
        "unicode: \u{263A}\u{1F980}".to_string(),
        "x".repeat(100_000),
    ];

    let mut client = daemon.client().await;
    for (i, body) in bodies.iter().enumerate() {
        let path = dir.path().join(format!("file-{}", i));
        std::fs::write(&path, body).unwrap();
        let response = content(client.get(path.to_str().unwrap()).await.unwrap());
        assert_eq!(response.content, *body);
        assert_eq!(response.pid, std::process::id());
    }
    daemon.stop().await;
}

#[tokio::test]
async fn concurrent_clients_receive_only_their_own_replies() {
    let daemon = Daemon::start(2).await;
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.txt");
    let b = dir.path().join("b.txt");
    std::fs::write(&a, "contents of a").unwrap();
    std::fs::write(&b, "contents of b").unwrap();

    let mut tasks = Vec::new();
    for (path, expected) in [(a, "contents of a"), (b, "contents of b")] {
        let mut client = daemon.client().await;
        tasks.push(tokio::spawn(async move {
            for _ in 0..20 {
                let response = content(client.get(path.to_str().unwrap()).await.unwrap());
                assert_eq!(response.content, expected);
            }
        }));
    }
    for task in tasks {
        tokio::time::timeout(TIMEOUT, task).await.unwrap().unwrap();
    }
    daemon.stop().await;
}

#[tokio::test]
async fn missing_file_gets_error_reply_and_worker_survives() {
    let daemon = Daemon::start(1).await;
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.txt");
    let mut client = daemon.client().await;

    let reply = client.get(missing.to_str().unwrap()).await.unwrap();
    assert_eq!(reply.error_kind(), Some(ErrorKind::NotFound));
    let Reply::Error(e) = reply else { unreachable!() };
    assert_eq!(e.path.as_deref(), missing.to_str());
    assert_eq!(e.pid, std::process::id());

    // The only worker is still serving
    let present = dir.path().join("yes.txt");
    std::fs::write(&present, "still here").unwrap();
    let response = content(client.get(present.to_str().unwrap()).await.unwrap());
    assert_eq!(response.content, "still here");
    daemon.stop().await;
}

#[tokio::test]
async fn malformed_request_gets_error_reply() {
    let daemon = Daemon::start(1).await;
    let mut client = daemon.client().await;
    let payload = client.request_raw(bytes_of("{\"nopath\":true}")).await.unwrap();
    let reply = Reply::from_slice(&payload).unwrap();
    assert_eq!(reply.error_kind(), Some(ErrorKind::MalformedRequest));
    daemon.stop().await;
}

#[tokio::test]
async fn bare_request_without_delimiter_gets_bare_reply() {
    let daemon = Daemon::start(1).await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bare.txt");
    std::fs::write(&path, "no envelope").unwrap();
    let stream = TcpStream::connect(daemon.frontend).await.unwrap();
    let mut framed = Framed::new(stream, FrameCodec);

    let body = serde_json::json!({ "path": path }).to_string();
    framed.send(Frame::new(vec![Bytes::from(body)])).await.unwrap();
    let reply = tokio::time::timeout(TIMEOUT, framed.next()).await.unwrap().unwrap().unwrap();
    assert_eq!(reply.len(), 1);
    assert_eq!(content(Reply::from_slice(&reply.segments()[0]).unwrap()).content, "no envelope");

    framed.send(Frame::new(vec![bytes_of("not json")])).await.unwrap();
    let reply = tokio::time::timeout(TIMEOUT, framed.next()).await.unwrap().unwrap().unwrap();
    let reply = Reply::from_slice(&reply.segments()[0]).unwrap();
    assert_eq!(reply.error_kind(), Some(ErrorKind::MalformedRequest));
    daemon.stop().await;
}

#[tokio::test]
async fn more_clients_than_workers_all_get_served() {
    let daemon = Daemon::start(1).await;
    let dir = tempfile::tempdir().unwrap();

    let mut tasks = Vec::new();
    for i in 0..8 {
        let path = dir.path().join(format!("{}.txt", i));
        std::fs::write(&path, i.to_string()).unwrap();
        let mut client = daemon.client().await;
        tasks.push(tokio::spawn(async move {
            let response = content(client.get(path.to_str().unwrap()).await.unwrap());
            assert_eq!(response.content, i.to_string());
        }));
    }
    for task in tasks {
        tokio::time::timeout(TIMEOUT, task).await.unwrap().unwrap();
    }
    daemon.stop().await;
}

fn bytes_of(s: &'static str) -> Bytes {
    Bytes::from_static(s.as_bytes())
}
