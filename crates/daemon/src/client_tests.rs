// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;
use std::net::SocketAddr;

use filer_core::ErrorKind;
use tokio::net::TcpListener;
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;

use super::*;
use crate::broker::Broker;
use crate::socket::{DealerSocket, RouterSocket};
use crate::worker::Worker;

async fn broker_with_worker() -> (SocketAddr, CancellationToken) {
    let frontend = RouterSocket::bind("127.0.0.1:0").await.unwrap();
    let backend = DealerSocket::bind("127.0.0.1:0").await.unwrap();
    let broker = Broker::new(frontend, backend);
    let (front, back) = (broker.frontend_addr(), broker.backend_addr());
    let mut stats = broker.backend_stats();
    let shutdown = CancellationToken::new();
    tokio::spawn(broker.run(shutdown.clone()));
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move { Worker::new().run(back, shutdown).await }
    });
    stats.wait_for(|s| s.workers == 1).await.unwrap();
    (front, shutdown)
}

/// Front end that answers every request with the given payload segments.
async fn fake_front_end(reply: Vec<Bytes>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut framed = Framed::new(stream, FrameCodec);
        while let Some(Ok(_)) = framed.next().await {
            framed.send(Frame::encode(vec![], reply.clone())).await.unwrap();
        }
    });
    addr
}

#[tokio::test]
async fn get_returns_file_content() {
    let (front, shutdown) = broker_with_worker().await;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "contents").unwrap();

    let mut client = Client::connect(front).await.unwrap();
    match client.get(file.path().to_str().unwrap()).await.unwrap() {
        Reply::Content(r) => {
            assert_eq!(r.content, "contents");
            assert_eq!(r.pid, std::process::id());
        }
        other => panic!("expected content, got {:?}", other),
    }
    shutdown.cancel();
}

#[tokio::test]
async fn sequential_requests_on_one_connection() {
    let (front, shutdown) = broker_with_worker().await;
    let dir = tempfile::tempdir().unwrap();
    let mut client = Client::connect(front).await.unwrap();

    for i in 0..3 {
        let path = dir.path().join(format!("f{}", i));
        std::fs::write(&path, i.to_string()).unwrap();
        let reply = client.get(path.to_str().unwrap()).await.unwrap();
        let Reply::Content(r) = reply else { panic!("expected content") };
        assert_eq!(r.content, i.to_string());
    }
    shutdown.cancel();
}

#[tokio::test]
async fn error_reply_is_returned_not_raised() {
    let (front, shutdown) = broker_with_worker().await;
    let mut client = Client::connect(front).await.unwrap();
    let reply = client.get("/definitely/not/here").await.unwrap();
    assert_eq!(reply.error_kind(), Some(ErrorKind::NotFound));
    shutdown.cancel();
}

#[tokio::test]
async fn raw_garbage_gets_malformed_request_reply() {
    let (front, shutdown) = broker_with_worker().await;
    let mut client = Client::connect(front).await.unwrap();
    let payload = client.request_raw(Bytes::from_static(b"{oops")).await.unwrap();
    assert_eq!(Reply::from_slice(&payload).unwrap().error_kind(), Some(ErrorKind::MalformedRequest));
    shutdown.cancel();
}

#[tokio::test]
async fn multi_segment_reply_is_unexpected() {
    let addr = fake_front_end(vec![Bytes::from_static(b"a"), Bytes::from_static(b"b")]).await;
    let mut client = Client::connect(addr).await.unwrap();
    assert!(matches!(client.get("/x").await, Err(ClientError::UnexpectedFrame(2))));
}

#[tokio::test]
async fn non_json_reply_is_a_message_error() {
    let addr = fake_front_end(vec![Bytes::from_static(b"nope")]).await;
    let mut client = Client::connect(addr).await.unwrap();
    assert!(matches!(client.get("/x").await, Err(ClientError::Message(_))));
}

#[tokio::test]
async fn closed_connection_is_reported() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        drop(stream);
    });
    let mut client = Client::connect(addr).await.unwrap();
    assert!(matches!(
        client.get("/x").await,
        Err(ClientError::Protocol(ProtocolError::ConnectionClosed | ProtocolError::Io(_)))
    ));
}
