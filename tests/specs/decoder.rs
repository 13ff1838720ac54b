// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use filer_wire::{ldj_stream, LdjEvent, LineDecoder};
use futures_util::StreamExt;
use serde_json::json;
use tokio::io::AsyncWriteExt;

#[test]
fn record_split_across_chunks_is_emitted_once_complete() {
    let mut decoder = LineDecoder::new();
    assert_eq!(decoder.feed(b"{\"a\":1}\n{\"b\":").unwrap(), vec![LdjEvent::Message(json!({"a": 1}))]);
    assert_eq!(decoder.feed(b"2}\n").unwrap(), vec![LdjEvent::Message(json!({"b": 2}))]);
    assert!(decoder.finish().unwrap().is_empty());
}

#[tokio::test]
async fn stream_over_a_pipe_survives_bad_lines() {
    let (mut tx, rx) = tokio::io::duplex(16);
    let writer = tokio::spawn(async move {
        for chunk in [&b"{\"n\":"[..], b"1}\n{\"n\"", b":2}\nnot json\n{\"n\":3}", b"\n{\"n\":"] {
            tx.write_all(chunk).await.unwrap();
        }
    });

    let events: Vec<LdjEvent> = ldj_stream(rx).map(|e| e.unwrap()).collect().await;
    writer.await.unwrap();

    assert_eq!(events.len(), 5);
    assert_eq!(events[0], LdjEvent::Message(json!({"n": 1})));
    assert_eq!(events[1], LdjEvent::Message(json!({"n": 2})));
    assert!(matches!(&events[2], LdjEvent::Invalid { line, .. } if line == "not json"));
    assert_eq!(events[3], LdjEvent::Message(json!({"n": 3})));
    assert_eq!(events[4], LdjEvent::Truncated { tail: "{\"n\":".to_string() });
}
