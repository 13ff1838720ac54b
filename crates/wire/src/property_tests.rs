// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Property tests for envelope splitting, framing under partial reads, and
//! LDJ decoding under arbitrary chunking.

use bytes::{Bytes, BytesMut};
use proptest::prelude::*;
use serde_json::Value;
use tokio_util::codec::{Decoder, Encoder};

use crate::{Frame, FrameCodec, LdjEvent, LineDecoder};

fn identity_segment() -> impl Strategy<Value = Bytes> {
    prop::collection::vec(any::<u8>(), 1..24).prop_map(Bytes::from)
}

fn payload_segment() -> impl Strategy<Value = Bytes> {
    prop::collection::vec(any::<u8>(), 0..64).prop_map(Bytes::from)
}

fn json_record() -> impl Strategy<Value = Value> {
    prop::collection::btree_map("[a-z]{1,6}", prop_oneof![
        any::<i64>().prop_map(Value::from),
        "\\PC{0,12}".prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
    ], 0..4)
    .prop_map(|map| Value::Object(map.into_iter().collect()))
}

/// Split `data` at the given (unsorted, possibly duplicate) offsets.
fn chunked(data: &[u8], mut cuts: Vec<usize>) -> Vec<Vec<u8>> {
    cuts.iter_mut().for_each(|c| *c %= data.len() + 1);
    cuts.sort_unstable();
    let mut chunks = Vec::new();
    let mut start = 0;
    for cut in cuts {
        chunks.push(data[start..cut].to_vec());
        start = cut;
    }
    chunks.push(data[start..].to_vec());
    chunks
}

proptest! {
    #[test]
    fn envelope_roundtrip(
        identity in prop::collection::vec(identity_segment(), 0..4),
        payload in prop::collection::vec(payload_segment(), 0..6),
    ) {
        let frame = Frame::encode(identity.clone(), payload.clone());
        prop_assert_eq!(frame.len(), identity.len() + 1 + payload.len());
        prop_assert_eq!(frame.decode(), (identity, payload));
    }

    #[test]
    fn frames_survive_arbitrary_read_boundaries(
        frames in prop::collection::vec(
            prop::collection::vec(payload_segment(), 0..5).prop_map(Frame::new),
            1..5,
        ),
        cuts in prop::collection::vec(any::<usize>(), 0..12),
    ) {
        let mut wire = BytesMut::new();
        for frame in &frames {
            FrameCodec.encode(frame.clone(), &mut wire).unwrap();
        }

        let mut codec = FrameCodec;
        let mut buf = BytesMut::new();
        let mut decoded = Vec::new();
        for chunk in chunked(&wire, cuts) {
            buf.extend_from_slice(&chunk);
            while let Some(frame) = codec.decode(&mut buf).unwrap() {
                decoded.push(frame);
            }
        }
        prop_assert!(buf.is_empty());
        prop_assert_eq!(decoded, frames);
    }

    #[test]
    fn ldj_emits_each_line_once_regardless_of_chunking(
        records in prop::collection::vec(json_record(), 1..8),
        cuts in prop::collection::vec(any::<usize>(), 0..16),
    ) {
        let mut stream = Vec::new();
        for record in &records {
            serde_json::to_writer(&mut stream, record).unwrap();
            stream.push(b'\n');
        }

        let mut decoder = LineDecoder::new();
        let mut events = Vec::new();
        for chunk in chunked(&stream, cuts) {
            events.extend(decoder.feed(&chunk).unwrap());
        }
        events.extend(decoder.finish().unwrap());

        let expected: Vec<LdjEvent> = records.into_iter().map(LdjEvent::Message).collect();
        prop_assert_eq!(events, expected);
    }
}
