//! Property-based tests for the framing codec
//!
//! Encoded messages must decode back to the same JSON value regardless of how
//! the byte stream is chunked or how many frames share one buffer.

use lsp_framing::lsp::{encode, FrameDecoder};
use lsp_framing::FrameError;
use proptest::prelude::*;
use serde_json::Value;

// Strategy: arbitrary JSON values, nested a few levels deep
fn arb_json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|i| Value::Number(i.into())),
        any::<f64>()
            .prop_filter("finite", |f| f.is_finite())
            .prop_map(|f| Value::Number(serde_json::Number::from_f64(f).unwrap())),
        ".*".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map("[a-zA-Z_$/]{0,12}", inner, 0..6)
                .prop_map(|map| Value::Object(map.into_iter().collect())),
        ]
    })
}

fn drain(decoder: &mut FrameDecoder) -> Vec<Value> {
    decoder
        .messages()
        .map(|m| m.expect("well-formed input must decode"))
        .collect()
}

proptest! {
    /// Property: decode(encode(m)) == m
    #[test]
    fn proptest_roundtrip(message in arb_json_value()) {
        let mut decoder = FrameDecoder::new();
        decoder.feed(&encode(&message).unwrap());

        prop_assert_eq!(decoder.try_take_message().unwrap(), Some(message));
        prop_assert!(decoder.is_idle());
    }

    /// Property: Content-Length is the UTF-8 byte count of the body
    #[test]
    fn proptest_content_length_is_byte_count(text in "\\PC*") {
        let message = serde_json::json!({"text": text});
        let frame = encode(&message).unwrap();
        let body = serde_json::to_vec(&message).unwrap();
        let header = format!("Content-Length: {}\r\n\r\n", body.len());

        prop_assert_eq!(frame.len(), header.len() + body.len());
        prop_assert!(frame.starts_with(header.as_bytes()));
    }

    /// Property: splitting the stream at arbitrary points never changes the output
    #[test]
    fn proptest_chunked_feeding(
        messages in prop::collection::vec(arb_json_value(), 1..4),
        chunk_size in 1usize..17,
    ) {
        let bytes: Vec<u8> = messages
            .iter()
            .flat_map(|m| encode(m).unwrap())
            .collect();

        let mut decoder = FrameDecoder::new();
        let mut decoded = Vec::new();
        for chunk in bytes.chunks(chunk_size) {
            decoder.feed(chunk);
            decoded.extend(drain(&mut decoder));
        }

        prop_assert_eq!(decoded, messages);
        prop_assert!(decoder.is_idle());
    }

    /// Property: garbage header blocks are reported and never swallow the next frame
    #[test]
    fn proptest_resync_after_malformed_header(
        junk in "[A-Za-z][A-Za-z ]{0,20}: [a-z0-9]{0,10}",
        message in arb_json_value(),
    ) {
        let mut bytes = format!("{junk}\r\n\r\n").into_bytes();
        bytes.extend(encode(&message).unwrap());

        let mut decoder = FrameDecoder::new();
        decoder.feed(&bytes);

        let first = decoder.try_take_message();
        prop_assert!(matches!(first, Err(FrameError::MalformedFrame(_))));
        prop_assert_eq!(decoder.try_take_message().unwrap(), Some(message));
    }
}

#[test]
fn every_split_point_yields_one_message() {
    let message = serde_json::json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "initialize",
        "params": {"capabilities": {}, "rootPath": "/tmp/π"}
    });
    let bytes = encode(&message).unwrap();

    for split in 0..=bytes.len() {
        let mut decoder = FrameDecoder::new();
        decoder.feed(&bytes[..split]);
        let mut decoded = drain(&mut decoder);
        if split < bytes.len() {
            assert!(decoded.is_empty(), "premature message at split {split}");
        }
        decoder.feed(&bytes[split..]);
        decoded.extend(drain(&mut decoder));
        assert_eq!(decoded, vec![message.clone()], "split {split}");
    }
}
