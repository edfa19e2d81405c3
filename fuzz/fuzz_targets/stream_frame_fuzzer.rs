//! Fuzz target for length-prefixed frame decoding over a byte stream
//!
//! Feeds arbitrary bytes to `StreamTransport` as if they arrived on a TCP
//! connection and reads frames until the stream is exhausted.
//!
//! # Invariants
//!
//! - Decoding MUST NOT panic on any input
//! - A returned frame is never longer than the requested maximum
//! - Every call consumes input, so the loop always reaches `Closed`
//! - `Overrun` consumes the oversized payload (the stream stays aligned)

#![no_main]

use std::io::Cursor;

use libfuzzer_sys::fuzz_target;
use sealink_core::{IoError, StreamTransport, Transport};

fuzz_target!(|input: (u8, Vec<u8>)| {
    let (max_len, data) = input;
    let max_len = usize::from(max_len);
    let total = data.len();
    let mut transport = StreamTransport::new(Cursor::new(data));

    for _ in 0..=total {
        match transport.receive_frame(max_len) {
            Ok(frame) => assert!(frame.len() <= max_len, "frame exceeds requested maximum"),
            Err(IoError::Closed) => return,
            Err(IoError::Overrun { expected, received }) => {
                assert_eq!(expected, max_len);
                assert!(received > max_len);
            },
            Err(IoError::ShortTransfer { expected, received }) => assert!(received < expected),
            Err(e) => panic!("unexpected error from in-memory stream: {e}"),
        }
    }

    panic!("stream of {total} bytes never reported Closed");
});
