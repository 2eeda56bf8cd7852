//! PFCP Message Fuzzer
//!
//! Fuzzes the PFCP message parser to find crashes or panics when handling
//! malformed PFCP messages. Every message that parses must re-encode to the
//! same length and parse again to the same message.
//!
//! Run with: cargo +nightly fuzz run fuzz_pfcp_message

#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use pfcp_codec::message::Message;

fuzz_target!(|data: &[u8]| {
    let mut buf = Bytes::copy_from_slice(data);
    let Ok(msg) = Message::decode(&mut buf) else {
        return;
    };

    let consumed = data.len() - buf.len();
    let encoded = msg.marshal().expect("decoded message must re-encode");
    assert_eq!(encoded.len(), consumed);

    let reparsed = Message::decode(&mut encoded.clone()).expect("re-encoded message must parse");
    assert_eq!(reparsed, msg);

    let _ = msg.dump(8);
});
