//! Opening arbitrary bytes must never panic and never authenticate, and
//! sealing arbitrary plaintext must open back to it.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sealpipe_crypto::SessionKey;
use sealpipe_proto::{NONCE_SIZE, SealedFrame, sealed_len};

fuzz_target!(|data: &[u8]| {
    let key = SessionKey::from_bytes([0x42; 32]);

    // Forging a Poly1305 tag by chance is out of reach for a fuzzer
    assert!(key.open(data).is_err());

    let nonce = [data.len() as u8; NONCE_SIZE];
    let Ok(frame) = key.seal_with_nonce(data, &nonce) else {
        return;
    };
    assert_eq!(frame.len(), sealed_len(data.len()));
    assert!(SealedFrame::parse(&frame).is_ok());
    assert_eq!(key.open(&frame).as_deref(), Ok(data));
});
