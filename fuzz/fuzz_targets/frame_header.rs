//! Frame header decoding must never panic, and any header it accepts must
//! re-encode to the same bytes and respect the length limit.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sealpipe_proto::{FrameHeader, MAX_FRAME_SIZE};

fuzz_target!(|data: &[u8]| {
    let Ok(header) = FrameHeader::from_bytes(data) else {
        return;
    };

    assert_eq!(data.len(), FrameHeader::SIZE);
    assert_eq!(header.to_bytes(), data);

    if header.validate(MAX_FRAME_SIZE).is_ok() {
        assert!(header.body_len() <= MAX_FRAME_SIZE);
    }
});
