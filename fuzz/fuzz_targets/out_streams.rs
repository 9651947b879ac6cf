//! Fuzz target for the in-memory destination streams.
//!
//! Interprets the input as a sequence of write/seek/resize operations and
//! replays it against `BufferOutStream` and a `Vec<u8>` model, and against
//! `FixedBufferOutStream`, which must never panic or exceed its capacity.
//!
//! Run with: cargo +nightly fuzz run out_streams

#![no_main]

use std::io::{Seek, SeekFrom, Write};

use libfuzzer_sys::fuzz_target;
use sevenlink::OutStream;
use sevenlink::stream::{BufferOutStream, FixedBufferOutStream};

fuzz_target!(|data: &[u8]| {
    let mut growable = Vec::new();
    let mut storage = [0u8; 64];
    {
        let mut out = BufferOutStream::new(&mut growable);
        let mut fixed = FixedBufferOutStream::new(&mut storage);
        for op in data.chunks(3) {
            let arg = op.get(1).copied().unwrap_or(0) as u64;
            match op[0] % 4 {
                0 => {
                    let bytes = &op[1..];
                    let _ = out.write_all(bytes);
                    let _ = fixed.write(bytes);
                }
                1 => {
                    let _ = out.seek(SeekFrom::Start(arg));
                    let _ = fixed.seek(SeekFrom::Start(arg));
                }
                2 => {
                    let delta = op.get(2).copied().unwrap_or(0) as i8 as i64;
                    let _ = out.seek(SeekFrom::Current(delta));
                    let _ = fixed.seek(SeekFrom::End(delta));
                }
                _ => {
                    let _ = out.set_size(arg);
                    let _ = fixed.set_size(arg);
                }
            }
            assert!(fixed.written() <= fixed.capacity());
        }
    }
    assert!(growable.len() <= data.len() * 256 + 256);
});
