//! Byte sources the engine reads item data from, and destination sinks it
//! writes archives into.
//!
//! Sources implement [`Read`](std::io::Read) + [`Seek`](std::io::Seek) and
//! are opened only when the engine asks for an item's content. Sinks
//! implement [`OutStream`](crate::engine::OutStream).

mod buffer;
mod file;
mod sink;

pub use buffer::BufferInStream;
pub use file::{FileInStream, FileOutStream, FILE_BUFFER_SIZE};
pub use sink::{BufferOutStream, FixedBufferOutStream, StdOutStream};

use std::io;

/// Resolves a seek request against a stream of `len` bytes positioned at
/// `pos`, rejecting targets outside `[0, len]`.
pub(crate) fn resolve_seek(pos: io::SeekFrom, current: u64, len: u64) -> io::Result<u64> {
    let target = match pos {
        io::SeekFrom::Start(offset) => i128::from(offset),
        io::SeekFrom::Current(delta) => i128::from(current) + i128::from(delta),
        io::SeekFrom::End(delta) => i128::from(len) + i128::from(delta),
    };
    if target < 0 || target > i128::from(len) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("seek position {} out of range [0, {}]", target, len),
        ));
    }
    Ok(target as u64)
}
