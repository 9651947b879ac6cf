use std::io::{self, Read, Seek, SeekFrom};

use super::resolve_seek;

/// A seekable reader over an in-memory buffer.
///
/// Unlike [`std::io::Cursor`], seeking outside `[0, len]` is an
/// [`InvalidInput`](io::ErrorKind::InvalidInput) error and leaves the
/// position unchanged.
///
/// ```rust
/// use std::io::{Read, Seek, SeekFrom};
/// use sevenlink::stream::BufferInStream;
///
/// let mut stream = BufferInStream::new(b"hello".to_vec());
/// stream.seek(SeekFrom::End(-2)).unwrap();
/// let mut tail = String::new();
/// stream.read_to_string(&mut tail).unwrap();
/// assert_eq!(tail, "lo");
/// assert!(stream.seek(SeekFrom::Current(1)).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct BufferInStream<B> {
    data: B,
    pos: usize,
}

impl<B: AsRef<[u8]>> BufferInStream<B> {
    /// Creates a stream positioned at the start of `data`.
    pub fn new(data: B) -> Self {
        Self { data, pos: 0 }
    }

    /// Current position.
    pub fn position(&self) -> u64 {
        self.pos as u64
    }

    /// Length of the buffer.
    pub fn len(&self) -> u64 {
        self.data.as_ref().len() as u64
    }

    /// Returns true if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.data.as_ref().is_empty()
    }

    /// Returns the underlying buffer.
    pub fn into_inner(self) -> B {
        self.data
    }
}

impl<B: AsRef<[u8]>> Read for BufferInStream<B> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = &self.data.as_ref()[self.pos..];
        let n = remaining.len().min(buf.len());
        if n == 0 {
            return Ok(0);
        }
        buf[..n].copy_from_slice(&remaining[..n]);
        self.pos += n;
        Ok(n)
    }
}

impl<B: AsRef<[u8]>> Seek for BufferInStream<B> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = resolve_seek(pos, self.position(), self.len())?;
        self.pos = target as usize;
        Ok(target)
    }
}
