use std::io::{self, Cursor, Seek, SeekFrom, Write};

use super::resolve_seek;
use crate::engine::OutStream;

/// A growable in-memory destination.
///
/// Writing past the end extends the vector; gaps left by seeking are
/// zero-filled.
#[derive(Debug)]
pub struct BufferOutStream<'a> {
    inner: Cursor<&'a mut Vec<u8>>,
}

impl<'a> BufferOutStream<'a> {
    /// Wraps `buffer`, positioned at its start.
    pub fn new(buffer: &'a mut Vec<u8>) -> Self {
        Self {
            inner: Cursor::new(buffer),
        }
    }
}

impl Write for BufferOutStream<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for BufferOutStream<'_> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

impl OutStream for BufferOutStream<'_> {
    fn set_size(&mut self, size: u64) -> io::Result<()> {
        let size = usize::try_from(size)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "size too large"))?;
        self.inner.get_mut().resize(size, 0);
        Ok(())
    }
}

/// A destination backed by a caller-provided slice of fixed capacity.
///
/// Writes that do not fit fail; the bytes written so far are kept.
#[derive(Debug)]
pub struct FixedBufferOutStream<'a> {
    buffer: &'a mut [u8],
    pos: usize,
    len: usize,
}

impl<'a> FixedBufferOutStream<'a> {
    /// Wraps `buffer`.
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self {
            buffer,
            pos: 0,
            len: 0,
        }
    }

    /// Number of bytes the archive occupies in the buffer.
    pub fn written(&self) -> usize {
        self.len
    }

    /// Capacity of the buffer.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }
}

impl Write for FixedBufferOutStream<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let available = self.buffer.len() - self.pos;
        if available == 0 {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("fixed buffer of {} bytes is full", self.buffer.len()),
            ));
        }
        let n = available.min(buf.len());
        self.buffer[self.pos..self.pos + n].copy_from_slice(&buf[..n]);
        self.pos += n;
        self.len = self.len.max(self.pos);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for FixedBufferOutStream<'_> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = resolve_seek(pos, self.pos as u64, self.buffer.len() as u64)?;
        self.pos = target as usize;
        Ok(target)
    }
}

impl OutStream for FixedBufferOutStream<'_> {
    fn set_size(&mut self, size: u64) -> io::Result<()> {
        if size > self.buffer.len() as u64 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "size {} exceeds fixed buffer capacity {}",
                    size,
                    self.buffer.len()
                ),
            ));
        }
        self.len = size as usize;
        Ok(())
    }
}

/// Adapts any caller-owned `Write + Seek` stream as a destination.
///
/// Resizing is not supported.
#[derive(Debug)]
pub struct StdOutStream<'a, W: ?Sized> {
    inner: &'a mut W,
}

impl<'a, W: Write + Seek + ?Sized> StdOutStream<'a, W> {
    /// Wraps `inner`.
    pub fn new(inner: &'a mut W) -> Self {
        Self { inner }
    }
}

impl<W: Write + Seek + ?Sized> Write for StdOutStream<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: Write + Seek + ?Sized> Seek for StdOutStream<'_, W> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

impl<W: Write + Seek + ?Sized> OutStream for StdOutStream<'_, W> {
    fn set_size(&mut self, _size: u64) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "cannot resize a caller-provided stream",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_out_stream() {
        let mut buf = Vec::new();
        {
            let mut out = BufferOutStream::new(&mut buf);
            out.write_all(b"header").unwrap();
            out.seek(SeekFrom::Start(8)).unwrap();
            out.write_all(b"!").unwrap();
        }
        assert_eq!(buf, b"header\0\0!");
    }

    #[test]
    fn test_buffer_out_stream_set_size() {
        let mut buf = Vec::new();
        let mut out = BufferOutStream::new(&mut buf);
        out.write_all(b"abcdef").unwrap();
        out.set_size(2).unwrap();
        out.set_size(3).unwrap();
        drop(out);
        assert_eq!(buf, b"ab\0");
    }

    #[test]
    fn test_fixed_buffer_fits() {
        let mut storage = [0u8; 8];
        let mut out = FixedBufferOutStream::new(&mut storage);
        out.write_all(b"12345").unwrap();
        out.seek(SeekFrom::Start(1)).unwrap();
        out.write_all(b"x").unwrap();
        assert_eq!(out.written(), 5);
        assert_eq!(out.capacity(), 8);
        drop(out);
        assert_eq!(&storage[..5], b"1x345");
    }

    #[test]
    fn test_fixed_buffer_overflow() {
        let mut storage = [0u8; 4];
        let mut out = FixedBufferOutStream::new(&mut storage);
        let err = out.write_all(b"too long").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WriteZero);
        assert_eq!(out.written(), 4);
    }

    #[test]
    fn test_fixed_buffer_bounds() {
        let mut storage = [0u8; 4];
        let mut out = FixedBufferOutStream::new(&mut storage);
        assert!(out.seek(SeekFrom::Start(5)).is_err());
        assert_eq!(out.seek(SeekFrom::End(0)).unwrap(), 4);
        assert!(out.set_size(5).is_err());
        out.set_size(3).unwrap();
        assert_eq!(out.written(), 3);
    }

    #[test]
    fn test_std_out_stream() {
        let mut cursor = Cursor::new(Vec::new());
        let mut out = StdOutStream::new(&mut cursor);
        out.write_all(b"data").unwrap();
        let err = out.set_size(0).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
        assert_eq!(cursor.into_inner(), b"data");
    }
}
