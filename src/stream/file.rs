use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::engine::OutStream;
use crate::{Error, Result};

/// Buffer size used for file streams (1 MiB).
pub const FILE_BUFFER_SIZE: usize = 1024 * 1024;

/// A buffered, seekable reader over a file.
///
/// Seeking past the end of the file is allowed; subsequent reads return
/// zero bytes.
#[derive(Debug)]
pub struct FileInStream {
    inner: BufReader<File>,
    path: PathBuf,
}

impl FileInStream {
    /// Opens `path` for reading.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IoAt`] carrying the path and OS error.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::io_at("Cannot open file", path, e))?;
        Ok(Self {
            inner: BufReader::with_capacity(FILE_BUFFER_SIZE, file),
            path: path.to_path_buf(),
        })
    }

    /// Path of the open file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Read for FileInStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Seek for FileInStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

/// A buffered destination file.
///
/// Buffered data is flushed on drop, but errors are only observable
/// through an explicit [`flush`](Write::flush).
#[derive(Debug)]
pub struct FileOutStream {
    inner: BufWriter<File>,
    path: PathBuf,
}

impl FileOutStream {
    /// Creates (or truncates) `path` for writing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IoAt`] carrying the path and OS error.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|e| Error::io_at("Cannot create output archive file", path, e))?;
        Ok(Self {
            inner: BufWriter::with_capacity(FILE_BUFFER_SIZE, file),
            path: path.to_path_buf(),
        })
    }

    /// Path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Write for FileOutStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl Seek for FileOutStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

impl OutStream for FileOutStream {
    fn set_size(&mut self, size: u64) -> io::Result<()> {
        self.inner.flush()?;
        self.inner.get_ref().set_len(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_missing_file() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.bin");
        let err = FileInStream::open(&missing).unwrap_err();
        assert!(err.is_io());
        assert_eq!(err.path(), Some(missing.as_path()));
    }

    #[test]
    fn test_read_and_seek() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.bin");
        std::fs::write(&path, b"0123456789").unwrap();

        let mut stream = FileInStream::open(&path).unwrap();
        assert_eq!(stream.path(), path);
        stream.seek(SeekFrom::Start(7)).unwrap();
        let mut rest = Vec::new();
        stream.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, b"789");

        assert_eq!(stream.seek(SeekFrom::End(5)).unwrap(), 15);
        let mut buf = [0u8; 4];
        assert_eq!(stream.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_out_stream_set_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.bin");
        {
            let mut out = FileOutStream::create(&path).unwrap();
            out.write_all(b"abcdef").unwrap();
            out.seek(SeekFrom::Start(1)).unwrap();
            out.write_all(b"X").unwrap();
            out.set_size(4).unwrap();
            out.flush().unwrap();
        }
        assert_eq!(std::fs::read(&path).unwrap(), b"aXcd");
    }

    #[test]
    fn test_create_in_missing_directory() {
        let dir = TempDir::new().unwrap();
        let err = FileOutStream::create(dir.path().join("nope").join("out.bin")).unwrap_err();
        assert!(err.to_string().contains("Cannot create output archive file"));
    }
}
