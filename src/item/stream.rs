use std::cell::RefCell;
use std::io::{self, Read, Seek, SeekFrom};
use std::rc::Rc;

use super::GenericItem;
use crate::archive_path::ArchivePath;
use crate::engine::ReadSeek;
use crate::format::attributes;
use crate::timestamp::Timestamp;
use crate::Result;

type SharedReader = Rc<RefCell<Box<dyn ReadSeek>>>;

/// An item whose content comes from a caller-provided reader.
///
/// The reader is rewound every time the engine opens the item, so an
/// engine that reads an item twice sees the same bytes.
pub struct StreamItem {
    path: ArchivePath,
    reader: SharedReader,
    size: u64,
    modified: Timestamp,
}

impl StreamItem {
    /// Wraps `reader`, measuring its size by seeking to the end.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if the reader cannot seek.
    pub fn new(reader: impl Read + Seek + 'static, path: ArchivePath) -> Result<Self> {
        let mut reader: Box<dyn ReadSeek> = Box::new(reader);
        let size = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;
        Ok(Self {
            path,
            reader: Rc::new(RefCell::new(reader)),
            size,
            modified: Timestamp::now(),
        })
    }
}

impl std::fmt::Debug for StreamItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamItem")
            .field("path", &self.path)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl GenericItem for StreamItem {
    fn archive_path(&self) -> &ArchivePath {
        &self.path
    }

    fn is_dir(&self) -> bool {
        false
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn attributes(&self) -> Option<u32> {
        Some(attributes::ARCHIVE)
    }

    fn modified(&self) -> Option<Timestamp> {
        Some(self.modified)
    }

    fn open(&self) -> Result<Box<dyn ReadSeek>> {
        self.reader
            .try_borrow_mut()
            .map_err(|_| io::Error::other("stream item is already being read"))?
            .seek(SeekFrom::Start(0))?;
        Ok(Box::new(SharedStream(Rc::clone(&self.reader))))
    }
}

/// A handle to the shared reader of a [`StreamItem`].
struct SharedStream(SharedReader);

impl Read for SharedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.borrow_mut().read(buf)
    }
}

impl Seek for SharedStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.0.borrow_mut().seek(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_size_and_rewind() {
        let mut cursor = Cursor::new(b"stream data".to_vec());
        cursor.set_position(4);
        let item = StreamItem::new(cursor, ArchivePath::new("s.bin").unwrap()).unwrap();
        assert_eq!(item.size(), 11);

        let mut first = Vec::new();
        item.open().unwrap().read_to_end(&mut first).unwrap();
        let mut second = Vec::new();
        item.open().unwrap().read_to_end(&mut second).unwrap();
        assert_eq!(first, b"stream data");
        assert_eq!(first, second);
    }

    #[test]
    fn test_properties() {
        let item = StreamItem::new(Cursor::new(vec![0u8; 3]), ArchivePath::new("a/b").unwrap())
            .unwrap();
        assert!(!item.is_dir());
        assert!(item.modified().is_some());
        assert!(format!("{:?}", item).contains("a/b"));
    }
}
