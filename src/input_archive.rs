//! Read-only view of an existing archive opened by the engine.

use std::cell::OnceCell;
use std::collections::HashMap;
use std::fmt;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use crate::creator::ArchiveCreator;
use crate::engine::{InArchive, OutArchive, ReadSeek};
use crate::property::{PropValue, PropertyId};
use crate::stream::{BufferInStream, FileInStream};
use crate::{Error, Result};

/// An existing archive that new items are merged into.
///
/// Item indices are the engine's indices, `0..items_count()`.
pub struct InputArchive {
    archive: Box<dyn InArchive>,
    path: Option<PathBuf>,
    items_count: u32,
    by_path: OnceCell<HashMap<String, u32>>,
    closed: bool,
}

impl InputArchive {
    /// Opens the archive file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IoAt`](crate::Error::IoAt) if the file cannot be
    /// opened, or the engine's error if it cannot parse it.
    pub fn open_path(creator: &ArchiveCreator, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let stream = FileInStream::open(path)?;
        let archive = Self::open_stream(creator, Box::new(stream))?;
        Ok(Self::from_archive(archive, Some(path.to_path_buf())))
    }

    /// Opens an archive held in memory. The bytes are copied.
    pub fn open_buffer(creator: &ArchiveCreator, data: &[u8]) -> Result<Self> {
        let stream = BufferInStream::new(data.to_vec());
        let archive = Self::open_stream(creator, Box::new(stream))?;
        Ok(Self::from_archive(archive, None))
    }

    /// Opens an archive from a seekable reader.
    pub fn open_reader(
        creator: &ArchiveCreator,
        reader: impl Read + Seek + 'static,
    ) -> Result<Self> {
        let archive = Self::open_stream(creator, Box::new(reader))?;
        Ok(Self::from_archive(archive, None))
    }

    fn open_stream(
        creator: &ArchiveCreator,
        stream: Box<dyn ReadSeek>,
    ) -> Result<Box<dyn InArchive>> {
        creator.engine().open_archive(creator.format(), stream)
    }

    /// Wraps an archive handle already opened by the engine.
    pub fn from_archive(archive: Box<dyn InArchive>, path: Option<PathBuf>) -> Self {
        let items_count = archive.items_count();
        log::debug!("opened input archive with {} items", items_count);
        Self {
            archive,
            path,
            items_count,
            by_path: OnceCell::new(),
            closed: false,
        }
    }

    /// Path of the archive file, if it was opened from disk.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Number of items in the archive.
    pub fn items_count(&self) -> u32 {
        self.items_count
    }

    /// Returns a property of the item at `index`.
    pub fn item_property(&self, index: u32, prop: PropertyId) -> PropValue {
        if index >= self.items_count {
            return PropValue::Empty;
        }
        self.archive.item_property(index, prop)
    }

    /// Returns a property of the archive.
    pub fn archive_property(&self, prop: PropertyId) -> PropValue {
        self.archive.archive_property(prop)
    }

    /// In-archive path of the item at `index`.
    pub fn item_path(&self, index: u32) -> Option<String> {
        match self.item_property(index, PropertyId::Path) {
            PropValue::String(path) => Some(path),
            _ => None,
        }
    }

    /// True if the item at `index` is a directory.
    pub fn is_item_folder(&self, index: u32) -> bool {
        self.item_property(index, PropertyId::IsDir)
            .as_bool()
            .unwrap_or(false)
    }

    /// True if the item at `index` is encrypted.
    pub fn is_item_encrypted(&self, index: u32) -> bool {
        self.item_property(index, PropertyId::Encrypted)
            .as_bool()
            .unwrap_or(false)
    }

    /// Finds the index of the item stored at `path`.
    ///
    /// If several items share the path, the first one wins.
    pub fn find(&self, path: &str) -> Option<u32> {
        self.by_path
            .get_or_init(|| {
                let mut map = HashMap::with_capacity(self.items_count as usize);
                for index in 0..self.items_count {
                    if let Some(item_path) = self.item_path(index) {
                        map.entry(item_path).or_insert(index);
                    }
                }
                map
            })
            .get(path)
            .copied()
    }

    pub(crate) fn updatable(&mut self) -> Result<Box<dyn OutArchive>> {
        if self.closed {
            return Err(Error::invalid_argument(
                "source archive was closed by a previous in-place update",
            ));
        }
        self.archive.updatable()
    }

    /// Releases the underlying byte source. Calling it again does nothing.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.archive.close()
    }

    /// True once [`close`](Self::close) has run.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl fmt::Debug for InputArchive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputArchive")
            .field("path", &self.path)
            .field("items_count", &self.items_count)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}
