//! New items to be written into an archive.
//!
//! Every item knows its in-archive path and its properties up front; its
//! content is opened only when the engine asks for it. Three sources are
//! supported:
//!
//! - [`FsItem`]: a file or directory on disk;
//! - [`BufferItem`]: bytes held in memory;
//! - [`StreamItem`]: a caller-provided seekable reader.
//!
//! [`ItemIndexer`] walks directories and produces `FsItem`s.

mod buffer;
mod fs;
mod indexer;
mod stream;

pub use buffer::BufferItem;
pub use fs::FsItem;
pub use indexer::ItemIndexer;
pub use stream::StreamItem;

use std::path::PathBuf;

use crate::archive_path::ArchivePath;
use crate::engine::ReadSeek;
use crate::property::{PropValue, PropertyId};
use crate::timestamp::Timestamp;
use crate::Result;

/// A new item of the output archive.
pub trait GenericItem {
    /// Path of the item inside the archive.
    fn archive_path(&self) -> &ArchivePath;

    /// Whether the item is a directory.
    fn is_dir(&self) -> bool;

    /// Size of the content in bytes (0 for directories).
    fn size(&self) -> u64;

    /// File attributes, if known.
    fn attributes(&self) -> Option<u32> {
        None
    }

    /// Last modification time.
    fn modified(&self) -> Option<Timestamp> {
        None
    }

    /// Creation time.
    fn created(&self) -> Option<Timestamp> {
        None
    }

    /// Last access time.
    fn accessed(&self) -> Option<Timestamp> {
        None
    }

    /// Path used to identify the item in the failed-item log.
    ///
    /// Items living on disk report their filesystem path.
    fn source_path(&self) -> PathBuf {
        PathBuf::from(self.archive_path().as_str())
    }

    /// Opens the item content for reading, positioned at its start.
    fn open(&self) -> Result<Box<dyn ReadSeek>>;

    /// Returns one property of the item.
    fn property(&self, prop: PropertyId) -> PropValue {
        match prop {
            PropertyId::Path => PropValue::from(self.archive_path().as_str()),
            PropertyId::Name => PropValue::from(self.archive_path().file_name()),
            PropertyId::IsDir => PropValue::Bool(self.is_dir()),
            PropertyId::Size => PropValue::U64(self.size()),
            PropertyId::Attrib => self.attributes().into(),
            PropertyId::MTime => self.modified().into(),
            PropertyId::CTime => self.created().into(),
            PropertyId::ATime => self.accessed().into(),
            PropertyId::IsAnti => PropValue::Bool(false),
            _ => PropValue::Empty,
        }
    }
}

impl std::fmt::Debug for dyn GenericItem + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenericItem")
            .field("path", self.archive_path())
            .field("is_dir", &self.is_dir())
            .field("size", &self.size())
            .finish()
    }
}
