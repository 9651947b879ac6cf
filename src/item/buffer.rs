use std::rc::Rc;

use super::GenericItem;
use crate::archive_path::ArchivePath;
use crate::engine::ReadSeek;
use crate::format::attributes;
use crate::stream::BufferInStream;
use crate::timestamp::Timestamp;
use crate::Result;

/// An item whose content is held in memory.
///
/// The bytes are shared with every stream handed to the engine, so opening
/// the item never copies them.
#[derive(Debug, Clone)]
pub struct BufferItem {
    path: ArchivePath,
    data: Rc<[u8]>,
    modified: Timestamp,
}

impl BufferItem {
    /// Creates an item from `data`, timestamped now.
    pub fn new(data: impl Into<Rc<[u8]>>, path: ArchivePath) -> Self {
        Self {
            path,
            data: data.into(),
            modified: Timestamp::now(),
        }
    }

    /// Overrides the modification time.
    pub fn with_modified(mut self, modified: Timestamp) -> Self {
        self.modified = modified;
        self
    }

    /// The item content.
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl GenericItem for BufferItem {
    fn archive_path(&self) -> &ArchivePath {
        &self.path
    }

    fn is_dir(&self) -> bool {
        false
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn attributes(&self) -> Option<u32> {
        Some(attributes::ARCHIVE)
    }

    fn modified(&self) -> Option<Timestamp> {
        Some(self.modified)
    }

    fn created(&self) -> Option<Timestamp> {
        Some(self.modified)
    }

    fn accessed(&self) -> Option<Timestamp> {
        Some(self.modified)
    }

    fn open(&self) -> Result<Box<dyn ReadSeek>> {
        Ok(Box::new(BufferInStream::new(Rc::clone(&self.data))))
    }
}
