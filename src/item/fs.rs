use std::fs::Metadata;
use std::path::{Path, PathBuf};

use filetime::FileTime;

use super::GenericItem;
use crate::archive_path::ArchivePath;
use crate::engine::ReadSeek;
use crate::format::attributes;
use crate::stream::FileInStream;
use crate::timestamp::Timestamp;
use crate::{Error, Result};

/// A file or directory on disk.
///
/// Metadata is captured when the item is created; the file itself is opened
/// only when the engine reads it, so a file removed in between shows up in
/// the failed-item log rather than as an error here.
#[derive(Debug, Clone)]
pub struct FsItem {
    disk_path: PathBuf,
    path: ArchivePath,
    is_dir: bool,
    size: u64,
    attributes: u32,
    modified: Option<Timestamp>,
    created: Option<Timestamp>,
    accessed: Option<Timestamp>,
}

impl FsItem {
    /// Creates an item for `disk_path`, stored as `path` in the archive.
    ///
    /// Symbolic links are followed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IoAt`] if the metadata cannot be read.
    pub fn new(disk_path: impl Into<PathBuf>, path: ArchivePath) -> Result<Self> {
        let disk_path = disk_path.into();
        let metadata = std::fs::metadata(&disk_path)
            .map_err(|e| Error::io_at("Cannot read file metadata", &disk_path, e))?;
        Ok(Self::from_metadata(disk_path, path, &metadata))
    }

    /// Creates an item named after the last component of `disk_path`.
    pub fn from_disk(disk_path: impl Into<PathBuf>) -> Result<Self> {
        let disk_path = disk_path.into();
        let name = disk_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                Error::InvalidArchivePath(format!(
                    "cannot derive an archive name from '{}'",
                    disk_path.display()
                ))
            })?;
        let path = ArchivePath::new(name)?;
        Self::new(disk_path, path)
    }

    fn from_metadata(disk_path: PathBuf, path: ArchivePath, metadata: &Metadata) -> Self {
        let is_dir = metadata.is_dir();
        Self {
            disk_path,
            path,
            is_dir,
            size: if is_dir { 0 } else { metadata.len() },
            attributes: file_attributes(metadata),
            modified: Timestamp::from_file_time(FileTime::from_last_modification_time(metadata)),
            created: FileTime::from_creation_time(metadata).and_then(Timestamp::from_file_time),
            accessed: Timestamp::from_file_time(FileTime::from_last_access_time(metadata)),
        }
    }

    /// The path on disk.
    pub fn disk_path(&self) -> &Path {
        &self.disk_path
    }
}

#[cfg(windows)]
fn file_attributes(metadata: &Metadata) -> u32 {
    use std::os::windows::fs::MetadataExt;
    metadata.file_attributes()
}

#[cfg(unix)]
fn file_attributes(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    let mut attrib = if metadata.is_dir() {
        attributes::DIRECTORY
    } else {
        attributes::ARCHIVE
    };
    if metadata.permissions().readonly() {
        attrib |= attributes::READONLY;
    }
    let mode = metadata.permissions().mode() & 0xFFFF;
    attrib | attributes::UNIX_EXTENSION | (mode << 16)
}

#[cfg(not(any(unix, windows)))]
fn file_attributes(metadata: &Metadata) -> u32 {
    if metadata.is_dir() {
        attributes::DIRECTORY
    } else {
        attributes::ARCHIVE
    }
}

impl GenericItem for FsItem {
    fn archive_path(&self) -> &ArchivePath {
        &self.path
    }

    fn is_dir(&self) -> bool {
        self.is_dir
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn attributes(&self) -> Option<u32> {
        Some(self.attributes)
    }

    fn modified(&self) -> Option<Timestamp> {
        self.modified
    }

    fn created(&self) -> Option<Timestamp> {
        self.created
    }

    fn accessed(&self) -> Option<Timestamp> {
        self.accessed
    }

    fn source_path(&self) -> PathBuf {
        self.disk_path.clone()
    }

    fn open(&self) -> Result<Box<dyn ReadSeek>> {
        Ok(Box::new(FileInStream::open(&self.disk_path)?))
    }
}
