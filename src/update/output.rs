use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io::{self, Read, Seek, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use super::callback::UpdateCallback;
use super::index::{IndexMapping, InputIndex};
use crate::archive_path::ArchivePath;
use crate::creator::{ArchiveCreator, UpdateMode};
use crate::engine::{EngineStatus, OperationResult, OutArchive, OutStream, ReadSeek};
use crate::error::FailedItem;
use crate::format::FormatFeatures;
use crate::input_archive::InputArchive;
use crate::item::{BufferItem, FsItem, GenericItem, ItemIndexer, StreamItem};
use crate::progress::{NoProgress, ProgressReporter};
use crate::property::{PropValue, PropertyId};
use crate::stream::{BufferOutStream, FileOutStream, FixedBufferOutStream, StdOutStream};
use crate::volume::{MultiVolumeOutStream, VolumeConfig};
use crate::{Error, Result};

/// Describes the content of an archive to be written by the engine.
///
/// An output archive starts either empty or from an existing archive. Items
/// are added in order; items of the source archive can be deleted, and in
/// [`UpdateMode::Overwrite`] a new item replaces the source item with the
/// same path. The engine sees a dense sequence of output indices:
/// surviving source items first, then the new items.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use sevenlink::{ArchiveCreator, ArchiveFormat, OutputArchive, UpdateMode};
///
/// let creator = ArchiveCreator::new(engine, ArchiveFormat::SEVEN_ZIP)
///     .update_mode(UpdateMode::Overwrite);
///
/// let mut output = OutputArchive::with_path(&creator, "backup.7z")?;
/// output.add_file("notes.txt", None)?;
/// output.add_buffer(b"generated".to_vec(), "meta/info.txt")?;
/// output.delete_path("obsolete.log")?;
/// output.compress_to_path("backup.7z")?;
/// ```
pub struct OutputArchive<'c> {
    creator: &'c ArchiveCreator,
    input: Option<InputArchive>,
    new_items: Vec<Box<dyn GenericItem>>,
    deleted: BTreeSet<u32>,
    /// Table from the last `update_input_indices`; dropped on any change.
    mapping: Option<IndexMapping>,
    failed: Vec<FailedItem>,
    progress: Box<dyn ProgressReporter + 'c>,
}

impl<'c> OutputArchive<'c> {
    /// Creates an empty output archive.
    pub fn new(creator: &'c ArchiveCreator) -> Self {
        Self {
            creator,
            input: None,
            new_items: Vec::new(),
            deleted: BTreeSet::new(),
            mapping: None,
            failed: Vec::new(),
            progress: Box::new(NoProgress),
        }
    }

    /// Creates an output archive that updates the archive file at `path`.
    ///
    /// If `path` is empty or does not exist, the output starts empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the creator's update mode is
    /// [`UpdateMode::None`] or the format cannot hold several items, and
    /// the open error if the existing file cannot be read.
    pub fn with_path(creator: &'c ArchiveCreator, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut output = Self::new(creator);
        if path.as_os_str().is_empty() || !path.exists() {
            return Ok(output);
        }
        if creator.mode() == UpdateMode::None {
            return Err(Error::invalid_argument(format!(
                "cannot update '{}': update mode is None",
                path.display()
            )));
        }
        if !creator.format().has_feature(FormatFeatures::MULTIPLE_FILES) {
            return Err(Error::invalid_argument(format!(
                "format {} cannot update existing archives",
                creator.format()
            )));
        }
        log::debug!("updating existing archive {}", path.display());
        output.input = Some(InputArchive::open_path(creator, path)?);
        Ok(output)
    }

    /// Creates an output archive that updates the archive held in `data`.
    ///
    /// An empty buffer starts an empty archive.
    pub fn with_buffer(creator: &'c ArchiveCreator, data: &[u8]) -> Result<Self> {
        let mut output = Self::new(creator);
        if !data.is_empty() {
            output.input = Some(InputArchive::open_buffer(creator, data)?);
        }
        Ok(output)
    }

    /// Creates an output archive that updates the archive read from `reader`.
    pub fn with_reader(
        creator: &'c ArchiveCreator,
        reader: impl Read + Seek + 'static,
    ) -> Result<Self> {
        let mut output = Self::new(creator);
        output.input = Some(InputArchive::open_reader(creator, reader)?);
        Ok(output)
    }

    /// Installs a progress reporter for the next compression.
    pub fn set_progress(&mut self, progress: impl ProgressReporter + 'c) {
        self.progress = Box::new(progress);
    }

    /// The source archive, if any.
    pub fn input_archive(&self) -> Option<&InputArchive> {
        self.input.as_ref()
    }

    /// The creator this output archive was built from.
    pub fn creator(&self) -> &'c ArchiveCreator {
        self.creator
    }

    /// Items that could not be processed during the last compression.
    pub fn failed_items(&self) -> &[FailedItem] {
        &self.failed
    }

    pub(crate) fn progress_mut(&mut self) -> &mut dyn ProgressReporter {
        self.progress.as_mut()
    }

    /// Appends an item.
    ///
    /// In [`UpdateMode::Overwrite`], a source item with the same path is
    /// marked deleted.
    pub fn add_item(&mut self, item: Box<dyn GenericItem>) {
        if self.creator.mode() == UpdateMode::Overwrite {
            if let Some(input) = &self.input {
                if let Some(index) = input.find(item.archive_path().as_str()) {
                    log::trace!("'{}' replaces source item {}", item.archive_path(), index);
                    self.deleted.insert(index);
                }
            }
        }
        self.new_items.push(item);
        self.mapping = None;
    }

    fn add_all(&mut self, items: Vec<FsItem>) {
        for item in items {
            self.add_item(Box::new(item));
        }
    }

    /// Adds a single file from disk, named `name` or after its file name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `path` is a directory.
    pub fn add_file(&mut self, path: impl AsRef<Path>, name: Option<&str>) -> Result<()> {
        let path = path.as_ref();
        let item = match name {
            Some(name) => FsItem::new(path, ArchivePath::new(name)?)?,
            None => FsItem::from_disk(path)?,
        };
        if item.is_dir() {
            return Err(Error::invalid_argument(format!(
                "'{}' is a directory",
                path.display()
            )));
        }
        self.add_item(Box::new(item));
        Ok(())
    }

    /// Adds an in-memory item.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `name` is empty.
    pub fn add_buffer(&mut self, data: impl Into<Rc<[u8]>>, name: &str) -> Result<()> {
        let path = Self::item_name(name)?;
        self.add_item(Box::new(BufferItem::new(data, path)));
        Ok(())
    }

    /// Adds an item whose content is read from `reader`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `name` is empty.
    pub fn add_stream(&mut self, reader: impl Read + Seek + 'static, name: &str) -> Result<()> {
        let path = Self::item_name(name)?;
        self.add_item(Box::new(StreamItem::new(reader, path)?));
        Ok(())
    }

    fn item_name(name: &str) -> Result<ArchivePath> {
        if name.is_empty() {
            return Err(Error::invalid_argument("item name cannot be empty"));
        }
        ArchivePath::new(name)
    }

    /// Adds files and directories. Directories are added with their whole
    /// content, under their own name.
    pub fn add_items<I, P>(&mut self, paths: I) -> Result<()>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        for path in paths {
            let path = path.as_ref();
            if path.is_dir() {
                self.add_directory(path)?;
            } else {
                self.add_item(Box::new(FsItem::from_disk(path)?));
            }
        }
        Ok(())
    }

    /// Adds files and directories under explicit in-archive names.
    ///
    /// A directory's content lands below its given name.
    pub fn add_items_map<I, P, S>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (P, S)>,
        P: AsRef<Path>,
        S: AsRef<str>,
    {
        for (path, name) in entries {
            let path = path.as_ref();
            let name = ArchivePath::new(name.as_ref())?;
            if path.is_dir() {
                let items = ItemIndexer::new(path)
                    .prefix(name)
                    .include_root(true)
                    .index()?;
                self.add_all(items);
            } else {
                self.add_item(Box::new(FsItem::new(path, name)?));
            }
        }
        Ok(())
    }

    /// Adds files only. Directories in `paths` are skipped.
    pub fn add_files<I, P>(&mut self, paths: I) -> Result<()>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        for path in paths {
            let item = FsItem::from_disk(path.as_ref())?;
            if item.is_dir() {
                log::debug!("skipping directory {}", path.as_ref().display());
                continue;
            }
            self.add_item(Box::new(item));
        }
        Ok(())
    }

    /// Adds the files below `dir` whose names match `filter`, named relative
    /// to `dir`.
    pub fn add_files_in(
        &mut self,
        dir: impl AsRef<Path>,
        recursive: bool,
        filter: &str,
    ) -> Result<()> {
        let items = ItemIndexer::new(dir.as_ref())
            .recursive(recursive)
            .files_only(true)
            .filter(filter)?
            .index()?;
        self.add_all(items);
        Ok(())
    }

    /// Adds a directory and its whole content under the directory's name.
    pub fn add_directory(&mut self, dir: impl AsRef<Path>) -> Result<()> {
        let items = ItemIndexer::new(dir.as_ref()).include_root(true).index()?;
        self.add_all(items);
        Ok(())
    }

    /// Drops the source item at `index` from the output.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if there is no source archive or
    /// the index is out of range.
    pub fn delete_item(&mut self, index: u32) -> Result<()> {
        let count = self.existing_count();
        if index >= count {
            return Err(Error::invalid_argument(format!(
                "source item index {} out of range (count {})",
                index, count
            )));
        }
        self.deleted.insert(index);
        self.mapping = None;
        Ok(())
    }

    /// Drops the source item stored at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ItemNotFound`] if no source item has that path.
    pub fn delete_path(&mut self, path: &str) -> Result<()> {
        let index = self
            .input
            .as_ref()
            .and_then(|input| input.find(path))
            .ok_or_else(|| Error::ItemNotFound {
                path: path.to_string(),
            })?;
        self.deleted.insert(index);
        self.mapping = None;
        Ok(())
    }

    fn existing_count(&self) -> u32 {
        self.input.as_ref().map_or(0, InputArchive::items_count)
    }

    /// Number of items the engine will write.
    pub fn items_count(&self) -> u32 {
        let existing = self.existing_count();
        let deleted = self.deleted.range(..existing).count() as u32;
        existing - deleted + self.new_items.len() as u32
    }

    /// Number of items added so far.
    pub fn new_items_count(&self) -> u32 {
        self.new_items.len() as u32
    }

    /// Rebuilds the output-index table from the current delete set.
    pub fn update_input_indices(&mut self) {
        self.mapping = Some(IndexMapping::build(
            self.existing_count(),
            &self.deleted,
            self.new_items.len() as u32,
        ));
    }

    fn resolve_overwrites(&mut self) {
        if self.creator.mode() != UpdateMode::Overwrite {
            return;
        }
        let Some(input) = &self.input else {
            return;
        };
        for item in &self.new_items {
            if let Some(index) = input.find(item.archive_path().as_str()) {
                self.deleted.insert(index);
            }
        }
    }

    /// Where the output item at `index` comes from.
    ///
    /// Uses the table built by
    /// [`update_input_indices`](Self::update_input_indices) while it is
    /// current, and resolves from the delete set otherwise.
    pub fn item_input_index(&self, index: u32) -> InputIndex {
        match &self.mapping {
            Some(mapping) => mapping.get(index),
            None => IndexMapping::resolve(self.existing_count(), &self.deleted, index),
        }
    }

    fn new_item(&self, index: u32) -> Option<&dyn GenericItem> {
        match self.item_input_index(index) {
            InputIndex::New(slot) => self.new_items.get(slot as usize).map(|item| &**item),
            InputIndex::Existing(_) => None,
        }
    }

    /// True if the engine must read the content of output item `index`.
    pub fn has_new_data(&self, index: u32) -> bool {
        self.item_input_index(index).is_new()
    }

    /// True if the engine must read the properties of output item `index`.
    pub fn has_new_properties(&self, index: u32) -> bool {
        self.has_new_data(index)
    }

    /// Source-archive index of output item `index`, if it comes from there.
    pub fn index_in_archive(&self, index: u32) -> Option<u32> {
        self.item_input_index(index).existing()
    }

    /// A property of the output item at `index`.
    pub fn output_item_property(&self, index: u32, prop: PropertyId) -> PropValue {
        match self.item_input_index(index) {
            InputIndex::Existing(source) => match &self.input {
                Some(input) => input.item_property(source, prop),
                None => PropValue::Empty,
            },
            InputIndex::New(_) => self
                .new_item(index)
                .map_or(PropValue::Empty, |item| item.property(prop)),
        }
    }

    /// Opens the content of the output item at `index`.
    ///
    /// Source items and directories have no stream. A new item whose source
    /// cannot be opened is logged as failed and reported as
    /// [`Error::ItemUnavailable`].
    pub fn output_item_stream(&mut self, index: u32) -> Result<Option<Box<dyn ReadSeek>>> {
        let slot = match self.item_input_index(index) {
            InputIndex::Existing(_) => return Ok(None),
            InputIndex::New(slot) => slot as usize,
        };
        let Some(item) = self.new_items.get(slot) else {
            return Err(Error::invalid_argument(format!(
                "output index {} has no item",
                index
            )));
        };
        if item.is_dir() {
            return Ok(None);
        }

        self.progress
            .on_item_start(item.archive_path().as_str(), item.size());
        match item.open() {
            Ok(stream) => Ok(Some(stream)),
            Err(err) => {
                let path = item.source_path();
                log::warn!("cannot open {}: {}", path.display(), err);
                self.progress
                    .on_warning(&format!("cannot open {}: {}", path.display(), err));
                self.failed
                    .push(FailedItem::open(path.clone(), into_io_error(err)));
                Err(Error::ItemUnavailable { index, path })
            }
        }
    }

    fn output_item_path(&self, index: u32) -> PathBuf {
        match self.item_input_index(index) {
            InputIndex::Existing(source) => self
                .input
                .as_ref()
                .and_then(|input| input.item_path(source))
                .map(PathBuf::from)
                .unwrap_or_default(),
            InputIndex::New(_) => self
                .new_item(index)
                .map(|item| item.source_path())
                .unwrap_or_default(),
        }
    }

    pub(crate) fn record_operation_failure(&mut self, index: Option<u32>, result: OperationResult) {
        let path = index.map(|i| self.output_item_path(i)).unwrap_or_default();
        log::warn!("engine reported {} for {}", result, path.display());
        self.progress
            .on_warning(&format!("{}: {}", path.display(), result));
        self.failed.push(FailedItem::operation(path, result));
    }

    /// Writes the archive to `path`.
    ///
    /// When `path` is the file this archive was opened from, the engine
    /// writes `<path>.tmp`, which then replaces the original. The temporary
    /// file is removed if anything fails, leaving the original untouched.
    /// With a volume size set, the archive is split into `<path>.001`,
    /// `<path>.002`, ...
    pub fn compress_to_path(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut archive = self.init_out_archive()?;

        let split = self.creator.split_size();
        if split > 0 {
            let mut out = MultiVolumeOutStream::create(VolumeConfig::new(path, split)?)?;
            self.compress_out(archive.as_mut(), &mut out)?;
            let sizes = out.finish()?;
            log::debug!("wrote {} volumes for {}", sizes.len(), path.display());
            return Ok(());
        }

        if !self.is_source(path) {
            let mut out = FileOutStream::create(path)?;
            return self.compress_out(archive.as_mut(), &mut out);
        }

        let tmp = temp_path(path);
        if let Err(err) = self.write_file(archive.as_mut(), &tmp) {
            remove_temp(&tmp);
            return Err(err);
        }
        drop(archive);
        if let Some(input) = self.input.as_mut() {
            if let Err(err) = input.close() {
                remove_temp(&tmp);
                return Err(err);
            }
        }
        log::debug!("replacing {} with {}", path.display(), tmp.display());
        if let Err(err) = fs::rename(&tmp, path) {
            remove_temp(&tmp);
            return Err(Error::io_at("Cannot rename temp archive file", path, err));
        }
        Ok(())
    }

    fn write_file(&mut self, archive: &mut dyn OutArchive, path: &Path) -> Result<()> {
        let mut out = FileOutStream::create(path)?;
        self.compress_out(archive, &mut out)
    }

    /// Writes the archive into `buffer`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `buffer` is not empty.
    pub fn compress_to_buffer(&mut self, buffer: &mut Vec<u8>) -> Result<()> {
        if !buffer.is_empty() {
            return Err(Error::invalid_argument(
                "cannot compress to buffer: buffer is not empty",
            ));
        }
        let mut archive = self.init_out_archive()?;
        let mut out = BufferOutStream::new(buffer);
        self.compress_out(archive.as_mut(), &mut out)
    }

    /// Writes the archive into a fixed-size slice and returns the number
    /// of bytes written.
    ///
    /// Fails if the archive does not fit.
    pub fn compress_to_slice(&mut self, buffer: &mut [u8]) -> Result<usize> {
        let mut archive = self.init_out_archive()?;
        let mut out = FixedBufferOutStream::new(buffer);
        self.compress_out(archive.as_mut(), &mut out)?;
        Ok(out.written())
    }

    /// Writes the archive into any seekable writer.
    pub fn compress_to_writer<W: Write + Seek + ?Sized>(&mut self, writer: &mut W) -> Result<()> {
        let mut archive = self.init_out_archive()?;
        let mut out = StdOutStream::new(writer);
        self.compress_out(archive.as_mut(), &mut out)
    }

    fn is_source(&self, path: &Path) -> bool {
        let Some(source) = self.input.as_ref().and_then(InputArchive::path) else {
            return false;
        };
        if source == path {
            return true;
        }
        match (fs::canonicalize(source), fs::canonicalize(path)) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }

    fn init_out_archive(&mut self) -> Result<Box<dyn OutArchive>> {
        let mut archive = match self.input.as_mut() {
            Some(input) => input.updatable()?,
            None => self
                .creator
                .engine()
                .create_out_archive(self.creator.format())?,
        };

        let props = self.creator.archive_properties()?;
        if !props.is_empty() {
            match archive.set_properties(&props) {
                EngineStatus::Ok => {}
                EngineStatus::NotImplemented => {
                    return Err(Error::UnsupportedOperation("set archive properties"));
                }
                status => {
                    return Err(Error::invalid_argument(format!(
                        "Cannot set properties of the archive ({})",
                        status
                    )));
                }
            }
        }
        Ok(archive)
    }

    fn compress_out(&mut self, archive: &mut dyn OutArchive, out: &mut dyn OutStream) -> Result<()> {
        self.resolve_overwrites();
        self.update_input_indices();
        self.failed.clear();

        log::debug!(
            "compressing {} items ({} new, {} deleted) as {}",
            self.items_count(),
            self.new_items.len(),
            self.deleted.len(),
            self.creator.format()
        );

        let status = {
            let mut callback = UpdateCallback::new(self);
            callback.begin()?;
            let status = archive.update_items(out, callback.items_count(), &mut callback);
            callback.finalize();
            status
        };

        match status {
            EngineStatus::Ok => {
                out.flush()?;
                if !self.failed.is_empty() {
                    log::warn!("{} items could not be compressed", self.failed.len());
                }
                Ok(())
            }
            EngineStatus::NotImplemented => Err(Error::UnsupportedOperation("update items")),
            status => Err(Error::CompressionFailed {
                status,
                failed_items: self.failed.clone(),
            }),
        }
    }
}

impl fmt::Debug for OutputArchive<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputArchive")
            .field("format", self.creator.format())
            .field("input", &self.input)
            .field("new_items", &self.new_items.len())
            .field("deleted", &self.deleted)
            .field("failed", &self.failed.len())
            .finish_non_exhaustive()
    }
}

fn into_io_error(err: Error) -> io::Error {
    match err {
        Error::Io(e) => e,
        Error::IoAt { source, .. } => source,
        other => io::Error::other(other),
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

fn remove_temp(path: &Path) {
    if let Err(err) = fs::remove_file(path) {
        if err.kind() != io::ErrorKind::NotFound {
            log::warn!("cannot remove temporary file {}: {}", path.display(), err);
        }
    }
}
