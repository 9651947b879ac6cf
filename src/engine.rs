//! The boundary between this crate and an external archiving engine.
//!
//! The engine owns every compression algorithm and archive format. This
//! crate only describes *what* the output archive should contain and
//! answers the engine's pull requests through the callback traits defined
//! here:
//!
//! - [`Engine`] creates fresh [`OutArchive`] objects and opens existing
//!   archives as [`InArchive`] handles.
//! - [`OutArchive::update_items`] drives an update, calling back into an
//!   [`UpdateCallbacks`] implementation for item metadata and data.
//! - [`EngineStatus`] and [`OperationResult`] are the numeric outcomes the
//!   engine reports, with codes compatible with the 7-Zip COM ABI.
//!
//! Engine adapters are expected to live outside this crate. A minimal engine
//! only needs to implement the three traits:
//!
//! ```rust,ignore
//! struct MyEngine;
//!
//! impl Engine for MyEngine {
//!     fn create_out_archive(&self, format: &ArchiveFormat) -> Result<Box<dyn OutArchive>> {
//!         Ok(Box::new(MyWriter::new(format)))
//!     }
//!
//!     fn open_archive(
//!         &self,
//!         format: &ArchiveFormat,
//!         stream: Box<dyn ReadSeek>,
//!     ) -> Result<Box<dyn InArchive>> {
//!         Ok(Box::new(MyReader::parse(format, stream)?))
//!     }
//! }
//! ```

use std::fmt;
use std::io::{self, Read, Seek, Write};

use crate::Result;
use crate::format::ArchiveFormat;
use crate::password::Password;
use crate::property::{PropValue, PropertyId};

/// A readable and seekable byte source.
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek + ?Sized> ReadSeek for T {}

/// A destination stream the engine writes the archive into.
pub trait OutStream: Write + Seek {
    /// Truncates or extends the destination to `size` bytes.
    fn set_size(&mut self, size: u64) -> io::Result<()>;
}

const S_OK: i32 = 0;
const E_NOTIMPL: i32 = 0x8000_4001_u32 as i32;
const E_ABORT: i32 = 0x8000_4004_u32 as i32;
const E_FAIL: i32 = 0x8000_4005_u32 as i32;
const E_INVALIDARG: i32 = 0x8007_0057_u32 as i32;

/// Status returned by engine entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineStatus {
    /// The call succeeded.
    Ok,
    /// The engine does not implement the requested operation.
    NotImplemented,
    /// The operation was aborted.
    Aborted,
    /// The engine rejected an argument.
    InvalidArgument,
    /// Any other failure, with its raw code.
    Failed(i32),
}

impl EngineStatus {
    /// Generic failure.
    pub const FAIL: EngineStatus = EngineStatus::Failed(E_FAIL);

    /// Returns the raw status code.
    pub fn code(self) -> i32 {
        match self {
            Self::Ok => S_OK,
            Self::NotImplemented => E_NOTIMPL,
            Self::Aborted => E_ABORT,
            Self::InvalidArgument => E_INVALIDARG,
            Self::Failed(code) => code,
        }
    }

    /// Maps a raw status code to a status.
    pub fn from_code(code: i32) -> Self {
        match code {
            S_OK => Self::Ok,
            E_NOTIMPL => Self::NotImplemented,
            E_ABORT => Self::Aborted,
            E_INVALIDARG => Self::InvalidArgument,
            other => Self::Failed(other),
        }
    }

    /// Returns true for [`EngineStatus::Ok`].
    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "S_OK"),
            Self::NotImplemented => write!(f, "E_NOTIMPL"),
            Self::Aborted => write!(f, "E_ABORT"),
            Self::InvalidArgument => write!(f, "E_INVALIDARG"),
            Self::Failed(E_FAIL) => write!(f, "E_FAIL"),
            Self::Failed(code) => write!(f, "0x{:08X}", *code as u32),
        }
    }
}

/// Per-item outcome reported by the engine after processing an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationResult {
    /// The item was processed.
    Ok,
    /// The compression method is not supported.
    UnsupportedMethod,
    /// The item data is corrupt.
    DataError,
    /// Checksum mismatch.
    CrcError,
    /// The item data is not available.
    Unavailable,
    /// The data ended unexpectedly.
    UnexpectedEnd,
    /// There is data after the end of the payload.
    DataAfterEnd,
    /// The input is not an archive.
    IsNotArchive,
    /// The archive headers are corrupt.
    HeadersError,
    /// Wrong password.
    WrongPassword,
}

impl OperationResult {
    /// Returns the raw result code.
    pub fn code(self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::UnsupportedMethod => 1,
            Self::DataError => 2,
            Self::CrcError => 3,
            Self::Unavailable => 4,
            Self::UnexpectedEnd => 5,
            Self::DataAfterEnd => 6,
            Self::IsNotArchive => 7,
            Self::HeadersError => 8,
            Self::WrongPassword => 9,
        }
    }

    /// Maps a raw result code, returning `None` for unknown codes.
    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => Self::Ok,
            1 => Self::UnsupportedMethod,
            2 => Self::DataError,
            3 => Self::CrcError,
            4 => Self::Unavailable,
            5 => Self::UnexpectedEnd,
            6 => Self::DataAfterEnd,
            7 => Self::IsNotArchive,
            8 => Self::HeadersError,
            9 => Self::WrongPassword,
            _ => return None,
        })
    }

    /// Returns true for [`OperationResult::Ok`].
    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for OperationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Ok => "ok",
            Self::UnsupportedMethod => "unsupported method",
            Self::DataError => "data error",
            Self::CrcError => "CRC error",
            Self::Unavailable => "unavailable data",
            Self::UnexpectedEnd => "unexpected end of data",
            Self::DataAfterEnd => "data after end",
            Self::IsNotArchive => "not an archive",
            Self::HeadersError => "headers error",
            Self::WrongPassword => "wrong password",
        };
        f.write_str(text)
    }
}

/// What the engine must do for one output index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateItemInfo {
    /// The item content must be read through the callback.
    pub new_data: bool,
    /// The item properties must be read through the callback.
    pub new_properties: bool,
    /// The index of the item in the source archive, if it comes from there.
    pub index_in_archive: Option<u32>,
}

impl UpdateItemInfo {
    /// Returns true if the engine can copy the item from the source archive
    /// without reading new data.
    pub fn is_copy_through(&self) -> bool {
        self.index_in_archive.is_some() && !self.new_data
    }
}

/// Item metadata and data requests issued by the engine during an update.
pub trait ArchiveUpdateCallback {
    /// Returns how the item at `index` must be produced.
    fn get_update_item_info(&mut self, index: u32) -> Result<UpdateItemInfo>;

    /// Returns a property of the output item at `index`.
    ///
    /// Missing values are [`PropValue::Empty`].
    fn get_property(&mut self, index: u32, prop: PropertyId) -> Result<PropValue>;

    /// Opens the content of the output item at `index`.
    ///
    /// Returns `None` for items without content (directories, copied items).
    fn get_stream(&mut self, index: u32) -> Result<Option<Box<dyn ReadSeek>>>;

    /// Returns the size of the volume `index`, if the engine should split.
    fn get_volume_size(&mut self, index: u32) -> Result<Option<u64>>;

    /// Returns the stream for volume `index`.
    fn get_volume_stream(&mut self, index: u32) -> Result<Box<dyn OutStream>>;

    /// Reports the outcome for the item whose stream was last handed out.
    fn set_operation_result(&mut self, result: OperationResult) -> Result<()>;
}

/// Progress notifications issued by the engine.
pub trait CompressProgress {
    /// Total number of bytes to process.
    fn set_total(&mut self, total: u64) -> Result<()>;

    /// Bytes processed so far.
    fn set_completed(&mut self, completed: u64) -> Result<()>;

    /// Input and output byte counts of the running compression.
    fn set_ratio_info(&mut self, in_size: u64, out_size: u64) -> Result<()>;
}

/// Password requests issued by the engine.
pub trait CryptoPassword {
    /// Returns the encryption password, or `None` to write unencrypted.
    fn crypto_get_text_password2(&mut self) -> Result<Option<Password>>;
}

/// Everything an engine may ask while updating an archive.
pub trait UpdateCallbacks: ArchiveUpdateCallback + CompressProgress + CryptoPassword {}

impl<T: ArchiveUpdateCallback + CompressProgress + CryptoPassword + ?Sized> UpdateCallbacks for T {}

/// An external archiving engine.
pub trait Engine: Send + Sync {
    /// Creates an archive writer for a new archive of the given format.
    fn create_out_archive(&self, format: &ArchiveFormat) -> Result<Box<dyn OutArchive>>;

    /// Opens an existing archive from a byte source.
    fn open_archive(
        &self,
        format: &ArchiveFormat,
        stream: Box<dyn ReadSeek>,
    ) -> Result<Box<dyn InArchive>>;
}

/// An archive opened by the engine.
pub trait InArchive {
    /// Number of items in the archive.
    fn items_count(&self) -> u32;

    /// A property of the item at `index`.
    fn item_property(&self, index: u32, prop: PropertyId) -> PropValue;

    /// A property of the archive itself.
    fn archive_property(&self, prop: PropertyId) -> PropValue;

    /// Returns a writer that produces an updated copy of this archive.
    fn updatable(&mut self) -> Result<Box<dyn OutArchive>>;

    /// Releases the underlying byte source.
    fn close(&mut self) -> Result<()>;
}

/// An archive writer.
pub trait OutArchive {
    /// Applies archive-level properties such as the compression level.
    fn set_properties(&mut self, props: &[(String, PropValue)]) -> EngineStatus;

    /// Writes `count` output items into `out`, pulling everything it needs
    /// from `callback`.
    fn update_items(
        &mut self,
        out: &mut dyn OutStream,
        count: u32,
        callback: &mut dyn UpdateCallbacks,
    ) -> EngineStatus;
}
