//! Error types for archive composition and update operations.
//!
//! This module provides the [`Error`] enum, which represents every failure
//! mode of the composition layer, together with the [`FailedItem`] log
//! entries collected while the engine is running and the [`Result<T>`] alias.
//!
//! # Error Handling
//!
//! Only a few conditions are reported per item: a stream that cannot be
//! opened while the engine is pulling data does not abort the operation.
//! Such failures are collected and attached to
//! [`Error::CompressionFailed`] if the engine gives up:
//!
//! ```rust,ignore
//! use sevenlink::Error;
//!
//! match output.compress_to_path("backup.7z") {
//!     Ok(()) => {}
//!     Err(Error::CompressionFailed { status, failed_items }) => {
//!         eprintln!("engine failed with {status}");
//!         for item in &failed_items {
//!             eprintln!("  {item}");
//!         }
//!     }
//!     Err(e) => eprintln!("{e}"),
//! }
//! ```

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use crate::engine::{EngineStatus, OperationResult};

/// Why a single item could not be processed.
#[derive(Debug)]
#[non_exhaustive]
pub enum FailureReason {
    /// The item's byte stream could not be opened.
    Open(io::Error),
    /// The engine reported a non-OK outcome after processing the item.
    Operation(OperationResult),
}

impl Clone for FailureReason {
    fn clone(&self) -> Self {
        match self {
            Self::Open(e) => Self::Open(match e.raw_os_error() {
                Some(code) => io::Error::from_raw_os_error(code),
                None => io::Error::new(e.kind(), e.to_string()),
            }),
            Self::Operation(result) => Self::Operation(*result),
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open(e) => write!(f, "cannot open stream: {}", e),
            Self::Operation(result) => write!(f, "engine reported {}", result),
        }
    }
}

/// An entry of the failed-item log.
///
/// The log is filled while the engine drives the update and is surfaced to
/// the caller only after the engine returns.
#[derive(Debug, Clone)]
pub struct FailedItem {
    /// Filesystem path of the item, or its in-archive path for items
    /// that do not live on disk.
    pub path: PathBuf,
    /// What went wrong.
    pub reason: FailureReason,
}

impl FailedItem {
    /// Creates a log entry for an item whose stream could not be opened.
    pub fn open(path: impl Into<PathBuf>, error: io::Error) -> Self {
        Self {
            path: path.into(),
            reason: FailureReason::Open(error),
        }
    }

    /// Creates a log entry for a non-OK per-item operation result.
    pub fn operation(path: impl Into<PathBuf>, result: OperationResult) -> Self {
        Self {
            path: path.into(),
            reason: FailureReason::Operation(result),
        }
    }

    /// Returns the OS error code, if the failure came from the OS.
    pub fn raw_os_error(&self) -> Option<i32> {
        match &self.reason {
            FailureReason::Open(e) => e.raw_os_error(),
            FailureReason::Operation(_) => None,
        }
    }
}

impl fmt::Display for FailedItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.reason)
    }
}

/// Helper struct for formatting CompressionFailed error messages.
struct CompressionFailedDisplay<'a> {
    status: EngineStatus,
    failed_items: &'a [FailedItem],
}

impl fmt::Display for CompressionFailedDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error compressing files ({})", self.status)?;
        match self.failed_items.len() {
            0 => Ok(()),
            1 => write!(f, ": 1 item failed"),
            n => write!(f, ": {} items failed", n),
        }
    }
}

/// The main error type for composition and update operations.
///
/// | Category | Variants |
/// |----------|----------|
/// | Argument | [`InvalidArgument`][Self::InvalidArgument], [`InvalidArchivePath`][Self::InvalidArchivePath], [`ItemNotFound`][Self::ItemNotFound] |
/// | I/O | [`Io`][Self::Io], [`IoAt`][Self::IoAt] |
/// | Engine | [`UnsupportedOperation`][Self::UnsupportedOperation], [`CompressionFailed`][Self::CompressionFailed], [`OpenFailed`][Self::OpenFailed] |
/// | Per-item | [`ItemUnavailable`][Self::ItemUnavailable] |
/// | Protocol | [`ProtocolViolation`][Self::ProtocolViolation] |
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error without additional context.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An I/O error tied to a filesystem path.
    ///
    /// Returned when a source archive cannot be opened, or when creating,
    /// renaming or removing the temporary file of an in-place update fails.
    #[error("{context} '{}': {source}", path.display())]
    IoAt {
        /// What the crate was doing.
        context: &'static str,
        /// The path involved.
        path: PathBuf,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },

    /// An argument or configuration is not acceptable.
    ///
    /// Examples: updating with a creator whose update mode is `None`,
    /// updating a format without multi-file support, compressing into a
    /// non-empty buffer, or adding an unnamed buffer item.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An in-archive path failed validation.
    #[error("Invalid archive path: {0}")]
    InvalidArchivePath(String),

    /// No item with the given path exists in the source archive.
    #[error("Item not found: {path}")]
    ItemNotFound {
        /// The in-archive path that was looked up.
        path: String,
    },

    /// The engine does not implement the requested entry point.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(&'static str),

    /// The engine returned a non-success status from its update call.
    ///
    /// Carries every per-item failure collected while the engine was running.
    #[error("{}", CompressionFailedDisplay { status: *status, failed_items: failed_items.as_slice() })]
    CompressionFailed {
        /// The status returned by the engine.
        status: EngineStatus,
        /// Items that could not be processed.
        failed_items: Vec<FailedItem>,
    },

    /// The engine could not open an existing archive.
    #[error("Cannot open archive: {status}")]
    OpenFailed {
        /// The status returned by the engine.
        status: EngineStatus,
    },

    /// The stream of one item could not be provided to the engine.
    ///
    /// This is returned to the engine only; the caller sees it through the
    /// failed-item log.
    #[error("Item {index} is unavailable: {}", path.display())]
    ItemUnavailable {
        /// Output index requested by the engine.
        index: u32,
        /// Path of the item.
        path: PathBuf,
    },

    /// The engine called the update callback outside of its driving window.
    #[error("Protocol violation: {operation} called while callback is {state}")]
    ProtocolViolation {
        /// The callback operation that was invoked.
        operation: &'static str,
        /// The callback state at the time of the call.
        state: &'static str,
    },
}

impl Error {
    /// Creates an [`Error::IoAt`] for the given path.
    pub fn io_at(context: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::IoAt {
            context,
            path: path.into(),
            source,
        }
    }

    /// Creates an [`Error::InvalidArgument`].
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }

    /// Returns true for I/O failures, with or without a path.
    pub fn is_io(&self) -> bool {
        matches!(self, Error::Io(_) | Error::IoAt { .. })
    }

    /// Returns true if the engine itself reported the failure.
    pub fn is_engine_failure(&self) -> bool {
        matches!(
            self,
            Error::CompressionFailed { .. }
                | Error::OpenFailed { .. }
                | Error::UnsupportedOperation(_)
        )
    }

    /// Returns the OS or engine error code, where one applies.
    pub fn code(&self) -> Option<i32> {
        match self {
            Error::Io(e) => e.raw_os_error(),
            Error::IoAt { source, .. } => source.raw_os_error(),
            Error::CompressionFailed { status, .. } => Some(status.code()),
            Error::OpenFailed { status } => Some(status.code()),
            Error::UnsupportedOperation(_) => Some(EngineStatus::NotImplemented.code()),
            _ => None,
        }
    }

    /// Returns the path this error refers to, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Error::IoAt { path, .. } => Some(path),
            Error::ItemUnavailable { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Returns the failed-item log attached to this error.
    pub fn failed_items(&self) -> &[FailedItem] {
        match self {
            Error::CompressionFailed { failed_items, .. } => failed_items,
            _ => &[],
        }
    }
}

/// A specialized Result type for composition operations.
pub type Result<T> = std::result::Result<T, Error>;
