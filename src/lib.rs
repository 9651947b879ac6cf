//! # sevenlink
//!
//! Compose archive creation and update jobs for an external archiving engine.
//!
//! The engine (a 7-Zip compatible library behind the [`engine`] traits) owns
//! every compression method and container format. This crate decides *what*
//! goes into the output archive, answers the engine's pull requests while it
//! writes, and manages the destination: files, memory buffers, caller
//! streams, volume sets, and in-place replacement of an existing archive.
//!
//! ## Quick Start
//!
//! ### Creating an Archive
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sevenlink::{ArchiveCreator, ArchiveFormat, OutputArchive, Result};
//!
//! fn main() -> Result<()> {
//!     let creator = ArchiveCreator::new(Arc::new(MyEngine), ArchiveFormat::SEVEN_ZIP)
//!         .level(9)?
//!         .solid(true);
//!
//!     let mut output = OutputArchive::new(&creator);
//!     output.add_directory("./docs")?;
//!     output.add_buffer(b"Hello, World!".to_vec(), "hello.txt")?;
//!     output.compress_to_path("docs.7z")?;
//!     Ok(())
//! }
//! ```
//!
//! ### Updating an Archive in Place
//!
//! ```rust,ignore
//! use sevenlink::{ArchiveCreator, ArchiveFormat, OutputArchive, UpdateMode};
//!
//! let creator = ArchiveCreator::new(engine, ArchiveFormat::SEVEN_ZIP)
//!     .update_mode(UpdateMode::Overwrite);
//!
//! let mut output = OutputArchive::with_path(&creator, "docs.7z")?;
//! output.add_file("README.md", Some("docs/README.md"))?;
//! output.delete_path("docs/old.txt")?;
//! // writes docs.7z.tmp, then renames it over docs.7z
//! output.compress_to_path("docs.7z")?;
//! ```
//!
//! ### Writing to Memory
//!
//! ```rust,ignore
//! let mut buffer = Vec::new();
//! output.compress_to_buffer(&mut buffer)?;
//! ```
//!
//! ## Output Index Space
//!
//! The engine addresses output items by index. Items kept from the source
//! archive come first, in source order, followed by the new items in the
//! order they were added. See [`update::IndexMapping`].
//!
//! ## Error Handling
//!
//! All operations return [`Result<T>`]. Items whose content cannot be read
//! while the engine runs do not abort the job; they are recorded in a
//! failed-item log:
//!
//! ```rust,ignore
//! use sevenlink::Error;
//!
//! match output.compress_to_path("out.7z") {
//!     Ok(()) => {
//!         for failed in output.failed_items() {
//!             eprintln!("skipped {}", failed);
//!         }
//!     }
//!     Err(Error::CompressionFailed { status, failed_items }) => {
//!         eprintln!("engine failed with {} ({} items)", status, failed_items.len());
//!     }
//!     Err(e) => eprintln!("{}", e),
//! }
//! ```
//!
//! ## Logging
//!
//! The crate logs through the [`log`] facade: `debug` for job summaries,
//! `warn` for skipped items and cleanup problems, `trace` for per-item
//! decisions. Install any `log` backend to see them.
//!
//! ## Minimum Supported Rust Version (MSRV)
//!
//! This crate requires **Rust 1.85** or later.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod archive_path;
pub mod creator;
pub mod engine;
pub mod error;
pub mod format;
pub mod input_archive;
pub mod item;
pub mod password;
pub mod progress;
pub mod property;
pub mod stream;
pub mod timestamp;
pub mod update;
pub mod volume;

pub use archive_path::ArchivePath;
pub use creator::{ArchiveCreator, UpdateMode};
pub use engine::{
    ArchiveUpdateCallback, CompressProgress, CryptoPassword, Engine, EngineStatus, InArchive,
    OperationResult, OutArchive, OutStream, ReadSeek, UpdateCallbacks, UpdateItemInfo,
};
pub use error::{Error, FailedItem, FailureReason, Result};
pub use format::{ArchiveFormat, FormatFeatures};
pub use input_archive::InputArchive;
pub use item::{BufferItem, FsItem, GenericItem, ItemIndexer, StreamItem};
pub use password::Password;
pub use progress::{
    AtomicProgress, ClosureProgress, NoProgress, ProgressReporter, ProgressState,
    StatisticsProgress, progress_fn,
};
pub use property::{PropValue, PropertyId};
pub use timestamp::Timestamp;
pub use update::{CallbackState, InputIndex, OutputArchive, UpdateCallback};
pub use volume::{MultiVolumeOutStream, VolumeConfig};
