//! Multi-volume destinations.
//!
//! When the creator has a non-zero volume size, `compress_to_path` writes a
//! volume set instead of a single file. The engine sees one seekable stream;
//! [`MultiVolumeOutStream`] maps every byte offset to a volume file.
//!
//! # Volume Naming Convention
//!
//! - `archive.7z.001` - First volume
//! - `archive.7z.002` - Second volume
//! - etc.
//!
//! The volume number is always at least 3 digits, padded with zeros.

mod config;
mod writer;

pub use config::VolumeConfig;
pub use writer::MultiVolumeOutStream;
