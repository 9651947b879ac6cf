//! Composition of an output archive and the engine-facing callback.
//!
//! [`OutputArchive`] collects what the new archive should contain: items
//! kept from a source archive, deletions, and new items. When it is
//! compressed, an [`UpdateCallback`] is bound to it and handed to the
//! engine, which pulls item metadata and data by output index.
//!
//! Per-item failures while the engine runs do not abort the update. They
//! are collected in a failed-item log, readable through
//! [`OutputArchive::failed_items`] and attached to
//! [`Error::CompressionFailed`](crate::Error::CompressionFailed) when the
//! engine gives up.

mod callback;
mod index;
mod output;

pub use callback::{CallbackState, UpdateCallback};
pub use index::{IndexMapping, InputIndex};
pub use output::OutputArchive;
