//! Progress reporting for archive updates.
//!
//! The engine reports progress through the update callback; every
//! notification is forwarded to the [`ProgressReporter`] installed on the
//! output archive. Reporters observe the operation only: nothing they do
//! changes the result.
//!
//! # Example
//!
//! ```rust,ignore
//! use sevenlink::progress::AtomicProgress;
//!
//! let progress = AtomicProgress::shared();
//! output.set_progress(progress.clone());
//! output.compress_to_path("out.7z")?;
//! println!("{} items, {} bytes", progress.items_started(), progress.processed_bytes());
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::password::Password;

/// Receives progress notifications while the engine writes an archive.
///
/// All methods have no-op defaults.
pub trait ProgressReporter {
    /// Called with the total number of bytes the engine will process.
    fn on_total(&mut self, total_bytes: u64) {
        let _ = total_bytes;
    }

    /// Called periodically with the bytes processed so far.
    fn on_progress(&mut self, bytes_processed: u64, total_bytes: u64) {
        let _ = (bytes_processed, total_bytes);
    }

    /// Called with the input and output byte counts of the compressor.
    fn on_ratio(&mut self, input_bytes: u64, output_bytes: u64) {
        let _ = (input_bytes, output_bytes);
    }

    /// Called when the engine starts reading the content of an item.
    fn on_item_start(&mut self, item_path: &str, size: u64) {
        let _ = (item_path, size);
    }

    /// Called when an item could not be processed.
    fn on_warning(&mut self, message: &str) {
        let _ = message;
    }

    /// Called when the engine asks for a password and none was configured.
    ///
    /// Return `None` to write the archive unencrypted.
    fn on_password_needed(&mut self) -> Option<Password> {
        None
    }
}

impl<P: ProgressReporter + ?Sized> ProgressReporter for Box<P> {
    fn on_total(&mut self, total_bytes: u64) {
        (**self).on_total(total_bytes)
    }

    fn on_progress(&mut self, bytes_processed: u64, total_bytes: u64) {
        (**self).on_progress(bytes_processed, total_bytes)
    }

    fn on_ratio(&mut self, input_bytes: u64, output_bytes: u64) {
        (**self).on_ratio(input_bytes, output_bytes)
    }

    fn on_item_start(&mut self, item_path: &str, size: u64) {
        (**self).on_item_start(item_path, size)
    }

    fn on_warning(&mut self, message: &str) {
        (**self).on_warning(message)
    }

    fn on_password_needed(&mut self) -> Option<Password> {
        (**self).on_password_needed()
    }
}

/// Lends a reporter to an output archive so its state can be read back
/// once the archive is dropped.
impl<P: ProgressReporter + ?Sized> ProgressReporter for &mut P {
    fn on_total(&mut self, total_bytes: u64) {
        (**self).on_total(total_bytes)
    }

    fn on_progress(&mut self, bytes_processed: u64, total_bytes: u64) {
        (**self).on_progress(bytes_processed, total_bytes)
    }

    fn on_ratio(&mut self, input_bytes: u64, output_bytes: u64) {
        (**self).on_ratio(input_bytes, output_bytes)
    }

    fn on_item_start(&mut self, item_path: &str, size: u64) {
        (**self).on_item_start(item_path, size)
    }

    fn on_warning(&mut self, message: &str) {
        (**self).on_warning(message)
    }

    fn on_password_needed(&mut self) -> Option<Password> {
        (**self).on_password_needed()
    }
}

/// Progress state with timing.
#[derive(Debug, Clone)]
pub struct ProgressState {
    /// Total bytes to process.
    pub total_bytes: u64,
    /// Bytes processed so far.
    pub processed_bytes: u64,
    /// Bytes written by the compressor.
    pub packed_bytes: u64,
    /// Path of the item currently being read.
    pub current_item: Option<String>,
    /// Number of items whose content was requested.
    pub items_started: usize,
    /// Processing start time.
    pub start_time: Instant,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            total_bytes: 0,
            processed_bytes: 0,
            packed_bytes: 0,
            current_item: None,
            items_started: 0,
            start_time: Instant::now(),
        }
    }
}

impl ProgressState {
    /// Creates a new progress state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the completion percentage (0.0 - 100.0).
    pub fn percentage(&self) -> f64 {
        if self.total_bytes == 0 {
            0.0
        } else {
            (self.processed_bytes as f64 / self.total_bytes as f64) * 100.0
        }
    }

    /// Returns the compression ratio (packed / unpacked).
    pub fn compression_ratio(&self) -> f64 {
        if self.processed_bytes == 0 {
            1.0
        } else {
            self.packed_bytes as f64 / self.processed_bytes as f64
        }
    }

    /// Returns elapsed time since start.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// A progress reporter that does nothing.
#[derive(Debug, Default, Clone)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {}

/// A progress reporter that collects statistics.
#[derive(Debug, Default, Clone)]
pub struct StatisticsProgress {
    /// The progress state.
    pub state: ProgressState,
    /// Warnings collected.
    pub warnings: Vec<String>,
}

impl StatisticsProgress {
    /// Creates a new statistics progress reporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the collected state.
    pub fn state(&self) -> &ProgressState {
        &self.state
    }
}

impl ProgressReporter for StatisticsProgress {
    fn on_total(&mut self, total_bytes: u64) {
        self.state.total_bytes = total_bytes;
    }

    fn on_progress(&mut self, bytes_processed: u64, _total_bytes: u64) {
        self.state.processed_bytes = bytes_processed;
    }

    fn on_ratio(&mut self, _input_bytes: u64, output_bytes: u64) {
        self.state.packed_bytes = output_bytes;
    }

    fn on_item_start(&mut self, item_path: &str, _size: u64) {
        self.state.current_item = Some(item_path.to_string());
        self.state.items_started += 1;
    }

    fn on_warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }
}

/// A progress reporter using atomics, readable through a shared handle
/// while the output archive owns the reporter.
#[derive(Debug)]
pub struct AtomicProgress {
    total_bytes: AtomicU64,
    processed_bytes: AtomicU64,
    packed_bytes: AtomicU64,
    items_started: AtomicU64,
    warnings: AtomicU64,
}

impl Default for AtomicProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl AtomicProgress {
    /// Creates a new atomic progress reporter.
    pub fn new() -> Self {
        Self {
            total_bytes: AtomicU64::new(0),
            processed_bytes: AtomicU64::new(0),
            packed_bytes: AtomicU64::new(0),
            items_started: AtomicU64::new(0),
            warnings: AtomicU64::new(0),
        }
    }

    /// Creates a shared atomic progress reporter.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Returns total bytes to process.
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes.load(Ordering::Relaxed)
    }

    /// Returns processed bytes.
    pub fn processed_bytes(&self) -> u64 {
        self.processed_bytes.load(Ordering::Relaxed)
    }

    /// Returns packed bytes.
    pub fn packed_bytes(&self) -> u64 {
        self.packed_bytes.load(Ordering::Relaxed)
    }

    /// Returns the number of items whose content was requested.
    pub fn items_started(&self) -> u64 {
        self.items_started.load(Ordering::Relaxed)
    }

    /// Returns the number of warnings reported.
    pub fn warnings(&self) -> u64 {
        self.warnings.load(Ordering::Relaxed)
    }

    /// Returns completion percentage (0.0 - 100.0).
    pub fn percentage(&self) -> f64 {
        let total = self.total_bytes();
        if total == 0 {
            0.0
        } else {
            (self.processed_bytes() as f64 / total as f64) * 100.0
        }
    }
}

impl ProgressReporter for Arc<AtomicProgress> {
    fn on_total(&mut self, total_bytes: u64) {
        self.total_bytes.store(total_bytes, Ordering::Relaxed);
    }

    fn on_progress(&mut self, bytes_processed: u64, _total_bytes: u64) {
        self.processed_bytes
            .store(bytes_processed, Ordering::Relaxed);
    }

    fn on_ratio(&mut self, _input_bytes: u64, output_bytes: u64) {
        self.packed_bytes.store(output_bytes, Ordering::Relaxed);
    }

    fn on_item_start(&mut self, _item_path: &str, _size: u64) {
        self.items_started.fetch_add(1, Ordering::Relaxed);
    }

    fn on_warning(&mut self, _message: &str) {
        self.warnings.fetch_add(1, Ordering::Relaxed);
    }
}

/// A progress reporter that calls a closure with `(processed, total)`.
pub struct ClosureProgress<F> {
    callback: F,
}

impl<F> ClosureProgress<F>
where
    F: FnMut(u64, u64),
{
    /// Creates a progress reporter from a closure.
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgress<F>
where
    F: FnMut(u64, u64),
{
    fn on_progress(&mut self, bytes_processed: u64, total_bytes: u64) {
        (self.callback)(bytes_processed, total_bytes)
    }
}

/// Creates a closure-based progress reporter.
pub fn progress_fn<F>(f: F) -> ClosureProgress<F>
where
    F: FnMut(u64, u64),
{
    ClosureProgress::new(f)
}
