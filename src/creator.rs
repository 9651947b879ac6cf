//! Configuration shared by every output archive.

use std::fmt;
use std::sync::Arc;

use crate::engine::Engine;
use crate::format::{ArchiveFormat, FormatFeatures};
use crate::password::Password;
use crate::property::PropValue;
use crate::{Error, Result};

/// How an output archive treats an existing archive at its destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateMode {
    /// Existing archives cannot be updated.
    #[default]
    None,
    /// New items are appended; existing items are all kept.
    Append,
    /// New items replace existing items with the same path.
    Overwrite,
}

/// Engine handle plus compression settings for creating archives.
///
/// # Example
///
/// ```rust,ignore
/// use sevenlink::{ArchiveCreator, ArchiveFormat, UpdateMode};
///
/// let creator = ArchiveCreator::new(engine, ArchiveFormat::SEVEN_ZIP)
///     .update_mode(UpdateMode::Overwrite)
///     .level(9)?
///     .solid(true)
///     .password("secret");
/// ```
#[derive(Clone)]
pub struct ArchiveCreator {
    engine: Arc<dyn Engine>,
    format: ArchiveFormat,
    update_mode: UpdateMode,
    level: Option<u32>,
    solid: Option<bool>,
    threads: u32,
    password: Option<Password>,
    encrypt_header: bool,
    volume_size: u64,
    extra: Vec<(String, PropValue)>,
}

impl ArchiveCreator {
    /// Creates a creator for `format` backed by `engine`.
    pub fn new(engine: Arc<dyn Engine>, format: ArchiveFormat) -> Self {
        Self {
            engine,
            format,
            update_mode: UpdateMode::None,
            level: None,
            solid: None,
            threads: 0,
            password: None,
            encrypt_header: false,
            volume_size: 0,
            extra: Vec::new(),
        }
    }

    /// Sets the update mode.
    pub fn update_mode(mut self, mode: UpdateMode) -> Self {
        self.update_mode = mode;
        self
    }

    /// Sets the compression level (0-9).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for levels above 9.
    pub fn level(mut self, level: u32) -> Result<Self> {
        if level > 9 {
            return Err(Error::invalid_argument(format!(
                "compression level {} is out of range (0-9)",
                level
            )));
        }
        self.level = Some(level);
        Ok(self)
    }

    /// Sets the compression level, clamping values above 9.
    pub fn level_clamped(mut self, level: u32) -> Self {
        self.level = Some(level.min(9));
        self
    }

    /// Enables or disables solid compression.
    pub fn solid(mut self, solid: bool) -> Self {
        self.solid = Some(solid);
        self
    }

    /// Sets the number of engine threads; 0 lets the engine decide.
    pub fn threads(mut self, threads: u32) -> Self {
        self.threads = threads;
        self
    }

    /// Sets the encryption password.
    pub fn password(mut self, password: impl Into<Password>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Enables header encryption (hides item names). Needs a password.
    pub fn encrypt_header(mut self, enabled: bool) -> Self {
        self.encrypt_header = enabled;
        self
    }

    /// Splits the archive into volumes of `size` bytes; 0 disables splitting.
    pub fn volume_size(mut self, size: u64) -> Self {
        self.volume_size = size;
        self
    }

    /// Adds a raw engine property, passed through unchanged.
    pub fn property(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.extra.push((name.into(), value.into()));
        self
    }

    /// The engine.
    pub fn engine(&self) -> &Arc<dyn Engine> {
        &self.engine
    }

    /// The output format.
    pub fn format(&self) -> &ArchiveFormat {
        &self.format
    }

    /// The update mode.
    pub fn mode(&self) -> UpdateMode {
        self.update_mode
    }

    /// The configured compression level, if any.
    pub fn compression_level(&self) -> Option<u32> {
        self.level
    }

    /// The configured password, if any.
    pub fn configured_password(&self) -> Option<&Password> {
        self.password.as_ref()
    }

    /// Whether header encryption was requested.
    pub fn is_header_encrypted(&self) -> bool {
        self.encrypt_header
    }

    /// The volume size, 0 when splitting is disabled.
    pub fn split_size(&self) -> u64 {
        self.volume_size
    }

    /// Renders the settings as engine properties.
    ///
    /// Level, solid mode and header encryption are emitted only for formats
    /// that support them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when a password is set on a format
    /// without encryption, or header encryption is requested without a
    /// password or on a format that cannot encrypt headers.
    pub fn archive_properties(&self) -> Result<Vec<(String, PropValue)>> {
        let format = &self.format;
        if self.password.is_some() && !format.has_feature(FormatFeatures::ENCRYPTION) {
            return Err(Error::invalid_argument(format!(
                "format {} does not support encryption",
                format
            )));
        }
        if self.encrypt_header {
            if !format.has_feature(FormatFeatures::HEADER_ENCRYPTION) {
                return Err(Error::invalid_argument(format!(
                    "format {} does not support header encryption",
                    format
                )));
            }
            if self.password.is_none() {
                return Err(Error::invalid_argument(
                    "header encryption requires a password",
                ));
            }
        }

        let mut props = Vec::new();
        if format.has_feature(FormatFeatures::COMPRESSION_LEVEL) {
            if let Some(level) = self.level {
                props.push(("x".to_string(), PropValue::U32(level)));
            }
        }
        if format.has_feature(FormatFeatures::SOLID_ARCHIVE) {
            if let Some(solid) = self.solid {
                props.push(("s".to_string(), PropValue::Bool(solid)));
            }
        }
        if self.threads > 0 {
            props.push(("mt".to_string(), PropValue::U32(self.threads)));
        }
        if self.encrypt_header {
            props.push(("he".to_string(), PropValue::Bool(true)));
        }
        props.extend(self.extra.iter().cloned());
        Ok(props)
    }
}

impl fmt::Debug for ArchiveCreator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveCreator")
            .field("format", &self.format)
            .field("update_mode", &self.update_mode)
            .field("level", &self.level)
            .field("solid", &self.solid)
            .field("threads", &self.threads)
            .field("password", &self.password)
            .field("encrypt_header", &self.encrypt_header)
            .field("volume_size", &self.volume_size)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{InArchive, OutArchive, ReadSeek};

    struct NullEngine;

    impl Engine for NullEngine {
        fn create_out_archive(&self, _format: &ArchiveFormat) -> Result<Box<dyn OutArchive>> {
            Err(Error::UnsupportedOperation("create"))
        }

        fn open_archive(
            &self,
            _format: &ArchiveFormat,
            _stream: Box<dyn ReadSeek>,
        ) -> Result<Box<dyn InArchive>> {
            Err(Error::UnsupportedOperation("open"))
        }
    }

    fn creator(format: ArchiveFormat) -> ArchiveCreator {
        ArchiveCreator::new(Arc::new(NullEngine), format)
    }

    #[test]
    fn test_level_validation() {
        assert!(creator(ArchiveFormat::SEVEN_ZIP).level(9).is_ok());
        let err = creator(ArchiveFormat::SEVEN_ZIP).level(10).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert_eq!(
            creator(ArchiveFormat::SEVEN_ZIP)
                .level_clamped(42)
                .compression_level(),
            Some(9)
        );
    }

    #[test]
    fn test_default_has_no_properties() {
        let c = creator(ArchiveFormat::SEVEN_ZIP);
        assert_eq!(c.mode(), UpdateMode::None);
        assert!(c.archive_properties().unwrap().is_empty());
    }

    #[test]
    fn test_properties_rendering() {
        let c = creator(ArchiveFormat::SEVEN_ZIP)
            .level(5)
            .unwrap()
            .solid(true)
            .threads(4)
            .password("pw")
            .encrypt_header(true)
            .property("qs", true);
        let props = c.archive_properties().unwrap();
        let names: Vec<&str> = props.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["x", "s", "mt", "he", "qs"]);
        assert_eq!(props[0].1, PropValue::U32(5));
    }

    #[test]
    fn test_unsupported_settings_skipped() {
        let c = creator(ArchiveFormat::TAR).level(5).unwrap().solid(true);
        assert!(c.archive_properties().unwrap().is_empty());
    }

    #[test]
    fn test_encryption_checks() {
        let err = creator(ArchiveFormat::TAR)
            .password("pw")
            .archive_properties()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));

        let err = creator(ArchiveFormat::SEVEN_ZIP)
            .encrypt_header(true)
            .archive_properties()
            .unwrap_err();
        assert!(err.to_string().contains("requires a password"));

        let err = creator(ArchiveFormat::ZIP)
            .password("pw")
            .encrypt_header(true)
            .archive_properties()
            .unwrap_err();
        assert!(err.to_string().contains("header encryption"));
    }

    #[test]
    fn test_debug_hides_password() {
        let c = creator(ArchiveFormat::SEVEN_ZIP).password("topsecret");
        assert!(!format!("{:?}", c).contains("topsecret"));
    }
}
