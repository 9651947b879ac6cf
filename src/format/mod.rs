//! Archive format descriptors and capability flags.
//!
//! Formats are immutable values: every [`ArchiveFormat`] constant describes
//! what the engine can do with the format, and the composer consults these
//! flags before asking the engine for anything.

use std::fmt;
use std::ops::BitOr;

/// Capabilities of an archive format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FormatFeatures(u32);

impl FormatFeatures {
    /// No capabilities.
    pub const NONE: FormatFeatures = FormatFeatures(0);
    /// The archive can hold more than one item.
    pub const MULTIPLE_FILES: FormatFeatures = FormatFeatures(1 << 0);
    /// Items can be compressed as a single solid block.
    pub const SOLID_ARCHIVE: FormatFeatures = FormatFeatures(1 << 1);
    /// The compression level can be chosen.
    pub const COMPRESSION_LEVEL: FormatFeatures = FormatFeatures(1 << 2);
    /// Item data can be encrypted.
    pub const ENCRYPTION: FormatFeatures = FormatFeatures(1 << 3);
    /// Archive headers can be encrypted.
    pub const HEADER_ENCRYPTION: FormatFeatures = FormatFeatures(1 << 4);
    /// The format can be produced from a non-seekable input stream.
    pub const INPUT_STREAM: FormatFeatures = FormatFeatures(1 << 5);
    /// More than one compression method is available.
    pub const MULTIPLE_METHODS: FormatFeatures = FormatFeatures(1 << 6);

    /// Returns true if every flag in `other` is set.
    #[inline]
    pub const fn contains(self, other: FormatFeatures) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the raw bits.
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    const fn union(self, other: FormatFeatures) -> FormatFeatures {
        FormatFeatures(self.0 | other.0)
    }
}

impl BitOr for FormatFeatures {
    type Output = FormatFeatures;

    fn bitor(self, rhs: FormatFeatures) -> FormatFeatures {
        self.union(rhs)
    }
}

/// An archive format known to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArchiveFormat {
    name: &'static str,
    extension: &'static str,
    id: u8,
    features: FormatFeatures,
}

impl ArchiveFormat {
    /// 7z.
    pub const SEVEN_ZIP: ArchiveFormat = ArchiveFormat::new(
        "7z",
        "7z",
        0x07,
        FormatFeatures::MULTIPLE_FILES
            .union(FormatFeatures::SOLID_ARCHIVE)
            .union(FormatFeatures::COMPRESSION_LEVEL)
            .union(FormatFeatures::ENCRYPTION)
            .union(FormatFeatures::HEADER_ENCRYPTION)
            .union(FormatFeatures::INPUT_STREAM)
            .union(FormatFeatures::MULTIPLE_METHODS),
    );

    /// Zip.
    pub const ZIP: ArchiveFormat = ArchiveFormat::new(
        "zip",
        "zip",
        0x01,
        FormatFeatures::MULTIPLE_FILES
            .union(FormatFeatures::COMPRESSION_LEVEL)
            .union(FormatFeatures::ENCRYPTION)
            .union(FormatFeatures::INPUT_STREAM)
            .union(FormatFeatures::MULTIPLE_METHODS),
    );

    /// Tar.
    pub const TAR: ArchiveFormat = ArchiveFormat::new(
        "tar",
        "tar",
        0xEE,
        FormatFeatures::MULTIPLE_FILES.union(FormatFeatures::INPUT_STREAM),
    );

    /// Windows Imaging Format.
    pub const WIM: ArchiveFormat = ArchiveFormat::new(
        "wim",
        "wim",
        0xE6,
        FormatFeatures::MULTIPLE_FILES,
    );

    /// Gzip.
    pub const GZIP: ArchiveFormat = ArchiveFormat::new(
        "gzip",
        "gz",
        0xEF,
        FormatFeatures::COMPRESSION_LEVEL.union(FormatFeatures::INPUT_STREAM),
    );

    /// Bzip2.
    pub const BZIP2: ArchiveFormat = ArchiveFormat::new(
        "bzip2",
        "bz2",
        0x02,
        FormatFeatures::COMPRESSION_LEVEL.union(FormatFeatures::INPUT_STREAM),
    );

    /// Xz.
    pub const XZ: ArchiveFormat = ArchiveFormat::new(
        "xz",
        "xz",
        0x0C,
        FormatFeatures::COMPRESSION_LEVEL.union(FormatFeatures::INPUT_STREAM),
    );

    /// Every format in the table.
    pub const ALL: [ArchiveFormat; 7] = [
        Self::SEVEN_ZIP,
        Self::ZIP,
        Self::TAR,
        Self::WIM,
        Self::GZIP,
        Self::BZIP2,
        Self::XZ,
    ];

    const fn new(
        name: &'static str,
        extension: &'static str,
        id: u8,
        features: FormatFeatures,
    ) -> Self {
        Self {
            name,
            extension,
            id,
            features,
        }
    }

    /// Format name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Default file extension, without the dot.
    pub fn extension(&self) -> &'static str {
        self.extension
    }

    /// Handler id used by the engine to select the format.
    pub fn id(&self) -> u8 {
        self.id
    }

    /// All capabilities of the format.
    pub fn features(&self) -> FormatFeatures {
        self.features
    }

    /// Returns true if the format has `feature`.
    pub fn has_feature(&self, feature: FormatFeatures) -> bool {
        self.features.contains(feature)
    }

    /// Looks a format up by file extension (case-insensitive, without dot).
    pub fn from_extension(ext: &str) -> Option<ArchiveFormat> {
        Self::ALL
            .iter()
            .find(|f| f.extension.eq_ignore_ascii_case(ext))
            .copied()
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Windows file attribute bits reported for new items.
pub mod attributes {
    /// Read-only file.
    pub const READONLY: u32 = 0x01;
    /// Directory.
    pub const DIRECTORY: u32 = 0x10;
    /// Archive file.
    pub const ARCHIVE: u32 = 0x20;
    /// Unix permissions are stored in the high 16 bits.
    pub const UNIX_EXTENSION: u32 = 0x8000;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seven_zip_features() {
        let f = ArchiveFormat::SEVEN_ZIP;
        assert!(f.has_feature(FormatFeatures::MULTIPLE_FILES));
        assert!(f.has_feature(FormatFeatures::HEADER_ENCRYPTION));
        assert!(f.has_feature(FormatFeatures::MULTIPLE_FILES | FormatFeatures::SOLID_ARCHIVE));
    }

    #[test]
    fn test_single_file_formats() {
        for f in [ArchiveFormat::GZIP, ArchiveFormat::BZIP2, ArchiveFormat::XZ] {
            assert!(!f.has_feature(FormatFeatures::MULTIPLE_FILES), "{}", f);
        }
    }

    #[test]
    fn test_from_extension() {
        assert_eq!(ArchiveFormat::from_extension("7Z"), Some(ArchiveFormat::SEVEN_ZIP));
        assert_eq!(ArchiveFormat::from_extension("gz"), Some(ArchiveFormat::GZIP));
        assert_eq!(ArchiveFormat::from_extension("rar"), None);
    }

    #[test]
    fn test_contains_none() {
        assert!(ArchiveFormat::WIM.has_feature(FormatFeatures::NONE));
        assert_eq!(FormatFeatures::default(), FormatFeatures::NONE);
    }

    #[test]
    fn test_unique_ids() {
        for (i, a) in ArchiveFormat::ALL.iter().enumerate() {
            for b in &ArchiveFormat::ALL[i + 1..] {
                assert_ne!(a.id(), b.id());
            }
        }
    }
}
