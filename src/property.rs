//! Item and archive properties exchanged with the engine.

use std::fmt;

use crate::timestamp::Timestamp;

/// Identifies an item or archive property.
///
/// Discriminants match the property ids of the 7-Zip ABI so that engine
/// adapters can pass them through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
#[non_exhaustive]
pub enum PropertyId {
    /// In-archive path.
    Path = 3,
    /// File name only.
    Name = 4,
    /// File extension.
    Extension = 5,
    /// Whether the item is a directory.
    IsDir = 6,
    /// Uncompressed size.
    Size = 7,
    /// Compressed size.
    PackSize = 8,
    /// File attributes.
    Attrib = 9,
    /// Creation time.
    CTime = 10,
    /// Last access time.
    ATime = 11,
    /// Last modification time.
    MTime = 12,
    /// Whether the archive or item is solid.
    Solid = 13,
    /// Whether the item is encrypted.
    Encrypted = 15,
    /// Checksum of the item data.
    Crc = 19,
    /// Whether the item is an anti-item (deletion marker).
    IsAnti = 21,
    /// Compression method.
    Method = 22,
    /// Comment.
    Comment = 28,
    /// Number of volumes.
    NumVolumes = 39,
}

impl PropertyId {
    /// Returns the raw property id.
    #[inline]
    pub fn code(self) -> u32 {
        self as u32
    }
}

/// A property value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PropValue {
    /// No value.
    #[default]
    Empty,
    /// Boolean value.
    Bool(bool),
    /// 32-bit unsigned value.
    U32(u32),
    /// 64-bit unsigned value.
    U64(u64),
    /// 64-bit signed value.
    I64(i64),
    /// Text value.
    String(String),
    /// Timestamp value.
    FileTime(Timestamp),
}

impl PropValue {
    /// Returns true for [`PropValue::Empty`].
    pub fn is_empty(&self) -> bool {
        matches!(self, PropValue::Empty)
    }

    /// Returns the boolean value, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns any non-negative integer value widened to `u64`.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            PropValue::U32(v) => Some(u64::from(*v)),
            PropValue::U64(v) => Some(*v),
            PropValue::I64(v) => u64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Returns the value as `u32` if it fits.
    pub fn as_u32(&self) -> Option<u32> {
        self.as_u64().and_then(|v| u32::try_from(v).ok())
    }

    /// Returns the text value, if this is a `String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the timestamp, if this is a `FileTime`.
    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            PropValue::FileTime(ts) => Some(*ts),
            _ => None,
        }
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Empty => Ok(()),
            PropValue::Bool(b) => write!(f, "{}", if *b { "+" } else { "-" }),
            PropValue::U32(v) => write!(f, "{}", v),
            PropValue::U64(v) => write!(f, "{}", v),
            PropValue::I64(v) => write!(f, "{}", v),
            PropValue::String(s) => f.write_str(s),
            PropValue::FileTime(ts) => write!(f, "{}", ts.as_filetime()),
        }
    }
}

impl From<bool> for PropValue {
    fn from(v: bool) -> Self {
        PropValue::Bool(v)
    }
}

impl From<u32> for PropValue {
    fn from(v: u32) -> Self {
        PropValue::U32(v)
    }
}

impl From<u64> for PropValue {
    fn from(v: u64) -> Self {
        PropValue::U64(v)
    }
}

impl From<i64> for PropValue {
    fn from(v: i64) -> Self {
        PropValue::I64(v)
    }
}

impl From<&str> for PropValue {
    fn from(v: &str) -> Self {
        PropValue::String(v.to_string())
    }
}

impl From<String> for PropValue {
    fn from(v: String) -> Self {
        PropValue::String(v)
    }
}

impl From<Timestamp> for PropValue {
    fn from(v: Timestamp) -> Self {
        PropValue::FileTime(v)
    }
}

impl<T: Into<PropValue>> From<Option<T>> for PropValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(PropValue::Empty, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_default() {
        let value = PropValue::default();
        assert!(value.is_empty());
        assert_eq!(value.as_u64(), None);
        assert_eq!(value.to_string(), "");
    }

    #[test]
    fn test_integer_widening() {
        assert_eq!(PropValue::U32(7).as_u64(), Some(7));
        assert_eq!(PropValue::I64(-1).as_u64(), None);
        assert_eq!(PropValue::U64(u64::MAX).as_u32(), None);
        assert_eq!(PropValue::U64(42).as_u32(), Some(42));
    }

    #[test]
    fn test_different_types_not_equal() {
        assert_ne!(PropValue::U32(1), PropValue::U64(1));
        assert_ne!(PropValue::Bool(true), PropValue::U32(1));
        assert_eq!(PropValue::from("a"), PropValue::String("a".into()));
    }

    #[test]
    fn test_option_conversion() {
        assert!(PropValue::from(None::<u32>).is_empty());
        assert_eq!(PropValue::from(Some(true)), PropValue::Bool(true));
    }

    #[test]
    fn test_display() {
        assert_eq!(PropValue::Bool(true).to_string(), "+");
        assert_eq!(PropValue::Bool(false).to_string(), "-");
        assert_eq!(PropValue::from(5u64).to_string(), "5");
    }

    #[test]
    fn test_property_codes() {
        assert_eq!(PropertyId::Path.code(), 3);
        assert_eq!(PropertyId::MTime.code(), 12);
        assert_eq!(PropertyId::Encrypted.code(), 15);
    }
}
