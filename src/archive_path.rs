//! In-archive path type used to name new items.

use std::fmt;
use std::path::{Component, Path};

use crate::{Error, Result};

/// Maximum length for in-archive paths (in bytes).
const MAX_PATH_LENGTH: usize = 32768;

/// A validated path inside an archive.
///
/// Paths always use `/` as separator and are relative. The following are
/// rejected:
/// - empty paths and NUL bytes
/// - absolute paths (leading `/`)
/// - empty segments (`a//b`, trailing `/`)
/// - `.` and `..` segments
///
/// Two items collide (for overwrite resolution) when their paths compare
/// equal as strings.
///
/// # Examples
///
/// ```
/// use sevenlink::ArchivePath;
///
/// let path = ArchivePath::new("docs/readme.txt").unwrap();
/// assert_eq!(path.file_name(), "readme.txt");
/// assert!(ArchivePath::new("../escape").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArchivePath(String);

impl ArchivePath {
    /// Creates a new `ArchivePath`, validating it.
    pub fn new(s: &str) -> Result<Self> {
        Self::validate(s)?;
        Ok(Self(s.to_string()))
    }

    /// Builds an in-archive path from a relative filesystem path.
    ///
    /// Platform separators become `/`. Root, prefix and `.` components are
    /// dropped; `..` components and non-UTF-8 names are rejected.
    pub fn from_relative(path: &Path) -> Result<Self> {
        let mut segments = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(name) => {
                    let name = name.to_str().ok_or_else(|| {
                        Error::InvalidArchivePath(format!(
                            "non UTF-8 component in '{}'",
                            path.display()
                        ))
                    })?;
                    segments.push(name);
                }
                Component::ParentDir => {
                    return Err(Error::InvalidArchivePath(format!(
                        "'..' segment not allowed in '{}'",
                        path.display()
                    )));
                }
                Component::RootDir | Component::Prefix(_) | Component::CurDir => {}
            }
        }
        Self::new(&segments.join("/"))
    }

    fn validate(s: &str) -> Result<()> {
        if s.is_empty() {
            return Err(Error::InvalidArchivePath("empty path".into()));
        }
        if s.contains('\0') {
            return Err(Error::InvalidArchivePath("contains NUL byte".into()));
        }
        if s.len() > MAX_PATH_LENGTH {
            return Err(Error::InvalidArchivePath(format!(
                "path exceeds maximum length of {} bytes",
                MAX_PATH_LENGTH
            )));
        }
        if s.starts_with('/') {
            return Err(Error::InvalidArchivePath(format!(
                "absolute path '{}' not allowed",
                s
            )));
        }
        for segment in s.split('/') {
            match segment {
                "" => {
                    return Err(Error::InvalidArchivePath(format!(
                        "empty segment in '{}'",
                        s
                    )));
                }
                "." | ".." => {
                    return Err(Error::InvalidArchivePath(format!(
                        "'{}' segment not allowed in '{}'",
                        segment, s
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns the path as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Joins this path with a relative suffix.
    pub fn join(&self, other: &str) -> Result<Self> {
        Self::new(&format!("{}/{}", self.0, other))
    }

    /// Returns the parent directory, or `None` for a single segment.
    pub fn parent(&self) -> Option<Self> {
        self.0.rfind('/').map(|idx| Self(self.0[..idx].to_string()))
    }

    /// Returns the last segment.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Returns the number of segments.
    pub fn depth(&self) -> usize {
        self.0.split('/').count()
    }
}

impl AsRef<str> for ArchivePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArchivePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for ArchivePath {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for ArchivePath {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::validate(&s)?;
        Ok(Self(s))
    }
}
