//! Configuration for multi-volume archives.

use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Volume size and base path of a volume set.
///
/// # Example
///
/// ```rust
/// use sevenlink::volume::VolumeConfig;
///
/// let config = VolumeConfig::new("archive.7z", 100 * 1024 * 1024).unwrap();
/// assert_eq!(config.volume_path(1).to_str().unwrap(), "archive.7z.001");
/// assert_eq!(config.volume_path(12).to_str().unwrap(), "archive.7z.012");
/// ```
#[derive(Debug, Clone)]
pub struct VolumeConfig {
    volume_size: u64,
    base_path: PathBuf,
}

impl VolumeConfig {
    /// Creates a new volume configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `volume_size` is zero.
    pub fn new(base_path: impl AsRef<Path>, volume_size: u64) -> Result<Self> {
        if volume_size == 0 {
            return Err(Error::invalid_argument("volume size must be non-zero"));
        }
        Ok(Self {
            volume_size,
            base_path: base_path.as_ref().to_path_buf(),
        })
    }

    /// Returns the base path for the archive.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Generates the path for a 1-indexed volume number.
    pub fn volume_path(&self, volume_number: u32) -> PathBuf {
        let mut name = self.base_path.clone().into_os_string();
        name.push(format!(".{:03}", volume_number));
        PathBuf::from(name)
    }

    /// Returns the volume size in bytes.
    pub fn volume_size(&self) -> u64 {
        self.volume_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_path_generation() {
        let config = VolumeConfig::new("test.7z", 1024).unwrap();

        assert_eq!(config.volume_path(1), PathBuf::from("test.7z.001"));
        assert_eq!(config.volume_path(10), PathBuf::from("test.7z.010"));
        assert_eq!(config.volume_path(999), PathBuf::from("test.7z.999"));
        assert_eq!(config.volume_path(1000), PathBuf::from("test.7z.1000"));
    }

    #[test]
    fn test_volume_path_with_directory() {
        let config = VolumeConfig::new("/path/to/archive.7z", 1024).unwrap();
        assert_eq!(
            config.volume_path(1),
            PathBuf::from("/path/to/archive.7z.001")
        );
        assert_eq!(config.base_path(), Path::new("/path/to/archive.7z"));
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(matches!(
            VolumeConfig::new("a.7z", 0),
            Err(Error::InvalidArgument(_))
        ));
    }
}
