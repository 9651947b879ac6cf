//! Multi-volume destination stream.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::PathBuf;

use super::VolumeConfig;
use crate::engine::OutStream;
use crate::{Error, Result};

struct Volume {
    file: File,
    path: PathBuf,
    size: u64,
}

/// A destination that splits the archive across volume files.
///
/// Every volume except the last holds exactly `volume_size` bytes. The
/// stream is fully seekable: the engine may go back and patch headers in
/// an earlier volume. Volumes are created on first write.
///
/// # Example
///
/// ```rust,ignore
/// use sevenlink::volume::{VolumeConfig, MultiVolumeOutStream};
///
/// let config = VolumeConfig::new("archive.7z", 50 * 1024 * 1024)?;
/// let mut out = MultiVolumeOutStream::create(config)?;
/// out.write_all(&data)?;
/// let sizes = out.finish()?;
/// ```
pub struct MultiVolumeOutStream {
    config: VolumeConfig,
    volumes: Vec<Volume>,
    position: u64,
    length: u64,
}

impl MultiVolumeOutStream {
    /// Creates the stream and its first volume.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IoAt`] if the first volume file cannot be created.
    pub fn create(config: VolumeConfig) -> Result<Self> {
        let mut stream = Self {
            config,
            volumes: Vec::new(),
            position: 0,
            length: 0,
        };
        stream.open_volume()?;
        Ok(stream)
    }

    fn open_volume(&mut self) -> Result<()> {
        let number = self.volumes.len() as u32 + 1;
        let path = self.config.volume_path(number);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| Error::io_at("Cannot create volume", &path, e))?;
        log::debug!("created volume {}", path.display());
        self.volumes.push(Volume {
            file,
            path,
            size: 0,
        });
        Ok(())
    }

    /// Number of volume files created so far.
    pub fn volume_count(&self) -> u32 {
        self.volumes.len() as u32
    }

    /// Total bytes in the volume set.
    pub fn total_written(&self) -> u64 {
        self.length
    }

    /// Paths of all volumes, in order.
    pub fn volume_paths(&self) -> Vec<PathBuf> {
        self.volumes.iter().map(|v| v.path.clone()).collect()
    }

    /// Extends every volume before `index` to the full volume size, so a
    /// write that skipped ahead still leaves a contiguous set.
    fn fill_volumes_before(&mut self, index: usize) -> io::Result<()> {
        let volume_size = self.config.volume_size();
        for volume in &mut self.volumes[..index] {
            if volume.size < volume_size {
                volume.file.set_len(volume_size)?;
                volume.size = volume_size;
            }
        }
        Ok(())
    }

    /// Flushes every volume and returns their sizes.
    pub fn finish(mut self) -> Result<Vec<u64>> {
        self.flush()?;
        Ok(self.volumes.iter().map(|v| v.size).collect())
    }
}

impl Write for MultiVolumeOutStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let volume_size = self.config.volume_size();
        let index = (self.position / volume_size) as usize;
        let offset = self.position % volume_size;
        if self.volumes.len() <= index {
            while self.volumes.len() <= index {
                self.open_volume().map_err(io::Error::other)?;
            }
            self.fill_volumes_before(index)?;
        }

        let room = volume_size - offset;
        let to_write = buf.len().min(usize::try_from(room).unwrap_or(usize::MAX));
        let volume = &mut self.volumes[index];
        volume.file.seek(SeekFrom::Start(offset))?;
        let n = volume.file.write(&buf[..to_write])?;
        volume.size = volume.size.max(offset + n as u64);

        self.position += n as u64;
        self.length = self.length.max(self.position);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        for volume in &mut self.volumes {
            volume.file.flush()?;
        }
        Ok(())
    }
}

impl Seek for MultiVolumeOutStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(p) => Some(p),
            SeekFrom::Current(delta) => self.position.checked_add_signed(delta),
            SeekFrom::End(delta) => self.length.checked_add_signed(delta),
        };
        let target = target.ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "invalid seek to a negative position")
        })?;
        self.position = target;
        Ok(target)
    }
}

impl OutStream for MultiVolumeOutStream {
    fn set_size(&mut self, size: u64) -> io::Result<()> {
        let volume_size = self.config.volume_size();
        let keep = if size == 0 {
            1
        } else {
            size.div_ceil(volume_size) as usize
        };
        while self.volumes.len() > keep {
            if let Some(volume) = self.volumes.pop() {
                drop(volume.file);
                fs::remove_file(&volume.path)?;
            }
        }
        while self.volumes.len() < keep {
            self.open_volume().map_err(io::Error::other)?;
        }
        let last = keep - 1;
        for (i, volume) in self.volumes.iter_mut().enumerate() {
            let wanted = if i < last {
                volume_size
            } else {
                size - last as u64 * volume_size
            };
            if volume.size != wanted {
                volume.file.set_len(wanted)?;
                volume.size = wanted;
            }
        }
        self.length = size;
        Ok(())
    }
}
