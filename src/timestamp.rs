//! Item timestamps in the FILETIME representation engines expect.
//!
//! Engines exchange times as Windows FILETIME values: 100-nanosecond
//! intervals since January 1, 1601 (UTC). [`Timestamp`] wraps that value and
//! converts from the sources new items are built from: filesystem metadata
//! (through the `filetime` crate) and [`SystemTime`].
//!
//! ```rust
//! use sevenlink::Timestamp;
//!
//! let ts = Timestamp::from_unix_secs(0).unwrap();
//! assert_eq!(ts.as_filetime(), 116_444_736_000_000_000);
//! ```

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use filetime::FileTime;

/// Offset between the FILETIME epoch (1601) and the Unix epoch (1970), in
/// 100-nanosecond intervals.
const FILETIME_UNIX_DIFF: u64 = 116_444_736_000_000_000;

const INTERVALS_PER_SECOND: u64 = 10_000_000;

/// A point in time with 100-nanosecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    filetime: u64,
}

impl Timestamp {
    /// Wraps a raw FILETIME value.
    #[inline]
    pub const fn from_filetime(filetime: u64) -> Self {
        Self { filetime }
    }

    /// Returns the raw FILETIME value.
    #[inline]
    pub const fn as_filetime(&self) -> u64 {
        self.filetime
    }

    /// The current time.
    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now()).unwrap_or(Self::from_filetime(FILETIME_UNIX_DIFF))
    }

    /// Creates a timestamp from Unix seconds and sub-second nanoseconds.
    ///
    /// Nanoseconds are truncated to 100ns. Returns `None` when the value is
    /// before 1601 or does not fit.
    pub fn from_unix(secs: i64, nanos: u32) -> Option<Self> {
        let sub = u64::from(nanos / 100);
        let base = if secs < 0 {
            FILETIME_UNIX_DIFF.checked_sub(secs.unsigned_abs().checked_mul(INTERVALS_PER_SECOND)?)?
        } else {
            FILETIME_UNIX_DIFF.checked_add((secs as u64).checked_mul(INTERVALS_PER_SECOND)?)?
        };
        base.checked_add(sub).map(Self::from_filetime)
    }

    /// Creates a timestamp from whole Unix seconds.
    pub fn from_unix_secs(secs: i64) -> Option<Self> {
        Self::from_unix(secs, 0)
    }

    /// Creates a timestamp from a `SystemTime`.
    pub fn from_system_time(time: SystemTime) -> Option<Self> {
        match time.duration_since(UNIX_EPOCH) {
            Ok(d) => Self::from_unix(i64::try_from(d.as_secs()).ok()?, d.subsec_nanos()),
            Err(e) => {
                let d = e.duration();
                let intervals = d
                    .as_secs()
                    .checked_mul(INTERVALS_PER_SECOND)?
                    .checked_add(u64::from(d.subsec_nanos() / 100))?;
                FILETIME_UNIX_DIFF
                    .checked_sub(intervals)
                    .map(Self::from_filetime)
            }
        }
    }

    /// Creates a timestamp from a `filetime::FileTime` read from file metadata.
    pub fn from_file_time(time: FileTime) -> Option<Self> {
        Self::from_unix(time.unix_seconds(), time.nanoseconds())
    }

    /// Returns the timestamp as whole Unix seconds, rounding toward negative
    /// infinity.
    pub fn as_unix_secs(&self) -> i64 {
        if self.filetime >= FILETIME_UNIX_DIFF {
            ((self.filetime - FILETIME_UNIX_DIFF) / INTERVALS_PER_SECOND) as i64
        } else {
            let before = FILETIME_UNIX_DIFF - self.filetime;
            -(before.div_ceil(INTERVALS_PER_SECOND) as i64)
        }
    }

    /// Converts to a `SystemTime`.
    pub fn as_system_time(&self) -> SystemTime {
        if self.filetime >= FILETIME_UNIX_DIFF {
            UNIX_EPOCH + intervals_to_duration(self.filetime - FILETIME_UNIX_DIFF)
        } else {
            UNIX_EPOCH - intervals_to_duration(FILETIME_UNIX_DIFF - self.filetime)
        }
    }

    /// Converts to a `filetime::FileTime`, e.g. to restore metadata on disk.
    pub fn as_file_time(&self) -> FileTime {
        FileTime::from_system_time(self.as_system_time())
    }
}

fn intervals_to_duration(intervals: u64) -> Duration {
    Duration::new(
        intervals / INTERVALS_PER_SECOND,
        ((intervals % INTERVALS_PER_SECOND) * 100) as u32,
    )
}

impl From<Timestamp> for SystemTime {
    fn from(ts: Timestamp) -> Self {
        ts.as_system_time()
    }
}
