//! Remote object naming.
//!
//! Names are a pure function of the payload size and a timestamp so that
//! tests can pin the clock.

use camino::Utf8Path;
use chrono::{DateTime, Utc};

/// Timestamp layout appended to the size: UTC, millisecond precision.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S%3f";

/// Source of the current UTC time.
pub trait Clock {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock backed by [`Utc::now`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a single instant.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Formats the remote file name as `<size>-yyyyMMddHHmmssfff`.
#[must_use]
pub fn remote_file_name(size: u64, now: DateTime<Utc>) -> String {
    format!("{size}-{}", now.format(TIMESTAMP_FORMAT))
}

/// Places `file_name` under `remote_dir` when one is configured.
#[must_use]
pub fn remote_path(remote_dir: Option<&Utf8Path>, file_name: &str) -> String {
    remote_dir.map_or_else(
        || file_name.to_owned(),
        |dir| dir.join(file_name).into_string(),
    )
}
