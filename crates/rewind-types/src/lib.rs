//! # rewind-types: Core types for `rewind`
//!
//! This crate contains the value types shared across the `rewind` workspace:
//! - Log addressing ([`Offset`], [`TopicPartition`], [`ReadPosition`], [`Bounds`])
//! - Temporal types ([`Timestamp`])
//! - Log records ([`LogRecord`])
//! - Resolution inputs ([`StartPosition`], [`TimeWindowConfig`])

use std::{
    fmt::{Debug, Display},
    time::Duration,
};

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Default wall-clock bound for reading a single record during resolution.
pub const DEFAULT_PROBE_DEADLINE: Duration = Duration::from_secs(5);

// ============================================================================
// Log addressing - Offset is Copy (cheap 8-byte value)
// ============================================================================

/// Position of a record within a partition (0-indexed, dense).
///
/// Every value between a partition's oldest retained offset and its newest
/// (exclusive) offset identifies exactly one record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Offset(u64);

impl Offset {
    pub const ZERO: Offset = Offset(0);

    pub fn new(offset: u64) -> Self {
        Self(offset)
    }

    /// Returns the offset as a `u64`.
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Returns `floor((a + b) / 2)` without overflowing.
    ///
    /// The result always lies in `[min(a, b), max(a, b)]`, and strictly below
    /// the larger argument whenever the two differ.
    ///
    /// # Examples
    ///
    /// ```
    /// # use rewind_types::Offset;
    /// assert_eq!(Offset::midpoint(Offset::new(0), Offset::new(1000)), Offset::new(500));
    /// assert_eq!(Offset::midpoint(Offset::new(7), Offset::new(8)), Offset::new(7));
    /// ```
    pub fn midpoint(a: Offset, b: Offset) -> Offset {
        let (lo, hi) = if a <= b { (a.0, b.0) } else { (b.0, a.0) };
        Offset(lo + (hi - lo) / 2)
    }

    /// Returns the next offset, saturating at `u64::MAX`.
    pub fn next(&self) -> Offset {
        Offset(self.0.saturating_add(1))
    }
}

impl Display for Offset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Offset {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Offset> for u64 {
    fn from(offset: Offset) -> Self {
        offset.0
    }
}

/// A single partition of a topic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TopicPartition {
    pub topic: String,
    pub partition: u32,
}

impl TopicPartition {
    pub fn new(topic: impl Into<String>, partition: u32) -> Self {
        Self {
            topic: topic.into(),
            partition,
        }
    }
}

impl Display for TopicPartition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.topic, self.partition)
    }
}

/// Where a point read starts.
///
/// `Newest` is the log's sentinel for "the head of the partition"; it is
/// resolved by the log client when the read is opened, not by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReadPosition {
    /// A concrete offset.
    At(Offset),
    /// The partition head, as the log client defines it.
    Newest,
}

impl Display for ReadPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadPosition::At(offset) => write!(f, "{offset}"),
            ReadPosition::Newest => f.write_str("newest"),
        }
    }
}

impl From<Offset> for ReadPosition {
    fn from(offset: Offset) -> Self {
        ReadPosition::At(offset)
    }
}

/// Snapshot of a partition's retained offset range, `[oldest, newest)`.
///
/// Bounds are advisory: the log keeps growing and retention keeps trimming,
/// so a snapshot is only valid as of the moment it was queried.
///
/// # Invariants
///
/// - `oldest <= newest` (enforced by [`Bounds::new`])
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bounds {
    oldest: Offset,
    newest: Offset,
}

impl Bounds {
    /// Creates a bounds snapshot.
    ///
    /// A `newest` below `oldest` can only come from two lookups racing a
    /// truncation; it is clamped to an empty range at `oldest`.
    pub fn new(oldest: Offset, newest: Offset) -> Self {
        Self {
            oldest,
            newest: newest.max(oldest),
        }
    }

    /// Earliest retained offset.
    pub fn oldest(&self) -> Offset {
        self.oldest
    }

    /// One past the latest produced offset.
    pub fn newest(&self) -> Offset {
        self.newest
    }

    /// Number of offsets in the range.
    pub fn len(&self) -> u64 {
        self.newest.0 - self.oldest.0
    }

    /// Returns true when no record is retained.
    pub fn is_empty(&self) -> bool {
        self.oldest == self.newest
    }

    /// Returns true if `offset` lies strictly between the two edges.
    pub fn strictly_contains(&self, offset: Offset) -> bool {
        self.oldest < offset && offset < self.newest
    }

    /// Midpoint of the range, used when no better starting candidate exists.
    pub fn midpoint(&self) -> Offset {
        Offset::midpoint(self.oldest, self.newest)
    }
}

impl Display for Bounds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.oldest, self.newest)
    }
}

// ============================================================================
// Timestamp - Copy (8-byte value)
// ============================================================================

/// Wall-clock timestamp embedded in a record.
///
/// Stored as nanoseconds since Unix epoch (1970-01-01 00:00:00 UTC).
/// Record timestamps are assumed non-decreasing as offsets increase.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The Unix epoch (1970-01-01 00:00:00 UTC).
    pub const EPOCH: Timestamp = Timestamp(0);

    /// Creates a timestamp from nanoseconds since Unix epoch.
    pub fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    /// Creates a timestamp from milliseconds since Unix epoch.
    pub fn from_millis(millis: u64) -> Self {
        Self(millis.saturating_mul(1_000_000))
    }

    /// Returns the timestamp as nanoseconds since Unix epoch.
    pub fn as_nanos(&self) -> u64 {
        self.0
    }

    /// Returns the timestamp as milliseconds since Unix epoch (truncates).
    ///
    /// Timestamp oracles are commonly keyed in milliseconds.
    pub fn as_millis(&self) -> u64 {
        self.0 / 1_000_000
    }

    /// Moves the timestamp back by `window`, stopping at the epoch.
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::time::Duration;
    /// # use rewind_types::Timestamp;
    /// let t = Timestamp::from_millis(10_000);
    /// assert_eq!(t.saturating_sub(Duration::from_secs(4)), Timestamp::from_millis(6_000));
    /// assert_eq!(t.saturating_sub(Duration::from_secs(60)), Timestamp::EPOCH);
    /// ```
    pub fn saturating_sub(&self, window: Duration) -> Timestamp {
        let nanos = u64::try_from(window.as_nanos()).unwrap_or(u64::MAX);
        Timestamp(self.0.saturating_sub(nanos))
    }

    /// Moves the timestamp forward by `delta`, saturating at `u64::MAX` nanos.
    pub fn saturating_add(&self, delta: Duration) -> Timestamp {
        let nanos = u64::try_from(delta.as_nanos()).unwrap_or(u64::MAX);
        Timestamp(self.0.saturating_add(nanos))
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Display as seconds.nanoseconds for readability
        let secs = self.0 / 1_000_000_000;
        let nanos = self.0 % 1_000_000_000;
        write!(f, "{secs}.{nanos:09}")
    }
}

impl From<u64> for Timestamp {
    fn from(nanos: u64) -> Self {
        Self(nanos)
    }
}

impl From<Timestamp> for u64 {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

// ============================================================================
// Records
// ============================================================================

/// A record read back from a partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Position in the partition.
    pub offset: Offset,
    /// Producer-assigned wall-clock time.
    pub timestamp: Timestamp,
    /// Opaque record body.
    pub payload: Bytes,
}

impl LogRecord {
    pub fn new(offset: Offset, timestamp: Timestamp, payload: Bytes) -> Self {
        Self {
            offset,
            timestamp,
            payload,
        }
    }
}

// ============================================================================
// Resolution inputs
// ============================================================================

/// How the anchor of a time window is chosen.
///
/// Exactly two positions exist. Configuration sources spell them
/// `"committed"` and `"newest"`; anything else fails to deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StartPosition {
    /// The consumer group's committed offset for the partition. If nothing is
    /// committed, or the committed offset is no longer retained, resolution
    /// fails and the caller decides how to recover.
    #[default]
    Committed,
    /// The partition head.
    Newest,
}

impl Display for StartPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StartPosition::Committed => f.write_str("committed"),
            StartPosition::Newest => f.write_str("newest"),
        }
    }
}

/// Everything needed to resolve where a time-window consumer starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeWindowConfig {
    /// How the anchor is chosen.
    pub start: StartPosition,
    /// How far back from the anchor's time to start reading.
    pub window: Duration,
    /// The partition to resolve against.
    pub partition: TopicPartition,
    /// Bound on each single-record read.
    pub probe_deadline: Duration,
}

impl TimeWindowConfig {
    /// Creates a config with the default probe deadline.
    pub fn new(start: StartPosition, window: Duration, partition: TopicPartition) -> Self {
        Self {
            start,
            window,
            partition,
            probe_deadline: DEFAULT_PROBE_DEADLINE,
        }
    }

    /// Overrides the probe deadline.
    pub fn with_probe_deadline(mut self, deadline: Duration) -> Self {
        self.probe_deadline = deadline;
        self
    }
}

#[cfg(test)]
mod tests;
