//! Collaborator traits consumed by the resolver.
//!
//! The resolver never talks to a broker or a group coordinator directly.
//! Callers inject implementations of [`LogClient`] and [`Coordinator`];
//! [`MemoryLog`](crate::MemoryLog) implements both for tests and embedding.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 TimeWindow                    │
//! │   AnchorResolver → OffsetSeeker → Probe       │
//! └───────┬──────────────────┬───────────────────┘
//!         │                  │
//! ┌───────┴──────┐   ┌───────┴──────────────────┐
//! │ Coordinator  │   │ LogClient                │
//! │ (committed)  │   │ bounds, oracle, PointRead│
//! └──────────────┘   └──────────────────────────┘
//! ```

use std::future::Future;

use rewind_types::{LogRecord, Offset, ReadPosition, Timestamp, TopicPartition};

use crate::LogError;

/// An open, ephemeral read session on one partition.
///
/// Dropping the session releases it; there is no separate close call.
pub trait PointRead: Send {
    /// Waits for the next record at the session's cursor.
    ///
    /// Stays pending until a record is available. Returns `None` if the
    /// session can no longer produce records (partition trimmed past the
    /// cursor, client shut down).
    fn next_record(&mut self) -> impl Future<Output = Option<LogRecord>> + Send;
}

/// Read-only view of a partitioned log.
pub trait LogClient: Send + Sync {
    /// Session type returned by [`LogClient::open_point_read`].
    type PointRead: PointRead;

    /// Earliest retained offset of the partition.
    fn oldest_offset(
        &self,
        partition: &TopicPartition,
    ) -> impl Future<Output = Result<Offset, LogError>> + Send;

    /// Offset the next produced record will receive (exclusive upper bound).
    fn newest_offset(
        &self,
        partition: &TopicPartition,
    ) -> impl Future<Output = Result<Offset, LogError>> + Send;

    /// Best-effort offset near `timestamp`.
    ///
    /// Implementations may answer at segment granularity rather than with the
    /// exact boundary record. A time the oracle cannot map must be reported as
    /// [`LogError::TimestampOutOfRange`] so callers can tell it apart from an
    /// unreachable log.
    fn offset_near(
        &self,
        partition: &TopicPartition,
        timestamp: Timestamp,
    ) -> impl Future<Output = Result<Offset, LogError>> + Send;

    /// Opens a point read starting at `position`.
    fn open_point_read(
        &self,
        partition: &TopicPartition,
        position: ReadPosition,
    ) -> impl Future<Output = Result<Self::PointRead, LogError>> + Send;
}

/// Consumer-group offset storage.
pub trait Coordinator: Send + Sync {
    /// The group's committed offset for the partition.
    fn committed_offset(
        &self,
        partition: &TopicPartition,
    ) -> impl Future<Output = Result<Offset, LogError>> + Send;
}
