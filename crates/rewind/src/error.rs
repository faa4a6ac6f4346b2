//! Error types for start-offset resolution.

use std::time::Duration;

use rewind_types::{Offset, ReadPosition, Timestamp, TopicPartition};

/// Result type for resolution operations.
pub type Result<T> = std::result::Result<T, SeekError>;

/// Errors reported by the log client and coordinator collaborators.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// The offset is not (or no longer) retained by the partition.
    #[error("offset {offset} is out of range for {partition}")]
    OffsetOutOfRange {
        partition: TopicPartition,
        offset: Offset,
    },

    /// The timestamp oracle cannot map this time to an offset.
    #[error("timestamp {timestamp} is outside the queryable range of {partition}")]
    TimestampOutOfRange {
        partition: TopicPartition,
        timestamp: Timestamp,
    },

    /// The consumer group has not committed an offset for the partition.
    #[error("no committed offset for {0}")]
    NoCommittedOffset(TopicPartition),

    /// The partition does not exist.
    #[error("unknown partition {0}")]
    UnknownPartition(TopicPartition),

    /// The collaborator could not be reached or failed internally.
    #[error("upstream unavailable: {0}")]
    Unavailable(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl LogError {
    /// Wraps any error as [`LogError::Unavailable`].
    pub fn unavailable(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        LogError::Unavailable(err.into())
    }
}

/// Errors from resolving a start offset.
///
/// Every variant aborts the resolution. Collaborator failures keep the
/// originating [`LogError`] as their source.
#[derive(Debug, thiserror::Error)]
pub enum SeekError {
    /// The coordinator could not supply the committed offset.
    #[error("failed to fetch committed offset for {partition}")]
    CommittedOffset {
        partition: TopicPartition,
        #[source]
        source: LogError,
    },

    /// The oldest/newest offset lookup failed.
    #[error("failed to fetch offset bounds for {partition}")]
    Bounds {
        partition: TopicPartition,
        #[source]
        source: LogError,
    },

    /// The timestamp oracle failed for a reason other than an out-of-range time.
    #[error("timestamp lookup for {target} failed on {partition}")]
    TimestampLookup {
        partition: TopicPartition,
        target: Timestamp,
        #[source]
        source: LogError,
    },

    /// A point read could not be opened.
    #[error("failed to open point read at {position} on {partition}")]
    OpenPointRead {
        partition: TopicPartition,
        position: ReadPosition,
        #[source]
        source: LogError,
    },

    /// No record arrived at the position before the probe deadline.
    #[error("deadline of {deadline:?} exceeded reading record at {position} on {partition}")]
    DeadlineExceeded {
        partition: TopicPartition,
        position: ReadPosition,
        deadline: Duration,
    },

    /// The point read ended without yielding a record.
    #[error("point read at {position} on {partition} closed before yielding a record")]
    SessionClosed {
        partition: TopicPartition,
        position: ReadPosition,
    },

    /// The caller cancelled the resolution.
    #[error("resolution cancelled while reading {position} on {partition}")]
    Cancelled {
        partition: TopicPartition,
        position: ReadPosition,
    },
}

impl SeekError {
    /// Returns the collaborator error behind this failure, if any.
    pub fn log_error(&self) -> Option<&LogError> {
        match self {
            SeekError::CommittedOffset { source, .. }
            | SeekError::Bounds { source, .. }
            | SeekError::TimestampLookup { source, .. }
            | SeekError::OpenPointRead { source, .. } => Some(source),
            SeekError::DeadlineExceeded { .. }
            | SeekError::SessionClosed { .. }
            | SeekError::Cancelled { .. } => None,
        }
    }

    /// Returns true if the failure was an offset no longer retained by the log.
    ///
    /// Callers resolving from the committed position typically fall back to
    /// [`StartPosition::Newest`](rewind_types::StartPosition::Newest) on this.
    pub fn is_offset_out_of_range(&self) -> bool {
        matches!(self.log_error(), Some(LogError::OffsetOutOfRange { .. }))
    }

    /// Returns true if a probe ran out of time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, SeekError::DeadlineExceeded { .. })
    }

    /// Returns true if the caller's cancellation token fired.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SeekError::Cancelled { .. })
    }
}
