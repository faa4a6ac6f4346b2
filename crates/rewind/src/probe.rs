//! Deadline-bounded timestamp reads of single records.

use std::time::Duration;

use rewind_types::{DEFAULT_PROBE_DEADLINE, ReadPosition, Timestamp, TopicPartition};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::{LogClient, PointRead, Result, SeekError};

/// Reads the timestamp of the record at a position.
///
/// Each call opens its own point read, waits for exactly one record and
/// releases the session on every exit path: success, failure, deadline or
/// cancellation. Nothing is cached and nothing is retried.
#[derive(Debug)]
pub struct RecordTimeProbe<'a, L> {
    log: &'a L,
    deadline: Duration,
    cancel: CancellationToken,
}

impl<'a, L: LogClient> RecordTimeProbe<'a, L> {
    /// Creates a probe with the default deadline and no cancellation.
    pub fn new(log: &'a L) -> Self {
        Self {
            log,
            deadline: DEFAULT_PROBE_DEADLINE,
            cancel: CancellationToken::new(),
        }
    }

    /// Sets the wall-clock bound on each call, measured from call start.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Aborts in-flight reads when `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Returns the configured deadline.
    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Returns the timestamp of the record at `position`.
    ///
    /// # Errors
    ///
    /// - [`SeekError::OpenPointRead`] if the session cannot be opened
    /// - [`SeekError::DeadlineExceeded`] if no record arrives in time
    /// - [`SeekError::Cancelled`] if the cancellation token fires first
    /// - [`SeekError::SessionClosed`] if the session ends without a record
    pub async fn time_at(
        &self,
        partition: &TopicPartition,
        position: ReadPosition,
    ) -> Result<Timestamp> {
        let expires_at = Instant::now() + self.deadline;

        let read = async {
            let mut session = self
                .log
                .open_point_read(partition, position)
                .await
                .map_err(|source| SeekError::OpenPointRead {
                    partition: partition.clone(),
                    position,
                    source,
                })?;
            session
                .next_record()
                .await
                .map(|record| record.timestamp)
                .ok_or_else(|| SeekError::SessionClosed {
                    partition: partition.clone(),
                    position,
                })
        };

        let result = tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(SeekError::Cancelled {
                partition: partition.clone(),
                position,
            }),
            outcome = tokio::time::timeout_at(expires_at, read) => {
                outcome.unwrap_or_else(|_elapsed| {
                    Err(SeekError::DeadlineExceeded {
                        partition: partition.clone(),
                        position,
                        deadline: self.deadline,
                    })
                })
            }
        };

        match &result {
            Ok(timestamp) => {
                tracing::trace!(partition = %partition, position = %position, timestamp = %timestamp, "probed record time");
            }
            Err(e) => {
                tracing::debug!(partition = %partition, position = %position, error = %e, "record time probe failed");
            }
        }
        result
    }
}
