//! In-process partitioned log.
//!
//! [`MemoryLog`] implements both [`LogClient`] and [`Coordinator`] over
//! in-memory partitions. It behaves like a live broker in the ways the
//! resolver cares about:
//!
//! - point reads at or past the tail wait until a record is appended
//! - `ReadPosition::Newest` resolves to the last record, or to the next
//!   appended record when the partition is empty
//! - reads below the oldest retained offset fail with `OffsetOutOfRange`
//! - the timestamp oracle answers at segment granularity by default
//!
//! Cloning a `MemoryLog` yields another handle to the same partitions.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use rewind_types::{LogRecord, Offset, ReadPosition, Timestamp, TopicPartition};
use tokio::sync::Notify;

use crate::{Coordinator, LogClient, LogError, PointRead};

/// Default number of records per simulated segment.
const DEFAULT_SEGMENT_RECORDS: u64 = 64;

/// How [`MemoryLog`] answers [`LogClient::offset_near`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleMode {
    /// Returns the first offset of the segment holding the first record at or
    /// after the target. Segments are `records` offsets wide, aligned to 0.
    Segment { records: u64 },
    /// Returns the first offset whose timestamp is at or after the target.
    Exact,
    /// Always reports [`LogError::TimestampOutOfRange`].
    OutOfRange,
    /// Always reports [`LogError::Unavailable`].
    Unavailable,
}

impl Default for OracleMode {
    fn default() -> Self {
        OracleMode::Segment {
            records: DEFAULT_SEGMENT_RECORDS,
        }
    }
}

/// Records of one partition. `records[i]` lives at offset `oldest + i`.
#[derive(Debug, Default)]
struct PartitionLog {
    oldest: Offset,
    records: VecDeque<(Timestamp, Bytes)>,
}

impl PartitionLog {
    fn newest(&self) -> Offset {
        Offset::new(self.oldest.as_u64() + self.records.len() as u64)
    }

    fn get(&self, offset: Offset) -> Option<LogRecord> {
        let index = offset.as_u64().checked_sub(self.oldest.as_u64())?;
        let (timestamp, payload) = self.records.get(usize::try_from(index).ok()?)?;
        Some(LogRecord::new(offset, *timestamp, payload.clone()))
    }

    /// First retained offset whose timestamp is at or after `target`.
    fn first_at_or_after(&self, target: Timestamp) -> Option<Offset> {
        let index = self.records.partition_point(|(ts, _)| *ts < target);
        (index < self.records.len()).then(|| Offset::new(self.oldest.as_u64() + index as u64))
    }
}

#[derive(Debug, Default)]
struct Inner {
    partitions: Mutex<HashMap<TopicPartition, PartitionLog>>,
    committed: Mutex<HashMap<TopicPartition, Offset>>,
    oracle: Mutex<OracleMode>,
    appended: Notify,
    open_sessions: AtomicUsize,
    point_reads_opened: AtomicU64,
}

/// In-memory partitioned log with a consumer-group offset store.
#[derive(Debug, Clone, Default)]
pub struct MemoryLog {
    inner: Arc<Inner>,
}

impl MemoryLog {
    /// Creates an empty log with the default segment-granular oracle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how the timestamp oracle answers.
    pub fn with_oracle(self, mode: OracleMode) -> Self {
        self.set_oracle(mode);
        self
    }

    /// Changes how the timestamp oracle answers.
    pub fn set_oracle(&self, mode: OracleMode) {
        *lock(&self.inner.oracle) = mode;
    }

    /// Creates an empty partition whose first record will get `oldest`.
    ///
    /// Does nothing if the partition already exists.
    pub fn create_partition(&self, partition: TopicPartition, oldest: Offset) {
        lock(&self.inner.partitions)
            .entry(partition)
            .or_insert_with(|| PartitionLog {
                oldest,
                records: VecDeque::new(),
            });
    }

    /// Appends a record and wakes any point read waiting on the tail.
    ///
    /// Partitions are created on first append. Timestamps are expected to be
    /// non-decreasing; the log does not enforce it.
    pub fn append(
        &self,
        partition: &TopicPartition,
        timestamp: Timestamp,
        payload: impl Into<Bytes>,
    ) -> Offset {
        let offset = {
            let mut partitions = lock(&self.inner.partitions);
            let log = partitions.entry(partition.clone()).or_default();
            let offset = log.newest();
            log.records.push_back((timestamp, payload.into()));
            offset
        };
        self.inner.appended.notify_waiters();
        offset
    }

    /// Drops every record below `offset`, as retention would.
    ///
    /// Trimming past the tail empties the partition and moves both bounds to
    /// `offset`; the next append receives `offset`.
    pub fn trim_before(&self, partition: &TopicPartition, offset: Offset) {
        {
            let mut partitions = lock(&self.inner.partitions);
            let Some(log) = partitions.get_mut(partition) else {
                return;
            };
            if offset >= log.newest() {
                log.records.clear();
                log.oldest = log.oldest.max(offset);
            } else {
                while log.oldest < offset && log.records.pop_front().is_some() {
                    log.oldest = log.oldest.next();
                }
            }
        }
        // Readers parked on trimmed offsets must observe the change.
        self.inner.appended.notify_waiters();
    }

    /// Records the consumer group's committed offset for a partition.
    pub fn commit(&self, partition: &TopicPartition, offset: Offset) {
        lock(&self.inner.committed).insert(partition.clone(), offset);
    }

    /// Number of point reads currently open.
    pub fn open_sessions(&self) -> usize {
        self.inner.open_sessions.load(Ordering::SeqCst)
    }

    /// Number of point reads opened since the log was created.
    pub fn point_reads_opened(&self) -> u64 {
        self.inner.point_reads_opened.load(Ordering::SeqCst)
    }

    fn with_partition<T>(
        &self,
        partition: &TopicPartition,
        f: impl FnOnce(&PartitionLog) -> Result<T, LogError>,
    ) -> Result<T, LogError> {
        let partitions = lock(&self.inner.partitions);
        let log = partitions
            .get(partition)
            .ok_or_else(|| LogError::UnknownPartition(partition.clone()))?;
        f(log)
    }
}

impl LogClient for MemoryLog {
    type PointRead = MemoryPointRead;

    async fn oldest_offset(&self, partition: &TopicPartition) -> Result<Offset, LogError> {
        self.with_partition(partition, |log| Ok(log.oldest))
    }

    async fn newest_offset(&self, partition: &TopicPartition) -> Result<Offset, LogError> {
        self.with_partition(partition, |log| Ok(log.newest()))
    }

    async fn offset_near(
        &self,
        partition: &TopicPartition,
        timestamp: Timestamp,
    ) -> Result<Offset, LogError> {
        let mode = *lock(&self.inner.oracle);
        self.with_partition(partition, |log| {
            let out_of_range = || LogError::TimestampOutOfRange {
                partition: partition.clone(),
                timestamp,
            };
            match mode {
                OracleMode::Unavailable => Err(LogError::unavailable("timestamp index offline")),
                OracleMode::OutOfRange => Err(out_of_range()),
                OracleMode::Exact => log.first_at_or_after(timestamp).ok_or_else(out_of_range),
                OracleMode::Segment { records } => {
                    let exact = log.first_at_or_after(timestamp).ok_or_else(out_of_range)?;
                    let records = records.max(1);
                    let segment_start = exact.as_u64() - exact.as_u64() % records;
                    Ok(Offset::new(segment_start).max(log.oldest))
                }
            }
        })
    }

    async fn open_point_read(
        &self,
        partition: &TopicPartition,
        position: ReadPosition,
    ) -> Result<MemoryPointRead, LogError> {
        let cursor = self.with_partition(partition, |log| match position {
            ReadPosition::Newest if log.records.is_empty() => Ok(log.newest()),
            ReadPosition::Newest => Ok(Offset::new(log.newest().as_u64() - 1)),
            ReadPosition::At(offset) if offset < log.oldest => Err(LogError::OffsetOutOfRange {
                partition: partition.clone(),
                offset,
            }),
            ReadPosition::At(offset) => Ok(offset),
        })?;

        self.inner.open_sessions.fetch_add(1, Ordering::SeqCst);
        self.inner.point_reads_opened.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryPointRead {
            inner: Arc::clone(&self.inner),
            partition: partition.clone(),
            cursor,
        })
    }
}

impl Coordinator for MemoryLog {
    async fn committed_offset(&self, partition: &TopicPartition) -> Result<Offset, LogError> {
        let committed = lock(&self.inner.committed)
            .get(partition)
            .copied()
            .ok_or_else(|| LogError::NoCommittedOffset(partition.clone()))?;

        // A committed offset that retention already dropped is unusable.
        self.with_partition(partition, |log| {
            if committed < log.oldest {
                Err(LogError::OffsetOutOfRange {
                    partition: partition.clone(),
                    offset: committed,
                })
            } else {
                Ok(committed)
            }
        })
    }
}

/// Point read over a [`MemoryLog`] partition.
#[derive(Debug)]
pub struct MemoryPointRead {
    inner: Arc<Inner>,
    partition: TopicPartition,
    cursor: Offset,
}

enum Poll {
    Ready(LogRecord),
    Gone,
    Wait,
}

impl MemoryPointRead {
    fn poll_record(&self) -> Poll {
        let partitions = lock(&self.inner.partitions);
        let Some(log) = partitions.get(&self.partition) else {
            return Poll::Gone;
        };
        if self.cursor < log.oldest {
            return Poll::Gone;
        }
        match log.get(self.cursor) {
            Some(record) => Poll::Ready(record),
            None => Poll::Wait,
        }
    }
}

impl PointRead for MemoryPointRead {
    async fn next_record(&mut self) -> Option<LogRecord> {
        loop {
            // Register interest before checking so an append between the
            // check and the await is not missed.
            let notified = self.inner.appended.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match self.poll_record() {
                Poll::Ready(record) => {
                    self.cursor = record.offset.next();
                    return Some(record);
                }
                Poll::Gone => return None,
                Poll::Wait => notified.await,
            }
        }
    }
}

impl Drop for MemoryPointRead {
    fn drop(&mut self) {
        self.inner.open_sessions.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Locks a mutex, recovering the data if a panicking holder poisoned it.
///
/// Every critical section here leaves the maps consistent, so a poisoned
/// lock carries no torn state.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
