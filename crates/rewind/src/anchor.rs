//! Anchor resolution: the reference point a time window is measured from.

use rewind_types::{ReadPosition, StartPosition, Timestamp, TopicPartition};

use crate::{Coordinator, LogClient, RecordTimeProbe, Result, SeekError};

/// Reference position and its record time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    /// Where the anchor record lives. `Newest` when anchored at the head.
    pub position: ReadPosition,
    /// Timestamp of the anchor record.
    pub time: Timestamp,
}

/// Determines the anchor for a [`StartPosition`].
#[derive(Debug)]
pub struct AnchorResolver<'a, L, C> {
    coordinator: &'a C,
    probe: &'a RecordTimeProbe<'a, L>,
}

impl<'a, L: LogClient, C: Coordinator> AnchorResolver<'a, L, C> {
    pub fn new(coordinator: &'a C, probe: &'a RecordTimeProbe<'a, L>) -> Self {
        Self { coordinator, probe }
    }

    /// Resolves the anchor position and reads its time.
    ///
    /// # Errors
    ///
    /// - [`SeekError::CommittedOffset`] when anchoring at the committed offset
    ///   and the coordinator has none, or it is no longer retained
    /// - any probe error for the anchor record, unchanged
    pub async fn resolve(&self, start: StartPosition, partition: &TopicPartition) -> Result<Anchor> {
        let position = match start {
            StartPosition::Committed => {
                let offset = self
                    .coordinator
                    .committed_offset(partition)
                    .await
                    .map_err(|source| SeekError::CommittedOffset {
                        partition: partition.clone(),
                        source,
                    })?;
                ReadPosition::At(offset)
            }
            StartPosition::Newest => ReadPosition::Newest,
        };

        let time = self.probe.time_at(partition, position).await?;
        tracing::debug!(partition = %partition, start = %start, position = %position, time = %time, "resolved anchor");

        Ok(Anchor { position, time })
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use rewind_types::Offset;

    use super::*;
    use crate::{LogError, MemoryLog};

    fn tp() -> TopicPartition {
        TopicPartition::new("events", 0)
    }

    fn log_with(n: u64) -> MemoryLog {
        let log = MemoryLog::new();
        for i in 0..n {
            log.append(&tp(), Timestamp::from_millis(i * 10), Bytes::new());
        }
        log
    }

    #[tokio::test]
    async fn committed_anchor_reads_committed_record() {
        let log = log_with(100);
        log.commit(&tp(), Offset::new(40));
        let probe = RecordTimeProbe::new(&log);

        let anchor = AnchorResolver::new(&log, &probe)
            .resolve(StartPosition::Committed, &tp())
            .await
            .unwrap();

        assert_eq!(anchor.position, ReadPosition::At(Offset::new(40)));
        assert_eq!(anchor.time, Timestamp::from_millis(400));
    }

    #[tokio::test]
    async fn newest_anchor_reads_head_record() {
        let log = log_with(100);
        let probe = RecordTimeProbe::new(&log);

        let anchor = AnchorResolver::new(&log, &probe)
            .resolve(StartPosition::Newest, &tp())
            .await
            .unwrap();

        assert_eq!(anchor.position, ReadPosition::Newest);
        assert_eq!(anchor.time, Timestamp::from_millis(990));
    }

    #[tokio::test]
    async fn missing_commit_is_surfaced_untranslated() {
        let log = log_with(10);
        let probe = RecordTimeProbe::new(&log);

        let err = AnchorResolver::new(&log, &probe)
            .resolve(StartPosition::Committed, &tp())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SeekError::CommittedOffset {
                source: LogError::NoCommittedOffset(_),
                ..
            }
        ));
        assert_eq!(log.point_reads_opened(), 0);
    }

    #[tokio::test]
    async fn trimmed_commit_is_out_of_range() {
        let log = log_with(10);
        log.commit(&tp(), Offset::new(2));
        log.trim_before(&tp(), Offset::new(5));
        let probe = RecordTimeProbe::new(&log);

        let err = AnchorResolver::new(&log, &probe)
            .resolve(StartPosition::Committed, &tp())
            .await
            .unwrap_err();

        assert!(err.is_offset_out_of_range());
    }
}
