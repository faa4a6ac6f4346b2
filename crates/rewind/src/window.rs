//! Time-window start offsets.
//!
//! [`TimeWindow`] wires the anchor lookup, the target computation and the
//! offset search together. A streaming consumer asks it where to begin each
//! partition through [`StartOffsetSource`]; one-off callers use
//! [`resolve_start_offset`].

use std::future::Future;
use std::time::Duration;

use rewind_types::{
    DEFAULT_PROBE_DEADLINE, Offset, StartPosition, Timestamp, TimeWindowConfig, TopicPartition,
};
use tokio_util::sync::CancellationToken;

use crate::{Anchor, AnchorResolver, Coordinator, LogClient, OffsetSeeker, RecordTimeProbe, Result};

/// Supplies the offset a streaming consumer starts a partition from.
///
/// Streaming consumers call this when a partition is assigned, before they
/// begin fetching. Implementations must not mutate partition state.
pub trait StartOffsetSource: Send + Sync {
    fn start_offset(
        &self,
        partition: &TopicPartition,
    ) -> impl Future<Output = Result<Offset>> + Send;
}

/// Outcome of a single resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// The reference point the window was measured from.
    pub anchor: Anchor,
    /// `anchor.time - window`, clamped at the epoch.
    pub target: Timestamp,
    /// Where to start reading.
    pub offset: Offset,
}

/// Starts consumption a fixed span of time before an anchor.
///
/// The anchor is either the group's committed offset or the partition head.
/// Its record time minus the window is the target; the start offset is the
/// latest record at or before that target.
#[derive(Debug)]
pub struct TimeWindow<'a, L, C> {
    log: &'a L,
    coordinator: &'a C,
    start: StartPosition,
    window: Duration,
    probe_deadline: Duration,
    cancel: CancellationToken,
}

impl<'a, L: LogClient, C: Coordinator> TimeWindow<'a, L, C> {
    /// Creates a time window over the given collaborators.
    pub fn new(log: &'a L, coordinator: &'a C, start: StartPosition, window: Duration) -> Self {
        Self {
            log,
            coordinator,
            start,
            window,
            probe_deadline: DEFAULT_PROBE_DEADLINE,
            cancel: CancellationToken::new(),
        }
    }

    /// Creates a time window from a resolution config.
    ///
    /// The config's partition is not retained; pass it to [`resolve`](Self::resolve).
    pub fn from_config(log: &'a L, coordinator: &'a C, config: &TimeWindowConfig) -> Self {
        Self::new(log, coordinator, config.start, config.window)
            .with_probe_deadline(config.probe_deadline)
    }

    /// Sets the bound on each single-record read.
    pub fn with_probe_deadline(mut self, deadline: Duration) -> Self {
        self.probe_deadline = deadline;
        self
    }

    /// Aborts in-flight resolutions when `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn start(&self) -> StartPosition {
        self.start
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Resolves the start offset for `partition`, keeping the intermediate values.
    ///
    /// # Errors
    ///
    /// Any anchor, bounds, oracle or probe failure; see [`SeekError`](crate::SeekError). The
    /// caller decides whether to retry, switch to another [`StartPosition`]
    /// or give up.
    pub async fn resolve(&self, partition: &TopicPartition) -> Result<Resolution> {
        let probe = RecordTimeProbe::new(self.log)
            .with_deadline(self.probe_deadline)
            .with_cancellation(self.cancel.clone());

        let anchor = AnchorResolver::new(self.coordinator, &probe)
            .resolve(self.start, partition)
            .await?;
        let target = anchor.time.saturating_sub(self.window);
        let offset = OffsetSeeker::new(self.log, &probe)
            .seek(partition, target)
            .await?;

        tracing::info!(
            partition = %partition,
            start = %self.start,
            window = ?self.window,
            anchor = %anchor.position,
            target = %target,
            offset = %offset,
            "resolved time window start offset"
        );
        Ok(Resolution {
            anchor,
            target,
            offset,
        })
    }
}

impl<L: LogClient, C: Coordinator> StartOffsetSource for TimeWindow<'_, L, C> {
    async fn start_offset(&self, partition: &TopicPartition) -> Result<Offset> {
        self.resolve(partition).await.map(|resolution| resolution.offset)
    }
}

/// Resolves where a time-window consumer should start reading.
///
/// This is the single entry point for callers that do not keep a
/// [`TimeWindow`] around.
pub async fn resolve_start_offset<L: LogClient, C: Coordinator>(
    log: &L,
    coordinator: &C,
    config: &TimeWindowConfig,
    cancel: CancellationToken,
) -> Result<Offset> {
    TimeWindow::from_config(log, coordinator, config)
        .with_cancellation(cancel)
        .resolve(&config.partition)
        .await
        .map(|resolution| resolution.offset)
}
