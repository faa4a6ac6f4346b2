//! # rewind
//!
//! Start a partition consumer a fixed span of time in the past.
//!
//! Given one partition of an append-only log whose records carry
//! non-decreasing timestamps, `rewind` finds the offset whose record is the
//! latest one at or before "anchor time minus window". The anchor is either
//! the consumer group's committed offset or the partition head.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          TimeWindow                          │
//! │  ┌────────────────┐   ┌──────────────┐   ┌────────────────┐  │
//! │  │ AnchorResolver │ → │ target = t-W │ → │  OffsetSeeker  │  │
//! │  └───────┬────────┘   └──────────────┘   └───────┬────────┘  │
//! │          └─────────── RecordTimeProbe ───────────┘           │
//! └──────────────────────────────────────────────────────────────┘
//!        │ Coordinator                        │ LogClient
//! ```
//!
//! Resolution is sequential: every probe waits for the previous one. The
//! only suspension point is the probe's race between a record arriving, its
//! deadline, and the caller's cancellation token.
//!
//! # Quick Start
//!
//! ```
//! use std::time::Duration;
//!
//! use rewind::{MemoryLog, resolve_start_offset};
//! use rewind_types::{Offset, StartPosition, TimeWindowConfig, Timestamp, TopicPartition};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), rewind::SeekError> {
//! let partition = TopicPartition::new("events", 0);
//! let log = MemoryLog::new();
//! for i in 0..1000 {
//!     log.append(&partition, Timestamp::from_millis(i * 1_000), "payload");
//! }
//!
//! let config = TimeWindowConfig::new(
//!     StartPosition::Newest,
//!     Duration::from_secs(100),
//!     partition,
//! );
//! let offset = resolve_start_offset(&log, &log, &config, CancellationToken::new()).await?;
//! assert_eq!(offset, Offset::new(899));
//! # Ok(())
//! # }
//! ```

mod anchor;
mod client;
mod error;
mod memory;
mod probe;
mod seeker;
mod window;

pub use anchor::{Anchor, AnchorResolver};
pub use client::{Coordinator, LogClient, PointRead};
pub use error::{LogError, Result, SeekError};
pub use memory::{MemoryLog, MemoryPointRead, OracleMode};
pub use probe::RecordTimeProbe;
pub use seeker::{OffsetSeeker, SearchState};
pub use window::{Resolution, StartOffsetSource, TimeWindow, resolve_start_offset};

pub use rewind_types::{
    Bounds, LogRecord, Offset, ReadPosition, StartPosition, TimeWindowConfig, Timestamp,
    TopicPartition,
};
