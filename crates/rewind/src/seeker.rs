//! Time-to-offset binary search.
//!
//! Given a target time, [`OffsetSeeker`] finds the latest offset whose record
//! time is at or before the target. Offsets are dense and record times are
//! non-decreasing, so this is a lower-bound bisection over `[oldest, newest)`
//! driven by single-record probes.
//!
//! The log's timestamp oracle supplies the first candidate. Its answer is only
//! a hint: every probe is still compared against the target, so a poor hint
//! costs probes but never changes the result.
//!
//! # Termination
//!
//! The candidate always lies in `[lower, upper)` once the search starts, and
//! each probe moves one edge onto the candidate. The open interval therefore
//! shrinks on every iteration and the loop stops as soon as the candidate
//! lands on an edge, which happens at the latest when `upper - lower == 1`.
//! A search over `n` offsets issues at most `ceil(log2(n)) + 1` probes.

use rewind_types::{Bounds, Offset, Timestamp, TopicPartition};

use crate::{LogClient, LogError, RecordTimeProbe, Result, SeekError};

/// Bisection state: `(lower, upper, candidate)`.
///
/// # Invariants
///
/// - `lower <= candidate <= upper`
/// - `lower` is the oldest offset or a probed offset with time `<= target`
/// - `upper` is the exclusive tail or a probed offset with time `> target`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchState {
    lower: Offset,
    upper: Offset,
    candidate: Offset,
}

impl SearchState {
    /// Starts a search over `bounds`.
    ///
    /// The hint is used only when it lies strictly inside the bounds; any
    /// other hint, or none, starts from the midpoint.
    pub fn new(bounds: Bounds, hint: Option<Offset>) -> Self {
        let candidate = match hint {
            Some(hint) if bounds.strictly_contains(hint) => hint,
            _ => bounds.midpoint(),
        };
        Self {
            lower: bounds.oldest(),
            upper: bounds.newest(),
            candidate,
        }
    }

    pub fn lower(&self) -> Offset {
        self.lower
    }

    pub fn upper(&self) -> Offset {
        self.upper
    }

    pub fn candidate(&self) -> Offset {
        self.candidate
    }

    /// True once the candidate sits on an edge and cannot be narrowed further.
    pub fn is_converged(&self) -> bool {
        self.candidate == self.lower || self.candidate == self.upper
    }

    /// Narrows the interval using the probed time of the current candidate.
    pub fn observe(&mut self, candidate_time: Timestamp, target: Timestamp) {
        debug_assert!(!self.is_converged(), "observe called on a converged search");
        let width_before = self.upper.as_u64() - self.lower.as_u64();

        if candidate_time > target {
            self.upper = self.candidate;
            self.candidate = Offset::midpoint(self.lower, self.candidate);
        } else {
            self.lower = self.candidate;
            self.candidate = Offset::midpoint(self.candidate, self.upper);
        }

        debug_assert!(self.lower <= self.candidate && self.candidate <= self.upper);
        debug_assert!(self.upper.as_u64() - self.lower.as_u64() < width_before);
    }
}

/// Finds the offset to start reading from for a target time.
#[derive(Debug)]
pub struct OffsetSeeker<'a, L> {
    log: &'a L,
    probe: &'a RecordTimeProbe<'a, L>,
}

impl<'a, L: LogClient> OffsetSeeker<'a, L> {
    pub fn new(log: &'a L, probe: &'a RecordTimeProbe<'a, L>) -> Self {
        Self { log, probe }
    }

    /// Returns the latest offset whose record time is at or before `target`.
    ///
    /// Returns the oldest offset when every retained record is newer than the
    /// target, and the oldest offset of an empty partition without probing.
    ///
    /// # Errors
    ///
    /// Bounds lookup failures, oracle failures other than an out-of-range
    /// time, and any probe failure abort the search. No partial result is
    /// returned.
    pub async fn seek(&self, partition: &TopicPartition, target: Timestamp) -> Result<Offset> {
        let bounds = self.bounds(partition).await?;

        // Without an interior offset no hint can be used.
        let hint = if bounds.len() < 2 {
            None
        } else {
            self.hint(partition, target).await?
        };

        let mut state = SearchState::new(bounds, hint);
        let mut probes = 0u32;
        while !state.is_converged() {
            let time = self
                .probe
                .time_at(partition, state.candidate().into())
                .await?;
            state.observe(time, target);
            probes += 1;
            tracing::trace!(
                partition = %partition,
                lower = %state.lower(),
                upper = %state.upper(),
                candidate = %state.candidate(),
                "narrowed search"
            );
        }

        tracing::debug!(
            partition = %partition,
            bounds = %bounds,
            hint = ?hint,
            target = %target,
            offset = %state.candidate(),
            probes,
            "seek converged"
        );
        Ok(state.candidate())
    }

    async fn bounds(&self, partition: &TopicPartition) -> Result<Bounds> {
        let to_err = |source| SeekError::Bounds {
            partition: partition.clone(),
            source,
        };
        let oldest = self.log.oldest_offset(partition).await.map_err(to_err)?;
        let newest = self.log.newest_offset(partition).await.map_err(to_err)?;
        if newest < oldest {
            tracing::warn!(partition = %partition, oldest = %oldest, newest = %newest, "bounds moved between lookups, treating partition as empty");
        }
        Ok(Bounds::new(oldest, newest))
    }

    async fn hint(&self, partition: &TopicPartition, target: Timestamp) -> Result<Option<Offset>> {
        match self.log.offset_near(partition, target).await {
            Ok(offset) => Ok(Some(offset)),
            Err(LogError::TimestampOutOfRange { .. }) => {
                tracing::debug!(partition = %partition, target = %target, "timestamp outside oracle range, starting from midpoint");
                Ok(None)
            }
            Err(source) => Err(SeekError::TimestampLookup {
                partition: partition.clone(),
                target,
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use test_case::test_case;

    use super::*;

    fn bounds(oldest: u64, newest: u64) -> Bounds {
        Bounds::new(Offset::new(oldest), Offset::new(newest))
    }

    /// Runs the bisection against an in-memory time function.
    fn run(
        bounds: Bounds,
        hint: Option<Offset>,
        target: Timestamp,
        time_of: impl Fn(Offset) -> Timestamp,
    ) -> (Offset, u32) {
        let mut state = SearchState::new(bounds, hint);
        let mut probes = 0;
        while !state.is_converged() {
            state.observe(time_of(state.candidate()), target);
            probes += 1;
        }
        (state.candidate(), probes)
    }

    fn linear(offset: Offset) -> Timestamp {
        Timestamp::from_millis(offset.as_u64() * 1_000)
    }

    fn ceil_log2(n: u64) -> u32 {
        if n <= 1 { 0 } else { 64 - (n - 1).leading_zeros() }
    }

    #[test_case(None; "midpoint start")]
    #[test_case(Some(Offset::new(896)); "segment hint")]
    #[test_case(Some(Offset::new(899)); "exact hint")]
    #[test_case(Some(Offset::new(5_000)); "hint beyond tail")]
    #[test_case(Some(Offset::new(0)); "hint on lower edge")]
    fn finds_window_start(hint: Option<Offset>) {
        let (offset, _) = run(bounds(0, 1000), hint, Timestamp::from_millis(899_000), linear);
        assert_eq!(offset, Offset::new(899));
    }

    #[test]
    fn out_of_range_fallback_starts_at_midpoint() {
        let state = SearchState::new(bounds(0, 1000), None);
        assert_eq!(state.candidate(), Offset::new(500));
    }

    #[test]
    fn empty_and_point_ranges_are_converged() {
        assert!(SearchState::new(bounds(7, 7), None).is_converged());
        let single = SearchState::new(bounds(7, 8), Some(Offset::new(7)));
        assert!(single.is_converged());
        assert_eq!(single.candidate(), Offset::new(7));
    }

    #[test]
    fn target_before_first_record_returns_oldest() {
        let (offset, _) = run(bounds(100, 200), None, Timestamp::from_millis(1), linear);
        assert_eq!(offset, Offset::new(100));
    }

    #[test]
    fn target_after_last_record_returns_last() {
        let (offset, _) = run(bounds(100, 200), None, Timestamp::from_millis(10_000_000), linear);
        assert_eq!(offset, Offset::new(199));
    }

    #[test]
    fn duplicate_timestamps_resolve_to_last_duplicate() {
        // Offsets 10..20 share one timestamp.
        let time_of = |o: Offset| {
            let o = o.as_u64();
            Timestamp::from_millis(if (10..20).contains(&o) { 10 } else { o })
        };
        let (offset, _) = run(bounds(0, 40), None, Timestamp::from_millis(10), time_of);
        assert_eq!(offset, Offset::new(19));
    }

    proptest! {
        /// Property: result o satisfies time(o) <= target < time(o + 1), or is an edge
        #[test]
        fn prop_lower_bound_correctness(
            steps in prop::collection::vec(0u64..5, 1..300),
            oldest in 0u64..1_000,
            target in 0u64..1_500,
            hint in prop::option::of(0u64..2_000),
        ) {
            // Non-decreasing times built from random increments.
            let times: Vec<u64> = steps
                .iter()
                .scan(0u64, |acc, step| { *acc += step; Some(*acc) })
                .collect();
            let newest = oldest + times.len() as u64;
            let time_of = |o: Offset| Timestamp::from_millis(times[(o.as_u64() - oldest) as usize]);
            let target = Timestamp::from_millis(target);

            let (offset, _) = run(bounds(oldest, newest), hint.map(Offset::new), target, time_of);

            prop_assert!(offset.as_u64() >= oldest && offset.as_u64() < newest);
            if time_of(offset) <= target {
                if offset.as_u64() + 1 < newest {
                    prop_assert!(time_of(offset.next()) > target);
                }
            } else {
                prop_assert_eq!(offset.as_u64(), oldest);
            }
        }

        /// Property: the search terminates within ceil(log2(width)) + 1 probes
        #[test]
        fn prop_convergence_bound(
            oldest in 0u64..1_000_000,
            width in 0u64..1_000_000,
            target in 0u64..3_000_000,
            hint in prop::option::of(0u64..3_000_000),
        ) {
            let b = bounds(oldest, oldest + width);
            let target = Timestamp::from_millis(target * 1_000);
            let (_, probes) = run(b, hint.map(Offset::new), target, linear);
            prop_assert!(probes <= ceil_log2(width) + 1, "probes={} width={}", probes, width);
        }

        /// Property: a missing hint converges to the same offset as any hint
        #[test]
        fn prop_hint_does_not_bias_result(
            width in 1u64..10_000,
            target in 0u64..12_000,
            hint in 0u64..12_000,
        ) {
            let b = bounds(0, width);
            let target = Timestamp::from_millis(target * 1_000);
            let (without, _) = run(b, None, target, linear);
            let (with, _) = run(b, Some(Offset::new(hint)), target, linear);
            prop_assert_eq!(without, with);
        }
    }
}
