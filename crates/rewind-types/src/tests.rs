//! Unit tests for rewind-types

use std::time::Duration;

use proptest::prelude::*;
use test_case::test_case;

use crate::{Bounds, Offset, ReadPosition, StartPosition, Timestamp, TopicPartition};

// ============================================================================
// Offset Tests
// ============================================================================

#[test_case(0, 1000 => 500; "wide range")]
#[test_case(7, 8 => 7; "adjacent floors to lower")]
#[test_case(9, 9 => 9; "point")]
#[test_case(8, 7 => 7; "argument order does not matter")]
#[test_case(u64::MAX - 1, u64::MAX => u64::MAX - 1; "no overflow near max")]
fn offset_midpoint(a: u64, b: u64) -> u64 {
    Offset::midpoint(Offset::new(a), Offset::new(b)).as_u64()
}

proptest! {
    /// Property: the midpoint of two distinct offsets is strictly below the larger one
    #[test]
    fn prop_midpoint_strictly_inside(a in any::<u64>(), b in any::<u64>()) {
        let mid = Offset::midpoint(Offset::new(a), Offset::new(b));
        let (lo, hi) = (a.min(b), a.max(b));
        prop_assert!(mid.as_u64() >= lo);
        prop_assert!(mid.as_u64() <= hi);
        if lo != hi {
            prop_assert!(mid.as_u64() < hi);
        }
    }
}

// ============================================================================
// Bounds Tests
// ============================================================================

#[test]
fn bounds_clamp_inverted_snapshot() {
    let bounds = Bounds::new(Offset::new(50), Offset::new(10));
    assert!(bounds.is_empty());
    assert_eq!(bounds.oldest(), Offset::new(50));
    assert_eq!(bounds.newest(), Offset::new(50));
}

#[test]
fn bounds_strictly_contains_excludes_edges() {
    let bounds = Bounds::new(Offset::new(0), Offset::new(1000));
    assert!(!bounds.strictly_contains(Offset::new(0)));
    assert!(bounds.strictly_contains(Offset::new(1)));
    assert!(bounds.strictly_contains(Offset::new(999)));
    assert!(!bounds.strictly_contains(Offset::new(1000)));
    assert_eq!(bounds.len(), 1000);
    assert_eq!(bounds.midpoint(), Offset::new(500));
    assert_eq!(bounds.to_string(), "[0, 1000)");
}

// ============================================================================
// Timestamp Tests
// ============================================================================

#[test]
fn timestamp_millis_round_trip_truncates_nanos() {
    let ts = Timestamp::from_nanos(1_234_567_891);
    assert_eq!(ts.as_millis(), 1_234);
    assert_eq!(Timestamp::from_millis(1_234).as_nanos(), 1_234_000_000);
}

#[test]
fn timestamp_window_arithmetic() {
    let base = Timestamp::from_millis(1_700_000_000_000);
    let later = base.saturating_add(Duration::from_secs(999));
    assert_eq!(
        later.saturating_sub(Duration::from_secs(100)),
        base.saturating_add(Duration::from_secs(899))
    );
    assert_eq!(base.saturating_sub(Duration::ZERO), base);
    assert_eq!(base.saturating_sub(Duration::MAX), Timestamp::EPOCH);
}

#[test]
fn timestamp_display() {
    assert_eq!(Timestamp::from_nanos(5_000_000_007).to_string(), "5.000000007");
}

// ============================================================================
// Display / Serde Tests
// ============================================================================

#[test]
fn topic_partition_display() {
    assert_eq!(TopicPartition::new("events", 3).to_string(), "events/3");
}

#[test]
fn read_position_display() {
    assert_eq!(ReadPosition::At(Offset::new(42)).to_string(), "42");
    assert_eq!(ReadPosition::Newest.to_string(), "newest");
}

#[test_case("\"committed\"" => StartPosition::Committed; "committed")]
#[test_case("\"newest\"" => StartPosition::Newest; "newest")]
fn start_position_deserializes(json: &str) -> StartPosition {
    serde_json::from_str(json).unwrap()
}

#[test]
fn start_position_rejects_unknown_values() {
    let result: Result<StartPosition, _> = serde_json::from_str("\"oldest\"");
    assert!(result.is_err());
}
