//! Tests for inbound buffering, ordering, and eviction.

use std::{
    num::NonZeroUsize,
    time::{Duration, Instant},
};

use rstest::{fixture, rstest};

use crate::{
    fragment::{
        FragmentArithmetic,
        FragmentIndex,
        Fragmenter,
        ReassemblyConfig,
        ReassemblyError,
        Reassembler,
    },
    packet::FragmentPacket,
};

fn fragment(count: usize, index: i64, data: &str) -> FragmentPacket {
    FragmentPacket::new(count, FragmentIndex::new(index), data)
}

#[fixture]
fn reassembler() -> Reassembler { Reassembler::new(ReassemblyConfig::unbounded()) }

#[rstest]
fn completes_once_advertised_count_arrives(mut reassembler: Reassembler) {
    assert!(reassembler.push("p1:hello", fragment(2, -1, "{\"a\":")).is_none());
    assert_eq!(reassembler.buffered_len(), 1);

    let complete = reassembler
        .push("p1:hello", fragment(2, 0, "1}"))
        .expect("second fragment completes");

    assert_eq!(complete.key(), "p1:hello");
    assert_eq!(complete.text(), "{\"a\":1}");
    assert_eq!(reassembler.buffered_len(), 0);
}

#[rstest]
fn orders_fragments_by_split_index(mut reassembler: Reassembler) {
    assert!(reassembler.push("k", fragment(3, 1, "c")).is_none());
    assert!(reassembler.push("k", fragment(3, -1, "a")).is_none());

    let complete = reassembler.push("k", fragment(3, 0, "b")).expect("complete");
    assert_eq!(complete.text(), "abc");
}

#[rstest]
fn keeps_channels_separate(mut reassembler: Reassembler) {
    assert!(reassembler.push("one", fragment(2, 0, "1")).is_none());
    assert!(reassembler.push("two", fragment(2, 0, "2")).is_none());

    assert_eq!(reassembler.buffered_len(), 2);
    assert!(reassembler.is_pending("one"));
    assert!(reassembler.is_pending("two"));
}

#[rstest]
fn reassembles_fragmenter_output_in_reverse(mut reassembler: Reassembler) {
    let text = "{\"identifier\":\"hello\",\"body\":\"".to_owned() + &"q".repeat(280) + "\"}";
    let fragmenter = Fragmenter::new(
        NonZeroUsize::new(128).expect("non-zero"),
        FragmentArithmetic::Legacy,
    );
    let mut fragments = fragmenter.fragment(Some("hello"), &text);
    fragments.reverse();

    let mut completed = None;
    for packet in fragments {
        let body = packet.into_fragment().expect("fragment");
        completed = reassembler.push("p1:hello", body);
    }

    assert_eq!(completed.expect("complete").text(), text);
}

#[rstest]
fn invalid_payload_is_reported_after_entry_is_dropped(mut reassembler: Reassembler) {
    assert!(reassembler.push("k", fragment(2, 0, "{not")).is_none());
    let complete = reassembler.push("k", fragment(2, 1, " json")).expect("complete");

    let err = complete.decode().expect_err("invalid JSON must be rejected");
    assert!(matches!(err, ReassemblyError::InvalidPayload { ref key, .. } if key == "k"));
    assert_eq!(reassembler.buffered_len(), 0);
}

#[test]
fn purges_entries_older_than_timeout() {
    let mut reassembler = Reassembler::new(
        ReassemblyConfig::unbounded().with_timeout(Some(Duration::from_secs(5))),
    );
    let start = Instant::now();
    assert!(reassembler.push_at("stale", fragment(2, 0, "x"), start).is_none());

    let evicted = reassembler.purge_expired_at(start + Duration::from_secs(5));

    assert_eq!(evicted, ["stale"]);
    assert_eq!(reassembler.buffered_len(), 0);
}

#[test]
fn late_fragment_after_eviction_starts_fresh_entry() {
    let mut reassembler = Reassembler::new(
        ReassemblyConfig::unbounded().with_timeout(Some(Duration::from_secs(5))),
    );
    let start = Instant::now();
    assert!(reassembler.push_at("k", fragment(2, 0, "old"), start).is_none());

    let late = start + Duration::from_secs(6);
    assert!(reassembler.push_at("k", fragment(2, 1, "new"), late).is_none());

    let complete = reassembler
        .push_at("k", fragment(2, 0, "fresh"), late)
        .expect("fresh entry completes");
    assert_eq!(complete.text(), "freshnew");
}

#[test]
fn evicts_oldest_entry_when_pending_limit_is_reached() {
    let mut reassembler = Reassembler::new(
        ReassemblyConfig::unbounded().with_max_pending(NonZeroUsize::new(2)),
    );
    let start = Instant::now();
    assert!(reassembler.push_at("first", fragment(2, 0, "a"), start).is_none());
    assert!(
        reassembler
            .push_at("second", fragment(2, 0, "b"), start + Duration::from_millis(1))
            .is_none()
    );
    assert!(
        reassembler
            .push_at("third", fragment(2, 0, "c"), start + Duration::from_millis(2))
            .is_none()
    );

    assert_eq!(reassembler.buffered_len(), 2);
    assert!(!reassembler.is_pending("first"));
    assert!(reassembler.is_pending("second"));
    assert!(reassembler.is_pending("third"));
}

#[rstest]
fn unbounded_config_never_evicts(mut reassembler: Reassembler) {
    let start = Instant::now();
    assert!(reassembler.push_at("k", fragment(2, 0, "a"), start).is_none());

    let evicted = reassembler.purge_expired_at(start + Duration::from_secs(86_400));

    assert!(evicted.is_empty());
    assert!(reassembler.is_pending("k"));
}
