//! Unit tests for the socket's send path, reassembly loop, and built-in
//! registry handling.

use std::{cell::RefCell, num::NonZeroUsize, rc::Rc};

use rstest::{fixture, rstest};
use serde_json::{Map, json};

use super::{ItemsTarget, Socket, SocketConfig, SocketError};
use crate::{
    emitter::listener,
    fragment::{FragmentArithmetic, Fragmenter, ReassemblyError, wire_len},
    pack::Pack,
    packet::{ANY_PACKET, KindResolution, Packet, PacketError},
    transport::{MemoryBus, MemoryTransport},
};

struct Harness {
    bus: MemoryBus,
    socket: Rc<Socket<MemoryTransport>>,
}

fn harness_with(config: SocketConfig) -> Harness {
    let bus = MemoryBus::new();
    let pack = Pack::new("local", "Local", "lc").with_packets(["ping"]);
    let socket = Socket::with_config(bus.endpoint(), pack, config).expect("socket");
    bus.drain();
    Harness { bus, socket }
}

#[fixture]
fn harness() -> Harness { harness_with(SocketConfig::default()) }

fn discovery(identifier: &str) -> Packet {
    Packet::from_value(json!({
        "identifier": identifier,
        "name": "Pack One",
        "description": "d",
        "version": 1,
        "prefix": "p1",
        "packets": ["hello"]
    }))
    .expect("discovery")
}

fn padded(identifier: &str, units: usize) -> Packet {
    let mut fields = Map::new();
    fields.insert("text".into(), json!("w".repeat(units)));
    Packet::generic(identifier, fields)
}

#[test]
fn construction_announces_local_pack() {
    let bus = MemoryBus::new();
    let socket = Socket::new(bus.endpoint(), Pack::new("local", "Local", "lc")).expect("socket");

    let history = bus.history();
    assert!(!history.is_empty());
    assert!(history.iter().all(|envelope| envelope.channel == "global:discovery"));
    assert_eq!(socket.pack().identifier, "local");
}

#[rstest]
fn small_packet_is_sent_unchanged_on_prefixed_channel(harness: Harness) {
    let packet = padded("hello", 10);
    let expected = packet.to_json().expect("encode");

    harness.socket.send(packet).expect("send");

    let sent = harness.bus.drain();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].channel, "lc:hello");
    assert_eq!(sent[0].message, expected);
}

#[rstest]
fn reserved_packet_id_selects_global_channel(harness: Harness) {
    harness
        .socket
        .register_entities(vec!["cow".into()])
        .expect("send");

    let sent = harness.bus.drain();
    assert_eq!(sent[0].channel, "global:entities");
}

#[test]
fn large_packet_is_fragmented_on_one_channel() {
    let harness =
        harness_with(SocketConfig::default().with_kind_resolution(KindResolution::KeepPacketId));
    let packet = padded("hello", 300).with_packet_id("chat");
    let original = packet.to_json().expect("encode");

    harness.socket.send(packet).expect("send");

    let sent = harness.bus.drain();
    assert!(sent.len() > 1);
    let mut data = Vec::new();
    for envelope in &sent {
        assert_eq!(envelope.channel, "lc:hello");
        let fragment = Packet::from_json(&envelope.message).expect("fragment json");
        assert_eq!(fragment.packet_id(), Some("chat"));
        let body = fragment.into_fragment().expect("fragment");
        assert!(wire_len(&body.data) <= 128);
        data.push(body.data);
    }
    assert_eq!(data.concat(), original);
}

#[rstest]
fn large_registry_packet_gets_reserved_id_before_fragmenting(harness: Harness) {
    let ids: Vec<String> = (0..40).map(|n| format!("entity_{n}")).collect();
    let packet = Packet::from_value(json!({"source": "local", "entityIds": ids})).expect("packet");

    harness.socket.send(packet).expect("send");

    let sent = harness.bus.drain();
    assert!(sent.len() > 1);
    assert!(sent.iter().all(|envelope| envelope.channel == "global:entities"));
    let first = Packet::from_json(&sent[0].message).expect("fragment");
    assert_eq!(first.packet_id(), Some("global:entities"));
}

#[rstest]
fn unresolvable_large_packet_is_never_transmitted(harness: Harness) {
    let err = harness
        .socket
        .send(padded("hello", 300))
        .expect_err("no shape and no packetId");

    assert!(matches!(
        err,
        SocketError::Packet(PacketError::UnresolvablePacketKind)
    ));
    assert_eq!(harness.bus.queued(), 0);
}

#[rstest]
fn large_packet_with_own_id_is_rejected_by_default(harness: Harness) {
    let err = harness
        .socket
        .send(padded("hello", 300).with_packet_id("chat"))
        .expect_err("application ids are not resolvable by default");

    assert!(matches!(
        err,
        SocketError::Packet(PacketError::UnresolvablePacketKind)
    ));
    assert_eq!(harness.bus.queued(), 0);
    assert!(
        harness
            .bus
            .history()
            .iter()
            .all(|envelope| envelope.channel == "global:discovery")
    );
}

#[rstest]
fn packet_without_identifier_or_id_is_unroutable(harness: Harness) {
    let packet = Packet::from_value(json!({"text": "hi"})).expect("packet");
    assert!(matches!(
        harness.socket.send(packet),
        Err(SocketError::Unroutable)
    ));
}

#[rstest]
fn publishes_under_identifier_and_any_packet(harness: Harness) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    for key in ["hello", ANY_PACKET] {
        let seen = Rc::clone(&seen);
        harness.socket.subscribe(
            key,
            listener(move |packet: &Packet| {
                seen.borrow_mut().push(packet.identifier().map(str::to_owned));
                Ok(())
            }),
        );
    }

    harness
        .socket
        .receive("p1:hello", "{\"identifier\":\"hello\",\"text\":\"hi\"}")
        .expect("receive");

    assert_eq!(
        *seen.borrow(),
        [Some("hello".to_owned()), Some(ANY_PACKET.to_owned())]
    );
}

#[rstest]
fn payload_without_identifier_is_published_under_channel(harness: Harness) {
    let seen = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&seen);
    harness.socket.subscribe(
        "p1:hello",
        listener(move |_: &Packet| {
            *counter.borrow_mut() += 1;
            Ok(())
        }),
    );

    harness
        .socket
        .receive("p1:hello", "{\"text\":\"hi\"}")
        .expect("receive");

    assert_eq!(*seen.borrow(), 1);
}

#[rstest]
fn failing_listener_propagates_and_skips_registry_update(harness: Harness) {
    harness
        .socket
        .subscribe("pk1", listener(|_: &Packet| Err("rejected".into())));

    let err = harness
        .socket
        .on_message("global:discovery", discovery("pk1"))
        .expect_err("listener failure propagates");

    assert!(matches!(err, SocketError::Listener(_)));
    assert!(harness.socket.get_pack("pk1").is_none());
}

#[rstest]
fn discovery_on_non_reserved_channel_does_not_register(harness: Harness) {
    harness
        .socket
        .on_message("p1:pk1", discovery("pk1"))
        .expect("receive");
    assert!(harness.socket.registry().is_empty());
}

#[rstest]
#[case::inherited(ItemsTarget::Entities, vec!["sword"], vec![])]
#[case::items_list(ItemsTarget::Items, vec![], vec!["sword"])]
fn item_registrations_follow_configured_target(
    #[case] target: ItemsTarget,
    #[case] entities: Vec<&str>,
    #[case] items: Vec<&str>,
) {
    let harness = harness_with(SocketConfig::default().with_items_target(target));
    harness
        .socket
        .on_message("global:discovery", discovery("pk1"))
        .expect("discovery");

    harness
        .socket
        .on_message("global:items", Packet::items("pk1", vec!["sword".into()]))
        .expect("items");

    let pack = harness.socket.get_pack("pk1").expect("registered");
    assert_eq!(pack.entities, entities);
    assert_eq!(pack.items, items);
}

#[rstest]
fn corrupt_reassembly_is_reported_and_discarded(harness: Harness) {
    for (index, data) in [(0, "{\"text\":"), (1, "oops")] {
        let raw = json!({
            "isFragment": true,
            "fragmentCount": 2,
            "splitIndex": index,
            "data": data
        })
        .to_string();
        let result = harness.socket.receive("p1:hello", &raw);
        if index == 1 {
            assert!(matches!(
                result,
                Err(SocketError::Reassembly(ReassemblyError::InvalidPayload { .. }))
            ));
        } else {
            result.expect("first fragment buffers");
        }
    }
    assert_eq!(harness.socket.pending_reassemblies(), 0);
}

#[rstest]
fn nested_fragments_are_unwrapped_iteratively(harness: Harness) {
    let inner = padded("hello", 40);
    let fragmenter = Fragmenter::new(
        NonZeroUsize::new(16).expect("non-zero"),
        FragmentArithmetic::Corrected,
    );
    let level_one = fragmenter.fragment(Some("chat"), &inner.to_json().expect("encode"));
    assert!(level_one.len() > 1);

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    harness.socket.subscribe(
        "hello",
        listener(move |packet: &Packet| {
            sink.borrow_mut().push(packet.clone());
            Ok(())
        }),
    );

    for fragment in &level_one {
        let wrapper = json!({
            "isFragment": true,
            "fragmentCount": 1,
            "splitIndex": 0,
            "data": fragment.to_json().expect("encode")
        })
        .to_string();
        harness
            .socket
            .receive("p1:hello", &wrapper)
            .expect("receive");
    }

    assert_eq!(*seen.borrow(), [inner]);
    assert_eq!(harness.socket.pending_reassemblies(), 0);
}
