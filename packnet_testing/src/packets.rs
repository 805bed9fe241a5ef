//! Builders for packs, packets, and connected sockets used across tests.

use std::rc::Rc;

use packnet::{MemoryBus, MemoryTransport, Pack, Packet, Socket, SocketConfig, wire_len};
use serde_json::{Map, Value};

/// The "Pack One" description used throughout the scenarios.
#[must_use]
pub fn pack_one() -> Pack {
    Pack::new("pk1", "Pack One", "p1")
        .with_description("d")
        .with_version(1)
        .with_packets(["hello"])
}

/// An application packet under `identifier` whose serialisation is exactly
/// `units` long.
///
/// # Panics
///
/// Panics if `units` is too small to hold the packet skeleton.
#[must_use]
pub fn packet_of_len(identifier: &str, packet_id: &str, units: usize) -> Packet {
    let skeleton = sized(identifier, packet_id, String::new());
    let overhead = wire_len(&skeleton.to_json().expect("encode skeleton"));
    let padding = units
        .checked_sub(overhead)
        .expect("requested length below packet overhead");
    let packet = sized(identifier, packet_id, "x".repeat(padding));
    debug_assert_eq!(
        wire_len(&packet.to_json().expect("encode")),
        units,
        "padding is ASCII so units grow one per character"
    );
    packet
}

fn sized(identifier: &str, packet_id: &str, body: String) -> Packet {
    let mut fields = Map::new();
    fields.insert("body".into(), Value::String(body));
    Packet::generic(identifier, fields).with_packet_id(packet_id)
}

/// Two sockets sharing one bus, with the construction traffic delivered.
pub struct Pair {
    pub bus: MemoryBus,
    pub sender: Rc<Socket<MemoryTransport>>,
    pub receiver: Rc<Socket<MemoryTransport>>,
}

impl Pair {
    /// Connect `sender_pack` and a receiving pack using `config` for both.
    ///
    /// # Panics
    ///
    /// Panics if either socket fails to announce itself.
    #[must_use]
    pub fn connect(sender_pack: Pack, config: SocketConfig) -> Self {
        let bus = MemoryBus::new();
        let receiver = Socket::with_config(
            bus.endpoint(),
            Pack::new("observer", "Observer", "ob"),
            config,
        )
        .expect("receiver socket");
        let sender = Socket::with_config(bus.endpoint(), sender_pack, config).expect("sender socket");
        bus.pump();
        Self {
            bus,
            sender,
            receiver,
        }
    }
}
