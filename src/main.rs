//! Demo binary exchanging packets between two packs on an in-process bus.
//!
//! The sending pack announces itself, registers an entity, and sends one
//! padded packet large enough to be fragmented. The receiving pack prints
//! what it learnt.

mod cli;

use std::{cell::RefCell, rc::Rc};

use clap::Parser;
use packnet::{
    ANY_PACKET,
    FragmentArithmetic,
    KindResolution,
    MemoryBus,
    Pack,
    Packet,
    Socket,
    SocketConfig,
    listener,
};
use serde_json::{Map, Value};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Applications embedding the library should install their own subscriber.
    tracing_subscriber::fmt::init();

    let cli = cli::Cli::parse();
    let arithmetic = if cli.corrected {
        FragmentArithmetic::Corrected
    } else {
        FragmentArithmetic::Legacy
    };
    let config = SocketConfig::default()
        .with_fragment_size(cli.fragment_size)
        .with_arithmetic(arithmetic)
        .with_kind_resolution(KindResolution::KeepPacketId);

    let bus = MemoryBus::new();
    let receiver = Socket::with_config(
        bus.endpoint(),
        Pack::new("beta", "Beta", "bt"),
        config,
    )?;
    let received = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&received);
    receiver.subscribe(
        ANY_PACKET,
        listener(move |event: &Packet| {
            if let Some(packet) = event.inner_payload()? {
                sink.borrow_mut().push(packet);
            }
            Ok(())
        }),
    );

    let sender = Socket::with_config(
        bus.endpoint(),
        Pack::new(cli.name.as_str(), "Demo pack", "dm").with_packets(["hello"]),
        config,
    )?;
    bus.pump();
    sender.register_entities(vec!["cow".into()])?;
    bus.pump();

    let mut fields = Map::new();
    fields.insert("text".into(), Value::String("x".repeat(cli.payload_size)));
    sender.send(Packet::generic("hello", fields).with_packet_id("hello"))?;

    let mut fragments = bus.drain();
    println!("payload sent as {} message(s)", fragments.len());
    if cli.reverse {
        fragments.reverse();
    }
    for envelope in fragments {
        bus.inject(envelope);
    }
    bus.pump();

    if let Some(pack) = receiver.get_pack(&cli.name) {
        println!(
            "{} knows {} (prefix {}, packets {:?}, entities {:?})",
            receiver.pack().identifier,
            pack.identifier,
            pack.prefix,
            pack.packets,
            pack.entities
        );
    }
    let hello = received
        .borrow()
        .iter()
        .filter(|packet| packet.identifier() == Some("hello"))
        .count();
    println!(
        "received {} packet(s), {hello} on `hello`, {} reassembly(ies) pending",
        received.borrow().len(),
        receiver.pending_reassemblies()
    );

    Ok(())
}
