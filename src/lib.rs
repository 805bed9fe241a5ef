#![doc(html_root_url = "https://docs.rs/packnet/latest")]
//! Public API for the `packnet` library.
//!
//! `packnet` exchanges JSON packets between independent packs over a
//! transport that only carries short, channel-tagged text messages. It
//! fragments packets that exceed the transport ceiling, reassembles them on
//! arrival, tracks peers through discovery and registry packets, and routes
//! completed packets to listeners by identifier.

pub mod emitter;
pub mod fragment;
pub mod pack;
pub mod packet;
pub mod socket;
pub mod transport;

pub use emitter::{BoxError, Emitter, Identified, Listener, ListenerError, listener};
pub use fragment::{
    FragmentArithmetic,
    FragmentIndex,
    Fragmenter,
    ReassembledPacket,
    Reassembler,
    ReassemblyConfig,
    ReassemblyError,
    wire_len,
};
pub use pack::{Pack, PackRegistry};
pub use packet::{ANY_PACKET, KindResolution, Packet, PacketBody, PacketError, PacketKind};
pub use socket::{FRAGMENT_SIZE, ItemsTarget, Socket, SocketConfig, SocketError};
pub use transport::{Envelope, InboundHandler, MemoryBus, MemoryTransport, Transport, TransportError};
