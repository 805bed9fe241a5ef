//! Error type surfaced by [`Socket`](super::Socket) operations.

use thiserror::Error;

use crate::{
    emitter::ListenerError,
    fragment::ReassemblyError,
    packet::PacketError,
    transport::TransportError,
};

/// Errors returned by the socket's send and receive paths.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SocketError {
    #[error(transparent)]
    Packet(#[from] PacketError),
    #[error(transparent)]
    Reassembly(#[from] ReassemblyError),
    #[error(transparent)]
    Listener(#[from] ListenerError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The packet has neither an identifier nor a packet id to route on.
    #[error("packet has no identifier or packetId to derive a channel from")]
    Unroutable,
}
