//! Errors raised while encoding, decoding, or resolving packets.

use thiserror::Error;

/// Errors produced by the packet model.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PacketError {
    /// Serialising the packet to JSON failed.
    #[error("failed to encode packet: {0}")]
    Encode(#[source] serde_json::Error),
    /// The inbound text was not valid JSON.
    #[error("failed to parse packet JSON: {0}")]
    Parse(#[source] serde_json::Error),
    /// The payload parsed but was not a JSON object.
    #[error("packet payload must be a JSON object")]
    NotAnObject,
    /// A header field carried a non-string value.
    #[error("packet field `{field}` must be a string")]
    InvalidField { field: &'static str },
    /// A payload matched a known shape but its fields did not fit it.
    #[error("malformed {kind} packet: {source}")]
    Malformed {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
    /// The packet matches no reserved shape and carries no `packetId`.
    #[error("packet kind cannot be resolved: no known shape and no packetId")]
    UnresolvablePacketKind,
}
