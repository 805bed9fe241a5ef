//! Errors raised while reassembling inbound fragments.

use thiserror::Error;

use crate::packet::PacketError;

/// Errors produced when completed fragments do not form a valid packet.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReassemblyError {
    /// The concatenated fragment data is not a valid packet. The buffer
    /// entry has already been discarded.
    #[error("reassembled payload for `{key}` is not a valid packet: {source}")]
    InvalidPayload {
        key: String,
        #[source]
        source: PacketError,
    },
}
