//! Host transport seam.
//!
//! A transport moves short text messages tagged with a channel identifier.
//! It offers no framing, ordering, or delivery guarantee and enforces its
//! length ceiling silently, so the [`Socket`](crate::socket::Socket) never
//! hands it more than one fragment's worth of data at a time.

pub mod memory;

use thiserror::Error;

pub use memory::{Envelope, MemoryBus, MemoryTransport};

/// Callback invoked with `(channel, raw_message)` for every inbound message.
pub type InboundHandler = Box<dyn Fn(&str, &str)>;

/// Errors reported by a transport when sending.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
    /// The host refused the message.
    #[error("transport rejected message on `{channel}`: {reason}")]
    Rejected { channel: String, reason: String },
    /// The transport is no longer connected to anything.
    #[error("transport is closed")]
    Closed,
}

/// Channel-tagged text transport provided by the host.
pub trait Transport {
    /// Send `message` on `channel`.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the host reports a failure.
    fn send(&self, channel: &str, message: &str) -> Result<(), TransportError>;

    /// Install the single handler for inbound messages, replacing any
    /// previous one.
    fn set_handler(&self, handler: InboundHandler);
}
