//! Reserved packet kinds understood by every socket.

use derive_more::Display;

/// Packet kinds with a reserved `packetId` and a matching `global:*` channel.
///
/// # Examples
///
/// ```
/// use packnet::packet::PacketKind;
/// assert_eq!(PacketKind::from_id("global:items"), Some(PacketKind::Items));
/// assert_eq!(PacketKind::Discovery.to_string(), "global:discovery");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
pub enum PacketKind {
    /// Self-announcement of a pack.
    #[display("global:discovery")]
    Discovery,
    /// Entity identifiers registered by a pack.
    #[display("global:entities")]
    Entities,
    /// Item identifiers registered by a pack.
    #[display("global:items")]
    Items,
}

/// How a large packet without a reserved shape is named before fragmenting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KindResolution {
    /// Only reserved shapes resolve; anything else is unresolvable.
    #[default]
    Strict,
    /// Application packets may keep a non-empty `packetId` they already
    /// carry.
    KeepPacketId,
}

impl PacketKind {
    /// Return the reserved identifier for this kind.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Discovery => "global:discovery",
            Self::Entities => "global:entities",
            Self::Items => "global:items",
        }
    }

    /// Look up the kind reserved under `id`.
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        [Self::Discovery, Self::Entities, Self::Items]
            .into_iter()
            .find(|kind| kind.id() == id)
    }
}
