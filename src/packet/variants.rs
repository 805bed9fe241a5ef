//! Payload shapes carried by [`Packet`](super::Packet).
//!
//! Each shape keeps the fields it does not recognise in `extra` so packets
//! from newer peers survive a decode/encode cycle unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::fragment::FragmentIndex;

/// Self-announcement describing a pack.
///
/// The pack identifier travels in the packet header
/// ([`Packet::identifier`](super::Packet::identifier)).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryPacket {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: u32,
    /// Namespace used for the pack's outbound channel names.
    #[serde(default)]
    pub prefix: String,
    /// Packet type names the pack emits or consumes.
    pub packets: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Entity identifiers registered by the pack named in `source`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitiesRegistryPacket {
    pub source: String,
    pub entity_ids: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Item identifiers registered by the pack named in `source`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemsRegistryPacket {
    pub source: String,
    pub item_ids: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One transmission-sized slice of a serialised parent packet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FragmentPacket {
    /// Number of fragments the receiver waits for before reassembling.
    pub fragment_count: usize,
    pub data: String,
    /// Position used to order fragments on reassembly.
    pub split_index: FragmentIndex,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FragmentPacket {
    /// Construct a fragment carrying `data`.
    #[must_use]
    pub fn new(fragment_count: usize, split_index: FragmentIndex, data: impl Into<String>) -> Self {
        Self {
            fragment_count,
            data: data.into(),
            split_index,
            extra: Map::new(),
        }
    }
}
