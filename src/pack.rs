//! Discovered pack metadata and the registry that stores it.
//!
//! A [`Pack`] record is created when a discovery packet arrives and then
//! grows as the pack registers entities and items. Records are never removed;
//! they live as long as the socket owning the [`PackRegistry`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::packet::DiscoveryPacket;

/// Identity, capabilities, and registrations of one pack.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pack {
    pub identifier: String,
    pub name: String,
    pub description: String,
    pub version: u32,
    /// Namespace prepended to the pack's outbound channel names.
    pub prefix: String,
    /// Packet type names the pack declares.
    pub packets: Vec<String>,
    #[serde(default)]
    pub entities: Vec<String>,
    #[serde(default)]
    pub items: Vec<String>,
}

impl Pack {
    /// Create a pack description with no declared packets.
    #[must_use]
    pub fn new(
        identifier: impl Into<String>,
        name: impl Into<String>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            name: name.into(),
            prefix: prefix.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Declare the packet type names this pack emits or consumes.
    #[must_use]
    pub fn with_packets<I, S>(mut self, packets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.packets = packets.into_iter().map(Into::into).collect();
        self
    }

    /// Build a fresh record from a received discovery packet.
    ///
    /// Registrations start empty.
    #[must_use]
    pub fn from_discovery(identifier: impl Into<String>, discovery: &DiscoveryPacket) -> Self {
        Self {
            identifier: identifier.into(),
            name: discovery.name.clone(),
            description: discovery.description.clone(),
            version: discovery.version,
            prefix: discovery.prefix.clone(),
            packets: discovery.packets.clone(),
            entities: Vec::new(),
            items: Vec::new(),
        }
    }
}

/// Map from pack identifier to its [`Pack`] record.
#[derive(Clone, Debug, Default)]
pub struct PackRegistry(HashMap<String, Pack>);

impl PackRegistry {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Pack> { self.0.get(id) }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Pack> { self.0.get_mut(id) }

    /// Store `pack` under `id`, returning the record it replaced.
    ///
    /// A replaced record's registrations are discarded.
    pub fn set(&mut self, id: impl Into<String>, pack: Pack) -> Option<Pack> {
        self.0.insert(id.into(), pack)
    }

    #[must_use]
    pub fn has(&self, id: &str) -> bool { self.0.contains_key(id) }

    /// Packet type names declared by `id`, empty if the pack is unknown.
    #[must_use]
    pub fn packets(&self, id: &str) -> &[String] {
        self.get(id).map(|pack| pack.packets.as_slice()).unwrap_or_default()
    }

    /// Channel prefix of `id`, if the pack is known.
    #[must_use]
    pub fn prefix(&self, id: &str) -> Option<&str> { self.get(id).map(|pack| pack.prefix.as_str()) }

    /// Entities registered by `id`, empty if the pack is unknown.
    #[must_use]
    pub fn registered_entities(&self, id: &str) -> &[String] {
        self.get(id).map(|pack| pack.entities.as_slice()).unwrap_or_default()
    }

    /// Items registered by `id`, empty if the pack is unknown.
    #[must_use]
    pub fn registered_items(&self, id: &str) -> &[String] {
        self.get(id).map(|pack| pack.items.as_slice()).unwrap_or_default()
    }

    #[must_use]
    pub fn len(&self) -> usize { self.0.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Pack)> {
        self.0.iter().map(|(id, pack)| (id.as_str(), pack))
    }
}
