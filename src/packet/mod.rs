//! Packet model shared by every pack on the bus.
//!
//! A [`Packet`] is a small header (`packetId`, `identifier`) plus a
//! [`PacketBody`] selected by the payload's structural shape. Peers never send
//! an explicit discriminant, so decoding inspects which fields are present:
//!
//! | field present          | body                       |
//! |------------------------|----------------------------|
//! | `isFragment: true`     | [`PacketBody::Fragment`]   |
//! | `packets`              | [`PacketBody::Discovery`]  |
//! | `itemIds`              | [`PacketBody::Items`]      |
//! | `entityIds`            | [`PacketBody::Entities`]   |
//! | none of the above      | [`PacketBody::Generic`]    |

pub mod error;
pub mod kind;
pub mod variants;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de, ser};
use serde_json::{Map, Value};

pub use error::PacketError;
pub use kind::{KindResolution, PacketKind};
pub use variants::{DiscoveryPacket, EntitiesRegistryPacket, FragmentPacket, ItemsRegistryPacket};

use crate::pack::Pack;

const PACKET_ID: &str = "packetId";
const IDENTIFIER: &str = "identifier";
const IS_FRAGMENT: &str = "isFragment";
const PAYLOAD: &str = "payload";

/// Identifier of the catch-all event published for every delivered packet.
pub const ANY_PACKET: &str = "packet";

/// Shape-specific payload of a [`Packet`].
#[derive(Clone, Debug, PartialEq)]
pub enum PacketBody {
    Discovery(DiscoveryPacket),
    Entities(EntitiesRegistryPacket),
    Items(ItemsRegistryPacket),
    Fragment(FragmentPacket),
    /// Application-defined packet with arbitrary JSON fields.
    Generic(Map<String, Value>),
}

impl PacketBody {
    /// Reserved kind implied by the body's shape, if any.
    #[must_use]
    pub fn kind(&self) -> Option<PacketKind> {
        match self {
            Self::Discovery(_) => Some(PacketKind::Discovery),
            Self::Entities(_) => Some(PacketKind::Entities),
            Self::Items(_) => Some(PacketKind::Items),
            Self::Fragment(_) | Self::Generic(_) => None,
        }
    }

    /// Fields the body does not model explicitly.
    #[must_use]
    pub fn extra(&self) -> &Map<String, Value> {
        match self {
            Self::Discovery(packet) => &packet.extra,
            Self::Entities(packet) => &packet.extra,
            Self::Items(packet) => &packet.extra,
            Self::Fragment(packet) => &packet.extra,
            Self::Generic(fields) => fields,
        }
    }

    fn from_fields(mut fields: Map<String, Value>) -> Result<Self, PacketError> {
        if fields.get(IS_FRAGMENT) == Some(&Value::Bool(true)) {
            fields.remove(IS_FRAGMENT);
            return decode_shape("fragment", fields).map(Self::Fragment);
        }
        if fields.contains_key("packets") {
            decode_shape("discovery", fields).map(Self::Discovery)
        } else if fields.contains_key("itemIds") {
            decode_shape("items registry", fields).map(Self::Items)
        } else if fields.contains_key("entityIds") {
            decode_shape("entities registry", fields).map(Self::Entities)
        } else {
            Ok(Self::Generic(fields))
        }
    }

    fn write_fields(&self, fields: &mut Map<String, Value>) -> Result<(), PacketError> {
        let value = match self {
            Self::Discovery(packet) => serde_json::to_value(packet),
            Self::Entities(packet) => serde_json::to_value(packet),
            Self::Items(packet) => serde_json::to_value(packet),
            Self::Fragment(packet) => {
                fields.insert(IS_FRAGMENT.into(), Value::Bool(true));
                serde_json::to_value(packet)
            }
            Self::Generic(extra) => {
                fields.extend(extra.iter().map(|(key, value)| (key.clone(), value.clone())));
                return Ok(());
            }
        }
        .map_err(PacketError::Encode)?;
        if let Value::Object(body) = value {
            fields.extend(body);
        }
        Ok(())
    }
}

fn decode_shape<T: de::DeserializeOwned>(
    kind: &'static str,
    fields: Map<String, Value>,
) -> Result<T, PacketError> {
    serde_json::from_value(Value::Object(fields))
        .map_err(|source| PacketError::Malformed { kind, source })
}

fn take_string(
    fields: &mut Map<String, Value>,
    field: &'static str,
) -> Result<Option<String>, PacketError> {
    match fields.remove(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value)),
        Some(_) => Err(PacketError::InvalidField { field }),
    }
}

/// One logical message exchanged between packs.
#[derive(Clone, Debug, PartialEq)]
pub struct Packet {
    packet_id: Option<String>,
    identifier: Option<String>,
    body: PacketBody,
}

impl Packet {
    /// Wrap `body` in a packet with an empty header.
    #[must_use]
    pub fn new(body: PacketBody) -> Self {
        Self {
            packet_id: None,
            identifier: None,
            body,
        }
    }

    /// Build an application packet published under `identifier`.
    #[must_use]
    pub fn generic(identifier: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self::new(PacketBody::Generic(fields)).with_identifier(identifier)
    }

    /// Build the discovery packet announcing `pack`.
    #[must_use]
    pub fn discovery(pack: &Pack) -> Self {
        Self::new(PacketBody::Discovery(DiscoveryPacket {
            name: pack.name.clone(),
            description: pack.description.clone(),
            version: pack.version,
            prefix: pack.prefix.clone(),
            packets: pack.packets.clone(),
            extra: Map::new(),
        }))
        .with_identifier(pack.identifier.clone())
        .with_packet_id(PacketKind::Discovery.id())
    }

    /// Build an entities registry packet on behalf of `source`.
    #[must_use]
    pub fn entities(source: impl Into<String>, entity_ids: Vec<String>) -> Self {
        Self::new(PacketBody::Entities(EntitiesRegistryPacket {
            source: source.into(),
            entity_ids,
            extra: Map::new(),
        }))
        .with_packet_id(PacketKind::Entities.id())
    }

    /// Build an items registry packet on behalf of `source`.
    #[must_use]
    pub fn items(source: impl Into<String>, item_ids: Vec<String>) -> Self {
        Self::new(PacketBody::Items(ItemsRegistryPacket {
            source: source.into(),
            item_ids,
            extra: Map::new(),
        }))
        .with_packet_id(PacketKind::Items.id())
    }

    /// Build a fragment sharing the parent's `packet_id`.
    #[must_use]
    pub fn fragment(packet_id: Option<&str>, fragment: FragmentPacket) -> Self {
        Self {
            packet_id: packet_id.map(str::to_owned),
            identifier: None,
            body: PacketBody::Fragment(fragment),
        }
    }

    /// Build the catch-all event carrying `inner` as its `payload` field.
    ///
    /// # Errors
    ///
    /// Returns [`PacketError::Encode`] if `inner` cannot be serialised.
    pub fn any_event(inner: &Packet) -> Result<Self, PacketError> {
        let mut fields = Map::new();
        fields.insert(PAYLOAD.into(), inner.to_value()?);
        Ok(Self::generic(ANY_PACKET, fields).with_packet_id(ANY_PACKET))
    }

    /// Decode the packet wrapped by [`Packet::any_event`].
    ///
    /// Returns `Ok(None)` when there is no `payload` field.
    ///
    /// # Errors
    ///
    /// Returns a [`PacketError`] if the payload is not a valid packet.
    pub fn inner_payload(&self) -> Result<Option<Packet>, PacketError> {
        self.body
            .extra()
            .get(PAYLOAD)
            .map(|value| Self::from_value(value.clone()))
            .transpose()
    }

    #[must_use]
    pub fn with_packet_id(mut self, packet_id: impl Into<String>) -> Self {
        self.packet_id = Some(packet_id.into());
        self
    }

    #[must_use]
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    #[must_use]
    pub fn packet_id(&self) -> Option<&str> { self.packet_id.as_deref() }

    #[must_use]
    pub fn identifier(&self) -> Option<&str> { self.identifier.as_deref() }

    #[must_use]
    pub fn body(&self) -> &PacketBody { &self.body }

    pub fn body_mut(&mut self) -> &mut PacketBody { &mut self.body }

    #[must_use]
    pub fn is_fragment(&self) -> bool { matches!(self.body, PacketBody::Fragment(_)) }

    /// Look up an unmodelled field by name.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Value> { self.body.extra().get(key) }

    /// Set `identifier` to `channel` unless the packet already names one.
    pub fn stamp_identifier(&mut self, channel: &str) {
        if self.identifier.is_none() {
            self.identifier = Some(channel.to_owned());
        }
    }

    /// Split off the fragment payload, or hand the packet back unchanged.
    ///
    /// # Errors
    ///
    /// Returns the original packet when it is not a fragment.
    pub fn into_fragment(self) -> Result<FragmentPacket, Packet> {
        match self.body {
            PacketBody::Fragment(fragment) => Ok(fragment),
            body => Err(Self { body, ..self }),
        }
    }

    /// Assign the reserved `packetId` implied by the packet's shape.
    ///
    /// Shapes take precedence in the order discovery, items, entities. Under
    /// [`KindResolution::KeepPacketId`] a packet with no reserved shape keeps
    /// a non-empty `packetId` it already carries.
    ///
    /// # Errors
    ///
    /// Returns [`PacketError::UnresolvablePacketKind`] when the packet has no
    /// reserved shape and `resolution` does not let it keep its own id.
    pub fn resolve_kind(&mut self, resolution: KindResolution) -> Result<&str, PacketError> {
        if let Some(kind) = self.body.kind() {
            self.packet_id = Some(kind.id().to_owned());
            return Ok(kind.id());
        }
        match (resolution, self.packet_id.as_deref()) {
            (KindResolution::KeepPacketId, Some(id)) if !id.is_empty() => Ok(id),
            _ => Err(PacketError::UnresolvablePacketKind),
        }
    }

    /// Convert the packet into its JSON object form.
    ///
    /// # Errors
    ///
    /// Returns [`PacketError::Encode`] if a body field cannot be serialised.
    pub fn to_value(&self) -> Result<Value, PacketError> {
        let mut fields = Map::new();
        if let Some(packet_id) = &self.packet_id {
            fields.insert(PACKET_ID.into(), Value::String(packet_id.clone()));
        }
        if let Some(identifier) = &self.identifier {
            fields.insert(IDENTIFIER.into(), Value::String(identifier.clone()));
        }
        self.body.write_fields(&mut fields)?;
        Ok(Value::Object(fields))
    }

    /// Decode a packet from its JSON object form.
    ///
    /// # Errors
    ///
    /// Returns a [`PacketError`] if `value` is not an object, a header field
    /// is not a string, or a recognised shape has malformed fields.
    pub fn from_value(value: Value) -> Result<Self, PacketError> {
        let Value::Object(mut fields) = value else {
            return Err(PacketError::NotAnObject);
        };
        let packet_id = take_string(&mut fields, PACKET_ID)?;
        let identifier = take_string(&mut fields, IDENTIFIER)?;
        Ok(Self {
            packet_id,
            identifier,
            body: PacketBody::from_fields(fields)?,
        })
    }

    /// Serialise the packet to JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`PacketError::Encode`] if serialisation fails.
    pub fn to_json(&self) -> Result<String, PacketError> {
        serde_json::to_string(&self.to_value()?).map_err(PacketError::Encode)
    }

    /// Parse a packet from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`PacketError::Parse`] for invalid JSON, or any error from
    /// [`Packet::from_value`].
    pub fn from_json(text: &str) -> Result<Self, PacketError> {
        let value: Value = serde_json::from_str(text).map_err(PacketError::Parse)?;
        Self::from_value(value)
    }
}

impl Serialize for Packet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value()
            .map_err(ser::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Packet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(de::Error::custom)
    }
}
