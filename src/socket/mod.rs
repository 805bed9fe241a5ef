//! Packet socket tying the packet model, fragmentation, registry, and event
//! router to a host [`Transport`].
//!
//! Outbound, [`Socket::send`] transmits small packets as they are and splits
//! large ones into fragments. Inbound, [`Socket::on_message`] buffers
//! fragments until their packet is complete, publishes finished packets to
//! the router, and applies the built-in handling of the reserved
//! `global:*` channels to the [`PackRegistry`].
//!
//! The socket is single-threaded. Inbound messages run to completion one at
//! a time, so the registry and fragment buffer are plain `RefCell`s. Borrows
//! are never held while listeners run, which lets listeners send packets or
//! query the registry.

pub mod config;
pub mod error;

use std::{
    cell::{Ref, RefCell},
    rc::Rc,
};

use log::{debug, warn};

pub use config::{FRAGMENT_SIZE, ItemsTarget, SocketConfig};
pub use error::SocketError;

use crate::{
    emitter::{Emitter, Listener},
    fragment::{Fragmenter, Reassembler, wire_len},
    pack::{Pack, PackRegistry},
    packet::{Packet, PacketBody, PacketKind},
    transport::Transport,
};

/// Protocol endpoint for one pack.
pub struct Socket<T> {
    transport: T,
    pack: Pack,
    config: SocketConfig,
    fragmenter: Fragmenter,
    registry: RefCell<PackRegistry>,
    fragments: RefCell<Reassembler>,
    router: Emitter<Packet>,
}

impl<T> std::fmt::Debug for Socket<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Socket")
            .field("pack", &self.pack.identifier)
            .field("config", &self.config)
            .field("router", &self.router)
            .finish_non_exhaustive()
    }
}

impl<T: Transport + 'static> Socket<T> {
    /// Attach a socket for `pack` to `transport` using the default
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`SocketError`] if the initial discovery packet cannot be
    /// sent.
    pub fn new(transport: T, pack: Pack) -> Result<Rc<Self>, SocketError> {
        Self::with_config(transport, pack, SocketConfig::default())
    }

    /// Attach a socket for `pack` to `transport`.
    ///
    /// The socket installs itself as the transport's inbound handler and then
    /// announces `pack` so listening peers can register it. Inbound failures
    /// at the transport boundary are logged and dropped; call
    /// [`Socket::receive`] directly to observe them.
    ///
    /// # Errors
    ///
    /// Returns a [`SocketError`] if the initial discovery packet cannot be
    /// sent.
    pub fn with_config(
        transport: T,
        pack: Pack,
        config: SocketConfig,
    ) -> Result<Rc<Self>, SocketError> {
        let socket = Rc::new(Self {
            transport,
            pack,
            config,
            fragmenter: Fragmenter::new(config.fragment_size, config.arithmetic),
            registry: RefCell::new(PackRegistry::new()),
            fragments: RefCell::new(Reassembler::new(config.reassembly)),
            router: Emitter::new(),
        });

        let weak = Rc::downgrade(&socket);
        socket
            .transport
            .set_handler(Box::new(move |channel: &str, raw: &str| {
                let Some(socket) = weak.upgrade() else {
                    return;
                };
                if let Err(err) = socket.receive(channel, raw) {
                    tracing::warn!(channel, error = %err, "dropping inbound message");
                }
            }));

        socket.announce()?;
        Ok(socket)
    }
}

impl<T: Transport> Socket<T> {
    /// Local pack description announced by this socket.
    #[must_use]
    pub fn pack(&self) -> &Pack { &self.pack }

    #[must_use]
    pub fn config(&self) -> &SocketConfig { &self.config }

    /// Send this socket's discovery packet.
    ///
    /// # Errors
    ///
    /// Returns a [`SocketError`] if sending fails.
    pub fn announce(&self) -> Result<(), SocketError> { self.send(Packet::discovery(&self.pack)) }

    /// Register entity identifiers on behalf of the local pack.
    ///
    /// # Errors
    ///
    /// Returns a [`SocketError`] if sending fails.
    pub fn register_entities(&self, entity_ids: Vec<String>) -> Result<(), SocketError> {
        self.send(Packet::entities(self.pack.identifier.clone(), entity_ids))
    }

    /// Register item identifiers on behalf of the local pack.
    ///
    /// # Errors
    ///
    /// Returns a [`SocketError`] if sending fails.
    pub fn register_items(&self, item_ids: Vec<String>) -> Result<(), SocketError> {
        self.send(Packet::items(self.pack.identifier.clone(), item_ids))
    }

    /// Transmit `packet`, fragmenting it when its serialisation exceeds the
    /// fragment size.
    ///
    /// Packets within the limit go out unchanged. Larger packets first have
    /// their kind resolved, then are sliced into fragments sent one after
    /// another on the parent's channel without waiting for acknowledgement.
    ///
    /// # Errors
    ///
    /// Returns [`SocketError::Packet`] if the packet cannot be serialised or
    /// its kind cannot be resolved, [`SocketError::Unroutable`] if no channel
    /// can be derived, or [`SocketError::Transport`] if the transport fails.
    /// Nothing is transmitted when resolution fails.
    pub fn send(&self, mut packet: Packet) -> Result<(), SocketError> {
        let serialized = packet.to_json()?;
        if !self.fragmenter.needs_fragmenting(&serialized) {
            let channel = self.channel_for(&packet)?;
            debug!(
                "sending packet: channel={channel}, units={}",
                wire_len(&serialized)
            );
            return Ok(self.transport.send(&channel, &serialized)?);
        }

        packet.resolve_kind(self.config.kind_resolution)?;
        let channel = self.channel_for(&packet)?;
        let serialized = packet.to_json()?;
        let fragments = self.fragmenter.fragment(packet.packet_id(), &serialized);
        debug!(
            "sending fragmented packet: channel={channel}, units={}, fragments={}",
            wire_len(&serialized),
            fragments.len()
        );
        for fragment in &fragments {
            self.transport.send(&channel, &fragment.to_json()?)?;
        }
        Ok(())
    }

    /// Parse `raw` as a packet and process it as if it arrived on `channel`.
    ///
    /// # Errors
    ///
    /// Returns [`SocketError::Packet`] if `raw` is not a valid packet, or any
    /// error from [`Socket::on_message`].
    pub fn receive(&self, channel: &str, raw: &str) -> Result<(), SocketError> {
        let packet = Packet::from_json(raw)?;
        self.on_message(channel, packet)
    }

    /// Process a decoded packet that arrived on `channel`.
    ///
    /// Fragments are buffered under `channel`; when the last one arrives the
    /// reassembled packet is processed in its place. Complete packets are
    /// published under their identifier and again, wrapped, under
    /// [`ANY_PACKET`](crate::packet::ANY_PACKET). Packets on the reserved
    /// channels then update the registry.
    ///
    /// # Errors
    ///
    /// Returns [`SocketError::Reassembly`] when completed fragments do not
    /// form a valid packet, or [`SocketError::Listener`] when a listener
    /// fails. A failing listener prevents the registry update for that
    /// packet.
    pub fn on_message(&self, channel: &str, mut packet: Packet) -> Result<(), SocketError> {
        loop {
            packet.stamp_identifier(channel);
            let fragment = match packet.into_fragment() {
                Ok(fragment) => fragment,
                Err(complete) => return self.dispatch(channel, complete),
            };
            let reassembled = self.fragments.borrow_mut().push(channel, fragment);
            let Some(reassembled) = reassembled else {
                return Ok(());
            };
            tracing::debug!(
                channel,
                units = wire_len(reassembled.text()),
                "reassembled packet"
            );
            packet = reassembled.decode()?;
        }
    }

    /// Record of a discovered pack, if any.
    #[must_use]
    pub fn get_pack(&self, id: &str) -> Option<Pack> { self.registry.borrow().get(id).cloned() }

    /// Read access to the pack registry.
    ///
    /// Release the guard before the socket processes another message.
    #[must_use]
    pub fn registry(&self) -> Ref<'_, PackRegistry> { self.registry.borrow() }

    /// Number of packets with fragments still awaiting completion.
    #[must_use]
    pub fn pending_reassemblies(&self) -> usize { self.fragments.borrow().buffered_len() }

    /// Event router receiving every completed inbound packet.
    #[must_use]
    pub fn router(&self) -> &Emitter<Packet> { &self.router }

    /// Listen for packets published under `key`.
    pub fn subscribe(&self, key: impl Into<String>, listener: Listener<Packet>) {
        self.router.subscribe(key, listener);
    }

    /// Listen for the next packet published under `key` only.
    pub fn subscribe_once(&self, key: impl Into<String>, listener: Listener<Packet>) {
        self.router.subscribe_once(key, listener);
    }

    /// Stop `listener` receiving packets published under `key`.
    pub fn unsubscribe(&self, key: &str, listener: &Listener<Packet>) -> bool {
        self.router.unsubscribe(key, listener)
    }

    /// Channel a packet is sent on.
    ///
    /// Reserved packet ids use their `global:*` channel verbatim; everything
    /// else is namespaced by the local prefix.
    fn channel_for(&self, packet: &Packet) -> Result<String, SocketError> {
        if let Some(kind) = packet.packet_id().and_then(PacketKind::from_id) {
            return Ok(kind.id().to_owned());
        }
        let name = packet
            .identifier()
            .filter(|name| !name.is_empty())
            .or_else(|| packet.packet_id().filter(|id| !id.is_empty()))
            .ok_or(SocketError::Unroutable)?;
        Ok(format!("{}:{name}", self.pack.prefix))
    }

    fn dispatch(&self, channel: &str, packet: Packet) -> Result<(), SocketError> {
        self.router.publish(&packet)?;
        self.router.publish(&Packet::any_event(&packet)?)?;

        match PacketKind::from_id(channel) {
            Some(PacketKind::Discovery) => self.apply_discovery(&packet),
            Some(PacketKind::Entities) => self.apply_entities(&packet),
            Some(PacketKind::Items) => self.apply_items(&packet),
            None => {}
        }
        Ok(())
    }

    fn apply_discovery(&self, packet: &Packet) {
        let (PacketBody::Discovery(discovery), Some(identifier)) =
            (packet.body(), packet.identifier())
        else {
            warn!(
                "ignoring malformed discovery packet: identifier={:?}",
                packet.identifier()
            );
            return;
        };
        let replaced = self
            .registry
            .borrow_mut()
            .set(identifier, Pack::from_discovery(identifier, discovery));
        debug!(
            "registered pack: identifier={identifier}, replaced={}",
            replaced.is_some()
        );
    }

    fn apply_entities(&self, packet: &Packet) {
        let PacketBody::Entities(registration) = packet.body() else {
            warn!("ignoring malformed entities packet on global channel");
            return;
        };
        let mut registry = self.registry.borrow_mut();
        let Some(pack) = registry.get_mut(&registration.source) else {
            debug!(
                "dropping entity registration for unknown pack: source={}",
                registration.source
            );
            return;
        };
        pack.entities.extend(registration.entity_ids.iter().cloned());
    }

    fn apply_items(&self, packet: &Packet) {
        let PacketBody::Items(registration) = packet.body() else {
            warn!("ignoring malformed items packet on global channel");
            return;
        };
        let mut registry = self.registry.borrow_mut();
        let Some(pack) = registry.get_mut(&registration.source) else {
            debug!(
                "dropping item registration for unknown pack: source={}",
                registration.source
            );
            return;
        };
        let target = match self.config.items_target {
            ItemsTarget::Entities => &mut pack.entities,
            ItemsTarget::Items => &mut pack.items,
        };
        target.extend(registration.item_ids.iter().cloned());
    }
}

#[cfg(test)]
mod tests;
