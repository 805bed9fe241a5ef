//! In-process broadcast bus used by the demo binary and tests.
//!
//! [`MemoryBus`] queues every sent message and delivers it on [`MemoryBus::pump`]
//! to every endpoint except the sender. Queued messages can be drained and
//! re-injected in any order to simulate out-of-order arrival.

use std::{
    cell::RefCell,
    collections::VecDeque,
    rc::{Rc, Weak},
};

use log::trace;

use super::{InboundHandler, Transport, TransportError};

/// A message in flight on a [`MemoryBus`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Envelope {
    /// Index of the sending endpoint.
    pub sender: usize,
    pub channel: String,
    pub message: String,
}

#[derive(Default)]
struct BusState {
    handlers: Vec<Option<Rc<dyn Fn(&str, &str)>>>,
    queue: VecDeque<Envelope>,
    history: Vec<Envelope>,
}

/// Shared queue connecting any number of [`MemoryTransport`] endpoints.
#[derive(Clone, Default)]
pub struct MemoryBus {
    state: Rc<RefCell<BusState>>,
}

impl std::fmt::Debug for MemoryBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("MemoryBus")
            .field("endpoints", &state.handlers.len())
            .field("queued", &state.queue.len())
            .finish()
    }
}

impl MemoryBus {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Attach a new endpoint to the bus.
    #[must_use]
    pub fn endpoint(&self) -> MemoryTransport {
        let mut state = self.state.borrow_mut();
        state.handlers.push(None);
        MemoryTransport {
            id: state.handlers.len() - 1,
            bus: Rc::downgrade(&self.state),
        }
    }

    /// Number of messages waiting for delivery.
    #[must_use]
    pub fn queued(&self) -> usize { self.state.borrow().queue.len() }

    /// Every message ever sent on the bus, in send order.
    #[must_use]
    pub fn history(&self) -> Vec<Envelope> { self.state.borrow().history.clone() }

    /// Remove all queued messages without delivering them.
    pub fn drain(&self) -> Vec<Envelope> { self.state.borrow_mut().queue.drain(..).collect() }

    /// Queue `envelope` for delivery as if its sender had just sent it.
    pub fn inject(&self, envelope: Envelope) { self.state.borrow_mut().queue.push_back(envelope); }

    /// Deliver the oldest queued message, returning whether one was queued.
    pub fn pump_one(&self) -> bool {
        let Some(envelope) = self.state.borrow_mut().queue.pop_front() else {
            return false;
        };
        let targets: Vec<_> = self
            .state
            .borrow()
            .handlers
            .iter()
            .enumerate()
            .filter(|(id, _)| *id != envelope.sender)
            .filter_map(|(_, handler)| handler.clone())
            .collect();

        trace!(
            "delivering message: channel={}, sender={}, receivers={}",
            envelope.channel,
            envelope.sender,
            targets.len()
        );
        for handler in targets {
            handler(&envelope.channel, &envelope.message);
        }
        true
    }

    /// Deliver queued messages until the queue is empty, including messages
    /// sent while delivering. Returns the number delivered.
    pub fn pump(&self) -> usize {
        let mut delivered = 0;
        while self.pump_one() {
            delivered += 1;
        }
        delivered
    }
}

/// One endpoint attached to a [`MemoryBus`].
#[derive(Clone, Debug)]
pub struct MemoryTransport {
    id: usize,
    bus: Weak<RefCell<BusState>>,
}

impl MemoryTransport {
    /// Index identifying this endpoint as a sender.
    #[must_use]
    pub fn id(&self) -> usize { self.id }
}

impl Transport for MemoryTransport {
    fn send(&self, channel: &str, message: &str) -> Result<(), TransportError> {
        let bus = self.bus.upgrade().ok_or(TransportError::Closed)?;
        let envelope = Envelope {
            sender: self.id,
            channel: channel.to_owned(),
            message: message.to_owned(),
        };
        let mut state = bus.borrow_mut();
        state.history.push(envelope.clone());
        state.queue.push_back(envelope);
        Ok(())
    }

    fn set_handler(&self, handler: InboundHandler) {
        let Some(bus) = self.bus.upgrade() else {
            return;
        };
        let mut state = bus.borrow_mut();
        if let Some(slot) = state.handlers.get_mut(self.id) {
            *slot = Some(Rc::from(handler));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::{MemoryBus, Transport};

    #[test]
    fn delivers_to_every_endpoint_but_the_sender() {
        let bus = MemoryBus::new();
        let alpha = bus.endpoint();
        let beta = bus.endpoint();
        let gamma = bus.endpoint();
        let seen = Rc::new(RefCell::new(Vec::new()));
        for (name, endpoint) in [("alpha", &alpha), ("beta", &beta), ("gamma", &gamma)] {
            let seen = Rc::clone(&seen);
            endpoint.set_handler(Box::new(move |channel: &str, message: &str| {
                seen.borrow_mut().push(format!("{name}<-{channel}:{message}"));
            }));
        }

        alpha.send("p1:hello", "{}").expect("send");
        assert_eq!(bus.pump(), 1);

        assert_eq!(*seen.borrow(), ["beta<-p1:hello:{}", "gamma<-p1:hello:{}"]);
    }

    #[test]
    fn drained_messages_can_be_reinjected_in_any_order() {
        let bus = MemoryBus::new();
        let alpha = bus.endpoint();
        let beta = bus.endpoint();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        beta.set_handler(Box::new(move |_: &str, message: &str| {
            sink.borrow_mut().push(message.to_owned());
        }));

        for message in ["1", "2", "3"] {
            alpha.send("k", message).expect("send");
        }
        let mut queued = bus.drain();
        queued.reverse();
        for envelope in queued {
            bus.inject(envelope);
        }
        bus.pump();

        assert_eq!(*seen.borrow(), ["3", "2", "1"]);
        assert_eq!(bus.history().len(), 3);
    }

    #[test]
    fn send_fails_once_bus_is_dropped() {
        let endpoint = MemoryBus::new().endpoint();
        assert!(endpoint.send("k", "{}").is_err());
    }
}
