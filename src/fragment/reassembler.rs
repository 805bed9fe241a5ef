//! Inbound buffer that stitches fragment packets back into complete packets.
//!
//! [`Reassembler`] keys pending fragments by the channel they arrived on. An
//! entry completes once it holds at least as many fragments as the latest
//! fragment advertises; fragments are then ordered by split index and their
//! data concatenated. Arrival order does not matter. Incomplete entries are
//! bounded by age and by count according to [`ReassemblyConfig`].

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use log::{trace, warn};

use super::{ReassemblyConfig, ReassemblyError};
use crate::packet::{FragmentPacket, Packet};

#[derive(Debug)]
struct PendingPacket {
    fragments: Vec<FragmentPacket>,
    started_at: Instant,
}

impl PendingPacket {
    fn new(started_at: Instant) -> Self {
        Self {
            fragments: Vec::new(),
            started_at,
        }
    }

    fn into_text(mut self) -> String {
        self.fragments.sort_by_key(|fragment| fragment.split_index);
        self.fragments.into_iter().map(|fragment| fragment.data).collect()
    }
}

/// Concatenated fragment data for one logical packet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReassembledPacket {
    key: String,
    text: String,
}

impl ReassembledPacket {
    #[must_use]
    pub fn new(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            text: text.into(),
        }
    }

    /// Channel the fragments arrived on.
    #[must_use]
    pub fn key(&self) -> &str { &self.key }

    /// Serialised parent packet.
    #[must_use]
    pub fn text(&self) -> &str { &self.text }

    /// Parse the concatenated text as a packet.
    ///
    /// # Errors
    ///
    /// Returns [`ReassemblyError::InvalidPayload`] if the text is not a valid
    /// packet.
    pub fn decode(&self) -> Result<Packet, ReassemblyError> {
        Packet::from_json(&self.text).map_err(|source| ReassemblyError::InvalidPayload {
            key: self.key.clone(),
            source,
        })
    }
}

/// Stateful fragment buffer with optional age and count eviction.
#[derive(Debug, Default)]
pub struct Reassembler {
    config: ReassemblyConfig,
    pending: HashMap<String, PendingPacket>,
}

impl Reassembler {
    #[must_use]
    pub fn new(config: ReassemblyConfig) -> Self {
        Self {
            config,
            pending: HashMap::new(),
        }
    }

    /// Buffer `fragment` under `key` using the current time.
    ///
    /// Returns the reassembled text once the entry is complete, removing the
    /// entry before the caller decodes it.
    pub fn push(&mut self, key: &str, fragment: FragmentPacket) -> Option<ReassembledPacket> {
        self.push_at(key, fragment, Instant::now())
    }

    /// Buffer `fragment` under `key` using an explicit clock reading.
    pub fn push_at(
        &mut self,
        key: &str,
        fragment: FragmentPacket,
        now: Instant,
    ) -> Option<ReassembledPacket> {
        self.purge_expired_at(now);
        if !self.pending.contains_key(key) {
            self.make_room();
        }

        let target = fragment.fragment_count;
        let entry = self
            .pending
            .entry(key.to_owned())
            .or_insert_with(|| PendingPacket::new(now));
        entry.fragments.push(fragment);

        let buffered = entry.fragments.len();
        if buffered < target {
            trace!("buffered fragment: key={key}, buffered={buffered}, expected={target}");
            return None;
        }

        let pending = self.pending.remove(key)?;
        trace!("reassembling packet: key={key}, fragments={buffered}");
        Some(ReassembledPacket::new(key, pending.into_text()))
    }

    /// Remove incomplete entries older than the configured timeout.
    ///
    /// Returns the keys of evicted entries.
    pub fn purge_expired(&mut self) -> Vec<String> { self.purge_expired_at(Instant::now()) }

    /// Remove incomplete entries older than the configured timeout using an
    /// explicit clock reading.
    pub fn purge_expired_at(&mut self, now: Instant) -> Vec<String> {
        let Some(timeout) = self.config.timeout else {
            return Vec::new();
        };
        let mut evicted = Vec::new();

        self.pending.retain(|key, pending| {
            let expired = is_expired(now, pending.started_at, timeout);
            if expired {
                warn!(
                    "evicting stale reassembly: key={key}, fragments={}",
                    pending.fragments.len()
                );
                evicted.push(key.clone());
            }
            !expired
        });

        evicted
    }

    /// Number of incomplete packets currently buffered.
    #[must_use]
    pub fn buffered_len(&self) -> usize { self.pending.len() }

    /// Whether fragments are buffered under `key`.
    #[must_use]
    pub fn is_pending(&self, key: &str) -> bool { self.pending.contains_key(key) }

    fn make_room(&mut self) {
        let Some(limit) = self.config.max_pending else {
            return;
        };
        while self.pending.len() >= limit.get() {
            let Some(oldest) = self
                .pending
                .iter()
                .min_by_key(|(_, pending)| pending.started_at)
                .map(|(key, _)| key.clone())
            else {
                return;
            };
            warn!("evicting oldest reassembly to make room: key={oldest}");
            self.pending.remove(&oldest);
        }
    }
}

fn is_expired(now: Instant, started_at: Instant, timeout: Duration) -> bool {
    now.saturating_duration_since(started_at) >= timeout
}
