//! Outbound helper that slices serialised packets into fragment packets.
//!
//! Lengths are measured in UTF-16 code units, the unit peers use when they
//! check a message against the transport ceiling. A chunk never splits a
//! character: when a surrogate pair would straddle the boundary the chunk
//! ends early.

use std::num::NonZeroUsize;

use super::{FragmentArithmetic, FragmentIndex};
use crate::packet::{FragmentPacket, Packet};

/// Length of `text` in serialisation units.
#[must_use]
pub fn wire_len(text: &str) -> usize { text.encode_utf16().count() }

/// Splits serialised packets into fragment-sized packets.
#[derive(Clone, Copy, Debug)]
pub struct Fragmenter {
    max_fragment_size: NonZeroUsize,
    arithmetic: FragmentArithmetic,
}

impl Fragmenter {
    /// Create a fragmenter that caps each fragment's `data` at
    /// `max_fragment_size` units.
    #[must_use]
    pub const fn new(max_fragment_size: NonZeroUsize, arithmetic: FragmentArithmetic) -> Self {
        Self {
            max_fragment_size,
            arithmetic,
        }
    }

    #[must_use]
    pub const fn max_fragment_size(&self) -> NonZeroUsize { self.max_fragment_size }

    #[must_use]
    pub const fn arithmetic(&self) -> FragmentArithmetic { self.arithmetic }

    /// Whether `serialized` must be fragmented before transmission.
    #[must_use]
    pub fn needs_fragmenting(&self, serialized: &str) -> bool {
        wire_len(serialized) > self.max_fragment_size.get()
    }

    /// Split `serialized` into fragment packets tagged with `packet_id`.
    ///
    /// Every fragment advertises the same count. The count follows the
    /// configured [`FragmentArithmetic`], raised to the real number of chunks
    /// if character boundaries forced extra ones.
    ///
    /// Only each fragment's `data` is bounded by the fragment size. The
    /// serialised fragment adds its header fields and JSON escaping on top,
    /// so a transport ceiling equal to the fragment size is exceeded by every
    /// fragment message; the ceiling must leave room for that envelope.
    #[must_use]
    pub fn fragment(&self, packet_id: Option<&str>, serialized: &str) -> Vec<Packet> {
        let chunks = self.chunks(serialized);
        let advertised = self
            .arithmetic
            .fragment_count(wire_len(serialized), self.max_fragment_size);
        let fragment_count = advertised.max(chunks.len());

        chunks
            .into_iter()
            .enumerate()
            .map(|(position, data)| {
                let index = FragmentIndex::new(self.arithmetic.split_index(position));
                Packet::fragment(packet_id, FragmentPacket::new(fragment_count, index, data))
            })
            .collect()
    }

    /// Consecutive, non-overlapping slices of at most the fragment size.
    #[must_use]
    pub fn chunks<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let max = self.max_fragment_size.get();
        let mut chunks = Vec::with_capacity(wire_len(text).div_ceil(max));
        let mut start = 0usize;
        let mut units = 0usize;

        for (offset, ch) in text.char_indices() {
            let width = ch.len_utf16();
            if units > 0 && units + width > max {
                chunks.push(&text[start..offset]);
                start = offset;
                units = 0;
            }
            units += width;
        }
        if start < text.len() {
            chunks.push(&text[start..]);
        }
        chunks
    }
}
