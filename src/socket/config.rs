//! Socket configuration.

use std::num::NonZeroUsize;

use crate::{
    fragment::{FragmentArithmetic, ReassemblyConfig},
    packet::KindResolution,
};

/// Default fragment threshold in serialisation units.
pub const FRAGMENT_SIZE: NonZeroUsize = match NonZeroUsize::new(128) {
    Some(size) => size,
    None => unreachable!(),
};

/// Where item registrations are recorded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ItemsTarget {
    /// Append item ids to the pack's entity list, as deployed peers do.
    #[default]
    Entities,
    /// Append item ids to the pack's item list.
    Items,
}

/// Settings controlling fragmentation, reassembly, and registry updates.
///
/// The defaults interoperate with deployed peers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SocketConfig {
    /// Largest packet sent unfragmented, and the size of each fragment's data.
    pub fragment_size: NonZeroUsize,
    pub arithmetic: FragmentArithmetic,
    pub items_target: ItemsTarget,
    pub reassembly: ReassemblyConfig,
    /// Whether large application packets may be fragmented under their own
    /// `packetId`.
    pub kind_resolution: KindResolution,
}

impl SocketConfig {
    #[must_use]
    pub const fn with_fragment_size(mut self, fragment_size: NonZeroUsize) -> Self {
        self.fragment_size = fragment_size;
        self
    }

    #[must_use]
    pub const fn with_arithmetic(mut self, arithmetic: FragmentArithmetic) -> Self {
        self.arithmetic = arithmetic;
        self
    }

    #[must_use]
    pub const fn with_items_target(mut self, items_target: ItemsTarget) -> Self {
        self.items_target = items_target;
        self
    }

    #[must_use]
    pub const fn with_kind_resolution(mut self, kind_resolution: KindResolution) -> Self {
        self.kind_resolution = kind_resolution;
        self
    }

    #[must_use]
    pub const fn with_reassembly(mut self, reassembly: ReassemblyConfig) -> Self {
        self.reassembly = reassembly;
        self
    }
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            fragment_size: FRAGMENT_SIZE,
            arithmetic: FragmentArithmetic::default(),
            items_target: ItemsTarget::default(),
            reassembly: ReassemblyConfig::default(),
            kind_resolution: KindResolution::default(),
        }
    }
}
