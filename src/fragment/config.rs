//! Settings for fragment numbering and reassembly resource bounds.

use std::{num::NonZeroUsize, time::Duration};

/// Default lifetime of an incomplete reassembly buffer.
pub const DEFAULT_REASSEMBLY_TIMEOUT: Duration = Duration::from_secs(30);

/// Default cap on concurrently buffered incomplete packets.
pub const DEFAULT_MAX_PENDING: NonZeroUsize = match NonZeroUsize::new(64) {
    Some(limit) => limit,
    None => unreachable!(),
};

/// How fragment counts and split indices are numbered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FragmentArithmetic {
    /// `floor(len / size) + 1` fragments, indices starting at `-1`.
    ///
    /// Matches deployed peers byte for byte. A payload whose length divides
    /// evenly by the fragment size advertises one fragment more than is sent,
    /// so receivers using this arithmetic never complete it.
    #[default]
    Legacy,
    /// `ceil(len / size)` fragments, indices starting at `0`.
    Corrected,
}

impl FragmentArithmetic {
    /// Number of fragments advertised for a payload of `units` length.
    #[must_use]
    pub fn fragment_count(self, units: usize, size: NonZeroUsize) -> usize {
        match self {
            Self::Legacy => units / size.get() + 1,
            Self::Corrected => units.div_ceil(size.get()),
        }
    }

    /// Split index assigned to the chunk at `position`.
    #[must_use]
    pub fn split_index(self, position: usize) -> i64 {
        let position = i64::try_from(position).unwrap_or(i64::MAX);
        match self {
            Self::Legacy => position - 1,
            Self::Corrected => position,
        }
    }
}

/// Bounds applied to incomplete fragment buffers.
///
/// `None` disables the corresponding bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReassemblyConfig {
    /// Age after which an incomplete buffer is evicted.
    pub timeout: Option<Duration>,
    /// Maximum number of incomplete buffers held at once. The oldest buffer
    /// is evicted to make room for a new one.
    pub max_pending: Option<NonZeroUsize>,
}

impl ReassemblyConfig {
    /// Keep incomplete buffers forever, as deployed peers do.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            timeout: None,
            max_pending: None,
        }
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_max_pending(mut self, max_pending: Option<NonZeroUsize>) -> Self {
        self.max_pending = max_pending;
        self
    }
}

impl Default for ReassemblyConfig {
    fn default() -> Self {
        Self {
            timeout: Some(DEFAULT_REASSEMBLY_TIMEOUT),
            max_pending: Some(DEFAULT_MAX_PENDING),
        }
    }
}
