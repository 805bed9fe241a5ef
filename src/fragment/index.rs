//! Signed fragment positioning within a logical packet.
//!
//! Peers running the legacy arithmetic number the first fragment `-1`, so
//! the index is signed rather than the zero-based ordinal one might expect.

use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

/// Ordinal describing a fragment's position within its packet.
///
/// # Examples
///
/// ```
/// use packnet::fragment::FragmentIndex;
/// let index = FragmentIndex::new(-1);
/// assert_eq!(index.get(), -1);
/// assert!(index < FragmentIndex::new(0));
/// ```
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    From,
    Into,
    Serialize,
    Deserialize,
)]
#[display("{_0}")]
#[serde(transparent)]
pub struct FragmentIndex(i64);

impl FragmentIndex {
    #[must_use]
    pub const fn new(value: i64) -> Self { Self(value) }

    #[must_use]
    pub const fn get(self) -> i64 { self.0 }
}
