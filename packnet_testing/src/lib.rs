//! Test fixtures shared by `packnet` integration tests.
//!
//! Provides serialised log capture and builders for packs, sized packets,
//! and pairs of sockets connected through a [`packnet::MemoryBus`].

pub mod logging;
pub mod packets;

pub use logging::{CapturedRecord, LoggerHandle, logger};
pub use packets::{Pair, pack_one, packet_of_len};
