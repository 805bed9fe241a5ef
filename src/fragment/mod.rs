//! Fragmentation and reassembly of packets that exceed the transport ceiling.
//!
//! Outbound, [`Fragmenter`] slices a serialised packet into fragment packets
//! whose `data` fits the configured size. Inbound, [`Reassembler`] buffers
//! fragments per channel until the advertised count is reached and hands back
//! the concatenated text.

pub mod config;
pub mod error;
pub mod fragmenter;
pub mod index;
pub mod reassembler;

pub use config::{FragmentArithmetic, ReassemblyConfig};
pub use error::ReassemblyError;
pub use fragmenter::{Fragmenter, wire_len};
pub use index::FragmentIndex;
pub use reassembler::{ReassembledPacket, Reassembler};

#[cfg(test)]
mod tests;
