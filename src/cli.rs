//! Command line interface for the packnet demo binary.
//!
//! The demo connects two packs over an in-process bus, so every option here
//! shapes that one exchange.

use std::num::NonZeroUsize;

use clap::Parser;

/// Command line arguments for the `packnet` binary.
#[derive(Debug, Parser)]
#[command(
    name = "packnet",
    version,
    about = "Exchange discovery and fragmented packets between two in-process packs"
)]
pub struct Cli {
    /// Identifier of the sending pack.
    #[arg(short, long, default_value = "alpha")]
    pub name: String,

    /// Largest packet sent unfragmented, in serialisation units.
    #[arg(short, long, default_value = "128")]
    pub fragment_size: NonZeroUsize,

    /// Length of the padding carried by the demo payload.
    #[arg(short, long, default_value_t = 300)]
    pub payload_size: usize,

    /// Deliver the payload's fragments in reverse order.
    #[arg(short, long)]
    pub reverse: bool,

    /// Use ceiling fragment counts and zero-based split indices.
    #[arg(long)]
    pub corrected: bool,
}
