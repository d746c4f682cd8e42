//! Domain models for range probing.
//!
//! - [`AddressRange`] and [`Candidate`] - CIDR blocks and the address picked for each
//! - [`Latency`], [`ProbeResult`] and [`RankedList`] - probe outcomes and the final shortlist

mod latency;
mod range;

// Re-export public types
pub use latency::{Latency, ProbeResult, RankedList};
pub use range::{
    addr_bits, addr_from_bits, broadcast_addr, cut_addr, get_cidr_mask, AddressRange, Candidate,
    Family, RangeParseError, MAX_LENGTH_V4, MAX_LENGTH_V6,
};
