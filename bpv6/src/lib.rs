//! An encoder for RFC 5050 (BPv6) bundles.
//!
//! Only what a sender needs is provided: a primary block with an
//! uncompressed EID dictionary, followed by a single payload block. Every
//! integer field is an SDNV.

use thiserror::Error;

mod bundle;
mod flags;

pub use bpwire_bpv7::{DtnTime, Eid, SequenceCounter};
pub use bundle::{Bundle, FragmentInfo};
pub use flags::{BlockFlags, BundleFlags};

/// Block type of the primary block, doubling as the protocol version.
pub const VERSION: u8 = 0x06;

/// Block type of the payload block.
pub const PAYLOAD_BLOCK: u8 = 0x01;

#[derive(Error, Debug)]
pub enum Error {
    #[error("The bundle is flagged as a fragment but has no fragment offset")]
    MissingFragmentInfo,

    #[error("Fragment offset supplied for a bundle not flagged as a fragment")]
    UnexpectedFragmentInfo,

    #[error("Fragment offset {0} is not less than the total length {1}")]
    InvalidFragmentInfo(u64, u64),
}
