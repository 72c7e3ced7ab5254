//! The BPv7 bundle block model and codec.
//!
//! A [`Bundle`] is a primary block, an ordered list of extension blocks, and a
//! payload block, encoded as an indefinite-length CBOR array. Blocks may carry
//! a CRC-16/X25 or CRC-32C over their own encoding; decoding exposes both the
//! CRC found on the wire and the one recomputed from the received bytes so a
//! caller can decide what a mismatch means.

use bpwire_cbor as cbor;

mod block;
mod block_flags;
mod block_type;
mod bundle;
mod bundle_flags;
mod crc;
mod creation_timestamp;
mod dtn_time;
mod error;
mod extension;
mod primary_block;

pub mod builder;
pub mod eid;
pub mod status_report;

pub use block::CanonicalBlock;
pub use block_flags::BlockFlags;
pub use block_type::BlockType;
pub use bundle::Bundle;
pub use bundle_flags::BundleFlags;
pub use crc::{CrcType, CrcValue};
pub use creation_timestamp::{CreationTimestamp, SequenceCounter};
pub use dtn_time::{DtnTime, UNIX_EPOCH_OFFSET};
pub use eid::Eid;
pub use error::Error;
pub use extension::{BundleAge, HopCount, PreviousNode};
pub use primary_block::{FragmentInfo, PrimaryBlock};

#[cfg(test)]
mod bundle_tests;
