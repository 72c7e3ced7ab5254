//! TCP convergence layer, version 3 (RFC 7242).
//!
//! Both peers open with a [`ContactHeader`], then exchange [`Message`]s.
//! Bundles always travel as a single data segment carrying both the start
//! and end flags. Either side ends the session by sending a bare shutdown
//! byte (`0x50`) and closing the stream.

use super::*;
use thiserror::Error;

mod contact_header;
mod message;
mod session;

pub use contact_header::{ContactFlags, ContactHeader, MAGIC, VERSION};
pub use message::{Message, MessageCodec, MessageType, SegmentFlags, ShutdownReason};
pub use session::{Connection, State, listen};

#[derive(Error, Debug)]
pub enum Error {
    #[error("Contact header does not start with 'dtn!'")]
    InvalidMagic,

    #[error("Unsupported TCPCL version {0}")]
    UnsupportedVersion(u8),

    #[error("EID is not ASCII")]
    InvalidEid,

    #[error("Malformed SDNV length")]
    MalformedLength,

    #[error("Invalid message type {0}")]
    InvalidMessageType(u8),

    #[error("Unsupported data segment flags {0:#x}, only single-segment bundles are supported")]
    UnsupportedSegmentFlags(u8),

    #[error("Segment of {0} bytes exceeds the {1} byte limit")]
    SegmentTooLarge(u64, usize),

    #[error("Session is {0:?}")]
    InvalidState(State),

    #[error(transparent)]
    Transport(#[from] transport::Error),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Transport(e.into())
    }
}

/// Decodes an SDNV starting at `offset`, returning the offset just past it.
fn parse_sdnv(data: &[u8], offset: usize) -> Result<Parsed<u64>, Error> {
    match bpwire_sdnv::decode(data.get(offset..).unwrap_or_default()) {
        Ok((value, len)) => Ok(Parsed::Complete(value, offset + len)),
        Err(bpwire_sdnv::Error::NeedMoreData(n)) => Ok(Parsed::Incomplete(offset + n)),
        Err(_) => Err(Error::MalformedLength),
    }
}
