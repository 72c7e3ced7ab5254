//! CCSDS Space Packet framing, and TCPSPP: space packets carried back to back
//! over a TCP stream.
//!
//! A packet is a 6 byte [`PrimaryHeader`], an optional secondary header
//! holding a [`Timecode`] and/or fixed-size ancillary data, the payload, and
//! an optional CRC-16/CCITT-FALSE trailer. Whether a link uses the time code,
//! ancillary data or CRC is not signalled on the wire, so both ends must
//! agree on a [`Format`].

use super::*;
use thiserror::Error;

mod connection;
mod header;
mod packet;
mod timecode;

pub use connection::Connection;
pub use header::{PrimaryHeader, SequenceFlags};
pub use packet::{CrcValue, ParsedPacket, SpacePacket, SpacePacketCodec};
pub use timecode::{CCSDS_EPOCH, Timecode, TimecodeType};

pub const MAX_APID: u16 = 0x7FF;
pub const MAX_SEQUENCE_COUNT: u16 = 0x3FFF;
pub const MAX_DATA_LENGTH: usize = 65536;

#[derive(Error, Debug)]
pub enum Error {
    #[error("APID {0:#x} exceeds {MAX_APID:#x}")]
    ApidOutOfRange(u16),

    #[error("Sequence count {0:#x} exceeds {MAX_SEQUENCE_COUNT:#x}")]
    SequenceCountOutOfRange(u16),

    #[error("Packet data of {0} bytes exceeds {MAX_DATA_LENGTH} bytes")]
    DataTooLong(usize),

    #[error("A packet without a secondary header needs at least one byte of payload")]
    EmptyPayload,

    #[error("Unsupported packet version {0}")]
    UnsupportedVersion(u8),

    #[error("Unsupported time code type {0}")]
    UnsupportedTimecode(u8),

    #[error("Invalid time code: {0}")]
    InvalidTimecode(&'static str),

    #[error("Declared data length {0} is too short for the configured packet format")]
    DataLengthTooShort(usize),

    #[error("CRC mismatch: packet carries {on_wire:#06x}, computed {computed:#06x}")]
    ChecksumMismatch { on_wire: u16, computed: u16 },

    #[error(transparent)]
    Transport(#[from] transport::Error),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Transport(e.into())
    }
}

/// The per-link packet layout both ends have agreed on.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Format {
    /// The secondary header starts with a time code.
    pub timecode: bool,

    /// Octets of ancillary data following any time code.
    pub ancillary_data_len: usize,

    /// Packets end with a CRC-16 trailer.
    pub crc: bool,
}

impl From<&config::SppConfig> for Format {
    fn from(config: &config::SppConfig) -> Self {
        Self {
            timecode: config.timecode,
            ancillary_data_len: config.ancillary_data_len,
            crc: config.crc,
        }
    }
}
