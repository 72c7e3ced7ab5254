//! The Application Agent Protocol used between local applications and a
//! DTN daemon.
//!
//! Every message starts with a header byte holding the protocol version
//! (high nibble, always 1) and the message type (low nibble). Depending on
//! the type, it is followed by an EID (`u16` length + ASCII), a bundle
//! payload (`u64` length + bytes) and/or a bundle identifier (`u64`). All
//! integers are big-endian.

use thiserror::Error;

mod codec;
mod message;

pub use codec::MessageCodec;
pub use message::{Message, MessageType, VERSION};

#[derive(Error, Debug)]
pub enum Error {
    /// The buffer holds a valid prefix of a message. The value is the total
    /// number of bytes required before parsing can progress.
    #[error("Need at least {0} bytes to parse the message")]
    NeedMoreData(usize),

    #[error("Unsupported AAP version {0}")]
    InvalidVersion(u8),

    #[error("Invalid message type {0}")]
    InvalidMessageType(u8),

    #[error("EID is not ASCII")]
    InvalidEid,

    #[error("EID of {0} bytes is too long")]
    EidTooLong(usize),

    #[error("Payload of {0} bytes exceeds the {1} byte limit")]
    PayloadTooLarge(u64, usize),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
