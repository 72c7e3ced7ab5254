//! Convergence-layer framing for carrying encoded bundles over byte streams
//! and packet links.
//!
//! Three framings are provided:
//!
//! * [`mtcp`]: each bundle is sent as a CBOR byte string, with no session.
//! * [`tcpcl`]: TCPCL version 3 (RFC 7242), with a contact header exchange
//!   followed by single-segment data messages.
//! * [`spp`]: CCSDS Space Packets with an optional time code and CRC trailer.
//!
//! Every parser is incremental: it returns [`Parsed::Incomplete`] with the
//! total number of bytes it needs whenever the input is a valid prefix, so a
//! reader can fetch exactly that many and try again.

use async_trait::async_trait;
use std::net::SocketAddr;
use tokio_util::bytes::Bytes;

pub mod config;
pub mod mtcp;
pub mod spp;
pub mod tcpcl;
pub mod transport;

mod listen;

#[cfg(test)]
mod test_sink;

pub use listen::Listener;

/// The outcome of parsing from the front of a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed<T> {
    /// A complete item, and the number of bytes it occupied.
    Complete(T, usize),

    /// The buffer is a valid prefix. The value is the total number of bytes
    /// required before parsing can progress.
    Incomplete(usize),
}

impl<T> Parsed<T> {
    pub fn map<U, F>(self, f: F) -> Parsed<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Parsed::Complete(t, len) => Parsed::Complete(f(t), len),
            Parsed::Incomplete(n) => Parsed::Incomplete(n),
        }
    }

    pub fn complete(self) -> Option<(T, usize)> {
        match self {
            Parsed::Complete(t, len) => Some((t, len)),
            Parsed::Incomplete(_) => None,
        }
    }
}

/// The remote end of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    pub addr: SocketAddr,

    /// The EID the peer announced, for protocols that carry one.
    pub eid: Option<String>,
}

/// Receives the bundles arriving on a listener's sessions.
#[async_trait]
pub trait Sink: Send + Sync {
    async fn dispatch(&self, peer: &Peer, bundle: Bytes);
}
