use core::num::NonZeroUsize;
use std::net::{Ipv6Addr, SocketAddr};

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TcpclConfig {
    // The TCP address:port to listen on
    pub address: SocketAddr, // default = [::]:4556

    // The EID sent in our contact header
    pub local_eid: String, // default = dtn://bpwire.dtn/

    // Keepalive interval in seconds advertised to the peer, 0 disables
    pub keepalive_interval: u16, // default 0

    // Seconds to wait for the peer's contact header
    pub contact_timeout: u16, // default 15

    // Seconds to wait for each read once a session is up
    pub recv_timeout: Option<u16>, // default none

    // Largest bundle accepted in a single data segment
    pub max_bundle_len: usize, // default 16MiB

    // Sessions served at once before new connections are refused
    pub max_sessions: NonZeroUsize, // default 64
}

impl Default for TcpclConfig {
    fn default() -> Self {
        Self {
            address: SocketAddr::new(Ipv6Addr::UNSPECIFIED.into(), 4556),
            local_eid: "dtn://bpwire.dtn/".into(),
            keepalive_interval: 0,
            contact_timeout: 15,
            recv_timeout: None,
            max_bundle_len: DEFAULT_MAX_BUNDLE_LEN,
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MtcpConfig {
    // The TCP address:port to listen on
    pub address: SocketAddr, // default = [::]:4224

    // Seconds to wait for each read, none waits forever
    pub recv_timeout: Option<u16>,

    pub max_bundle_len: usize, // default 16MiB

    pub max_sessions: NonZeroUsize, // default 64
}

impl Default for MtcpConfig {
    fn default() -> Self {
        Self {
            address: SocketAddr::new(Ipv6Addr::UNSPECIFIED.into(), 4224),
            recv_timeout: None,
            max_bundle_len: DEFAULT_MAX_BUNDLE_LEN,
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SppConfig {
    // Application process identifier stamped on outgoing packets
    pub apid: u16, // default 1

    // Whether packets carry a CCSDS unsegmented time code
    pub timecode: bool, // default true

    // Whether packets carry a CRC-16 trailer
    pub crc: bool, // default false

    // Octets of ancillary data in the secondary header
    pub ancillary_data_len: usize, // default 0

    // Seconds to wait for each read, none waits forever
    pub recv_timeout: Option<u16>,
}

impl Default for SppConfig {
    fn default() -> Self {
        Self {
            apid: 1,
            timecode: true,
            crc: false,
            ancillary_data_len: 0,
            recv_timeout: None,
        }
    }
}

const DEFAULT_MAX_BUNDLE_LEN: usize = 16 * 1024 * 1024;

const DEFAULT_MAX_SESSIONS: NonZeroUsize = match NonZeroUsize::new(64) {
    Some(n) => n,
    None => unreachable!(),
};

pub(crate) fn seconds(secs: Option<u16>) -> Option<core::time::Duration> {
    secs.map(|s| core::time::Duration::from_secs(s as u64))
}
