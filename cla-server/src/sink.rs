use async_trait::async_trait;
use bpwire_cla::{Peer, Sink};
use tokio_util::bytes::Bytes;
use tracing::{info, warn};

/// Logs a one-line summary of every bundle received.
pub struct LoggingSink;

#[async_trait]
impl Sink for LoggingSink {
    async fn dispatch(&self, peer: &Peer, bundle: Bytes) {
        match summarise(&bundle) {
            Ok(summary) => info!("Bundle from {} ({:?}): {summary}", peer.addr, peer.eid),
            Err(e) => warn!(
                "Received {} bytes from {} that are not a valid BPv7 bundle: {e}",
                bundle.len(),
                peer.addr
            ),
        }
    }
}

pub fn summarise(data: &[u8]) -> Result<String, bpwire_bpv7::Error> {
    let bundle = bpwire_bpv7::Bundle::parse(data)?;
    let crc = match bundle.verify_crcs() {
        Ok(()) => "ok".to_string(),
        Err(e) => e.to_string(),
    };
    let primary = &bundle.primary;
    Ok(format!(
        "{} -> {}, created {} #{}, lifetime {:?}, {} extension blocks, {} byte payload, CRC {crc}",
        primary.source,
        primary.destination,
        primary.timestamp.creation_time.secs(),
        primary.timestamp.sequence_number,
        primary.lifetime,
        bundle.blocks().len(),
        bundle.payload().data.len(),
    ))
}
