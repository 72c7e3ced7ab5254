use super::*;
use crate::config::SppConfig;
use core::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, trace};

/// A TCPSPP link: one unsegmented space packet per bundle.
pub struct Connection<S> {
    stream: S,
    format: Format,
    apid: u16,
    sequence_count: u16,
    recv_timeout: Option<Duration>,
}

impl Connection<TcpStream> {
    #[cfg_attr(feature = "instrument", tracing::instrument(skip(config)))]
    pub async fn connect(address: SocketAddr, config: &SppConfig) -> Result<Self, Error> {
        let stream = TcpStream::connect(address).await?;
        stream.set_nodelay(true)?;
        debug!("TCPSPP connected to {address}");
        Self::new(stream, config)
    }
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, config: &SppConfig) -> Result<Self, Error> {
        if config.apid > MAX_APID {
            return Err(Error::ApidOutOfRange(config.apid));
        }
        Ok(Self {
            stream,
            format: config.into(),
            apid: config.apid,
            sequence_count: 0,
            recv_timeout: config::seconds(config.recv_timeout),
        })
    }

    pub fn format(&self) -> &Format {
        &self.format
    }

    /// Sends `bundle` as the payload of the next packet in sequence.
    pub async fn send_bundle(&mut self, bundle: &[u8]) -> Result<(), Error> {
        let packet = SpacePacket {
            apid: self.apid,
            sequence_count: self.sequence_count,
            timecode: self.format.timecode.then(Timecode::now),
            ancillary_data: (self.format.ancillary_data_len > 0)
                .then(|| vec![0u8; self.format.ancillary_data_len].into()),
            payload: Bytes::copy_from_slice(bundle),
            ..Default::default()
        };
        let data = packet.encode(self.format.crc)?;
        self.stream.write_all(&data).await?;
        self.stream.flush().await?;

        trace!(
            "Sent bundle of {} bytes as packet {}",
            bundle.len(),
            self.sequence_count
        );
        self.sequence_count = (self.sequence_count + 1) & MAX_SEQUENCE_COUNT;
        Ok(())
    }

    /// Waits for the next packet and returns its payload.
    ///
    /// A CRC mismatch is an error; the packet's bytes have been consumed, so
    /// the caller may carry on with the next one.
    pub async fn recv_bundle(&mut self) -> Result<Bytes, Error> {
        let format = self.format;
        let parsed = transport::read_parsed(&mut self.stream, self.recv_timeout, |data| {
            SpacePacket::parse(data, &format)
        })
        .await?;
        parsed.verify_crc()?;

        trace!(
            "Received packet APID {:#x} count {} with {} byte payload",
            parsed.packet.apid,
            parsed.packet.sequence_count,
            parsed.packet.payload.len()
        );
        Ok(parsed.packet.payload)
    }

    pub async fn disconnect(mut self) -> Result<(), Error> {
        self.stream.shutdown().await?;
        Ok(())
    }
}
