//! Minimal TCP framing.
//!
//! Each bundle is written to the stream as a single definite-length CBOR byte
//! string. There is no handshake and no session state: closing the stream is
//! the only way to end a connection.

use super::*;
use bpwire_cbor::{decode::parse_head, encode as cbor};
use crate::config::MtcpConfig;
use core::time::Duration;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::bytes::{Buf, BufMut, BytesMut};
use tracing::{debug, info, trace};

#[derive(Error, Debug)]
pub enum Error {
    #[error("Expected a CBOR byte string, found major type {0}")]
    InvalidMajorType(u8),

    #[error("Invalid byte string length encoding")]
    InvalidLength(#[from] bpwire_cbor::decode::Error),

    #[error("Bundle of {0} bytes exceeds the {1} byte limit")]
    BundleTooLarge(u64, usize),

    #[error(transparent)]
    Transport(#[from] transport::Error),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Transport(e.into())
    }
}

/// The byte string head that precedes a bundle of `len` bytes.
pub fn encode_header(len: usize) -> Vec<u8> {
    cbor::emit_head(cbor::BYTES, len as u64)
}

pub fn encode(bundle: &[u8]) -> Vec<u8> {
    cbor::emit(bundle)
}

/// Parses one framed bundle from the front of `data`.
pub fn parse(data: &[u8]) -> Result<Parsed<&[u8]>, Error> {
    parse_with_limit(data, usize::MAX)
}

pub fn parse_with_limit(data: &[u8], max_bundle_len: usize) -> Result<Parsed<&[u8]>, Error> {
    let Some(&first) = data.first() else {
        return Ok(Parsed::Incomplete(1));
    };
    if first >> 5 != 2 {
        return Err(Error::InvalidMajorType(first >> 5));
    }

    let (_, len, head_len) = match parse_head(data) {
        Ok(head) => head,
        Err(bpwire_cbor::decode::Error::NeedMoreData(n)) => {
            return Ok(Parsed::Incomplete(data.len() + n));
        }
        Err(e) => return Err(e.into()),
    };

    let body_len = usize::try_from(len)
        .ok()
        .filter(|len| *len <= max_bundle_len)
        .ok_or(Error::BundleTooLarge(len, max_bundle_len))?;
    let total = head_len
        .checked_add(body_len)
        .ok_or(Error::BundleTooLarge(len, max_bundle_len))?;
    if data.len() < total {
        Ok(Parsed::Incomplete(total))
    } else {
        Ok(Parsed::Complete(&data[head_len..total], total))
    }
}

/// A [`tokio_util::codec`] adapter yielding one bundle per frame.
#[derive(Debug, Clone)]
pub struct MtcpCodec {
    max_bundle_len: usize,
}

impl MtcpCodec {
    pub fn new(max_bundle_len: usize) -> Self {
        Self { max_bundle_len }
    }
}

impl Default for MtcpCodec {
    fn default() -> Self {
        Self::new(MtcpConfig::default().max_bundle_len)
    }
}

impl tokio_util::codec::Decoder for MtcpCodec {
    type Item = Bytes;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match parse_with_limit(src, self.max_bundle_len)? {
            Parsed::Complete(bundle, total) => {
                let head_len = total - bundle.len();
                src.advance(head_len);
                Ok(Some(src.split_to(total - head_len).freeze()))
            }
            Parsed::Incomplete(needed) => {
                src.reserve(needed.saturating_sub(src.len()));
                Ok(None)
            }
        }
    }
}

impl tokio_util::codec::Encoder<&[u8]> for MtcpCodec {
    type Error = Error;

    fn encode(&mut self, item: &[u8], dst: &mut BytesMut) -> Result<(), Self::Error> {
        let head = encode_header(item.len());
        dst.reserve(head.len() + item.len());
        dst.put_slice(&head);
        dst.put_slice(item);
        Ok(())
    }
}

impl tokio_util::codec::Encoder<Bytes> for MtcpCodec {
    type Error = Error;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        tokio_util::codec::Encoder::<&[u8]>::encode(self, &item, dst)
    }
}

/// An MTCP connection over any byte stream.
pub struct Connection<S> {
    stream: S,
    recv_timeout: Option<Duration>,
    max_bundle_len: usize,
}

impl Connection<TcpStream> {
    #[cfg_attr(feature = "instrument", tracing::instrument(skip(config)))]
    pub async fn connect(address: SocketAddr, config: &MtcpConfig) -> Result<Self, Error> {
        let stream = TcpStream::connect(address).await?;
        debug!("Connected to {address}");
        Ok(Self::new(stream, config))
    }
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, config: &MtcpConfig) -> Self {
        Self {
            stream,
            recv_timeout: config::seconds(config.recv_timeout),
            max_bundle_len: config.max_bundle_len,
        }
    }

    pub async fn send_bundle(&mut self, bundle: &[u8]) -> Result<(), Error> {
        self.stream.write_all(&encode_header(bundle.len())).await?;
        self.stream.write_all(bundle).await?;
        self.stream.flush().await?;
        trace!("Sent bundle of {} bytes", bundle.len());
        Ok(())
    }

    pub async fn recv_bundle(&mut self) -> Result<Bytes, Error> {
        let max_bundle_len = self.max_bundle_len;
        let bundle = transport::read_parsed(&mut self.stream, self.recv_timeout, |data| {
            parse_with_limit(data, max_bundle_len).map(|p| p.map(Bytes::copy_from_slice))
        })
        .await?;
        trace!("Received bundle of {} bytes", bundle.len());
        Ok(bundle)
    }

    pub async fn disconnect(mut self) -> Result<(), Error> {
        self.stream.shutdown().await?;
        Ok(())
    }
}

/// Starts an MTCP listener delivering every received bundle to `sink`.
pub async fn listen(config: MtcpConfig, sink: Arc<dyn Sink>) -> std::io::Result<Listener> {
    let address = config.address;
    let max_sessions = config.max_sessions;
    let config = Arc::new(config);
    Listener::bind(address, max_sessions, &[], move |stream, addr, cancel_token| {
        session(stream, addr, config.clone(), sink.clone(), cancel_token)
    })
    .await
}

async fn session(
    stream: TcpStream,
    addr: SocketAddr,
    config: Arc<MtcpConfig>,
    sink: Arc<dyn Sink>,
    cancel_token: bpwire_async::CancellationToken,
) {
    let peer = Peer { addr, eid: None };
    let mut connection = Connection::new(stream, &config);
    loop {
        match transport::cancellable(connection.recv_bundle(), &cancel_token).await {
            Ok(bundle) => sink.dispatch(&peer, bundle).await,
            Err(Error::Transport(transport::Error::Hangup)) => {
                debug!("Peer {addr} closed the connection");
                return;
            }
            Err(Error::Transport(transport::Error::Cancelled)) => break,
            Err(e) => {
                info!("Closing connection from {addr}: {e}");
                break;
            }
        }
    }
    _ = connection
        .disconnect()
        .await
        .inspect_err(|e| debug!("Failed to close connection to {addr}: {e}"));
}

#[cfg(test)]
mod test {
    use super::*;
    use hex_literal::hex;
    use tokio_util::codec::Decoder;

    #[test]
    fn header_widths() {
        assert_eq!(encode(b"hello"), hex!("45 68656c6c6f"));
        assert_eq!(encode_header(23), hex!("57"));
        assert_eq!(encode_header(24), hex!("5818"));
        assert_eq!(encode_header(300), hex!("59012c"));
        assert_eq!(encode_header(70000), hex!("5a00011170"));
        assert_eq!(encode_header(1 << 32), hex!("5b0000000100000000"));
    }

    #[test]
    fn byte_at_a_time() {
        let bundle = vec![0xa5u8; 300];
        let data = encode(&bundle);

        for len in 0..data.len() {
            match parse(&data[..len]).unwrap() {
                Parsed::Incomplete(needed) => assert!(needed > len, "prefix of {len} bytes"),
                Parsed::Complete(..) => panic!("complete after {len} bytes"),
            }
        }
        assert_eq!(parse(&data[..1]).unwrap(), Parsed::Incomplete(3));
        assert_eq!(parse(&data[..3]).unwrap(), Parsed::Incomplete(303));
        assert_eq!(
            parse(&data).unwrap(),
            Parsed::Complete(&bundle[..], data.len())
        );
    }

    #[test]
    fn trailing_bytes_ignored() {
        assert_eq!(
            parse(&hex!("43 010203 44")).unwrap(),
            Parsed::Complete(&hex!("010203")[..], 4)
        );
    }

    #[test]
    fn malformed() {
        assert!(matches!(
            parse(&hex!("83 010203")),
            Err(Error::InvalidMajorType(4))
        ));
        assert!(matches!(parse(&hex!("5f")), Err(Error::InvalidLength(_))));
        assert!(matches!(
            parse_with_limit(&hex!("5818"), 16),
            Err(Error::BundleTooLarge(24, 16))
        ));
    }

    #[test]
    fn oversized_length() {
        let data = hex!("5b ffffffffffffffff");
        assert!(matches!(
            parse(&data),
            Err(Error::BundleTooLarge(u64::MAX, _))
        ));
        assert!(matches!(
            parse_with_limit(&data, 1024),
            Err(Error::BundleTooLarge(u64::MAX, 1024))
        ));
        assert!(matches!(
            MtcpCodec::new(usize::MAX).decode(&mut BytesMut::from(&data[..])),
            Err(Error::BundleTooLarge(u64::MAX, _))
        ));

        // A plausible length is only ever a request for more data
        assert!(matches!(
            parse(&hex!("5a 00010000 00")),
            Ok(Parsed::Incomplete(65541))
        ));
    }

    #[test]
    fn codec() {
        let mut codec = MtcpCodec::default();
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&encode(b"one"));
        buf.extend_from_slice(&encode(b"two")[..2]);

        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some(&b"one"[..]));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        buf.extend_from_slice(b"o");
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some(&b"two"[..]));
        assert!(buf.is_empty());
    }

    #[tokio::test]
    async fn connection() {
        let (a, b) = tokio::io::duplex(64);
        let config = MtcpConfig::default();
        let mut a = Connection::new(a, &config);
        let mut b = Connection::new(b, &config);

        let big = vec![7u8; 1000];
        let send = async {
            a.send_bundle(b"small").await.unwrap();
            a.send_bundle(&big).await.unwrap();
            a.disconnect().await.unwrap();
        };
        let recv = async {
            let first = b.recv_bundle().await.unwrap();
            let second = b.recv_bundle().await.unwrap();
            let end = b.recv_bundle().await;
            (first, second, end)
        };
        let ((), (first, second, end)) = tokio::join!(send, recv);
        assert_eq!(&first[..], b"small");
        assert_eq!(&second[..], &big[..]);
        assert!(matches!(end, Err(Error::Transport(transport::Error::Hangup))));
    }

    #[tokio::test]
    async fn listener() {
        let (sink, mut rx) = test_sink::ChannelSink::new();
        let listener = listen(
            MtcpConfig {
                address: "127.0.0.1:0".parse().unwrap(),
                ..Default::default()
            },
            sink,
        )
        .await
        .unwrap();

        let mut client = Connection::connect(listener.local_addr(), &MtcpConfig::default())
            .await
            .unwrap();
        client.send_bundle(b"first").await.unwrap();
        client.send_bundle(b"second").await.unwrap();

        let (peer, bundle) = rx.recv().await.unwrap();
        assert_eq!(&bundle[..], b"first");
        assert_eq!(peer.eid, None);
        assert_eq!(&rx.recv().await.unwrap().1[..], b"second");

        listener.shutdown().await;

        // The server side closes its end once cancelled
        assert!(matches!(
            client.recv_bundle().await,
            Err(Error::Transport(transport::Error::Hangup))
        ));
    }
}
