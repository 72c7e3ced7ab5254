use super::*;
use crate::config::TcpclConfig;
use core::time::Duration;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info, trace};

/// The bare SHUTDOWN message, also sent to connections refused at the session limit.
const SHUTDOWN: &[u8] = &[0x50];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    NotConnected,
    HeaderExchanged,
    Active,
    Terminating,
    Closed,
}

/// One end of a TCPCLv3 session.
///
/// A connection must be ended with [`Connection::disconnect`]; dropping it
/// closes the stream without the shutdown byte.
pub struct Connection<S> {
    stream: S,
    state: State,
    local: ContactHeader,
    peer: Option<ContactHeader>,
    contact_timeout: Duration,
    recv_timeout: Option<Duration>,
    max_segment_len: usize,

    // Set once the stream has failed or the peer has hung up
    closing: bool,
}

impl Connection<TcpStream> {
    /// Connects to `address` and exchanges contact headers.
    #[cfg_attr(feature = "instrument", tracing::instrument(skip(config)))]
    pub async fn connect(address: SocketAddr, config: &TcpclConfig) -> Result<Self, Error> {
        let stream = TcpStream::connect(address).await?;
        let mut connection = Self::new(stream, config);
        if let Err(e) = connection.handshake().await {
            _ = connection.disconnect().await;
            return Err(e);
        }
        Ok(connection)
    }
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, config: &TcpclConfig) -> Self {
        Self {
            stream,
            state: State::NotConnected,
            local: ContactHeader::new(config.local_eid.clone(), config.keepalive_interval),
            peer: None,
            contact_timeout: Duration::from_secs(config.contact_timeout as u64),
            recv_timeout: config::seconds(config.recv_timeout),
            max_segment_len: config.max_bundle_len,
            closing: false,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// The peer's contact header, once exchanged.
    pub fn peer(&self) -> Option<&ContactHeader> {
        self.peer.as_ref()
    }

    /// The lower of the two advertised keepalive intervals, 0 if either side
    /// disabled keepalives.
    pub fn keepalive_interval(&self) -> u16 {
        self.peer.as_ref().map_or(0, |peer| {
            peer.keepalive_interval.min(self.local.keepalive_interval)
        })
    }

    /// Sends our contact header and waits for the peer's.
    pub async fn handshake(&mut self) -> Result<(), Error> {
        if self.state != State::NotConnected {
            return Err(Error::InvalidState(self.state));
        }
        let local = self.local.encode()?;
        self.write(&local).await?;

        let peer = transport::read_parsed(
            &mut self.stream,
            Some(self.contact_timeout),
            ContactHeader::parse,
        )
        .await
        .inspect_err(|e| self.note_failure(e))?;

        debug!(
            "Contact header received: {}, keepalive {}s",
            peer.eid, peer.keepalive_interval
        );
        self.peer = Some(peer);
        self.state = State::HeaderExchanged;
        Ok(())
    }

    pub async fn send_bundle(&mut self, bundle: &[u8]) -> Result<(), Error> {
        self.check_open()?;

        let mut head = Vec::with_capacity(1 + bpwire_sdnv::MAX_ENCODED_LEN);
        head.push(((MessageType::DataSegment as u8) << 4) | 0x3);
        bpwire_sdnv::encode_into(bundle.len() as u64, &mut head);
        self.write(&head).await?;
        self.write(bundle).await?;

        trace!("Sent bundle of {} bytes", bundle.len());
        self.state = State::Active;
        Ok(())
    }

    /// Waits for the next bundle.
    ///
    /// Returns `None` once the peer has sent a shutdown message. Nothing
    /// after the shutdown is read.
    pub async fn recv_bundle(&mut self) -> Result<Option<Bytes>, Error> {
        self.check_open()?;

        loop {
            let max_segment_len = self.max_segment_len;
            let message = transport::read_parsed(&mut self.stream, self.recv_timeout, |data| {
                Message::parse(data, max_segment_len)
            })
            .await
            .inspect_err(|e| self.note_failure(e))?;

            match message {
                Message::DataSegment(bundle) => {
                    trace!("Received bundle of {} bytes", bundle.len());
                    self.state = State::Active;
                    return Ok(Some(bundle));
                }
                Message::Shutdown {
                    reason,
                    reconnect_delay,
                } => {
                    debug!("Peer sent shutdown, reason {reason:?}, delay {reconnect_delay:?}");
                    self.state = State::Terminating;
                    return Ok(None);
                }
                Message::Keepalive => trace!("Keepalive received"),
                message => debug!("Ignoring {:?} message", message.message_type()),
            }
        }
    }

    /// Sends the shutdown byte, unless the stream is already failing, then
    /// closes the stream.
    pub async fn disconnect(&mut self) -> Result<(), Error> {
        if self.state == State::Closed {
            return Ok(());
        }
        self.state = State::Terminating;

        let r = if self.closing {
            Ok(())
        } else {
            self.write(&Message::shutdown().encode()).await
        };
        let closed = self.stream.shutdown().await;
        self.state = State::Closed;
        r?;
        closed.map_err(Into::into)
    }

    fn check_open(&self) -> Result<(), Error> {
        match self.state {
            State::HeaderExchanged | State::Active => Ok(()),
            state => Err(Error::InvalidState(state)),
        }
    }

    async fn write(&mut self, data: &[u8]) -> Result<(), Error> {
        let r = async {
            self.stream.write_all(data).await?;
            self.stream.flush().await
        }
        .await;
        if r.is_err() {
            self.closing = true;
        }
        r.map_err(Into::into)
    }

    fn note_failure(&mut self, e: &Error) {
        if matches!(
            e,
            Error::Transport(transport::Error::Hangup | transport::Error::Io(_))
        ) {
            self.closing = true;
        }
    }
}

/// Starts a TCPCLv3 listener delivering every received bundle to `sink`.
pub async fn listen(config: TcpclConfig, sink: Arc<dyn Sink>) -> std::io::Result<Listener> {
    let address = config.address;
    let max_sessions = config.max_sessions;
    let config = Arc::new(config);
    Listener::bind(address, max_sessions, SHUTDOWN, move |stream, addr, cancel_token| {
        session(stream, addr, config.clone(), sink.clone(), cancel_token)
    })
    .await
}

async fn session(
    stream: TcpStream,
    addr: SocketAddr,
    config: Arc<TcpclConfig>,
    sink: Arc<dyn Sink>,
    cancel_token: bpwire_async::CancellationToken,
) {
    let mut connection = Connection::new(stream, &config);

    match transport::cancellable(connection.handshake(), &cancel_token).await {
        Ok(()) => {
            let peer = Peer {
                addr,
                eid: connection.peer().map(|header| header.eid.clone()),
            };
            info!("TCPCL session established with {addr}, peer EID {:?}", peer.eid);

            loop {
                match transport::cancellable(connection.recv_bundle(), &cancel_token).await {
                    Ok(Some(bundle)) => sink.dispatch(&peer, bundle).await,
                    Ok(None) => {
                        debug!("Peer {addr} ended the session");
                        break;
                    }
                    Err(Error::Transport(transport::Error::Cancelled)) => {
                        debug!("Session with {addr} cancelled");
                        break;
                    }
                    Err(e) => {
                        info!("Session with {addr} failed: {e}");
                        break;
                    }
                }
            }
        }
        Err(e) => info!("Contact header exchange with {addr} failed: {e}"),
    }

    if let Err(e) = connection.disconnect().await {
        debug!("Failed to terminate session with {addr}: {e}");
    }
    debug!("Session with {addr} closed");
}
