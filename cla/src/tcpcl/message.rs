use super::*;
use tokio_util::bytes::{Buf, BufMut, BytesMut};
use tracing::trace;

#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MessageType {
    DataSegment = 0x1,
    AckSegment = 0x2,
    RefuseBundle = 0x3,
    Keepalive = 0x4,
    Shutdown = 0x5,
    Length = 0x6,
}

impl TryFrom<u8> for MessageType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x1 => Ok(Self::DataSegment),
            0x2 => Ok(Self::AckSegment),
            0x3 => Ok(Self::RefuseBundle),
            0x4 => Ok(Self::Keepalive),
            0x5 => Ok(Self::Shutdown),
            0x6 => Ok(Self::Length),
            n => Err(Error::InvalidMessageType(n)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentFlags {
    pub start: bool,
    pub end: bool,
}

impl From<u8> for SegmentFlags {
    fn from(value: u8) -> Self {
        Self {
            start: value & 0x02 != 0,
            end: value & 0x01 != 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    IdleTimeout,
    VersionMismatch,
    Busy,
    Unassigned(u8),
}

impl From<u8> for ShutdownReason {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::IdleTimeout,
            1 => Self::VersionMismatch,
            2 => Self::Busy,
            n => Self::Unassigned(n),
        }
    }
}

impl From<ShutdownReason> for u8 {
    fn from(value: ShutdownReason) -> Self {
        match value {
            ShutdownReason::IdleTimeout => 0,
            ShutdownReason::VersionMismatch => 1,
            ShutdownReason::Busy => 2,
            ShutdownReason::Unassigned(n) => n,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// A whole bundle, sent as one segment with both start and end set.
    DataSegment(Bytes),
    AckSegment(u64),
    RefuseBundle(u8),
    Keepalive,
    Shutdown {
        reason: Option<ShutdownReason>,
        reconnect_delay: Option<u64>,
    },
    Length(u64),
}

impl Message {
    /// The bare termination message, a single `0x50` byte.
    pub const fn shutdown() -> Self {
        Message::Shutdown {
            reason: None,
            reconnect_delay: None,
        }
    }

    pub fn message_type(&self) -> MessageType {
        match self {
            Message::DataSegment(_) => MessageType::DataSegment,
            Message::AckSegment(_) => MessageType::AckSegment,
            Message::RefuseBundle(_) => MessageType::RefuseBundle,
            Message::Keepalive => MessageType::Keepalive,
            Message::Shutdown { .. } => MessageType::Shutdown,
            Message::Length(_) => MessageType::Length,
        }
    }

    fn flags(&self) -> u8 {
        match self {
            Message::DataSegment(_) => 0x3,
            Message::RefuseBundle(reason) => reason & 0x0F,
            Message::Shutdown {
                reason,
                reconnect_delay,
            } => {
                (if reason.is_some() { 0x02 } else { 0 })
                    | (if reconnect_delay.is_some() { 0x01 } else { 0 })
            }
            _ => 0,
        }
    }

    pub fn encoded_len(&self) -> usize {
        1 + match self {
            Message::DataSegment(data) => {
                bpwire_sdnv::encoded_len(data.len() as u64) + data.len()
            }
            Message::AckSegment(n) | Message::Length(n) => bpwire_sdnv::encoded_len(*n),
            Message::Shutdown {
                reason,
                reconnect_delay,
            } => {
                reason.map_or(0, |_| 1) + reconnect_delay.map_or(0, bpwire_sdnv::encoded_len)
            }
            Message::RefuseBundle(_) | Message::Keepalive => 0,
        }
    }

    pub fn encode_into(&self, dst: &mut impl BufMut) {
        dst.put_u8(((self.message_type() as u8) << 4) | self.flags());
        match self {
            Message::DataSegment(data) => {
                dst.put_slice(&bpwire_sdnv::encode(data.len() as u64));
                dst.put_slice(data);
            }
            Message::AckSegment(n) | Message::Length(n) => {
                dst.put_slice(&bpwire_sdnv::encode(*n));
            }
            Message::Shutdown {
                reason,
                reconnect_delay,
            } => {
                if let Some(reason) = reason {
                    dst.put_u8((*reason).into());
                }
                if let Some(delay) = reconnect_delay {
                    dst.put_slice(&bpwire_sdnv::encode(*delay));
                }
            }
            Message::RefuseBundle(_) | Message::Keepalive => {}
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut data);
        data
    }

    /// Parses one message from the front of `data`.
    ///
    /// Data segments longer than `max_segment_len` are rejected as soon as
    /// their length is known.
    pub fn parse(data: &[u8], max_segment_len: usize) -> Result<Parsed<Self>, Error> {
        let Some(&header) = data.first() else {
            return Ok(Parsed::Incomplete(1));
        };
        let flags = header & 0x0F;

        let message = match MessageType::try_from(header >> 4)? {
            MessageType::DataSegment => {
                let segment = SegmentFlags::from(flags);
                if !segment.start || !segment.end {
                    return Err(Error::UnsupportedSegmentFlags(flags));
                }
                let (len, offset) = match parse_sdnv(data, 1)? {
                    Parsed::Complete(len, offset) => (len, offset),
                    Parsed::Incomplete(n) => return Ok(Parsed::Incomplete(n)),
                };
                let end = usize::try_from(len)
                    .ok()
                    .filter(|len| *len <= max_segment_len)
                    .and_then(|len| len.checked_add(offset))
                    .ok_or(Error::SegmentTooLarge(len, max_segment_len))?;
                let Some(segment) = data.get(offset..end) else {
                    return Ok(Parsed::Incomplete(end));
                };
                return Ok(Parsed::Complete(
                    Message::DataSegment(Bytes::copy_from_slice(segment)),
                    end,
                ));
            }
            MessageType::AckSegment | MessageType::Length => {
                let (n, end) = match parse_sdnv(data, 1)? {
                    Parsed::Complete(n, end) => (n, end),
                    Parsed::Incomplete(n) => return Ok(Parsed::Incomplete(n)),
                };
                let message = if header >> 4 == MessageType::AckSegment as u8 {
                    Message::AckSegment(n)
                } else {
                    Message::Length(n)
                };
                return Ok(Parsed::Complete(message, end));
            }
            MessageType::RefuseBundle => Message::RefuseBundle(flags),
            MessageType::Keepalive => Message::Keepalive,
            MessageType::Shutdown => {
                let mut offset = 1;
                let reason = if flags & 0x02 != 0 {
                    let Some(&reason) = data.get(offset) else {
                        return Ok(Parsed::Incomplete(offset + 1));
                    };
                    offset += 1;
                    Some(reason.into())
                } else {
                    None
                };
                let reconnect_delay = if flags & 0x01 != 0 {
                    match parse_sdnv(data, offset)? {
                        Parsed::Complete(delay, end) => {
                            offset = end;
                            Some(delay)
                        }
                        Parsed::Incomplete(n) => return Ok(Parsed::Incomplete(n)),
                    }
                } else {
                    None
                };
                return Ok(Parsed::Complete(
                    Message::Shutdown {
                        reason,
                        reconnect_delay,
                    },
                    offset,
                ));
            }
        };
        Ok(Parsed::Complete(message, 1))
    }
}

/// A [`tokio_util::codec`] adapter for TCPCLv3 messages following the
/// contact header exchange.
#[derive(Debug, Clone)]
pub struct MessageCodec {
    max_segment_len: usize,
}

impl MessageCodec {
    pub fn new(max_segment_len: usize) -> Self {
        Self { max_segment_len }
    }
}

impl Default for MessageCodec {
    fn default() -> Self {
        Self::new(config::TcpclConfig::default().max_bundle_len)
    }
}

impl tokio_util::codec::Decoder for MessageCodec {
    type Item = Message;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match Message::parse(src, self.max_segment_len)? {
            Parsed::Complete(message, len) => {
                src.advance(len);
                trace!("Received {:?} message", message.message_type());
                Ok(Some(message))
            }
            Parsed::Incomplete(needed) => {
                src.reserve(needed.saturating_sub(src.len()));
                Ok(None)
            }
        }
    }
}

impl tokio_util::codec::Encoder<&Message> for MessageCodec {
    type Error = Error;

    fn encode(&mut self, item: &Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(item.encoded_len());
        item.encode_into(dst);
        Ok(())
    }
}

impl tokio_util::codec::Encoder<Message> for MessageCodec {
    type Error = Error;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        tokio_util::codec::Encoder::<&Message>::encode(self, &item, dst)
    }
}
