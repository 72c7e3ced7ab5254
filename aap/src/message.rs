use super::*;
use tokio_util::bytes::BufMut;

pub const VERSION: u8 = 1;

#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MessageType {
    Ack = 0,
    Nack = 1,
    Register = 2,
    SendBundle = 3,
    RecvBundle = 4,
    SendConfirm = 5,
    CancelBundle = 6,
    Welcome = 7,
    Ping = 8,
}

impl TryFrom<u8> for MessageType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Ack),
            1 => Ok(Self::Nack),
            2 => Ok(Self::Register),
            3 => Ok(Self::SendBundle),
            4 => Ok(Self::RecvBundle),
            5 => Ok(Self::SendConfirm),
            6 => Ok(Self::CancelBundle),
            7 => Ok(Self::Welcome),
            8 => Ok(Self::Ping),
            n => Err(Error::InvalidMessageType(n)),
        }
    }
}

impl MessageType {
    fn has_eid(self) -> bool {
        matches!(
            self,
            Self::Register | Self::SendBundle | Self::RecvBundle | Self::Welcome
        )
    }

    fn has_payload(self) -> bool {
        matches!(self, Self::SendBundle | Self::RecvBundle)
    }

    fn has_bundle_id(self) -> bool {
        matches!(self, Self::SendConfirm | Self::CancelBundle)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Ack,
    Nack,
    /// Registers the agent for the given EID (or demux suffix).
    Register {
        eid: String,
    },
    /// Asks the daemon to send `payload` to `eid`.
    SendBundle {
        eid: String,
        payload: Box<[u8]>,
    },
    /// Delivers a bundle received from `eid`.
    RecvBundle {
        eid: String,
        payload: Box<[u8]>,
    },
    SendConfirm {
        bundle_id: u64,
    },
    CancelBundle {
        bundle_id: u64,
    },
    /// Sent by the daemon on connect, carrying its node EID.
    Welcome {
        eid: String,
    },
    Ping,
}

impl Message {
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::Ack => MessageType::Ack,
            Message::Nack => MessageType::Nack,
            Message::Register { .. } => MessageType::Register,
            Message::SendBundle { .. } => MessageType::SendBundle,
            Message::RecvBundle { .. } => MessageType::RecvBundle,
            Message::SendConfirm { .. } => MessageType::SendConfirm,
            Message::CancelBundle { .. } => MessageType::CancelBundle,
            Message::Welcome { .. } => MessageType::Welcome,
            Message::Ping => MessageType::Ping,
        }
    }

    fn eid(&self) -> Option<&str> {
        match self {
            Message::Register { eid }
            | Message::SendBundle { eid, .. }
            | Message::RecvBundle { eid, .. }
            | Message::Welcome { eid } => Some(eid),
            _ => None,
        }
    }

    fn payload(&self) -> Option<&[u8]> {
        match self {
            Message::SendBundle { payload, .. } | Message::RecvBundle { payload, .. } => {
                Some(payload)
            }
            _ => None,
        }
    }

    fn bundle_id(&self) -> Option<u64> {
        match self {
            Message::SendConfirm { bundle_id } | Message::CancelBundle { bundle_id } => {
                Some(*bundle_id)
            }
            _ => None,
        }
    }

    pub fn encoded_len(&self) -> usize {
        1 + self.eid().map_or(0, |eid| 2 + eid.len())
            + self.payload().map_or(0, |payload| 8 + payload.len())
            + self.bundle_id().map_or(0, |_| 8)
    }

    pub fn encode_into(&self, dst: &mut impl BufMut) -> Result<(), Error> {
        let eid = match self.eid() {
            Some(eid) if !eid.is_ascii() => return Err(Error::InvalidEid),
            Some(eid) => Some((
                u16::try_from(eid.len()).map_err(|_| Error::EidTooLong(eid.len()))?,
                eid,
            )),
            None => None,
        };

        dst.put_u8((VERSION << 4) | self.message_type() as u8);
        if let Some((len, eid)) = eid {
            dst.put_u16(len);
            dst.put_slice(eid.as_bytes());
        }
        if let Some(payload) = self.payload() {
            dst.put_u64(payload.len() as u64);
            dst.put_slice(payload);
        }
        if let Some(bundle_id) = self.bundle_id() {
            dst.put_u64(bundle_id);
        }
        Ok(())
    }

    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        let mut data = Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut data)?;
        Ok(data)
    }

    /// Parses one message from the front of `data`.
    ///
    /// Returns the message and the number of bytes it occupied. A truncated
    /// message yields [`Error::NeedMoreData`] with the total length required
    /// to make progress, so the caller can read more and retry with the same
    /// buffer.
    pub fn parse(data: &[u8]) -> Result<(Self, usize), Error> {
        Self::parse_with_limit(data, usize::MAX)
    }

    pub(crate) fn parse_with_limit(
        data: &[u8],
        max_payload_len: usize,
    ) -> Result<(Self, usize), Error> {
        let header = *data.first().ok_or(Error::NeedMoreData(1))?;
        if header >> 4 != VERSION {
            return Err(Error::InvalidVersion(header >> 4));
        }
        let message_type = MessageType::try_from(header & 0x0F)?;
        let mut reader = Reader { data, offset: 1 };

        let eid = if message_type.has_eid() {
            let len = u16::from_be_bytes(reader.take_array()?) as usize;
            let eid = reader.take(len)?;
            if !eid.is_ascii() {
                return Err(Error::InvalidEid);
            }
            // ASCII is always valid UTF-8
            String::from_utf8_lossy(eid).into_owned()
        } else {
            String::new()
        };

        let payload = if message_type.has_payload() {
            let len = u64::from_be_bytes(reader.take_array()?);
            let len = usize::try_from(len)
                .ok()
                .filter(|len| *len <= max_payload_len)
                .ok_or(Error::PayloadTooLarge(len, max_payload_len))?;
            Box::from(reader.take(len)?)
        } else {
            Box::default()
        };

        let bundle_id = if message_type.has_bundle_id() {
            u64::from_be_bytes(reader.take_array()?)
        } else {
            0
        };

        let message = match message_type {
            MessageType::Ack => Message::Ack,
            MessageType::Nack => Message::Nack,
            MessageType::Register => Message::Register { eid },
            MessageType::SendBundle => Message::SendBundle { eid, payload },
            MessageType::RecvBundle => Message::RecvBundle { eid, payload },
            MessageType::SendConfirm => Message::SendConfirm { bundle_id },
            MessageType::CancelBundle => Message::CancelBundle { bundle_id },
            MessageType::Welcome => Message::Welcome { eid },
            MessageType::Ping => Message::Ping,
        };
        Ok((message, reader.offset))
    }
}

struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8], Error> {
        let end = self
            .offset
            .checked_add(len)
            .ok_or(Error::NeedMoreData(usize::MAX))?;
        let bytes = self.data.get(self.offset..end).ok_or(Error::NeedMoreData(end))?;
        self.offset = end;
        Ok(bytes)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], Error> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.take(N)?);
        Ok(array)
    }
}
