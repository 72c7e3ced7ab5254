use super::*;
use tokio_util::bytes::{Buf, BytesMut};
use tracing::trace;

/// A [`tokio_util::codec`] adapter for AAP messages.
#[derive(Debug, Clone)]
pub struct MessageCodec {
    max_payload_len: usize,
}

impl MessageCodec {
    /// Rejects any bundle payload longer than `max_payload_len` bytes.
    pub fn new(max_payload_len: usize) -> Self {
        Self { max_payload_len }
    }
}

impl Default for MessageCodec {
    fn default() -> Self {
        Self::new(16 * 1024 * 1024)
    }
}

impl tokio_util::codec::Decoder for MessageCodec {
    type Item = Message;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match Message::parse_with_limit(src, self.max_payload_len) {
            Ok((message, len)) => {
                src.advance(len);
                trace!("Received {:?} message", message.message_type());
                Ok(Some(message))
            }
            Err(Error::NeedMoreData(needed)) => {
                src.reserve(needed.saturating_sub(src.len()));
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

impl tokio_util::codec::Encoder<&Message> for MessageCodec {
    type Error = Error;

    fn encode(&mut self, item: &Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(item.encoded_len());
        item.encode_into(dst)
    }
}

impl tokio_util::codec::Encoder<Message> for MessageCodec {
    type Error = Error;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        tokio_util::codec::Encoder::<&Message>::encode(self, &item, dst)
    }
}
