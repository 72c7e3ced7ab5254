use super::*;
use bpwire_crc::CRC_16_CCITT_FALSE;
use tokio_util::bytes::{Buf, BytesMut};
use tracing::trace;

const CRC_LEN: usize = 2;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SpacePacket {
    pub is_request: bool,
    pub apid: u16,
    pub sequence_flags: SequenceFlags,
    pub sequence_count: u16,
    pub timecode: Option<Timecode>,
    pub ancillary_data: Option<Box<[u8]>>,
    pub payload: Bytes,
}

/// The on-wire CRC of a received packet, beside the value recomputed over
/// the bytes it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrcValue {
    pub on_wire: u16,
    pub computed: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPacket {
    pub packet: SpacePacket,

    /// Present when the link format carries a CRC.
    pub crc: Option<CrcValue>,
}

impl ParsedPacket {
    pub fn verify_crc(&self) -> Result<(), Error> {
        match self.crc {
            Some(CrcValue { on_wire, computed }) if on_wire != computed => {
                Err(Error::ChecksumMismatch { on_wire, computed })
            }
            _ => Ok(()),
        }
    }
}

impl SpacePacket {
    /// An unsegmented telemetry packet.
    pub fn new(apid: u16, payload: Bytes) -> Self {
        Self {
            apid,
            payload,
            ..Default::default()
        }
    }

    fn secondary_header_len(&self) -> usize {
        self.timecode.map_or(0, |t| t.len())
            + self.ancillary_data.as_ref().map_or(0, |a| a.len())
    }

    fn has_secondary_header(&self) -> bool {
        self.timecode.is_some() || self.ancillary_data.is_some()
    }

    pub fn encode(&self, crc: bool) -> Result<Vec<u8>, Error> {
        if !self.has_secondary_header() && self.payload.is_empty() {
            return Err(Error::EmptyPayload);
        }
        let data_length = self.secondary_header_len()
            + self.payload.len()
            + if crc { CRC_LEN } else { 0 };

        let header = PrimaryHeader {
            is_request: self.is_request,
            has_secondary_header: self.has_secondary_header(),
            apid: self.apid,
            sequence_flags: self.sequence_flags,
            sequence_count: self.sequence_count,
            data_length,
        }
        .encode()?;

        let mut data = Vec::with_capacity(PrimaryHeader::LEN + data_length);
        data.extend_from_slice(&header);
        if let Some(timecode) = &self.timecode {
            timecode.encode_into(&mut data)?;
        }
        if let Some(ancillary_data) = &self.ancillary_data {
            data.extend_from_slice(ancillary_data);
        }
        data.extend_from_slice(&self.payload);
        if crc {
            let crc = CRC_16_CCITT_FALSE.checksum(&data) as u16;
            data.extend_from_slice(&crc.to_be_bytes());
        }
        Ok(data)
    }

    /// Parses one packet from the front of `data`.
    ///
    /// Only the primary header is examined until the whole packet is
    /// available, so a reader asks for 6 bytes and then for the rest.
    pub fn parse(data: &[u8], format: &Format) -> Result<Parsed<ParsedPacket>, Error> {
        let header = match PrimaryHeader::parse(data)? {
            Parsed::Complete(header, _) => header,
            Parsed::Incomplete(n) => return Ok(Parsed::Incomplete(n)),
        };
        let total = PrimaryHeader::LEN + header.data_length;
        let Some(packet) = data.get(..total) else {
            return Ok(Parsed::Incomplete(total));
        };
        let too_short = || Error::DataLengthTooShort(header.data_length);

        let mut offset = PrimaryHeader::LEN;
        let mut timecode = None;
        let mut ancillary_data = None;
        if header.has_secondary_header {
            if format.timecode {
                match Timecode::parse(&packet[offset..])? {
                    Parsed::Complete(t, len) => {
                        timecode = Some(t);
                        offset += len;
                    }
                    Parsed::Incomplete(_) => return Err(too_short()),
                }
            }
            if format.ancillary_data_len > 0 {
                let end = offset + format.ancillary_data_len;
                ancillary_data = Some(Box::from(
                    packet.get(offset..end).ok_or_else(too_short)?,
                ));
                offset = end;
            }
        }

        let (payload_end, crc) = if format.crc {
            let payload_end = total
                .checked_sub(CRC_LEN)
                .filter(|end| *end >= offset)
                .ok_or_else(too_short)?;
            let on_wire = u16::from_be_bytes([packet[payload_end], packet[payload_end + 1]]);
            let computed = CRC_16_CCITT_FALSE.checksum(&packet[..payload_end]) as u16;
            (payload_end, Some(CrcValue { on_wire, computed }))
        } else {
            (total, None)
        };

        Ok(Parsed::Complete(
            ParsedPacket {
                packet: SpacePacket {
                    is_request: header.is_request,
                    apid: header.apid,
                    sequence_flags: header.sequence_flags,
                    sequence_count: header.sequence_count,
                    timecode,
                    ancillary_data,
                    payload: Bytes::copy_from_slice(&packet[offset..payload_end]),
                },
                crc,
            },
            total,
        ))
    }
}

/// A [`tokio_util::codec`] adapter for a TCPSPP stream.
///
/// Decoding verifies the CRC when the format carries one.
#[derive(Debug, Clone)]
pub struct SpacePacketCodec {
    format: Format,
}

impl SpacePacketCodec {
    pub fn new(format: Format) -> Self {
        Self { format }
    }
}

impl tokio_util::codec::Decoder for SpacePacketCodec {
    type Item = SpacePacket;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match SpacePacket::parse(src, &self.format)? {
            Parsed::Complete(parsed, len) => {
                src.advance(len);
                parsed.verify_crc()?;
                trace!(
                    "Received packet APID {:#x} count {}",
                    parsed.packet.apid, parsed.packet.sequence_count
                );
                Ok(Some(parsed.packet))
            }
            Parsed::Incomplete(needed) => {
                src.reserve(needed.saturating_sub(src.len()));
                Ok(None)
            }
        }
    }
}

impl tokio_util::codec::Encoder<&SpacePacket> for SpacePacketCodec {
    type Error = Error;

    fn encode(&mut self, item: &SpacePacket, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.extend_from_slice(&item.encode(self.format.crc)?);
        Ok(())
    }
}
