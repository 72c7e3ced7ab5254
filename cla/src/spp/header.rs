use super::*;

const VERSION_MASK: u16 = 0xE000;
const TYPE_MASK: u16 = 0x1000;
const SECONDARY_HEADER_MASK: u16 = 0x0800;
const SEQUENCE_FLAGS_SHIFT: u16 = 14;

#[repr(u8)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum SequenceFlags {
    Continuation = 0,
    First = 1,
    Last = 2,
    #[default]
    Unsegmented = 3,
}

impl From<u16> for SequenceFlags {
    fn from(value: u16) -> Self {
        match value & 0x3 {
            0 => Self::Continuation,
            1 => Self::First,
            2 => Self::Last,
            _ => Self::Unsegmented,
        }
    }
}

/// The fixed 6 byte header that starts every space packet.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PrimaryHeader {
    pub is_request: bool,
    pub has_secondary_header: bool,
    pub apid: u16,
    pub sequence_flags: SequenceFlags,
    pub sequence_count: u16,

    /// Octets following the primary header, between 1 and
    /// [`MAX_DATA_LENGTH`]. The wire carries this value minus one.
    pub data_length: usize,
}

impl PrimaryHeader {
    pub const LEN: usize = 6;

    pub fn encode(&self) -> Result<[u8; Self::LEN], Error> {
        if self.apid > MAX_APID {
            return Err(Error::ApidOutOfRange(self.apid));
        }
        if self.sequence_count > MAX_SEQUENCE_COUNT {
            return Err(Error::SequenceCountOutOfRange(self.sequence_count));
        }
        if self.data_length > MAX_DATA_LENGTH {
            return Err(Error::DataTooLong(self.data_length));
        }
        let length = u16::try_from(self.data_length.saturating_sub(1))
            .map_err(|_| Error::DataTooLong(self.data_length))?;

        let mut id = self.apid;
        if self.is_request {
            id |= TYPE_MASK;
        }
        if self.has_secondary_header {
            id |= SECONDARY_HEADER_MASK;
        }
        let sequence =
            ((self.sequence_flags as u16) << SEQUENCE_FLAGS_SHIFT) | self.sequence_count;

        let mut data = [0u8; Self::LEN];
        data[0..2].copy_from_slice(&id.to_be_bytes());
        data[2..4].copy_from_slice(&sequence.to_be_bytes());
        data[4..6].copy_from_slice(&length.to_be_bytes());
        Ok(data)
    }

    pub fn parse(data: &[u8]) -> Result<Parsed<Self>, Error> {
        if let Some(&first) = data.first() {
            let version = first >> 5;
            if version != 0 {
                return Err(Error::UnsupportedVersion(version));
            }
        }
        let Some(data) = data.get(..Self::LEN) else {
            return Ok(Parsed::Incomplete(Self::LEN));
        };

        let id = u16::from_be_bytes([data[0], data[1]]);
        let sequence = u16::from_be_bytes([data[2], data[3]]);
        let length = u16::from_be_bytes([data[4], data[5]]);
        debug_assert_eq!(id & VERSION_MASK, 0);

        Ok(Parsed::Complete(
            Self {
                is_request: id & TYPE_MASK != 0,
                has_secondary_header: id & SECONDARY_HEADER_MASK != 0,
                apid: id & MAX_APID,
                sequence_flags: SequenceFlags::from(sequence >> SEQUENCE_FLAGS_SHIFT),
                sequence_count: sequence & MAX_SEQUENCE_COUNT,
                data_length: length as usize + 1,
            },
            Self::LEN,
        ))
    }
}
