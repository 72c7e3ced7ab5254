use super::*;

/// 1958-01-01T00:00:00Z, the epoch of CCSDS unsegmented time codes.
pub const CCSDS_EPOCH: time::OffsetDateTime = time::macros::datetime!(1958-01-01 00:00:00 UTC);

const MAX_BASE_UNIT_OCTETS: u8 = 4;
const MAX_FRACTIONAL_OCTETS: u8 = 3;

#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TimecodeType {
    UnsegmentedCcsdsEpoch = 0x1,
    UnsegmentedCustomEpoch = 0x2,
    DaySegmented = 0x4,
    CalendarSegmented = 0x5,
    Custom = 0x6,
}

/// A CCSDS unsegmented time code (CUC) with a one byte preamble.
///
/// Only the CCSDS epoch variant is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timecode {
    /// Whole seconds since [`CCSDS_EPOCH`].
    pub seconds: u32,
    pub fractional: u32,

    /// 1 to 4 octets of whole seconds.
    pub base_unit_octets: u8,

    /// 0 to 3 octets of sub-second fraction.
    pub fractional_octets: u8,
}

impl Default for Timecode {
    fn default() -> Self {
        Self {
            seconds: 0,
            fractional: 0,
            base_unit_octets: MAX_BASE_UNIT_OCTETS,
            fractional_octets: 0,
        }
    }
}

impl Timecode {
    pub fn now() -> Self {
        Self::from_datetime(time::OffsetDateTime::now_utc())
    }

    /// Saturates outside the range of 4 octets of seconds.
    pub fn from_datetime(instant: time::OffsetDateTime) -> Self {
        let seconds = (instant - CCSDS_EPOCH)
            .whole_seconds()
            .clamp(0, u32::MAX as i64) as u32;
        Self {
            seconds,
            ..Default::default()
        }
    }

    pub fn to_datetime(&self) -> time::OffsetDateTime {
        CCSDS_EPOCH.saturating_add(time::Duration::seconds(self.seconds as i64))
    }

    pub fn len(&self) -> usize {
        1 + self.base_unit_octets as usize + self.fractional_octets as usize
    }

    fn preamble(&self) -> Result<u8, Error> {
        if !(1..=MAX_BASE_UNIT_OCTETS).contains(&self.base_unit_octets) {
            return Err(Error::InvalidTimecode("base unit must be 1 to 4 octets"));
        }
        if self.fractional_octets > MAX_FRACTIONAL_OCTETS {
            return Err(Error::InvalidTimecode("fraction must be 0 to 3 octets"));
        }
        Ok(((TimecodeType::UnsegmentedCcsdsEpoch as u8) << 4)
            | ((self.base_unit_octets - 1) << 2)
            | self.fractional_octets)
    }

    pub fn encode_into(&self, data: &mut Vec<u8>) -> Result<(), Error> {
        let preamble = self.preamble()?;
        let base = self.base_unit_octets as usize;
        let frac = self.fractional_octets as usize;
        if base < 4 && self.seconds >> (base * 8) != 0 {
            return Err(Error::InvalidTimecode("seconds do not fit the base unit"));
        }
        if self.fractional >> (frac * 8) != 0 {
            return Err(Error::InvalidTimecode("fraction does not fit its octets"));
        }

        data.push(preamble);
        data.extend_from_slice(&self.seconds.to_be_bytes()[4 - base..]);
        data.extend_from_slice(&self.fractional.to_be_bytes()[4 - frac..]);
        Ok(())
    }

    pub fn parse(data: &[u8]) -> Result<Parsed<Self>, Error> {
        let Some(&preamble) = data.first() else {
            return Ok(Parsed::Incomplete(1));
        };
        if preamble & 0x80 != 0 {
            return Err(Error::InvalidTimecode("extended preamble"));
        }
        let code_type = (preamble >> 4) & 0x7;
        if code_type != TimecodeType::UnsegmentedCcsdsEpoch as u8 {
            return Err(Error::UnsupportedTimecode(code_type));
        }

        let timecode = Self {
            seconds: 0,
            fractional: 0,
            base_unit_octets: ((preamble >> 2) & 0x3) + 1,
            fractional_octets: preamble & 0x3,
        };
        let len = timecode.len();
        let Some(data) = data.get(1..len) else {
            return Ok(Parsed::Incomplete(len));
        };

        let (seconds, fractional) = data.split_at(timecode.base_unit_octets as usize);
        let be = |bytes: &[u8]| bytes.iter().fold(0u32, |v, b| (v << 8) | *b as u32);
        Ok(Parsed::Complete(
            Self {
                seconds: be(seconds),
                fractional: be(fractional),
                ..timecode
            },
            len,
        ))
    }
}
