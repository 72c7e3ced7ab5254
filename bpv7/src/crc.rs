use super::*;

#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CrcType {
    #[default]
    None,
    /// CRC-16/X25
    Crc16,
    /// CRC-32C (Castagnoli)
    Crc32,
}

impl TryFrom<u64> for CrcType {
    type Error = Error;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Crc16),
            2 => Ok(Self::Crc32),
            v => Err(Error::InvalidCrcType(v)),
        }
    }
}

impl From<CrcType> for u64 {
    fn from(value: CrcType) -> Self {
        match value {
            CrcType::None => 0,
            CrcType::Crc16 => 1,
            CrcType::Crc32 => 2,
        }
    }
}

impl cbor::encode::ToCbor for CrcType {
    fn to_cbor(&self, encoder: &mut cbor::encode::Encoder) {
        encoder.emit(&u64::from(*self))
    }
}

impl cbor::decode::FromCbor for CrcType {
    type Error = Error;

    fn try_from_cbor(data: &[u8]) -> Result<Option<(Self, usize)>, Self::Error> {
        match <u64 as cbor::decode::FromCbor>::try_from_cbor(data)? {
            Some((v, len)) => Ok(Some((v.try_into()?, len))),
            None => Ok(None),
        }
    }
}

impl CrcType {
    /// Length in bytes of the CRC value byte string.
    pub fn value_len(&self) -> usize {
        match self {
            CrcType::None => 0,
            CrcType::Crc16 => 2,
            CrcType::Crc32 => 4,
        }
    }

    fn engine(&self) -> Option<&'static bpwire_crc::Crc> {
        match self {
            CrcType::None => None,
            CrcType::Crc16 => Some(&bpwire_crc::CRC_16_X25),
            CrcType::Crc32 => Some(&bpwire_crc::CRC_32_C),
        }
    }

    /// Computes the CRC of a block encoding, treating the CRC value bytes at
    /// `value` as zero.
    fn compute(&self, block: &[u8], value: core::ops::Range<usize>) -> u32 {
        let Some(engine) = self.engine() else {
            return 0;
        };
        let mut digest = engine.digest();
        digest.update(&block[..value.start]);
        digest.update(&[0u8; 4][..value.len()]);
        digest.update(&block[value.end..]);
        digest.finalize() as u32
    }

    fn to_be_bytes(self, crc: u32) -> Vec<u8> {
        match self {
            CrcType::None => Vec::new(),
            CrcType::Crc16 => (crc as u16).to_be_bytes().to_vec(),
            CrcType::Crc32 => crc.to_be_bytes().to_vec(),
        }
    }
}

/// A CRC read from a received block, and the CRC computed over the received
/// bytes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CrcValue {
    pub on_wire: u32,
    pub computed: u32,
}

impl CrcValue {
    pub fn is_valid(&self) -> bool {
        self.on_wire == self.computed
    }
}

/// Encodes a definite-length block array of `count` fields emitted by `f`,
/// followed by a CRC value when `crc_type` is not `None`.
pub(crate) fn encode_block<F>(crc_type: CrcType, count: usize, f: F) -> Vec<u8>
where
    F: FnOnce(&mut cbor::encode::Array),
{
    let mut crc_range = None;
    let count = if crc_type == CrcType::None {
        count
    } else {
        count + 1
    };
    let mut data = cbor::encode::emit_array(Some(count), |a| {
        f(a);
        if crc_type != CrcType::None {
            crc_range = Some(a.emit_bytes(&[0u8; 4][..crc_type.value_len()]));
        }
    });
    if let Some(range) = crc_range {
        let crc = crc_type.compute(&data, range.clone());
        data[range].copy_from_slice(&crc_type.to_be_bytes(crc));
    }
    data
}

/// Parses the trailing CRC value of a block whose array starts at `data[0]`.
///
/// Must be called after every other field of the block has been parsed.
pub(crate) fn parse_crc_value(
    data: &[u8],
    block: &mut cbor::decode::Array,
    crc_type: CrcType,
) -> Result<Option<CrcValue>, Error> {
    if crc_type == CrcType::None {
        return Ok(None);
    }

    let on_wire = block
        .parse_value(|value, _| match value {
            cbor::decode::Value::Bytes(crc) if crc.len() == crc_type.value_len() => {
                Ok(crc.iter().fold(0u32, |acc, b| (acc << 8) | *b as u32))
            }
            cbor::decode::Value::Bytes(crc) => Err(Error::InvalidCrcLength(crc.len())),
            value => Err(cbor::decode::Error::IncorrectType(
                "Definite-length Byte String".to_string(),
                value.type_name(),
            )
            .into()),
        })?
        .0;

    let value_end = block.offset();
    let Some(block_end) = block.end()? else {
        return Err(cbor::decode::Error::AdditionalItems.into());
    };
    let value = value_end - crc_type.value_len()..value_end;
    Ok(Some(CrcValue {
        on_wire,
        computed: crc_type.compute(&data[..block_end], value),
    }))
}
