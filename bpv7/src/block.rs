use super::*;
use crc::{encode_block, parse_crc_value};
use error::CaptureFieldErr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalBlock {
    pub block_type: BlockType,
    /// `None` until assigned by [`Bundle::add`]
    pub block_number: Option<u64>,
    pub flags: BlockFlags,
    pub crc_type: CrcType,
    pub data: Box<[u8]>,
    /// Set when the block was parsed with a CRC
    pub crc: Option<CrcValue>,
}

impl CanonicalBlock {
    pub fn new(block_type: BlockType, data: impl Into<Box<[u8]>>, crc_type: CrcType) -> Self {
        Self {
            block_type,
            block_number: None,
            flags: BlockFlags::default(),
            crc_type,
            data: data.into(),
            crc: None,
        }
    }

    /// A payload block, which is always block number 1.
    pub fn payload(data: impl Into<Box<[u8]>>, crc_type: CrcType) -> Self {
        Self {
            block_number: Some(1),
            ..Self::new(BlockType::Payload, data, crc_type)
        }
    }

    pub fn with_flags(mut self, flags: BlockFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_block_number(mut self, block_number: u64) -> Self {
        self.block_number = Some(block_number);
        self
    }

    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        let block_number = self.block_number.ok_or(Error::UnassignedBlockNumber)?;
        Ok(encode_block(self.crc_type, 5, |a| {
            a.emit(&u64::from(self.block_type));
            a.emit(&block_number);
            a.emit(&u64::from(self.flags));
            a.emit(&self.crc_type);
            a.emit(&*self.data);
        }))
    }

    /// Parses a complete canonical block occupying the whole of `data`.
    pub fn parse(data: &[u8]) -> Result<Self, Error> {
        cbor::decode::parse(data)
    }
}

impl cbor::decode::FromCbor for CanonicalBlock {
    type Error = Error;

    fn try_from_cbor(data: &[u8]) -> Result<Option<(Self, usize)>, Self::Error> {
        cbor::decode::try_parse_array(data, |block, tags| {
            if !tags.is_empty() {
                return Err(Error::TaggedBlock);
            }

            let block_type = BlockType::from(block.parse::<u64>().map_field_err("block type")?);
            let block_number = block.parse::<u64>().map_field_err("block number")?;
            if block_number == 0 {
                return Err(Error::InvalidBlockNumber(0));
            }
            let flags = BlockFlags::from(
                block
                    .parse::<u64>()
                    .map_field_err("block processing control flags")?,
            );
            let crc_type = block.parse::<CrcType>().map_field_err("CRC type")?;
            let data_field = block
                .parse::<Box<[u8]>>()
                .map_field_err("block-type-specific data")?;
            let crc = parse_crc_value(data, block, crc_type)?;

            Ok(Self {
                block_type,
                block_number: Some(block_number),
                flags,
                crc_type,
                data: data_field,
                crc,
            })
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn encode_without_crc() {
        let block = CanonicalBlock::payload(*b"hi", CrcType::None);
        assert_eq!(block.encode().unwrap(), hex!("85010100004268 69"));
    }

    #[test]
    fn unassigned_number() {
        let block = CanonicalBlock::new(BlockType::HopCount, [0u8; 0], CrcType::None);
        assert!(matches!(block.encode(), Err(Error::UnassignedBlockNumber)));
    }

    #[test]
    fn round_trip_with_crc() {
        let block = CanonicalBlock::new(BlockType::Unrecognised(192), *b"opaque", CrcType::Crc32)
            .with_block_number(5)
            .with_flags(BlockFlags {
                delete_block_on_failure: true,
                ..Default::default()
            });
        let data = block.encode().unwrap();
        let parsed = CanonicalBlock::parse(&data).unwrap();
        assert!(parsed.crc.unwrap().is_valid());
        assert_eq!(
            CanonicalBlock {
                crc: None,
                ..parsed
            },
            block
        );
    }

    #[test]
    fn block_number_zero() {
        assert!(matches!(
            CanonicalBlock::parse(&hex!("850a0000004100")),
            Err(Error::InvalidBlockNumber(0))
        ));
    }
}
