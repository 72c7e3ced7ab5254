/*!
Typed views of the block-type-specific data of the standard extension blocks.
*/

use super::*;
use error::CaptureFieldErr;

fn expect_type(block: &CanonicalBlock, expected: BlockType) -> Result<(), Error> {
    if block.block_type != expected {
        Err(Error::WrongBlockType {
            expected,
            found: block.block_type,
        })
    } else {
        Ok(())
    }
}

/// The node that forwarded the bundle to this node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviousNode(pub Eid);

impl PreviousNode {
    pub fn into_block(self, crc_type: CrcType) -> CanonicalBlock {
        CanonicalBlock::new(
            BlockType::PreviousNode,
            cbor::encode::emit(&self.0),
            crc_type,
        )
    }
}

impl TryFrom<&CanonicalBlock> for PreviousNode {
    type Error = Error;

    fn try_from(block: &CanonicalBlock) -> Result<Self, Self::Error> {
        expect_type(block, BlockType::PreviousNode)?;
        cbor::decode::parse(&block.data)
            .map(Self)
            .map_field_err("previous node EID")
    }
}

/// Time elapsed since the bundle was created, with microsecond resolution.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BundleAge(pub core::time::Duration);

impl BundleAge {
    pub fn into_block(self, crc_type: CrcType) -> CanonicalBlock {
        let micros = u64::try_from(self.0.as_micros()).unwrap_or(u64::MAX);
        CanonicalBlock::new(BlockType::BundleAge, cbor::encode::emit(&micros), crc_type)
    }
}

impl TryFrom<&CanonicalBlock> for BundleAge {
    type Error = Error;

    fn try_from(block: &CanonicalBlock) -> Result<Self, Self::Error> {
        expect_type(block, BlockType::BundleAge)?;
        cbor::decode::parse::<u64>(&block.data)
            .map(|micros| Self(core::time::Duration::from_micros(micros)))
            .map_field_err("bundle age")
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct HopCount {
    pub limit: u64,
    pub count: u64,
}

impl HopCount {
    pub fn exceeded(&self) -> bool {
        self.count > self.limit
    }

    pub fn into_block(self, crc_type: CrcType) -> CanonicalBlock {
        CanonicalBlock::new(
            BlockType::HopCount,
            cbor::encode::emit_array(Some(2), |a| {
                a.emit(&self.limit);
                a.emit(&self.count);
            }),
            crc_type,
        )
    }
}

impl TryFrom<&CanonicalBlock> for HopCount {
    type Error = Error;

    fn try_from(block: &CanonicalBlock) -> Result<Self, Self::Error> {
        expect_type(block, BlockType::HopCount)?;
        let (hop_count, len) = cbor::decode::parse_array(&block.data, |a, _| {
            Ok::<_, cbor::decode::Error>(HopCount {
                limit: a.parse()?,
                count: a.parse()?,
            })
        })
        .map_field_err("hop count")?;
        if len != block.data.len() {
            return Err(cbor::decode::Error::AdditionalItems).map_field_err("hop count");
        }
        Ok(hop_count)
    }
}
