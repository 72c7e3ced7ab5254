/// The type code of a canonical block. Codes without a variant are carried
/// through unchanged.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BlockType {
    Payload,
    PreviousNode,
    BundleAge,
    HopCount,
    Unrecognised(u64),
}

const CODES: [(BlockType, u64); 4] = [
    (BlockType::Payload, 1),
    (BlockType::PreviousNode, 6),
    (BlockType::BundleAge, 7),
    (BlockType::HopCount, 10),
];

impl From<BlockType> for u64 {
    fn from(value: BlockType) -> Self {
        match value {
            BlockType::Unrecognised(code) => code,
            known => CODES
                .iter()
                .find_map(|(t, code)| (*t == known).then_some(*code))
                .unwrap_or_default(),
        }
    }
}

impl From<u64> for BlockType {
    fn from(value: u64) -> Self {
        CODES
            .iter()
            .find_map(|(t, code)| (*code == value).then_some(*t))
            .unwrap_or(BlockType::Unrecognised(value))
    }
}

impl core::fmt::Display for BlockType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BlockType::Payload => f.write_str("payload"),
            BlockType::PreviousNode => f.write_str("previous node"),
            BlockType::BundleAge => f.write_str("bundle age"),
            BlockType::HopCount => f.write_str("hop count"),
            BlockType::Unrecognised(code) => write!(f, "type {code}"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn codes() {
        for code in 0..16u64 {
            assert_eq!(u64::from(BlockType::from(code)), code);
        }
        assert_eq!(BlockType::from(7), BlockType::BundleAge);
        assert_eq!(BlockType::from(192), BlockType::Unrecognised(192));
        assert_eq!(BlockType::Unrecognised(11).to_string(), "type 11");
    }
}
