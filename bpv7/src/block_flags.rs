use tracing::trace;

const MUST_REPLICATE: u64 = 1 << 0;
const REPORT_ON_FAILURE: u64 = 1 << 1;
const DELETE_BUNDLE_ON_FAILURE: u64 = 1 << 2;
const DELETE_BLOCK_ON_FAILURE: u64 = 1 << 4;

/// Block processing control flags. Bits this crate does not interpret are
/// kept in `unrecognised` and written back out unchanged.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockFlags {
    pub must_replicate: bool,
    pub report_on_failure: bool,
    pub delete_bundle_on_failure: bool,
    pub delete_block_on_failure: bool,
    pub unrecognised: u64,
}

impl From<BlockFlags> for u64 {
    fn from(value: BlockFlags) -> Self {
        [
            (value.must_replicate, MUST_REPLICATE),
            (value.report_on_failure, REPORT_ON_FAILURE),
            (value.delete_bundle_on_failure, DELETE_BUNDLE_ON_FAILURE),
            (value.delete_block_on_failure, DELETE_BLOCK_ON_FAILURE),
        ]
        .into_iter()
        .filter(|(set, _)| *set)
        .fold(value.unrecognised, |flags, (_, bit)| flags | bit)
    }
}

impl From<u64> for BlockFlags {
    fn from(value: u64) -> Self {
        let unrecognised = value
            & !(MUST_REPLICATE
                | REPORT_ON_FAILURE
                | DELETE_BUNDLE_ON_FAILURE
                | DELETE_BLOCK_ON_FAILURE);
        if unrecognised != 0 {
            trace!("Block has unrecognised flags {unrecognised:#x}");
        }
        Self {
            must_replicate: value & MUST_REPLICATE != 0,
            report_on_failure: value & REPORT_ON_FAILURE != 0,
            delete_bundle_on_failure: value & DELETE_BUNDLE_ON_FAILURE != 0,
            delete_block_on_failure: value & DELETE_BLOCK_ON_FAILURE != 0,
            unrecognised,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn bits() {
        let flags = BlockFlags::from(0x15);
        assert!(flags.must_replicate);
        assert!(!flags.report_on_failure);
        assert!(flags.delete_bundle_on_failure);
        assert!(flags.delete_block_on_failure);
        assert_eq!(flags.unrecognised, 0);
        assert_eq!(u64::from(flags), 0x15);

        // Bit 3 is reserved and must survive a round trip
        let flags = BlockFlags::from(0x0A);
        assert!(flags.report_on_failure);
        assert_eq!(flags.unrecognised, 0x08);
        assert_eq!(u64::from(flags), 0x0A);
    }
}
