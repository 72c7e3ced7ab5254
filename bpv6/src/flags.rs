/// Bundle processing control flags.
///
/// RFC 5050 packs priority and report requests into the same field, so this
/// is a plain bitset rather than a struct of booleans.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct BundleFlags(u64);

impl BundleFlags {
    pub const IS_FRAGMENT: Self = Self(0x00001);
    pub const ADMINISTRATIVE_RECORD: Self = Self(0x00002);
    pub const MUST_NOT_BE_FRAGMENTED: Self = Self(0x00004);
    pub const CUSTODY_TRANSFER_REQUESTED: Self = Self(0x00008);
    pub const SINGLETON_ENDPOINT: Self = Self(0x00010);
    pub const ACKNOWLEDGEMENT_REQUESTED: Self = Self(0x00020);
    pub const NORMAL_PRIORITY: Self = Self(0x00080);
    pub const EXPEDITED_PRIORITY: Self = Self(0x00100);
    pub const REPORT_RECEPTION: Self = Self(0x04000);
    pub const REPORT_CUSTODY_ACCEPTANCE: Self = Self(0x08000);
    pub const REPORT_FORWARDING: Self = Self(0x10000);
    pub const REPORT_DELIVERY: Self = Self(0x20000);
    pub const REPORT_DELETION: Self = Self(0x40000);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    pub const fn bits(&self) -> u64 {
        self.0
    }

    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }
}

/// Singleton destination, normal priority.
impl Default for BundleFlags {
    fn default() -> Self {
        Self::SINGLETON_ENDPOINT | Self::NORMAL_PRIORITY
    }
}

impl core::ops::BitOr for BundleFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Block processing control flags.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct BlockFlags(u64);

impl BlockFlags {
    pub const MUST_BE_REPLICATED: Self = Self(0x01);
    pub const REPORT_IF_UNPROCESSED: Self = Self(0x02);
    pub const DELETE_BUNDLE_IF_UNPROCESSED: Self = Self(0x04);
    pub const LAST_BLOCK: Self = Self(0x08);
    pub const DISCARD_IF_UNPROCESSED: Self = Self(0x10);
    pub const FORWARDED_UNPROCESSED: Self = Self(0x20);
    pub const HAS_EID_REFERENCES: Self = Self(0x40);

    pub const fn bits(&self) -> u64 {
        self.0
    }
}

impl core::ops::BitOr for BlockFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}
