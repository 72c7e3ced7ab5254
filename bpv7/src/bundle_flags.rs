use tracing::trace;

const IS_FRAGMENT: u64 = 1 << 0;
const IS_ADMIN_RECORD: u64 = 1 << 1;
const DO_NOT_FRAGMENT: u64 = 1 << 2;
const APP_ACK_REQUESTED: u64 = 1 << 5;
const REPORT_STATUS_TIME: u64 = 1 << 6;
const RECEIPT_REPORT: u64 = 1 << 14;
const FORWARD_REPORT: u64 = 1 << 16;
const DELIVERY_REPORT: u64 = 1 << 17;
const DELETE_REPORT: u64 = 1 << 18;

/// Bundle processing control flags from the primary block.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BundleFlags {
    pub is_fragment: bool,
    pub is_admin_record: bool,
    pub do_not_fragment: bool,
    pub app_ack_requested: bool,
    pub report_status_time: bool,
    pub receipt_report_requested: bool,
    pub forward_report_requested: bool,
    pub delivery_report_requested: bool,
    pub delete_report_requested: bool,
    pub unrecognised: u64,
}

impl BundleFlags {
    fn known(&self) -> [(bool, u64); 9] {
        [
            (self.is_fragment, IS_FRAGMENT),
            (self.is_admin_record, IS_ADMIN_RECORD),
            (self.do_not_fragment, DO_NOT_FRAGMENT),
            (self.app_ack_requested, APP_ACK_REQUESTED),
            (self.report_status_time, REPORT_STATUS_TIME),
            (self.receipt_report_requested, RECEIPT_REPORT),
            (self.forward_report_requested, FORWARD_REPORT),
            (self.delivery_report_requested, DELIVERY_REPORT),
            (self.delete_report_requested, DELETE_REPORT),
        ]
    }
}

impl From<u64> for BundleFlags {
    fn from(value: u64) -> Self {
        let is = |bit: u64| value & bit != 0;
        let mut flags = Self {
            is_fragment: is(IS_FRAGMENT),
            is_admin_record: is(IS_ADMIN_RECORD),
            do_not_fragment: is(DO_NOT_FRAGMENT),
            app_ack_requested: is(APP_ACK_REQUESTED),
            report_status_time: is(REPORT_STATUS_TIME),
            receipt_report_requested: is(RECEIPT_REPORT),
            forward_report_requested: is(FORWARD_REPORT),
            delivery_report_requested: is(DELIVERY_REPORT),
            delete_report_requested: is(DELETE_REPORT),
            unrecognised: 0,
        };
        flags.unrecognised = flags
            .known()
            .iter()
            .fold(value, |rest, (_, bit)| rest & !bit);
        if flags.unrecognised != 0 {
            trace!("Bundle has unrecognised flags {:#x}", flags.unrecognised);
        }
        flags
    }
}

impl From<BundleFlags> for u64 {
    fn from(value: BundleFlags) -> Self {
        value
            .known()
            .iter()
            .filter(|(set, _)| *set)
            .fold(value.unrecognised, |flags, (_, bit)| flags | bit)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn bits() {
        let flags = BundleFlags::from(0x4_4043);
        assert!(flags.is_fragment);
        assert!(flags.is_admin_record);
        assert!(flags.report_status_time);
        assert!(flags.receipt_report_requested);
        assert!(flags.delete_report_requested);
        assert!(!flags.do_not_fragment);
        assert_eq!(flags.unrecognised, 0);
        assert_eq!(u64::from(flags), 0x4_4043);
    }

    #[test]
    fn reserved_bits_survive() {
        let flags = BundleFlags::from(0x8_0000_0008);
        assert_eq!(flags.unrecognised, 0x8_0000_0008);
        assert_eq!(u64::from(flags), 0x8_0000_0008);
    }
}
