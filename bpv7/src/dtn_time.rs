use super::*;
use cbor::decode::FromCbor;

const DTN_EPOCH: time::OffsetDateTime = time::macros::datetime!(2000-01-01 00:00:00 UTC);

/// Seconds between the Unix epoch and the DTN epoch (2000-01-01T00:00:00Z).
pub const UNIX_EPOCH_OFFSET: u64 = 946_684_800;

/// A point in time as whole seconds since the DTN epoch.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DtnTime {
    secs: u64,
}

impl DtnTime {
    pub fn now() -> Self {
        Self {
            secs: (time::OffsetDateTime::now_utc() - DTN_EPOCH)
                .whole_seconds()
                .max(0) as u64,
        }
    }

    pub const fn new(secs: u64) -> Self {
        Self { secs }
    }

    /// Converts a Unix timestamp, saturating at the DTN epoch.
    pub const fn from_unix(unix_secs: u64) -> Self {
        Self {
            secs: unix_secs.saturating_sub(UNIX_EPOCH_OFFSET),
        }
    }

    pub const fn secs(&self) -> u64 {
        self.secs
    }

    pub const fn unix_secs(&self) -> u64 {
        self.secs.saturating_add(UNIX_EPOCH_OFFSET)
    }
}

impl cbor::encode::ToCbor for DtnTime {
    fn to_cbor(&self, encoder: &mut cbor::encode::Encoder) {
        encoder.emit(&self.secs)
    }
}

impl FromCbor for DtnTime {
    type Error = cbor::decode::Error;

    fn try_from_cbor(data: &[u8]) -> Result<Option<(Self, usize)>, Self::Error> {
        Ok(u64::try_from_cbor(data)?.map(|(secs, len)| (Self { secs }, len)))
    }
}

impl TryFrom<time::OffsetDateTime> for DtnTime {
    type Error = time::error::ConversionRange;

    fn try_from(instant: time::OffsetDateTime) -> Result<Self, Self::Error> {
        let secs = (instant - DTN_EPOCH).whole_seconds();
        if secs < 0 {
            Err(time::error::ConversionRange)
        } else {
            Ok(Self { secs: secs as u64 })
        }
    }
}

impl From<DtnTime> for time::OffsetDateTime {
    fn from(dtn_time: DtnTime) -> Self {
        DTN_EPOCH.saturating_add(time::Duration::seconds(
            i64::try_from(dtn_time.secs).unwrap_or(i64::MAX),
        ))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn epoch() {
        assert_eq!(DtnTime::from_unix(UNIX_EPOCH_OFFSET), DtnTime::new(0));
        assert_eq!(DtnTime::from_unix(0), DtnTime::new(0));
        assert_eq!(DtnTime::new(10).unix_secs(), UNIX_EPOCH_OFFSET + 10);
        assert_eq!(
            time::OffsetDateTime::from(DtnTime::new(0)).unix_timestamp(),
            UNIX_EPOCH_OFFSET as i64
        );
    }

    #[test]
    fn offset_date_time() {
        let t = time::macros::datetime!(2020-06-01 12:00:00 UTC);
        let dtn = DtnTime::try_from(t).unwrap();
        assert_eq!(dtn.unix_secs() as i64, t.unix_timestamp());
        assert_eq!(time::OffsetDateTime::from(dtn), t);

        assert!(DtnTime::try_from(time::macros::datetime!(1999-12-31 23:59:59 UTC)).is_err());
    }
}
