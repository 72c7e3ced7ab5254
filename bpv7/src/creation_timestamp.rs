use super::*;
use core::sync::atomic::{AtomicU64, Ordering};
use error::CaptureFieldErr;

#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CreationTimestamp {
    pub creation_time: DtnTime,
    pub sequence_number: u64,
}

impl CreationTimestamp {
    pub fn new(creation_time: DtnTime, sequence_number: u64) -> Self {
        Self {
            creation_time,
            sequence_number,
        }
    }

    /// The current time, with the next sequence number from `counter`.
    pub fn now(counter: &SequenceCounter) -> Self {
        Self {
            creation_time: DtnTime::now(),
            sequence_number: counter.next(),
        }
    }
}

impl cbor::encode::ToCbor for CreationTimestamp {
    fn to_cbor(&self, encoder: &mut cbor::encode::Encoder) {
        encoder.emit_array(Some(2), |a| {
            a.emit(&self.creation_time);
            a.emit(&self.sequence_number);
        })
    }
}

impl cbor::decode::FromCbor for CreationTimestamp {
    type Error = Error;

    fn try_from_cbor(data: &[u8]) -> Result<Option<(Self, usize)>, Self::Error> {
        cbor::decode::try_parse_array(data, |a, _| {
            Ok(CreationTimestamp {
                creation_time: a.parse().map_field_err("bundle creation time")?,
                sequence_number: a.parse().map_field_err("sequence number")?,
            })
        })
    }
}

/// Supplies default creation timestamp sequence numbers.
///
/// The counter is atomic, so a single instance may be shared between
/// concurrent encoders.
#[derive(Debug, Default)]
pub struct SequenceCounter {
    next: AtomicU64,
}

impl SequenceCounter {
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(0),
        }
    }

    /// Returns the current value and advances the counter.
    pub fn next(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.next.store(0, Ordering::Relaxed)
    }
}
